//! XML text to element stream.
//!
//! Reads quick-xml events and assembles the [`Element`] tree. Text is not
//! trimmed: whitespace-only text between child elements is dropped, any
//! other text next to child elements is rejected as mixed content, and the
//! text of a leaf element is kept verbatim.

use std::collections::VecDeque;
use std::io::BufRead;

use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};

use crate::element::{Content, Element, XSI_NIL};
use crate::error::{BindError, BindErrorKind, FormatError, FormatResult};
use crate::xml::utils;

/// Deepest element nesting the reader accepts. Deeper documents fail with
/// `DepthExceeded` before the tree is built.
pub const MAX_ELEMENT_DEPTH: usize = 1024;

/// Deserialize an element tree from an XML string.
///
/// # Examples
///
/// ```
/// use helios_bind::xml::from_xml_str;
///
/// let xml = r#"<?xml version="1.0"?>
/// <door xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">
///   <someInteger>3</someInteger>
///   <label xsi:nil="true"/>
/// </door>"#;
/// let door = from_xml_str(xml)?;
/// assert_eq!(door.children().len(), 2);
/// assert!(door.children()[1].nil);
/// # Ok::<(), helios_bind::FormatError>(())
/// ```
pub fn from_xml_str(xml: &str) -> FormatResult<Element> {
    from_xml_reader(xml.as_bytes())
}

/// Deserialize an element tree from XML bytes.
pub fn from_xml_slice(xml: &[u8]) -> FormatResult<Element> {
    from_xml_str(utils::utf8(xml)?)
}

/// Deserialize an element tree from an XML reader.
pub fn from_xml_reader<R: BufRead>(reader: R) -> FormatResult<Element> {
    let mut deserializer = XmlDeserializer::new(Reader::from_reader(reader));
    deserializer.read_document()
}

/// An element whose end tag has not been seen yet.
struct OpenElement {
    element: Element,
    text: String,
    children: Vec<Element>,
}

impl OpenElement {
    fn close(self) -> FormatResult<Element> {
        let OpenElement {
            mut element,
            text,
            children,
        } = self;

        if children.is_empty() {
            element.content = if text.is_empty() {
                Content::Empty
            } else {
                Content::Text(text)
            };
        } else if utils::is_whitespace(text.as_bytes()) {
            element.content = Content::Children(children);
        } else {
            return Err(FormatError::Malformed(format!(
                "mixed content in <{}>",
                element.name
            )));
        }
        Ok(element)
    }
}

/// XML deserializer that reads quick-xml events.
struct XmlDeserializer<R: BufRead> {
    reader: Reader<R>,
    /// Buffer for reading events
    buf: Vec<u8>,
    /// Buffered events that have been peeked
    buffered_events: VecDeque<Event<'static>>,
    /// Elements opened but not yet closed, outermost first
    open: Vec<OpenElement>,
}

impl<R: BufRead> XmlDeserializer<R> {
    fn new(reader: Reader<R>) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            buffered_events: VecDeque::new(),
            open: Vec::new(),
        }
    }

    /// Peek at the next event without consuming it
    fn peek_event(&mut self) -> FormatResult<&Event<'static>> {
        if self.buffered_events.is_empty() {
            self.buf.clear();
            let event = self.reader.read_event_into(&mut self.buf)?.into_owned();
            self.buffered_events.push_back(event);
        }
        self.buffered_events
            .front()
            .ok_or_else(|| FormatError::Malformed("event buffer is empty".to_string()))
    }

    /// Get the next event, using peeked if available
    fn next_event(&mut self) -> FormatResult<Event<'static>> {
        if let Some(event) = self.buffered_events.pop_front() {
            return Ok(event);
        }
        self.buf.clear();
        Ok(self.reader.read_event_into(&mut self.buf)?.into_owned())
    }

    fn read_document(&mut self) -> FormatResult<Element> {
        let mut root = None;
        loop {
            match self.next_event()? {
                Event::Start(start) => {
                    let element = start_element(&start)?;
                    self.check_depth(&element)?;
                    self.open.push(OpenElement {
                        element,
                        text: String::new(),
                        children: Vec::new(),
                    });
                }
                Event::Empty(start) => {
                    let element = start_element(&start)?;
                    self.check_depth(&element)?;
                    self.attach(element, &mut root)?;
                }
                Event::End(_) => {
                    let open = self.open.pop().ok_or_else(|| {
                        FormatError::Malformed("unexpected end tag".to_string())
                    })?;
                    let element = open.close()?;
                    self.attach(element, &mut root)?;
                }
                Event::Text(text) => {
                    let raw = utils::utf8(text.as_ref())?;
                    let decoded =
                        unescape(raw).map_err(|e| FormatError::Malformed(e.to_string()))?;
                    self.push_text(&decoded)?;
                }
                Event::CData(data) => {
                    let raw = utils::utf8(data.as_ref())?.to_string();
                    self.push_text(&raw)?;
                }
                Event::GeneralRef(reference) => {
                    let name = utils::utf8(reference.as_ref())?.to_string();
                    let resolved = utils::resolve_entity(&name).ok_or_else(|| {
                        FormatError::Malformed(format!("unknown entity reference &{};", name))
                    })?;
                    self.push_text(resolved.encode_utf8(&mut [0; 4]))?;
                }
                Event::Eof => break,
                Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {}
            }

            // Skip trailing misc events once the root is closed.
            if root.is_some() && self.open.is_empty() {
                while !matches!(self.peek_event()?, Event::Eof) {
                    match self.next_event()? {
                        Event::Comment(_) | Event::PI(_) => {}
                        Event::Text(text) if utils::is_whitespace(text.as_ref()) => {}
                        _ => {
                            return Err(FormatError::Malformed(
                                "content after the root element".to_string(),
                            ));
                        }
                    }
                }
            }
        }

        if let Some(open) = self.open.last() {
            return Err(FormatError::Malformed(format!(
                "unexpected end of document inside <{}>",
                open.element.name
            )));
        }
        root.ok_or_else(|| FormatError::Malformed("document has no root element".to_string()))
    }

    /// Rejects an element that would nest deeper than [`MAX_ELEMENT_DEPTH`].
    fn check_depth(&self, element: &Element) -> FormatResult<()> {
        if self.open.len() < MAX_ELEMENT_DEPTH {
            return Ok(());
        }
        let path: Vec<String> = self
            .open
            .iter()
            .map(|open| open.element.name.clone())
            .chain(std::iter::once(element.name.clone()))
            .collect();
        Err(BindError::new(BindErrorKind::DepthExceeded {
            max_depth: MAX_ELEMENT_DEPTH,
        })
        .within(&path)
        .into())
    }

    fn attach(&mut self, element: Element, root: &mut Option<Element>) -> FormatResult<()> {
        match self.open.last_mut() {
            Some(parent) => parent.children.push(element),
            None if root.is_none() => *root = Some(element),
            None => {
                return Err(FormatError::Malformed(
                    "document has more than one root element".to_string(),
                ));
            }
        }
        Ok(())
    }

    fn push_text(&mut self, text: &str) -> FormatResult<()> {
        match self.open.last_mut() {
            Some(open) => {
                open.text.push_str(text);
                Ok(())
            }
            None if utils::is_whitespace(text.as_bytes()) => Ok(()),
            None => Err(FormatError::Malformed(
                "text outside the root element".to_string(),
            )),
        }
    }
}

fn start_element(start: &BytesStart<'_>) -> FormatResult<Element> {
    let mut element = Element::new(utils::utf8(start.name().as_ref())?);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| FormatError::Malformed(e.to_string()))?;
        let key = utils::utf8(attr.key.as_ref())?.to_string();
        if utils::is_namespace_declaration(&key) {
            continue;
        }
        let raw = utils::utf8(&attr.value)?;
        let value = unescape(raw).map_err(|e| FormatError::Malformed(e.to_string()))?;
        if key == XSI_NIL {
            element.nil = utils::is_nil_value(&value);
        } else {
            element.attributes.push((key, value.into_owned()));
        }
    }
    Ok(element)
}

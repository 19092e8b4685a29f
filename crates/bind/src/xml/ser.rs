//! Element stream to XML text.
//!
//! Walks an [`Element`] tree and writes quick-xml events directly to the
//! output. Text-only elements are written inline, elements without content
//! as empty tags.

use std::io::Write;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use crate::element::{Content, Element, XSI_NIL};
use crate::error::{FormatError, FormatResult};
use crate::xml::utils;

/// Serialize an element tree to an XML string.
///
/// # Examples
///
/// ```
/// use helios_bind::Element;
/// use helios_bind::xml::to_xml_string;
///
/// let door = Element::with_children("door", vec![Element::text("someInteger", "3")]);
/// let xml = to_xml_string(&door)?;
/// assert_eq!(
///     xml,
///     r#"<?xml version="1.0" encoding="UTF-8"?><door><someInteger>3</someInteger></door>"#
/// );
/// # Ok::<(), helios_bind::FormatError>(())
/// ```
pub fn to_xml_string(root: &Element) -> FormatResult<String> {
    into_string(to_xml_vec(root)?)
}

/// Serialize an element tree to an indented XML string.
pub fn to_xml_string_pretty(root: &Element) -> FormatResult<String> {
    let mut buffer = Vec::new();
    let mut serializer = XmlSerializer::new(Writer::new_with_indent(&mut buffer, b' ', 2));
    serializer.write_document(root)?;
    into_string(buffer)
}

/// Serialize an element tree to an XML byte vector.
pub fn to_xml_vec(root: &Element) -> FormatResult<Vec<u8>> {
    let mut buffer = Vec::new();
    to_xml_writer(root, &mut buffer)?;
    Ok(buffer)
}

/// Serialize an element tree to an XML writer.
pub fn to_xml_writer<W>(root: &Element, writer: W) -> FormatResult<()>
where
    W: Write,
{
    let mut serializer = XmlSerializer::new(Writer::new(writer));
    serializer.write_document(root)
}

fn into_string(buffer: Vec<u8>) -> FormatResult<String> {
    String::from_utf8(buffer).map_err(|e| FormatError::Malformed(e.to_string()))
}

/// XML serializer that writes directly to quick-xml.
struct XmlSerializer<W: Write> {
    writer: Writer<W>,
}

impl<W: Write> XmlSerializer<W> {
    fn new(writer: Writer<W>) -> Self {
        Self { writer }
    }

    fn write_document(&mut self, root: &Element) -> FormatResult<()> {
        self.writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        self.write_element(root, root.uses_xsi())
    }

    fn write_element(&mut self, element: &Element, declare_xsi: bool) -> FormatResult<()> {
        let mut start = BytesStart::new(element.name.as_str());
        if declare_xsi {
            start.push_attribute(utils::XSI_DECLARATION);
        }
        for (key, value) in &element.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }
        if element.nil {
            start.push_attribute((XSI_NIL, "true"));
        }

        match &element.content {
            Content::Empty => {
                self.writer.write_event(Event::Empty(start))?;
            }
            Content::Text(text) if text.is_empty() => {
                self.writer.write_event(Event::Empty(start))?;
            }
            Content::Text(text) => {
                self.writer.write_event(Event::Start(start))?;
                self.writer.write_event(Event::Text(BytesText::new(text)))?;
                self.write_end(&element.name)?;
            }
            Content::Children(children) => {
                self.writer.write_event(Event::Start(start))?;
                for child in children {
                    self.write_element(child, false)?;
                }
                self.write_end(&element.name)?;
            }
        }
        Ok(())
    }

    fn write_end(&mut self, name: &str) -> FormatResult<()> {
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }
}

//! Element stream.
//!
//! The codec's only I/O boundary: an ordered, depth-first tree of elements,
//! each with a name, attributes, a nil marker and either text or child
//! elements. Concrete textual encodings (see the `xml` module) convert to
//! and from this tree.

/// XML Schema instance namespace URI.
pub const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Qualified name of the nil marker attribute.
pub const XSI_NIL: &str = "xsi:nil";

/// Qualified name of the runtime type attribute.
pub const XSI_TYPE: &str = "xsi:type";

/// Child element holding the key of an entry-list map pair.
pub const ENTRY_KEY: &str = "key";

/// Child element holding the value of an entry-list map pair.
pub const ENTRY_VALUE: &str = "value";

/// Content of an element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Content {
    #[default]
    Empty,
    Text(String),
    Children(Vec<Element>),
}

/// One node of the element stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    /// Attributes other than the nil marker, in document order.
    pub attributes: Vec<(String, String)>,
    /// True if the element carries `xsi:nil="true"`.
    pub nil: bool,
    pub content: Content,
}

impl Element {
    /// Creates an empty element.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Creates a nil-marked element.
    pub fn nil(name: impl Into<String>) -> Self {
        Self {
            nil: true,
            ..Self::new(name)
        }
    }

    /// Creates a text-only element.
    pub fn text(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            content: Content::Text(text.into()),
            ..Self::new(name)
        }
    }

    /// Creates an element with child elements.
    ///
    /// An empty child list produces [`Content::Empty`].
    pub fn with_children(name: impl Into<String>, children: Vec<Element>) -> Self {
        let mut element = Self::new(name);
        element.set_children(children);
        element
    }

    /// Replaces the content with child elements.
    pub fn set_children(&mut self, children: Vec<Element>) {
        self.content = if children.is_empty() {
            Content::Empty
        } else {
            Content::Children(children)
        };
    }

    /// Adds an attribute.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    /// Adds the runtime type attribute.
    pub fn with_type_tag(self, type_name: impl Into<String>) -> Self {
        self.with_attribute(XSI_TYPE, type_name)
    }

    /// Returns the value of an attribute.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Returns the runtime type attribute, if any.
    pub fn type_tag(&self) -> Option<&str> {
        self.attribute(XSI_TYPE)
    }

    /// Returns the child elements (empty for text or empty content).
    pub fn children(&self) -> &[Element] {
        match &self.content {
            Content::Children(children) => children,
            _ => &[],
        }
    }

    /// Returns the element text; empty content reads as an empty string.
    pub fn text_content(&self) -> Option<&str> {
        match &self.content {
            Content::Text(text) => Some(text),
            Content::Empty => Some(""),
            Content::Children(_) => None,
        }
    }

    /// Returns the first child with the given name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children().iter().find(|child| child.name == name)
    }

    /// Returns true if this element or a descendant uses an `xsi:` marker.
    pub fn uses_xsi(&self) -> bool {
        self.nil
            || self.attributes.iter().any(|(key, _)| key.starts_with("xsi:"))
            || self.children().iter().any(Element::uses_xsi)
    }
}

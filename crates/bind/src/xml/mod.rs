//! XML text encoding of the element stream.
//!
//! This module converts between [`Element`] trees and XML documents using
//! quick-xml events, and offers shortcuts that run the codec and the text
//! layer in one call.
//!
//! ## Markers
//!
//! Two attributes from the XML Schema instance namespace carry codec
//! semantics:
//!
//! - **`xsi:nil="true"`**: the element is present but explicitly nil. It is
//!   exposed as [`Element::nil`], not as an attribute.
//! - **`xsi:type`**: names the runtime type of a wrapper element or of a
//!   class element holding a subtype instance.
//!
//! The writer declares `xmlns:xsi` on the root element when any element in
//! the tree uses a marker.
//!
//! ## Text
//!
//! Text is never trimmed. Predefined and numeric character references are
//! resolved, whitespace between child elements is dropped, and text next to
//! child elements is rejected as mixed content.
//!
//! ## Examples
//!
//! ```
//! use helios_bind::{ClassDecl, Codec, FieldDecl, FieldType, Object, ScalarKind, TypeRegistry};
//! use helios_bind::xml::{marshal_to_xml_string, unmarshal_xml_str};
//!
//! let registry = TypeRegistry::from_declarations([ClassDecl::new("Door")
//!     .field(FieldDecl::new("someInteger", FieldType::Scalar(ScalarKind::Int)).required())
//!     .field(FieldDecl::new("label", FieldType::Boxed(ScalarKind::String)).nillable())])?;
//! let codec = Codec::new(&registry);
//!
//! let door = Object::new("Door").with("someInteger", 3).with_nil("label");
//! let xml = marshal_to_xml_string(&codec, "door", "Door", &door)?;
//! assert_eq!(unmarshal_xml_str(&codec, "Door", &xml)?, door);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod de;
pub mod ser;
mod utils;

// Re-export serialization functions
pub use ser::{to_xml_string, to_xml_string_pretty, to_xml_vec, to_xml_writer};

// Re-export deserialization functions
pub use de::{MAX_ELEMENT_DEPTH, from_xml_reader, from_xml_slice, from_xml_str};

use crate::codec::Codec;
use crate::element::Element;
use crate::error::FormatResult;
use crate::value::Object;

/// Marshals `object` under a root element and writes it as XML text.
pub fn marshal_to_xml_string(
    codec: &Codec<'_>,
    root: &str,
    declared: &str,
    object: &Object,
) -> FormatResult<String> {
    let element = codec.marshal_root(root, declared, object)?;
    to_xml_string(&element)
}

/// Marshals `object` under a root element and writes indented XML text.
pub fn marshal_to_xml_string_pretty(
    codec: &Codec<'_>,
    root: &str,
    declared: &str,
    object: &Object,
) -> FormatResult<String> {
    let element = codec.marshal_root(root, declared, object)?;
    to_xml_string_pretty(&element)
}

/// Parses XML text and unmarshals its root element as `declared`.
pub fn unmarshal_xml_str(codec: &Codec<'_>, declared: &str, xml: &str) -> FormatResult<Object> {
    let element: Element = from_xml_str(xml)?;
    Ok(codec.unmarshal_root(declared, &element)?)
}

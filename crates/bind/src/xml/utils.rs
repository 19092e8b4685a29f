//! Helpers shared by the XML reader and writer.

use crate::element::XSI_NAMESPACE;
use crate::error::{FormatError, FormatResult};

/// Namespace declaration written on the root element when the document uses
/// `xsi:nil` or `xsi:type`.
pub const XSI_DECLARATION: (&str, &str) = ("xmlns:xsi", XSI_NAMESPACE);

/// Checks if raw text consists only of XML whitespace.
pub fn is_whitespace(text: &[u8]) -> bool {
    text.iter().all(|b| matches!(b, b' ' | b'\n' | b'\r' | b'\t'))
}

/// Decodes raw document bytes, rejecting invalid UTF-8.
pub fn utf8(bytes: &[u8]) -> FormatResult<&str> {
    std::str::from_utf8(bytes).map_err(|e| FormatError::Malformed(format!("Invalid UTF-8: {}", e)))
}

/// Checks if an attribute name is a namespace declaration.
pub fn is_namespace_declaration(key: &str) -> bool {
    key == "xmlns" || key.starts_with("xmlns:")
}

/// Interprets an `xsi:nil` attribute value.
pub fn is_nil_value(value: &str) -> bool {
    matches!(value.trim(), "true" | "1")
}

/// Resolves the name of a general entity reference (`amp`, `#60`, `#x3C`).
pub fn resolve_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = name.strip_prefix('#')?;
            let code = match code.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}

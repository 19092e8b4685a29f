//! Error types for the binding codec.
//!
//! Codec failures are reported as a [`BindError`]: a [`BindErrorKind`] plus the
//! [`FieldPath`] (element names from the document root) at which it occurred.
//! Every error is terminal for the marshal/unmarshal call that raised it.
//!
//! Failures of the textual layers (XML, JSON, IO) are reported as a
//! [`FormatError`], which wraps a [`BindError`] when the codec itself failed.

use std::fmt;

use thiserror::Error;

/// The kinds of failure the codec can report.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BindErrorKind {
    /// A class with the same name is already registered.
    #[error("type '{type_name}' is already registered")]
    DuplicateType { type_name: String },

    /// A type name does not resolve to a registered class or scalar.
    #[error("unknown type '{type_name}'")]
    UnknownType { type_name: String },

    /// A value's type is incompatible with its declared type.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// Nil was produced or encountered where the declaration forbids it.
    #[error("field '{field}' is not nillable")]
    NotNillableViolation { field: String },

    /// A required field had no value.
    #[error("required field '{field}' is missing")]
    MissingRequiredField { field: String },

    /// An inheritance chain declares the same element name more than once.
    #[error("element name '{element}' is declared by both '{first}' and '{second}'")]
    AmbiguousField {
        element: String,
        first: String,
        second: String,
    },

    /// No registered subtype of an abstract base matches the element.
    #[error("no subtype of abstract type '{base}' matches elements [{signature}]")]
    NoMatchingSubtype { base: String, signature: String },

    /// A class or field declaration breaks a registry invariant.
    #[error("invalid declaration of '{type_name}': {message}")]
    InvalidDeclaration { type_name: String, message: String },

    /// Element text could not be parsed as the declared scalar.
    #[error("invalid {expected} value '{text}'")]
    InvalidValue { expected: String, text: String },

    /// Nesting exceeded the configured depth limit.
    #[error("maximum nesting depth {max_depth} exceeded")]
    DepthExceeded { max_depth: usize },
}

/// Sequence of element names from the document root to the failing element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// Creates a path from its segments.
    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    /// Returns the element names, outermost first.
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Returns true if the error was raised outside any element.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.0 {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

/// A codec failure together with the location at which it occurred.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} (at {path})")]
pub struct BindError {
    pub kind: BindErrorKind,
    pub path: FieldPath,
}

impl BindError {
    /// Creates an error raised outside of any document traversal.
    pub fn new(kind: BindErrorKind) -> Self {
        Self {
            kind,
            path: FieldPath::default(),
        }
    }

    /// Attaches a path unless the error already carries a deeper one.
    pub fn within(mut self, path: &[String]) -> Self {
        if self.path.is_root() {
            self.path = FieldPath::new(path.to_vec());
        }
        self
    }

    /// Returns the error kind.
    pub fn kind(&self) -> &BindErrorKind {
        &self.kind
    }
}

impl From<BindErrorKind> for BindError {
    fn from(kind: BindErrorKind) -> Self {
        BindError::new(kind)
    }
}

/// Result type alias for codec operations.
pub type Result<T> = std::result::Result<T, BindError>;

/// Error types for the textual (XML/JSON) layers.
#[derive(Debug)]
pub enum FormatError {
    /// The codec rejected the document or value
    Bind(BindError),

    /// JSON serialization or deserialization error
    Json(serde_json::Error),

    /// XML parse or write error
    #[cfg(feature = "xml")]
    Xml(quick_xml::Error),

    /// IO error while reading or writing
    Io(std::io::Error),

    /// Structurally invalid document
    Malformed(String),
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatError::Bind(e) => write!(f, "binding error: {}", e),
            FormatError::Json(e) => write!(f, "JSON error: {}", e),
            #[cfg(feature = "xml")]
            FormatError::Xml(e) => write!(f, "XML error: {}", e),
            FormatError::Io(e) => write!(f, "IO error: {}", e),
            FormatError::Malformed(msg) => write!(f, "malformed document: {}", msg),
        }
    }
}

impl std::error::Error for FormatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FormatError::Bind(e) => Some(e),
            FormatError::Json(e) => Some(e),
            #[cfg(feature = "xml")]
            FormatError::Xml(e) => Some(e),
            FormatError::Io(e) => Some(e),
            FormatError::Malformed(_) => None,
        }
    }
}

impl From<BindError> for FormatError {
    fn from(err: BindError) -> Self {
        FormatError::Bind(err)
    }
}

impl From<serde_json::Error> for FormatError {
    fn from(err: serde_json::Error) -> Self {
        FormatError::Json(err)
    }
}

#[cfg(feature = "xml")]
impl From<quick_xml::Error> for FormatError {
    fn from(err: quick_xml::Error) -> Self {
        FormatError::Xml(err)
    }
}

impl From<std::io::Error> for FormatError {
    fn from(err: std::io::Error) -> Self {
        FormatError::Io(err)
    }
}

/// Result type alias for the textual layers.
pub type FormatResult<T> = std::result::Result<T, FormatError>;

//! Value model.
//!
//! An [`Object`] is an instance of a registered class: its runtime type name
//! plus one [`Bound`] slot per field. A slot distinguishes an absent field from
//! an explicit nil and from a present value, which is the distinction the wire
//! format preserves with omitted elements versus `xsi:nil` markers.

use std::collections::BTreeMap;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::registry::{ScalarKind, TypeRef};

/// Presence state of a field slot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Bound {
    /// The element is not present.
    #[default]
    Absent,
    /// The element is present with a nil marker.
    Nil,
    /// The element is present with content.
    Value(Value),
}

impl Bound {
    /// Returns true for [`Bound::Absent`].
    pub fn is_absent(&self) -> bool {
        matches!(self, Bound::Absent)
    }

    /// Returns true for [`Bound::Nil`].
    pub fn is_nil(&self) -> bool {
        matches!(self, Bound::Nil)
    }

    /// Returns the value, if present.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Bound::Value(value) => Some(value),
            _ => None,
        }
    }
}

impl From<Value> for Bound {
    fn from(value: Value) -> Self {
        Bound::Value(value)
    }
}

/// A present value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    Boolean(bool),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    Decimal(Decimal),
    Binary(Vec<u8>),
    Object(Object),
    /// Items of a repeated field, in document order.
    List(Vec<Bound>),
    /// Entry-list map, in document order; duplicate keys are kept.
    Map(Vec<Entry>),
    Wrapper(Wrapper),
}

impl Value {
    /// Returns the scalar kind of a scalar value.
    pub fn scalar_kind(&self) -> Option<ScalarKind> {
        match self {
            Value::Boolean(_) => Some(ScalarKind::Boolean),
            Value::Short(_) => Some(ScalarKind::Short),
            Value::Int(_) => Some(ScalarKind::Int),
            Value::Long(_) => Some(ScalarKind::Long),
            Value::Float(_) => Some(ScalarKind::Float),
            Value::Double(_) => Some(ScalarKind::Double),
            Value::String(_) => Some(ScalarKind::String),
            Value::Decimal(_) => Some(ScalarKind::Decimal),
            _ => None,
        }
    }

    /// Describes the value's shape, for error messages.
    pub fn kind_name(&self) -> String {
        match self {
            Value::Binary(_) => "binary".to_string(),
            Value::Object(object) => object.type_name().to_string(),
            Value::List(_) => "list".to_string(),
            Value::Map(_) => "map".to_string(),
            Value::Wrapper(wrapper) => format!("wrapper of {}", wrapper.runtime),
            scalar => scalar
                .scalar_kind()
                .map(|kind| kind.to_string())
                .unwrap_or_default(),
        }
    }

    /// Renders a scalar or binary value as element text.
    pub fn to_text(&self) -> Option<String> {
        let text = match self {
            Value::Boolean(b) => bool_to_string(*b).to_string(),
            Value::Short(v) => v.to_string(),
            Value::Int(v) => v.to_string(),
            Value::Long(v) => v.to_string(),
            Value::Float(v) => v.to_string(),
            Value::Double(v) => v.to_string(),
            Value::String(s) => s.clone(),
            Value::Decimal(d) => d.to_string(),
            Value::Binary(bytes) => BASE64.encode(bytes),
            _ => return None,
        };
        Some(text)
    }

    /// Parses element text as a scalar of the given kind.
    ///
    /// Returns `None` if the text is not a valid lexical form.
    pub fn parse_scalar(kind: ScalarKind, text: &str) -> Option<Value> {
        let trimmed = text.trim();
        match kind {
            ScalarKind::String => Some(Value::String(text.to_string())),
            ScalarKind::Boolean => match trimmed {
                "true" | "1" => Some(Value::Boolean(true)),
                "false" | "0" => Some(Value::Boolean(false)),
                _ => None,
            },
            ScalarKind::Short => trimmed.parse().ok().map(Value::Short),
            ScalarKind::Int => trimmed.parse().ok().map(Value::Int),
            ScalarKind::Long => trimmed.parse().ok().map(Value::Long),
            ScalarKind::Float => trimmed.parse().ok().map(Value::Float),
            ScalarKind::Double => trimmed.parse().ok().map(Value::Double),
            ScalarKind::Decimal => trimmed.parse().ok().map(Value::Decimal),
        }
    }

    /// Decodes base64 element text.
    pub fn parse_binary(text: &str) -> Option<Value> {
        let compact: String = text.split_whitespace().collect();
        BASE64.decode(compact).ok().map(Value::Binary)
    }
}

/// Converts a Rust boolean to its string representation for XML.
pub fn bool_to_string(b: bool) -> &'static str {
    if b { "true" } else { "false" }
}

macro_rules! impl_from_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::$variant(value)
                }
            }

            impl From<$ty> for Bound {
                fn from(value: $ty) -> Self {
                    Bound::Value(Value::$variant(value))
                }
            }
        )*
    };
}

impl_from_scalar! {
    bool => Boolean,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    f32 => Float,
    f64 => Double,
    String => String,
    Decimal => Decimal,
    Vec<u8> => Binary,
    Object => Object,
    Wrapper => Wrapper,
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<&str> for Bound {
    fn from(value: &str) -> Self {
        Bound::Value(Value::String(value.to_string()))
    }
}

/// One `(key, value)` pair of an entry-list map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub key: String,
    pub value: Bound,
}

impl Entry {
    /// Creates an entry.
    pub fn new(key: impl Into<String>, value: impl Into<Bound>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Value of a polymorphic wrapper field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wrapper {
    /// Static type of the field.
    pub declared: TypeRef,
    /// Type named in the element's `xsi:type` attribute.
    pub runtime: TypeRef,
    /// Mirrors the nillability of the field holding the wrapper.
    pub nillable: bool,
    /// `None` encodes a nil wrapper.
    pub payload: Option<Box<Value>>,
}

impl Wrapper {
    /// Creates a wrapper whose runtime type is inferred from the payload.
    ///
    /// Scalars take their own kind; objects take their runtime class. The
    /// wrapper is not nillable; see [`Wrapper::with_nillable`].
    pub fn new(declared: TypeRef, payload: impl Into<Value>) -> Self {
        let payload = payload.into();
        let runtime = match &payload {
            Value::Object(object) => TypeRef::Class(object.type_name().to_string()),
            other => other
                .scalar_kind()
                .map(TypeRef::Scalar)
                .unwrap_or_else(|| declared.clone()),
        };
        Self {
            declared,
            runtime,
            nillable: false,
            payload: Some(Box::new(payload)),
        }
    }

    /// Creates a nil wrapper of the declared type.
    pub fn nil(declared: TypeRef) -> Self {
        Self {
            runtime: declared.clone(),
            declared,
            nillable: true,
            payload: None,
        }
    }

    /// Sets the nillable flag.
    pub fn with_nillable(mut self, nillable: bool) -> Self {
        self.nillable = nillable;
        self
    }

    /// Returns true if the wrapper carries no payload.
    pub fn is_nil(&self) -> bool {
        self.payload.is_none()
    }
}

/// An instance of a registered class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Object {
    type_name: String,
    #[serde(default)]
    fields: BTreeMap<String, Bound>,
}

static ABSENT: Bound = Bound::Absent;

impl Object {
    /// Creates an instance with every field absent.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Returns the runtime class name.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Returns a field slot; unset fields read as [`Bound::Absent`].
    pub fn get(&self, field: &str) -> &Bound {
        self.fields.get(field).unwrap_or(&ABSENT)
    }

    /// Sets a field slot. Setting `Absent` clears the slot.
    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Bound>) {
        let field = field.into();
        match value.into() {
            Bound::Absent => {
                self.fields.remove(&field);
            }
            bound => {
                self.fields.insert(field, bound);
            }
        }
    }

    /// Builder form of [`Object::set`].
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Bound>) -> Self {
        self.set(field, value);
        self
    }

    /// Builder that sets a field to an explicit nil.
    pub fn with_nil(self, field: impl Into<String>) -> Self {
        self.with(field, Bound::Nil)
    }

    /// Iterates over set (non-absent) slots in field-name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Bound)> {
        self.fields.iter().map(|(name, bound)| (name.as_str(), bound))
    }

    pub(crate) fn slot_mut(&mut self, field: &str) -> &mut Bound {
        self.fields.entry(field.to_string()).or_default()
    }
}

/// Builds a list value from items.
pub fn list<I, T>(items: I) -> Value
where
    I: IntoIterator<Item = T>,
    T: Into<Bound>,
{
    Value::List(items.into_iter().map(Into::into).collect())
}

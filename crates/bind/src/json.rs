//! JSON view of the value model.
//!
//! Thin wrappers around `serde_json` for [`Object`] values and class
//! declarations. Slots keep their presence state, so a JSON document
//! distinguishes `"nil"` from an omitted field:
//!
//! ```json
//! {"typeName": "Door", "fields": {"someInteger": {"value": {"int": 3}}, "label": "nil"}}
//! ```

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::FormatResult;
use crate::value::Object;

/// Deserialize an object from a JSON string.
///
/// # Examples
///
/// ```
/// use helios_bind::json::from_json_str;
///
/// let door = from_json_str(r#"{"typeName": "Door", "fields": {"label": "nil"}}"#)?;
/// assert!(door.get("label").is_nil());
/// # Ok::<(), helios_bind::FormatError>(())
/// ```
pub fn from_json_str(s: &str) -> FormatResult<Object> {
    Ok(serde_json::from_str(s)?)
}

/// Deserialize an object from a JSON byte slice.
pub fn from_json_slice(v: &[u8]) -> FormatResult<Object> {
    Ok(serde_json::from_slice(v)?)
}

/// Deserialize any model type from a `serde_json::Value`.
pub fn from_json_value<T>(value: serde_json::Value) -> FormatResult<T>
where
    T: DeserializeOwned,
{
    Ok(serde_json::from_value(value)?)
}

/// Serialize a model value to a JSON string.
///
/// # Examples
///
/// ```
/// use helios_bind::json::to_json_string;
/// use helios_bind::Object;
///
/// let json = to_json_string(&Object::new("Door").with("someInteger", 3))?;
/// assert_eq!(json, r#"{"typeName":"Door","fields":{"someInteger":{"value":{"int":3}}}}"#);
/// # Ok::<(), helios_bind::FormatError>(())
/// ```
pub fn to_json_string<T>(value: &T) -> FormatResult<String>
where
    T: Serialize + ?Sized,
{
    Ok(serde_json::to_string(value)?)
}

/// Serialize a model value to a pretty-printed JSON string.
pub fn to_json_string_pretty<T>(value: &T) -> FormatResult<String>
where
    T: Serialize + ?Sized,
{
    Ok(serde_json::to_string_pretty(value)?)
}

/// Serialize a model value to a `serde_json::Value`.
pub fn to_json_value<T>(value: &T) -> FormatResult<serde_json::Value>
where
    T: Serialize + ?Sized,
{
    Ok(serde_json::to_value(value)?)
}

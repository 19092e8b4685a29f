//! Loading class declarations from JSON.
//!
//! A schema document lists class declarations in registration order:
//!
//! ```json
//! {
//!   "classes": [
//!     {"name": "Base", "abstract": true,
//!      "fields": [{"name": "a", "type": {"scalar": "int"}, "required": true}]},
//!     {"name": "Derived", "parent": "Base",
//!      "fields": [{"name": "b", "type": {"boxed": "boolean"}}]}
//!   ]
//! }
//! ```
//!
//! Parents must precede their subtypes. Field types may reference classes
//! declared later in the document; every reference is checked once the whole
//! document is registered.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::FormatResult;
use crate::registry::{ClassDecl, TypeRegistry};

/// Serialized form of a registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub classes: Vec<ClassDecl>,
}

impl Schema {
    /// Captures the declarations of a registry, in registration order.
    pub fn from_registry(registry: &TypeRegistry) -> Self {
        Self {
            classes: registry.classes().cloned().collect(),
        }
    }

    /// Registers every declaration and validates class references.
    pub fn into_registry(self) -> FormatResult<TypeRegistry> {
        let registry = TypeRegistry::from_declarations(self.classes)?;
        registry.validate()?;
        debug!(classes = registry.len(), "loaded schema");
        Ok(registry)
    }
}

/// Builds a registry from a JSON schema document.
pub fn registry_from_json_str(s: &str) -> FormatResult<TypeRegistry> {
    let schema: Schema = serde_json::from_str(s)?;
    schema.into_registry()
}

/// Builds a registry from an already-parsed JSON schema document.
pub fn registry_from_json_value(value: serde_json::Value) -> FormatResult<TypeRegistry> {
    let schema: Schema = serde_json::from_value(value)?;
    schema.into_registry()
}

/// Writes the declarations of a registry as a JSON schema document.
pub fn registry_to_json_string_pretty(registry: &TypeRegistry) -> FormatResult<String> {
    Ok(serde_json::to_string_pretty(&Schema::from_registry(registry))?)
}

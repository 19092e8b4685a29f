//! # Helios Bind
//!
//! A registry-driven binding codec between typed, polymorphic, inheriting
//! object graphs and XML documents.
//!
//! ## Features
//!
//! - **Presence**: explicit nil (`xsi:nil`) and absent fields stay distinct.
//! - **Inheritance**: subtypes substitute for their bases, selected either by
//!   an `xsi:type` attribute or by the element's structure.
//! - **Wrappers**: polymorphic wrapper fields carry a runtime type tag that
//!   is separate from the field's static type.
//! - **Collections**: repeated sibling elements and entry-list maps that keep
//!   duplicate keys in document order.
//!
//! ## Architecture
//!
//! - **Registry**: [`TypeRegistry`] holds [`ClassDecl`]s, built once and then
//!   only borrowed.
//! - **Codec**: [`Codec`] marshals [`Object`]s to an [`Element`] tree and
//!   back, consulting the wrapper and substitution resolvers.
//! - **Text layers**: the `xml` module (feature `xml`, on by default) writes
//!   and reads element trees as XML text; [`json`] gives a JSON view of
//!   values and [`schema`] loads declarations from JSON.
//!
//! ## Value ↔ XML Mapping
//!
//! | Slot | XML Pattern |
//! |------|-------------|
//! | `Absent` | element omitted |
//! | `Nil` | `<label xsi:nil="true"/>` |
//! | `Value(Int(3))` | `<someInteger>3</someInteger>` |
//! | `Value(List([a, b]))` | `<door>…</door><door>…</door>` |
//! | `Value(Map([(k, v)]))` | `<props><key>k</key><value>v</value></props>` |
//! | `Value(Wrapper(Window))` | `<aa xsi:type="Window">…</aa>` |
//! | subtype `Object` | `<door xsi:type="SlidingDoor">…</door>` |
//!
//! ## Examples
//!
//! ```
//! use helios_bind::{ClassDecl, Codec, FieldDecl, FieldType, Object, ScalarKind, TypeRegistry};
//!
//! let registry = TypeRegistry::from_declarations([
//!     ClassDecl::new("Base")
//!         .abstract_class()
//!         .field(FieldDecl::new("a", FieldType::Scalar(ScalarKind::Int)).required()),
//!     ClassDecl::new("Derived")
//!         .extends("Base")
//!         .field(FieldDecl::new("b", FieldType::Boxed(ScalarKind::Boolean))),
//! ])?;
//! let codec = Codec::new(&registry);
//!
//! let derived = Object::new("Derived").with("a", 5).with("b", true);
//! let elements = codec.marshal("Base", &derived)?;
//! assert_eq!(codec.unmarshal("Base", &elements)?, derived);
//! # Ok::<(), helios_bind::BindError>(())
//! ```

pub mod codec;
pub mod element;
pub mod error;
pub mod json;
mod marshal;
pub mod registry;
pub mod schema;
pub mod substitution;
mod unmarshal;
pub mod value;
pub mod wrapper;

#[cfg(feature = "xml")]
pub mod xml;

// Re-export common types
pub use codec::{Codec, CodecOptions};
pub use element::{Content, Element};
pub use error::{BindError, BindErrorKind, FieldPath, FormatError, FormatResult, Result};
pub use registry::{ClassDecl, FieldDecl, FieldType, ScalarKind, TypeRef, TypeRegistry};
pub use value::{Bound, Entry, Object, Value, Wrapper};
pub use wrapper::{DefaultWrapperFactory, WrapperFactory};

// Re-export schema loading at top level for convenience
pub use schema::{registry_from_json_str, registry_from_json_value};

//! Object graph to element stream.
//!
//! The marshaller walks an [`Object`] along its runtime class's layout
//! (inherited fields first) and emits one element per present field value:
//!
//! | Slot | Output |
//! |------|--------|
//! | `Absent` | nothing; `MissingRequiredField` if the field is required |
//! | `Nil` | `<name xsi:nil="true"/>`; `NotNillableViolation` unless nillable |
//! | list | one sibling element per item |
//! | map | one `<name><key/><value/></name>` element per pair |
//! | wrapper | element with `xsi:type` naming the payload's runtime type |
//! | object | element whose children are the object's fields |

use tracing::debug;

use crate::codec::{Codec, CodecOptions};
use crate::element::{Content, ENTRY_KEY, ENTRY_VALUE, Element};
use crate::error::{BindError, BindErrorKind, Result};
use crate::registry::{FieldDecl, FieldType, TypeRef, TypeRegistry};
use crate::value::{Bound, Entry, Object, Value};
use crate::wrapper::{WrapperFactories, WrapperResolver};

/// Single-use traversal state for one marshal call.
pub(crate) struct Marshaller<'a> {
    registry: &'a TypeRegistry,
    factories: &'a WrapperFactories,
    options: &'a CodecOptions,
    path: Vec<String>,
}

impl<'a> Marshaller<'a> {
    pub(crate) fn new(codec: &'a Codec<'_>) -> Self {
        Self {
            registry: codec.registry(),
            factories: codec.factories(),
            options: codec.options(),
            path: Vec::new(),
        }
    }

    pub(crate) fn root(mut self, name: &str, declared: &str, object: &Object) -> Result<Element> {
        self.path.push(name.to_string());
        self.object_element(name, declared, object)
    }

    /// Emits the field elements of `object`, checked against `declared`.
    pub(crate) fn object_fields(&mut self, declared: &str, object: &Object) -> Result<Vec<Element>> {
        let registry = self.registry;
        let runtime = object.type_name();
        registry.resolve(runtime).map_err(|e| self.locate(e))?;
        if !registry.is_subtype_of(runtime, declared) {
            return Err(self.fail(BindErrorKind::TypeMismatch {
                expected: declared.to_string(),
                found: runtime.to_string(),
            }));
        }
        if self.path.len() > self.options.max_depth {
            return Err(self.fail(BindErrorKind::DepthExceeded {
                max_depth: self.options.max_depth,
            }));
        }

        let layout = registry.layout(runtime).map_err(|e| self.locate(e))?;
        self.factories.index(&layout).map_err(|e| self.locate(e))?;
        for (name, _) in object.fields() {
            if !layout.iter().any(|field| field.name == name) {
                debug!(class = %runtime, field = %name, "ignoring value of undeclared field");
            }
        }

        let mut elements = Vec::new();
        for field in layout {
            let name = self.factories.element_name(field).into_owned();
            self.path.push(name.clone());
            let result = self.field(field, &name, object.get(&field.name), &mut elements);
            self.path.pop();
            result?;
        }
        Ok(elements)
    }

    fn field(
        &mut self,
        field: &FieldDecl,
        name: &str,
        bound: &Bound,
        out: &mut Vec<Element>,
    ) -> Result<()> {
        let value = match bound {
            Bound::Absent if field.required => {
                return Err(self.fail(BindErrorKind::MissingRequiredField {
                    field: field.name.clone(),
                }));
            }
            Bound::Absent => return Ok(()),
            Bound::Nil => {
                self.check_nillable(field)?;
                out.push(Element::nil(name));
                return Ok(());
            }
            Bound::Value(value) => value,
        };

        if field.polymorphic {
            out.push(self.wrapper(field, value)?);
            return Ok(());
        }

        match &field.field_type {
            FieldType::Repeated(item_type) => {
                let Value::List(items) = value else {
                    return Err(self.mismatch(&field.field_type, value));
                };
                for item in items {
                    match item {
                        Bound::Absent => {}
                        Bound::Nil => {
                            self.check_nillable(field)?;
                            out.push(Element::nil(name));
                        }
                        Bound::Value(item) => out.push(self.single(item_type, name, item)?),
                    }
                }
            }
            FieldType::Map(value_type) => {
                let Value::Map(entries) = value else {
                    return Err(self.mismatch(&field.field_type, value));
                };
                for entry in entries {
                    out.push(self.entry(field, value_type, name, entry)?);
                }
            }
            field_type => out.push(self.single(field_type, name, value)?),
        }
        Ok(())
    }

    fn single(&mut self, field_type: &FieldType, name: &str, value: &Value) -> Result<Element> {
        match field_type {
            FieldType::Scalar(kind) | FieldType::Boxed(kind) if value.scalar_kind() == Some(*kind) => {
                Ok(Element::text(name, value.to_text().unwrap_or_default()))
            }
            FieldType::Binary if matches!(value, Value::Binary(_)) => {
                Ok(Element::text(name, value.to_text().unwrap_or_default()))
            }
            FieldType::Class(declared) => match value {
                Value::Object(object) => self.object_element(name, declared, object),
                other => Err(self.mismatch(field_type, other)),
            },
            _ => Err(self.mismatch(field_type, value)),
        }
    }

    fn object_element(&mut self, name: &str, declared: &str, object: &Object) -> Result<Element> {
        let children = self.object_fields(declared, object)?;
        let element = Element::with_children(name, children);
        if self.options.emit_type_hints && object.type_name() != declared {
            return Ok(element.with_type_tag(object.type_name()));
        }
        Ok(element)
    }

    fn entry(
        &mut self,
        field: &FieldDecl,
        value_type: &FieldType,
        name: &str,
        entry: &Entry,
    ) -> Result<Element> {
        let mut children = vec![Element::text(ENTRY_KEY, entry.key.clone())];

        self.path.push(ENTRY_VALUE.to_string());
        let value = match &entry.value {
            Bound::Absent => Ok(None),
            Bound::Nil if matches!(value_type, FieldType::Scalar(_) | FieldType::Binary) => {
                Err(self.fail(BindErrorKind::NotNillableViolation {
                    field: field.name.clone(),
                }))
            }
            Bound::Nil => Ok(Some(Element::nil(ENTRY_VALUE))),
            Bound::Value(value) => self.single(value_type, ENTRY_VALUE, value).map(Some),
        };
        self.path.pop();

        children.extend(value?);
        Ok(Element::with_children(name, children))
    }

    fn wrapper(&mut self, field: &FieldDecl, value: &Value) -> Result<Element> {
        let Value::Wrapper(wrapper) = value else {
            return Err(self.fail(BindErrorKind::TypeMismatch {
                expected: format!("wrapper of {}", field.field_type),
                found: value.kind_name(),
            }));
        };

        let resolver = WrapperResolver::new(self.registry, self.factories);
        let mut element = resolver.shell(field, wrapper).map_err(|e| self.locate(e))?;

        let Some(payload) = wrapper.payload.as_deref() else {
            return Ok(element);
        };
        match (&wrapper.runtime, payload) {
            (TypeRef::Scalar(kind), payload) if payload.scalar_kind() == Some(*kind) => {
                element.content = Content::Text(payload.to_text().unwrap_or_default());
            }
            (TypeRef::Class(runtime), Value::Object(object)) if object.type_name() == runtime => {
                let children = self.object_fields(runtime, object)?;
                element.set_children(children);
            }
            (runtime, payload) => {
                return Err(self.fail(BindErrorKind::TypeMismatch {
                    expected: runtime.to_string(),
                    found: payload.kind_name(),
                }));
            }
        }
        Ok(element)
    }

    fn check_nillable(&self, field: &FieldDecl) -> Result<()> {
        if field.nillable {
            Ok(())
        } else {
            Err(self.fail(BindErrorKind::NotNillableViolation {
                field: field.name.clone(),
            }))
        }
    }

    fn mismatch(&self, expected: &FieldType, found: &Value) -> BindError {
        self.fail(BindErrorKind::TypeMismatch {
            expected: expected.to_string(),
            found: found.kind_name(),
        })
    }

    fn fail(&self, kind: BindErrorKind) -> BindError {
        BindError::new(kind).within(&self.path)
    }

    fn locate(&self, err: BindError) -> BindError {
        err.within(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ClassDecl, ScalarKind};
    use crate::value::list;

    fn registry() -> TypeRegistry {
        TypeRegistry::from_declarations([
            ClassDecl::new("Door")
                .field(FieldDecl::new("someInteger", FieldType::Scalar(ScalarKind::Int)).required())
                .field(FieldDecl::new("label", FieldType::Boxed(ScalarKind::String)).nillable()),
            ClassDecl::new("SlidingDoor")
                .extends("Door")
                .field(FieldDecl::new("track", FieldType::Boxed(ScalarKind::String))),
            ClassDecl::new("Car")
                .field(FieldDecl::new("door", FieldType::repeated(FieldType::class("Door"))))
                .field(FieldDecl::new("spare", FieldType::class("Door"))),
        ])
        .unwrap()
    }

    #[test]
    fn test_fields_follow_layout_order() {
        let registry = registry();
        let codec = Codec::new(&registry);
        let door = Object::new("SlidingDoor")
            .with("track", "left")
            .with("someInteger", 2);

        let elements = codec.marshal("Door", &door).unwrap();
        let names: Vec<&str> = elements.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["someInteger", "track"]);
    }

    #[test]
    fn test_subtype_element_carries_type_hint() {
        let registry = registry();
        let codec = Codec::new(&registry);
        let car = Object::new("Car").with(
            "spare",
            Object::new("SlidingDoor").with("someInteger", 1),
        );

        let elements = codec.marshal("Car", &car).unwrap();
        assert_eq!(elements[0].type_tag(), Some("SlidingDoor"));

        let codec = Codec::new(&registry).with_options(CodecOptions {
            emit_type_hints: false,
            ..Default::default()
        });
        let elements = codec.marshal("Car", &car).unwrap();
        assert_eq!(elements[0].type_tag(), None);
    }

    #[test]
    fn test_error_path_points_at_field() {
        let registry = registry();
        let codec = Codec::new(&registry);
        let car = Object::new("Car").with("door", list([Object::new("Door")]));

        let err = codec.marshal_root("car", "Car", &car).unwrap_err();
        assert!(matches!(err.kind, BindErrorKind::MissingRequiredField { .. }));
        assert_eq!(err.path.to_string(), "/car/door/someInteger");
    }

    #[test]
    fn test_wrong_scalar_kind_is_mismatch() {
        let registry = registry();
        let codec = Codec::new(&registry);
        let door = Object::new("Door").with("someInteger", "three");

        let err = codec.marshal("Door", &door).unwrap_err();
        assert_eq!(
            err.kind,
            BindErrorKind::TypeMismatch {
                expected: "int".to_string(),
                found: "string".to_string(),
            }
        );
    }

    #[test]
    fn test_unrelated_runtime_class_is_mismatch() {
        let registry = registry();
        let codec = Codec::new(&registry);
        let car = Object::new("Car").with("spare", Object::new("Car"));

        let err = codec.marshal("Car", &car).unwrap_err();
        assert!(matches!(err.kind, BindErrorKind::TypeMismatch { .. }));
    }
}

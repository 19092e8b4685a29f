//! Element stream to object graph.
//!
//! Child elements are consumed in document order and matched by element name
//! against the concrete class's layout. Unknown elements are skipped.
//! Repeated occurrences accumulate into a list, map occurrences into an
//! entry list, and a second occurrence of a single-valued field replaces
//! the first.

use tracing::{debug, warn};

use crate::codec::{Codec, CodecOptions};
use crate::element::{ENTRY_KEY, ENTRY_VALUE, Element};
use crate::error::{BindError, BindErrorKind, Result};
use crate::registry::{ClassDecl, FieldDecl, FieldType, ScalarKind, TypeRef, TypeRegistry};
use crate::substitution::{SubstitutionResolver, signature};
use crate::value::{Bound, Entry, Object, Value};
use crate::wrapper::{WrapperFactories, WrapperResolver};

/// Single-use traversal state for one unmarshal call.
pub(crate) struct Unmarshaller<'a> {
    registry: &'a TypeRegistry,
    factories: &'a WrapperFactories,
    options: &'a CodecOptions,
    path: Vec<String>,
}

impl<'a> Unmarshaller<'a> {
    pub(crate) fn new(codec: &'a Codec<'_>) -> Self {
        Self {
            registry: codec.registry(),
            factories: codec.factories(),
            options: codec.options(),
            path: Vec::new(),
        }
    }

    pub(crate) fn root(mut self, declared: &str, element: &Element) -> Result<Object> {
        self.path.push(element.name.clone());
        let class = self.concrete_class(declared, element)?;
        self.fill(class, element.children())
    }

    /// Builds an instance of `class` from its child elements.
    pub(crate) fn fill(&mut self, class: &'a ClassDecl, children: &[Element]) -> Result<Object> {
        if self.path.len() > self.options.max_depth {
            return Err(self.fail(BindErrorKind::DepthExceeded {
                max_depth: self.options.max_depth,
            }));
        }
        debug!(class = %class.name, elements = children.len(), "unmarshalling object");

        let registry = self.registry;
        let factories = self.factories;
        let layout = registry.layout(&class.name).map_err(|e| self.locate(e))?;
        let by_name = factories.index(&layout).map_err(|e| self.locate(e))?;

        let mut object = Object::new(class.name.as_str());
        for child in children {
            let Some(field) = by_name.get(child.name.as_str()) else {
                debug!(class = %class.name, element = %child.name, "skipping unknown element");
                continue;
            };
            self.path.push(child.name.clone());
            let result = self.occurrence(field, child, &mut object);
            self.path.pop();
            result?;
        }

        self.finish(&layout, &mut object)?;
        Ok(object)
    }

    fn occurrence(&mut self, field: &FieldDecl, element: &Element, object: &mut Object) -> Result<()> {
        match &field.field_type {
            FieldType::Repeated(item_type) => {
                let item = if element.nil {
                    self.check_nillable(field)?;
                    Bound::Nil
                } else {
                    Bound::Value(self.single(item_type, element)?)
                };
                match object.slot_mut(&field.name) {
                    Bound::Value(Value::List(items)) => items.push(item),
                    slot => *slot = Bound::Value(Value::List(vec![item])),
                }
            }
            FieldType::Map(value_type) => {
                if element.nil {
                    self.check_nillable(field)?;
                }
                let entry = self.entry(field, value_type, element)?;
                match object.slot_mut(&field.name) {
                    Bound::Value(Value::Map(entries)) => entries.push(entry),
                    slot => *slot = Bound::Value(Value::Map(vec![entry])),
                }
            }
            field_type => {
                let bound = if field.polymorphic {
                    self.wrapper(field, element)?
                } else if element.nil {
                    self.check_nillable(field)?;
                    Bound::Nil
                } else {
                    Bound::Value(self.single(field_type, element)?)
                };
                if !object.get(&field.name).is_absent() {
                    warn!(
                        field = %field.name,
                        element = %element.name,
                        "field occurs more than once; keeping the last occurrence"
                    );
                }
                object.set(field.name.as_str(), bound);
            }
        }
        Ok(())
    }

    fn single(&mut self, field_type: &FieldType, element: &Element) -> Result<Value> {
        match field_type {
            FieldType::Scalar(kind) | FieldType::Boxed(kind) => self.scalar(*kind, element),
            FieldType::Binary => {
                let text = self.text(element, "binary")?;
                Value::parse_binary(text).ok_or_else(|| {
                    self.fail(BindErrorKind::InvalidValue {
                        expected: "binary".to_string(),
                        text: text.to_string(),
                    })
                })
            }
            FieldType::Class(declared) => {
                let class = self.concrete_class(declared, element)?;
                self.fill(class, element.children()).map(Value::Object)
            }
            nested => Err(self.fail(BindErrorKind::TypeMismatch {
                expected: "single element".to_string(),
                found: nested.to_string(),
            })),
        }
    }

    fn scalar(&self, kind: ScalarKind, element: &Element) -> Result<Value> {
        let text = self.text(element, kind.as_str())?;
        Value::parse_scalar(kind, text).ok_or_else(|| {
            self.fail(BindErrorKind::InvalidValue {
                expected: kind.to_string(),
                text: text.to_string(),
            })
        })
    }

    fn text<'e>(&self, element: &'e Element, expected: &str) -> Result<&'e str> {
        element.text_content().ok_or_else(|| {
            self.fail(BindErrorKind::TypeMismatch {
                expected: expected.to_string(),
                found: "child elements".to_string(),
            })
        })
    }

    /// Picks the class to instantiate for an element of static type
    /// `declared`: its `xsi:type` if present, else by substitution.
    fn concrete_class(&self, declared: &str, element: &Element) -> Result<&'a ClassDecl> {
        let Some(tag) = element.type_tag() else {
            return SubstitutionResolver::new(self.registry, self.factories)
                .resolve(declared, element.children())
                .map_err(|e| self.locate(e));
        };

        let resolver = self.wrappers();
        let runtime = resolver.parse_type_name(tag).map_err(|e| self.locate(e))?;
        resolver
            .check_compatible(&TypeRef::class(declared), &runtime)
            .map_err(|e| self.locate(e))?;
        self.instantiable(tag, element)
    }

    fn instantiable(&self, type_name: &str, element: &Element) -> Result<&'a ClassDecl> {
        let class = self.registry.resolve(type_name).map_err(|e| self.locate(e))?;
        if class.is_abstract {
            return Err(self.fail(BindErrorKind::NoMatchingSubtype {
                base: type_name.to_string(),
                signature: signature(element.children())
                    .into_iter()
                    .collect::<Vec<_>>()
                    .join(", "),
            }));
        }
        Ok(class)
    }

    fn entry(&mut self, field: &FieldDecl, value_type: &FieldType, element: &Element) -> Result<Entry> {
        let mut key = None;
        let mut value = Bound::Absent;
        for child in element.children() {
            match child.name.as_str() {
                ENTRY_KEY => key = child.text_content().map(str::to_string),
                ENTRY_VALUE => {
                    self.path.push(ENTRY_VALUE.to_string());
                    let result = if child.nil {
                        if matches!(value_type, FieldType::Scalar(_) | FieldType::Binary) {
                            Err(self.fail(BindErrorKind::NotNillableViolation {
                                field: field.name.clone(),
                            }))
                        } else {
                            Ok(Bound::Nil)
                        }
                    } else {
                        self.single(value_type, child).map(Bound::Value)
                    };
                    self.path.pop();
                    value = result?;
                }
                other => debug!(field = %field.name, element = %other, "skipping unknown entry element"),
            }
        }

        Ok(Entry {
            key: key.unwrap_or_default(),
            value,
        })
    }

    fn wrapper(&mut self, field: &FieldDecl, element: &Element) -> Result<Bound> {
        let resolver = self.wrappers();
        let declared = resolver.declared_type(field).map_err(|e| self.locate(e))?;

        let runtime = match resolver
            .tagged_type(&declared, element)
            .map_err(|e| self.locate(e))?
        {
            Some(runtime) => runtime,
            None if element.nil => {
                self.check_nillable(field)?;
                return Ok(Bound::Nil);
            }
            None => match &declared {
                TypeRef::Scalar(_) => declared.clone(),
                TypeRef::Class(base) => {
                    let class = SubstitutionResolver::new(self.registry, self.factories)
                        .resolve(base, element.children())
                        .map_err(|e| self.locate(e))?;
                    TypeRef::Class(class.name.clone())
                }
            },
        };

        if element.nil {
            self.check_nillable(field)?;
            return Ok(Bound::Value(Value::Wrapper(
                resolver.build(field, declared, runtime, None),
            )));
        }

        let payload = match &runtime {
            TypeRef::Scalar(kind) => self.scalar(*kind, element)?,
            TypeRef::Class(name) => {
                let class = self.instantiable(name, element)?;
                Value::Object(self.fill(class, element.children())?)
            }
        };
        Ok(Bound::Value(Value::Wrapper(resolver.build(
            field,
            declared,
            runtime,
            Some(payload),
        ))))
    }

    /// Applies collection defaults and required-field checks once all
    /// children of an object have been consumed.
    fn finish(&self, layout: &[&FieldDecl], object: &mut Object) -> Result<()> {
        for field in layout {
            let slot = object.get(&field.name);
            match &field.field_type {
                FieldType::Repeated(_) if slot.is_absent() => {
                    object.set(field.name.as_str(), Value::List(Vec::new()));
                }
                FieldType::Map(_) if slot.is_absent() => {
                    object.set(field.name.as_str(), Value::Map(Vec::new()));
                }
                FieldType::Repeated(_) => {
                    if let Bound::Value(Value::List(items)) = slot
                        && items.len() == 1
                        && items[0].is_nil()
                    {
                        object.set(field.name.as_str(), Bound::Nil);
                    }
                }
                _ if field.required && self.options.strict_required && slot.is_absent() => {
                    let mut path = self.path.clone();
                    path.push(self.factories.element_name(field).into_owned());
                    return Err(BindError::new(BindErrorKind::MissingRequiredField {
                        field: field.name.clone(),
                    })
                    .within(&path));
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn wrappers(&self) -> WrapperResolver<'a> {
        WrapperResolver::new(self.registry, self.factories)
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

    fn fail(&self, kind: BindErrorKind) -> BindError {
        BindError::new(kind).within(&self.path)
    }

    fn locate(&self, err: BindError) -> BindError {
        err.within(&self.path)
    }
}

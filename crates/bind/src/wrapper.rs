//! Polymorphic wrapper elements.
//!
//! A wrapper field is written as an element carrying an `xsi:type` attribute
//! that names the runtime type of its payload, independently of the field's
//! static type. This module validates runtime types against declared types
//! and hosts the [`WrapperFactory`] hook through which callers control how
//! wrapper elements are named and how wrapper values are built.
//!
//! ```xml
//! <aa xsi:type="Window"><height>3</height></aa>
//! <stringJAXBElement xsi:type="xs:string">text</stringJAXBElement>
//! <internalClassJAXBElement xsi:type="Door" xsi:nil="true"/>
//! ```

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::element::Element;
use crate::error::{BindError, BindErrorKind, Result};
use crate::registry::{FieldDecl, SCALAR_TYPE_PREFIX, ScalarKind, TypeRef, TypeRegistry};
use crate::value::{Value, Wrapper};

/// Hook for constructing wrapper elements and values, keyed by the declared
/// static type of the wrapper field.
pub trait WrapperFactory: Send + Sync {
    /// Element name used for `field` on the wire.
    fn element_name<'f>(&self, field: &'f FieldDecl) -> Cow<'f, str> {
        Cow::Borrowed(field.element_name())
    }

    /// Nillable flag carried by wrapper values of `field`. Marshalling
    /// rejects a wrapper whose flag disagrees.
    fn nillable(&self, field: &FieldDecl) -> bool {
        field.nillable
    }

    /// Builds the wrapper value for a decoded element.
    fn create(
        &self,
        field: &FieldDecl,
        declared: TypeRef,
        runtime: TypeRef,
        payload: Option<Value>,
    ) -> Wrapper {
        Wrapper {
            declared,
            runtime,
            nillable: self.nillable(field),
            payload: payload.map(Box::new),
        }
    }
}

/// Factory used for declared types without a registered factory.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultWrapperFactory;

impl WrapperFactory for DefaultWrapperFactory {}

/// Wrapper factories by declared type name.
#[derive(Clone, Default)]
pub struct WrapperFactories {
    by_type: HashMap<String, Arc<dyn WrapperFactory>>,
}

impl fmt::Debug for WrapperFactories {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<&str> = self.by_type.keys().map(String::as_str).collect();
        types.sort_unstable();
        f.debug_struct("WrapperFactories")
            .field("types", &types)
            .finish()
    }
}

impl WrapperFactories {
    /// Registers a factory for wrapper fields of the given declared type.
    pub fn register(&mut self, declared: &TypeRef, factory: impl WrapperFactory + 'static) {
        self.by_type.insert(declared.type_name(), Arc::new(factory));
    }

    /// Returns the factory responsible for a wrapper field.
    pub fn for_field(&self, field: &FieldDecl) -> &dyn WrapperFactory {
        field
            .field_type
            .as_type_ref()
            .and_then(|declared| self.by_type.get(&declared.type_name()))
            .map(|factory| factory.as_ref())
            .unwrap_or(&DefaultWrapperFactory)
    }

    /// Element name of a field; wrapper fields are named by their factory.
    pub fn element_name<'f>(&self, field: &'f FieldDecl) -> Cow<'f, str> {
        if field.polymorphic {
            self.for_field(field).element_name(field)
        } else {
            Cow::Borrowed(field.element_name())
        }
    }

    /// Indexes a class layout by wire element name.
    ///
    /// Fails with `AmbiguousField` when factory naming maps two fields onto
    /// the same element name.
    pub fn index<'f>(
        &self,
        layout: &[&'f FieldDecl],
    ) -> Result<HashMap<Cow<'f, str>, &'f FieldDecl>> {
        let mut by_name = HashMap::with_capacity(layout.len());
        for &field in layout {
            let name = self.element_name(field);
            if let Some(first) = by_name.insert(name.clone(), field) {
                return Err(BindError::new(BindErrorKind::AmbiguousField {
                    element: name.into_owned(),
                    first: first.name.clone(),
                    second: field.name.clone(),
                }));
            }
        }
        Ok(by_name)
    }
}

/// Validates and resolves the runtime types of wrapper elements.
pub struct WrapperResolver<'a> {
    registry: &'a TypeRegistry,
    factories: &'a WrapperFactories,
}

impl<'a> WrapperResolver<'a> {
    /// Creates a resolver over a registry and factory set.
    pub fn new(registry: &'a TypeRegistry, factories: &'a WrapperFactories) -> Self {
        Self {
            registry,
            factories,
        }
    }

    /// Returns the declared static type of a wrapper field.
    pub fn declared_type(&self, field: &FieldDecl) -> Result<TypeRef> {
        field.field_type.as_type_ref().ok_or_else(|| {
            BindError::new(BindErrorKind::InvalidDeclaration {
                type_name: field.name.clone(),
                message: format!("{} cannot be wrapped", field.field_type),
            })
        })
    }

    /// Parses a type name as written in `xsi:type`.
    pub fn parse_type_name(&self, type_name: &str) -> Result<TypeRef> {
        let unknown = || {
            BindError::new(BindErrorKind::UnknownType {
                type_name: type_name.to_string(),
            })
        };

        if let Some(local) = type_name.strip_prefix(SCALAR_TYPE_PREFIX) {
            return ScalarKind::from_name(local)
                .map(TypeRef::Scalar)
                .ok_or_else(unknown);
        }

        if self.registry.contains(type_name) {
            Ok(TypeRef::Class(type_name.to_string()))
        } else {
            Err(unknown())
        }
    }

    /// Checks that `runtime` is `declared` or a registered subtype of it.
    pub fn check_compatible(&self, declared: &TypeRef, runtime: &TypeRef) -> Result<()> {
        let compatible = match (declared, runtime) {
            (TypeRef::Scalar(expected), TypeRef::Scalar(found)) => expected == found,
            (TypeRef::Class(base), TypeRef::Class(name)) => self.registry.is_subtype_of(name, base),
            _ => false,
        };

        if compatible {
            Ok(())
        } else {
            Err(BindError::new(BindErrorKind::TypeMismatch {
                expected: declared.to_string(),
                found: runtime.to_string(),
            }))
        }
    }

    /// Builds the element shell for a wrapper value: name, `xsi:type` and,
    /// for a nil payload, the nil marker. Payload content is filled in by the
    /// caller.
    pub fn shell(&self, field: &FieldDecl, wrapper: &Wrapper) -> Result<Element> {
        let declared = self.declared_type(field)?;
        if wrapper.declared != declared {
            return Err(BindError::new(BindErrorKind::TypeMismatch {
                expected: declared.to_string(),
                found: wrapper.declared.to_string(),
            }));
        }
        if let TypeRef::Class(name) = &wrapper.runtime {
            self.registry.resolve(name)?;
        }
        self.check_compatible(&declared, &wrapper.runtime)?;

        if wrapper.is_nil() && !field.nillable {
            return Err(BindError::new(BindErrorKind::NotNillableViolation {
                field: field.name.clone(),
            }));
        }
        let expected = self.factories.for_field(field).nillable(field);
        if wrapper.nillable != expected {
            return Err(BindError::new(BindErrorKind::TypeMismatch {
                expected: nillable_label(expected, &declared),
                found: nillable_label(wrapper.nillable, &wrapper.declared),
            }));
        }

        let name = self.factories.element_name(field);
        let element = Element::new(name.into_owned()).with_type_tag(wrapper.runtime.type_name());
        if wrapper.is_nil() {
            return Ok(Element {
                nil: true,
                ..element
            });
        }
        Ok(element)
    }

    /// Resolves the `xsi:type` of a wrapper element, if present.
    pub fn tagged_type(&self, declared: &TypeRef, element: &Element) -> Result<Option<TypeRef>> {
        let Some(tag) = element.type_tag() else {
            return Ok(None);
        };
        let runtime = self.parse_type_name(tag)?;
        self.check_compatible(declared, &runtime)?;
        Ok(Some(runtime))
    }

    /// Builds a wrapper value through the field's factory.
    pub fn build(
        &self,
        field: &FieldDecl,
        declared: TypeRef,
        runtime: TypeRef,
        payload: Option<Value>,
    ) -> Wrapper {
        self.factories
            .for_field(field)
            .create(field, declared, runtime, payload)
    }
}

fn nillable_label(nillable: bool, declared: &TypeRef) -> String {
    if nillable {
        format!("nillable wrapper of {}", declared)
    } else {
        format!("non-nillable wrapper of {}", declared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{ClassDecl, FieldType};

    fn registry() -> TypeRegistry {
        TypeRegistry::from_declarations([
            ClassDecl::new("Window"),
            ClassDecl::new("RoundWindow").extends("Window"),
            ClassDecl::new("Door"),
        ])
        .unwrap()
    }

    struct Prefixed;

    impl WrapperFactory for Prefixed {
        fn element_name<'f>(&self, field: &'f FieldDecl) -> Cow<'f, str> {
            Cow::Owned(format!("wrapped{}", field.element_name()))
        }
    }

    #[test]
    fn test_parse_type_names() {
        let registry = registry();
        let factories = WrapperFactories::default();
        let resolver = WrapperResolver::new(&registry, &factories);

        assert_eq!(
            resolver.parse_type_name("xs:string").unwrap(),
            TypeRef::Scalar(ScalarKind::String)
        );
        assert_eq!(
            resolver.parse_type_name("Window").unwrap(),
            TypeRef::class("Window")
        );
        assert!(matches!(
            resolver.parse_type_name("xs:date").unwrap_err().kind,
            BindErrorKind::UnknownType { .. }
        ));
        assert!(matches!(
            resolver.parse_type_name("Sunroof").unwrap_err().kind,
            BindErrorKind::UnknownType { .. }
        ));
    }

    #[test]
    fn test_compatibility() {
        let registry = registry();
        let factories = WrapperFactories::default();
        let resolver = WrapperResolver::new(&registry, &factories);

        let window = TypeRef::class("Window");
        assert!(resolver.check_compatible(&window, &TypeRef::class("RoundWindow")).is_ok());
        assert!(resolver.check_compatible(&window, &TypeRef::class("Door")).is_err());
        assert!(resolver
            .check_compatible(&window, &TypeRef::Scalar(ScalarKind::Int))
            .is_err());
    }

    #[test]
    fn test_factory_names_wrapper_fields_only() {
        let mut factories = WrapperFactories::default();
        factories.register(&TypeRef::class("Window"), Prefixed);

        let wrapped = FieldDecl::new("aa", FieldType::class("Window")).wrapper();
        let plain = FieldDecl::new("aa", FieldType::class("Window"));
        let other = FieldDecl::new("door", FieldType::class("Door")).wrapper();

        assert_eq!(factories.element_name(&wrapped), "wrappedaa");
        assert_eq!(factories.element_name(&plain), "aa");
        assert_eq!(factories.element_name(&other), "door");
    }

    #[test]
    fn test_index_rejects_colliding_factory_names() {
        let mut factories = WrapperFactories::default();
        let wrapped = FieldDecl::new("aa", FieldType::class("Window")).wrapper();
        let plain = FieldDecl::new("wrappedaa", FieldType::class("Door"));

        let index = factories.index(&[&wrapped, &plain]).unwrap();
        assert_eq!(index.len(), 2);

        factories.register(&TypeRef::class("Window"), Prefixed);
        let err = factories.index(&[&wrapped, &plain]).unwrap_err();
        assert_eq!(
            err.kind,
            BindErrorKind::AmbiguousField {
                element: "wrappedaa".to_string(),
                first: "aa".to_string(),
                second: "wrappedaa".to_string(),
            }
        );
    }

    #[test]
    fn test_nil_shell_requires_nillable_field() {
        let registry = registry();
        let factories = WrapperFactories::default();
        let resolver = WrapperResolver::new(&registry, &factories);
        let wrapper = Wrapper::nil(TypeRef::class("Window"));

        let field = FieldDecl::new("aa", FieldType::class("Window")).wrapper();
        assert!(matches!(
            resolver.shell(&field, &wrapper).unwrap_err().kind,
            BindErrorKind::NotNillableViolation { .. }
        ));

        let shell = resolver.shell(&field.nillable(), &wrapper).unwrap();
        assert!(shell.nil);
        assert_eq!(shell.type_tag(), Some("Window"));
    }

    #[test]
    fn test_shell_checks_nillable_flag_against_field() {
        let registry = registry();
        let factories = WrapperFactories::default();
        let resolver = WrapperResolver::new(&registry, &factories);
        let field = FieldDecl::new("aa", FieldType::class("Window")).wrapper();
        let wrapper = Wrapper::new(TypeRef::class("Window"), crate::value::Object::new("Window"));

        assert!(resolver.shell(&field, &wrapper).is_ok());
        assert!(matches!(
            resolver.shell(&field.clone().nillable(), &wrapper).unwrap_err().kind,
            BindErrorKind::TypeMismatch { .. }
        ));
        assert!(resolver
            .shell(&field.nillable(), &wrapper.with_nillable(true))
            .is_ok());
    }
}

//! Codec entry point.
//!
//! A [`Codec`] borrows a populated [`TypeRegistry`] and bundles it with the
//! wrapper factories and [`CodecOptions`] used by every marshal and unmarshal
//! call. Codecs are cheap to build and `Send + Sync`, so one registry can back
//! any number of codecs on any number of threads.

use tracing::debug;

use crate::element::Element;
use crate::error::{BindError, BindErrorKind, Result};
use crate::marshal::Marshaller;
use crate::registry::{TypeRef, TypeRegistry};
use crate::substitution::SubstitutionResolver;
use crate::unmarshal::Unmarshaller;
use crate::value::Object;
use crate::wrapper::{WrapperFactories, WrapperFactory};

/// Behavior switches for marshalling and unmarshalling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecOptions {
    /// Write `xsi:type` on class elements whose runtime class differs from
    /// the field's static type.
    pub emit_type_hints: bool,
    /// Fail unmarshalling when a required non-collection field is missing.
    pub strict_required: bool,
    /// Maximum element nesting depth.
    pub max_depth: usize,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            emit_type_hints: true,
            strict_required: false,
            max_depth: 64,
        }
    }
}

/// Marshals and unmarshals objects against a borrowed registry.
#[derive(Debug)]
pub struct Codec<'r> {
    registry: &'r TypeRegistry,
    factories: WrapperFactories,
    options: CodecOptions,
}

impl<'r> Codec<'r> {
    /// Creates a codec with default options and wrapper factories.
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self {
            registry,
            factories: WrapperFactories::default(),
            options: CodecOptions::default(),
        }
    }

    /// Replaces the options.
    pub fn with_options(mut self, options: CodecOptions) -> Self {
        self.options = options;
        self
    }

    /// Registers a wrapper factory for wrapper fields of a declared type.
    pub fn with_wrapper_factory(
        mut self,
        declared: TypeRef,
        factory: impl WrapperFactory + 'static,
    ) -> Self {
        self.factories.register(&declared, factory);
        self
    }

    pub fn registry(&self) -> &'r TypeRegistry {
        self.registry
    }

    pub fn options(&self) -> &CodecOptions {
        &self.options
    }

    pub fn factories(&self) -> &WrapperFactories {
        &self.factories
    }

    /// Marshals the fields of `object` into a sequence of sibling elements.
    ///
    /// `class` is the static type; the object's runtime class must be it or
    /// one of its subtypes.
    pub fn marshal(&self, class: &str, object: &Object) -> Result<Vec<Element>> {
        Marshaller::new(self).object_fields(class, object)
    }

    /// Marshals `object` as a document root element named `element_name`.
    pub fn marshal_root(
        &self,
        element_name: &str,
        declared: &str,
        object: &Object,
    ) -> Result<Element> {
        debug!(element = %element_name, class = %object.type_name(), "marshalling document");
        Marshaller::new(self).root(element_name, declared, object)
    }

    /// Unmarshals a sequence of sibling elements as an instance of `class`
    /// or of the subtype its element names select.
    pub fn unmarshal(&self, class: &str, children: &[Element]) -> Result<Object> {
        let concrete = self.substitution().resolve(class, children)?;
        Unmarshaller::new(self).fill(concrete, children)
    }

    /// Unmarshals a document root element whose static type is `declared`.
    pub fn unmarshal_root(&self, declared: &str, element: &Element) -> Result<Object> {
        if element.nil {
            return Err(BindError::new(BindErrorKind::NotNillableViolation {
                field: element.name.clone(),
            })
            .within(std::slice::from_ref(&element.name)));
        }
        debug!(element = %element.name, class = %declared, "unmarshalling document");
        Unmarshaller::new(self).root(declared, element)
    }

    pub(crate) fn substitution(&self) -> SubstitutionResolver<'_> {
        SubstitutionResolver::new(self.registry, &self.factories)
    }
}

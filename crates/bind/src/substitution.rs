//! Substitution-group resolution.
//!
//! When an element appears under a field whose static type is a class with
//! registered subtypes, and the element does not name its type explicitly,
//! the concrete class is chosen from the element's structural signature
//! (the names of its child elements).
//!
//! Candidates are the base itself (unless abstract) followed by
//! [`TypeRegistry::subtypes_of`] in registration order. Two passes are made:
//!
//! 1. exact: every child name is a field of the candidate and every required
//!    non-collection field is present;
//! 2. lenient: every required non-collection field is present.
//!
//! The first satisfiable candidate wins, so ties resolve to the earliest
//! registered class. When nothing is satisfiable a concrete base is used
//! as-is; an abstract base fails with `NoMatchingSubtype`.

use std::collections::BTreeSet;

use tracing::trace;

use crate::element::Element;
use crate::error::{BindError, BindErrorKind, Result};
use crate::registry::{ClassDecl, TypeRegistry};
use crate::wrapper::WrapperFactories;

/// Child element names of an incoming element.
pub type Signature<'e> = BTreeSet<&'e str>;

/// Collects the structural signature of a child element sequence.
pub fn signature(children: &[Element]) -> Signature<'_> {
    children.iter().map(|child| child.name.as_str()).collect()
}

/// Selects concrete classes for substitutable elements.
pub struct SubstitutionResolver<'a> {
    registry: &'a TypeRegistry,
    factories: &'a WrapperFactories,
}

impl<'a> SubstitutionResolver<'a> {
    /// Creates a resolver; wrapper factories supply wrapper element names.
    pub fn new(registry: &'a TypeRegistry, factories: &'a WrapperFactories) -> Self {
        Self {
            registry,
            factories,
        }
    }

    /// Resolves the concrete class for children appearing under `base`.
    pub fn resolve(&self, base: &str, children: &[Element]) -> Result<&'a ClassDecl> {
        let base_class = self.registry.resolve(base)?;
        let signature = signature(children);

        let mut candidates = Vec::new();
        if !base_class.is_abstract {
            candidates.push(base_class);
        }
        candidates.extend(
            self.registry
                .subtypes_of(base)?
                .into_iter()
                .filter(|class| !class.is_abstract),
        );

        for exact in [true, false] {
            for candidate in &candidates {
                if self.satisfies(candidate, &signature, exact)? {
                    trace!(
                        base = %base,
                        resolved = %candidate.name,
                        exact,
                        "resolved substitution"
                    );
                    return Ok(candidate);
                }
            }
        }

        if base_class.is_abstract {
            return Err(BindError::new(BindErrorKind::NoMatchingSubtype {
                base: base.to_string(),
                signature: signature.into_iter().collect::<Vec<_>>().join(", "),
            }));
        }
        Ok(base_class)
    }

    fn satisfies(&self, class: &ClassDecl, signature: &Signature<'_>, exact: bool) -> Result<bool> {
        let layout = self.registry.layout(&class.name)?;

        let required_present = layout
            .iter()
            .filter(|field| field.required && !field.field_type.is_collection())
            .all(|field| signature.contains(self.factories.element_name(field).as_ref()));
        if !required_present {
            return Ok(false);
        }
        if !exact {
            return Ok(true);
        }

        let known: BTreeSet<_> = layout
            .iter()
            .map(|field| self.factories.element_name(field))
            .collect();
        Ok(signature.iter().all(|name| known.contains(*name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{FieldDecl, FieldType, ScalarKind};

    fn registry(order: &[&str]) -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry
            .register(
                ClassDecl::new("Shape")
                    .abstract_class()
                    .field(FieldDecl::new("id", FieldType::Scalar(ScalarKind::Int)).required()),
            )
            .unwrap();
        for name in order {
            let class = match *name {
                "Circle" => ClassDecl::new("Circle")
                    .extends("Shape")
                    .field(FieldDecl::new("radius", FieldType::Boxed(ScalarKind::Double))),
                _ => ClassDecl::new("Square")
                    .extends("Shape")
                    .field(FieldDecl::new("side", FieldType::Boxed(ScalarKind::Double))),
            };
            registry.register(class).unwrap();
        }
        registry
    }

    fn children(names: &[&str]) -> Vec<Element> {
        names.iter().map(|name| Element::text(*name, "1")).collect()
    }

    #[test]
    fn test_signature_selects_subtype_in_any_order() {
        for order in [["Circle", "Square"], ["Square", "Circle"]] {
            let registry = registry(&order);
            let factories = WrapperFactories::default();
            let resolver = SubstitutionResolver::new(&registry, &factories);

            let class = resolver.resolve("Shape", &children(&["id", "side"])).unwrap();
            assert_eq!(class.name, "Square");
            let class = resolver.resolve("Shape", &children(&["id", "radius"])).unwrap();
            assert_eq!(class.name, "Circle");
        }
    }

    #[test]
    fn test_tie_goes_to_first_registered() {
        let registry = registry(&["Square", "Circle"]);
        let factories = WrapperFactories::default();
        let resolver = SubstitutionResolver::new(&registry, &factories);

        let class = resolver.resolve("Shape", &children(&["id"])).unwrap();
        assert_eq!(class.name, "Square");
    }

    #[test]
    fn test_unknown_children_fall_back_to_lenient_match() {
        let registry = registry(&["Circle"]);
        let factories = WrapperFactories::default();
        let resolver = SubstitutionResolver::new(&registry, &factories);

        let class = resolver
            .resolve("Shape", &children(&["id", "extension"]))
            .unwrap();
        assert_eq!(class.name, "Circle");
    }

    #[test]
    fn test_abstract_base_without_match_fails() {
        let registry = registry(&["Circle"]);
        let factories = WrapperFactories::default();
        let resolver = SubstitutionResolver::new(&registry, &factories);

        let err = resolver.resolve("Shape", &children(&["radius"])).unwrap_err();
        assert_eq!(
            err.kind,
            BindErrorKind::NoMatchingSubtype {
                base: "Shape".to_string(),
                signature: "radius".to_string(),
            }
        );
    }
}

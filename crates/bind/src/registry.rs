//! Type registry.
//!
//! The registry holds the static description of every bindable class: its
//! ordered field declarations, its optional parent and the subtypes that may
//! substitute for it. It is populated once, before the first marshal or
//! unmarshal call, and only read afterwards. Registration takes `&mut self`
//! while the codec borrows `&TypeRegistry`, so a registry that is in use
//! cannot be mutated.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{BindError, BindErrorKind, Result};

/// Prefix used for scalar type names in `xsi:type` attributes.
pub const SCALAR_TYPE_PREFIX: &str = "xs:";

/// Scalar kinds supported by the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarKind {
    Boolean,
    Short,
    Int,
    Long,
    Float,
    Double,
    String,
    Decimal,
}

impl ScalarKind {
    /// Returns the local name of the scalar kind (`int`, `string`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarKind::Boolean => "boolean",
            ScalarKind::Short => "short",
            ScalarKind::Int => "int",
            ScalarKind::Long => "long",
            ScalarKind::Float => "float",
            ScalarKind::Double => "double",
            ScalarKind::String => "string",
            ScalarKind::Decimal => "decimal",
        }
    }

    /// Parses a local scalar name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "boolean" => Some(ScalarKind::Boolean),
            "short" => Some(ScalarKind::Short),
            "int" => Some(ScalarKind::Int),
            "long" => Some(ScalarKind::Long),
            "float" => Some(ScalarKind::Float),
            "double" => Some(ScalarKind::Double),
            "string" => Some(ScalarKind::String),
            "decimal" => Some(ScalarKind::Decimal),
            _ => None,
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to a scalar or class type, as carried by wrapper values and
/// `xsi:type` attributes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TypeRef {
    Scalar(ScalarKind),
    Class(String),
}

impl TypeRef {
    /// Creates a class type reference.
    pub fn class(name: impl Into<String>) -> Self {
        TypeRef::Class(name.into())
    }

    /// Returns the name used on the wire (`xs:int` or the class name).
    pub fn type_name(&self) -> String {
        match self {
            TypeRef::Scalar(kind) => format!("{}{}", SCALAR_TYPE_PREFIX, kind.as_str()),
            TypeRef::Class(name) => name.clone(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Scalar(kind) => write!(f, "{}{}", SCALAR_TYPE_PREFIX, kind),
            TypeRef::Class(name) => f.write_str(name),
        }
    }
}

/// Static type of a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    /// Primitive scalar; can never be nil.
    Scalar(ScalarKind),
    /// Boxed (nullable) scalar.
    Boxed(ScalarKind),
    /// Binary blob, base64 text on the wire.
    Binary,
    /// Bindable class, by registered name.
    Class(String),
    /// Entry-list map with string keys.
    Map(Box<FieldType>),
    /// Repeated sibling elements.
    Repeated(Box<FieldType>),
}

impl FieldType {
    /// Shorthand for a class-typed field.
    pub fn class(name: impl Into<String>) -> Self {
        FieldType::Class(name.into())
    }

    /// Shorthand for a repeated field of `item`.
    pub fn repeated(item: FieldType) -> Self {
        FieldType::Repeated(Box::new(item))
    }

    /// Shorthand for an entry-list map with values of `value`.
    pub fn map(value: FieldType) -> Self {
        FieldType::Map(Box::new(value))
    }

    /// Returns true for repeated and map fields, which default to empty.
    pub fn is_collection(&self) -> bool {
        matches!(self, FieldType::Repeated(_) | FieldType::Map(_))
    }

    /// Returns the type reference a wrapper of this static type declares.
    pub fn as_type_ref(&self) -> Option<TypeRef> {
        match self {
            FieldType::Scalar(kind) | FieldType::Boxed(kind) => Some(TypeRef::Scalar(*kind)),
            FieldType::Class(name) => Some(TypeRef::Class(name.clone())),
            _ => None,
        }
    }

    fn describe(&self) -> String {
        match self {
            FieldType::Scalar(kind) => kind.to_string(),
            FieldType::Boxed(kind) => format!("boxed {}", kind),
            FieldType::Binary => "binary".to_string(),
            FieldType::Class(name) => name.clone(),
            FieldType::Map(value) => format!("map of {}", value.describe()),
            FieldType::Repeated(item) => format!("list of {}", item.describe()),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Binding metadata for one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDecl {
    /// Property name; the key of the field's slot in an `Object`.
    pub name: String,
    /// Element name override. Defaults to `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xml_name: Option<String>,
    /// Static type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub nillable: bool,
    #[serde(default)]
    pub required: bool,
    /// Encoded as a polymorphic wrapper element carrying `xsi:type`.
    #[serde(default)]
    pub polymorphic: bool,
}

impl FieldDecl {
    /// Creates an optional, non-nillable field.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            xml_name: None,
            field_type,
            nillable: false,
            required: false,
            polymorphic: false,
        }
    }

    /// Overrides the element name.
    pub fn with_xml_name(mut self, xml_name: impl Into<String>) -> Self {
        self.xml_name = Some(xml_name.into());
        self
    }

    /// Marks the field nillable.
    pub fn nillable(mut self) -> Self {
        self.nillable = true;
        self
    }

    /// Marks the field required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Marks the field as a polymorphic wrapper.
    pub fn wrapper(mut self) -> Self {
        self.polymorphic = true;
        self
    }

    /// Returns the element name used on the wire.
    pub fn element_name(&self) -> &str {
        self.xml_name.as_deref().unwrap_or(&self.name)
    }

    fn check(&self, owner: &str) -> Result<()> {
        let invalid = |message: String| {
            Err(BindError::new(BindErrorKind::InvalidDeclaration {
                type_name: owner.to_string(),
                message,
            }))
        };

        if self.nillable
            && matches!(
                self.field_type,
                FieldType::Scalar(_) | FieldType::Binary | FieldType::Map(_)
            )
        {
            return invalid(format!(
                "field '{}' of type {} cannot be nillable",
                self.name, self.field_type
            ));
        }

        if self.polymorphic && self.field_type.as_type_ref().is_none() {
            return invalid(format!(
                "wrapper field '{}' must have a scalar or class type, not {}",
                self.name, self.field_type
            ));
        }

        match &self.field_type {
            FieldType::Repeated(inner) | FieldType::Map(inner) if inner.is_collection() => {
                invalid(format!(
                    "field '{}' nests a collection inside {}",
                    self.name, self.field_type
                ))
            }
            _ => Ok(()),
        }
    }
}

/// Declaration of one bindable class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDecl {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Abstract classes are only instantiated through a subtype.
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    /// Own fields in declaration order (inherited fields excluded).
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
}

impl ClassDecl {
    /// Creates a concrete class without parent or fields.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            is_abstract: false,
            fields: Vec::new(),
        }
    }

    /// Sets the parent class.
    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Marks the class abstract.
    pub fn abstract_class(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Appends a field.
    pub fn field(mut self, field: FieldDecl) -> Self {
        self.fields.push(field);
        self
    }
}

/// Immutable-after-build registry of class declarations.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    /// Declarations in registration order.
    classes: Vec<ClassDecl>,
    /// Name -> index into `classes`.
    by_name: HashMap<String, usize>,
    /// Index -> indices of direct subtypes, in registration order.
    direct_subtypes: Vec<Vec<usize>>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from declarations, registered in iteration order.
    pub fn from_declarations(classes: impl IntoIterator<Item = ClassDecl>) -> Result<Self> {
        let mut registry = Self::new();
        for class in classes {
            registry.register(class)?;
        }
        Ok(registry)
    }

    /// Registers a class.
    ///
    /// A parent must be registered before its subtypes, which keeps the
    /// inheritance graph acyclic. Field types may reference classes that are
    /// registered later; [`TypeRegistry::validate`] checks those.
    pub fn register(&mut self, class: ClassDecl) -> Result<()> {
        if self.by_name.contains_key(&class.name) {
            return Err(BindError::new(BindErrorKind::DuplicateType {
                type_name: class.name,
            }));
        }

        let parent_idx = match &class.parent {
            Some(parent) => Some(self.index_of(parent)?),
            None => None,
        };

        for field in &class.fields {
            field.check(&class.name)?;
        }

        let idx = self.classes.len();
        self.by_name.insert(class.name.clone(), idx);
        self.classes.push(class);
        self.direct_subtypes.push(Vec::new());
        if let Some(parent_idx) = parent_idx {
            self.direct_subtypes[parent_idx].push(idx);
        }

        Ok(())
    }

    /// Checks that every class referenced by a field type is registered.
    pub fn validate(&self) -> Result<()> {
        fn referenced(field_type: &FieldType) -> Option<&str> {
            match field_type {
                FieldType::Class(name) => Some(name),
                FieldType::Map(inner) | FieldType::Repeated(inner) => referenced(inner),
                _ => None,
            }
        }

        for class in &self.classes {
            for field in &class.fields {
                if let Some(name) = referenced(&field.field_type) {
                    self.resolve(name).map_err(|e| {
                        e.within(&[class.name.clone(), field.element_name().to_string()])
                    })?;
                }
            }
        }
        Ok(())
    }

    /// Looks up a class by name.
    pub fn resolve(&self, type_name: &str) -> Result<&ClassDecl> {
        self.index_of(type_name).map(|idx| &self.classes[idx])
    }

    /// Returns true if a class with this name is registered.
    pub fn contains(&self, type_name: &str) -> bool {
        self.by_name.contains_key(type_name)
    }

    /// Returns all direct and transitive subtypes of `type_name`, in
    /// registration order.
    pub fn subtypes_of(&self, type_name: &str) -> Result<Vec<&ClassDecl>> {
        let root = self.index_of(type_name)?;
        let mut found = Vec::new();
        let mut pending = self.direct_subtypes[root].clone();
        while let Some(idx) = pending.pop() {
            found.push(idx);
            pending.extend_from_slice(&self.direct_subtypes[idx]);
        }
        found.sort_unstable();
        Ok(found.into_iter().map(|idx| &self.classes[idx]).collect())
    }

    /// Returns true if `type_name` is `ancestor` or inherits from it.
    pub fn is_subtype_of(&self, type_name: &str, ancestor: &str) -> bool {
        let mut current = self.classes_by_name(type_name);
        while let Some(class) = current {
            if class.name == ancestor {
                return true;
            }
            current = class
                .parent
                .as_deref()
                .and_then(|parent| self.classes_by_name(parent));
        }
        false
    }

    /// Returns the effective field sequence of a class: inherited fields
    /// first, following the parent chain root-to-leaf.
    ///
    /// Fails with `AmbiguousField` if two fields in the chain share an
    /// element name.
    pub fn layout(&self, type_name: &str) -> Result<Vec<&FieldDecl>> {
        let mut chain = Vec::new();
        let mut current = Some(self.resolve(type_name)?);
        while let Some(class) = current {
            chain.push(class);
            current = match &class.parent {
                Some(parent) => Some(self.resolve(parent)?),
                None => None,
            };
        }

        let mut seen: HashMap<&str, &str> = HashMap::new();
        let mut fields = Vec::new();
        for class in chain.into_iter().rev() {
            for field in &class.fields {
                if let Some(first) = seen.insert(field.element_name(), &class.name) {
                    return Err(BindError::new(BindErrorKind::AmbiguousField {
                        element: field.element_name().to_string(),
                        first: first.to_string(),
                        second: class.name.clone(),
                    }));
                }
                fields.push(field);
            }
        }
        Ok(fields)
    }

    /// Returns the set of element names of a class's layout.
    pub fn element_names(&self, type_name: &str) -> Result<HashSet<&str>> {
        Ok(self
            .layout(type_name)?
            .into_iter()
            .map(FieldDecl::element_name)
            .collect())
    }

    /// Iterates over declarations in registration order.
    pub fn classes(&self) -> impl Iterator<Item = &ClassDecl> {
        self.classes.iter()
    }

    /// Returns the number of registered classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    fn classes_by_name(&self, type_name: &str) -> Option<&ClassDecl> {
        self.by_name.get(type_name).map(|idx| &self.classes[*idx])
    }

    fn index_of(&self, type_name: &str) -> Result<usize> {
        self.by_name.get(type_name).copied().ok_or_else(|| {
            BindError::new(BindErrorKind::UnknownType {
                type_name: type_name.to_string(),
            })
        })
    }
}

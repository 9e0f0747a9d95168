//! Client-side type model consulted during materialization.
//!
//! The registry is built once by the caller and passed to the materializer
//! by shared reference. Property lists are flattened at registration time,
//! base properties first, so payload application is a straight index walk.

use std::collections::HashMap;
use std::fmt;

use crate::error::{MaterializeError, MaterializeResult};

/// Stable identifier of a registered type.
///
/// Tokens are only meaningful for the registry that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeToken(pub(crate) u32);

impl TypeToken {
    /// Returns the raw registry index.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TypeToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ty:{}", self.0)
    }
}

/// Primitive value kinds carried by data properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// `Edm.Boolean`
    Boolean,
    /// `Edm.Byte`
    Byte,
    /// `Edm.SByte`
    SByte,
    /// `Edm.Int16`
    Int16,
    /// `Edm.Int32`
    Int32,
    /// `Edm.Int64`
    Int64,
    /// `Edm.Single`
    Single,
    /// `Edm.Double`
    Double,
    /// `Edm.Decimal`
    Decimal,
    /// `Edm.String`
    String,
    /// `Edm.Binary`
    Binary,
    /// `Edm.Guid`
    Guid,
    /// `Edm.DateTime`
    DateTime,
    /// `Edm.DateTimeOffset`
    DateTimeOffset,
}

impl ScalarKind {
    /// Returns the bare kind name, e.g. `Int32`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            ScalarKind::Boolean => "Boolean",
            ScalarKind::Byte => "Byte",
            ScalarKind::SByte => "SByte",
            ScalarKind::Int16 => "Int16",
            ScalarKind::Int32 => "Int32",
            ScalarKind::Int64 => "Int64",
            ScalarKind::Single => "Single",
            ScalarKind::Double => "Double",
            ScalarKind::Decimal => "Decimal",
            ScalarKind::String => "String",
            ScalarKind::Binary => "Binary",
            ScalarKind::Guid => "Guid",
            ScalarKind::DateTime => "DateTime",
            ScalarKind::DateTimeOffset => "DateTimeOffset",
        }
    }

    /// Returns the wire type name, e.g. `Edm.Int32`.
    #[must_use]
    pub const fn edm_name(self) -> &'static str {
        match self {
            ScalarKind::Boolean => "Edm.Boolean",
            ScalarKind::Byte => "Edm.Byte",
            ScalarKind::SByte => "Edm.SByte",
            ScalarKind::Int16 => "Edm.Int16",
            ScalarKind::Int32 => "Edm.Int32",
            ScalarKind::Int64 => "Edm.Int64",
            ScalarKind::Single => "Edm.Single",
            ScalarKind::Double => "Edm.Double",
            ScalarKind::Decimal => "Edm.Decimal",
            ScalarKind::String => "Edm.String",
            ScalarKind::Binary => "Edm.Binary",
            ScalarKind::Guid => "Edm.Guid",
            ScalarKind::DateTime => "Edm.DateTime",
            ScalarKind::DateTimeOffset => "Edm.DateTimeOffset",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Shape of one declared property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    /// A primitive data property.
    Scalar(ScalarKind),
    /// A structured value embedded in the owning record.
    Complex(TypeToken),
    /// A single-valued navigation to another entity.
    Reference(TypeToken),
    /// A multi-valued navigation holding entities of the element type.
    Collection(TypeToken),
}

/// One property slot of a registered type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDescriptor {
    /// Wire name of the property.
    pub name: String,
    /// Declared shape.
    pub kind: PropertyKind,
    /// Whether a null value is accepted.
    pub nullable: bool,
}

/// A registered entity or complex type.
#[derive(Debug, Clone)]
pub struct ModelType {
    name: String,
    entity: bool,
    base: Option<TypeToken>,
    media_link: bool,
    properties: Vec<PropertyDescriptor>,
    index: HashMap<String, usize>,
}

impl ModelType {
    /// Returns the full wire name, e.g. `NorthwindModel.Customer`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this type is an entity type (identity-bearing).
    #[must_use]
    pub const fn is_entity(&self) -> bool {
        self.entity
    }

    /// Whether entries of this type carry their data as a media resource.
    #[must_use]
    pub const fn is_media_link(&self) -> bool {
        self.media_link
    }

    /// Returns the direct base type, if any.
    #[must_use]
    pub const fn base(&self) -> Option<TypeToken> {
        self.base
    }

    /// Returns the flattened property list, base properties first.
    #[must_use]
    pub fn properties(&self) -> &[PropertyDescriptor] {
        &self.properties
    }

    /// Looks a property up by wire name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<(usize, &PropertyDescriptor)> {
        let index = *self.index.get(name)?;
        Some((index, &self.properties[index]))
    }

    /// Returns the property at a flattened index.
    #[must_use]
    pub fn property_at(&self, index: usize) -> Option<&PropertyDescriptor> {
        self.properties.get(index)
    }

    /// Number of field slots a record of this type carries.
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.properties.len()
    }
}

/// Registry of the entity and complex types a service exposes.
///
/// Built by the caller ahead of materialization and then only read.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: Vec<ModelType>,
    by_name: HashMap<String, TypeToken>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts registering an entity type.
    pub fn entity(&mut self, name: impl Into<String>) -> TypeBuilder<'_> {
        TypeBuilder::new(self, name.into(), true)
    }

    /// Starts registering a complex type.
    pub fn complex(&mut self, name: impl Into<String>) -> TypeBuilder<'_> {
        TypeBuilder::new(self, name.into(), false)
    }

    /// Resolves a wire type name to its token.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<TypeToken> {
        self.by_name.get(name).copied()
    }

    /// Returns the type behind a token.
    #[must_use]
    pub fn get(&self, token: TypeToken) -> Option<&ModelType> {
        self.types.get(token.index())
    }

    /// Whether a value of `source` can stand where `target` is expected.
    ///
    /// True when `source` is `target` or derives from it. Unknown tokens
    /// answer false.
    #[must_use]
    pub fn is_assignable(&self, target: TypeToken, source: TypeToken) -> bool {
        let mut cursor = Some(source);
        while let Some(token) = cursor {
            if token == target {
                return true;
            }
            cursor = self.get(token).and_then(ModelType::base);
        }
        false
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    fn insert(&mut self, model: ModelType) -> MaterializeResult<TypeToken> {
        if self.by_name.contains_key(&model.name) {
            return Err(MaterializeError::model(format!(
                "type {} is already registered",
                model.name
            )));
        }
        let token = TypeToken(self.types.len() as u32);
        self.by_name.insert(model.name.clone(), token);
        self.types.push(model);
        Ok(token)
    }
}

/// Builder returned by [`TypeRegistry::entity`] and [`TypeRegistry::complex`].
#[derive(Debug)]
pub struct TypeBuilder<'a> {
    registry: &'a mut TypeRegistry,
    name: String,
    entity: bool,
    base: Option<TypeToken>,
    media_link: bool,
    properties: Vec<PropertyDescriptor>,
}

impl<'a> TypeBuilder<'a> {
    fn new(registry: &'a mut TypeRegistry, name: String, entity: bool) -> Self {
        Self {
            registry,
            name,
            entity,
            base: None,
            media_link: false,
            properties: Vec::new(),
        }
    }

    /// Derives this type from an already registered base.
    #[must_use]
    pub fn base(mut self, base: TypeToken) -> Self {
        self.base = Some(base);
        self
    }

    /// Marks entries of this type as media link entries.
    #[must_use]
    pub fn media_link(mut self) -> Self {
        self.media_link = true;
        self
    }

    /// Adds a non-nullable scalar property.
    #[must_use]
    pub fn scalar(self, name: impl Into<String>, kind: ScalarKind) -> Self {
        self.property(name, PropertyKind::Scalar(kind), false)
    }

    /// Adds a nullable scalar property.
    #[must_use]
    pub fn nullable_scalar(self, name: impl Into<String>, kind: ScalarKind) -> Self {
        self.property(name, PropertyKind::Scalar(kind), true)
    }

    /// Adds a complex property. Complex properties accept null.
    #[must_use]
    pub fn complex(self, name: impl Into<String>, ty: TypeToken) -> Self {
        self.property(name, PropertyKind::Complex(ty), true)
    }

    /// Adds a single-valued navigation property.
    #[must_use]
    pub fn reference(self, name: impl Into<String>, ty: TypeToken) -> Self {
        self.property(name, PropertyKind::Reference(ty), true)
    }

    /// Adds a multi-valued navigation property.
    #[must_use]
    pub fn collection(self, name: impl Into<String>, element: TypeToken) -> Self {
        self.property(name, PropertyKind::Collection(element), false)
    }

    /// Adds a property with an explicit descriptor shape.
    #[must_use]
    pub fn property(mut self, name: impl Into<String>, kind: PropertyKind, nullable: bool) -> Self {
        self.properties.push(PropertyDescriptor {
            name: name.into(),
            kind,
            nullable,
        });
        self
    }

    /// Finishes registration and returns the new type's token.
    ///
    /// Fails on a duplicate type name, an unknown or mismatched base, or a
    /// property name that collides within the flattened list.
    pub fn register(self) -> MaterializeResult<TypeToken> {
        let mut flattened = Vec::new();
        if let Some(base) = self.base {
            let parent = self.registry.get(base).ok_or_else(|| {
                MaterializeError::model(format!("base {base} of {} is not registered", self.name))
            })?;
            if parent.is_entity() != self.entity {
                return Err(MaterializeError::model(format!(
                    "type {} and base {} disagree on entity-ness",
                    self.name,
                    parent.name()
                )));
            }
            flattened.extend(parent.properties().iter().cloned());
        }
        flattened.extend(self.properties);

        let mut index = HashMap::with_capacity(flattened.len());
        for (position, descriptor) in flattened.iter().enumerate() {
            if index.insert(descriptor.name.clone(), position).is_some() {
                return Err(MaterializeError::model(format!(
                    "type {} declares property {:?} twice",
                    self.name, descriptor.name
                )));
            }
        }

        self.registry.insert(ModelType {
            name: self.name,
            entity: self.entity,
            base: self.base,
            media_link: self.media_link,
            properties: flattened,
            index,
        })
    }
}

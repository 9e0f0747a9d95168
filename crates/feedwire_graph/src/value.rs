//! Typed values stored in entity record fields.

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use uuid::Uuid;

use crate::model::{ScalarKind, TypeToken};
use crate::types::{CollectionHandle, EntityHandle};

/// A converted primitive value.
///
/// `Decimal` keeps the wire text verbatim so no precision is lost; the
/// converter validates the digits at parse time.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    /// `Edm.Boolean`
    Boolean(bool),
    /// `Edm.Byte`
    Byte(u8),
    /// `Edm.SByte`
    SByte(i8),
    /// `Edm.Int16`
    Int16(i16),
    /// `Edm.Int32`
    Int32(i32),
    /// `Edm.Int64`
    Int64(i64),
    /// `Edm.Single`
    Single(f32),
    /// `Edm.Double`
    Double(f64),
    /// `Edm.Decimal`, normalized wire text.
    Decimal(String),
    /// `Edm.String`
    String(String),
    /// `Edm.Binary`
    Binary(Vec<u8>),
    /// `Edm.Guid`
    Guid(Uuid),
    /// `Edm.DateTime`, a local timestamp with no offset.
    DateTime(NaiveDateTime),
    /// `Edm.DateTimeOffset`
    DateTimeOffset(DateTime<FixedOffset>),
}

impl ScalarValue {
    /// Returns the kind this value belongs to.
    #[must_use]
    pub const fn kind(&self) -> ScalarKind {
        match self {
            ScalarValue::Boolean(_) => ScalarKind::Boolean,
            ScalarValue::Byte(_) => ScalarKind::Byte,
            ScalarValue::SByte(_) => ScalarKind::SByte,
            ScalarValue::Int16(_) => ScalarKind::Int16,
            ScalarValue::Int32(_) => ScalarKind::Int32,
            ScalarValue::Int64(_) => ScalarKind::Int64,
            ScalarValue::Single(_) => ScalarKind::Single,
            ScalarValue::Double(_) => ScalarKind::Double,
            ScalarValue::Decimal(_) => ScalarKind::Decimal,
            ScalarValue::String(_) => ScalarKind::String,
            ScalarValue::Binary(_) => ScalarKind::Binary,
            ScalarValue::Guid(_) => ScalarKind::Guid,
            ScalarValue::DateTime(_) => ScalarKind::DateTime,
            ScalarValue::DateTimeOffset(_) => ScalarKind::DateTimeOffset,
        }
    }

    /// Gets this value as a boolean, if it is one.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            ScalarValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Gets this value as an `Int32`, if it is one.
    #[must_use]
    pub const fn as_i32(&self) -> Option<i32> {
        match self {
            ScalarValue::Int32(n) => Some(*n),
            _ => None,
        }
    }

    /// Gets this value as an `Int64`, if it is one.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            ScalarValue::Int64(n) => Some(*n),
            _ => None,
        }
    }

    /// Gets this value as a `Double`, if it is one.
    #[must_use]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            ScalarValue::Double(n) => Some(*n),
            _ => None,
        }
    }

    /// Gets this value as a string, if it is text.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Gets this value as bytes, if it is binary.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            ScalarValue::Binary(b) => Some(b),
            _ => None,
        }
    }
}

impl From<bool> for ScalarValue {
    fn from(value: bool) -> Self {
        ScalarValue::Boolean(value)
    }
}

impl From<i32> for ScalarValue {
    fn from(value: i32) -> Self {
        ScalarValue::Int32(value)
    }
}

impl From<i64> for ScalarValue {
    fn from(value: i64) -> Self {
        ScalarValue::Int64(value)
    }
}

impl From<f64> for ScalarValue {
    fn from(value: f64) -> Self {
        ScalarValue::Double(value)
    }
}

impl From<&str> for ScalarValue {
    fn from(value: &str) -> Self {
        ScalarValue::String(value.to_string())
    }
}

impl From<String> for ScalarValue {
    fn from(value: String) -> Self {
        ScalarValue::String(value)
    }
}

impl From<Vec<u8>> for ScalarValue {
    fn from(value: Vec<u8>) -> Self {
        ScalarValue::Binary(value)
    }
}

/// A structured value embedded directly in the owning record.
///
/// Field slots follow the flattened property list of the complex type.
#[derive(Debug, Clone, PartialEq)]
pub struct ComplexValue {
    token: TypeToken,
    fields: Vec<FieldValue>,
}

impl ComplexValue {
    /// Creates an all-null value of the given complex type.
    #[must_use]
    pub fn new(token: TypeToken, field_count: usize) -> Self {
        Self {
            token,
            fields: vec![FieldValue::Null; field_count],
        }
    }

    /// Returns the complex type this value is shaped by.
    #[must_use]
    pub const fn token(&self) -> TypeToken {
        self.token
    }

    /// Returns the field at a flattened property index.
    #[must_use]
    pub fn field(&self, index: usize) -> Option<&FieldValue> {
        self.fields.get(index)
    }

    /// Sets the field at a flattened property index.
    ///
    /// Returns false when the index is out of range.
    pub fn set_field(&mut self, index: usize, value: FieldValue) -> bool {
        match self.fields.get_mut(index) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Returns all field slots.
    #[must_use]
    pub fn fields(&self) -> &[FieldValue] {
        &self.fields
    }
}

/// One field slot of an entity or complex value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldValue {
    /// No value. Every slot starts here.
    #[default]
    Null,
    /// A primitive value.
    Scalar(ScalarValue),
    /// An embedded structured value.
    Complex(ComplexValue),
    /// A single-valued navigation, resolved to a graph record.
    Reference(EntityHandle),
    /// A multi-valued navigation, resolved to a graph collection.
    Collection(CollectionHandle),
}

impl FieldValue {
    /// Whether this slot holds no value.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Gets this field as a scalar, if it is one.
    #[must_use]
    pub const fn as_scalar(&self) -> Option<&ScalarValue> {
        match self {
            FieldValue::Scalar(value) => Some(value),
            _ => None,
        }
    }

    /// Gets this field as a complex value, if it is one.
    #[must_use]
    pub const fn as_complex(&self) -> Option<&ComplexValue> {
        match self {
            FieldValue::Complex(value) => Some(value),
            _ => None,
        }
    }

    /// Gets the referenced entity, if this field is a reference.
    #[must_use]
    pub const fn as_reference(&self) -> Option<EntityHandle> {
        match self {
            FieldValue::Reference(handle) => Some(*handle),
            _ => None,
        }
    }

    /// Gets the collection handle, if this field is a collection.
    #[must_use]
    pub const fn as_collection(&self) -> Option<CollectionHandle> {
        match self {
            FieldValue::Collection(handle) => Some(*handle),
            _ => None,
        }
    }
}

impl From<ScalarValue> for FieldValue {
    fn from(value: ScalarValue) -> Self {
        FieldValue::Scalar(value)
    }
}

//! Error types for graph materialization.

use thiserror::Error;

use crate::convert::ConvertError;

/// Result alias for materialization operations.
pub type MaterializeResult<T> = Result<T, MaterializeError>;

/// Errors surfaced while turning feed events into graph objects.
///
/// Wire-level problems arrive through [`MaterializeError::Atom`]; every
/// other variant describes a payload that parsed cleanly but does not fit
/// the registered type model or the tracked graph.
#[derive(Debug, Error)]
pub enum MaterializeError {
    /// The underlying feed parser reported an error.
    #[error(transparent)]
    Atom(#[from] feedwire_atom::AtomError),

    /// A payload property has no descriptor on the target type.
    #[error("type {type_name} has no property {property:?}")]
    UnknownProperty {
        /// Model name of the type being populated.
        type_name: String,
        /// Wire name of the unmatched property.
        property: String,
    },

    /// Payload content shape does not match the property cardinality.
    #[error("cardinality mismatch: {message}")]
    Cardinality {
        /// What was found and where.
        message: String,
    },

    /// A null value arrived for a property declared non-nullable.
    #[error("property {property:?} is not nullable")]
    IllegalNull {
        /// Name of the violated property.
        property: String,
    },

    /// Scalar text could not be converted to the declared kind.
    #[error("cannot convert property {property:?}: {source}")]
    Conversion {
        /// Name of the property being converted.
        property: String,
        /// Underlying conversion failure.
        #[source]
        source: ConvertError,
    },

    /// The payload type cannot be assigned where the model expects another.
    #[error("incompatible type: {message}")]
    IncompatibleType {
        /// The two type names involved.
        message: String,
    },

    /// An identity is already attached to a different record.
    #[error("identity {key} is already attached")]
    IdentityConflict {
        /// The conflicting identity.
        key: String,
    },

    /// A handle does not refer to a live record in this graph.
    #[error("invalid handle: {message}")]
    InvalidHandle {
        /// Which handle and why.
        message: String,
    },

    /// The type model itself is inconsistent.
    #[error("invalid type model: {message}")]
    Model {
        /// What the registry rejected.
        message: String,
    },
}

impl MaterializeError {
    /// Creates an unknown-property error.
    pub fn unknown_property(type_name: impl Into<String>, property: impl Into<String>) -> Self {
        Self::UnknownProperty {
            type_name: type_name.into(),
            property: property.into(),
        }
    }

    /// Creates a cardinality-mismatch error.
    pub fn cardinality(message: impl Into<String>) -> Self {
        Self::Cardinality {
            message: message.into(),
        }
    }

    /// Creates an illegal-null error.
    pub fn illegal_null(property: impl Into<String>) -> Self {
        Self::IllegalNull {
            property: property.into(),
        }
    }

    /// Creates a conversion error for a named property.
    pub fn conversion(property: impl Into<String>, source: ConvertError) -> Self {
        Self::Conversion {
            property: property.into(),
            source,
        }
    }

    /// Creates an incompatible-type error.
    pub fn incompatible_type(message: impl Into<String>) -> Self {
        Self::IncompatibleType {
            message: message.into(),
        }
    }

    /// Creates an identity-conflict error.
    pub fn identity_conflict(key: impl Into<String>) -> Self {
        Self::IdentityConflict { key: key.into() }
    }

    /// Creates an invalid-handle error.
    pub fn invalid_handle(message: impl Into<String>) -> Self {
        Self::InvalidHandle {
            message: message.into(),
        }
    }

    /// Creates a type-model error.
    pub fn model(message: impl Into<String>) -> Self {
        Self::Model {
            message: message.into(),
        }
    }
}

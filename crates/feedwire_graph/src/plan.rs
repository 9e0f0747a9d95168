//! Projection plans and the values a pull produces.

use std::rc::Rc;

use feedwire_atom::Entry;

use crate::error::MaterializeResult;
use crate::materialize::MaterializeContext;
use crate::model::TypeToken;
use crate::types::EntityHandle;
use crate::value::FieldValue;

/// A value produced by one materialization pull.
#[derive(Debug, Clone, PartialEq)]
pub enum Materialized {
    /// An entity resolved into the graph.
    Entity(EntityHandle),
    /// A shaped value produced by a projection plan.
    Value(FieldValue),
}

impl Materialized {
    /// Gets the entity handle, if this result is an entity.
    #[must_use]
    pub const fn as_entity(&self) -> Option<EntityHandle> {
        match self {
            Materialized::Entity(handle) => Some(*handle),
            Materialized::Value(_) => None,
        }
    }

    /// Gets the shaped value, if this result is one.
    #[must_use]
    pub const fn as_value(&self) -> Option<&FieldValue> {
        match self {
            Materialized::Value(value) => Some(value),
            Materialized::Entity(_) => None,
        }
    }
}

/// A compiled projection: turns one wire entry into a result value.
///
/// Plans run against the open materialization context, so nested entries
/// they choose to keep go through the normal identity resolution.
pub type ProjectionPlan =
    dyn Fn(&mut MaterializeContext<'_>, &Entry, TypeToken) -> MaterializeResult<Materialized>;

/// Wraps a closure as a shareable projection plan.
pub fn projection<F>(plan: F) -> Rc<ProjectionPlan>
where
    F: Fn(&mut MaterializeContext<'_>, &Entry, TypeToken) -> MaterializeResult<Materialized>
        + 'static,
{
    Rc::new(plan)
}

//! Materializer run configuration.

use crate::types::{EntityHandle, MergePolicy};

/// How deep one materialization pass reaches into an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlanMode {
    /// Rebuild the whole expansion: nested entries inside single-valued
    /// navigation links materialize recursively.
    #[default]
    Direct,
    /// Populate data properties only; single-valued navigation content is
    /// left to a projection plan.
    Shallow,
}

/// Options for one materializer run.
#[derive(Debug, Clone, Default)]
pub struct MaterializeOptions {
    /// How payload values combine with tracked objects.
    pub policy: MergePolicy,

    /// Skip payload properties the type model does not declare instead of
    /// failing on them.
    pub ignore_missing: bool,

    /// Default materialization depth when no projection plan is set.
    pub plan_mode: PlanMode,

    /// Record that top-level entries load into, bypassing identity
    /// resolution. Used when refreshing a single known object.
    pub target: Option<EntityHandle>,
}

impl MaterializeOptions {
    /// Creates options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the merge policy.
    #[must_use]
    pub const fn policy(mut self, policy: MergePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets whether undeclared payload properties are skipped.
    #[must_use]
    pub const fn ignore_missing(mut self, value: bool) -> Self {
        self.ignore_missing = value;
        self
    }

    /// Sets the default materialization depth.
    #[must_use]
    pub const fn plan_mode(mut self, mode: PlanMode) -> Self {
        self.plan_mode = mode;
        self
    }

    /// Sets the record top-level entries load into.
    #[must_use]
    pub const fn target(mut self, target: EntityHandle) -> Self {
        self.target = Some(target);
        self
    }
}

//! Paging continuations collected during a materializer run.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use url::Url;

use crate::plan::ProjectionPlan;
use crate::types::CollectionHandle;

/// How the next page should be materialized once fetched.
#[derive(Clone)]
pub enum ReplayPlan {
    /// Rerun with full expansion.
    Direct,
    /// Rerun populating data properties only.
    Shallow,
    /// Rerun the projection plan that shaped the first page.
    Custom(Rc<ProjectionPlan>),
}

impl fmt::Debug for ReplayPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplayPlan::Direct => f.write_str("Direct"),
            ReplayPlan::Shallow => f.write_str("Shallow"),
            ReplayPlan::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// A next-page address paired with its replay plan.
#[derive(Debug, Clone)]
pub struct Continuation {
    next: Url,
    plan: ReplayPlan,
}

impl Continuation {
    /// Creates a continuation.
    #[must_use]
    pub const fn new(next: Url, plan: ReplayPlan) -> Self {
        Self { next, plan }
    }

    /// Returns the next-page address.
    #[must_use]
    pub const fn next(&self) -> &Url {
        &self.next
    }

    /// Returns the replay plan.
    #[must_use]
    pub const fn plan(&self) -> &ReplayPlan {
        &self.plan
    }
}

/// Continuations found in one run, keyed by the collection they extend.
///
/// The `None` key is the top-level feed. The first registration for a key
/// wins, so repeating an inner feed cannot move a recorded continuation.
#[derive(Debug, Default)]
pub struct ContinuationRegistry {
    entries: HashMap<Option<CollectionHandle>, Continuation>,
}

impl ContinuationRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a continuation.
    ///
    /// Returns false when the key already holds one; the existing entry is
    /// kept untouched.
    pub fn register(
        &mut self,
        collection: Option<CollectionHandle>,
        continuation: Continuation,
    ) -> bool {
        match self.entries.entry(collection) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(continuation);
                true
            }
        }
    }

    /// Looks up the continuation for a collection (`None` = top-level feed).
    #[must_use]
    pub fn get(&self, collection: Option<CollectionHandle>) -> Option<&Continuation> {
        self.entries.get(&collection)
    }

    /// Number of recorded continuations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no continuation has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

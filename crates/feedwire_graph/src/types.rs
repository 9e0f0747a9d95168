//! Core identifiers and tracking states for the entity graph.

use std::fmt;

use url::Url;

/// Handle of an entity record inside an [`EntityGraph`](crate::EntityGraph).
///
/// Handles are arena indices. They are only meaningful for the graph that
/// produced them and stay valid for that graph's whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityHandle(pub(crate) u32);

impl EntityHandle {
    /// Returns the raw arena index.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ent:{}", self.0)
    }
}

/// Handle of a collection record inside an [`EntityGraph`](crate::EntityGraph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CollectionHandle(pub(crate) u32);

impl CollectionHandle {
    /// Returns the raw arena index.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for CollectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "col:{}", self.0)
    }
}

/// Absolute identity of an entity, as carried by the `atom:id` element.
///
/// Keys compare and hash by the full URI. No further normalization happens
/// here; the feed parser already requires identities to be absolute.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityKey(Url);

impl EntityKey {
    /// Wraps an identity URI.
    #[must_use]
    pub const fn new(identity: Url) -> Self {
        Self(identity)
    }

    /// Returns the identity URI.
    #[must_use]
    pub const fn as_url(&self) -> &Url {
        &self.0
    }
}

impl From<Url> for EntityKey {
    fn from(identity: Url) -> Self {
        Self(identity)
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How payload values combine with objects already tracked by the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePolicy {
    /// Reuse tracked objects but never touch their values.
    #[default]
    AppendOnly,
    /// Payload values always win over tracked values.
    OverwriteChanges,
    /// Payload values win only where the client has not made changes.
    PreserveChanges,
    /// Construct fresh objects without consulting the identity index.
    NoTracking,
}

impl MergePolicy {
    /// Whether payload values are applied to a tracked record in `state`.
    ///
    /// `NoTracking` never reaches a tracked record, so it answers `true`
    /// for the fresh records it always constructs.
    #[must_use]
    pub const fn applies_to(self, state: ChangeState) -> bool {
        match self {
            MergePolicy::AppendOnly => false,
            MergePolicy::OverwriteChanges | MergePolicy::NoTracking => true,
            MergePolicy::PreserveChanges => {
                matches!(state, ChangeState::Unchanged | ChangeState::Deleted)
            }
        }
    }
}

/// Pending local change recorded for a tracked entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChangeState {
    /// Created locally, not yet sent to the service.
    Added,
    /// Local edits pending.
    Modified,
    /// Scheduled for deletion.
    Deleted,
    /// In sync with the service as of the last exchange.
    #[default]
    Unchanged,
}

//! Identity-indexed arena of materialized entities and collections.

use std::collections::HashMap;
use std::fmt;

use url::Url;

use crate::error::{MaterializeError, MaterializeResult};
use crate::model::{TypeRegistry, TypeToken};
use crate::types::{ChangeState, CollectionHandle, EntityHandle, EntityKey};
use crate::value::FieldValue;

/// Service metadata carried alongside an entity's values.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EntityMeta {
    /// Concurrency token from `m:etag`.
    pub etag: Option<String>,
    /// Address used to update or delete the entity.
    pub edit_link: Option<Url>,
    /// Media resource read address, for media link entries.
    pub media_src: Option<Url>,
    /// MIME type of the media resource.
    pub media_content_type: Option<String>,
    /// Media resource edit address.
    pub media_edit_link: Option<Url>,
    /// Concurrency token of the media resource.
    pub media_etag: Option<String>,
    /// Whether the record was constructed by a materializer run.
    pub materialized: bool,
}

/// One entity in the graph arena.
///
/// Field slots follow the flattened property list of the record's type.
/// The identity never changes after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRecord {
    token: TypeToken,
    key: EntityKey,
    fields: Vec<FieldValue>,
    meta: EntityMeta,
}

impl EntityRecord {
    /// Creates an all-null record of the given type and identity.
    #[must_use]
    pub fn new(token: TypeToken, key: EntityKey, field_count: usize) -> Self {
        Self {
            token,
            key,
            fields: vec![FieldValue::Null; field_count],
            meta: EntityMeta::default(),
        }
    }

    /// Returns the record's runtime type.
    #[must_use]
    pub const fn token(&self) -> TypeToken {
        self.token
    }

    /// Returns the record's identity.
    #[must_use]
    pub const fn key(&self) -> &EntityKey {
        &self.key
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

    /// Returns the service metadata.
    #[must_use]
    pub const fn meta(&self) -> &EntityMeta {
        &self.meta
    }

    /// Returns the service metadata for update.
    pub fn meta_mut(&mut self) -> &mut EntityMeta {
        &mut self.meta
    }
}

/// One materialized navigation collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionRecord {
    element: TypeToken,
    items: Vec<EntityHandle>,
}

impl CollectionRecord {
    /// Creates an empty collection of the given element type.
    #[must_use]
    pub const fn new(element: TypeToken) -> Self {
        Self {
            element,
            items: Vec::new(),
        }
    }

    /// Returns the declared element type.
    #[must_use]
    pub const fn element(&self) -> TypeToken {
        self.element
    }

    /// Returns the member handles in order.
    #[must_use]
    pub fn items(&self) -> &[EntityHandle] {
        &self.items
    }

    /// Whether the collection contains a handle.
    #[must_use]
    pub fn contains(&self, handle: EntityHandle) -> bool {
        self.items.contains(&handle)
    }

    /// Appends a member.
    pub fn push(&mut self, handle: EntityHandle) {
        self.items.push(handle);
    }

    /// Replaces the member list.
    pub fn set_items(&mut self, items: Vec<EntityHandle>) {
        self.items = items;
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the collection has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// The session-owned object graph.
///
/// Records live in an arena and never move; handles stay valid for the
/// graph's lifetime. The identity index maps each attached identity to at
/// most one record. Untracked records share the arena but are invisible to
/// the index.
#[derive(Default)]
pub struct EntityGraph {
    entities: Vec<EntityRecord>,
    collections: Vec<CollectionRecord>,
    index: HashMap<EntityKey, EntityHandle>,
    states: Vec<ChangeState>,
}

impl EntityGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entity records, tracked or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the graph holds no entity records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Number of identities in the tracking index.
    #[must_use]
    pub fn tracked_len(&self) -> usize {
        self.index.len()
    }

    /// Attaches a record under its identity, initially `Unchanged`.
    ///
    /// Fails when the identity is already attached to another record.
    pub fn attach(&mut self, record: EntityRecord) -> MaterializeResult<EntityHandle> {
        if self.index.contains_key(record.key()) {
            return Err(MaterializeError::identity_conflict(record.key().to_string()));
        }
        let key = record.key().clone();
        let handle = self.insert(record);
        self.index.insert(key, handle);
        Ok(handle)
    }

    /// Adds a record to the arena without indexing its identity.
    pub fn insert_untracked(&mut self, record: EntityRecord) -> EntityHandle {
        self.insert(record)
    }

    fn insert(&mut self, record: EntityRecord) -> EntityHandle {
        let handle = EntityHandle(self.entities.len() as u32);
        self.entities.push(record);
        self.states.push(ChangeState::Unchanged);
        handle
    }

    /// Looks an identity up in the tracking index.
    #[must_use]
    pub fn lookup(&self, key: &EntityKey) -> Option<EntityHandle> {
        self.index.get(key).copied()
    }

    /// Returns the record behind a handle.
    #[must_use]
    pub fn entity(&self, handle: EntityHandle) -> Option<&EntityRecord> {
        self.entities.get(handle.index())
    }

    /// Returns the record behind a handle for update.
    pub fn entity_mut(&mut self, handle: EntityHandle) -> Option<&mut EntityRecord> {
        self.entities.get_mut(handle.index())
    }

    /// Returns the change state of a record.
    #[must_use]
    pub fn state(&self, handle: EntityHandle) -> Option<ChangeState> {
        self.states.get(handle.index()).copied()
    }

    /// Sets the change state of a record.
    pub fn set_state(
        &mut self,
        handle: EntityHandle,
        state: ChangeState,
    ) -> MaterializeResult<()> {
        match self.states.get_mut(handle.index()) {
            Some(slot) => {
                *slot = state;
                Ok(())
            }
            None => Err(MaterializeError::invalid_handle(format!(
                "{handle} is not in this graph"
            ))),
        }
    }

    /// Creates an empty collection of the given element type.
    pub fn new_collection(&mut self, element: TypeToken) -> CollectionHandle {
        let handle = CollectionHandle(self.collections.len() as u32);
        self.collections.push(CollectionRecord::new(element));
        handle
    }

    /// Returns the collection behind a handle.
    #[must_use]
    pub fn collection(&self, handle: CollectionHandle) -> Option<&CollectionRecord> {
        self.collections.get(handle.index())
    }

    /// Returns the collection behind a handle for update.
    pub fn collection_mut(&mut self, handle: CollectionHandle) -> Option<&mut CollectionRecord> {
        self.collections.get_mut(handle.index())
    }

    /// Reads a field by property name, resolving through the registry.
    #[must_use]
    pub fn field_by_name(
        &self,
        registry: &TypeRegistry,
        handle: EntityHandle,
        name: &str,
    ) -> Option<&FieldValue> {
        let record = self.entity(handle)?;
        let model = registry.get(record.token())?;
        let (index, _) = model.property(name)?;
        record.field(index)
    }

    /// Writes a field by property name, resolving through the registry.
    pub fn set_field_by_name(
        &mut self,
        registry: &TypeRegistry,
        handle: EntityHandle,
        name: &str,
        value: FieldValue,
    ) -> MaterializeResult<()> {
        let record = self.entity_mut(handle).ok_or_else(|| {
            MaterializeError::invalid_handle(format!("{handle} is not in this graph"))
        })?;
        let model = registry.get(record.token()).ok_or_else(|| {
            MaterializeError::model(format!("unknown type {}", record.token()))
        })?;
        let (index, _) = model.property(name).ok_or_else(|| {
            MaterializeError::unknown_property(model.name(), name)
        })?;
        if record.set_field(index, value) {
            Ok(())
        } else {
            Err(MaterializeError::model(format!(
                "record of {} has fewer slots than its type declares",
                model.name()
            )))
        }
    }

    /// Iterates over all entity handles in creation order.
    pub fn handles(&self) -> impl Iterator<Item = EntityHandle> + '_ {
        (0..self.entities.len()).map(|i| EntityHandle(i as u32))
    }
}

impl fmt::Debug for EntityGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityGraph")
            .field("entities", &self.entities.len())
            .field("collections", &self.collections.len())
            .field("tracked", &self.index.len())
            .finish_non_exhaustive()
    }
}

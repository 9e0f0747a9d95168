//! Turns parsed feed events into tracked graph objects.

use std::collections::HashMap;
use std::io::BufRead;
use std::rc::Rc;

use feedwire_atom::{
    Entry, FeedEvent, FeedParser, InlineFeed, NavContent, NavLink, Property, PropertyValue,
};
use tracing::{debug, trace, warn};
use url::Url;

use crate::continuation::{Continuation, ContinuationRegistry, ReplayPlan};
use crate::convert::{DefaultConverter, ValueConverter};
use crate::error::{MaterializeError, MaterializeResult};
use crate::graph::{EntityGraph, EntityRecord};
use crate::model::{ModelType, PropertyDescriptor, PropertyKind, TypeRegistry, TypeToken};
use crate::options::{MaterializeOptions, PlanMode};
use crate::plan::{Materialized, ProjectionPlan};
use crate::types::{ChangeState, CollectionHandle, EntityHandle, EntityKey, MergePolicy};
use crate::value::{ComplexValue, FieldValue};

static STOCK_CONVERTER: DefaultConverter = DefaultConverter;

/// Identity decision made once per run and reused on every repeat.
#[derive(Debug, Clone, Copy)]
struct Resolution {
    handle: EntityHandle,
    apply: bool,
}

/// Streams one response document into an entity graph.
///
/// The graph and the type registry stay caller-owned; a materializer
/// borrows them for the length of the run. There is no locking anywhere:
/// one materializer serves one thread and drives plain `&mut` state.
pub struct Materializer<'run, R: BufRead> {
    parser: FeedParser<R>,
    graph: &'run mut EntityGraph,
    registry: &'run TypeRegistry,
    converter: &'run dyn ValueConverter,
    expected: TypeToken,
    options: MaterializeOptions,
    plan: Option<Rc<ProjectionPlan>>,
    resolved: HashMap<EntityKey, Resolution>,
    continuations: ContinuationRegistry,
    count: Option<i64>,
    next_page: Option<Url>,
    current: Option<Materialized>,
    finished: bool,
}

impl<'run, R: BufRead> Materializer<'run, R> {
    /// Creates a materializer with default options.
    ///
    /// `expected` is the model type top-level entries resolve against.
    pub fn new(
        parser: FeedParser<R>,
        graph: &'run mut EntityGraph,
        registry: &'run TypeRegistry,
        expected: TypeToken,
    ) -> Self {
        Self::with_options(parser, graph, registry, expected, MaterializeOptions::default())
    }

    /// Creates a materializer with explicit options.
    pub fn with_options(
        parser: FeedParser<R>,
        graph: &'run mut EntityGraph,
        registry: &'run TypeRegistry,
        expected: TypeToken,
        options: MaterializeOptions,
    ) -> Self {
        Self {
            parser,
            graph,
            registry,
            converter: &STOCK_CONVERTER,
            expected,
            options,
            plan: None,
            resolved: HashMap::new(),
            continuations: ContinuationRegistry::new(),
            count: None,
            next_page: None,
            current: None,
            finished: false,
        }
    }

    /// Replaces the scalar converter.
    #[must_use]
    pub fn converter(mut self, converter: &'run dyn ValueConverter) -> Self {
        self.converter = converter;
        self
    }

    /// Installs a projection plan that shapes each top-level entry.
    #[must_use]
    pub fn plan(mut self, plan: Rc<ProjectionPlan>) -> Self {
        self.plan = Some(plan);
        self
    }

    /// Pulls the next top-level result.
    ///
    /// Feed bookkeeping events (count, paging) are absorbed along the way.
    /// Returns `Ok(None)` once the document is exhausted, and keeps
    /// answering that on every later pull.
    pub fn read(&mut self) -> MaterializeResult<Option<Materialized>> {
        if self.finished {
            return Ok(None);
        }
        loop {
            match self.parser.next_event()? {
                FeedEvent::FeedStart => {}
                FeedEvent::Count(count) => {
                    if self.count.is_none() {
                        self.count = Some(count);
                    }
                }
                FeedEvent::NextPage(next) => {
                    self.next_page = Some(next.clone());
                    let replay = self.replay();
                    self.continuations
                        .register(None, Continuation::new(next, replay));
                }
                FeedEvent::Custom(name) => {
                    trace!("skipping custom feed content {:?}", name);
                }
                FeedEvent::Entry(entry) => {
                    let value = self.materialize(&entry)?;
                    self.current = Some(value.clone());
                    return Ok(Some(value));
                }
                FeedEvent::Finished => {
                    self.finished = true;
                    self.current = None;
                    return Ok(None);
                }
            }
        }
    }

    /// Server-declared total of the top-level feed, if one was seen.
    #[must_use]
    pub const fn count(&self) -> Option<i64> {
        self.count
    }

    /// Continuation address of the top-level feed, if one was seen.
    #[must_use]
    pub fn next_page(&self) -> Option<&Url> {
        self.next_page.as_ref()
    }

    /// Result of the most recent pull, until the document ends.
    #[must_use]
    pub const fn current(&self) -> Option<&Materialized> {
        self.current.as_ref()
    }

    /// Looks up the continuation recorded for a collection.
    ///
    /// `None` addresses the top-level feed.
    #[must_use]
    pub fn continuation(&self, collection: Option<CollectionHandle>) -> Option<&Continuation> {
        self.continuations.get(collection)
    }

    /// All continuations collected so far.
    #[must_use]
    pub const fn continuations(&self) -> &ContinuationRegistry {
        &self.continuations
    }

    /// Consumes the materializer, keeping the collected continuations.
    #[must_use]
    pub fn into_continuations(self) -> ContinuationRegistry {
        self.continuations
    }

    fn materialize(&mut self, entry: &Entry) -> MaterializeResult<Materialized> {
        let expected = self.expected;
        let target = self.options.target;
        if let Some(plan) = self.plan.clone() {
            let mut context = self.context();
            return plan(&mut context, entry, expected);
        }
        let include_links = self.options.plan_mode == PlanMode::Direct;
        let mut context = self.context();
        let handle = context.resolve_entry(entry, expected, include_links, target)?;
        Ok(Materialized::Entity(handle))
    }

    fn context(&mut self) -> MaterializeContext<'_> {
        let replay = self.replay();
        MaterializeContext {
            graph: &mut *self.graph,
            registry: self.registry,
            converter: self.converter,
            options: &self.options,
            resolved: &mut self.resolved,
            continuations: &mut self.continuations,
            replay,
        }
    }

    fn replay(&self) -> ReplayPlan {
        match &self.plan {
            Some(plan) => ReplayPlan::Custom(Rc::clone(plan)),
            None => match self.options.plan_mode {
                PlanMode::Direct => ReplayPlan::Direct,
                PlanMode::Shallow => ReplayPlan::Shallow,
            },
        }
    }
}

/// The open state one materialization pass works against.
///
/// Projection plans receive this to resolve the entries they keep through
/// the normal identity machinery.
pub struct MaterializeContext<'a> {
    graph: &'a mut EntityGraph,
    registry: &'a TypeRegistry,
    converter: &'a dyn ValueConverter,
    options: &'a MaterializeOptions,
    resolved: &'a mut HashMap<EntityKey, Resolution>,
    continuations: &'a mut ContinuationRegistry,
    replay: ReplayPlan,
}

impl<'a> MaterializeContext<'a> {
    /// The graph being populated.
    #[must_use]
    pub fn graph(&self) -> &EntityGraph {
        self.graph
    }

    /// The graph being populated, for direct edits.
    pub fn graph_mut(&mut self) -> &mut EntityGraph {
        self.graph
    }

    /// The type model for this run.
    #[must_use]
    pub const fn registry(&self) -> &'a TypeRegistry {
        self.registry
    }

    /// The scalar converter for this run.
    #[must_use]
    pub const fn converter(&self) -> &'a dyn ValueConverter {
        self.converter
    }

    /// The options for this run.
    #[must_use]
    pub const fn options(&self) -> &'a MaterializeOptions {
        self.options
    }

    /// Resolves one entry into the graph and returns its record.
    ///
    /// Identity resolution, the merge policy and value application all run
    /// exactly as they would for an unprojected entry.
    pub fn materialize_entry(
        &mut self,
        entry: &Entry,
        expected: TypeToken,
        include_links: bool,
    ) -> MaterializeResult<EntityHandle> {
        self.resolve_entry(entry, expected, include_links, None)
    }

    /// Records a continuation under the run's replay plan.
    ///
    /// `None` addresses the top-level feed. The first registration for a
    /// key wins.
    pub fn register_continuation(
        &mut self,
        collection: Option<CollectionHandle>,
        next: Url,
    ) -> bool {
        self.continuations
            .register(collection, Continuation::new(next, self.replay.clone()))
    }

    /// Resolution order, first match wins: pre-supplied target, the
    /// run-local table, `NoTracking` construction, the identity index,
    /// fresh construction.
    fn resolve_entry(
        &mut self,
        entry: &Entry,
        expected: TypeToken,
        include_links: bool,
        target: Option<EntityHandle>,
    ) -> MaterializeResult<EntityHandle> {
        let key = EntityKey::new(entry.identity.clone());
        let actual = self.payload_type(entry, expected)?;

        let resolution = if let Some(handle) = target {
            let token = self.record_token(handle)?;
            if !self.registry.is_assignable(token, actual) {
                return Err(self.assignment_error(token, actual));
            }
            Resolution {
                handle,
                apply: true,
            }
        } else if let Some(resolution) = self.resolved.get(&key) {
            trace!("identity {} already resolved in this run", key);
            *resolution
        } else if self.options.policy == MergePolicy::NoTracking {
            let handle = self.fresh(actual, &key, false)?;
            Resolution {
                handle,
                apply: true,
            }
        } else if let Some(handle) = self.graph.lookup(&key) {
            let token = self.record_token(handle)?;
            if !self.registry.is_assignable(token, actual) {
                return Err(self.assignment_error(token, actual));
            }
            let state = self.graph.state(handle).unwrap_or_default();
            let apply = self.options.policy.applies_to(state);
            debug!("reusing tracked {} for {}, apply={}", handle, key, apply);
            Resolution { handle, apply }
        } else {
            let handle = self.fresh(actual, &key, true)?;
            Resolution {
                handle,
                apply: true,
            }
        };

        self.resolved.entry(key).or_insert(resolution);

        if resolution.apply {
            self.apply_entry(resolution.handle, entry, include_links)?;
        } else {
            self.register_unapplied(resolution.handle, entry)?;
        }
        Ok(resolution.handle)
    }

    /// Resolves the wire type declared on an entry.
    ///
    /// A name the registry does not know falls back to the expected type;
    /// a known name must be assignable to it.
    fn payload_type(&self, entry: &Entry, expected: TypeToken) -> MaterializeResult<TypeToken> {
        self.named_type(entry.type_name.as_deref(), expected)
    }

    fn named_type(
        &self,
        declared: Option<&str>,
        expected: TypeToken,
    ) -> MaterializeResult<TypeToken> {
        match declared {
            None => Ok(expected),
            Some(name) => match self.registry.resolve(name) {
                Some(actual) => {
                    if self.registry.is_assignable(expected, actual) {
                        Ok(actual)
                    } else {
                        Err(self.assignment_error(expected, actual))
                    }
                }
                None => {
                    trace!("wire type {:?} is not registered, keeping the expected type", name);
                    Ok(expected)
                }
            },
        }
    }

    fn fresh(
        &mut self,
        token: TypeToken,
        key: &EntityKey,
        track: bool,
    ) -> MaterializeResult<EntityHandle> {
        let field_count = self.model(token)?.field_count();
        let mut record = EntityRecord::new(token, key.clone(), field_count);
        record.meta_mut().materialized = true;
        if track {
            self.graph.attach(record)
        } else {
            Ok(self.graph.insert_untracked(record))
        }
    }

    fn apply_entry(
        &mut self,
        handle: EntityHandle,
        entry: &Entry,
        include_links: bool,
    ) -> MaterializeResult<()> {
        let token = self.record_token(handle)?;

        {
            let record = self.graph.entity_mut(handle).ok_or_else(|| {
                MaterializeError::invalid_handle(format!("{handle} is not in this graph"))
            })?;
            let meta = record.meta_mut();
            if entry.etag.is_some() {
                meta.etag = entry.etag.clone();
            }
            if entry.edit_link.is_some() {
                meta.edit_link = entry.edit_link.clone();
            }
            if let Some(media) = &entry.media {
                if media.src.is_some() {
                    meta.media_src = media.src.clone();
                }
                if media.content_type.is_some() {
                    meta.media_content_type = media.content_type.clone();
                }
                if media.edit_media.is_some() {
                    meta.media_edit_link = media.edit_media.clone();
                }
                if media.etag.is_some() {
                    meta.media_etag = media.etag.clone();
                }
            }
        }

        for property in &entry.properties {
            self.apply_property(handle, token, property)?;
        }
        for link in &entry.links {
            self.apply_link(handle, token, link, include_links)?;
        }
        Ok(())
    }

    fn apply_property(
        &mut self,
        handle: EntityHandle,
        token: TypeToken,
        property: &Property,
    ) -> MaterializeResult<()> {
        let model = self.model(token)?;
        let (index, descriptor) = match model.property(&property.name) {
            Some(found) => found,
            None => {
                if self.options.ignore_missing {
                    warn!(
                        "ignoring property {:?}, not declared on {}",
                        property.name,
                        model.name()
                    );
                    return Ok(());
                }
                return Err(MaterializeError::unknown_property(
                    model.name(),
                    &property.name,
                ));
            }
        };
        let value = self.property_value(descriptor, property)?;
        self.set_record_field(handle, index, value)
    }

    /// Builds the field value a data property carries.
    fn property_value(
        &self,
        descriptor: &PropertyDescriptor,
        property: &Property,
    ) -> MaterializeResult<FieldValue> {
        match descriptor.kind {
            PropertyKind::Scalar(kind) => match &property.value {
                PropertyValue::Null => self.null_value(descriptor, &property.name),
                PropertyValue::Text(text) => {
                    let scalar = self
                        .converter
                        .from_text(kind, text)
                        .map_err(|source| MaterializeError::conversion(&property.name, source))?;
                    Ok(FieldValue::Scalar(scalar))
                }
                PropertyValue::Complex(_) => Err(MaterializeError::incompatible_type(format!(
                    "structured content for scalar property {:?}",
                    property.name
                ))),
            },
            PropertyKind::Complex(declared) => match &property.value {
                PropertyValue::Null => self.null_value(descriptor, &property.name),
                PropertyValue::Text(text) if text.trim().is_empty() => {
                    // An empty element materializes an all-null instance.
                    let token = self.named_type(property.type_name.as_deref(), declared)?;
                    let field_count = self.model(token)?.field_count();
                    Ok(FieldValue::Complex(ComplexValue::new(token, field_count)))
                }
                PropertyValue::Text(_) => Err(MaterializeError::incompatible_type(format!(
                    "text content for complex property {:?}",
                    property.name
                ))),
                PropertyValue::Complex(children) => {
                    let token = self.named_type(property.type_name.as_deref(), declared)?;
                    let value = self.build_complex(token, children)?;
                    Ok(FieldValue::Complex(value))
                }
            },
            PropertyKind::Reference(_) | PropertyKind::Collection(_) => {
                Err(MaterializeError::cardinality(format!(
                    "data content for navigation property {:?}",
                    property.name
                )))
            }
        }
    }

    fn build_complex(
        &self,
        token: TypeToken,
        children: &[Property],
    ) -> MaterializeResult<ComplexValue> {
        let model = self.model(token)?;
        let mut value = ComplexValue::new(token, model.field_count());
        for child in children {
            let (index, descriptor) = match model.property(&child.name) {
                Some(found) => found,
                None => {
                    if self.options.ignore_missing {
                        warn!(
                            "ignoring property {:?}, not declared on {}",
                            child.name,
                            model.name()
                        );
                        continue;
                    }
                    return Err(MaterializeError::unknown_property(model.name(), &child.name));
                }
            };
            let field = self.property_value(descriptor, child)?;
            value.set_field(index, field);
        }
        Ok(value)
    }

    fn null_value(
        &self,
        descriptor: &PropertyDescriptor,
        name: &str,
    ) -> MaterializeResult<FieldValue> {
        if descriptor.nullable {
            Ok(FieldValue::Null)
        } else {
            Err(MaterializeError::illegal_null(name))
        }
    }

    fn apply_link(
        &mut self,
        handle: EntityHandle,
        token: TypeToken,
        link: &NavLink,
        include_links: bool,
    ) -> MaterializeResult<()> {
        let model = self.model(token)?;
        let (index, descriptor) = match model.property(&link.name) {
            Some(found) => found,
            None => {
                if self.options.ignore_missing {
                    warn!(
                        "ignoring link {:?}, not declared on {}",
                        link.name,
                        model.name()
                    );
                    return Ok(());
                }
                return Err(MaterializeError::unknown_property(model.name(), &link.name));
            }
        };

        let content = match &link.content {
            // A deferred link carries no content to apply.
            Some(content) => content,
            None => return Ok(()),
        };

        match (descriptor.kind, content) {
            (PropertyKind::Reference(_), NavContent::Entry(None)) => {
                let value = self.null_value(descriptor, &link.name)?;
                self.set_record_field(handle, index, value)
            }
            (PropertyKind::Reference(expected), NavContent::Entry(Some(nested))) => {
                if !include_links {
                    trace!("leaving nested entry for {:?} to the plan", link.name);
                    return Ok(());
                }
                let nested_handle = self.materialize_entry(nested, expected, include_links)?;
                self.set_record_field(handle, index, FieldValue::Reference(nested_handle))
            }
            (PropertyKind::Collection(element), NavContent::Feed(feed)) => {
                if !include_links {
                    trace!("leaving inline feed for {:?} to the plan", link.name);
                    return Ok(());
                }
                self.apply_feed(handle, index, element, feed, include_links)
            }
            (PropertyKind::Reference(_), NavContent::Feed(_)) => {
                Err(MaterializeError::cardinality(format!(
                    "feed content for single-valued property {:?}",
                    link.name
                )))
            }
            (PropertyKind::Collection(_), NavContent::Entry(_)) => {
                Err(MaterializeError::cardinality(format!(
                    "entry content for collection property {:?}",
                    link.name
                )))
            }
            (PropertyKind::Scalar(_) | PropertyKind::Complex(_), _) => {
                Err(MaterializeError::cardinality(format!(
                    "navigation content for data property {:?}",
                    link.name
                )))
            }
        }
    }

    /// Reconciles an inline feed into the owner's collection slot.
    ///
    /// Payload members are materialized first, then appended if absent.
    /// Under the two refreshing policies, local members missing from the
    /// payload are dropped, except locally added ones under
    /// `PreserveChanges`.
    fn apply_feed(
        &mut self,
        owner: EntityHandle,
        index: usize,
        element: TypeToken,
        feed: &InlineFeed,
        include_links: bool,
    ) -> MaterializeResult<()> {
        let collection = self.collection_slot(owner, index, element)?;

        let mut payload = Vec::with_capacity(feed.entries.len());
        for nested in &feed.entries {
            payload.push(self.materialize_entry(nested, element, include_links)?);
        }

        for &member in &payload {
            let held = self
                .graph
                .collection(collection)
                .is_some_and(|c| c.contains(member));
            if !held {
                if let Some(slot) = self.graph.collection_mut(collection) {
                    slot.push(member);
                }
            }
        }

        if matches!(
            self.options.policy,
            MergePolicy::OverwriteChanges | MergePolicy::PreserveChanges
        ) {
            let members: Vec<EntityHandle> = self
                .graph
                .collection(collection)
                .map(|c| c.items().to_vec())
                .unwrap_or_default();
            let mut retained = Vec::with_capacity(members.len());
            for member in members {
                let keep = payload.contains(&member)
                    || (self.options.policy == MergePolicy::PreserveChanges
                        && self.graph.state(member) == Some(ChangeState::Added));
                if keep {
                    retained.push(member);
                } else {
                    trace!("dropping {} absent from the refreshed page", member);
                }
            }
            if let Some(slot) = self.graph.collection_mut(collection) {
                slot.set_items(retained);
            }
        }

        if let Some(next) = &feed.next {
            self.register_continuation(Some(collection), next.clone());
        }
        Ok(())
    }

    /// Paging bookkeeping still happens when values are not applied.
    ///
    /// Collection links with a continuation get it recorded against the
    /// existing collection, created empty when the slot is unset. Values
    /// and membership stay untouched, and link shapes are not validated.
    fn register_unapplied(&mut self, handle: EntityHandle, entry: &Entry) -> MaterializeResult<()> {
        let token = self.record_token(handle)?;
        let model = self.model(token)?;
        for link in &entry.links {
            let feed = match &link.content {
                Some(NavContent::Feed(feed)) => feed,
                _ => continue,
            };
            if feed.next.is_none() {
                continue;
            }
            let (index, descriptor) = match model.property(&link.name) {
                Some(found) => found,
                None => continue,
            };
            let element = match descriptor.kind {
                PropertyKind::Collection(element) => element,
                _ => continue,
            };
            let collection = self.collection_slot(handle, index, element)?;
            if let Some(next) = &feed.next {
                self.register_continuation(Some(collection), next.clone());
            }
        }
        Ok(())
    }

    /// Returns the owner's collection at `index`, creating an empty one
    /// when the slot holds none.
    fn collection_slot(
        &mut self,
        owner: EntityHandle,
        index: usize,
        element: TypeToken,
    ) -> MaterializeResult<CollectionHandle> {
        let existing = self
            .graph
            .entity(owner)
            .and_then(|record| record.field(index))
            .and_then(FieldValue::as_collection);
        match existing {
            Some(collection) => Ok(collection),
            None => {
                let collection = self.graph.new_collection(element);
                self.set_record_field(owner, index, FieldValue::Collection(collection))?;
                Ok(collection)
            }
        }
    }

    fn set_record_field(
        &mut self,
        handle: EntityHandle,
        index: usize,
        value: FieldValue,
    ) -> MaterializeResult<()> {
        let record = self.graph.entity_mut(handle).ok_or_else(|| {
            MaterializeError::invalid_handle(format!("{handle} is not in this graph"))
        })?;
        if record.set_field(index, value) {
            Ok(())
        } else {
            Err(MaterializeError::model(format!(
                "field {index} is out of range for {handle}"
            )))
        }
    }

    fn record_token(&self, handle: EntityHandle) -> MaterializeResult<TypeToken> {
        self.graph
            .entity(handle)
            .map(EntityRecord::token)
            .ok_or_else(|| MaterializeError::invalid_handle(format!("{handle} is not in this graph")))
    }

    fn model(&self, token: TypeToken) -> MaterializeResult<&'a ModelType> {
        self.registry
            .get(token)
            .ok_or_else(|| MaterializeError::model(format!("unknown type {token}")))
    }

    fn assignment_error(&self, target: TypeToken, source: TypeToken) -> MaterializeError {
        let target = self.registry.get(target).map_or("?", ModelType::name);
        let source = self.registry.get(source).map_or("?", ModelType::name);
        MaterializeError::incompatible_type(format!(
            "payload type {source} is not assignable to {target}"
        ))
    }
}

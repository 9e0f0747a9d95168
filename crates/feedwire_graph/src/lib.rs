//! # Feedwire Graph
//!
//! Identity-tracked entity graph materializer for Feedwire.
//!
//! Parsed entries become long-lived tracked objects:
//!
//! - Every entity is keyed by its durable identity URI, and one identity
//!   resolves to one object per graph
//! - A merge policy decides whether a payload may refresh an object the
//!   caller has already changed
//! - Navigation collections are reconciled member-by-member instead of
//!   being replaced wholesale
//! - Continuations are recorded per collection so paging can resume with
//!   the same shaping later
//!
//! The caller owns the [`TypeRegistry`] describing its model and the
//! [`EntityGraph`] holding state across requests; a [`Materializer`]
//! borrows both and drains one response document through
//! [`Materializer::read`].
//!
//! ## Usage
//!
//! ```
//! use feedwire_atom::FeedParser;
//! use feedwire_graph::{EntityGraph, Materialized, Materializer, ScalarKind, TypeRegistry};
//!
//! let mut registry = TypeRegistry::new();
//! let customer = registry
//!     .entity("Model.Customer")
//!     .scalar("CustomerID", ScalarKind::String)
//!     .register()
//!     .unwrap();
//!
//! let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"
//!     xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices"
//!     xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata">
//!   <entry>
//!     <id>http://host/svc/Customers('ALFKI')</id>
//!     <content type="application/xml">
//!       <m:properties><d:CustomerID>ALFKI</d:CustomerID></m:properties>
//!     </content>
//!   </entry>
//! </feed>"#;
//!
//! let mut graph = EntityGraph::new();
//! let handle = {
//!     let parser = FeedParser::new(xml.as_bytes());
//!     let mut materializer = Materializer::new(parser, &mut graph, &registry, customer);
//!     let first = match materializer.read().unwrap() {
//!         Some(Materialized::Entity(handle)) => handle,
//!         other => panic!("unexpected result {other:?}"),
//!     };
//!     assert!(materializer.read().unwrap().is_none());
//!     first
//! };
//!
//! assert_eq!(
//!     graph
//!         .field_by_name(&registry, handle, "CustomerID")
//!         .and_then(|field| field.as_scalar())
//!         .and_then(|scalar| scalar.as_str()),
//!     Some("ALFKI")
//! );
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod continuation;
mod convert;
mod error;
mod graph;
mod materialize;
mod model;
mod options;
mod plan;
mod types;
mod value;

pub use continuation::{Continuation, ContinuationRegistry, ReplayPlan};
pub use convert::{ConvertError, DefaultConverter, ValueConverter};
pub use error::{MaterializeError, MaterializeResult};
pub use graph::{CollectionRecord, EntityGraph, EntityMeta, EntityRecord};
pub use materialize::{MaterializeContext, Materializer};
pub use model::{
    ModelType, PropertyDescriptor, PropertyKind, ScalarKind, TypeBuilder, TypeRegistry, TypeToken,
};
pub use options::{MaterializeOptions, PlanMode};
pub use plan::{projection, Materialized, ProjectionPlan};
pub use types::{ChangeState, CollectionHandle, EntityHandle, EntityKey, MergePolicy};
pub use value::{ComplexValue, FieldValue, ScalarValue};

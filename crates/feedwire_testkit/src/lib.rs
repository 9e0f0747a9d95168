//! # Feedwire Testkit
//!
//! Test utilities for Feedwire.
//!
//! This crate provides:
//! - A sample service model and canned documents
//! - Builders for batch envelope payloads
//! - An end-to-end pipeline harness over all three crates
//! - Property-based test generators using proptest
//!
//! ## Usage
//!
//! ```rust,ignore
//! use feedwire_testkit::prelude::*;
//!
//! #[test]
//! fn materializes_a_page() {
//!     let mut harness = PipelineHarness::new();
//!     let customer = harness.model.customer;
//!     let xml = feed(&customer_entry("ALFKI", "Alfreds", "Berlin"));
//!     let handles = harness.materialize(&xml, customer, Default::default());
//!     assert_eq!(handles.len(), 1);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod envelopes;
pub mod fixtures;
pub mod generators;
pub mod pipeline;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::envelopes::*;
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::pipeline::*;
}

pub use envelopes::*;
pub use fixtures::*;
pub use generators::*;
pub use pipeline::*;

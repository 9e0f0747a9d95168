//! # Feedwire Atom
//!
//! Streaming feed and entry event parser for Feedwire.
//!
//! Payloads are syndication documents with a data-service vocabulary
//! layered on top:
//!
//! - Entries carry their durable identity, a type category, edit and
//!   self links, and a bag of typed data properties
//! - Navigation links relate entries to each other and may carry the
//!   related content inline
//! - Feeds may declare a server-side count and a continuation link for
//!   the next page
//!
//! [`FeedParser`] walks one document and reports [`FeedEvent`]s in
//! document order. Top-level entries stream one at a time; inline
//! expansions are materialized into the owning entry.
//!
//! ## Usage
//!
//! ```
//! use feedwire_atom::{FeedEvent, FeedParser};
//!
//! let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom"
//!     xmlns:d="http://schemas.microsoft.com/ado/2007/08/dataservices"
//!     xmlns:m="http://schemas.microsoft.com/ado/2007/08/dataservices/metadata">
//!   <entry>
//!     <id>http://host/svc/Customers(1)</id>
//!     <content type="application/xml">
//!       <m:properties><d:Name>Alice</d:Name></m:properties>
//!     </content>
//!   </entry>
//! </feed>"#;
//!
//! let mut parser = FeedParser::new(xml.as_bytes());
//! assert_eq!(parser.next_event().unwrap(), FeedEvent::FeedStart);
//!
//! let entry = match parser.next_event().unwrap() {
//!     FeedEvent::Entry(entry) => entry,
//!     other => panic!("unexpected event {other:?}"),
//! };
//! assert_eq!(
//!     entry.property("Name").and_then(|p| p.value.as_text()),
//!     Some("Alice")
//! );
//! assert_eq!(parser.next_event().unwrap(), FeedEvent::Finished);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod event;
mod options;
mod parser;
pub mod vocab;

pub use error::{AtomError, AtomResult};
pub use event::{
    Entry, FeedEvent, InlineFeed, MediaInfo, NavContent, NavLink, Property, PropertyValue,
};
pub use options::ParseOptions;
pub use parser::FeedParser;

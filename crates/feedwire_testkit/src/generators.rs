//! Property-based test generators using proptest.
//!
//! Strategies produce wire artifacts that are valid by construction:
//! operations respect body rules, documents stay well-formed, and text
//! never needs escaping.

use feedwire_envelope::{Method, Operation};
use proptest::prelude::*;

use crate::fixtures::{customer_entry, feed, SERVICE_ROOT};

/// Strategy for service-rooted resource URIs.
pub fn resource_uri_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z]{1,12}".prop_map(|name| format!("{SERVICE_ROOT}/{name}"))
}

/// Strategy for XML-safe text values.
pub fn text_value_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 ]{0,24}".prop_map(|s| s.trim().to_string())
}

/// Strategy for retrieval operations.
pub fn retrieval_strategy() -> impl Strategy<Value = Operation> {
    resource_uri_strategy().prop_map(|uri| Operation::request(Method::Get, uri))
}

/// Strategy for change operations.
///
/// Bodies only appear on methods that allow them, and Content-IDs are
/// attached at random.
pub fn change_strategy() -> impl Strategy<Value = Operation> {
    (
        prop_oneof![
            Just(Method::Post),
            Just(Method::Put),
            Just(Method::Merge),
            Just(Method::Delete),
        ],
        resource_uri_strategy(),
        prop::collection::vec(any::<u8>(), 0..256),
        prop::option::of(1u32..100),
    )
        .prop_map(|(method, uri, body, id)| {
            let mut op = Operation::request(method, uri);
            if let Some(id) = id {
                op = op.with_header("Content-ID", id.to_string());
            }
            if method.allows_body() {
                op = op.with_body(body);
            }
            op
        })
}

/// A generated feed document with the customers it contains.
#[derive(Debug, Clone)]
pub struct CustomerFeed {
    /// The complete document.
    pub xml: String,
    /// `(id, company)` per entry, in document order.
    pub customers: Vec<(String, String)>,
}

/// Strategy for whole customer feed documents.
///
/// Identities draw from a small pool, so repeats are common enough to
/// exercise identity resolution.
pub fn customer_feed_strategy(max_entries: usize) -> impl Strategy<Value = CustomerFeed> {
    prop::collection::vec((0u32..6, "[a-z]{1,10}"), 1..max_entries.max(2)).prop_map(|raw| {
        let customers: Vec<(String, String)> = raw
            .into_iter()
            .map(|(id, company)| (format!("C{id}"), company))
            .collect();
        let mut body = String::new();
        for (id, company) in &customers {
            body.push_str(&customer_entry(id, company, "Berlin"));
        }
        CustomerFeed {
            xml: feed(&body),
            customers,
        }
    })
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Configuration for thorough tests.
    #[must_use]
    pub fn thorough() -> Self {
        Self {
            cases: 1024,
            max_shrink_iters: 10000,
        }
    }

    /// Converts to a proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #![proptest_config(PropTestConfig::quick().to_proptest_config())]

        #[test]
        fn change_operations_respect_body_rules(op in change_strategy()) {
            let method = op.method().expect("change operations are requests");
            if !method.allows_body() {
                prop_assert!(op.body.is_empty());
            }
        }

        #[test]
        fn generated_feeds_parse_cleanly(doc in customer_feed_strategy(8)) {
            use feedwire_atom::{FeedEvent, FeedParser};

            let mut parser = FeedParser::new(doc.xml.as_bytes());
            let mut seen = 0usize;
            loop {
                match parser.next_event().unwrap() {
                    FeedEvent::Entry(entry) => {
                        let expected = &doc.customers[seen];
                        prop_assert!(entry.identity.as_str().contains(&expected.0));
                        seen += 1;
                    }
                    FeedEvent::Finished => break,
                    _ => {}
                }
            }
            prop_assert_eq!(seen, doc.customers.len());
        }
    }
}

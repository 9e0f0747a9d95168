//! Integration tests for identity tracking and merge behavior.

use feedwire_atom::FeedParser;
use feedwire_graph::{
    projection, ChangeState, EntityGraph, EntityHandle, EntityKey, EntityRecord, FieldValue,
    Materialized, MaterializeOptions, Materializer, MergePolicy, PlanMode, ReplayPlan, ScalarKind,
    ScalarValue, TypeRegistry, TypeToken,
};
use url::Url;

const FEED_OPEN: &str = concat!(
    "<feed xmlns=\"http://www.w3.org/2005/Atom\"",
    " xmlns:d=\"http://schemas.microsoft.com/ado/2007/08/dataservices\"",
    " xmlns:m=\"http://schemas.microsoft.com/ado/2007/08/dataservices/metadata\">"
);

/// Customers own an Orders collection; both types carry a couple of
/// scalars so refreshes are observable.
fn model() -> (TypeRegistry, TypeToken, TypeToken) {
    let mut registry = TypeRegistry::new();
    let order = registry
        .entity("Model.Order")
        .scalar("OrderID", ScalarKind::Int32)
        .nullable_scalar("ShipCity", ScalarKind::String)
        .register()
        .unwrap();
    let customer = registry
        .entity("Model.Customer")
        .scalar("CustomerID", ScalarKind::String)
        .nullable_scalar("CompanyName", ScalarKind::String)
        .collection("Orders", order)
        .register()
        .unwrap();
    (registry, customer, order)
}

fn customer_entry(id: &str, company: &str, links: &str) -> String {
    format!(
        concat!(
            "<entry>",
            "<id>http://host/svc/Customers('{id}')</id>",
            "<category term=\"Model.Customer\"",
            " scheme=\"http://schemas.microsoft.com/ado/2007/08/dataservices/scheme\"/>",
            "{links}",
            "<content type=\"application/xml\"><m:properties>",
            "<d:CustomerID>{id}</d:CustomerID>",
            "<d:CompanyName>{company}</d:CompanyName>",
            "</m:properties></content>",
            "</entry>"
        ),
        id = id,
        company = company,
        links = links,
    )
}

fn tagged_customer(id: &str, etag: &str, company: &str) -> String {
    format!(
        concat!(
            "<entry m:etag=\"{etag}\">",
            "<id>http://host/svc/Customers('{id}')</id>",
            "<content type=\"application/xml\"><m:properties>",
            "<d:CustomerID>{id}</d:CustomerID>",
            "<d:CompanyName>{company}</d:CompanyName>",
            "</m:properties></content>",
            "</entry>"
        ),
        etag = etag,
        id = id,
        company = company,
    )
}

fn order_entry(id: i32, city: &str) -> String {
    format!(
        concat!(
            "<entry>",
            "<id>http://host/svc/Orders({id})</id>",
            "<category term=\"Model.Order\"",
            " scheme=\"http://schemas.microsoft.com/ado/2007/08/dataservices/scheme\"/>",
            "<content type=\"application/xml\"><m:properties>",
            "<d:OrderID m:type=\"Edm.Int32\">{id}</d:OrderID>",
            "<d:ShipCity>{city}</d:ShipCity>",
            "</m:properties></content>",
            "</entry>"
        ),
        id = id,
        city = city,
    )
}

fn orders_inline(customer: &str, feed_body: &str) -> String {
    format!(
        concat!(
            "<link rel=\"http://schemas.microsoft.com/ado/2007/08/dataservices/related/Orders\"",
            " type=\"application/atom+xml;type=feed\"",
            " href=\"http://host/svc/Customers('{customer}')/Orders\">",
            "<m:inline><feed>{body}</feed></m:inline>",
            "</link>"
        ),
        customer = customer,
        body = feed_body,
    )
}

fn url(text: &str) -> Url {
    Url::parse(text).unwrap()
}

/// Drains one document, returning the entity handle of every pull.
fn run(
    xml: &str,
    graph: &mut EntityGraph,
    registry: &TypeRegistry,
    expected: TypeToken,
    options: MaterializeOptions,
) -> Vec<EntityHandle> {
    let parser = FeedParser::new(xml.as_bytes());
    let mut materializer = Materializer::with_options(parser, graph, registry, expected, options);
    let mut handles = Vec::new();
    while let Some(result) = materializer.read().unwrap() {
        handles.push(result.as_entity().unwrap());
    }
    handles
}

fn company(graph: &EntityGraph, registry: &TypeRegistry, handle: EntityHandle) -> Option<String> {
    graph
        .field_by_name(registry, handle, "CompanyName")
        .and_then(FieldValue::as_scalar)
        .and_then(ScalarValue::as_str)
        .map(str::to_string)
}

fn ship_city(graph: &EntityGraph, registry: &TypeRegistry, handle: EntityHandle) -> Option<String> {
    graph
        .field_by_name(registry, handle, "ShipCity")
        .and_then(FieldValue::as_scalar)
        .and_then(ScalarValue::as_str)
        .map(str::to_string)
}

fn set_company(
    graph: &mut EntityGraph,
    registry: &TypeRegistry,
    handle: EntityHandle,
    value: &str,
) {
    graph
        .set_field_by_name(
            registry,
            handle,
            "CompanyName",
            FieldValue::Scalar(ScalarValue::from(value)),
        )
        .unwrap();
}

#[test]
fn one_run_resolves_an_identity_once() {
    let (registry, customer, _) = model();
    let mut graph = EntityGraph::new();
    let xml = format!(
        "{FEED_OPEN}{}{}</feed>",
        customer_entry("ALFKI", "First Spelling", ""),
        customer_entry("ALFKI", "Second Spelling", ""),
    );

    let handles = run(
        &xml,
        &mut graph,
        &registry,
        customer,
        MaterializeOptions::default(),
    );

    assert_eq!(handles.len(), 2);
    assert_eq!(handles[0], handles[1]);
    assert_eq!(graph.tracked_len(), 1);
    // The repeat keeps the run's decision to apply, so the later values win.
    assert_eq!(
        company(&graph, &registry, handles[0]).as_deref(),
        Some("Second Spelling")
    );
}

#[test]
fn append_only_never_touches_tracked_objects() {
    let (registry, customer, _) = model();
    let mut graph = EntityGraph::new();
    let seed = format!(
        "{FEED_OPEN}{}{}</feed>",
        tagged_customer("ALFKI", "W/&quot;1&quot;", "Alfreds"),
        tagged_customer("ANATR", "W/&quot;1&quot;", "Ana"),
    );
    let handles = run(
        &seed,
        &mut graph,
        &registry,
        customer,
        MaterializeOptions::default(),
    );
    let (alfki, anatr) = (handles[0], handles[1]);
    set_company(&mut graph, &registry, alfki, "Local Edit");
    graph.set_state(alfki, ChangeState::Modified).unwrap();

    let refresh = format!(
        "{FEED_OPEN}{}{}</feed>",
        tagged_customer("ALFKI", "W/&quot;9&quot;", "Fresh From Server"),
        tagged_customer("ANATR", "W/&quot;9&quot;", "Fresh From Server"),
    );
    let refreshed = run(
        &refresh,
        &mut graph,
        &registry,
        customer,
        MaterializeOptions::new().policy(MergePolicy::AppendOnly),
    );

    assert_eq!(refreshed, vec![alfki, anatr]);
    assert_eq!(company(&graph, &registry, alfki).as_deref(), Some("Local Edit"));
    assert_eq!(company(&graph, &registry, anatr).as_deref(), Some("Ana"));
    // Metadata is only recorded when values apply.
    assert_eq!(
        graph.entity(alfki).unwrap().meta().etag.as_deref(),
        Some("W/\"1\"")
    );
    assert_eq!(graph.state(alfki), Some(ChangeState::Modified));
}

#[test]
fn overwrite_changes_refreshes_every_state() {
    let (registry, customer, _) = model();
    let mut graph = EntityGraph::new();
    let seed = format!(
        "{FEED_OPEN}{}{}</feed>",
        tagged_customer("ALFKI", "W/&quot;1&quot;", "Alfreds"),
        tagged_customer("ANATR", "W/&quot;1&quot;", "Ana"),
    );
    let handles = run(
        &seed,
        &mut graph,
        &registry,
        customer,
        MaterializeOptions::default(),
    );
    let (alfki, anatr) = (handles[0], handles[1]);
    set_company(&mut graph, &registry, alfki, "Local Edit");
    graph.set_state(alfki, ChangeState::Modified).unwrap();
    graph.set_state(anatr, ChangeState::Deleted).unwrap();

    let refresh = format!(
        "{FEED_OPEN}{}{}</feed>",
        tagged_customer("ALFKI", "W/&quot;9&quot;", "Fresh From Server"),
        tagged_customer("ANATR", "W/&quot;9&quot;", "Fresh From Server"),
    );
    run(
        &refresh,
        &mut graph,
        &registry,
        customer,
        MaterializeOptions::new().policy(MergePolicy::OverwriteChanges),
    );

    assert_eq!(
        company(&graph, &registry, alfki).as_deref(),
        Some("Fresh From Server")
    );
    assert_eq!(
        company(&graph, &registry, anatr).as_deref(),
        Some("Fresh From Server")
    );
    assert_eq!(
        graph.entity(alfki).unwrap().meta().etag.as_deref(),
        Some("W/\"9\"")
    );
}

#[test]
fn preserve_changes_refreshes_deleted_but_not_modified() {
    let (registry, customer, _) = model();
    let mut graph = EntityGraph::new();
    let seed = format!(
        "{FEED_OPEN}{}{}</feed>",
        customer_entry("ALFKI", "Alfreds", ""),
        customer_entry("ANATR", "Ana", ""),
    );
    let handles = run(
        &seed,
        &mut graph,
        &registry,
        customer,
        MaterializeOptions::default(),
    );
    let (modified, deleted) = (handles[0], handles[1]);
    set_company(&mut graph, &registry, modified, "Local Edit");
    graph.set_state(modified, ChangeState::Modified).unwrap();
    graph.set_state(deleted, ChangeState::Deleted).unwrap();

    let refresh = format!(
        "{FEED_OPEN}{}{}</feed>",
        customer_entry("ALFKI", "Fresh From Server", ""),
        customer_entry("ANATR", "Fresh From Server", ""),
    );
    run(
        &refresh,
        &mut graph,
        &registry,
        customer,
        MaterializeOptions::new().policy(MergePolicy::PreserveChanges),
    );

    assert_eq!(
        company(&graph, &registry, modified).as_deref(),
        Some("Local Edit")
    );
    assert_eq!(
        company(&graph, &registry, deleted).as_deref(),
        Some("Fresh From Server")
    );
}

#[test]
fn repeated_identity_carries_the_run_decision() {
    for (policy, expected) in [
        (MergePolicy::AppendOnly, "Local Edit"),
        (MergePolicy::OverwriteChanges, "Second Spelling"),
    ] {
        let (registry, customer, _) = model();
        let mut graph = EntityGraph::new();
        let seed = format!("{FEED_OPEN}{}</feed>", customer_entry("ALFKI", "Alfreds", ""));
        let handle = run(
            &seed,
            &mut graph,
            &registry,
            customer,
            MaterializeOptions::default(),
        )[0];
        set_company(&mut graph, &registry, handle, "Local Edit");
        graph.set_state(handle, ChangeState::Modified).unwrap();

        let double = format!(
            "{FEED_OPEN}{}{}</feed>",
            customer_entry("ALFKI", "First Spelling", ""),
            customer_entry("ALFKI", "Second Spelling", ""),
        );
        let handles = run(
            &double,
            &mut graph,
            &registry,
            customer,
            MaterializeOptions::new().policy(policy),
        );

        assert_eq!(handles, vec![handle, handle]);
        assert_eq!(
            company(&graph, &registry, handle).as_deref(),
            Some(expected),
            "policy {policy:?}"
        );
    }
}

#[test]
fn collection_refresh_keeps_uncommitted_additions() {
    let (registry, customer, order) = model();
    let mut graph = EntityGraph::new();

    // First page: the customer arrives with two orders.
    let first_inline = format!("{}{}", order_entry(1, "Lyon"), order_entry(2, "Gent"));
    let seed = format!(
        "{FEED_OPEN}{}</feed>",
        customer_entry("ALFKI", "Alfreds", &orders_inline("ALFKI", &first_inline)),
    );
    let alfki = run(
        &seed,
        &mut graph,
        &registry,
        customer,
        MaterializeOptions::default(),
    )[0];
    let kept = graph
        .lookup(&EntityKey::new(url("http://host/svc/Orders(1)")))
        .unwrap();
    let dropped = graph
        .lookup(&EntityKey::new(url("http://host/svc/Orders(2)")))
        .unwrap();
    let orders = graph
        .field_by_name(&registry, alfki, "Orders")
        .and_then(FieldValue::as_collection)
        .unwrap();
    assert_eq!(graph.collection(orders).unwrap().items(), &[kept, dropped]);

    // The caller adds an order of their own before the next refresh.
    let field_count = registry.get(order).unwrap().field_count();
    let pending = graph
        .attach(EntityRecord::new(
            order,
            EntityKey::new(url("http://host/svc/Orders(999)")),
            field_count,
        ))
        .unwrap();
    graph.set_state(pending, ChangeState::Added).unwrap();
    graph.collection_mut(orders).unwrap().push(pending);

    // Refresh: order 1 survives with new values, order 3 is new, order 2
    // is gone from the service. The uncommitted addition must survive.
    let second_inline = format!("{}{}", order_entry(1, "Marseille"), order_entry(3, "Oslo"));
    let refresh = format!(
        "{FEED_OPEN}{}</feed>",
        customer_entry("ALFKI", "Alfreds", &orders_inline("ALFKI", &second_inline)),
    );
    run(
        &refresh,
        &mut graph,
        &registry,
        customer,
        MaterializeOptions::new().policy(MergePolicy::PreserveChanges),
    );

    let fresh = graph
        .lookup(&EntityKey::new(url("http://host/svc/Orders(3)")))
        .unwrap();
    assert_eq!(
        graph.collection(orders).unwrap().items(),
        &[kept, pending, fresh]
    );
    assert_eq!(
        ship_city(&graph, &registry, kept).as_deref(),
        Some("Marseille")
    );
}

#[test]
fn skipped_refresh_still_records_continuations() {
    let (registry, customer, _) = model();
    let mut graph = EntityGraph::new();
    let seed = format!("{FEED_OPEN}{}</feed>", customer_entry("ALFKI", "Alfreds", ""));
    let alfki = run(
        &seed,
        &mut graph,
        &registry,
        customer,
        MaterializeOptions::default(),
    )[0];
    set_company(&mut graph, &registry, alfki, "Local Edit");
    graph.set_state(alfki, ChangeState::Modified).unwrap();

    let inline = format!(
        "{}<link rel=\"next\" href=\"http://host/svc/Customers('ALFKI')/Orders?page=2\"/>",
        order_entry(7, "Lyon"),
    );
    let refresh = format!(
        "{FEED_OPEN}{}</feed>",
        customer_entry("ALFKI", "Fresh From Server", &orders_inline("ALFKI", &inline)),
    );
    let parser = FeedParser::new(refresh.as_bytes());
    let mut materializer = Materializer::with_options(
        parser,
        &mut graph,
        &registry,
        customer,
        MaterializeOptions::new().policy(MergePolicy::AppendOnly),
    );
    assert!(materializer.read().unwrap().is_some());
    assert!(materializer.read().unwrap().is_none());
    let continuations = materializer.into_continuations();

    // Values and membership stayed untouched; the nested order was never
    // materialized.
    assert_eq!(company(&graph, &registry, alfki).as_deref(), Some("Local Edit"));
    assert!(graph
        .lookup(&EntityKey::new(url("http://host/svc/Orders(7)")))
        .is_none());

    // The collection exists, empty, purely to anchor the continuation.
    let orders = graph
        .field_by_name(&registry, alfki, "Orders")
        .and_then(FieldValue::as_collection)
        .unwrap();
    assert!(graph.collection(orders).unwrap().is_empty());
    let continuation = continuations.get(Some(orders)).unwrap();
    assert_eq!(
        continuation.next().as_str(),
        "http://host/svc/Customers('ALFKI')/Orders?page=2"
    );
    assert!(continuations.get(None).is_none());
}

#[test]
fn no_tracking_bypasses_the_identity_map() {
    let (registry, customer, _) = model();
    let mut graph = EntityGraph::new();
    let xml = format!("{FEED_OPEN}{}</feed>", customer_entry("ALFKI", "Alfreds", ""));
    let options = || MaterializeOptions::new().policy(MergePolicy::NoTracking);

    let first = run(&xml, &mut graph, &registry, customer, options())[0];
    let second = run(&xml, &mut graph, &registry, customer, options())[0];

    assert_ne!(first, second);
    assert_eq!(graph.len(), 2);
    assert_eq!(graph.tracked_len(), 0);
    assert!(graph
        .lookup(&EntityKey::new(url("http://host/svc/Customers('ALFKI')")))
        .is_none());
    assert_eq!(company(&graph, &registry, second).as_deref(), Some("Alfreds"));
}

#[test]
fn shallow_mode_leaves_nested_entries_alone() {
    let mut registry = TypeRegistry::new();
    let customer = registry
        .entity("Model.Customer")
        .scalar("CustomerID", ScalarKind::String)
        .register()
        .unwrap();
    let order = registry
        .entity("Model.Order")
        .scalar("OrderID", ScalarKind::Int32)
        .reference("Customer", customer)
        .register()
        .unwrap();

    let xml = format!(
        concat!(
            "{}<entry>",
            "<id>http://host/svc/Orders(1)</id>",
            "<link rel=\"http://schemas.microsoft.com/ado/2007/08/dataservices/related/Customer\"",
            " type=\"application/atom+xml;type=entry\"",
            " href=\"http://host/svc/Orders(1)/Customer\">",
            "<m:inline><entry>",
            "<id>http://host/svc/Customers('ALFKI')</id>",
            "<content type=\"application/xml\"><m:properties>",
            "<d:CustomerID>ALFKI</d:CustomerID>",
            "</m:properties></content>",
            "</entry></m:inline>",
            "</link>",
            "<content type=\"application/xml\"><m:properties>",
            "<d:OrderID m:type=\"Edm.Int32\">1</d:OrderID>",
            "</m:properties></content>",
            "</entry></feed>"
        ),
        FEED_OPEN
    );

    let mut graph = EntityGraph::new();
    let direct = run(
        &xml,
        &mut graph,
        &registry,
        order,
        MaterializeOptions::default(),
    )[0];
    let linked = graph
        .field_by_name(&registry, direct, "Customer")
        .and_then(FieldValue::as_reference)
        .unwrap();
    assert_eq!(
        graph.entity(linked).unwrap().key().as_url().as_str(),
        "http://host/svc/Customers('ALFKI')"
    );
    assert_eq!(graph.tracked_len(), 2);

    let mut graph = EntityGraph::new();
    let shallow = run(
        &xml,
        &mut graph,
        &registry,
        order,
        MaterializeOptions::new().plan_mode(PlanMode::Shallow),
    )[0];
    assert!(graph
        .field_by_name(&registry, shallow, "Customer")
        .is_some_and(FieldValue::is_null));
    assert_eq!(graph.tracked_len(), 1);
}

#[test]
fn shallow_mode_skips_inline_collections() {
    let (registry, customer, _) = model();
    let mut graph = EntityGraph::new();
    let inline = order_entry(1, "Lyon");
    let xml = format!(
        "{FEED_OPEN}{}</feed>",
        customer_entry("ALFKI", "Alfreds", &orders_inline("ALFKI", &inline)),
    );

    let alfki = run(
        &xml,
        &mut graph,
        &registry,
        customer,
        MaterializeOptions::new().plan_mode(PlanMode::Shallow),
    )[0];

    // Data values still apply; the expansion is left to the plan.
    assert_eq!(company(&graph, &registry, alfki).as_deref(), Some("Alfreds"));
    assert!(graph
        .field_by_name(&registry, alfki, "Orders")
        .is_some_and(FieldValue::is_null));
    assert!(graph
        .lookup(&EntityKey::new(url("http://host/svc/Orders(1)")))
        .is_none());
    assert_eq!(graph.tracked_len(), 1);
}

#[test]
fn projection_plans_shape_each_result() {
    let (registry, customer, _) = model();
    let mut graph = EntityGraph::new();
    let xml = format!(
        "{FEED_OPEN}{}{}<link rel=\"next\" href=\"http://host/svc/Customers?page=2\"/></feed>",
        customer_entry("ALFKI", "Alfreds", ""),
        customer_entry("ANATR", "Ana", ""),
    );

    let parser = FeedParser::new(xml.as_bytes());
    let mut materializer = Materializer::new(parser, &mut graph, &registry, customer).plan(
        projection(|context, entry, expected| {
            let handle = context.materialize_entry(entry, expected, false)?;
            let name = context
                .graph()
                .field_by_name(context.registry(), handle, "CompanyName")
                .cloned()
                .unwrap_or_default();
            Ok(Materialized::Value(name))
        }),
    );

    let mut names = Vec::new();
    while let Some(result) = materializer.read().unwrap() {
        names.push(result.as_value().cloned().unwrap());
    }
    // Continuations replay through the installed plan.
    assert!(matches!(
        materializer.continuation(None).unwrap().plan(),
        ReplayPlan::Custom(_)
    ));
    drop(materializer);

    assert_eq!(
        names,
        vec![
            FieldValue::Scalar(ScalarValue::from("Alfreds")),
            FieldValue::Scalar(ScalarValue::from("Ana")),
        ]
    );
    // The plan still went through the identity machinery.
    assert_eq!(graph.tracked_len(), 2);
}

#[test]
fn nested_continuations_register_first_wins() {
    let (registry, customer, _) = model();
    let mut graph = EntityGraph::new();
    let first_inline = format!(
        "{}<link rel=\"next\" href=\"http://host/svc/Customers('ALFKI')/Orders?page=2\"/>",
        order_entry(1, "Lyon"),
    );
    let second_inline =
        "<link rel=\"next\" href=\"http://host/svc/Customers('ALFKI')/Orders?page=3\"/>";
    let xml = format!(
        "{FEED_OPEN}{}{}</feed>",
        customer_entry("ALFKI", "Alfreds", &orders_inline("ALFKI", &first_inline)),
        customer_entry("ALFKI", "Alfreds", &orders_inline("ALFKI", second_inline)),
    );

    let parser = FeedParser::new(xml.as_bytes());
    let mut materializer = Materializer::new(parser, &mut graph, &registry, customer);
    let mut handles = Vec::new();
    while let Some(result) = materializer.read().unwrap() {
        handles.push(result.as_entity().unwrap());
    }
    let continuations = materializer.into_continuations();

    assert_eq!(handles[0], handles[1]);
    assert_eq!(continuations.len(), 1);
    let orders = graph
        .field_by_name(&registry, handles[0], "Orders")
        .and_then(FieldValue::as_collection)
        .unwrap();
    assert_eq!(
        continuations.get(Some(orders)).unwrap().next().as_str(),
        "http://host/svc/Customers('ALFKI')/Orders?page=2"
    );
}

#[test]
fn pulls_after_the_end_keep_reporting_no_data() {
    let (registry, customer, _) = model();
    let mut graph = EntityGraph::new();
    let xml = format!("{FEED_OPEN}{}</feed>", customer_entry("ALFKI", "Alfreds", ""));

    let parser = FeedParser::new(xml.as_bytes());
    let mut materializer = Materializer::new(parser, &mut graph, &registry, customer);
    assert!(materializer.read().unwrap().is_some());
    for _ in 0..3 {
        assert!(materializer.read().unwrap().is_none());
    }
}

mod properties {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;

    fn policy_strategy() -> impl Strategy<Value = MergePolicy> {
        prop_oneof![
            Just(MergePolicy::AppendOnly),
            Just(MergePolicy::OverwriteChanges),
            Just(MergePolicy::PreserveChanges),
            Just(MergePolicy::NoTracking),
        ]
    }

    proptest! {
        /// However often an identity repeats, a run produces exactly one
        /// object for it.
        #[test]
        fn one_object_per_identity_per_run(
            entries in prop::collection::vec((0u32..5, "[a-z]{1,8}"), 1..12),
            policy in policy_strategy(),
        ) {
            let (registry, customer, _) = model();
            let mut graph = EntityGraph::new();
            let mut xml = String::from(FEED_OPEN);
            for (id, name) in &entries {
                xml.push_str(&customer_entry(&format!("C{id}"), name, ""));
            }
            xml.push_str("</feed>");

            let handles = run(
                &xml,
                &mut graph,
                &registry,
                customer,
                MaterializeOptions::new().policy(policy),
            );
            prop_assert_eq!(handles.len(), entries.len());

            let mut first_seen: HashMap<u32, EntityHandle> = HashMap::new();
            for ((id, _), handle) in entries.iter().zip(&handles) {
                let expected = *first_seen.entry(*id).or_insert(*handle);
                prop_assert_eq!(expected, *handle);
            }

            let distinct = first_seen.len();
            prop_assert_eq!(graph.len(), distinct);
            let tracked = if policy == MergePolicy::NoTracking { 0 } else { distinct };
            prop_assert_eq!(graph.tracked_len(), tracked);
        }
    }
}

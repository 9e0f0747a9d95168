//! Sample model and canned documents.
//!
//! Provides a small Northwind-flavored service model and builders for
//! the documents such a service would emit.

use feedwire_graph::{ScalarKind, TypeRegistry, TypeToken};

/// The sample model every harness materializes against.
///
/// Customers carry a complex address and an orders collection, so one
/// document can exercise scalars, complex values and navigation.
#[derive(Debug)]
pub struct SampleModel {
    /// The registry holding all three types.
    pub registry: TypeRegistry,
    /// `Sample.Address`, a complex type.
    pub address: TypeToken,
    /// `Sample.Order`, the collection element.
    pub order: TypeToken,
    /// `Sample.Customer`, the top-level entity.
    pub customer: TypeToken,
}

/// Builds the sample model.
#[must_use]
pub fn sample_model() -> SampleModel {
    let mut registry = TypeRegistry::new();
    let address = registry
        .complex("Sample.Address")
        .nullable_scalar("Street", ScalarKind::String)
        .nullable_scalar("City", ScalarKind::String)
        .register()
        .expect("address type registers");
    let order = registry
        .entity("Sample.Order")
        .scalar("OrderID", ScalarKind::Int32)
        .nullable_scalar("OrderDate", ScalarKind::DateTime)
        .nullable_scalar("ShipCity", ScalarKind::String)
        .register()
        .expect("order type registers");
    let customer = registry
        .entity("Sample.Customer")
        .scalar("CustomerID", ScalarKind::String)
        .nullable_scalar("CompanyName", ScalarKind::String)
        .complex("Address", address)
        .collection("Orders", order)
        .register()
        .expect("customer type registers");
    SampleModel {
        registry,
        address,
        order,
        customer,
    }
}

/// Namespace preamble shared by every built document.
pub const FEED_OPEN: &str = concat!(
    "<feed xmlns=\"http://www.w3.org/2005/Atom\"",
    " xmlns:d=\"http://schemas.microsoft.com/ado/2007/08/dataservices\"",
    " xmlns:m=\"http://schemas.microsoft.com/ado/2007/08/dataservices/metadata\">"
);

/// The category scheme the sample service stamps on entries.
pub const SCHEME: &str = "http://schemas.microsoft.com/ado/2007/08/dataservices/scheme";

/// Service root all sample identities live under.
pub const SERVICE_ROOT: &str = "http://host/sample.svc";

/// Wraps entry markup into a complete feed document.
#[must_use]
pub fn feed(body: &str) -> String {
    format!("{FEED_OPEN}{body}</feed>")
}

/// Wraps entry markup into a feed that continues at `next`.
#[must_use]
pub fn feed_with_next(body: &str, next: &str) -> String {
    format!("{FEED_OPEN}{body}<link rel=\"next\" href=\"{next}\"/></feed>")
}

/// A customer entry with a complex address, no navigation content.
#[must_use]
pub fn customer_entry(id: &str, company: &str, city: &str) -> String {
    customer_entry_with(id, company, city, "")
}

/// A customer entry carrying extra link markup before its content.
#[must_use]
pub fn customer_entry_with(id: &str, company: &str, city: &str, links: &str) -> String {
    format!(
        concat!(
            "<entry>",
            "<id>{root}/Customers('{id}')</id>",
            "<category term=\"Sample.Customer\" scheme=\"{scheme}\"/>",
            "<link rel=\"edit\" href=\"{root}/Customers('{id}')\"/>",
            "{links}",
            "<content type=\"application/xml\"><m:properties>",
            "<d:CustomerID>{id}</d:CustomerID>",
            "<d:CompanyName>{company}</d:CompanyName>",
            "<d:Address m:type=\"Sample.Address\">",
            "<d:Street m:null=\"true\"/>",
            "<d:City>{city}</d:City>",
            "</d:Address>",
            "</m:properties></content>",
            "</entry>"
        ),
        root = SERVICE_ROOT,
        scheme = SCHEME,
        id = id,
        company = company,
        city = city,
        links = links,
    )
}

/// An order entry with a typed key and a shipping city.
#[must_use]
pub fn order_entry(id: i32, ship_city: &str) -> String {
    format!(
        concat!(
            "<entry>",
            "<id>{root}/Orders({id})</id>",
            "<category term=\"Sample.Order\" scheme=\"{scheme}\"/>",
            "<content type=\"application/xml\"><m:properties>",
            "<d:OrderID m:type=\"Edm.Int32\">{id}</d:OrderID>",
            "<d:ShipCity>{city}</d:ShipCity>",
            "</m:properties></content>",
            "</entry>"
        ),
        root = SERVICE_ROOT,
        scheme = SCHEME,
        id = id,
        city = ship_city,
    )
}

/// An order as a standalone entry document, the shape a create answers
/// with.
#[must_use]
pub fn order_document(id: i32, ship_city: &str) -> String {
    format!(
        concat!(
            "<entry xmlns=\"http://www.w3.org/2005/Atom\"",
            " xmlns:d=\"http://schemas.microsoft.com/ado/2007/08/dataservices\"",
            " xmlns:m=\"http://schemas.microsoft.com/ado/2007/08/dataservices/metadata\">",
            "<id>{root}/Orders({id})</id>",
            "<category term=\"Sample.Order\" scheme=\"{scheme}\"/>",
            "<content type=\"application/xml\"><m:properties>",
            "<d:OrderID m:type=\"Edm.Int32\">{id}</d:OrderID>",
            "<d:ShipCity>{city}</d:ShipCity>",
            "</m:properties></content>",
            "</entry>"
        ),
        root = SERVICE_ROOT,
        scheme = SCHEME,
        id = id,
        city = ship_city,
    )
}

/// An expanded Orders link holding the given nested feed markup.
#[must_use]
pub fn orders_inline(customer_id: &str, feed_body: &str) -> String {
    format!(
        concat!(
            "<link rel=\"http://schemas.microsoft.com/ado/2007/08/dataservices/related/Orders\"",
            " type=\"application/atom+xml;type=feed\"",
            " href=\"{root}/Customers('{id}')/Orders\">",
            "<m:inline><feed>{body}</feed></m:inline>",
            "</link>"
        ),
        root = SERVICE_ROOT,
        id = customer_id,
        body = feed_body,
    )
}

/// The canonical identity of a sample customer.
#[must_use]
pub fn customer_identity(id: &str) -> String {
    format!("{SERVICE_ROOT}/Customers('{id}')")
}

/// The canonical identity of a sample order.
#[must_use]
pub fn order_identity(id: i32) -> String {
    format!("{SERVICE_ROOT}/Orders({id})")
}

/// A full response page the way the sample service writes it: count,
/// feed boilerplate, expanded orders and a continuation.
#[must_use]
pub fn customer_page() -> String {
    let expanded = orders_inline("ALFKI", &format!("{}{}", order_entry(1, "Lyon"), order_entry(2, "Gent")));
    format!(
        concat!(
            "{open}",
            "<title type=\"text\">Customers</title>",
            "<id>{root}/Customers</id>",
            "<updated>2010-03-10T08:38:10Z</updated>",
            "<m:count>91</m:count>",
            "{first}",
            "{second}",
            "<link rel=\"next\" href=\"{root}/Customers?page=2\"/>",
            "</feed>"
        ),
        open = FEED_OPEN,
        root = SERVICE_ROOT,
        first = customer_entry_with("ALFKI", "Alfreds Futterkiste", "Berlin", &expanded),
        second = customer_entry("ANATR", "Ana Trujillo", "Mexico City"),
    )
}

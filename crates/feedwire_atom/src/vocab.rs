//! Namespace URIs and link relations used on the wire.

/// Namespace of the syndication vocabulary (feed, entry, link, content).
pub const ATOM_NS: &str = "http://www.w3.org/2005/Atom";

/// Namespace of data property elements.
pub const DATA_NS: &str = "http://schemas.microsoft.com/ado/2007/08/dataservices";

/// Namespace of protocol metadata elements and attributes.
pub const METADATA_NS: &str = "http://schemas.microsoft.com/ado/2007/08/dataservices/metadata";

/// Category scheme that marks a category as the entry type name.
pub const SCHEME_DEFAULT: &str = "http://schemas.microsoft.com/ado/2007/08/dataservices/scheme";

/// Prefix of link relations that name a navigation property.
pub const RELATED_REL_PREFIX: &str =
    "http://schemas.microsoft.com/ado/2007/08/dataservices/related/";

/// The implicitly declared XML namespace (`xml:base`, `xml:lang`).
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// Link relation for the address an entry is updated through.
pub const REL_EDIT: &str = "edit";

/// Link relation for the canonical address of an entry.
pub const REL_SELF: &str = "self";

/// Link relation for the address a media resource is updated through.
pub const REL_EDIT_MEDIA: &str = "edit-media";

/// Link relation for the continuation of a paged feed.
pub const REL_NEXT: &str = "next";

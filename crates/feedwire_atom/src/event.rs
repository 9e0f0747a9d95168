//! Typed events and payload shapes produced by the parser.

use url::Url;

/// One pull result from a [`FeedParser`](crate::FeedParser).
///
/// Events arrive in document order. `Finished` is terminal: once reported,
/// every further pull reports it again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    /// The opening of the top-level feed.
    FeedStart,
    /// One fully materialized entry, including any inline expansions.
    Entry(Entry),
    /// The server-counted total for the feed.
    Count(i64),
    /// The continuation address of a paged feed.
    NextPage(Url),
    /// A direct feed child outside the syndication vocabulary, skipped whole.
    Custom(String),
    /// The end of the document.
    Finished,
}

/// A materialized entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// The durable identity of the entry.
    pub identity: Url,
    /// Concurrency token carried on the entry element.
    pub etag: Option<String>,
    /// Type name from the scheme-matched category, if declared.
    pub type_name: Option<String>,
    /// Address the entry is updated through.
    pub edit_link: Option<Url>,
    /// Canonical address of the entry.
    pub self_link: Option<Url>,
    /// Media resource details, present for media link entries.
    pub media: Option<MediaInfo>,
    /// Data properties in document order.
    pub properties: Vec<Property>,
    /// Navigation links in document order.
    pub links: Vec<NavLink>,
}

impl Entry {
    /// Looks up a data property by name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Looks up a navigation link by property name.
    #[must_use]
    pub fn link(&self, name: &str) -> Option<&NavLink> {
        self.links.iter().find(|l| l.name == name)
    }

    /// Whether the entry points at a separately stored media resource.
    #[must_use]
    pub fn is_media_link(&self) -> bool {
        self.media.as_ref().is_some_and(|m| m.src.is_some())
    }
}

/// Media resource details of a media link entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaInfo {
    /// Address the media resource is read from.
    pub src: Option<Url>,
    /// Declared content type of the media resource.
    pub content_type: Option<String>,
    /// Address the media resource is updated through.
    pub edit_media: Option<Url>,
    /// Concurrency token of the media resource.
    pub etag: Option<String>,
}

/// One data property of an entry or complex value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    /// Property name, taken from the element's local name.
    pub name: String,
    /// Declared wire type name, if any.
    pub type_name: Option<String>,
    /// The property value.
    pub value: PropertyValue,
}

/// The value carried by a [`Property`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    /// Unconverted text content. An empty element yields the empty string.
    Text(String),
    /// An explicitly null value.
    Null,
    /// A nested group of properties.
    Complex(Vec<Property>),
}

impl PropertyValue {
    /// Returns the text content, if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Whether the value is explicitly null.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// A navigation link from one entry toward related entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavLink {
    /// The navigation property name, taken from the link relation suffix.
    pub name: String,
    /// Address the related content can be fetched from.
    pub href: Option<Url>,
    /// Inline expansion, when the document carries the related content.
    pub content: Option<NavContent>,
}

impl NavLink {
    /// Whether the link carries an inline expansion.
    #[must_use]
    pub const fn is_expanded(&self) -> bool {
        self.content.is_some()
    }
}

/// The expanded content of a navigation link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavContent {
    /// A single related entry, or `None` when the reference is null.
    Entry(Option<Box<Entry>>),
    /// A related collection.
    Feed(InlineFeed),
}

/// A feed materialized inside a navigation link.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InlineFeed {
    /// Server-counted total, when the inline feed declares one.
    pub count: Option<i64>,
    /// Continuation address, when the inline feed is paged.
    pub next: Option<Url>,
    /// The inline entries in document order.
    pub entries: Vec<Entry>,
}

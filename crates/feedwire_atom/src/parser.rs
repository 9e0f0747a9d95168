//! Streaming feed parser.
//!
//! [`FeedParser`] walks a feed or entry document and reports typed
//! [`FeedEvent`]s in document order. Top-level entries stream one at a
//! time; inline expansions inside an entry are materialized whole before
//! the entry is reported.

use std::io::BufRead;

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{QName, ResolveResult};
use quick_xml::NsReader;
use tracing::{debug, trace};
use url::Url;

use crate::error::{AtomError, AtomResult};
use crate::event::{
    Entry, FeedEvent, InlineFeed, MediaInfo, NavContent, NavLink, Property, PropertyValue,
};
use crate::options::ParseOptions;
use crate::vocab;

/// Where the parser is within the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    /// Nothing read yet; the root element decides the document shape.
    Start,
    /// Inside the top-level feed element.
    InFeed,
    /// The document is consumed; every further pull reports `Finished`.
    Done,
}

/// Namespace classification of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ns {
    Atom,
    Data,
    Metadata,
    Other,
}

/// Namespace classification of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttrNs {
    /// Unprefixed. Attributes do not inherit the default namespace.
    Plain,
    Metadata,
    Xml,
    Other,
}

#[derive(Debug, Clone)]
struct Attr {
    ns: AttrNs,
    local: String,
    value: String,
}

/// An element start with its attributes already decoded and resolved.
#[derive(Debug, Clone)]
struct Elem {
    ns: Ns,
    local: String,
    attrs: Vec<Attr>,
}

impl Elem {
    fn attr(&self, ns: AttrNs, local: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.ns == ns && a.local == local)
            .map(|a| a.value.as_str())
    }

    fn plain_attr(&self, local: &str) -> Option<&str> {
        self.attr(AttrNs::Plain, local)
    }

    fn meta_attr(&self, local: &str) -> Option<&str> {
        self.attr(AttrNs::Metadata, local)
    }

    fn xml_base(&self) -> Option<&str> {
        self.attr(AttrNs::Xml, "base")
    }
}

/// One structural step through the document.
#[derive(Debug)]
enum Node {
    Start(Elem),
    Empty(Elem),
    Text(String),
    End,
    Eof,
}

/// Element data staged while the raw event borrow is still alive.
enum Staged {
    Element {
        empty: bool,
        ns: Ns,
        local: String,
        attrs: Vec<(Vec<u8>, String)>,
    },
    Text(String),
    End,
    Eof,
}

/// What an entry-level link contributed.
enum LinkOutcome {
    Edit(Url),
    SelfLink(Url),
    EditMedia { href: Url, etag: Option<String> },
    Navigation(NavLink),
    Ignored,
}

/// A pull cursor over one feed or entry document.
pub struct FeedParser<R: BufRead> {
    reader: NsReader<R>,
    options: ParseOptions,
    buf: Vec<u8>,
    stage: Stage,
    feed_base: Option<Url>,
}

impl<R: BufRead> FeedParser<R> {
    /// Creates a parser with default options.
    pub fn new(reader: R) -> Self {
        Self::with_options(reader, ParseOptions::default())
    }

    /// Creates a parser with the given options.
    pub fn with_options(reader: R, options: ParseOptions) -> Self {
        Self {
            reader: NsReader::from_reader(reader),
            options,
            buf: Vec::new(),
            stage: Stage::Start,
            feed_base: None,
        }
    }

    /// Returns the parser options.
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Pulls the next event from the document.
    ///
    /// Once `Finished` has been reported it is reported again on every
    /// further call.
    pub fn next_event(&mut self) -> AtomResult<FeedEvent> {
        match self.stage {
            Stage::Done => Ok(FeedEvent::Finished),
            Stage::Start => self.read_document_start(),
            Stage::InFeed => self.read_feed_child(),
        }
    }

    fn read_document_start(&mut self) -> AtomResult<FeedEvent> {
        loop {
            match self.next_node()? {
                Node::Start(elem) => match (elem.ns, elem.local.as_str()) {
                    (Ns::Atom, "feed") => {
                        self.feed_base = self.resolve_base(self.options.base.as_ref(), &elem)?;
                        self.stage = Stage::InFeed;
                        return Ok(FeedEvent::FeedStart);
                    }
                    (Ns::Atom, "entry") => {
                        let base = self.options.base.clone();
                        let entry = self.parse_entry(&elem, base.as_ref(), 0)?;
                        self.stage = Stage::Done;
                        return Ok(FeedEvent::Entry(entry));
                    }
                    (Ns::Metadata, "error") => return Err(self.read_service_error()?),
                    _ => {
                        return Err(AtomError::unexpected_element(format!(
                            "document root {:?}",
                            elem.local
                        )))
                    }
                },
                Node::Empty(elem) => match (elem.ns, elem.local.as_str()) {
                    (Ns::Atom, "feed") => {
                        self.stage = Stage::Done;
                        return Ok(FeedEvent::FeedStart);
                    }
                    (Ns::Atom, "entry") => return Err(AtomError::MissingIdentity),
                    (Ns::Metadata, "error") => return Err(AtomError::service(String::new())),
                    _ => {
                        return Err(AtomError::unexpected_element(format!(
                            "document root {:?}",
                            elem.local
                        )))
                    }
                },
                Node::Text(text) if text.trim().is_empty() => {}
                Node::Text(_) => {
                    return Err(AtomError::unexpected_element(
                        "text before the document root",
                    ))
                }
                Node::End => {
                    return Err(AtomError::unexpected_element(
                        "end tag before the document root",
                    ))
                }
                Node::Eof => return Err(AtomError::UnexpectedEof),
            }
        }
    }

    fn read_feed_child(&mut self) -> AtomResult<FeedEvent> {
        loop {
            match self.next_node()? {
                Node::Start(elem) => match (elem.ns, elem.local.as_str()) {
                    (Ns::Atom, "entry") => {
                        let base = self.feed_base.clone();
                        let entry = self.parse_entry(&elem, base.as_ref(), 0)?;
                        return Ok(FeedEvent::Entry(entry));
                    }
                    (Ns::Atom, "feed") => {
                        return Err(AtomError::unexpected_element("feed inside a feed"))
                    }
                    (Ns::Atom, "link") => {
                        let base = self.feed_base.clone();
                        if let Some(next) = self.feed_link(&elem, false, base.as_ref())? {
                            return Ok(FeedEvent::NextPage(next));
                        }
                    }
                    (Ns::Metadata, "count") => {
                        let text = self.read_text_to_end()?;
                        return Ok(FeedEvent::Count(parse_count(&text)?));
                    }
                    (Ns::Metadata, "error") => return Err(self.read_service_error()?),
                    (Ns::Atom, _) => self.skip_subtree()?,
                    _ => {
                        let name = elem.local;
                        trace!("skipping foreign feed child {:?}", name);
                        self.skip_subtree()?;
                        return Ok(FeedEvent::Custom(name));
                    }
                },
                Node::Empty(elem) => match (elem.ns, elem.local.as_str()) {
                    (Ns::Atom, "entry") => return Err(AtomError::MissingIdentity),
                    (Ns::Atom, "link") => {
                        let base = self.feed_base.clone();
                        if let Some(next) = self.feed_link(&elem, true, base.as_ref())? {
                            return Ok(FeedEvent::NextPage(next));
                        }
                    }
                    (Ns::Metadata, "count") => return Err(AtomError::invalid_count("")),
                    (Ns::Metadata, "error") => return Err(AtomError::service(String::new())),
                    (Ns::Atom, _) => {}
                    _ => return Ok(FeedEvent::Custom(elem.local)),
                },
                Node::Text(_) => {}
                Node::End => {
                    self.stage = Stage::Done;
                    return Ok(FeedEvent::Finished);
                }
                Node::Eof => return Err(AtomError::UnexpectedEof),
            }
        }
    }

    /// Handles a feed-level link, returning the target of a continuation link.
    fn feed_link(
        &mut self,
        elem: &Elem,
        empty: bool,
        base: Option<&Url>,
    ) -> AtomResult<Option<Url>> {
        let link_base = self.resolve_base(base, elem)?;
        let is_next = elem.plain_attr("rel") == Some(vocab::REL_NEXT);
        let href = elem.plain_attr("href").map(str::to_string);
        if !empty {
            self.skip_subtree()?;
        }
        if !is_next {
            return Ok(None);
        }
        let href = href.ok_or_else(|| AtomError::invalid_link("continuation link without href"))?;
        Ok(Some(self.resolve_href(link_base.as_ref(), &href)?))
    }

    fn parse_entry(
        &mut self,
        elem: &Elem,
        parent_base: Option<&Url>,
        depth: usize,
    ) -> AtomResult<Entry> {
        let base = self.resolve_base(parent_base, elem)?;
        let etag = elem.meta_attr("etag").map(str::to_string);

        let mut identity: Option<Url> = None;
        let mut type_name: Option<String> = None;
        let mut edit_link: Option<Url> = None;
        let mut self_link: Option<Url> = None;
        let mut media_src: Option<Url> = None;
        let mut media_type: Option<String> = None;
        let mut edit_media: Option<Url> = None;
        let mut media_etag: Option<String> = None;
        let mut content_seen = false;
        let mut properties: Vec<Property> = Vec::new();
        let mut links: Vec<NavLink> = Vec::new();

        loop {
            match self.next_node()? {
                Node::Start(child) => match (child.ns, child.local.as_str()) {
                    (Ns::Atom, "id") => {
                        let text = self.read_text_to_end()?;
                        if identity.is_none() {
                            identity = Some(parse_identity(&text)?);
                        }
                    }
                    (Ns::Atom, "category") => {
                        apply_category(&child, &self.options.type_scheme, &mut type_name);
                        self.skip_subtree()?;
                    }
                    (Ns::Atom, "link") => {
                        match self.entry_link(&child, false, base.as_ref(), depth)? {
                            LinkOutcome::Edit(url) => {
                                if edit_link.is_none() {
                                    edit_link = Some(url);
                                }
                            }
                            LinkOutcome::SelfLink(url) => {
                                if self_link.is_none() {
                                    self_link = Some(url);
                                }
                            }
                            LinkOutcome::EditMedia { href, etag } => {
                                if edit_media.is_none() {
                                    edit_media = Some(href);
                                    media_etag = etag;
                                }
                            }
                            LinkOutcome::Navigation(link) => links.push(link),
                            LinkOutcome::Ignored => {}
                        }
                    }
                    (Ns::Atom, "content") => {
                        if content_seen {
                            return Err(AtomError::DuplicateContent);
                        }
                        content_seen = true;
                        let content_base = self.resolve_base(base.as_ref(), &child)?;
                        match child.plain_attr("src") {
                            Some(src) => {
                                media_src = Some(self.resolve_href(content_base.as_ref(), src)?);
                                media_type = child.plain_attr("type").map(str::to_string);
                                self.require_empty_element()?;
                            }
                            None => self.parse_content_children(depth, &mut properties)?,
                        }
                    }
                    (Ns::Metadata, "properties") => {
                        self.parse_properties(depth, &mut properties)?;
                    }
                    _ => self.skip_subtree()?,
                },
                Node::Empty(child) => match (child.ns, child.local.as_str()) {
                    (Ns::Atom, "category") => {
                        apply_category(&child, &self.options.type_scheme, &mut type_name);
                    }
                    (Ns::Atom, "link") => {
                        match self.entry_link(&child, true, base.as_ref(), depth)? {
                            LinkOutcome::Edit(url) => {
                                if edit_link.is_none() {
                                    edit_link = Some(url);
                                }
                            }
                            LinkOutcome::SelfLink(url) => {
                                if self_link.is_none() {
                                    self_link = Some(url);
                                }
                            }
                            LinkOutcome::EditMedia { href, etag } => {
                                if edit_media.is_none() {
                                    edit_media = Some(href);
                                    media_etag = etag;
                                }
                            }
                            LinkOutcome::Navigation(link) => links.push(link),
                            LinkOutcome::Ignored => {}
                        }
                    }
                    (Ns::Atom, "content") => {
                        if content_seen {
                            return Err(AtomError::DuplicateContent);
                        }
                        content_seen = true;
                        let content_base = self.resolve_base(base.as_ref(), &child)?;
                        if let Some(src) = child.plain_attr("src") {
                            media_src = Some(self.resolve_href(content_base.as_ref(), src)?);
                            media_type = child.plain_attr("type").map(str::to_string);
                        }
                    }
                    _ => {}
                },
                Node::Text(_) => {}
                Node::End => {
                    let identity = identity.ok_or(AtomError::MissingIdentity)?;
                    if !content_seen {
                        return Err(AtomError::MissingContent);
                    }
                    let media = if media_src.is_some()
                        || edit_media.is_some()
                        || media_etag.is_some()
                    {
                        Some(MediaInfo {
                            src: media_src,
                            content_type: media_type,
                            edit_media,
                            etag: media_etag,
                        })
                    } else {
                        None
                    };
                    return Ok(Entry {
                        identity,
                        etag,
                        type_name,
                        edit_link,
                        self_link,
                        media,
                        properties,
                        links,
                    });
                }
                Node::Eof => return Err(AtomError::UnexpectedEof),
            }
        }
    }

    fn entry_link(
        &mut self,
        elem: &Elem,
        empty: bool,
        base: Option<&Url>,
        depth: usize,
    ) -> AtomResult<LinkOutcome> {
        let link_base = self.resolve_base(base, elem)?;
        let rel = match elem.plain_attr("rel") {
            Some(rel) => rel.to_string(),
            None => {
                if !empty {
                    self.skip_subtree()?;
                }
                return Ok(LinkOutcome::Ignored);
            }
        };

        if let Some(name) = rel.strip_prefix(self.options.nav_rel_prefix.as_str()) {
            let name = name.to_string();
            let link_type = elem.plain_attr("type").map(str::to_string);
            let href = match elem.plain_attr("href") {
                Some(href) => Some(self.resolve_href(link_base.as_ref(), href)?),
                None => None,
            };
            let content = if empty {
                None
            } else {
                self.parse_link_children(link_base.as_ref(), link_type.as_deref(), depth)?
            };
            return Ok(LinkOutcome::Navigation(NavLink {
                name,
                href,
                content,
            }));
        }

        let outcome = match rel.as_str() {
            vocab::REL_EDIT => {
                LinkOutcome::Edit(self.required_href(elem, link_base.as_ref(), &rel)?)
            }
            vocab::REL_SELF => {
                LinkOutcome::SelfLink(self.required_href(elem, link_base.as_ref(), &rel)?)
            }
            vocab::REL_EDIT_MEDIA => LinkOutcome::EditMedia {
                href: self.required_href(elem, link_base.as_ref(), &rel)?,
                etag: elem.meta_attr("etag").map(str::to_string),
            },
            _ => LinkOutcome::Ignored,
        };
        if !empty {
            self.skip_subtree()?;
        }
        Ok(outcome)
    }

    /// Reads the children of a navigation link, looking for an inline expansion.
    fn parse_link_children(
        &mut self,
        base: Option<&Url>,
        link_type: Option<&str>,
        depth: usize,
    ) -> AtomResult<Option<NavContent>> {
        let mut content: Option<NavContent> = None;
        loop {
            match self.next_node()? {
                Node::Start(child) => {
                    if child.ns == Ns::Metadata && child.local == "inline" {
                        let inline_base = self.resolve_base(base, &child)?;
                        let parsed =
                            self.parse_inline(inline_base.as_ref(), link_type, depth)?;
                        if content.is_none() {
                            content = Some(parsed);
                        }
                    } else {
                        self.skip_subtree()?;
                    }
                }
                Node::Empty(child) => {
                    if child.ns == Ns::Metadata && child.local == "inline" && content.is_none() {
                        content = Some(empty_inline(link_type));
                    }
                }
                Node::Text(_) => {}
                Node::End => return Ok(content),
                Node::Eof => return Err(AtomError::UnexpectedEof),
            }
        }
    }

    /// Reads the children of an `inline` element: one feed, one entry, or nothing.
    fn parse_inline(
        &mut self,
        base: Option<&Url>,
        link_type: Option<&str>,
        depth: usize,
    ) -> AtomResult<NavContent> {
        let depth = self.deepen(depth)?;
        let mut content: Option<NavContent> = None;
        loop {
            match self.next_node()? {
                Node::Start(child) => match (child.ns, child.local.as_str()) {
                    (Ns::Atom, "feed") => {
                        let feed = self.parse_inline_feed(&child, base, depth)?;
                        if content.is_none() {
                            content = Some(NavContent::Feed(feed));
                        }
                    }
                    (Ns::Atom, "entry") => {
                        let entry = self.parse_entry(&child, base, depth)?;
                        if content.is_none() {
                            content = Some(NavContent::Entry(Some(Box::new(entry))));
                        }
                    }
                    _ => self.skip_subtree()?,
                },
                Node::Empty(child) => match (child.ns, child.local.as_str()) {
                    (Ns::Atom, "feed") => {
                        if content.is_none() {
                            content = Some(NavContent::Feed(InlineFeed::default()));
                        }
                    }
                    (Ns::Atom, "entry") => return Err(AtomError::MissingIdentity),
                    _ => {}
                },
                Node::Text(_) => {}
                Node::End => return Ok(content.unwrap_or_else(|| empty_inline(link_type))),
                Node::Eof => return Err(AtomError::UnexpectedEof),
            }
        }
    }

    /// Materializes a feed nested inside a navigation link.
    fn parse_inline_feed(
        &mut self,
        elem: &Elem,
        parent_base: Option<&Url>,
        depth: usize,
    ) -> AtomResult<InlineFeed> {
        let base = self.resolve_base(parent_base, elem)?;
        let mut feed = InlineFeed::default();
        loop {
            match self.next_node()? {
                Node::Start(child) => match (child.ns, child.local.as_str()) {
                    (Ns::Atom, "entry") => {
                        let entry = self.parse_entry(&child, base.as_ref(), depth)?;
                        feed.entries.push(entry);
                    }
                    (Ns::Atom, "feed") => {
                        return Err(AtomError::unexpected_element("feed inside an inline feed"))
                    }
                    (Ns::Atom, "link") => {
                        if let Some(next) = self.feed_link(&child, false, base.as_ref())? {
                            if feed.next.is_none() {
                                feed.next = Some(next);
                            }
                        }
                    }
                    (Ns::Metadata, "count") => {
                        let text = self.read_text_to_end()?;
                        if feed.count.is_none() {
                            feed.count = Some(parse_count(&text)?);
                        }
                    }
                    (Ns::Metadata, "error") => return Err(self.read_service_error()?),
                    _ => self.skip_subtree()?,
                },
                Node::Empty(child) => match (child.ns, child.local.as_str()) {
                    (Ns::Atom, "entry") => return Err(AtomError::MissingIdentity),
                    (Ns::Atom, "link") => {
                        if let Some(next) = self.feed_link(&child, true, base.as_ref())? {
                            if feed.next.is_none() {
                                feed.next = Some(next);
                            }
                        }
                    }
                    _ => {}
                },
                Node::Text(_) => {}
                Node::End => return Ok(feed),
                Node::Eof => return Err(AtomError::UnexpectedEof),
            }
        }
    }

    /// Reads the children of an inline `content` element.
    fn parse_content_children(
        &mut self,
        depth: usize,
        out: &mut Vec<Property>,
    ) -> AtomResult<()> {
        loop {
            match self.next_node()? {
                Node::Start(child) => {
                    if child.ns == Ns::Metadata && child.local == "properties" {
                        self.parse_properties(depth, out)?;
                    } else {
                        self.skip_subtree()?;
                    }
                }
                Node::Empty(_) | Node::Text(_) => {}
                Node::End => return Ok(()),
                Node::Eof => return Err(AtomError::UnexpectedEof),
            }
        }
    }

    /// Reads the children of a `properties` container.
    fn parse_properties(&mut self, depth: usize, out: &mut Vec<Property>) -> AtomResult<()> {
        loop {
            match self.next_node()? {
                Node::Start(child) => {
                    let property = self.parse_property(&child, false, depth)?;
                    out.push(property);
                }
                Node::Empty(child) => {
                    let property = self.parse_property(&child, true, depth)?;
                    out.push(property);
                }
                Node::Text(_) => {}
                Node::End => return Ok(()),
                Node::Eof => return Err(AtomError::UnexpectedEof),
            }
        }
    }

    fn parse_property(&mut self, elem: &Elem, empty: bool, depth: usize) -> AtomResult<Property> {
        let name = elem.local.clone();
        let type_name = elem.meta_attr("type").map(str::to_string);
        let is_null = elem
            .meta_attr("null")
            .is_some_and(|v| matches!(v.trim(), "true" | "1"));

        if empty {
            let value = if is_null {
                PropertyValue::Null
            } else {
                PropertyValue::Text(String::new())
            };
            return Ok(Property {
                name,
                type_name,
                value,
            });
        }

        let mut text = String::new();
        let mut children: Vec<Property> = Vec::new();
        loop {
            match self.next_node()? {
                Node::Text(t) => text.push_str(&t),
                Node::Start(child) => {
                    let child_depth = self.deepen(depth)?;
                    children.push(self.parse_property(&child, false, child_depth)?);
                }
                Node::Empty(child) => {
                    let child_depth = self.deepen(depth)?;
                    children.push(self.parse_property(&child, true, child_depth)?);
                }
                Node::End => break,
                Node::Eof => return Err(AtomError::UnexpectedEof),
            }
        }

        // The null flag wins over any content the element carries.
        let value = if is_null {
            PropertyValue::Null
        } else if !children.is_empty() {
            PropertyValue::Complex(children)
        } else {
            PropertyValue::Text(text)
        };
        Ok(Property {
            name,
            type_name,
            value,
        })
    }

    /// Extracts the message from an in-band error document.
    fn read_service_error(&mut self) -> AtomResult<AtomError> {
        debug!("error document in payload");
        let mut message = String::new();
        loop {
            match self.next_node()? {
                Node::Start(child) => {
                    if child.local == "message" && message.is_empty() {
                        message = self.read_text_to_end()?;
                    } else {
                        self.skip_subtree()?;
                    }
                }
                Node::Empty(_) | Node::Text(_) => {}
                Node::End => break,
                Node::Eof => return Err(AtomError::UnexpectedEof),
            }
        }
        Ok(AtomError::service(message))
    }

    /// Accumulates the text content of the current element up to its end tag.
    ///
    /// Child markup inside a text slot is skipped.
    fn read_text_to_end(&mut self) -> AtomResult<String> {
        let mut out = String::new();
        loop {
            match self.next_node()? {
                Node::Text(text) => out.push_str(&text),
                Node::Start(_) => self.skip_subtree()?,
                Node::Empty(_) => {}
                Node::End => return Ok(out),
                Node::Eof => return Err(AtomError::UnexpectedEof),
            }
        }
    }

    /// Requires that the current element holds nothing but whitespace.
    fn require_empty_element(&mut self) -> AtomResult<()> {
        loop {
            match self.next_node()? {
                Node::Text(text) if text.trim().is_empty() => {}
                Node::End => return Ok(()),
                Node::Eof => return Err(AtomError::UnexpectedEof),
                _ => return Err(AtomError::MediaContentNotEmpty),
            }
        }
    }

    /// Skips the rest of the current element, children included.
    fn skip_subtree(&mut self) -> AtomResult<()> {
        let mut open = 1usize;
        while open > 0 {
            match self.next_node()? {
                Node::Start(_) => open += 1,
                Node::End => open -= 1,
                Node::Eof => return Err(AtomError::UnexpectedEof),
                Node::Empty(_) | Node::Text(_) => {}
            }
        }
        Ok(())
    }

    fn deepen(&self, depth: usize) -> AtomResult<usize> {
        let next = depth + 1;
        if next > self.options.max_depth {
            return Err(AtomError::ExpansionTooDeep {
                limit: self.options.max_depth,
            });
        }
        Ok(next)
    }

    /// Applies an element's `xml:base` to the inherited base.
    fn resolve_base(&self, parent: Option<&Url>, elem: &Elem) -> AtomResult<Option<Url>> {
        let attr = match elem.xml_base() {
            Some(attr) => attr,
            None => return Ok(parent.cloned()),
        };
        let joined = match parent {
            Some(base) => base.join(attr),
            None => Url::parse(attr),
        };
        joined
            .map(Some)
            .map_err(|_| AtomError::invalid_link(format!("cannot resolve xml:base {attr:?}")))
    }

    fn resolve_href(&self, base: Option<&Url>, href: &str) -> AtomResult<Url> {
        match base {
            Some(base) => base
                .join(href)
                .map_err(|_| AtomError::invalid_link(format!("cannot resolve address {href:?}"))),
            None => Url::parse(href).map_err(|_| {
                AtomError::invalid_link(format!("relative address {href:?} with no base"))
            }),
        }
    }

    fn required_href(&self, elem: &Elem, base: Option<&Url>, rel: &str) -> AtomResult<Url> {
        match elem.plain_attr("href") {
            Some(href) => self.resolve_href(base, href),
            None => Err(AtomError::invalid_link(format!("{rel} link without href"))),
        }
    }

    /// Reads the next structural node, resolving namespaces and attributes.
    fn next_node(&mut self) -> AtomResult<Node> {
        loop {
            self.buf.clear();
            let (resolve, event) = self.reader.read_resolved_event_into(&mut self.buf)?;
            let staged = match event {
                Event::Start(e) => Staged::Element {
                    empty: false,
                    ns: classify(&resolve),
                    local: local_name(e.name())?,
                    attrs: raw_attrs(&e)?,
                },
                Event::Empty(e) => Staged::Element {
                    empty: true,
                    ns: classify(&resolve),
                    local: local_name(e.name())?,
                    attrs: raw_attrs(&e)?,
                },
                Event::End(_) => Staged::End,
                Event::Text(t) => Staged::Text(t.unescape()?.into_owned()),
                Event::CData(t) => {
                    let bytes = t.into_inner();
                    Staged::Text(utf8_text(&bytes)?.to_string())
                }
                Event::Eof => Staged::Eof,
                _ => continue,
            };
            return Ok(match staged {
                Staged::Element {
                    empty,
                    ns,
                    local,
                    attrs,
                } => {
                    let attrs = self.resolve_attrs(attrs)?;
                    let elem = Elem { ns, local, attrs };
                    if empty {
                        Node::Empty(elem)
                    } else {
                        Node::Start(elem)
                    }
                }
                Staged::Text(text) => Node::Text(text),
                Staged::End => Node::End,
                Staged::Eof => Node::Eof,
            });
        }
    }

    /// Resolves attribute namespaces against the reader's in-scope bindings.
    fn resolve_attrs(&self, raw: Vec<(Vec<u8>, String)>) -> AtomResult<Vec<Attr>> {
        let mut out = Vec::with_capacity(raw.len());
        for (key, value) in raw {
            if key.as_slice() == b"xmlns" || key.starts_with(b"xmlns:") {
                continue;
            }
            let (resolve, local) = self.reader.resolve_attribute(QName(&key));
            let ns = match resolve {
                ResolveResult::Bound(ns) if ns.into_inner() == vocab::METADATA_NS.as_bytes() => {
                    AttrNs::Metadata
                }
                ResolveResult::Bound(ns) if ns.into_inner() == vocab::XML_NS.as_bytes() => {
                    AttrNs::Xml
                }
                ResolveResult::Unbound => AttrNs::Plain,
                _ => AttrNs::Other,
            };
            out.push(Attr {
                ns,
                local: utf8_text(local.into_inner())?.to_string(),
                value,
            });
        }
        Ok(out)
    }
}

/// Records the scheme-matched category term as the entry type name.
fn apply_category(elem: &Elem, scheme: &str, type_name: &mut Option<String>) {
    if type_name.is_some() {
        return;
    }
    if elem.plain_attr("scheme") == Some(scheme) {
        *type_name = elem.plain_attr("term").map(str::to_string);
    }
}

/// Shape of an expansion whose `inline` element is empty.
fn empty_inline(link_type: Option<&str>) -> NavContent {
    let is_feed = link_type.is_some_and(|t| t.to_ascii_lowercase().contains("feed"));
    if is_feed {
        NavContent::Feed(InlineFeed::default())
    } else {
        NavContent::Entry(None)
    }
}

fn parse_identity(text: &str) -> AtomResult<Url> {
    let trimmed = text.trim();
    Url::parse(trimmed).map_err(|_| AtomError::invalid_identity(trimmed))
}

fn parse_count(text: &str) -> AtomResult<i64> {
    let trimmed = text.trim();
    trimmed
        .parse::<i64>()
        .map_err(|_| AtomError::invalid_count(trimmed))
}

fn classify(resolve: &ResolveResult<'_>) -> Ns {
    let bound = match resolve {
        ResolveResult::Bound(ns) => ns.into_inner(),
        _ => return Ns::Other,
    };
    if bound == vocab::ATOM_NS.as_bytes() {
        Ns::Atom
    } else if bound == vocab::DATA_NS.as_bytes() {
        Ns::Data
    } else if bound == vocab::METADATA_NS.as_bytes() {
        Ns::Metadata
    } else {
        Ns::Other
    }
}

fn local_name(name: QName<'_>) -> AtomResult<String> {
    utf8_text(name.local_name().into_inner()).map(str::to_owned)
}

fn raw_attrs(start: &BytesStart<'_>) -> AtomResult<Vec<(Vec<u8>, String)>> {
    let mut out = Vec::new();
    for attr in start.attributes() {
        let attr = attr?;
        let value = attr.unescape_value()?.into_owned();
        out.push((attr.key.into_inner().to_vec(), value));
    }
    Ok(out)
}

fn utf8_text(bytes: &[u8]) -> AtomResult<&str> {
    std::str::from_utf8(bytes).map_err(|_| AtomError::invalid_text("text is not valid UTF-8"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED_NS: &str = concat!(
        "xmlns=\"http://www.w3.org/2005/Atom\" ",
        "xmlns:d=\"http://schemas.microsoft.com/ado/2007/08/dataservices\" ",
        "xmlns:m=\"http://schemas.microsoft.com/ado/2007/08/dataservices/metadata\"",
    );

    fn parser(xml: &str) -> FeedParser<&[u8]> {
        FeedParser::new(xml.as_bytes())
    }

    fn all_events(xml: &str) -> Vec<FeedEvent> {
        let mut parser = parser(xml);
        let mut events = Vec::new();
        loop {
            let event = parser.next_event().unwrap();
            let done = event == FeedEvent::Finished;
            events.push(event);
            if done {
                return events;
            }
        }
    }

    fn one_entry(xml: &str) -> Entry {
        let mut parser = parser(xml);
        match parser.next_event().unwrap() {
            FeedEvent::Entry(entry) => entry,
            other => panic!("expected an entry, got {other:?}"),
        }
    }

    fn customer_entry(id: u32, name: &str) -> String {
        format!(
            "<entry>\
             <id>http://host/svc/Customers({id})</id>\
             <category term=\"Model.Customer\" \
              scheme=\"http://schemas.microsoft.com/ado/2007/08/dataservices/scheme\"/>\
             <link rel=\"edit\" href=\"http://host/svc/Customers({id})\"/>\
             <content type=\"application/xml\">\
             <m:properties><d:Name>{name}</d:Name></m:properties>\
             </content>\
             </entry>"
        )
    }

    #[test]
    fn feed_events_arrive_in_document_order() {
        let xml = format!(
            "<feed {FEED_NS}>\
             <title>Customers</title>\
             <m:count>42</m:count>\
             {}{}{}\
             <link rel=\"next\" href=\"http://host/svc/Customers?$skiptoken=3\"/>\
             </feed>",
            customer_entry(1, "Alfred"),
            customer_entry(2, "Berta"),
            customer_entry(3, "Carla"),
        );

        let events = all_events(&xml);
        assert_eq!(events.len(), 7);
        assert_eq!(events[0], FeedEvent::FeedStart);
        assert_eq!(events[1], FeedEvent::Count(42));
        for (i, event) in events[2..5].iter().enumerate() {
            match event {
                FeedEvent::Entry(entry) => {
                    assert_eq!(
                        entry.identity.as_str(),
                        format!("http://host/svc/Customers({})", i + 1)
                    );
                    assert_eq!(entry.type_name.as_deref(), Some("Model.Customer"));
                }
                other => panic!("expected an entry, got {other:?}"),
            }
        }
        assert_eq!(
            events[5],
            FeedEvent::NextPage(Url::parse("http://host/svc/Customers?$skiptoken=3").unwrap())
        );
        assert_eq!(events[6], FeedEvent::Finished);
    }

    #[test]
    fn finished_is_sticky() {
        let xml = format!("<feed {FEED_NS}></feed>");
        let mut parser = parser(&xml);
        assert_eq!(parser.next_event().unwrap(), FeedEvent::FeedStart);
        assert_eq!(parser.next_event().unwrap(), FeedEvent::Finished);
        assert_eq!(parser.next_event().unwrap(), FeedEvent::Finished);
        assert_eq!(parser.next_event().unwrap(), FeedEvent::Finished);
    }

    #[test]
    fn bare_entry_document() {
        let xml = format!(
            "<entry {FEED_NS}>\
             <id>http://host/svc/Customers(7)</id>\
             <content type=\"application/xml\">\
             <m:properties>\
             <d:Name>Greta</d:Name>\
             <d:Age m:type=\"Edm.Int32\">34</d:Age>\
             </m:properties>\
             </content>\
             </entry>"
        );

        let mut parser = parser(&xml);
        let entry = match parser.next_event().unwrap() {
            FeedEvent::Entry(entry) => entry,
            other => panic!("expected an entry, got {other:?}"),
        };
        assert_eq!(entry.identity.as_str(), "http://host/svc/Customers(7)");
        assert_eq!(
            entry.property("Name").and_then(|p| p.value.as_text()),
            Some("Greta")
        );
        assert_eq!(
            entry.property("Age").and_then(|p| p.type_name.as_deref()),
            Some("Edm.Int32")
        );
        assert_eq!(parser.next_event().unwrap(), FeedEvent::Finished);
        assert_eq!(parser.next_event().unwrap(), FeedEvent::Finished);
    }

    #[test]
    fn property_shapes() {
        let xml = format!(
            "<entry {FEED_NS}>\
             <id>http://host/svc/Customers(1)</id>\
             <content type=\"application/xml\"><m:properties>\
             <d:Name> spaced </d:Name>\
             <d:Nick m:null=\"true\">ignored</d:Nick>\
             <d:Empty/>\
             <d:Address m:type=\"Model.Address\">\
             <d:City>Pisa</d:City>\
             <d:Zip m:null=\"true\"/>\
             </d:Address>\
             </m:properties></content>\
             </entry>"
        );

        let entry = one_entry(&xml);
        assert_eq!(
            entry.property("Name").and_then(|p| p.value.as_text()),
            Some(" spaced ")
        );
        assert!(entry.property("Nick").is_some_and(|p| p.value.is_null()));
        assert_eq!(
            entry.property("Empty").and_then(|p| p.value.as_text()),
            Some("")
        );

        let address = entry.property("Address").unwrap();
        assert_eq!(address.type_name.as_deref(), Some("Model.Address"));
        match &address.value {
            PropertyValue::Complex(fields) => {
                assert_eq!(fields.len(), 2);
                assert_eq!(fields[0].name, "City");
                assert_eq!(fields[0].value.as_text(), Some("Pisa"));
                assert!(fields[1].value.is_null());
            }
            other => panic!("expected a complex value, got {other:?}"),
        }
    }

    #[test]
    fn cdata_and_entities_accumulate() {
        let xml = format!(
            "<entry {FEED_NS}>\
             <id>http://host/svc/Notes(1)</id>\
             <content type=\"application/xml\"><m:properties>\
             <d:Body>a &amp; b<![CDATA[ <raw> ]]>c</d:Body>\
             </m:properties></content>\
             </entry>"
        );

        let entry = one_entry(&xml);
        assert_eq!(
            entry.property("Body").and_then(|p| p.value.as_text()),
            Some("a & b <raw> c")
        );
    }

    #[test]
    fn media_link_entry() {
        let xml = format!(
            "<entry {FEED_NS} m:etag=\"W/&quot;1&quot;\">\
             <id>http://host/svc/Photos(1)</id>\
             <link rel=\"edit-media\" href=\"http://host/svc/Photos(1)/$value\" \
              m:etag=\"media-tag\"/>\
             <content type=\"image/png\" src=\"http://host/media/1.png\"/>\
             <m:properties><d:Caption>Sunrise</d:Caption></m:properties>\
             </entry>"
        );

        let entry = one_entry(&xml);
        assert!(entry.is_media_link());
        assert_eq!(entry.etag.as_deref(), Some("W/\"1\""));
        let media = entry.media.as_ref().unwrap();
        assert_eq!(
            media.src.as_ref().map(Url::as_str),
            Some("http://host/media/1.png")
        );
        assert_eq!(media.content_type.as_deref(), Some("image/png"));
        assert_eq!(media.etag.as_deref(), Some("media-tag"));
        assert_eq!(
            media.edit_media.as_ref().map(Url::as_str),
            Some("http://host/svc/Photos(1)/$value")
        );
        assert_eq!(
            entry.property("Caption").and_then(|p| p.value.as_text()),
            Some("Sunrise")
        );
    }

    #[test]
    fn media_content_must_be_empty() {
        let xml = format!(
            "<entry {FEED_NS}>\
             <id>http://host/svc/Photos(1)</id>\
             <content src=\"http://host/media/1.png\">stray</content>\
             </entry>"
        );

        let mut parser = parser(&xml);
        assert!(matches!(
            parser.next_event(),
            Err(AtomError::MediaContentNotEmpty)
        ));
    }

    #[test]
    fn expanded_entry_link() {
        let xml = format!(
            "<entry {FEED_NS}>\
             <id>http://host/svc/Orders(1)</id>\
             <link rel=\"http://schemas.microsoft.com/ado/2007/08/dataservices/related/Customer\" \
              href=\"http://host/svc/Orders(1)/Customer\">\
             <m:inline>\
             <entry>\
             <id>http://host/svc/Customers(9)</id>\
             <content type=\"application/xml\">\
             <m:properties><d:Name>Ines</d:Name></m:properties>\
             </content>\
             </entry>\
             </m:inline>\
             </link>\
             <content type=\"application/xml\"><m:properties/></content>\
             </entry>"
        );

        let entry = one_entry(&xml);
        let link = entry.link("Customer").unwrap();
        assert_eq!(
            link.href.as_ref().map(Url::as_str),
            Some("http://host/svc/Orders(1)/Customer")
        );
        match link.content.as_ref().unwrap() {
            NavContent::Entry(Some(customer)) => {
                assert_eq!(customer.identity.as_str(), "http://host/svc/Customers(9)");
            }
            other => panic!("expected an inline entry, got {other:?}"),
        }
    }

    #[test]
    fn expanded_feed_link_with_count_and_next() {
        let xml = format!(
            "<entry {FEED_NS}>\
             <id>http://host/svc/Customers(1)</id>\
             <link rel=\"http://schemas.microsoft.com/ado/2007/08/dataservices/related/Orders\" \
              type=\"application/atom+xml;type=feed\" \
              href=\"http://host/svc/Customers(1)/Orders\">\
             <m:inline>\
             <feed>\
             <m:count>12</m:count>\
             <entry><id>http://host/svc/Orders(5)</id>\
             <content type=\"application/xml\">\
             <m:properties><d:Total>10.5</d:Total></m:properties>\
             </content></entry>\
             <link rel=\"next\" href=\"http://host/svc/Customers(1)/Orders?page=2\"/>\
             </feed>\
             </m:inline>\
             </link>\
             <content type=\"application/xml\"><m:properties/></content>\
             </entry>"
        );

        let entry = one_entry(&xml);
        let link = entry.link("Orders").unwrap();
        match link.content.as_ref().unwrap() {
            NavContent::Feed(feed) => {
                assert_eq!(feed.count, Some(12));
                assert_eq!(feed.entries.len(), 1);
                assert_eq!(
                    feed.next.as_ref().map(Url::as_str),
                    Some("http://host/svc/Customers(1)/Orders?page=2")
                );
            }
            other => panic!("expected an inline feed, got {other:?}"),
        }
    }

    #[test]
    fn empty_inline_shape_follows_link_type() {
        let xml = format!(
            "<entry {FEED_NS}>\
             <id>http://host/svc/Orders(1)</id>\
             <link rel=\"http://schemas.microsoft.com/ado/2007/08/dataservices/related/Customer\" \
              type=\"application/atom+xml;type=entry\" \
              href=\"Customer\"><m:inline/></link>\
             <link rel=\"http://schemas.microsoft.com/ado/2007/08/dataservices/related/Items\" \
              type=\"application/atom+xml;type=feed\" \
              href=\"Items\"><m:inline></m:inline></link>\
             <content type=\"application/xml\"><m:properties/></content>\
             </entry>"
        );

        let mut parser = FeedParser::with_options(
            xml.as_bytes(),
            ParseOptions::new().base(Url::parse("http://host/svc/Orders(1)/").unwrap()),
        );
        let entry = match parser.next_event().unwrap() {
            FeedEvent::Entry(entry) => entry,
            other => panic!("expected an entry, got {other:?}"),
        };

        match entry.link("Customer").unwrap().content.as_ref().unwrap() {
            NavContent::Entry(None) => {}
            other => panic!("expected a null reference, got {other:?}"),
        }
        match entry.link("Items").unwrap().content.as_ref().unwrap() {
            NavContent::Feed(feed) => assert!(feed.entries.is_empty()),
            other => panic!("expected an empty collection, got {other:?}"),
        }
    }

    #[test]
    fn deferred_link_has_no_content() {
        let xml = format!(
            "<entry {FEED_NS}>\
             <id>http://host/svc/Orders(1)</id>\
             <link rel=\"http://schemas.microsoft.com/ado/2007/08/dataservices/related/Customer\" \
              href=\"http://host/svc/Orders(1)/Customer\"/>\
             <content type=\"application/xml\"><m:properties/></content>\
             </entry>"
        );

        let entry = one_entry(&xml);
        let link = entry.link("Customer").unwrap();
        assert!(!link.is_expanded());
    }

    #[test]
    fn missing_id_is_fatal() {
        let xml = format!(
            "<entry {FEED_NS}>\
             <content type=\"application/xml\"><m:properties/></content>\
             </entry>"
        );
        let mut parser = parser(&xml);
        assert!(matches!(
            parser.next_event(),
            Err(AtomError::MissingIdentity)
        ));
    }

    #[test]
    fn relative_id_is_fatal() {
        let xml = format!(
            "<entry {FEED_NS}>\
             <id>Customers(1)</id>\
             <content type=\"application/xml\"><m:properties/></content>\
             </entry>"
        );
        let mut parser = parser(&xml);
        assert!(matches!(
            parser.next_event(),
            Err(AtomError::InvalidIdentity { value }) if value == "Customers(1)"
        ));
    }

    #[test]
    fn first_id_wins() {
        let xml = format!(
            "<entry {FEED_NS}>\
             <id>http://host/svc/Customers(1)</id>\
             <id>http://host/svc/Customers(2)</id>\
             <content type=\"application/xml\"><m:properties/></content>\
             </entry>"
        );
        let entry = one_entry(&xml);
        assert_eq!(entry.identity.as_str(), "http://host/svc/Customers(1)");
    }

    #[test]
    fn duplicate_content_is_rejected() {
        let xml = format!(
            "<entry {FEED_NS}>\
             <id>http://host/svc/Customers(1)</id>\
             <content type=\"application/xml\"/>\
             <content type=\"application/xml\"/>\
             </entry>"
        );
        let mut parser = parser(&xml);
        assert!(matches!(
            parser.next_event(),
            Err(AtomError::DuplicateContent)
        ));
    }

    #[test]
    fn missing_content_is_rejected() {
        let xml = format!(
            "<entry {FEED_NS}>\
             <id>http://host/svc/Customers(1)</id>\
             </entry>"
        );
        let mut parser = parser(&xml);
        assert!(matches!(parser.next_event(), Err(AtomError::MissingContent)));
    }

    #[test]
    fn service_error_document() {
        let xml = format!(
            "<m:error {FEED_NS}>\
             <m:code/>\
             <m:message xml:lang=\"en-US\">Resource not found for the segment.</m:message>\
             </m:error>"
        );
        let mut parser = parser(&xml);
        match parser.next_event() {
            Err(AtomError::ServiceError { message }) => {
                assert_eq!(message, "Resource not found for the segment.");
            }
            other => panic!("expected a service error, got {other:?}"),
        }
    }

    #[test]
    fn error_document_inside_feed() {
        let xml = format!(
            "<feed {FEED_NS}>\
             <m:error><m:message>midstream failure</m:message></m:error>\
             </feed>"
        );
        let mut parser = parser(&xml);
        assert_eq!(parser.next_event().unwrap(), FeedEvent::FeedStart);
        assert!(matches!(
            parser.next_event(),
            Err(AtomError::ServiceError { message }) if message == "midstream failure"
        ));
    }

    #[test]
    fn foreign_feed_child_reports_custom() {
        let xml = format!(
            "<feed {FEED_NS} xmlns:x=\"http://example.org/custom\">\
             <x:banner><x:ignored/></x:banner>\
             </feed>"
        );
        let events = all_events(&xml);
        assert_eq!(
            events,
            vec![
                FeedEvent::FeedStart,
                FeedEvent::Custom("banner".to_string()),
                FeedEvent::Finished,
            ]
        );
    }

    #[test]
    fn depth_limit_stops_runaway_expansion() {
        let xml = format!(
            "<entry {FEED_NS}>\
             <id>http://host/svc/A(1)</id>\
             <link rel=\"http://schemas.microsoft.com/ado/2007/08/dataservices/related/B\" \
              href=\"http://host/svc/A(1)/B\">\
             <m:inline><entry>\
             <id>http://host/svc/B(1)</id>\
             <link rel=\"http://schemas.microsoft.com/ado/2007/08/dataservices/related/C\" \
              href=\"http://host/svc/B(1)/C\">\
             <m:inline><entry>\
             <id>http://host/svc/C(1)</id>\
             <content type=\"application/xml\"><m:properties/></content>\
             </entry></m:inline></link>\
             <content type=\"application/xml\"><m:properties/></content>\
             </entry></m:inline></link>\
             <content type=\"application/xml\"><m:properties/></content>\
             </entry>"
        );

        let mut parser = FeedParser::with_options(
            xml.as_bytes(),
            ParseOptions::new().max_depth(1),
        );
        assert!(matches!(
            parser.next_event(),
            Err(AtomError::ExpansionTooDeep { limit: 1 })
        ));

        let mut parser = FeedParser::with_options(
            xml.as_bytes(),
            ParseOptions::new().max_depth(2),
        );
        assert!(matches!(parser.next_event(), Ok(FeedEvent::Entry(_))));
    }

    #[test]
    fn xml_base_resolves_relative_addresses() {
        let xml = format!(
            "<feed {FEED_NS} xml:base=\"http://host/svc/\">\
             <entry xml:base=\"Customers(1)/\">\
             <id>http://host/svc/Customers(1)</id>\
             <link rel=\"edit\" href=\"edit-me\"/>\
             <content type=\"application/xml\"><m:properties/></content>\
             </entry>\
             <link rel=\"next\" href=\"Customers?page=2\"/>\
             </feed>"
        );

        let events = all_events(&xml);
        match &events[1] {
            FeedEvent::Entry(entry) => {
                assert_eq!(
                    entry.edit_link.as_ref().map(Url::as_str),
                    Some("http://host/svc/Customers(1)/edit-me")
                );
            }
            other => panic!("expected an entry, got {other:?}"),
        }
        assert_eq!(
            events[2],
            FeedEvent::NextPage(Url::parse("http://host/svc/Customers?page=2").unwrap())
        );
    }

    #[test]
    fn relative_next_link_without_base_is_rejected() {
        let xml = format!(
            "<feed {FEED_NS}>\
             <link rel=\"next\" href=\"Customers?page=2\"/>\
             </feed>"
        );
        let mut parser = parser(&xml);
        assert_eq!(parser.next_event().unwrap(), FeedEvent::FeedStart);
        assert!(matches!(
            parser.next_event(),
            Err(AtomError::InvalidLink { .. })
        ));
    }

    #[test]
    fn truncated_feed_is_an_error() {
        let xml = format!("<feed {FEED_NS}><title>cut off</title>");
        let mut parser = parser(&xml);
        assert_eq!(parser.next_event().unwrap(), FeedEvent::FeedStart);
        assert!(matches!(parser.next_event(), Err(AtomError::UnexpectedEof)));
    }

    #[test]
    fn count_must_be_a_whole_number() {
        let xml = format!("<feed {FEED_NS}><m:count>many</m:count></feed>");
        let mut parser = parser(&xml);
        assert_eq!(parser.next_event().unwrap(), FeedEvent::FeedStart);
        assert!(matches!(
            parser.next_event(),
            Err(AtomError::InvalidCount { value }) if value == "many"
        ));
    }

    #[test]
    fn unexpected_root_is_rejected() {
        let xml = "<unrelated xmlns=\"http://example.org/\"/>";
        let mut parser = parser(xml);
        assert!(matches!(
            parser.next_event(),
            Err(AtomError::UnexpectedElement { .. })
        ));
    }

    mod properties {
        use proptest::prelude::*;

        use super::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(64))]

            #[test]
            fn escaped_property_text_round_trips(value in "[ -~]{0,48}") {
                let escaped = quick_xml::escape::escape(value.as_str());
                let xml = format!(
                    "<entry {FEED_NS}>\
                     <id>http://host/svc/Notes(1)</id>\
                     <content type=\"application/xml\"><m:properties>\
                     <d:Body>{escaped}</d:Body>\
                     </m:properties></content>\
                     </entry>"
                );

                let entry = one_entry(&xml);
                let body = entry.property("Body").and_then(|p| p.value.as_text());
                prop_assert_eq!(body, Some(value.as_str()));
            }
        }
    }
}

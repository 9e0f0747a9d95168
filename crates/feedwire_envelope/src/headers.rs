//! Ordered, case-insensitive header collection.

use crate::error::{EnvelopeError, EnvelopeResult};

/// Header name for the payload media type.
pub const CONTENT_TYPE: &str = "Content-Type";
/// Header name for the payload length in bytes.
pub const CONTENT_LENGTH: &str = "Content-Length";
/// Header name for the part transfer encoding.
pub const CONTENT_TRANSFER_ENCODING: &str = "Content-Transfer-Encoding";
/// Header name correlating change requests with change responses.
pub const CONTENT_ID: &str = "Content-ID";

/// Media type of a wrapped HTTP message part.
pub const MIME_APPLICATION_HTTP: &str = "application/http";
/// Media type of a multipart container.
pub const MIME_MULTIPART_MIXED: &str = "multipart/mixed";
/// The only transfer encoding accepted for wrapped parts.
pub const TRANSFER_ENCODING_BINARY: &str = "binary";

/// An ordered collection of header fields.
///
/// Lookup is case-insensitive; insertion order is preserved so that
/// re-encoding a decoded part keeps the original header order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a header field, keeping any existing field of the same name.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Set a header field, replacing the first existing field of the same
    /// name and removing any duplicates.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        let mut replaced = false;
        self.entries.retain_mut(|(n, v)| {
            if n.eq_ignore_ascii_case(&name) {
                if replaced {
                    return false;
                }
                replaced = true;
                *v = value.clone();
            }
            true
        });
        if !replaced {
            self.entries.push((name, value));
        }
    }

    /// Look up the first field with the given name, case-insensitively.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Remove all fields with the given name, returning the first value.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        let mut first = None;
        self.entries.retain_mut(|(n, v)| {
            if n.eq_ignore_ascii_case(name) {
                if first.is_none() {
                    first = Some(std::mem::take(v));
                }
                return false;
            }
            true
        });
        first
    }

    /// Iterate over fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no fields are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove all fields.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Parse one `name: value` line and append it.
    ///
    /// # Errors
    ///
    /// Returns an error if the line has no `:` separator or an empty name.
    pub fn parse_line(&mut self, line: &str) -> EnvelopeResult<()> {
        let Some((name, value)) = line.split_once(':') else {
            return Err(EnvelopeError::invalid_header(format!(
                "missing ':' separator in header line {line:?}"
            )));
        };
        let name = name.trim();
        if name.is_empty() {
            return Err(EnvelopeError::invalid_header("empty header name"));
        }
        self.entries
            .push((name.to_string(), value.trim().to_string()));
        Ok(())
    }

    /// The `Content-Type` field, if present.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.get(CONTENT_TYPE)
    }

    /// The `Content-ID` field, if present.
    #[must_use]
    pub fn content_id(&self) -> Option<&str> {
        self.get(CONTENT_ID)
    }

    /// The parsed `Content-Length` field, if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the field is present but not a non-negative
    /// integer.
    pub fn content_length(&self) -> EnvelopeResult<Option<u64>> {
        match self.get(CONTENT_LENGTH) {
            None => Ok(None),
            Some(raw) => raw.trim().parse::<u64>().map(Some).map_err(|_| {
                EnvelopeError::invalid_content_length(format!(
                    "Content-Length {raw:?} is not a non-negative integer"
                ))
            }),
        }
    }
}

/// Split a media type into its base type and parameter list.
///
/// `multipart/mixed; boundary=xyz` yields `("multipart/mixed",
/// [("boundary", "xyz")])`. Parameter values may be quoted.
pub(crate) fn parse_media_type(value: &str) -> EnvelopeResult<(String, Vec<(String, String)>)> {
    let mut segments = value.split(';');
    let base = segments
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| EnvelopeError::invalid_header("empty Content-Type"))?
        .to_ascii_lowercase();

    let mut params = Vec::new();
    for segment in segments {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }
        let Some((name, raw)) = segment.split_once('=') else {
            return Err(EnvelopeError::invalid_header(format!(
                "media type parameter {segment:?} has no '='"
            )));
        };
        let raw = raw.trim();
        let value = raw
            .strip_prefix('"')
            .and_then(|v| v.strip_suffix('"'))
            .unwrap_or(raw);
        params.push((name.trim().to_ascii_lowercase(), value.to_string()));
    }
    Ok((base, params))
}

/// Extract the boundary parameter from a `multipart/mixed` media type.
///
/// Returns `Ok(None)` if the media type is not multipart.
pub(crate) fn multipart_boundary(value: &str) -> EnvelopeResult<Option<String>> {
    let (base, params) = parse_media_type(value)?;
    if base != MIME_MULTIPART_MIXED {
        return Ok(None);
    }
    let boundary = params
        .into_iter()
        .find(|(name, _)| name == "boundary")
        .map(|(_, v)| v)
        .ok_or_else(|| {
            EnvelopeError::invalid_boundary("multipart media type has no boundary parameter")
        })?;
    Ok(Some(boundary))
}

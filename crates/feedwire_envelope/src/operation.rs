//! Batched operations and their start lines.

use crate::error::{EnvelopeError, EnvelopeResult};
use crate::headers::Headers;
use crate::state::Method;

/// HTTP version spelled inside batch parts.
pub const HTTP_VERSION: &str = "HTTP/1.1";

/// The first line of a batched request part: `METHOD uri HTTP/1.1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLine {
    /// The request method.
    pub method: Method,
    /// The request URI, exactly as spelled on the wire.
    pub uri: String,
    /// The protocol version token.
    pub version: String,
}

impl RequestLine {
    /// Create a request line with the standard version token.
    #[must_use]
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
            version: HTTP_VERSION.to_string(),
        }
    }

    pub(crate) fn parse(line: &str) -> EnvelopeResult<Self> {
        let parts: Vec<&str> = line.split(' ').filter(|p| !p.is_empty()).collect();
        if parts.len() != 3 {
            return Err(EnvelopeError::invalid_start_line(format!(
                "request line {line:?} does not have exactly three tokens"
            )));
        }
        let method = Method::parse(parts[0]).ok_or_else(|| {
            EnvelopeError::invalid_start_line(format!("unsupported method {:?}", parts[0]))
        })?;
        if !parts[2].starts_with("HTTP/") {
            return Err(EnvelopeError::invalid_start_line(format!(
                "request line version {:?} is not an HTTP version",
                parts[2]
            )));
        }
        Ok(Self {
            method,
            uri: parts[1].to_string(),
            version: parts[2].to_string(),
        })
    }
}

impl std::fmt::Display for RequestLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.method, self.uri, self.version)
    }
}

/// The first line of a batched response part: `HTTP/1.1 status reason`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    /// The protocol version token.
    pub version: String,
    /// The numeric status code.
    pub status: u16,
    /// The reason phrase. May be empty.
    pub reason: String,
}

impl StatusLine {
    /// Create a status line with the standard version token.
    #[must_use]
    pub fn new(status: u16, reason: impl Into<String>) -> Self {
        Self {
            version: HTTP_VERSION.to_string(),
            status,
            reason: reason.into(),
        }
    }

    pub(crate) fn parse(line: &str) -> EnvelopeResult<Self> {
        let mut parts = line.splitn(3, ' ');
        let version = parts.next().unwrap_or_default();
        if !version.starts_with("HTTP/") {
            return Err(EnvelopeError::invalid_start_line(format!(
                "status line {line:?} does not start with an HTTP version"
            )));
        }
        let code = parts.next().ok_or_else(|| {
            EnvelopeError::invalid_start_line(format!("status line {line:?} has no status code"))
        })?;
        let status: u16 = code.parse().map_err(|_| {
            EnvelopeError::invalid_start_line(format!("status code {code:?} is not numeric"))
        })?;
        let reason = parts.next().unwrap_or_default();
        Ok(Self {
            version: version.to_string(),
            status,
            reason: reason.to_string(),
        })
    }
}

impl std::fmt::Display for StatusLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.reason.is_empty() {
            write!(f, "{} {}", self.version, self.status)
        } else {
            write!(f, "{} {} {}", self.version, self.status, self.reason)
        }
    }
}

/// A parsed start line of either flavor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum StartLine {
    Request(RequestLine),
    Response(StatusLine),
}

impl StartLine {
    /// Returns true if the line can only be a start line, not a header.
    ///
    /// Response parts open with an HTTP version token; request parts
    /// open with a recognized method followed by a space. Header lines
    /// place a `:` directly after the field name, so their first
    /// space-delimited token never equals a bare method name.
    pub(crate) fn sniff(line: &str) -> bool {
        if line.starts_with("HTTP/") {
            return true;
        }
        let first = line.split(' ').next().unwrap_or_default();
        Method::parse(first).is_some()
    }

    pub(crate) fn parse(line: &str) -> EnvelopeResult<Self> {
        if line.starts_with("HTTP/") {
            StatusLine::parse(line).map(Self::Response)
        } else {
            RequestLine::parse(line).map(Self::Request)
        }
    }
}

/// What kind of HTTP message a batched operation wraps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationKind {
    /// A request part.
    Request(RequestLine),
    /// A response part.
    Response(StatusLine),
}

/// One fully read batched operation.
///
/// Produced by [`crate::BatchReader::read_operation`] and consumed by
/// [`crate::BatchWriter::write_operation`]. Headers keep their wire
/// order; the body is raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    /// The start line.
    pub kind: OperationKind,
    /// Message headers, in wire order.
    pub headers: Headers,
    /// Raw body bytes. Empty for bodiless operations.
    pub body: Vec<u8>,
}

impl Operation {
    /// Create a request operation with no headers and no body.
    #[must_use]
    pub fn request(method: Method, uri: impl Into<String>) -> Self {
        Self {
            kind: OperationKind::Request(RequestLine::new(method, uri)),
            headers: Headers::new(),
            body: Vec::new(),
        }
    }

    /// Create a response operation with no headers and no body.
    #[must_use]
    pub fn response(status: u16, reason: impl Into<String>) -> Self {
        Self {
            kind: OperationKind::Response(StatusLine::new(status, reason)),
            headers: Headers::new(),
            body: Vec::new(),
        }
    }

    /// Append a header field.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Attach a body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// The request method, for request operations.
    #[must_use]
    pub fn method(&self) -> Option<Method> {
        match &self.kind {
            OperationKind::Request(line) => Some(line.method),
            OperationKind::Response(_) => None,
        }
    }

    /// The status code, for response operations.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match &self.kind {
            OperationKind::Request(_) => None,
            OperationKind::Response(line) => Some(line.status),
        }
    }

    /// The correlation Content-ID, if present.
    #[must_use]
    pub fn content_id(&self) -> Option<&str> {
        self.headers.content_id()
    }
}

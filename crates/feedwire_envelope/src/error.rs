//! Error types for the envelope crate.

use thiserror::Error;

/// Result type for envelope operations.
pub type EnvelopeResult<T> = Result<T, EnvelopeError>;

/// Errors that can occur while reading or writing a batch envelope.
#[derive(Error, Debug)]
pub enum EnvelopeError {
    /// The underlying transport failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A boundary token or boundary line is malformed.
    #[error("invalid boundary: {message}")]
    InvalidBoundary {
        /// Description of the boundary problem.
        message: String,
    },

    /// The payload encoding could not be decoded.
    #[error("invalid encoding: {message}")]
    InvalidEncoding {
        /// Description of the encoding problem.
        message: String,
    },

    /// A header line is malformed.
    #[error("invalid header: {message}")]
    InvalidHeader {
        /// Description of the header problem.
        message: String,
    },

    /// A request or status line is malformed.
    #[error("invalid start line: {message}")]
    InvalidStartLine {
        /// Description of the start line problem.
        message: String,
    },

    /// A Content-Length header is unparsable or inconsistent.
    #[error("invalid content length: {message}")]
    InvalidContentLength {
        /// Description of the length problem.
        message: String,
    },

    /// Changeset scoping rules were violated.
    #[error("changeset violation: {message}")]
    ChangesetViolation {
        /// Description of the violation.
        message: String,
    },

    /// Content appeared where none is allowed.
    #[error("unexpected content: {message}")]
    UnexpectedContent {
        /// Description of the stray content.
        message: String,
    },

    /// The stream ended before the envelope was complete.
    #[error("unexpected end of batch stream")]
    UnexpectedEof,

    /// Bytes remain after the terminating batch boundary.
    #[error("{trailing} trailing byte(s) after terminating boundary")]
    TrailingData {
        /// Number of bytes found after the terminator.
        trailing: usize,
    },

    /// An accessor or writer call does not fit the current state.
    #[error("invalid state: {message}")]
    InvalidState {
        /// Description of the state mismatch.
        message: String,
    },
}

impl EnvelopeError {
    /// Create an invalid boundary error.
    pub fn invalid_boundary(message: impl Into<String>) -> Self {
        Self::InvalidBoundary {
            message: message.into(),
        }
    }

    /// Create an invalid encoding error.
    pub fn invalid_encoding(message: impl Into<String>) -> Self {
        Self::InvalidEncoding {
            message: message.into(),
        }
    }

    /// Create an invalid header error.
    pub fn invalid_header(message: impl Into<String>) -> Self {
        Self::InvalidHeader {
            message: message.into(),
        }
    }

    /// Create an invalid start line error.
    pub fn invalid_start_line(message: impl Into<String>) -> Self {
        Self::InvalidStartLine {
            message: message.into(),
        }
    }

    /// Create an invalid content length error.
    pub fn invalid_content_length(message: impl Into<String>) -> Self {
        Self::InvalidContentLength {
            message: message.into(),
        }
    }

    /// Create a changeset violation error.
    pub fn changeset_violation(message: impl Into<String>) -> Self {
        Self::ChangesetViolation {
            message: message.into(),
        }
    }

    /// Create an unexpected content error.
    pub fn unexpected_content(message: impl Into<String>) -> Self {
        Self::UnexpectedContent {
            message: message.into(),
        }
    }

    /// Create an invalid state error.
    pub fn invalid_state(message: impl Into<String>) -> Self {
        Self::InvalidState {
            message: message.into(),
        }
    }
}

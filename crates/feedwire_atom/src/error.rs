//! Error types for feed parsing.

use thiserror::Error;

/// Result type for parsing operations.
pub type AtomResult<T> = Result<T, AtomError>;

/// Errors that can occur while parsing a feed or entry document.
#[derive(Debug, Error)]
pub enum AtomError {
    /// XML transport or well-formedness error.
    #[error("xml error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Malformed attribute list on an element.
    #[error("attribute error: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    /// Text content that is not valid UTF-8.
    #[error("invalid text: {message}")]
    InvalidText {
        /// Description of the decoding failure.
        message: String,
    },

    /// An entry ended without an id element.
    #[error("entry has no id")]
    MissingIdentity,

    /// An entry id that is not an absolute URI.
    #[error("entry id {value:?} is not an absolute URI")]
    InvalidIdentity {
        /// The offending id text.
        value: String,
    },

    /// An entry with more than one content element.
    #[error("entry declares content more than once")]
    DuplicateContent,

    /// An entry that ended without a content element.
    #[error("entry has no content element")]
    MissingContent,

    /// A media pointer content element that carries children or text.
    #[error("content element with a source address must be empty")]
    MediaContentNotEmpty,

    /// A link that cannot be interpreted.
    #[error("invalid link: {message}")]
    InvalidLink {
        /// Description of the malformed link.
        message: String,
    },

    /// A count element whose text is not a whole number.
    #[error("invalid count value {value:?}")]
    InvalidCount {
        /// The offending count text.
        value: String,
    },

    /// An element that the document shape does not allow here.
    #[error("unexpected element: {message}")]
    UnexpectedElement {
        /// Description of the element and where it appeared.
        message: String,
    },

    /// Inline expansion nested deeper than the configured bound.
    #[error("inline expansion exceeds depth limit {limit}")]
    ExpansionTooDeep {
        /// The configured depth limit.
        limit: usize,
    },

    /// An in-band error document sent by the service.
    #[error("service error: {message}")]
    ServiceError {
        /// The message extracted from the error document.
        message: String,
    },

    /// The document ended before the open structure was closed.
    #[error("unexpected end of document")]
    UnexpectedEof,
}

impl AtomError {
    /// Creates an invalid text error.
    pub fn invalid_text(message: impl Into<String>) -> Self {
        Self::InvalidText {
            message: message.into(),
        }
    }

    /// Creates an invalid identity error.
    pub fn invalid_identity(value: impl Into<String>) -> Self {
        Self::InvalidIdentity {
            value: value.into(),
        }
    }

    /// Creates an invalid link error.
    pub fn invalid_link(message: impl Into<String>) -> Self {
        Self::InvalidLink {
            message: message.into(),
        }
    }

    /// Creates an invalid count error.
    pub fn invalid_count(value: impl Into<String>) -> Self {
        Self::InvalidCount {
            value: value.into(),
        }
    }

    /// Creates an unexpected element error.
    pub fn unexpected_element(message: impl Into<String>) -> Self {
        Self::UnexpectedElement {
            message: message.into(),
        }
    }

    /// Creates a service error.
    pub fn service(message: impl Into<String>) -> Self {
        Self::ServiceError {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = AtomError::invalid_identity("/relative");
        assert_eq!(err.to_string(), "entry id \"/relative\" is not an absolute URI");

        let err = AtomError::ExpansionTooDeep { limit: 32 };
        assert_eq!(err.to_string(), "inline expansion exceeds depth limit 32");

        let err = AtomError::service("resource not found");
        assert_eq!(err.to_string(), "service error: resource not found");
    }

    #[test]
    fn error_conversion() {
        fn parse() -> AtomResult<()> {
            let mut reader = quick_xml::Reader::from_str("<feed attr=\"unterminated");
            loop {
                if let quick_xml::events::Event::Eof = reader.read_event()? {
                    return Ok(());
                }
            }
        }

        assert!(matches!(parse(), Err(AtomError::Xml(_))));
    }
}

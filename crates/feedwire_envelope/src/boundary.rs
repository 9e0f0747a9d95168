//! Boundary tokens and boundary line classification.

use crate::encoding::LineEncoding;
use crate::error::{EnvelopeError, EnvelopeResult};
use crate::headers::multipart_boundary;

/// Longest boundary token permitted by the multipart grammar.
const MAX_BOUNDARY_LENGTH: usize = 70;

/// A validated multipart boundary token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Boundary {
    token: String,
}

impl Boundary {
    /// Validate and wrap a boundary token.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is empty, longer than 70
    /// characters, contains non-ASCII or forbidden characters, or ends
    /// with a space.
    pub(crate) fn new(token: impl Into<String>) -> EnvelopeResult<Self> {
        let token = token.into();
        if token.is_empty() {
            return Err(EnvelopeError::invalid_boundary("empty boundary token"));
        }
        if token.len() > MAX_BOUNDARY_LENGTH {
            return Err(EnvelopeError::invalid_boundary(format!(
                "boundary token is {} characters, limit is {MAX_BOUNDARY_LENGTH}",
                token.len()
            )));
        }
        if !token.is_ascii() {
            return Err(EnvelopeError::invalid_boundary(
                "boundary token contains non-ASCII characters",
            ));
        }
        let valid = token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b" '()+_,-./:=?".contains(&b));
        if !valid {
            return Err(EnvelopeError::invalid_boundary(format!(
                "boundary token {token:?} contains forbidden characters"
            )));
        }
        if token.ends_with(' ') {
            return Err(EnvelopeError::invalid_boundary(
                "boundary token ends with a space",
            ));
        }
        Ok(Self { token })
    }

    /// Build a fresh `prefix_<uuid>` boundary.
    ///
    /// Generated tokens are ASCII alphanumerics with `_` and `-`, well
    /// under the length limit, so no validation is needed.
    pub(crate) fn generated(prefix: &str) -> Self {
        Self {
            token: format!("{prefix}_{}", uuid::Uuid::new_v4()),
        }
    }

    /// Extract and validate the boundary from a multipart Content-Type.
    pub(crate) fn from_content_type(content_type: &str) -> EnvelopeResult<Self> {
        let token = multipart_boundary(content_type)?.ok_or_else(|| {
            EnvelopeError::invalid_boundary(format!(
                "Content-Type {content_type:?} is not multipart/mixed"
            ))
        })?;
        Self::new(token)
    }

    /// The bare token.
    pub(crate) fn token(&self) -> &str {
        &self.token
    }

    /// The line that continues the part sequence: `--token`.
    pub(crate) fn delimiter_line(&self) -> String {
        format!("--{}", self.token)
    }

    /// The line that terminates the part sequence: `--token--`.
    pub(crate) fn terminator_line(&self) -> String {
        format!("--{}--", self.token)
    }
}

/// A classified boundary line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BoundaryMatch {
    /// A batch boundary line.
    Batch {
        /// True for the `--token--` terminator form.
        terminal: bool,
    },
    /// A changeset boundary line.
    ChangeSet {
        /// True for the `--token--` terminator form.
        terminal: bool,
    },
}

/// One boundary's encoded line forms.
#[derive(Debug)]
struct Needle {
    changeset: bool,
    terminator: Vec<u8>,
    delimiter: Vec<u8>,
}

/// Classifies raw logical lines against the active boundary set.
///
/// Both boundaries are matched in a single pass per line. The changeset
/// needle is tested before the batch needle, preserving the scan order
/// the envelope format has always been read with, so a line that somehow
/// satisfies both reads as a changeset boundary.
#[derive(Debug)]
pub(crate) struct BoundaryScanner {
    needles: Vec<Needle>,
    space: Vec<u8>,
    tab: Vec<u8>,
}

impl BoundaryScanner {
    /// Build a scanner for the given boundaries and line encoding.
    pub(crate) fn new(
        batch: &Boundary,
        changeset: Option<&Boundary>,
        encoding: LineEncoding,
    ) -> Self {
        let mut needles = Vec::with_capacity(2);
        if let Some(cs) = changeset {
            needles.push(Needle {
                changeset: true,
                terminator: encoding.encode_ascii(&cs.terminator_line()),
                delimiter: encoding.encode_ascii(&cs.delimiter_line()),
            });
        }
        needles.push(Needle {
            changeset: false,
            terminator: encoding.encode_ascii(&batch.terminator_line()),
            delimiter: encoding.encode_ascii(&batch.delimiter_line()),
        });
        Self {
            needles,
            space: encoding.encode_ascii(" "),
            tab: encoding.encode_ascii("\t"),
        }
    }

    /// Classify a raw logical line (terminator already stripped).
    ///
    /// Trailing transport padding (spaces and tabs) is ignored, as the
    /// multipart grammar permits.
    pub(crate) fn classify(&self, raw_line: &[u8]) -> Option<BoundaryMatch> {
        let line = self.trim_padding(raw_line);
        for needle in &self.needles {
            let matched = if line == needle.terminator.as_slice() {
                Some(true)
            } else if line == needle.delimiter.as_slice() {
                Some(false)
            } else {
                None
            };
            if let Some(terminal) = matched {
                return Some(if needle.changeset {
                    BoundaryMatch::ChangeSet { terminal }
                } else {
                    BoundaryMatch::Batch { terminal }
                });
            }
        }
        None
    }

    fn trim_padding<'a>(&self, mut line: &'a [u8]) -> &'a [u8] {
        let width = self.space.len();
        while line.len() >= width {
            let tail = &line[line.len() - width..];
            if tail == self.space.as_slice() || tail == self.tab.as_slice() {
                line = &line[..line.len() - width];
            } else {
                break;
            }
        }
        line
    }
}

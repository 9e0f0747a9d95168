//! # Feedwire Envelope
//!
//! Multipart batch envelope codec for Feedwire.
//!
//! A batch envelope packs several HTTP-style operations into one
//! multipart payload:
//!
//! - Retrieval operations live directly in the batch
//! - Change operations are grouped in at most one changeset
//! - Parts are separated by boundary lines; operation content is framed
//!   either by a declared length or by the next boundary
//! - Text regions may carry a byte order mark; the changeset is sniffed
//!   separately from the outer batch
//!
//! Reading is streaming: [`BatchReader::advance`] steps to the next
//! operation or scope boundary, and content is exposed as an
//! [`std::io::Read`] without buffering the whole payload.
//!
//! ## Usage
//!
//! ```
//! use feedwire_envelope::{BatchReader, BatchWriter, Method, Operation};
//!
//! let mut writer = BatchWriter::request(Vec::new());
//! writer
//!     .write_operation(&Operation::request(Method::Get, "http://host/svc/Customers"))
//!     .unwrap();
//! writer.begin_changeset().unwrap();
//! writer
//!     .write_operation(
//!         &Operation::request(Method::Post, "http://host/svc/Customers")
//!             .with_header("Content-ID", "1")
//!             .with_body(b"<entry/>".to_vec()),
//!     )
//!     .unwrap();
//! writer.end_changeset().unwrap();
//! let boundary = writer.boundary().to_string();
//! writer.finish().unwrap();
//! let payload = writer.into_inner();
//!
//! let mut reader = BatchReader::new(payload.as_slice(), &boundary).unwrap();
//! let mut methods = Vec::new();
//! while reader.advance().unwrap() {
//!     if reader.state().is_operation() {
//!         let op = reader.read_operation().unwrap();
//!         methods.push(op.method().unwrap());
//!     }
//! }
//! assert_eq!(methods, vec![Method::Get, Method::Post]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod boundary;
mod encoding;
mod error;
mod headers;
mod operation;
mod reader;
mod state;
mod writer;

pub use encoding::LineEncoding;
pub use error::{EnvelopeError, EnvelopeResult};
pub use headers::{
    Headers, CONTENT_ID, CONTENT_LENGTH, CONTENT_TRANSFER_ENCODING, CONTENT_TYPE,
    MIME_APPLICATION_HTTP, MIME_MULTIPART_MIXED, TRANSFER_ENCODING_BINARY,
};
pub use operation::{Operation, OperationKind, RequestLine, StatusLine, HTTP_VERSION};
pub use reader::{BatchReader, ContentStream};
pub use state::{BatchState, Method};
pub use writer::BatchWriter;

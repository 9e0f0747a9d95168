//! Batch envelope writer.
//!
//! [`BatchWriter`] produces a multipart batch payload part by part,
//! mirroring what [`crate::BatchReader`] consumes. Output is always
//! UTF-8 without a byte order mark, with CRLF line endings.

use std::io::Write;

use tracing::debug;

use crate::boundary::Boundary;
use crate::error::{EnvelopeError, EnvelopeResult};
use crate::headers::{CONTENT_LENGTH, MIME_APPLICATION_HTTP, MIME_MULTIPART_MIXED};
use crate::operation::{Operation, OperationKind};

/// Streaming writer for a multipart batch envelope.
///
/// The writer owns content framing: any `Content-Length` header on an
/// [`Operation`] is dropped and replaced with the actual body length.
/// Request parts omit the header for empty bodies; response parts
/// always carry one so zero-length bodies stay unambiguous.
pub struct BatchWriter<W: Write> {
    inner: W,
    batch: Boundary,
    changeset: Option<Boundary>,
    response_mode: bool,
    changeset_used: bool,
    needs_line_break: bool,
    finished: bool,
}

impl<W: Write> BatchWriter<W> {
    /// Create a writer for a request batch with a generated boundary.
    pub fn request(inner: W) -> Self {
        Self::from_boundary(inner, Boundary::generated("batch"), false)
    }

    /// Create a writer for a response batch with a generated boundary.
    pub fn response(inner: W) -> Self {
        Self::from_boundary(inner, Boundary::generated("batchresponse"), true)
    }

    /// Create a request-batch writer with a caller-chosen boundary.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is not a valid multipart boundary.
    pub fn request_with_boundary(inner: W, token: &str) -> EnvelopeResult<Self> {
        let boundary = Boundary::new(token)?;
        Ok(Self::from_boundary(inner, boundary, false))
    }

    /// Create a response-batch writer with a caller-chosen boundary.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is not a valid multipart boundary.
    pub fn response_with_boundary(inner: W, token: &str) -> EnvelopeResult<Self> {
        let boundary = Boundary::new(token)?;
        Ok(Self::from_boundary(inner, boundary, true))
    }

    fn from_boundary(inner: W, batch: Boundary, response_mode: bool) -> Self {
        Self {
            inner,
            batch,
            changeset: None,
            response_mode,
            changeset_used: false,
            needs_line_break: false,
            finished: false,
        }
    }

    /// The outer boundary token.
    #[must_use]
    pub fn boundary(&self) -> &str {
        self.batch.token()
    }

    /// The boundary token of the open changeset, if one is open.
    #[must_use]
    pub fn changeset_boundary(&self) -> Option<&str> {
        self.changeset.as_ref().map(Boundary::token)
    }

    /// The `Content-Type` header value describing this envelope.
    #[must_use]
    pub fn content_type(&self) -> String {
        format!("{}; boundary={}", MIME_MULTIPART_MIXED, self.batch.token())
    }

    /// Open the batch's changeset.
    ///
    /// # Errors
    ///
    /// Returns an error if a changeset is already open, the batch has
    /// already carried one, or the batch is finished.
    pub fn begin_changeset(&mut self) -> EnvelopeResult<()> {
        self.ensure_open()?;
        if self.changeset.is_some() {
            return Err(EnvelopeError::changeset_violation(
                "changeset is already open",
            ));
        }
        if self.changeset_used {
            return Err(EnvelopeError::changeset_violation(
                "batch already contains a changeset",
            ));
        }
        let prefix = if self.response_mode {
            "changesetresponse"
        } else {
            "changeset"
        };
        let boundary = Boundary::generated(prefix);
        self.line_break_if_needed()?;
        let opener = self.batch.delimiter_line();
        self.write_line(&opener)?;
        let content_type = format!(
            "Content-Type: {}; boundary={}",
            MIME_MULTIPART_MIXED,
            boundary.token()
        );
        self.write_line(&content_type)?;
        self.write_line("")?;
        self.changeset = Some(boundary);
        self.changeset_used = true;
        debug!("changeset opened");
        Ok(())
    }

    /// Close the open changeset.
    ///
    /// # Errors
    ///
    /// Returns an error if no changeset is open or the batch is
    /// finished.
    pub fn end_changeset(&mut self) -> EnvelopeResult<()> {
        self.ensure_open()?;
        let Some(changeset) = self.changeset.take() else {
            return Err(EnvelopeError::changeset_violation("no changeset is open"));
        };
        self.line_break_if_needed()?;
        self.write_line(&changeset.terminator_line())?;
        debug!("changeset closed");
        Ok(())
    }

    /// Write one operation part.
    ///
    /// # Errors
    ///
    /// Returns an error if the operation's flavor does not match the
    /// batch, if changeset scoping is violated, if a bodiless operation
    /// carries a body, or on transport failure.
    pub fn write_operation(&mut self, op: &Operation) -> EnvelopeResult<()> {
        self.ensure_open()?;
        match &op.kind {
            OperationKind::Request(line) => {
                if self.response_mode {
                    return Err(EnvelopeError::invalid_state(
                        "request operation in a response batch",
                    ));
                }
                let in_changeset = self.changeset.is_some();
                if in_changeset && !line.method.is_change() {
                    return Err(EnvelopeError::changeset_violation(
                        "retrieval request inside a changeset",
                    ));
                }
                if !in_changeset && line.method.is_change() {
                    return Err(EnvelopeError::changeset_violation(format!(
                        "{} request outside a changeset",
                        line.method
                    )));
                }
                if !line.method.allows_body() && !op.body.is_empty() {
                    return Err(EnvelopeError::unexpected_content(format!(
                        "{} operation cannot carry a body",
                        line.method
                    )));
                }
            }
            OperationKind::Response(_) => {
                if !self.response_mode {
                    return Err(EnvelopeError::invalid_state(
                        "response operation in a request batch",
                    ));
                }
            }
        }

        let boundary_line = match &self.changeset {
            Some(changeset) => changeset.delimiter_line(),
            None => self.batch.delimiter_line(),
        };
        self.line_break_if_needed()?;
        self.write_line(&boundary_line)?;
        self.write_line(&format!("Content-Type: {MIME_APPLICATION_HTTP}"))?;
        self.write_line("Content-Transfer-Encoding: binary")?;
        self.write_line("")?;
        let start_line = match &op.kind {
            OperationKind::Request(line) => line.to_string(),
            OperationKind::Response(line) => line.to_string(),
        };
        self.write_line(&start_line)?;
        for (name, value) in op.headers.iter() {
            if name.eq_ignore_ascii_case(CONTENT_LENGTH) {
                continue;
            }
            self.write_line(&format!("{name}: {value}"))?;
        }
        if !op.body.is_empty() {
            self.write_line(&format!("Content-Length: {}", op.body.len()))?;
        } else if self.response_mode {
            self.write_line("Content-Length: 0")?;
        }
        self.write_line("")?;
        if !op.body.is_empty() {
            self.inner.write_all(&op.body)?;
            self.needs_line_break = true;
        }
        Ok(())
    }

    /// Write the terminating boundary and flush.
    ///
    /// # Errors
    ///
    /// Returns an error if a changeset is still open or the batch is
    /// already finished.
    pub fn finish(&mut self) -> EnvelopeResult<()> {
        if self.finished {
            return Err(EnvelopeError::invalid_state("batch is already finished"));
        }
        if self.changeset.is_some() {
            return Err(EnvelopeError::changeset_violation(
                "changeset not closed before finishing the batch",
            ));
        }
        self.line_break_if_needed()?;
        let terminator = self.batch.terminator_line();
        self.write_line(&terminator)?;
        self.inner.flush()?;
        self.finished = true;
        debug!("batch finished");
        Ok(())
    }

    /// Consume the writer and return the underlying sink.
    pub fn into_inner(self) -> W {
        self.inner
    }

    fn ensure_open(&self) -> EnvelopeResult<()> {
        if self.finished {
            return Err(EnvelopeError::invalid_state("batch is already finished"));
        }
        Ok(())
    }

    fn line_break_if_needed(&mut self) -> EnvelopeResult<()> {
        if self.needs_line_break {
            self.inner.write_all(b"\r\n")?;
            self.needs_line_break = false;
        }
        Ok(())
    }

    fn write_line(&mut self, line: &str) -> EnvelopeResult<()> {
        self.inner.write_all(line.as_bytes())?;
        self.inner.write_all(b"\r\n")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Method;

    #[test]
    fn request_batch_layout() {
        let mut writer = BatchWriter::request_with_boundary(Vec::new(), "b1").unwrap();
        writer
            .write_operation(&Operation::request(
                Method::Get,
                "http://host/svc/Customers",
            ))
            .unwrap();
        writer.begin_changeset().unwrap();
        let changeset = writer.changeset_boundary().unwrap().to_string();
        writer
            .write_operation(
                &Operation::request(Method::Post, "http://host/svc/Customers")
                    .with_header("Content-ID", "1")
                    .with_header("Content-Type", "application/atom+xml")
                    .with_body(b"<entry/>".to_vec()),
            )
            .unwrap();
        writer.end_changeset().unwrap();
        writer.finish().unwrap();

        let expected = format!(
            concat!(
                "--b1\r\n",
                "Content-Type: application/http\r\n",
                "Content-Transfer-Encoding: binary\r\n",
                "\r\n",
                "GET http://host/svc/Customers HTTP/1.1\r\n",
                "\r\n",
                "--b1\r\n",
                "Content-Type: multipart/mixed; boundary={cs}\r\n",
                "\r\n",
                "--{cs}\r\n",
                "Content-Type: application/http\r\n",
                "Content-Transfer-Encoding: binary\r\n",
                "\r\n",
                "POST http://host/svc/Customers HTTP/1.1\r\n",
                "Content-ID: 1\r\n",
                "Content-Type: application/atom+xml\r\n",
                "Content-Length: 8\r\n",
                "\r\n",
                "<entry/>\r\n",
                "--{cs}--\r\n",
                "--b1--\r\n",
            ),
            cs = changeset
        );
        assert_eq!(writer.into_inner(), expected.as_bytes());
    }

    #[test]
    fn response_parts_always_declare_length() {
        let mut writer = BatchWriter::response_with_boundary(Vec::new(), "b1").unwrap();
        writer
            .write_operation(&Operation::response(204, "No Content"))
            .unwrap();
        writer.finish().unwrap();

        let expected = concat!(
            "--b1\r\n",
            "Content-Type: application/http\r\n",
            "Content-Transfer-Encoding: binary\r\n",
            "\r\n",
            "HTTP/1.1 204 No Content\r\n",
            "Content-Length: 0\r\n",
            "\r\n",
            "--b1--\r\n",
        );
        assert_eq!(writer.into_inner(), expected.as_bytes());
    }

    #[test]
    fn caller_content_length_is_replaced() {
        let mut writer = BatchWriter::response_with_boundary(Vec::new(), "b1").unwrap();
        writer
            .write_operation(
                &Operation::response(200, "OK")
                    .with_header("Content-Length", "999")
                    .with_body(b"four".to_vec()),
            )
            .unwrap();
        writer.finish().unwrap();

        let text = String::from_utf8(writer.into_inner()).unwrap();
        assert!(text.contains("Content-Length: 4\r\n"));
        assert!(!text.contains("999"));
    }

    #[test]
    fn generated_boundaries_have_the_expected_shape() {
        let request = BatchWriter::request(Vec::new());
        assert!(request.boundary().starts_with("batch_"));
        let response = BatchWriter::response(Vec::new());
        assert!(response.boundary().starts_with("batchresponse_"));
        assert!(response
            .content_type()
            .starts_with("multipart/mixed; boundary=batchresponse_"));
    }

    #[test]
    fn retrieval_with_body_is_rejected() {
        let mut writer = BatchWriter::request_with_boundary(Vec::new(), "b1").unwrap();
        let op = Operation::request(Method::Get, "http://host/x").with_body(b"nope".to_vec());
        assert!(matches!(
            writer.write_operation(&op),
            Err(EnvelopeError::UnexpectedContent { .. })
        ));
    }

    #[test]
    fn change_outside_changeset_is_rejected() {
        let mut writer = BatchWriter::request_with_boundary(Vec::new(), "b1").unwrap();
        let op = Operation::request(Method::Delete, "http://host/x");
        assert!(matches!(
            writer.write_operation(&op),
            Err(EnvelopeError::ChangesetViolation { .. })
        ));
    }

    #[test]
    fn retrieval_inside_changeset_is_rejected() {
        let mut writer = BatchWriter::request_with_boundary(Vec::new(), "b1").unwrap();
        writer.begin_changeset().unwrap();
        let op = Operation::request(Method::Get, "http://host/x");
        assert!(matches!(
            writer.write_operation(&op),
            Err(EnvelopeError::ChangesetViolation { .. })
        ));
    }

    #[test]
    fn second_changeset_is_rejected() {
        let mut writer = BatchWriter::request_with_boundary(Vec::new(), "b1").unwrap();
        writer.begin_changeset().unwrap();
        writer.end_changeset().unwrap();
        assert!(matches!(
            writer.begin_changeset(),
            Err(EnvelopeError::ChangesetViolation { .. })
        ));
    }

    #[test]
    fn finish_with_open_changeset_is_rejected() {
        let mut writer = BatchWriter::request_with_boundary(Vec::new(), "b1").unwrap();
        writer.begin_changeset().unwrap();
        assert!(matches!(
            writer.finish(),
            Err(EnvelopeError::ChangesetViolation { .. })
        ));
        writer.end_changeset().unwrap();
        writer.finish().unwrap();
        assert!(writer.finish().is_err());
    }

    #[test]
    fn mismatched_flavor_is_rejected() {
        let mut writer = BatchWriter::request_with_boundary(Vec::new(), "b1").unwrap();
        assert!(writer
            .write_operation(&Operation::response(200, "OK"))
            .is_err());

        let mut writer = BatchWriter::response_with_boundary(Vec::new(), "b1").unwrap();
        assert!(writer
            .write_operation(&Operation::request(Method::Get, "http://host/x"))
            .is_err());
    }
}

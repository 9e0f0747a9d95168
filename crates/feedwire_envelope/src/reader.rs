//! Streaming batch envelope reader.
//!
//! [`BatchReader`] walks a multipart batch payload one operation at a
//! time without buffering the whole response. Each [`BatchReader::advance`]
//! call positions the reader on the next operation or scope boundary;
//! the operation's content is then available through
//! [`BatchReader::content_stream`] until the next `advance`, which
//! drains whatever was left unread.

use std::io::{self, Read};

use tracing::{debug, trace};

use crate::boundary::{Boundary, BoundaryMatch, BoundaryScanner};
use crate::encoding::LineEncoding;
use crate::error::{EnvelopeError, EnvelopeResult};
use crate::headers::{
    self, Headers, CONTENT_TRANSFER_ENCODING, MIME_APPLICATION_HTTP, TRANSFER_ENCODING_BINARY,
};
use crate::operation::{Operation, OperationKind, RequestLine, StartLine, StatusLine};
use crate::state::BatchState;

/// Size of the internal read buffer.
const BUFFER_SIZE: usize = 8 * 1024;

/// Maximum bytes in one header or start line.
/// This bounds memory use against untrusted input; request URIs fit
/// comfortably.
const MAX_HEADER_LINE_BYTES: usize = 64 * 1024;

/// Maximum bytes a line may have and still be a boundary candidate.
/// A boundary line is at most `--` + 70 token characters + `--` plus
/// transport padding, in the widest encoding.
const MAX_BOUNDARY_LINE_BYTES: usize = 512;

/// How the current operation's content is framed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Framing {
    /// No content region is open.
    None,
    /// Content is bounded by a declared byte count.
    Length { remaining: u64 },
    /// Content runs until the next boundary line.
    Delimited { done: bool },
}

/// Which flavor of parts this envelope carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Request,
    Response,
}

/// One raw logical line from the payload.
enum RawLine {
    /// A complete line with its terminator split off. The terminator is
    /// empty only for a final unterminated line at end of stream.
    Line {
        content: Vec<u8>,
        terminator: Vec<u8>,
    },
    /// The line exceeded the caller's limit; this is the prefix read so
    /// far. The rest of the line is still in the stream.
    Overflow(Vec<u8>),
    /// End of stream with no bytes left.
    End,
}

/// Streaming reader over a multipart batch envelope.
pub struct BatchReader<R: Read> {
    inner: R,
    buf: Vec<u8>,
    pos: usize,
    filled: usize,
    eof: bool,

    encoding: LineEncoding,
    batch_encoding: LineEncoding,
    sniff_default: LineEncoding,
    needs_sniff: bool,

    batch_boundary: Boundary,
    changeset_boundary: Option<Boundary>,
    scanner: BoundaryScanner,

    state: BatchState,
    mode: Option<Mode>,
    changeset_seen: bool,

    part_headers: Headers,
    op_headers: Headers,
    request_line: Option<RequestLine>,
    status_line: Option<StatusLine>,

    framing: Framing,
    carry: Vec<u8>,
    carry_pos: usize,
    held: Vec<u8>,
    line_overflow: bool,
    pending: Option<BoundaryMatch>,
}

impl<R: Read> BatchReader<R> {
    /// Create a reader for a payload delimited by the given boundary
    /// token.
    ///
    /// # Errors
    ///
    /// Returns an error if the boundary token is not a valid multipart
    /// boundary.
    pub fn new(inner: R, boundary_token: &str) -> EnvelopeResult<Self> {
        let batch_boundary = Boundary::new(boundary_token)?;
        let scanner = BoundaryScanner::new(&batch_boundary, None, LineEncoding::Ascii);
        Ok(Self {
            inner,
            buf: vec![0; BUFFER_SIZE],
            pos: 0,
            filled: 0,
            eof: false,
            encoding: LineEncoding::Ascii,
            batch_encoding: LineEncoding::Ascii,
            sniff_default: LineEncoding::Ascii,
            needs_sniff: true,
            batch_boundary,
            changeset_boundary: None,
            scanner,
            state: BatchState::StartBatch,
            mode: None,
            changeset_seen: false,
            part_headers: Headers::new(),
            op_headers: Headers::new(),
            request_line: None,
            status_line: None,
            framing: Framing::None,
            carry: Vec::new(),
            carry_pos: 0,
            held: Vec::new(),
            line_overflow: false,
            pending: None,
        })
    }

    /// Create a reader from the envelope's outer `Content-Type` header
    /// value, extracting the boundary parameter.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a `multipart/mixed` media
    /// type with a valid boundary.
    pub fn from_content_type(inner: R, content_type: &str) -> EnvelopeResult<Self> {
        let boundary = Boundary::from_content_type(content_type)?;
        Self::new(inner, boundary.token())
    }

    /// The reader's current position in the envelope.
    #[must_use]
    pub fn state(&self) -> BatchState {
        self.state
    }

    /// The text encoding detected for the current scope.
    #[must_use]
    pub fn encoding(&self) -> LineEncoding {
        self.encoding
    }

    /// Headers of the current part's multipart wrapper.
    ///
    /// For operation parts this is the `application/http` header pair
    /// and anything written alongside it.
    #[must_use]
    pub fn part_headers(&self) -> &Headers {
        &self.part_headers
    }

    /// Message headers of the current operation.
    #[must_use]
    pub fn headers(&self) -> &Headers {
        &self.op_headers
    }

    /// The request line, when positioned on a request part.
    #[must_use]
    pub fn request_line(&self) -> Option<&RequestLine> {
        self.request_line.as_ref()
    }

    /// The status line, when positioned on a response part.
    #[must_use]
    pub fn status_line(&self) -> Option<&StatusLine> {
        self.status_line.as_ref()
    }

    /// The status code, when positioned on a response part.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        self.status_line.as_ref().map(|line| line.status)
    }

    /// The correlation Content-ID of the current operation, whether it
    /// was carried in the message headers or the part headers.
    #[must_use]
    pub fn content_id(&self) -> Option<&str> {
        self.op_headers
            .content_id()
            .or_else(|| self.part_headers.content_id())
    }

    /// Move to the next operation or scope boundary.
    ///
    /// Returns `Ok(false)` exactly when the terminating batch boundary
    /// has been consumed with no bytes after it; every later call keeps
    /// returning `Ok(false)`. Unread content of the current operation is
    /// drained first.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed framing, violated changeset
    /// scoping, stray content, or transport failures. Errors are not
    /// retryable.
    pub fn advance(&mut self) -> EnvelopeResult<bool> {
        if self.state == BatchState::EndBatch {
            return Ok(false);
        }
        self.finish_current_content()?;
        let matched = match self.pending.take() {
            Some(m) => m,
            None => {
                let allow_preamble = self.state == BatchState::StartBatch;
                self.seek_boundary(allow_preamble)?
            }
        };
        self.apply_match(matched)
    }

    /// Borrow the current operation's content as an [`io::Read`].
    ///
    /// # Errors
    ///
    /// Returns an error if the reader is not positioned on an operation.
    pub fn content_stream(&mut self) -> EnvelopeResult<ContentStream<'_, R>> {
        if !self.state.is_operation() {
            return Err(EnvelopeError::invalid_state(format!(
                "no operation content at {:?}",
                self.state
            )));
        }
        Ok(ContentStream { reader: self })
    }

    /// Read the current operation into an owned [`Operation`], draining
    /// its content.
    ///
    /// # Errors
    ///
    /// Returns an error if the reader is not positioned on an operation,
    /// or if a bodiless operation turns out to carry content.
    pub fn read_operation(&mut self) -> EnvelopeResult<Operation> {
        if !self.state.is_operation() {
            return Err(EnvelopeError::invalid_state(format!(
                "no operation at {:?}",
                self.state
            )));
        }
        let kind = match (&self.request_line, &self.status_line) {
            (Some(line), _) => OperationKind::Request(line.clone()),
            (_, Some(line)) => OperationKind::Response(line.clone()),
            _ => {
                return Err(EnvelopeError::invalid_state(
                    "operation state without a start line",
                ))
            }
        };
        let headers = self.op_headers.clone();
        let mut body = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = self.content_read(&mut chunk)?;
            if n == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..n]);
        }
        if !body.is_empty() && !self.state.allows_content() {
            return Err(EnvelopeError::unexpected_content(format!(
                "{:?} operation carries content",
                self.state
            )));
        }
        Ok(Operation {
            kind,
            headers,
            body,
        })
    }

    // ---- buffer management -------------------------------------------

    fn fill(&mut self) -> EnvelopeResult<()> {
        if self.pos == self.filled {
            self.pos = 0;
            self.filled = 0;
        } else if self.filled == self.buf.len() {
            self.buf.copy_within(self.pos..self.filled, 0);
            self.filled -= self.pos;
            self.pos = 0;
        }
        loop {
            match self.inner.read(&mut self.buf[self.filled..]) {
                Ok(0) => {
                    self.eof = true;
                    return Ok(());
                }
                Ok(n) => {
                    self.filled += n;
                    return Ok(());
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn available_len(&self) -> usize {
        self.filled - self.pos
    }

    fn maybe_sniff(&mut self) -> EnvelopeResult<()> {
        if !self.needs_sniff {
            return Ok(());
        }
        while self.available_len() < 4 && !self.eof {
            self.fill()?;
        }
        let (detected, bom_len) = LineEncoding::detect(&self.buf[self.pos..self.filled]);
        let encoding = if bom_len == 0 {
            self.sniff_default
        } else {
            trace!(?detected, "byte order mark detected");
            detected
        };
        self.pos += bom_len;
        self.needs_sniff = false;
        self.set_encoding(encoding);
        if self.changeset_boundary.is_none() {
            self.batch_encoding = encoding;
        }
        Ok(())
    }

    fn set_encoding(&mut self, encoding: LineEncoding) {
        self.encoding = encoding;
        self.rebuild_scanner();
    }

    fn rebuild_scanner(&mut self) {
        self.scanner = BoundaryScanner::new(
            &self.batch_boundary,
            self.changeset_boundary.as_ref(),
            self.encoding,
        );
    }

    /// Read one logical line, stopping early once `limit` bytes of
    /// content have accumulated without a line feed.
    fn read_line_core(&mut self, limit: usize) -> EnvelopeResult<RawLine> {
        self.maybe_sniff()?;
        let width = self.encoding.unit_width();
        let mut acc: Vec<u8> = Vec::new();
        loop {
            if self.pos == self.filled {
                if self.eof {
                    if acc.is_empty() {
                        return Ok(RawLine::End);
                    }
                    return Ok(RawLine::Line {
                        content: acc,
                        terminator: Vec::new(),
                    });
                }
                self.fill()?;
                continue;
            }
            let found = self
                .encoding
                .find_line_feed(&self.buf[self.pos..self.filled]);
            if let Some(lf) = found {
                acc.extend_from_slice(&self.buf[self.pos..self.pos + lf]);
                self.pos += lf + width;
                let cr = self.encoding.carriage_return();
                let mut terminator = Vec::with_capacity(cr.len() + width);
                if acc.ends_with(cr) {
                    acc.truncate(acc.len() - cr.len());
                    terminator.extend_from_slice(cr);
                }
                terminator.extend_from_slice(self.encoding.line_feed());
                return Ok(RawLine::Line {
                    content: acc,
                    terminator,
                });
            }
            let complete = (self.available_len() / width) * width;
            if complete == 0 {
                // A partial code unit is waiting for more data.
                if self.eof {
                    acc.extend_from_slice(&self.buf[self.pos..self.filled]);
                    self.pos = self.filled;
                    return Ok(RawLine::Line {
                        content: acc,
                        terminator: Vec::new(),
                    });
                }
                self.fill()?;
                continue;
            }
            acc.extend_from_slice(&self.buf[self.pos..self.pos + complete]);
            self.pos += complete;
            if acc.len() >= limit {
                return Ok(RawLine::Overflow(acc));
            }
        }
    }

    fn read_decoded_line(&mut self) -> EnvelopeResult<Option<String>> {
        match self.read_line_core(MAX_HEADER_LINE_BYTES)? {
            RawLine::End => Ok(None),
            RawLine::Overflow(_) => Err(EnvelopeError::invalid_header(format!(
                "header line exceeds {MAX_HEADER_LINE_BYTES} bytes"
            ))),
            RawLine::Line { content, .. } => self.encoding.decode(&content).map(Some),
        }
    }

    // ---- boundary handling -------------------------------------------

    /// Read lines until one classifies as a boundary.
    ///
    /// With `allow_preamble` any non-boundary line is skipped; otherwise
    /// only blank lines are tolerated, so this also accepts a single
    /// line break between length-framed content and the next boundary.
    fn seek_boundary(&mut self, allow_preamble: bool) -> EnvelopeResult<BoundaryMatch> {
        let mut continuation = false;
        loop {
            match self.read_line_core(MAX_BOUNDARY_LINE_BYTES)? {
                RawLine::End => return Err(EnvelopeError::UnexpectedEof),
                RawLine::Overflow(content) => {
                    if !allow_preamble {
                        return Err(EnvelopeError::unexpected_content(format!(
                            "expected a boundary line, found {}",
                            preview(&content)
                        )));
                    }
                    continuation = true;
                }
                RawLine::Line { content, .. } => {
                    if continuation {
                        // Tail of an overlong preamble line; not a line start.
                        continuation = false;
                        continue;
                    }
                    if let Some(matched) = self.scanner.classify(&content) {
                        return Ok(matched);
                    }
                    if allow_preamble || content.is_empty() {
                        continue;
                    }
                    return Err(EnvelopeError::unexpected_content(format!(
                        "expected a boundary line, found {}",
                        preview(&content)
                    )));
                }
            }
        }
    }

    fn apply_match(&mut self, matched: BoundaryMatch) -> EnvelopeResult<bool> {
        match matched {
            BoundaryMatch::ChangeSet { terminal } => {
                if terminal {
                    self.close_changeset();
                    Ok(true)
                } else {
                    self.read_part()?;
                    Ok(true)
                }
            }
            BoundaryMatch::Batch { terminal } => {
                if self.changeset_boundary.is_some() {
                    return Err(EnvelopeError::changeset_violation(
                        "batch boundary inside an open changeset",
                    ));
                }
                if terminal {
                    self.finish_batch()?;
                    Ok(false)
                } else {
                    self.read_part()?;
                    Ok(true)
                }
            }
        }
    }

    fn close_changeset(&mut self) {
        self.changeset_boundary = None;
        self.state = BatchState::EndChangeSet;
        self.framing = Framing::None;
        let encoding = self.batch_encoding;
        self.set_encoding(encoding);
        debug!("changeset closed");
    }

    fn finish_batch(&mut self) -> EnvelopeResult<()> {
        let mut trailing = self.available_len();
        if trailing == 0 && !self.eof {
            self.fill()?;
            trailing = self.available_len();
        }
        if trailing > 0 {
            return Err(EnvelopeError::TrailingData { trailing });
        }
        self.state = BatchState::EndBatch;
        debug!("batch ended");
        Ok(())
    }

    // ---- part parsing ------------------------------------------------

    fn read_part(&mut self) -> EnvelopeResult<()> {
        self.part_headers.clear();
        self.op_headers.clear();
        self.request_line = None;
        self.status_line = None;
        self.carry.clear();
        self.carry_pos = 0;
        self.held.clear();
        self.line_overflow = false;

        let first = self
            .read_decoded_line()?
            .ok_or(EnvelopeError::UnexpectedEof)?;

        let start_text = if StartLine::sniff(&first) {
            // Tolerated short form: the part opens directly with the
            // HTTP-style start line.
            first
        } else {
            let mut line = first;
            while !line.is_empty() {
                self.part_headers.parse_line(&line)?;
                line = self
                    .read_decoded_line()?
                    .ok_or(EnvelopeError::UnexpectedEof)?;
            }
            let content_type = self
                .part_headers
                .content_type()
                .ok_or_else(|| EnvelopeError::invalid_header("part has no Content-Type"))?
                .to_string();
            if let Some(token) = headers::multipart_boundary(&content_type)? {
                return self.open_changeset(token);
            }
            let (base, _) = headers::parse_media_type(&content_type)?;
            if base != MIME_APPLICATION_HTTP {
                return Err(EnvelopeError::invalid_header(format!(
                    "unexpected part Content-Type {content_type:?}"
                )));
            }
            match self.part_headers.get(CONTENT_TRANSFER_ENCODING) {
                Some(te) if te.eq_ignore_ascii_case(TRANSFER_ENCODING_BINARY) => {}
                Some(te) => {
                    return Err(EnvelopeError::invalid_header(format!(
                        "unsupported transfer encoding {te:?}"
                    )))
                }
                None => {
                    return Err(EnvelopeError::invalid_header(
                        "part is missing Content-Transfer-Encoding",
                    ))
                }
            }
            self.read_decoded_line()?
                .ok_or(EnvelopeError::UnexpectedEof)?
        };

        match StartLine::parse(&start_text)? {
            StartLine::Request(line) => {
                self.check_mode(Mode::Request)?;
                let in_changeset = self.changeset_boundary.is_some();
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
                self.state = line.method.to_state();
                self.request_line = Some(line);
            }
            StartLine::Response(line) => {
                self.check_mode(Mode::Response)?;
                self.state = if self.changeset_boundary.is_some() {
                    BatchState::ChangeResponse
                } else {
                    BatchState::GetResponse
                };
                self.status_line = Some(line);
            }
        }

        loop {
            let line = self
                .read_decoded_line()?
                .ok_or(EnvelopeError::UnexpectedEof)?;
            if line.is_empty() {
                break;
            }
            self.op_headers.parse_line(&line)?;
        }

        let declared = match self.op_headers.content_length()? {
            Some(n) => Some(n),
            None => self.part_headers.content_length()?,
        };
        match declared {
            Some(n) => {
                if n > 0 && !self.state.allows_content() {
                    return Err(EnvelopeError::unexpected_content(format!(
                        "{:?} operation declares a {n}-byte body",
                        self.state
                    )));
                }
                self.framing = Framing::Length { remaining: n };
            }
            None => {
                self.framing = Framing::Delimited { done: false };
            }
        }
        debug!(state = ?self.state, "positioned on operation");
        Ok(())
    }

    fn open_changeset(&mut self, token: String) -> EnvelopeResult<()> {
        if self.changeset_boundary.is_some() {
            return Err(EnvelopeError::changeset_violation(
                "changeset opened inside a changeset",
            ));
        }
        if self.changeset_seen {
            return Err(EnvelopeError::changeset_violation(
                "batch contains a second changeset",
            ));
        }
        // The group may declare its own length; members are framed by
        // the changeset boundary regardless, so only validate it.
        let _ = self.part_headers.content_length()?;
        let boundary = Boundary::new(token)?;
        self.changeset_seen = true;
        self.changeset_boundary = Some(boundary);
        self.rebuild_scanner();
        self.sniff_default = self.batch_encoding;
        self.needs_sniff = true;
        self.state = BatchState::BeginChangeSet;
        self.framing = Framing::None;
        debug!("changeset opened");
        Ok(())
    }

    fn check_mode(&mut self, mode: Mode) -> EnvelopeResult<()> {
        match self.mode {
            None => {
                self.mode = Some(mode);
                Ok(())
            }
            Some(existing) if existing == mode => Ok(()),
            Some(_) => Err(EnvelopeError::invalid_start_line(
                "request and response parts mixed in one batch",
            )),
        }
    }

    // ---- content handling --------------------------------------------

    fn finish_current_content(&mut self) -> EnvelopeResult<()> {
        match self.framing {
            Framing::None => Ok(()),
            Framing::Length { remaining } => {
                self.discard_exact(remaining)?;
                self.framing = Framing::None;
                Ok(())
            }
            Framing::Delimited { done } => {
                self.carry.clear();
                self.carry_pos = 0;
                if !done {
                    if self.state.allows_content() {
                        while self.delimited_read_step()?.is_some() {}
                    } else {
                        self.drain_bodiless()?;
                    }
                }
                self.framing = Framing::None;
                Ok(())
            }
        }
    }

    fn discard_exact(&mut self, mut count: u64) -> EnvelopeResult<()> {
        while count > 0 {
            if self.pos == self.filled {
                if self.eof {
                    return Err(EnvelopeError::UnexpectedEof);
                }
                self.fill()?;
                continue;
            }
            let take = count.min(self.available_len() as u64) as usize;
            self.pos += take;
            count -= take as u64;
        }
        Ok(())
    }

    fn drain_bodiless(&mut self) -> EnvelopeResult<()> {
        loop {
            match self.delimited_read_step()? {
                None => return Ok(()),
                Some(_) => {
                    return Err(EnvelopeError::unexpected_content(format!(
                        "{:?} operation carries content",
                        self.state
                    )))
                }
            }
        }
    }

    /// Produce the next chunk of delimiter-framed content, or `None`
    /// once the closing boundary has been consumed.
    ///
    /// The line terminator before a content line is withheld until the
    /// next line proves to be content too; the terminator immediately
    /// before the boundary belongs to the boundary and is dropped.
    fn delimited_read_step(&mut self) -> EnvelopeResult<Option<Vec<u8>>> {
        loop {
            if matches!(self.framing, Framing::Delimited { done: true }) {
                return Ok(None);
            }
            match self.read_line_core(MAX_BOUNDARY_LINE_BYTES)? {
                RawLine::End => return Err(EnvelopeError::UnexpectedEof),
                RawLine::Overflow(chunk) => {
                    // Too long to be a boundary line; emit eagerly.
                    self.line_overflow = true;
                    let mut out = std::mem::take(&mut self.held);
                    out.extend_from_slice(&chunk);
                    return Ok(Some(out));
                }
                RawLine::Line {
                    content,
                    terminator,
                } => {
                    if !self.line_overflow {
                        if let Some(matched) = self.scanner.classify(&content) {
                            self.held.clear();
                            self.pending = Some(matched);
                            self.framing = Framing::Delimited { done: true };
                            return Ok(None);
                        }
                    }
                    if terminator.is_empty() {
                        // Stream ended without the closing boundary.
                        return Err(EnvelopeError::UnexpectedEof);
                    }
                    self.line_overflow = false;
                    let mut out = std::mem::take(&mut self.held);
                    out.extend_from_slice(&content);
                    self.held = terminator;
                    if out.is_empty() {
                        continue;
                    }
                    return Ok(Some(out));
                }
            }
        }
    }

    fn content_read(&mut self, out: &mut [u8]) -> EnvelopeResult<usize> {
        if out.is_empty() {
            return Ok(0);
        }
        match self.framing {
            Framing::None => Ok(0),
            Framing::Length { remaining } => {
                if remaining == 0 {
                    return Ok(0);
                }
                while self.pos == self.filled {
                    if self.eof {
                        return Err(EnvelopeError::UnexpectedEof);
                    }
                    self.fill()?;
                }
                let take = remaining
                    .min(self.available_len() as u64)
                    .min(out.len() as u64) as usize;
                out[..take].copy_from_slice(&self.buf[self.pos..self.pos + take]);
                self.pos += take;
                self.framing = Framing::Length {
                    remaining: remaining - take as u64,
                };
                Ok(take)
            }
            Framing::Delimited { .. } => loop {
                if self.carry_pos < self.carry.len() {
                    let take = out.len().min(self.carry.len() - self.carry_pos);
                    out[..take].copy_from_slice(&self.carry[self.carry_pos..self.carry_pos + take]);
                    self.carry_pos += take;
                    return Ok(take);
                }
                match self.delimited_read_step()? {
                    Some(chunk) => {
                        self.carry = chunk;
                        self.carry_pos = 0;
                    }
                    None => return Ok(0),
                }
            },
        }
    }
}

/// Borrowed reader over the current operation's content.
///
/// Reading past the end of the content yields zero without consuming
/// the boundary that follows it; the owning [`BatchReader`] handles the
/// boundary on its next advance.
pub struct ContentStream<'a, R: Read> {
    reader: &'a mut BatchReader<R>,
}

impl<R: Read> Read for ContentStream<'_, R> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        self.reader.content_read(out).map_err(|err| match err {
            EnvelopeError::Io(e) => e,
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        })
    }
}

fn preview(content: &[u8]) -> String {
    let end = content.len().min(48);
    format!("{:?}", String::from_utf8_lossy(&content[..end]))
}

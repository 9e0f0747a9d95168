//! Payload text encoding detection and line decoding.
//!
//! A batch payload announces its text encoding through an optional byte
//! order mark. Detection runs once per batch and once per changeset;
//! header and boundary lines are decoded with the detected encoding while
//! operation bodies pass through as raw bytes.

use memchr::memchr;

use crate::error::{EnvelopeError, EnvelopeResult};

/// Text encoding of header and boundary lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEncoding {
    /// 7-bit text. The default when no byte order mark is present.
    Ascii,
    /// UTF-8, selected by its byte order mark.
    Utf8,
    /// UTF-16 little-endian.
    Utf16Le,
    /// UTF-16 big-endian.
    Utf16Be,
    /// UTF-32 little-endian.
    Utf32Le,
    /// UTF-32 big-endian.
    Utf32Be,
}

impl LineEncoding {
    /// Detect the encoding from the first bytes of a payload.
    ///
    /// Returns the encoding and the length of the byte order mark to
    /// skip. Longer marks are tested first so the UTF-32 little-endian
    /// mark is not mistaken for its UTF-16 prefix.
    #[must_use]
    pub fn detect(prefix: &[u8]) -> (Self, usize) {
        if prefix.starts_with(&[0xFF, 0xFE, 0x00, 0x00]) {
            (Self::Utf32Le, 4)
        } else if prefix.starts_with(&[0x00, 0x00, 0xFE, 0xFF]) {
            (Self::Utf32Be, 4)
        } else if prefix.starts_with(&[0xEF, 0xBB, 0xBF]) {
            (Self::Utf8, 3)
        } else if prefix.starts_with(&[0xFF, 0xFE]) {
            (Self::Utf16Le, 2)
        } else if prefix.starts_with(&[0xFE, 0xFF]) {
            (Self::Utf16Be, 2)
        } else {
            (Self::Ascii, 0)
        }
    }

    /// Width in bytes of one code unit.
    #[must_use]
    pub const fn unit_width(self) -> usize {
        match self {
            Self::Ascii | Self::Utf8 => 1,
            Self::Utf16Le | Self::Utf16Be => 2,
            Self::Utf32Le | Self::Utf32Be => 4,
        }
    }

    /// The encoded bytes of a line feed.
    #[must_use]
    pub const fn line_feed(self) -> &'static [u8] {
        match self {
            Self::Ascii | Self::Utf8 => &[0x0A],
            Self::Utf16Le => &[0x0A, 0x00],
            Self::Utf16Be => &[0x00, 0x0A],
            Self::Utf32Le => &[0x0A, 0x00, 0x00, 0x00],
            Self::Utf32Be => &[0x00, 0x00, 0x00, 0x0A],
        }
    }

    /// The encoded bytes of a carriage return.
    #[must_use]
    pub const fn carriage_return(self) -> &'static [u8] {
        match self {
            Self::Ascii | Self::Utf8 => &[0x0D],
            Self::Utf16Le => &[0x0D, 0x00],
            Self::Utf16Be => &[0x00, 0x0D],
            Self::Utf32Le => &[0x0D, 0x00, 0x00, 0x00],
            Self::Utf32Be => &[0x00, 0x00, 0x00, 0x0D],
        }
    }

    /// Find the byte offset of the first line feed unit, scanning only
    /// complete code units.
    #[must_use]
    pub fn find_line_feed(self, buf: &[u8]) -> Option<usize> {
        let width = self.unit_width();
        if width == 1 {
            return memchr(0x0A, buf);
        }
        let needle = self.line_feed();
        buf.chunks_exact(width)
            .position(|unit| unit == needle)
            .map(|i| i * width)
    }

    /// Encode an ASCII string into this encoding.
    ///
    /// Used to build boundary needles; boundary tokens are validated to
    /// be ASCII before this is called. Non-ASCII characters are mapped
    /// through their low byte which never occurs for validated input.
    #[must_use]
    pub fn encode_ascii(self, text: &str) -> Vec<u8> {
        let width = self.unit_width();
        if width == 1 {
            return text.as_bytes().to_vec();
        }
        let mut out = Vec::with_capacity(text.len() * width);
        for &b in text.as_bytes() {
            match self {
                Self::Utf16Le => out.extend_from_slice(&[b, 0x00]),
                Self::Utf16Be => out.extend_from_slice(&[0x00, b]),
                Self::Utf32Le => out.extend_from_slice(&[b, 0x00, 0x00, 0x00]),
                Self::Utf32Be => out.extend_from_slice(&[0x00, 0x00, 0x00, b]),
                Self::Ascii | Self::Utf8 => unreachable!(),
            }
        }
        out
    }

    /// Decode a complete line (without its terminator) into text.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not valid in this encoding, or
    /// for [`LineEncoding::Ascii`] if any byte is outside 7-bit range.
    pub fn decode(self, bytes: &[u8]) -> EnvelopeResult<String> {
        match self {
            Self::Ascii => {
                if let Some(bad) = bytes.iter().find(|b| !b.is_ascii()) {
                    return Err(EnvelopeError::invalid_encoding(format!(
                        "byte 0x{bad:02X} outside 7-bit range without a byte order mark"
                    )));
                }
                // All bytes verified ASCII above.
                Ok(String::from_utf8_lossy(bytes).into_owned())
            }
            Self::Utf8 => std::str::from_utf8(bytes)
                .map(str::to_owned)
                .map_err(|e| EnvelopeError::invalid_encoding(format!("invalid UTF-8: {e}"))),
            Self::Utf16Le | Self::Utf16Be => {
                if bytes.len() % 2 != 0 {
                    return Err(EnvelopeError::invalid_encoding(
                        "UTF-16 line has an odd byte count",
                    ));
                }
                let units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|pair| {
                        if self == Self::Utf16Le {
                            u16::from_le_bytes([pair[0], pair[1]])
                        } else {
                            u16::from_be_bytes([pair[0], pair[1]])
                        }
                    })
                    .collect();
                String::from_utf16(&units)
                    .map_err(|e| EnvelopeError::invalid_encoding(format!("invalid UTF-16: {e}")))
            }
            Self::Utf32Le | Self::Utf32Be => {
                if bytes.len() % 4 != 0 {
                    return Err(EnvelopeError::invalid_encoding(
                        "UTF-32 line has a partial code unit",
                    ));
                }
                let mut out = String::with_capacity(bytes.len() / 4);
                for quad in bytes.chunks_exact(4) {
                    let unit = if self == Self::Utf32Le {
                        u32::from_le_bytes([quad[0], quad[1], quad[2], quad[3]])
                    } else {
                        u32::from_be_bytes([quad[0], quad[1], quad[2], quad[3]])
                    };
                    let ch = char::from_u32(unit).ok_or_else(|| {
                        EnvelopeError::invalid_encoding(format!(
                            "invalid UTF-32 code point 0x{unit:08X}"
                        ))
                    })?;
                    out.push(ch);
                }
                Ok(out)
            }
        }
    }
}

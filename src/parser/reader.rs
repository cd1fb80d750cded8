//! Forward-only line cursor shared by the parsing stages.
//!
//! The header classifier, wrapper scanner and original extractor all pull
//! from the same [`MessageReader`], so each stage starts exactly where the
//! previous one stopped. There is no rewinding.

use std::io::BufRead;

use super::decode::{decode_line, LineEncoding};
use crate::error::{ExtractError, Result};

/// One line of the message stream: the raw bytes (terminator included) and
/// their decoded text.
#[derive(Debug, Clone)]
pub struct Line {
    raw: Vec<u8>,
    text: String,
    encoding: LineEncoding,
}

impl Line {
    fn new(raw: Vec<u8>) -> Self {
        let (text, encoding) = decode_line(&raw);
        let text = text.into_owned();
        Self {
            raw,
            text,
            encoding,
        }
    }

    /// Raw bytes as read, including the `\n` / `\r\n` terminator if any.
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    /// Decoded text, terminator included.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Which of the two encodings produced [`Line::text`].
    pub fn encoding(&self) -> LineEncoding {
        self.encoding
    }
}

/// Reads a message line by line, splitting on `\n`.
pub struct MessageReader<R> {
    inner: R,
    source: String,
    line_number: u64,
}

impl<R: BufRead> MessageReader<R> {
    /// Wrap a buffered reader. `source` names it in error messages.
    pub fn new(inner: R, source: impl Into<String>) -> Self {
        Self {
            inner,
            source: source.into(),
            line_number: 0,
        }
    }

    /// Next line, or `None` at end of stream.
    pub fn next_line(&mut self) -> Result<Option<Line>> {
        let mut buf = Vec::with_capacity(128);
        let n = self
            .inner
            .read_until(b'\n', &mut buf)
            .map_err(|e| ExtractError::io(&self.source, e))?;
        if n == 0 {
            return Ok(None);
        }
        self.line_number += 1;
        Ok(Some(Line::new(buf)))
    }

    /// Number of lines consumed so far.
    pub fn line_number(&self) -> u64 {
        self.line_number
    }
}

//! Per-line text decoding with a single ISO-8859-1 fallback.

use std::borrow::Cow;

/// The encoding a line was decoded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEncoding {
    /// The line was valid UTF-8.
    Utf8,
    /// The line was not valid UTF-8 and was read as ISO-8859-1.
    Latin1,
}

impl LineEncoding {
    /// Encode `text` back into the bytes this encoding would have produced.
    ///
    /// Text that came from [`decode_line`] round-trips exactly.
    pub fn encode(self, text: &str) -> Cow<'_, [u8]> {
        match self {
            Self::Utf8 => Cow::Borrowed(text.as_bytes()),
            Self::Latin1 => encoding_rs::mem::encode_latin1_lossy(text),
        }
    }
}

/// Decode one raw line: UTF-8 first, then ISO-8859-1.
///
/// ISO-8859-1 maps every byte to a code point, so this never fails and
/// there is no third attempt.
pub fn decode_line(bytes: &[u8]) -> (Cow<'_, str>, LineEncoding) {
    match std::str::from_utf8(bytes) {
        Ok(s) => (Cow::Borrowed(s), LineEncoding::Utf8),
        Err(_) => (encoding_rs::mem::decode_latin1(bytes), LineEncoding::Latin1),
    }
}

/// Strip a trailing `\n` or `\r\n` from decoded text.
pub fn trim_line_ending(text: &str) -> &str {
    let text = text.strip_suffix('\n').unwrap_or(text);
    text.strip_suffix('\r').unwrap_or(text)
}

/// True for a line holding nothing but whitespace (including its terminator).
pub fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

//! Copy the embedded original out of a report.
//!
//! Lines are written byte-for-byte, except `Message-ID`, which is replaced by
//! a fresh ID plus an `X-Original-Message-ID` header, and the closing MIME
//! delimiter, where copying stops.

use std::io::{BufRead, Write};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::decode::trim_line_ending;
use super::reader::MessageReader;
use crate::error::{ExtractError, Result};
use crate::export::eml::Stamp;

static MESSAGE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?i:Message-ID): <(.*)>$").expect("valid message-id regex"));

/// How the `Message-ID` header of the original is rewritten.
///
/// Redelivering the exact same ID would let the mail store drop the message
/// as a duplicate of the report, so the new ID gets `.<stamp>.<domain>`
/// appended inside the angle brackets.
#[derive(Debug, Clone, Copy)]
pub struct MessageIdRewrite<'a> {
    pub stamp: &'a Stamp,
    pub domain: &'a str,
}

impl MessageIdRewrite<'_> {
    /// The two replacement header lines for an original ID, CRLF terminated.
    pub fn headers(&self, id: &str) -> String {
        format!(
            "Message-ID: <{id}.{stamp}.{domain}>\r\nX-Original-Message-ID: <{id}>\r\n",
            stamp = self.stamp,
            domain = self.domain
        )
    }
}

/// What [`OriginalExtractor::copy`] saw.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopySummary {
    /// Lines read from the original (rewritten ones included, delimiter excluded).
    pub lines: u64,
    /// The original `Message-ID` value, without angle brackets.
    pub message_id: Option<String>,
    /// Copying stopped at the MIME delimiter rather than end of stream.
    pub hit_boundary: bool,
}

/// Copies the original message from a positioned [`MessageReader`].
pub struct OriginalExtractor<'a> {
    delimiter: Option<String>,
    rewrite: MessageIdRewrite<'a>,
}

impl<'a> OriginalExtractor<'a> {
    /// `boundary` is the report's MIME boundary token, if one was found.
    /// Without it the copy runs to end of stream.
    pub fn new(boundary: Option<&str>, rewrite: MessageIdRewrite<'a>) -> Self {
        Self {
            delimiter: boundary.map(|b| format!("--{b}")),
            rewrite,
        }
    }

    /// Copy lines into `out` until the delimiter or end of stream.
    ///
    /// `dest` only names the output in error messages.
    pub fn copy<R: BufRead, W: Write>(
        &self,
        reader: &mut MessageReader<R>,
        out: &mut W,
        dest: &Path,
    ) -> Result<CopySummary> {
        let mut summary = CopySummary::default();

        while let Some(line) = reader.next_line()? {
            let text = line.text();
            if let Some(ref delimiter) = self.delimiter {
                if text.starts_with(delimiter.as_str()) {
                    summary.hit_boundary = true;
                    break;
                }
            }
            summary.lines += 1;

            let written = match message_id(text) {
                Some(id) => {
                    debug!(message_id = id, "Rewriting Message-ID");
                    let headers = self.rewrite.headers(id);
                    let result = out.write_all(&line.encoding().encode(&headers));
                    summary.message_id = Some(id.to_string());
                    result
                }
                None => out.write_all(line.raw()),
            };
            written.map_err(|e| ExtractError::io(dest, e))?;
        }

        Ok(summary)
    }
}

/// The ID inside `Message-ID: <...>`, header name matched case-insensitively.
pub fn message_id(text: &str) -> Option<&str> {
    MESSAGE_ID_RE
        .captures(trim_line_ending(text))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

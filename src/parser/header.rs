//! Top-level header scan: spam subject detection and MIME boundary capture.

use std::io::BufRead;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, trace};

use super::decode::{is_blank, trim_line_ending};
use super::reader::MessageReader;
use crate::error::Result;

/// Subject prefix the spam filter puts on reports.
pub const SPAM_SUBJECT_PREFIX: &str = "Subject: [SPAM]";

static BOUNDARY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^Content-Type: .+?; boundary="(.+?)"$"#).expect("valid boundary regex")
});

/// Facts gathered from the header block of a report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSummary {
    /// A `Subject: [SPAM]` line was seen.
    pub is_spam: bool,
    /// The last `boundary="..."` token from a `Content-Type` header.
    pub boundary: Option<String>,
}

/// Consume header lines up to and including the first blank line.
///
/// Only the first spam subject sets the flag; the last matching
/// `Content-Type` wins. A stream with no blank line returns whatever was
/// collected before end of stream.
pub fn classify_headers<R: BufRead>(reader: &mut MessageReader<R>) -> Result<HeaderSummary> {
    let mut summary = HeaderSummary::default();

    while let Some(line) = reader.next_line()? {
        let text = line.text();
        if is_blank(text) {
            debug!(
                line = reader.line_number(),
                is_spam = summary.is_spam,
                boundary = ?summary.boundary,
                "End of headers"
            );
            return Ok(summary);
        }

        if !summary.is_spam && text.starts_with(SPAM_SUBJECT_PREFIX) {
            summary.is_spam = true;
        } else if let Some(token) = boundary_token(text) {
            trace!(boundary = token, "Captured MIME boundary");
            summary.boundary = Some(token.to_string());
        }
    }

    debug!("Headers ended without a blank line");
    Ok(summary)
}

/// Extract the boundary token from a `Content-Type: <type>; boundary="<token>"` line.
pub fn boundary_token(text: &str) -> Option<&str> {
    BOUNDARY_RE
        .captures(trim_line_ending(text))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

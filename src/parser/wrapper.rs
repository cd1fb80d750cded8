//! Skip the report's own text until the embedded original message part.

use std::io::BufRead;

use tracing::debug;

use super::decode::is_blank;
use super::reader::MessageReader;
use crate::error::Result;

/// Part header that introduces the untouched original inside a report.
pub const ORIGINAL_MARKER: &str = "Content-Type: message/rfc822; x-spam-type=original";

/// Advance past the original-message marker and the part headers after it.
///
/// Returns `false` when the stream ends before the marker shows up. On
/// `true` the reader is positioned at the first line of the original.
pub fn seek_original<R: BufRead>(reader: &mut MessageReader<R>) -> Result<bool> {
    let mut found = false;
    while let Some(line) = reader.next_line()? {
        if line.text().starts_with(ORIGINAL_MARKER) {
            found = true;
            break;
        }
    }
    if !found {
        debug!("No original message part in report");
        return Ok(false);
    }
    debug!(line = reader.line_number(), "Found original message part");

    // Part headers (Content-Description, Content-Disposition, ...)
    while let Some(line) = reader.next_line()? {
        if is_blank(line.text()) {
            break;
        }
    }
    Ok(true)
}

//! One report in, at most one extracted message out.
//!
//! The processor drives the parsing stages over a single [`MessageReader`]:
//!
//! ```text
//! START → HEADERS_DONE ─┬─ not spam ──────────────────────────────→ NotSpam
//!                       └─ spam → SEARCHING_ORIGINAL ─┬─ not found → NoOriginal
//!                                                    └─ found → EXTRACTING → Extracted(path)
//! ```
//!
//! Malformed reports never produce an error; only I/O failures do.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::DEFAULT_MESSAGE_ID_DOMAIN;
use crate::error::{ExtractError, Result};
use crate::export::eml::{create_eml, Stamp};
use crate::parser::header::classify_headers;
use crate::parser::original::{MessageIdRewrite, OriginalExtractor};
use crate::parser::reader::MessageReader;
use crate::parser::wrapper::seek_original;

/// Size of the read buffer for report files.
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Where and how extracted messages are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Directory for extracted `.eml` files.
    pub output_dir: PathBuf,
    /// Domain appended to rewritten `Message-ID` values.
    pub message_id_domain: String,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            output_dir: std::env::temp_dir(),
            message_id_domain: DEFAULT_MESSAGE_ID_DOMAIN.to_string(),
        }
    }
}

/// Outcome of processing one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    /// The subject carries no spam marker.
    NotSpam,
    /// A spam report, but without an embedded original part.
    NoOriginal,
    /// The original was written to this file.
    Extracted(PathBuf),
}

impl Extraction {
    /// Path of the extracted message, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Extracted(p) => Some(p),
            _ => None,
        }
    }

    pub fn into_path(self) -> Option<PathBuf> {
        match self {
            Self::Extracted(p) => Some(p),
            _ => None,
        }
    }
}

/// Something that turns a mail file into an [`Extraction`].
///
/// The watch loop is generic over this so it can run without touching disk.
pub trait Extract {
    fn extract(&self, path: &Path) -> Result<Extraction>;
}

/// Extracts the original message from spam reports.
#[derive(Debug, Clone, Default)]
pub struct MailProcessor {
    options: ExtractOptions,
}

impl MailProcessor {
    pub fn new(options: ExtractOptions) -> Self {
        Self { options }
    }

    /// Process the mail file at `path`.
    pub fn process(&self, path: &Path) -> Result<Extraction> {
        let file = File::open(path).map_err(|e| ExtractError::open(path, e))?;
        let reader = BufReader::with_capacity(READ_BUFFER_SIZE, file);
        self.process_reader(reader, &path.display().to_string(), &Stamp::now())
    }

    /// Process a report from any buffered source.
    ///
    /// `source` names the input in logs and errors. `stamp` is used both for
    /// the output file name and the rewritten `Message-ID`.
    pub fn process_reader<R: BufRead>(
        &self,
        input: R,
        source: &str,
        stamp: &Stamp,
    ) -> Result<Extraction> {
        let mut reader = MessageReader::new(input, source);

        let headers = classify_headers(&mut reader)?;
        if !headers.is_spam {
            debug!(source, "Not a spam report");
            return Ok(Extraction::NotSpam);
        }

        if !seek_original(&mut reader)? {
            info!(source, "Spam report without an original message");
            return Ok(Extraction::NoOriginal);
        }

        let (path, file) = create_eml(&self.options.output_dir, stamp)?;
        let rewrite = MessageIdRewrite {
            stamp,
            domain: &self.options.message_id_domain,
        };
        let extractor = OriginalExtractor::new(headers.boundary.as_deref(), rewrite);

        let mut out = BufWriter::new(file);
        let copied = extractor
            .copy(&mut reader, &mut out, &path)
            .and_then(|summary| {
                out.flush().map_err(|e| ExtractError::io(&path, e))?;
                Ok(summary)
            });

        match copied {
            Ok(summary) => {
                debug!(
                    source,
                    output = %path.display(),
                    lines = summary.lines,
                    message_id = ?summary.message_id,
                    hit_boundary = summary.hit_boundary,
                    "Extracted original message"
                );
                Ok(Extraction::Extracted(path))
            }
            Err(e) => {
                drop(out);
                let _ = std::fs::remove_file(&path);
                Err(e)
            }
        }
    }
}

impl Extract for MailProcessor {
    fn extract(&self, path: &Path) -> Result<Extraction> {
        self.process(path)
    }
}

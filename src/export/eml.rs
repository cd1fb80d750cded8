//! Output files for extracted messages.
//!
//! Each extraction gets its own `non-spam-msg-<stamp>.eml` file. Files are
//! created with `create_new`, so an existing file is never overwritten.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::error::{ExtractError, Result};

/// Filename prefix of extracted messages.
pub const FILE_PREFIX: &str = "non-spam-msg-";

/// Filename extension of extracted messages.
pub const FILE_EXTENSION: &str = "eml";

/// Give up after this many name collisions in a row.
const MAX_ATTEMPTS: u32 = 1000;

/// High-resolution timestamp, rendered as `<unix seconds>.<microseconds>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stamp(String);

impl Stamp {
    /// Current wall-clock time.
    pub fn now() -> Self {
        let now = Utc::now();
        Self(format!(
            "{}.{:06}",
            now.timestamp(),
            now.timestamp_subsec_micros()
        ))
    }

    /// A fixed stamp.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Stamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// File name for the `attempt`-th try at a given stamp.
pub fn eml_filename(stamp: &Stamp, attempt: u32) -> String {
    if attempt == 0 {
        format!("{FILE_PREFIX}{stamp}.{FILE_EXTENSION}")
    } else {
        format!("{FILE_PREFIX}{stamp}-{attempt}.{FILE_EXTENSION}")
    }
}

/// Create a fresh output file in `dir`.
///
/// Returns the path and the open handle. If the stamped name is taken, a
/// numeric suffix is added until a free name is found.
pub fn create_eml(dir: &Path, stamp: &Stamp) -> Result<(PathBuf, File)> {
    for attempt in 0..MAX_ATTEMPTS {
        let path = dir.join(eml_filename(stamp, attempt));
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(ExtractError::io(path, e)),
        }
    }
    Err(ExtractError::io(
        dir.join(eml_filename(stamp, 0)),
        io::Error::new(
            ErrorKind::AlreadyExists,
            format!("no free output name after {MAX_ATTEMPTS} attempts"),
        ),
    ))
}

//! Centralized error types for spamextract.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the spamextract library.
///
/// Malformed mail is never an error: a report without a spam subject or
/// without an embedded original is a normal outcome of processing. These
/// variants cover the filesystem, the delivery subprocess and the watcher.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// I/O error with the associated file path.
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The specified file does not exist.
    #[error("Mail file not found: {0}")]
    FileNotFound(PathBuf),

    /// The delivery command could not be started or fed.
    #[error("Failed to run delivery command '{command}': {source}")]
    Delivery {
        command: String,
        source: std::io::Error,
    },

    /// The filesystem watcher failed.
    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),
}

/// Convenience alias for `Result<T, ExtractError>`.
pub type Result<T> = std::result::Result<T, ExtractError>;

impl ExtractError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Like [`ExtractError::io`], but maps `NotFound` to [`ExtractError::FileNotFound`].
    pub fn open(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::FileNotFound(path)
        } else {
            Self::Io { path, source }
        }
    }
}

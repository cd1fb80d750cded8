//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. the `--config` command-line flag
//! 2. `$SPAMEXTRACT_CONFIG` (environment variable)
//! 3. `~/.config/spamextract/config.toml` (Linux/macOS)
//!    `%APPDATA%\spamextract\config.toml` (Windows)
//! 4. Built-in defaults

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::processor::ExtractOptions;
use crate::watch::WatchOptions;

/// Default delivery agent: Dovecot's LDA reads one message from stdin.
pub const DEFAULT_DELIVER_COMMAND: &str = "/usr/lib/dovecot/deliver";

/// Default domain appended to rewritten `Message-ID` values.
pub const DEFAULT_MESSAGE_ID_DOMAIN: &str = "harris.ch";

/// Maildir flag marking a message as trashed.
pub const DEFAULT_DELETED_MARKER: char = 'T';

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// Delivery agent settings.
    pub delivery: DeliveryConfig,
    /// Extraction output settings.
    pub extract: ExtractConfig,
    /// Directory watch settings.
    pub watch: WatchConfig,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
    /// Also write logs to this file.
    pub log_file: Option<PathBuf>,
}

/// Delivery agent settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Program that receives the extracted message on stdin.
    pub command: PathBuf,
    /// Extra arguments for `command`.
    pub args: Vec<String>,
    /// Seconds to pause before each injected delivery.
    pub sleep_secs: u64,
}

/// Extraction output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Directory for extracted `.eml` files (default: system temp dir).
    pub output_dir: Option<PathBuf>,
    /// Domain appended to rewritten `Message-ID` values.
    pub message_id_domain: String,
}

/// Directory watch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Filename suffix of entries already marked for removal.
    pub deleted_marker: char,
    /// Bound on remembered base identifiers (unset = unbounded).
    pub seen_capacity: Option<NonZeroUsize>,
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            command: PathBuf::from(DEFAULT_DELIVER_COMMAND),
            args: Vec::new(),
            sleep_secs: 0,
        }
    }
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            message_id_domain: DEFAULT_MESSAGE_ID_DOMAIN.to_string(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            deleted_marker: DEFAULT_DELETED_MARKER,
            seen_capacity: None,
        }
    }
}

// ── Conversions ─────────────────────────────────────────────────

impl Config {
    /// Options for the mail processor.
    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            output_dir: self
                .extract
                .output_dir
                .clone()
                .unwrap_or_else(std::env::temp_dir),
            message_id_domain: self.extract.message_id_domain.clone(),
        }
    }

    /// Options for the watch loop.
    pub fn watch_options(&self) -> WatchOptions {
        WatchOptions {
            delay: Duration::from_secs(self.delivery.sleep_secs),
            deleted_marker: self.watch.deleted_marker,
            seen_capacity: self.watch.seen_capacity,
        }
    }
}

/// Clamp a signed `--sleep` value to whole seconds; negative values become zero.
pub fn clamp_sleep(secs: i64) -> u64 {
    if secs < 0 {
        tracing::warn!(sleep = secs, "Negative sleep requested, using 0");
    }
    u64::try_from(secs).unwrap_or(0)
}

// ── Load ────────────────────────────────────────────────────────

/// How [`load_config`] arrived at its configuration.
///
/// Loading happens before the log subscriber exists, so the outcome is
/// returned and logged later with [`ConfigReport::log`].
#[derive(Debug)]
pub enum ConfigReport {
    /// No file in the standard locations.
    Defaults,
    /// Parsed from this file.
    Loaded(PathBuf),
    /// An explicitly named file does not exist.
    NotFound(PathBuf),
    /// The file exists but could not be read.
    Unreadable { path: PathBuf, error: String },
    /// The file is not valid TOML for [`Config`].
    Invalid { path: PathBuf, error: String },
}

impl ConfigReport {
    /// Whether defaults were used in place of a file that was asked for or found.
    pub fn fell_back(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::Unreadable { .. } | Self::Invalid { .. }
        )
    }

    /// Emit the outcome through `tracing`.
    pub fn log(&self) {
        match self {
            Self::Defaults => tracing::debug!("No config file, using defaults"),
            Self::Loaded(path) => tracing::info!(path = %path.display(), "Loaded config"),
            Self::NotFound(path) => {
                tracing::warn!(path = %path.display(), "Config file not found, using defaults")
            }
            Self::Unreadable { path, error } => tracing::warn!(
                path = %path.display(),
                error = %error,
                "Failed to read config file, using defaults"
            ),
            Self::Invalid { path, error } => tracing::warn!(
                path = %path.display(),
                error = %error,
                "Failed to parse config, using defaults"
            ),
        }
    }
}

/// Load configuration, searching standard locations.
///
/// An explicit path takes precedence over the search. Returns the default
/// configuration if no file is found or on parse error; the report says which.
pub fn load_config(explicit: Option<&Path>) -> (Config, ConfigReport) {
    let path = match explicit {
        Some(p) => p.to_path_buf(),
        None => match config_file_path() {
            Some(p) => p,
            None => return (Config::default(), ConfigReport::Defaults),
        },
    };

    if !path.exists() {
        let report = if explicit.is_some() {
            ConfigReport::NotFound(path)
        } else {
            ConfigReport::Defaults
        };
        return (Config::default(), report);
    }

    match std::fs::read_to_string(&path) {
        Ok(contents) => match toml::from_str::<Config>(&contents) {
            Ok(cfg) => (cfg, ConfigReport::Loaded(path)),
            Err(e) => (
                Config::default(),
                ConfigReport::Invalid {
                    path,
                    error: e.to_string(),
                },
            ),
        },
        Err(e) => (
            Config::default(),
            ConfigReport::Unreadable {
                path,
                error: e.to_string(),
            },
        ),
    }
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("SPAMEXTRACT_CONFIG") {
        return Some(PathBuf::from(env_path));
    }

    dirs::config_dir().map(|d| d.join("spamextract").join("config.toml"))
}

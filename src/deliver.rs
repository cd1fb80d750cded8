//! Handing extracted messages to the local delivery agent.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::debug;

use crate::config::DEFAULT_DELIVER_COMMAND;
use crate::error::{ExtractError, Result};

/// Exit status of one delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Process exit code; `None` when the agent was killed by a signal.
    pub code: Option<i32>,
}

impl DeliveryReport {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Something that accepts a message file for delivery.
pub trait Deliver {
    /// Deliver the message stored at `message`. Blocks until done.
    fn deliver(&self, message: &Path) -> Result<DeliveryReport>;
}

/// Runs an external program with the message on its standard input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandDelivery {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandDelivery {
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Default for CommandDelivery {
    fn default() -> Self {
        Self::new(DEFAULT_DELIVER_COMMAND, Vec::new())
    }
}

impl Deliver for CommandDelivery {
    fn deliver(&self, message: &Path) -> Result<DeliveryReport> {
        let input = File::open(message).map_err(|e| ExtractError::open(message, e))?;
        debug!(
            command = %self.program.display(),
            message = %message.display(),
            "Running delivery agent"
        );
        let status = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::from(input))
            .status()
            .map_err(|e| ExtractError::Delivery {
                command: self.program.display().to_string(),
                source: e,
            })?;
        Ok(DeliveryReport {
            code: status.code(),
        })
    }
}

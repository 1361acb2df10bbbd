//! Print dispatch.
//!
//! Hands a saved file to the OS print subsystem and reports whether the
//! hand-off was accepted. "Success" means the spooler command exited zero,
//! not that paper came out; there is no completion feedback from the print
//! queue.

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, instrument};

/// Seam between the orchestrator and the OS print subsystem.
///
/// The production implementation is [`SpoolerCommand`]; tests substitute a
/// recording fake.
#[async_trait]
pub trait PrintDispatcher: Send + Sync {
    /// Dispatches the file at `path` to the printer.
    ///
    /// # Errors
    ///
    /// Returns an error if the hand-off to the print subsystem fails.
    async fn dispatch(&self, path: &Path) -> Result<()>;
}

/// Dispatches files by running the configured spooler command with the file
/// path as its single argument (`lp <path>` by default).
#[derive(Debug, Clone)]
pub struct SpoolerCommand {
    command: String,
}

impl SpoolerCommand {
    /// Creates a dispatcher around the given spooler command.
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

#[async_trait]
impl PrintDispatcher for SpoolerCommand {
    #[instrument(name = "printer::dispatch", skip(self), fields(command = %self.command, path = %path.display()))]
    async fn dispatch(&self, path: &Path) -> Result<()> {
        let status = tokio::process::Command::new(&self.command)
            .arg(path)
            .status()
            .await
            .map_err(|source| Error::PrintSpawn {
                command: self.command.clone(),
                source,
            })?;

        if !status.success() {
            return Err(Error::PrintExit {
                command: self.command.clone(),
                status,
            });
        }

        debug!("File handed to print queue");

        Ok(())
    }
}

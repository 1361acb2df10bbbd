//! # mailprint
//!
//! Watches one IMAP mailbox and prints the PDF attachments of unseen
//! messages.
//!
//! Each cycle connects over TLS, searches the mailbox for unseen messages,
//! saves every PDF attachment under an incoming-documents directory, hands
//! each saved file to the OS spooler command, and marks the message seen only
//! when every PDF it carried was handed off successfully. Cycles run on a
//! fixed interval; a failed cycle is logged and the next one retries from a
//! fresh connection.
//!
//! ## Quick Start
//!
//! ```no_run
//! use mailprint::{scheduler, Config, Orchestrator, SpoolerCommand};
//!
//! # async fn example() -> mailprint::Result<()> {
//! let config = Config::builder()
//!     .email("operator@example.com")
//!     .password("app-password")  // Use an app-specific password for Gmail
//!     .build()?;
//!
//! let interval = config.cycle_interval;
//! let printer = Box::new(SpoolerCommand::new(&config.print_command));
//! let orchestrator = Orchestrator::new(config, printer)?;
//!
//! // Runs forever: one cycle now, then one per interval
//! scheduler::run(orchestrator, interval).await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Behavior notes
//!
//! - A message with no PDF attachments is scanned but never flagged, so it is
//!   rescanned on every future cycle.
//! - A message where any attachment fails to print stays unseen; the next
//!   cycle re-saves (overwriting) and re-prints all of its attachments.
//! - "Printed" means the spooler command accepted the file; there is no
//!   physical-print confirmation.
//!
//! ## Observability
//!
//! The crate uses `tracing` for instrumentation. The binary layers a stderr
//! writer with a size-capped rotating log file (see [`logging`]).

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Public modules
pub mod config;
pub mod error;
pub mod known_servers;
pub mod logging;
pub mod message;
pub mod orchestrator;
pub mod printer;
pub mod scheduler;
pub mod spool;

// Internal modules
mod connection;
mod session;

// Re-exports for ergonomic API
pub use config::{Config, ConfigBuilder, LogConfig, TimeoutConfig};
pub use email_address::EmailAddress;
pub use error::{Error, ErrorCategory, Result};
pub use message::{ParsedEmail, PdfAttachment};
pub use orchestrator::{CycleOutcome, MessageOutcome, Orchestrator};
pub use printer::{PrintDispatcher, SpoolerCommand};
pub use spool::Spool;

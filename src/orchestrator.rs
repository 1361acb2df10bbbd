//! The per-cycle orchestration: connect, search, fetch, extract, print, flag.
//!
//! One [`Orchestrator::process_cycle`] call is one complete pass over the
//! mailbox. Connection and authentication failures abort the cycle; a failure
//! on a single message is logged and the remaining messages are still
//! processed. A message is marked seen iff at least one PDF attachment was
//! found and every found attachment was handed to the printer successfully.
//! Nothing escapes `process_cycle`; the scheduler retries on the next tick.

use crate::config::Config;
use crate::connection;
use crate::error::{Error, Result};
use crate::message::{self, ParsedEmail};
use crate::printer::PrintDispatcher;
use crate::session::{self, AuthConfig, ImapSession};
use crate::spool::Spool;
use tokio::time::timeout;
use tracing::{debug, error, info, instrument, warn};

/// Drives one mailbox pass: search unseen, save and print PDF attachments,
/// flag fully-printed messages.
pub struct Orchestrator {
    config: Config,
    spool: Spool,
    printer: Box<dyn PrintDispatcher>,
}

/// Summary of one cycle, for logging and tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleOutcome {
    /// Unseen messages the search returned.
    pub messages_found: usize,
    /// Messages fully processed (fetched and scanned).
    pub messages_processed: usize,
    /// Attachments handed to the printer successfully.
    pub attachments_printed: usize,
    /// Messages flagged seen.
    pub marked_seen: usize,
}

/// Per-message tally of extracted PDFs and failed hand-offs.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MessageOutcome {
    /// PDF attachment candidates found in the message.
    pub pdfs_found: usize,
    /// Candidates that failed to save or print.
    pub failures: usize,
}

impl MessageOutcome {
    /// The seen-flag policy: flag only when the message yielded at least one
    /// PDF and none of them failed. Zero-PDF messages stay unseen and are
    /// rescanned every cycle; partially-failed messages stay unseen and are
    /// fully reprocessed next cycle.
    #[must_use]
    pub fn should_mark_seen(&self) -> bool {
        self.pdfs_found > 0 && self.failures == 0
    }

    /// Attachments successfully handed to the printer.
    #[must_use]
    pub fn printed(&self) -> usize {
        self.pdfs_found - self.failures
    }
}

impl Orchestrator {
    /// Creates an orchestrator and ensures the incoming-documents directory
    /// exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the incoming directory cannot be created.
    pub fn new(config: Config, printer: Box<dyn PrintDispatcher>) -> Result<Self> {
        let spool = Spool::new(&config.incoming_dir);
        spool.ensure_dir()?;

        Ok(Self {
            config,
            spool,
            printer,
        })
    }

    /// Runs one complete cycle. All failures are logged and swallowed; the
    /// next scheduled cycle starts from a fresh connection.
    #[instrument(
        name = "Orchestrator::process_cycle",
        skip(self),
        fields(imap_host = %self.config.effective_imap_host())
    )]
    pub async fn process_cycle(&self) -> CycleOutcome {
        match self.run_cycle().await {
            Ok(outcome) => {
                if outcome.messages_found > 0 {
                    info!(
                        messages = outcome.messages_found,
                        printed = outcome.attachments_printed,
                        marked_seen = outcome.marked_seen,
                        "Cycle complete"
                    );
                }
                outcome
            }
            Err(e) => {
                error!(
                    error = %e,
                    category = %e.category(),
                    retryable = e.is_retryable(),
                    "Cycle aborted"
                );
                CycleOutcome::default()
            }
        }
    }

    /// The fallible cycle body. The session is released on every exit path;
    /// when both the scan and the logout fail, the scan error wins.
    async fn run_cycle(&self) -> Result<CycleOutcome> {
        let mut session = self.open_session().await?;

        let outcome = self.scan_mailbox(&mut session).await;

        let logout = timeout(
            self.config.timeouts.logout,
            session::logout(&mut session),
        )
        .await
        .map_err(|_| Error::LogoutTimeout {
            timeout: self.config.timeouts.logout,
        })
        .and_then(|r| r);

        if let Err(e) = logout {
            warn!(error = %e, "Logout failed");
        }

        outcome
    }

    /// Connects, authenticates, and selects the configured mailbox, each step
    /// under its own timeout.
    async fn open_session(&self) -> Result<ImapSession> {
        let imap_host = self.config.effective_imap_host();
        let target_addr = self.config.server_address();
        let timeouts = &self.config.timeouts;

        let tls_stream = timeout(
            timeouts.connect,
            connection::establish_tls_connection(&imap_host, &target_addr),
        )
        .await
        .map_err(|_| Error::ConnectTimeout {
            target: target_addr.clone(),
            timeout: timeouts.connect,
        })??;

        let auth_config = AuthConfig {
            email: self.config.email(),
            password: self.config.password(),
        };

        let mut session = timeout(timeouts.auth, session::authenticate(tls_stream, &auth_config))
            .await
            .map_err(|_| Error::AuthTimeout {
                email: self.config.email().to_string(),
                timeout: timeouts.auth,
            })??;

        timeout(
            timeouts.select,
            session::select_mailbox(&mut session, &self.config.mailbox),
        )
        .await
        .map_err(|_| Error::SelectTimeout {
            mailbox: self.config.mailbox.clone(),
            timeout: timeouts.select,
        })??;

        debug!(mailbox = %self.config.mailbox, "Session ready");

        Ok(session)
    }

    /// Searches for unseen messages and processes each one sequentially. A
    /// failure on one message does not abort the batch.
    async fn scan_mailbox(&self, session: &mut ImapSession) -> Result<CycleOutcome> {
        let uids = timeout(self.config.timeouts.search, session::search_unseen(session))
            .await
            .map_err(|_| Error::SearchTimeout {
                timeout: self.config.timeouts.search,
            })??;

        let mut outcome = CycleOutcome {
            messages_found: uids.len(),
            ..CycleOutcome::default()
        };

        if uids.is_empty() {
            debug!("No unseen messages");
            return Ok(outcome);
        }

        info!(count = uids.len(), "Found unseen messages");

        for uid in uids {
            match self.process_message(session, uid).await {
                Ok((msg, marked)) => {
                    outcome.messages_processed += 1;
                    outcome.attachments_printed += msg.printed();
                    outcome.marked_seen += usize::from(marked);
                }
                Err(e) => {
                    warn!(
                        uid,
                        error = %e,
                        category = %e.category(),
                        "Failed to process message, continuing with the rest"
                    );
                }
            }
        }

        Ok(outcome)
    }

    /// Fetches, parses, extracts, and prints one message, then applies the
    /// seen-flag policy. Returns the per-message tally and whether the flag
    /// was set.
    async fn process_message(
        &self,
        session: &mut ImapSession,
        uid: u32,
    ) -> Result<(MessageOutcome, bool)> {
        let timeouts = &self.config.timeouts;

        let raw = timeout(timeouts.fetch, session::fetch_message(session, uid))
            .await
            .map_err(|_| Error::FetchTimeout {
                uid,
                timeout: timeouts.fetch,
            })??;

        let Some(raw) = raw else {
            warn!(uid, "Message has no content, skipping");
            return Ok((MessageOutcome::default(), false));
        };

        let email = message::parse_email(&raw)?;

        info!(
            uid,
            sender = email.sender.as_deref().unwrap_or("<unknown>"),
            subject = email.subject.as_deref().unwrap_or("<none>"),
            "Processing message"
        );

        let msg = self.handle_attachments(&email).await;

        if !msg.should_mark_seen() {
            return Ok((msg, false));
        }

        timeout(timeouts.store, session::mark_seen(session, uid))
            .await
            .map_err(|_| Error::StoreTimeout {
                uid,
                timeout: timeouts.store,
            })??;

        info!(uid, "Message marked as seen");

        Ok((msg, true))
    }

    /// Saves and prints each PDF candidate, tallying failures. Runs entirely
    /// against the local spool and printer; no session involved.
    async fn handle_attachments(&self, email: &ParsedEmail) -> MessageOutcome {
        let mut outcome = MessageOutcome {
            pdfs_found: email.pdf_attachments.len(),
            failures: 0,
        };

        for attachment in &email.pdf_attachments {
            info!(filename = %attachment.filename, "PDF attachment found");

            if let Err(e) = self.save_and_print(&attachment.filename, &attachment.data).await {
                warn!(
                    filename = %attachment.filename,
                    error = %e,
                    "Attachment not handed to printer"
                );
                outcome.failures += 1;
            }
        }

        outcome
    }

    async fn save_and_print(&self, filename: &str, data: &[u8]) -> Result<()> {
        let path = self.spool.store(filename, data).await?;
        self.printer.dispatch(&path).await?;
        info!(path = %path.display(), "File sent to print queue");
        Ok(())
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("email", &self.config.email())
            .field("imap_host", &self.config.effective_imap_host())
            .field("spool", &self.spool)
            .finish_non_exhaustive()
    }
}

//! Internal IMAP session management.
//!
//! This module wraps async-imap operations with proper error handling.

use crate::connection::TlsStream;
use crate::error::{Error, Result};
use async_imap::Session;
use futures::StreamExt;
use tracing::{debug, instrument};

/// Type alias for IMAP session over TLS.
pub(crate) type ImapSession = Session<TlsStream>;

/// Authentication configuration for IMAP.
pub(crate) struct AuthConfig<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Authenticates to the IMAP server and returns a session.
#[instrument(
    name = "session::authenticate",
    skip_all,
    fields(email = %config.email)
)]
pub(crate) async fn authenticate(
    tls_stream: TlsStream,
    config: &AuthConfig<'_>,
) -> Result<ImapSession> {
    let client = async_imap::Client::new(tls_stream);

    debug!("Authenticating to IMAP server");

    client
        .login(config.email, config.password)
        .await
        .map_err(|e| Error::ImapLogin {
            email: config.email.to_string(),
            source: e.0,
        })
}

/// Selects a mailbox (typically "INBOX").
#[instrument(name = "session::select", skip(session), fields(mailbox = %mailbox))]
pub(crate) async fn select_mailbox(session: &mut ImapSession, mailbox: &str) -> Result<()> {
    debug!("Selecting mailbox");

    session
        .select(mailbox)
        .await
        .map_err(|source| Error::SelectMailbox {
            mailbox: mailbox.to_string(),
            source,
        })?;

    Ok(())
}

/// Searches the selected mailbox for unseen messages.
///
/// Returns the UIDs sorted ascending, so messages are processed in arrival
/// order.
#[instrument(name = "session::search_unseen", skip(session))]
pub(crate) async fn search_unseen(session: &mut ImapSession) -> Result<Vec<u32>> {
    let uids = session
        .uid_search("UNSEEN")
        .await
        .map_err(|source| Error::ImapSearch { source })?;

    let mut uids: Vec<u32> = uids.into_iter().collect();
    uids.sort_unstable();

    debug!(uid_count = uids.len(), "Searched for unseen messages");

    Ok(uids)
}

/// Fetches the full raw content of one message by UID.
///
/// Returns `None` if the server reported no body for this UID (e.g. the
/// message was expunged between search and fetch).
#[instrument(name = "session::fetch_message", skip(session), fields(uid = uid))]
pub(crate) async fn fetch_message(session: &mut ImapSession, uid: u32) -> Result<Option<Vec<u8>>> {
    let uid_str = uid.to_string();

    let mut stream = session
        .uid_fetch(&uid_str, "BODY[]")
        .await
        .map_err(|source| Error::ImapFetch { uid, source })?;

    let mut raw: Option<Vec<u8>> = None;
    while let Some(item) = stream.next().await {
        let fetch = item.map_err(|source| Error::FetchMessage { source })?;
        if let Some(body) = fetch.body() {
            raw = Some(body.to_vec());
        }
    }

    debug!(found = raw.is_some(), "Fetched message content");

    Ok(raw)
}

/// Sets the \Seen flag on one message.
///
/// The server echoes flag updates on the store stream; the stream must be
/// drained for the command to complete.
#[instrument(name = "session::mark_seen", skip(session), fields(uid = uid))]
pub(crate) async fn mark_seen(session: &mut ImapSession, uid: u32) -> Result<()> {
    let uid_str = uid.to_string();

    let mut stream = session
        .uid_store(&uid_str, "+FLAGS.SILENT (\\Seen)")
        .await
        .map_err(|source| Error::ImapStore { uid, source })?;

    while let Some(item) = stream.next().await {
        item.map_err(|source| Error::ImapStore { uid, source })?;
    }

    debug!("Marked message as seen");

    Ok(())
}

/// Logs out from the IMAP session.
#[instrument(name = "session::logout", skip(session))]
pub(crate) async fn logout(session: &mut ImapSession) -> Result<()> {
    debug!("Logging out");

    session
        .logout()
        .await
        .map_err(|source| Error::ImapLogout { source })?;

    Ok(())
}

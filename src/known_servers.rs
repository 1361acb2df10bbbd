//! IMAP server discovery from email domains.
//!
//! Lets the operator omit `IMAP_SERVER` for common providers: the hostname is
//! derived from the login address, with an `imap.{domain}` fallback for
//! everything else.

use std::collections::HashMap;
use std::sync::LazyLock;

/// Map of email domains to their IMAP server hostnames.
static KNOWN_SERVERS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    let mut m = HashMap::new();

    // Google
    m.insert("gmail.com", "imap.gmail.com");

    // Yahoo
    m.insert("yahoo.com", "imap.mail.yahoo.com");

    // Microsoft
    m.insert("hotmail.com", "imap-mail.outlook.com");
    m.insert("outlook.com", "imap-mail.outlook.com");
    m.insert("live.com", "imap-mail.outlook.com");

    // AOL
    m.insert("aol.com", "imap.aol.com");

    // Apple
    m.insert("icloud.com", "imap.mail.me.com");
    m.insert("me.com", "imap.mail.me.com");
    m.insert("mac.com", "imap.mail.me.com");

    // German providers
    m.insert("web.de", "imap.web.de");
    m.insert("gmx.de", "imap.gmx.net");
    m.insert("gmx.net", "imap.gmx.net");
    m.insert("gmx.com", "imap.gmx.net");
    m.insert("t-online.de", "secureimap.t-online.de");

    m
});

/// Discovers the IMAP hostname for an email address.
///
/// If the domain is known, returns the corresponding IMAP server.
/// Otherwise, returns a default of `imap.{domain}`.
///
/// # Example
///
/// ```
/// use mailprint::known_servers::discover_imap_host;
///
/// assert_eq!(discover_imap_host("user@gmail.com"), "imap.gmail.com");
/// assert_eq!(discover_imap_host("user@custom.org"), "imap.custom.org");
/// ```
#[must_use]
pub fn discover_imap_host(email: &str) -> String {
    let domain = email.split('@').nth(1).unwrap_or(email).to_lowercase();

    KNOWN_SERVERS
        .get(domain.as_str())
        .map_or_else(|| format!("imap.{domain}"), |&s| s.to_string())
}

/// Returns `true` if the domain has a known IMAP server mapping.
#[must_use]
pub fn is_known_domain(domain: &str) -> bool {
    KNOWN_SERVERS.contains_key(domain.to_lowercase().as_str())
}

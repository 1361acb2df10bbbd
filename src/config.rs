//! Configuration for the mailprint daemon.
//!
//! The orchestrator receives an explicit immutable [`Config`] at construction;
//! nothing reads ambient globals after startup. Use the builder directly, or
//! [`Config::from_env`] to load the operator-facing environment variables:
//!
//! ```no_run
//! use mailprint::Config;
//!
//! let config = Config::from_env().expect("valid environment");
//! ```

use crate::error::{Error, Result};
use crate::known_servers;
use email_address::EmailAddress;
use secrecy::{ExposeSecret, SecretString};
use std::path::PathBuf;
use std::time::Duration;

/// Default interval between polling cycles.
pub const DEFAULT_CYCLE_INTERVAL: Duration = Duration::from_secs(30);

/// Configuration for connecting to the mailbox and dispatching prints.
///
/// Create using [`Config::builder()`] or [`Config::from_env()`].
///
/// Note: The `password` field is stored as a [`SecretString`] to prevent
/// accidental logging of credentials. The `email` field is stored as a
/// validated [`EmailAddress`] type.
#[derive(Clone)]
pub struct Config {
    /// Login email address (also used for IMAP server discovery).
    email: EmailAddress,
    /// Mailbox password or app-specific password (protected from logging).
    password: SecretString,
    /// IMAP server hostname (auto-discovered from email domain if not set).
    pub imap_host: Option<String>,
    /// IMAP server port (default: 993 for IMAPS).
    pub imap_port: u16,
    /// Mailbox to watch (default: "INBOX").
    pub mailbox: String,
    /// Directory extracted PDFs are written into.
    pub incoming_dir: PathBuf,
    /// OS spooler command invoked with the saved file path as its argument.
    pub print_command: String,
    /// Interval between polling cycles.
    pub cycle_interval: Duration,
    /// Timeout configuration.
    pub timeouts: TimeoutConfig,
    /// Log file policy.
    pub log: LogConfig,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("email", &self.email.as_str())
            .field("password", &"[REDACTED]")
            .field("imap_host", &self.imap_host)
            .field("imap_port", &self.imap_port)
            .field("mailbox", &self.mailbox)
            .field("incoming_dir", &self.incoming_dir)
            .field("print_command", &self.print_command)
            .field("cycle_interval", &self.cycle_interval)
            .field("timeouts", &self.timeouts)
            .field("log", &self.log)
            .finish()
    }
}

impl Config {
    /// Returns the login email address as a string slice.
    #[must_use]
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Returns the password as a string slice.
    ///
    /// The password is intentionally not a public field so it never shows up
    /// in `Debug` output or accidental logging.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }

    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Returns the effective IMAP host, either explicitly configured or
    /// derived from the login email domain.
    #[must_use]
    pub fn effective_imap_host(&self) -> String {
        if let Some(host) = &self.imap_host {
            host.clone()
        } else {
            known_servers::discover_imap_host(self.email.as_str())
        }
    }

    /// Returns the full IMAP server address as "host:port".
    #[must_use]
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.effective_imap_host(), self.imap_port)
    }

    /// Loads configuration from the environment.
    ///
    /// Required: `EMAIL_ADDRESS`, `EMAIL_PASSWORD`. Optional: `IMAP_SERVER`
    /// (discovered from the email domain when unset), plus `MAILPRINT_*`
    /// overrides for port, mailbox, incoming directory, print command, cycle
    /// interval, and log policy.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing, the email address
    /// is malformed, or a numeric override does not parse. Misconfiguration
    /// surfaces at startup rather than as an identical connect failure logged
    /// every cycle forever.
    pub fn from_env() -> Result<Self> {
        let mut builder = Self::builder()
            .email(require_env("EMAIL_ADDRESS")?)
            .password(require_env("EMAIL_PASSWORD")?);

        if let Ok(host) = std::env::var("IMAP_SERVER") {
            if !host.is_empty() {
                builder = builder.imap_host(host);
            }
        }
        if let Some(port) = parse_env("MAILPRINT_IMAP_PORT")? {
            builder = builder.imap_port(port);
        }
        if let Ok(mailbox) = std::env::var("MAILPRINT_MAILBOX") {
            builder = builder.mailbox(mailbox);
        }
        if let Ok(dir) = std::env::var("MAILPRINT_INCOMING_DIR") {
            builder = builder.incoming_dir(dir);
        }
        if let Ok(command) = std::env::var("MAILPRINT_PRINT_COMMAND") {
            builder = builder.print_command(command);
        }
        if let Some(secs) = parse_env::<u64>("MAILPRINT_CYCLE_SECS")? {
            builder = builder.cycle_interval(Duration::from_secs(secs));
        }

        let mut log = LogConfig::default();
        if let Ok(path) = std::env::var("MAILPRINT_LOG_FILE") {
            log.path = PathBuf::from(path);
        }
        if let Some(max_bytes) = parse_env("MAILPRINT_LOG_MAX_BYTES")? {
            log.max_bytes = max_bytes;
        }
        if let Some(backups) = parse_env("MAILPRINT_LOG_BACKUPS")? {
            log.backups = backups;
        }

        builder.log(log).build()
    }
}

fn require_env(name: &str) -> Result<String> {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(Error::InvalidConfig {
            message: format!("{name} is required"),
        }),
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw.parse().map(Some).map_err(|_| Error::InvalidConfig {
            message: format!("{name} is not a valid value: {raw}"),
        }),
        Err(_) => Ok(None),
    }
}

/// Timeout configuration for IMAP operations.
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Timeout for establishing TCP/TLS connection.
    pub connect: Duration,
    /// Timeout for IMAP authentication.
    pub auth: Duration,
    /// Timeout for selecting the mailbox.
    pub select: Duration,
    /// Timeout for the unseen-message search.
    pub search: Duration,
    /// Timeout for fetching one message body.
    pub fetch: Duration,
    /// Timeout for setting the \Seen flag.
    pub store: Duration,
    /// Timeout for the logout operation.
    pub logout: Duration,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(30),
            auth: Duration::from_secs(30),
            select: Duration::from_secs(10),
            search: Duration::from_secs(10),
            fetch: Duration::from_secs(60),
            store: Duration::from_secs(10),
            logout: Duration::from_secs(5),
        }
    }
}

/// Log file policy: a size-capped file with rotated backups.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Path of the active log file.
    pub path: PathBuf,
    /// Size at which the active file is rotated.
    pub max_bytes: u64,
    /// Number of rotated backups retained.
    pub backups: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("mailprint.log"),
            max_bytes: 5 * 1024 * 1024,
            backups: 2,
        }
    }
}

/// Validates an email address format.
fn validate_email(email: &str) -> Result<EmailAddress> {
    EmailAddress::parse_with_options(email, email_address::Options::default()).map_err(|_| {
        Error::InvalidEmailFormat {
            email: email.to_string(),
        }
    })
}

/// Builder for [`Config`].
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    email: Option<String>,
    password: Option<String>,
    imap_host: Option<String>,
    imap_port: Option<u16>,
    mailbox: Option<String>,
    incoming_dir: Option<PathBuf>,
    print_command: Option<String>,
    cycle_interval: Option<Duration>,
    timeouts: Option<TimeoutConfig>,
    log: Option<LogConfig>,
}

impl ConfigBuilder {
    /// Sets the login email address (required).
    ///
    /// The email domain is used to auto-discover the IMAP server if no
    /// explicit host is set.
    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the password (required).
    ///
    /// For Gmail/Outlook, use an app-specific password.
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Sets the IMAP server hostname explicitly.
    #[must_use]
    pub fn imap_host(mut self, host: impl Into<String>) -> Self {
        self.imap_host = Some(host.into());
        self
    }

    /// Sets the IMAP server port. Default is 993 (IMAPS with TLS).
    #[must_use]
    pub fn imap_port(mut self, port: u16) -> Self {
        self.imap_port = Some(port);
        self
    }

    /// Sets the mailbox to watch. Default is "INBOX".
    #[must_use]
    pub fn mailbox(mut self, mailbox: impl Into<String>) -> Self {
        self.mailbox = Some(mailbox.into());
        self
    }

    /// Sets the incoming-documents directory. Default is "./incoming".
    #[must_use]
    pub fn incoming_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.incoming_dir = Some(dir.into());
        self
    }

    /// Sets the OS spooler command. Default is "lp".
    #[must_use]
    pub fn print_command(mut self, command: impl Into<String>) -> Self {
        self.print_command = Some(command.into());
        self
    }

    /// Sets the interval between polling cycles. Default is 30 seconds.
    #[must_use]
    pub fn cycle_interval(mut self, interval: Duration) -> Self {
        self.cycle_interval = Some(interval);
        self
    }

    /// Sets timeout configuration.
    #[must_use]
    pub fn timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = Some(timeouts);
        self
    }

    /// Sets the connection timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts
            .get_or_insert_with(TimeoutConfig::default)
            .connect = timeout;
        self
    }

    /// Sets the log file policy.
    #[must_use]
    pub fn log(mut self, log: LogConfig) -> Self {
        self.log = Some(log);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if required fields are missing or invalid.
    pub fn build(self) -> Result<Config> {
        let email_raw = self.email.ok_or_else(|| Error::InvalidConfig {
            message: "email is required".into(),
        })?;

        let email = validate_email(&email_raw)?;

        let password_raw = self.password.ok_or_else(|| Error::InvalidConfig {
            message: "password is required".into(),
        })?;

        if self.cycle_interval == Some(Duration::ZERO) {
            return Err(Error::InvalidConfig {
                message: "cycle interval must be greater than zero".into(),
            });
        }

        Ok(Config {
            email,
            password: SecretString::from(password_raw),
            imap_host: self.imap_host,
            imap_port: self.imap_port.unwrap_or(993),
            mailbox: self.mailbox.unwrap_or_else(|| "INBOX".to_string()),
            incoming_dir: self
                .incoming_dir
                .unwrap_or_else(|| PathBuf::from("incoming")),
            print_command: self.print_command.unwrap_or_else(|| "lp".to_string()),
            cycle_interval: self.cycle_interval.unwrap_or(DEFAULT_CYCLE_INTERVAL),
            timeouts: self.timeouts.unwrap_or_default(),
            log: self.log.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_minimal() {
        let config = Config::builder()
            .email("user@example.com")
            .password("secret")
            .build()
            .unwrap();

        assert_eq!(config.email(), "user@example.com");
        assert_eq!(config.password(), "secret");
        assert_eq!(config.imap_port, 993);
        assert_eq!(config.mailbox, "INBOX");
        assert_eq!(config.print_command, "lp");
        assert_eq!(config.cycle_interval, Duration::from_secs(30));
        assert_eq!(config.incoming_dir, PathBuf::from("incoming"));
    }

    #[test]
    fn test_builder_full() {
        let config = Config::builder()
            .email("user@example.com")
            .password("secret")
            .imap_host("mail.example.com")
            .imap_port(994)
            .mailbox("Invoices")
            .incoming_dir("/var/spool/mailprint")
            .print_command("lpr")
            .cycle_interval(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(5))
            .build()
            .unwrap();

        assert_eq!(config.imap_host, Some("mail.example.com".into()));
        assert_eq!(config.imap_port, 994);
        assert_eq!(config.mailbox, "Invoices");
        assert_eq!(config.incoming_dir, PathBuf::from("/var/spool/mailprint"));
        assert_eq!(config.print_command, "lpr");
        assert_eq!(config.cycle_interval, Duration::from_secs(60));
        assert_eq!(config.timeouts.connect, Duration::from_secs(5));
    }

    #[test]
    fn test_builder_missing_email() {
        let result = Config::builder().password("secret").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_missing_password() {
        let result = Config::builder().email("user@example.com").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_invalid_email() {
        let result = Config::builder()
            .email("invalid-email")
            .password("secret")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_zero_interval_rejected() {
        let result = Config::builder()
            .email("user@example.com")
            .password("secret")
            .cycle_interval(Duration::ZERO)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_effective_host_discovery() {
        let config = Config::builder()
            .email("user@gmail.com")
            .password("secret")
            .build()
            .unwrap();

        assert_eq!(config.effective_imap_host(), "imap.gmail.com");
    }

    #[test]
    fn test_server_address() {
        let config = Config::builder()
            .email("user@example.com")
            .password("secret")
            .imap_host("mail.example.com")
            .imap_port(993)
            .build()
            .unwrap();

        assert_eq!(config.server_address(), "mail.example.com:993");
    }

    #[test]
    fn test_password_not_in_debug() {
        let config = Config::builder()
            .email("user@example.com")
            .password("super-secret-password")
            .build()
            .unwrap();

        let debug_str = format!("{config:?}");
        assert!(!debug_str.contains("super-secret-password"));
        assert!(debug_str.contains("[REDACTED]"));
    }

    #[test]
    fn test_log_defaults() {
        let log = LogConfig::default();
        assert_eq!(log.max_bytes, 5 * 1024 * 1024);
        assert_eq!(log.backups, 2);
    }
}

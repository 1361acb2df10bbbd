//! Integration tests for mailprint.
//!
//! These tests require a real IMAP server and are disabled by default.
//! To run them:
//!
//! ```bash
//! # Set environment variables
//! export MAILPRINT_TEST_EMAIL="your@email.com"
//! export MAILPRINT_TEST_PASSWORD="your-app-password"
//!
//! # Optional: explicit host (discovered from the email domain when unset)
//! export MAILPRINT_TEST_IMAP_HOST="imap.example.com"
//!
//! # Run with the integration-tests feature
//! cargo test --features integration-tests -- --ignored
//! ```
//!
//! The real-server tests use `true` as the spooler command, so nothing is
//! actually printed, and they never mark messages seen unless your inbox
//! contains unseen mail with PDF attachments.

use mailprint::{Config, Orchestrator, SpoolerCommand};
use std::env;

// ─────────────────────────────────────────────────────────────────────────────
// Test Configuration Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn get_test_config(incoming_dir: &std::path::Path) -> Option<Config> {
    dotenvy::dotenv().ok();
    let email = env::var("MAILPRINT_TEST_EMAIL").ok()?;
    let password = env::var("MAILPRINT_TEST_PASSWORD").ok()?;

    let mut builder = Config::builder()
        .email(email)
        .password(password)
        .incoming_dir(incoming_dir)
        .print_command("true");

    if let Ok(host) = env::var("MAILPRINT_TEST_IMAP_HOST") {
        builder = builder.imap_host(host);
    }

    builder.build().ok()
}

// ─────────────────────────────────────────────────────────────────────────────
// Cycle Tests
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
#[ignore = "requires real IMAP server"]
async fn test_cycle_against_real_mailbox() {
    let tmp = tempfile::tempdir().unwrap();
    let config = get_test_config(tmp.path()).expect("Test config from environment variables");
    let printer = Box::new(SpoolerCommand::new("true"));

    let orchestrator = Orchestrator::new(config, printer).expect("incoming dir created");

    // A cycle never propagates failure; it logs and returns a summary
    let outcome = orchestrator.process_cycle().await;

    assert!(outcome.messages_processed <= outcome.messages_found);
    assert!(outcome.marked_seen <= outcome.messages_processed);
}

#[tokio::test]
#[ignore = "requires real IMAP server"]
async fn test_two_quiet_cycles_take_no_action() {
    // With no new mail between cycles, the second search comes back empty
    // (or with the same never-flagged messages) and nothing new is written
    let tmp = tempfile::tempdir().unwrap();
    let config = get_test_config(tmp.path()).expect("Test config from environment variables");
    let printer = Box::new(SpoolerCommand::new("true"));

    let orchestrator = Orchestrator::new(config, printer).expect("incoming dir created");

    let first = orchestrator.process_cycle().await;
    let second = orchestrator.process_cycle().await;

    // Messages flagged by the first cycle cannot come back in the second
    assert!(second.messages_found <= first.messages_found + first.marked_seen);
}

#[tokio::test]
async fn test_cycle_with_unreachable_server_is_swallowed() {
    // Connection failure at cycle start: one logged error, no files written,
    // and the call still returns normally
    let tmp = tempfile::tempdir().unwrap();
    let config = Config::builder()
        .email("operator@example.com")
        .password("secret")
        .imap_host("127.0.0.1")
        .imap_port(1) // nothing listens here
        .incoming_dir(tmp.path())
        .connect_timeout(std::time::Duration::from_secs(2))
        .build()
        .unwrap();

    let printer = Box::new(SpoolerCommand::new("true"));
    let orchestrator = Orchestrator::new(config, printer).unwrap();

    let outcome = orchestrator.process_cycle().await;

    assert_eq!(outcome.messages_found, 0);
    assert_eq!(outcome.attachments_printed, 0);
    assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration Tests
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_invalid_email_format() {
    let result = Config::builder()
        .email("not-an-email")
        .password("password")
        .build();

    assert!(result.is_err());
}

#[tokio::test]
async fn test_missing_required_fields() {
    // Missing email
    let result = Config::builder().password("password").build();
    assert!(result.is_err());

    // Missing password
    let result = Config::builder().email("test@example.com").build();
    assert!(result.is_err());
}

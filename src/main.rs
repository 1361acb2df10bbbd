//! mailprint daemon: poll the mailbox, print PDF attachments, forever.

use mailprint::{logging, scheduler, Config, Orchestrator, SpoolerCommand};

// The workload is strictly sequential: one cycle at a time, each awaited to
// completion. A single-threaded runtime is all it needs.
#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Credentials live in a .env file beside the binary in the reference
    // deployment; a missing file is fine when the variables are exported
    dotenvy::dotenv().ok();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("  required: EMAIL_ADDRESS, EMAIL_PASSWORD");
            eprintln!("  optional: IMAP_SERVER (discovered from the email domain when unset)");
            std::process::exit(1);
        }
    };

    // Hold the guard so buffered file-log lines flush on shutdown
    let _log_guard = logging::init(&config.log);

    tracing::info!(
        email = config.email(),
        imap_host = %config.effective_imap_host(),
        mailbox = %config.mailbox,
        incoming_dir = %config.incoming_dir.display(),
        print_command = %config.print_command,
        "Mail-to-printer service started"
    );

    let printer = Box::new(SpoolerCommand::new(&config.print_command));
    let interval = config.cycle_interval;

    let orchestrator = match Orchestrator::new(config, printer) {
        Ok(orchestrator) => orchestrator,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            std::process::exit(1);
        }
    };

    scheduler::run(orchestrator, interval).await;
}

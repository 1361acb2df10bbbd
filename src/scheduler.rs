//! Fixed-cadence scheduling of orchestrator cycles.
//!
//! One cycle runs immediately at startup, then one per interval, forever.
//! Each cycle is awaited to completion before the next tick is honored, so at
//! most one cycle is ever in flight; a cycle that overruns the interval
//! delays the next tick instead of queueing a burst. Termination is external
//! (process kill) only.

use crate::orchestrator::Orchestrator;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::info;

/// Runs the orchestrator on the given interval until the process is killed.
pub async fn run(orchestrator: Orchestrator, interval: Duration) {
    info!(
        interval_secs = interval.as_secs(),
        "Scheduler started, first cycle runs now"
    );

    let mut tick = tokio::time::interval(interval);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        // The first tick completes immediately
        tick.tick().await;
        orchestrator.process_cycle().await;
    }
}

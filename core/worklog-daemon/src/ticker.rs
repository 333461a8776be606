//! Fixed-cadence tick loop.
//!
//! Ticks are scheduled on a grid of `interval` slots. A tick that overruns
//! its slot does not cause a burst of catch-up ticks: missed slots are
//! skipped and the loop resumes on the next future slot.

use chrono::Utc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use worklog_core::SessionEngine;

use crate::report;

#[derive(Debug, Clone, Copy)]
pub struct TickSettings {
    pub interval: Duration,
    /// Log the live status table every N ticks; 0 disables it.
    pub status_every: u64,
}

pub fn spawn(engine: Arc<SessionEngine>, settings: TickSettings) -> Result<JoinHandle<()>, String> {
    thread::Builder::new()
        .name("worklog-ticker".to_string())
        .spawn(move || run(&engine, settings))
        .map_err(|err| format!("Failed to spawn tick thread: {}", err))
}

fn run(engine: &SessionEngine, settings: TickSettings) {
    let mut slot = Instant::now() + settings.interval;
    let mut ticks: u64 = 0;

    loop {
        let now = Instant::now();
        if slot > now {
            thread::sleep(slot - now);
        }

        engine.tick(Utc::now());
        ticks += 1;
        if settings.status_every > 0 && ticks % settings.status_every == 0 {
            log_live_status(engine);
        }

        let (next, skipped) = next_slot(slot, Instant::now(), settings.interval);
        if skipped > 0 {
            debug!(skipped, "Tick overran its interval; skipping missed slots");
        }
        slot = next;
    }
}

/// Next slot strictly after `now`, and how many slots were passed over.
pub fn next_slot(scheduled: Instant, now: Instant, interval: Duration) -> (Instant, u64) {
    let interval_nanos = interval.as_nanos().max(1);
    let elapsed = now.saturating_duration_since(scheduled).as_nanos();
    let missed = (elapsed / interval_nanos) as u64;
    let advance = interval_nanos * (missed as u128 + 1);
    let next = scheduled + Duration::from_nanos(advance.min(u64::MAX as u128) as u64);
    (next, missed)
}

fn log_live_status(engine: &SessionEngine) {
    let lines = report::live_status_lines(&engine.snapshot());
    if lines.is_empty() {
        return;
    }
    info!("Current activity");
    for line in lines {
        info!("{}", line);
    }
}

//! Per-repository session state and its transitions.
//!
//! A repository is in one of three shapes:
//! - active: `active_start` is set and time is running,
//! - accumulated: idle, but holding banked seconds for the next commit,
//! - quiescent: idle with nothing banked.
//!
//! These transitions are pure; locking lives in [`crate::engine`].

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use crate::types::RepoActivity;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RepoSession {
    pub active_start: Option<DateTime<Utc>>,
    pub last_activity: Option<DateTime<Utc>>,
    pub accumulated_seconds: f64,
    pub changed_files: BTreeSet<PathBuf>,
    pub last_known_commit: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOutcome {
    Started,
    Extended,
}

/// What a commit sweep should do for an observed HEAD.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitObservation {
    /// First poll for this repository; record the hash, never flush.
    FirstSeen,
    Unchanged,
    /// HEAD moved and there is no banked or running time to flush.
    ChangedIdle,
    /// HEAD moved and time is pending; a flush is due.
    ChangedPending,
}

/// Time and files taken out of a session by a flush.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingFlush {
    pub duration_seconds: f64,
    pub changed_files: BTreeSet<PathBuf>,
}

impl RepoSession {
    pub fn is_active(&self) -> bool {
        self.active_start.is_some()
    }

    /// True when a commit now would have time to attribute.
    pub fn has_pending_time(&self) -> bool {
        self.is_active() || self.accumulated_seconds > 0.0
    }

    pub fn record_change(&mut self, path: PathBuf, now: DateTime<Utc>) -> ChangeOutcome {
        self.changed_files.insert(path);
        match self.active_start {
            None => {
                self.active_start = Some(now);
                self.last_activity = Some(now);
                ChangeOutcome::Started
            }
            Some(_) => {
                // Out-of-order timestamps never move activity backwards.
                if self.last_activity.map(|last| now > last).unwrap_or(true) {
                    self.last_activity = Some(now);
                }
                ChangeOutcome::Extended
            }
        }
    }

    /// Banks the active span if the last change is older than `threshold`.
    ///
    /// The span ends at the last observed change, not at `now`, so the idle
    /// gap itself is never credited. Returns the banked seconds.
    pub fn pause_if_idle(&mut self, now: DateTime<Utc>, threshold: Duration) -> Option<f64> {
        let last = self.last_activity?;
        self.active_start?;

        let idle_millis = now.signed_duration_since(last).num_milliseconds();
        if idle_millis <= threshold.as_millis() as i64 {
            return None;
        }
        Some(self.close_active_span())
    }

    /// Folds `[active_start, last_activity]` into the accumulator and clears it.
    pub fn close_active_span(&mut self) -> f64 {
        let span = match (self.active_start.take(), self.last_activity.take()) {
            (Some(start), Some(last)) => span_seconds(start, last),
            _ => 0.0,
        };
        self.accumulated_seconds += span;
        span
    }

    pub fn observe_commit(&self, head: &str) -> CommitObservation {
        match self.last_known_commit.as_deref() {
            None => CommitObservation::FirstSeen,
            Some(previous) if previous == head => CommitObservation::Unchanged,
            Some(_) if self.has_pending_time() => CommitObservation::ChangedPending,
            Some(_) => CommitObservation::ChangedIdle,
        }
    }

    pub fn set_commit(&mut self, head: &str) {
        self.last_known_commit = Some(head.to_string());
    }

    /// Closes the active span and records `head` as the new baseline.
    ///
    /// Banked time and files are taken only when the duration is positive;
    /// a zero-length span keeps its files for the next session.
    pub fn take_pending(&mut self, head: &str) -> PendingFlush {
        self.close_active_span();
        self.set_commit(head);
        if self.accumulated_seconds <= 0.0 {
            return PendingFlush {
                duration_seconds: 0.0,
                changed_files: BTreeSet::new(),
            };
        }
        PendingFlush {
            duration_seconds: std::mem::replace(&mut self.accumulated_seconds, 0.0),
            changed_files: std::mem::take(&mut self.changed_files),
        }
    }

    pub fn activity(&self, now: DateTime<Utc>) -> Option<RepoActivity> {
        if let Some(start) = self.active_start {
            return Some(RepoActivity::Active {
                elapsed_seconds: span_seconds(start, now),
            });
        }
        if self.accumulated_seconds > 0.0 {
            return Some(RepoActivity::Accumulated {
                seconds: self.accumulated_seconds,
            });
        }
        None
    }
}

fn span_seconds(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    let millis = end.signed_duration_since(start).num_milliseconds();
    (millis.max(0) as f64) / 1000.0
}

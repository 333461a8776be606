//! Session tracking engine.
//!
//! Two triggers drive the engine: change events from the watcher thread
//! ([`SessionEngine::on_change`]) and the periodic tick
//! ([`SessionEngine::tick`]). Both go through the per-repository lock, so a
//! repository sees at most one mutation at a time.
//!
//! A tick sweeps each repository in phases so that no lock is held while a
//! `git` subprocess runs:
//!
//! 1. lock: pause the session if idle
//! 2. no lock: read HEAD
//! 3. lock: compare with the last known commit
//! 4. no lock: read the commit message and diff stats
//! 5. lock: take the pending time and files, record the new commit
//! 6. no lock: hand the record to the sink
//!
//! The per-repository sweep guard keeps phases 2-5 exclusive to one tick, so
//! a commit transition is flushed at most once. A tick that finds the guard
//! taken skips the repository.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info, trace, warn};

use crate::config::Config;
use crate::inspector::RepositoryInspector;
use crate::scoring::productivity_score;
use crate::session::{ChangeOutcome, CommitObservation, PendingFlush, RepoSession};
use crate::sink::SessionSink;
use crate::task_name::extract_task_name;
use crate::types::{CompletedSession, DiffStats, RepoKey, RepoStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    pub idle_threshold: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            idle_threshold: Duration::from_secs(300),
        }
    }
}

impl From<&Config> for EngineSettings {
    fn from(config: &Config) -> Self {
        Self {
            idle_threshold: config.idle_threshold(),
        }
    }
}

/// Counts from one tick, for logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub repos_swept: usize,
    pub paused: usize,
    pub flushed: usize,
    pub skipped: usize,
}

impl TickReport {
    pub fn is_quiet(&self) -> bool {
        self.paused == 0 && self.flushed == 0 && self.skipped == 0
    }
}

#[derive(Debug, Default)]
struct RepoSlot {
    session: Mutex<RepoSession>,
    sweeping: AtomicBool,
}

impl RepoSlot {
    fn lock(&self) -> MutexGuard<'_, RepoSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Held while a tick sweeps one repository; released on drop.
struct SweepGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> SweepGuard<'a> {
    fn claim(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for SweepGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

pub struct SessionEngine {
    settings: EngineSettings,
    inspector: Arc<dyn RepositoryInspector>,
    sink: Arc<dyn SessionSink>,
    repos: Mutex<HashMap<RepoKey, Arc<RepoSlot>>>,
}

impl SessionEngine {
    pub fn new(
        settings: EngineSettings,
        inspector: Arc<dyn RepositoryInspector>,
        sink: Arc<dyn SessionSink>,
    ) -> Self {
        Self {
            settings,
            inspector,
            sink,
            repos: Mutex::new(HashMap::new()),
        }
    }

    pub fn settings(&self) -> EngineSettings {
        self.settings
    }

    pub fn on_change(&self, path: &Path) -> Option<(RepoKey, ChangeOutcome)> {
        self.on_change_at(path, Utc::now())
    }

    /// Attributes a change at `path` to its repository.
    ///
    /// Paths outside any repository are dropped. Only a filesystem walk runs
    /// here, never a `git` subprocess.
    pub fn on_change_at(&self, path: &Path, now: DateTime<Utc>) -> Option<(RepoKey, ChangeOutcome)> {
        let Some(repo) = self.inspector.resolve_root(path) else {
            trace!(path = %path.display(), "Change outside any repository");
            return None;
        };

        let slot = self.slot(&repo);
        let outcome = slot.lock().record_change(path.to_path_buf(), now);
        if outcome == ChangeOutcome::Started {
            info!(repo = %repo, file = %path.display(), "Started tracking session");
        } else {
            trace!(repo = %repo, file = %path.display(), "Extended session");
        }
        Some((repo, outcome))
    }

    /// Runs the idle sweep, then the commit sweep, over every tracked repository.
    pub fn tick(&self, now: DateTime<Utc>) -> TickReport {
        let mut report = TickReport::default();
        for (repo, slot) in self.slots() {
            self.sweep_repo(&repo, &slot, now, &mut report);
        }
        if !report.is_quiet() {
            debug!(
                swept = report.repos_swept,
                paused = report.paused,
                flushed = report.flushed,
                skipped = report.skipped,
                "Tick complete"
            );
        }
        report
    }

    pub fn snapshot(&self) -> Vec<RepoStatus> {
        self.snapshot_at(Utc::now())
    }

    /// Display state of every repository with running or banked time,
    /// sorted by repository path.
    pub fn snapshot_at(&self, now: DateTime<Utc>) -> Vec<RepoStatus> {
        self.slots()
            .into_iter()
            .filter_map(|(repo, slot)| {
                let session = slot.lock();
                let activity = session.activity(now)?;
                Some(RepoStatus {
                    repo_name: repo.name(),
                    files_changed: session.changed_files.len(),
                    activity,
                    repo,
                })
            })
            .collect()
    }

    /// Copy of one repository's state.
    pub fn session(&self, repo: &RepoKey) -> Option<RepoSession> {
        let slot = self
            .repos
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(repo)
            .cloned()?;
        let session = slot.lock().clone();
        Some(session)
    }

    pub fn tracked_repos(&self) -> Vec<RepoKey> {
        self.slots().into_iter().map(|(repo, _)| repo).collect()
    }

    fn slot(&self, repo: &RepoKey) -> Arc<RepoSlot> {
        let mut repos = self.repos.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(repos.entry(repo.clone()).or_default())
    }

    fn slots(&self) -> Vec<(RepoKey, Arc<RepoSlot>)> {
        let mut slots: Vec<_> = self
            .repos
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(repo, slot)| (repo.clone(), Arc::clone(slot)))
            .collect();
        slots.sort_by(|(left, _), (right, _)| left.cmp(right));
        slots
    }

    fn sweep_repo(&self, repo: &RepoKey, slot: &RepoSlot, now: DateTime<Utc>, report: &mut TickReport) {
        let Some(_guard) = SweepGuard::claim(&slot.sweeping) else {
            debug!(repo = %repo, "Sweep still running, skipping");
            report.skipped += 1;
            return;
        };
        report.repos_swept += 1;

        let banked = slot.lock().pause_if_idle(now, self.settings.idle_threshold);
        if let Some(banked) = banked {
            report.paused += 1;
            info!(repo = %repo, banked_secs = banked, "Paused idle session");
        }

        let head = match self.inspector.head_commit(repo) {
            Ok(head) => head,
            Err(err) => {
                debug!(repo = %repo, error = %err, "Could not read HEAD");
                report.skipped += 1;
                return;
            }
        };

        {
            let mut session = slot.lock();
            match session.observe_commit(&head) {
                CommitObservation::FirstSeen => {
                    debug!(repo = %repo, commit = %head, "Recorded initial commit");
                    session.set_commit(&head);
                    return;
                }
                CommitObservation::Unchanged => return,
                CommitObservation::ChangedIdle => {
                    debug!(repo = %repo, commit = %head, "New commit with no tracked time");
                    session.set_commit(&head);
                    return;
                }
                CommitObservation::ChangedPending => {}
            }
        }

        // The commit stays unrecorded until both reads succeed, so a failure
        // here is retried on the next tick.
        let message = match self.inspector.commit_message(repo) {
            Ok(message) => message,
            Err(err) => {
                warn!(repo = %repo, error = %err, "Failed to read commit message");
                report.skipped += 1;
                return;
            }
        };
        let diff = match self.inspector.diff_stats(repo) {
            Ok(diff) => diff,
            Err(err) => {
                warn!(repo = %repo, error = %err, "Failed to read diff stats");
                report.skipped += 1;
                return;
            }
        };

        let flush = slot.lock().take_pending(&head);
        if flush.duration_seconds <= 0.0 {
            debug!(repo = %repo, commit = %head, "New commit after a zero-length session");
            return;
        }

        let record = build_record(repo, head, message, diff, flush, now);
        report.flushed += 1;
        info!(
            repo = %repo,
            commit = %record.short_hash(),
            task = %record.task_name,
            duration_secs = record.duration_seconds,
            files = record.files_changed,
            score = record.productivity_score,
            "Session complete"
        );
        if let Err(err) = self.sink.emit(record) {
            warn!(repo = %repo, error = %err, "Failed to record session");
        }
    }
}

fn build_record(
    repo: &RepoKey,
    commit_hash: String,
    commit_message: String,
    diff: DiffStats,
    flush: PendingFlush,
    now: DateTime<Utc>,
) -> CompletedSession {
    let files_changed = (flush.changed_files.len() as u64).max(diff.files_changed);
    let duration_seconds = flush.duration_seconds;
    let start_time = now - chrono::Duration::milliseconds((duration_seconds * 1000.0).round() as i64);

    CompletedSession {
        repo_path: repo.to_string(),
        repo_name: repo.name(),
        start_time,
        end_time: now,
        duration_seconds,
        task_name: extract_task_name(&commit_message),
        commit_hash,
        commit_message,
        files_changed,
        lines_added: diff.lines_added,
        lines_deleted: diff.lines_deleted,
        productivity_score: productivity_score(duration_seconds, files_changed, diff.lines_changed()),
    }
}

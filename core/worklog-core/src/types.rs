//! Shared value types for the engine and its collaborators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Canonical absolute path to a git repository root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RepoKey(PathBuf);

impl RepoKey {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }

    /// Last path component, used as the human-facing repository name.
    pub fn name(&self) -> String {
        self.0
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| self.0.to_string_lossy().to_string())
    }
}

impl fmt::Display for RepoKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Line and file counts for uncommitted (staged + unstaged) changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffStats {
    pub lines_added: u64,
    pub lines_deleted: u64,
    pub files_changed: u64,
}

impl DiffStats {
    pub fn lines_changed(&self) -> u64 {
        self.lines_added + self.lines_deleted
    }
}

/// One flushed session, handed to a sink exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedSession {
    pub repo_path: String,
    pub repo_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_seconds: f64,
    pub commit_hash: String,
    pub commit_message: String,
    pub task_name: String,
    pub files_changed: u64,
    pub lines_added: u64,
    pub lines_deleted: u64,
    pub productivity_score: f64,
}

impl CompletedSession {
    pub fn lines_changed(&self) -> u64 {
        self.lines_added + self.lines_deleted
    }

    pub fn short_hash(&self) -> &str {
        self.commit_hash.get(..7).unwrap_or(&self.commit_hash)
    }
}

/// Live display state for one repository.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum RepoActivity {
    /// Being timed right now; `elapsed_seconds` runs from the span start.
    Active { elapsed_seconds: f64 },
    /// Idle, with banked time waiting for the next commit.
    Accumulated { seconds: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepoStatus {
    pub repo: RepoKey,
    pub repo_name: String,
    #[serde(flatten)]
    pub activity: RepoActivity,
    pub files_changed: usize,
}

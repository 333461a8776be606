//! Repository inspection.
//!
//! Root resolution is a pure filesystem walk so it can run on every change
//! event. Commit and diff queries shell out to `git` and are bounded by a
//! timeout so a hung subprocess cannot stall the tick loop.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crate::error::InspectError;
use crate::types::{DiffStats, RepoKey};

/// Maximum depth to walk up when searching for a repository root.
pub const MAX_ROOT_DEPTH: usize = 64;
const POLL_INTERVAL: Duration = Duration::from_millis(20);

pub trait RepositoryInspector: Send + Sync {
    /// Resolves the enclosing repository root, or `None` outside a repository.
    fn resolve_root(&self, path: &Path) -> Option<RepoKey>;
    fn head_commit(&self, repo: &RepoKey) -> Result<String, InspectError>;
    fn commit_message(&self, repo: &RepoKey) -> Result<String, InspectError>;
    /// Staged and unstaged changes relative to HEAD.
    fn diff_stats(&self, repo: &RepoKey) -> Result<DiffStats, InspectError>;
}

/// Inspector backed by the `git` command line.
#[derive(Debug, Clone)]
pub struct GitInspector {
    timeout: Duration,
}

impl GitInspector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn run(&self, repo: &RepoKey, args: &[&str]) -> Result<String, InspectError> {
        run_git(repo.path(), args, self.timeout)
    }
}

impl Default for GitInspector {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

impl RepositoryInspector for GitInspector {
    fn resolve_root(&self, path: &Path) -> Option<RepoKey> {
        resolve_repo_root(path)
    }

    fn head_commit(&self, repo: &RepoKey) -> Result<String, InspectError> {
        let output = self.run(repo, &["rev-parse", "HEAD"])?;
        let hash = output.trim();
        if hash.is_empty() {
            return Err(InspectError::InvalidOutput {
                command: "rev-parse HEAD".to_string(),
                details: "empty commit hash".to_string(),
            });
        }
        Ok(hash.to_string())
    }

    fn commit_message(&self, repo: &RepoKey) -> Result<String, InspectError> {
        let output = self.run(repo, &["log", "-1", "--pretty=%B"])?;
        Ok(output.trim().to_string())
    }

    fn diff_stats(&self, repo: &RepoKey) -> Result<DiffStats, InspectError> {
        let output = self.run(repo, &["diff", "HEAD", "--stat"])?;
        Ok(parse_diff_stat(&output))
    }
}

/// Walks up from `path` to the nearest directory containing a `.git` entry.
///
/// A `.git` directory must hold `HEAD`; a `.git` file (worktrees,
/// submodules) must start with `gitdir:`. The returned root is canonical.
pub fn resolve_repo_root(path: &Path) -> Option<RepoKey> {
    let start = if path.is_dir() {
        path.to_path_buf()
    } else {
        path.parent()?.to_path_buf()
    };

    let mut current = Some(start.as_path());
    let mut depth = 0;
    while let Some(dir) = current {
        if depth > MAX_ROOT_DEPTH {
            break;
        }
        if is_repo_root(dir) {
            return Some(RepoKey::new(canonicalize_path(dir)));
        }
        current = dir.parent();
        depth += 1;
    }

    None
}

fn is_repo_root(dir: &Path) -> bool {
    let git_entry = dir.join(".git");
    if git_entry.is_dir() {
        return git_entry.join("HEAD").exists();
    }
    if git_entry.is_file() {
        return std::fs::read_to_string(&git_entry)
            .map(|contents| {
                contents
                    .trim_start()
                    .to_ascii_lowercase()
                    .starts_with("gitdir:")
            })
            .unwrap_or(false);
    }
    false
}

fn canonicalize_path(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Parses `git diff --stat` output.
///
/// The summary line (`3 files changed, 12 insertions(+), 3 deletions(-)`) is
/// authoritative. Without one, per-file `path | N ++--` rows are counted and
/// the `+`/`-` graph is used as an approximate line count.
pub fn parse_diff_stat(output: &str) -> DiffStats {
    let mut summary: Option<DiffStats> = None;
    let mut per_file = DiffStats::default();

    for line in output.lines() {
        if line.contains("file changed") || line.contains("files changed") {
            summary = Some(parse_summary_line(line));
        } else if let Some((_, graph)) = line.split_once(" | ") {
            per_file.files_changed += 1;
            if let Some(bar) = graph.split_whitespace().nth(1) {
                per_file.lines_added += bar.chars().filter(|c| *c == '+').count() as u64;
                per_file.lines_deleted += bar.chars().filter(|c| *c == '-').count() as u64;
            }
        }
    }

    summary.unwrap_or(per_file)
}

fn parse_summary_line(line: &str) -> DiffStats {
    let mut stats = DiffStats::default();
    for part in line.split(',') {
        let count = part
            .split_whitespace()
            .next()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(0);
        if part.contains("file") {
            stats.files_changed = count;
        } else if part.contains("insertion") {
            stats.lines_added = count;
        } else if part.contains("deletion") {
            stats.lines_deleted = count;
        }
    }
    stats
}

/// Runs `git -C <root> <args>` and returns stdout, killing it after `timeout`.
pub fn run_git(root: &Path, args: &[&str], timeout: Duration) -> Result<String, InspectError> {
    let command = args.join(" ");
    let mut child = Command::new("git")
        .arg("-C")
        .arg(root)
        .args(args)
        .env("GIT_TERMINAL_PROMPT", "0")
        .env("LC_ALL", "C")
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(InspectError::Spawn)?;

    // Pipes are drained on helper threads so a large diff cannot fill the
    // pipe buffer and block the child while we poll for exit.
    let stdout = spawn_reader(child.stdout.take());
    let stderr = spawn_reader(child.stderr.take());
    let start = Instant::now();

    loop {
        match child.try_wait() {
            Ok(Some(status)) => {
                let stdout = stdout.join().unwrap_or_default();
                let stderr = stderr.join().unwrap_or_default();
                if status.success() {
                    return Ok(stdout);
                }
                return Err(InspectError::CommandFailed {
                    command,
                    details: if stderr.trim().is_empty() {
                        status.to_string()
                    } else {
                        stderr.trim().to_string()
                    },
                });
            }
            Ok(None) => {
                if start.elapsed() > timeout {
                    kill_child(&mut child);
                    return Err(InspectError::Timeout { command, timeout });
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(err) => {
                kill_child(&mut child);
                return Err(InspectError::Spawn(err));
            }
        }
    }
}

fn spawn_reader<R: Read + Send + 'static>(source: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut output = String::new();
        if let Some(mut source) = source {
            let _ = source.read_to_string(&mut output);
        }
        output
    })
}

fn kill_child(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

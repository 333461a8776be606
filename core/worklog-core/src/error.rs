//! Error types for worklog-core operations.

use std::path::PathBuf;
use std::time::Duration;

/// Failures from the repository inspector.
///
/// The engine treats every variant as "no data this cycle": the affected
/// repository is skipped and retried on the next tick.
#[derive(Debug, thiserror::Error)]
pub enum InspectError {
    #[error("Failed to spawn git: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("git {command} timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },

    #[error("git {command} failed: {details}")]
    CommandFailed { command: String, details: String },

    #[error("git {command} returned unusable output: {details}")]
    InvalidOutput { command: String, details: String },
}

/// All errors that can occur in worklog-core operations.
#[derive(Debug, thiserror::Error)]
pub enum WorklogError {
    // ─────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration file malformed: {path}: {details}")]
    ConfigMalformed { path: PathBuf, details: String },

    // ─────────────────────────────────────────────────────────────────────
    // Runtime Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error(transparent)]
    Inspect(#[from] InspectError),

    #[error("Sink write failed: {0}")]
    Sink(String),
}

/// Convenience type alias for Results using WorklogError.
pub type Result<T> = std::result::Result<T, WorklogError>;

// Conversion for string error compatibility
impl From<WorklogError> for String {
    fn from(err: WorklogError) -> String {
        err.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_head() -> Result<String> {
        Err(InspectError::Timeout {
            command: "rev-parse HEAD".to_string(),
            timeout: Duration::from_secs(10),
        })?
    }

    #[test]
    fn inspect_errors_convert_transparently() {
        let err = read_head().unwrap_err();
        assert!(matches!(err, WorklogError::Inspect(InspectError::Timeout { .. })));
        assert_eq!(err.to_string(), "git rev-parse HEAD timed out after 10s");
    }

    #[test]
    fn sink_error_converts_to_string() {
        let message: String = WorklogError::Sink("disk full".to_string()).into();
        assert_eq!(message, "Sink write failed: disk full");
    }
}

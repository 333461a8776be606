//! Structured logging for worklog using tracing.
//!
//! Logs go to stderr and to `<log_dir>/logs/worklog.{date}.log` with daily
//! rotation, keeping 7 files. Level comes from `RUST_LOG`; set
//! `WORKLOG_DEBUG_LOG=1` to force debug output.
//!
//! Falls back to stderr only if the file appender cannot be created.

use std::env;
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_FILTER: &str = "worklog=info,worklog_core=info";

pub fn init(logs_dir: &Path) {
    let _ = fs_err::create_dir_all(logs_dir);

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_target(false);

    match create_file_appender(logs_dir) {
        Ok(file_appender) => {
            tracing_subscriber::registry()
                .with(env_filter())
                .with(stderr_layer)
                .with(
                    fmt::layer()
                        .with_writer(file_appender)
                        .with_timer(fmt::time::UtcTime::rfc_3339())
                        .with_ansi(false),
                )
                .init();
        }
        Err(_) => {
            tracing_subscriber::registry()
                .with(env_filter())
                .with(stderr_layer)
                .init();
        }
    }
}

fn env_filter() -> EnvFilter {
    if debug_forced(env::var("WORKLOG_DEBUG_LOG").ok().as_deref()) {
        return EnvFilter::new("debug");
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn debug_forced(value: Option<&str>) -> bool {
    matches!(value, Some("1" | "true" | "TRUE" | "yes" | "YES"))
}

fn create_file_appender(
    logs_dir: &Path,
) -> Result<RollingFileAppender, tracing_appender::rolling::InitError> {
    RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("worklog")
        .filename_suffix("log")
        .max_log_files(7)
        .build(logs_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_flag_values() {
        assert!(debug_forced(Some("1")));
        assert!(debug_forced(Some("yes")));
        assert!(!debug_forced(Some("0")));
        assert!(!debug_forced(None));
    }

    #[test]
    fn file_appender_builds_in_temp_dir() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        assert!(create_file_appender(temp_dir.path()).is_ok());
    }
}

//! Configuration loading.
//!
//! Handles paths and defaults for:
//! - the monitored directory tree and the log/output directory
//! - engine timing (idle threshold, scan interval, git timeout)
//!
//! The config is loaded once per process and passed down explicitly.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, WorklogError};

const DEFAULT_CONFIG_RELATIVE_PATH: &str = ".config/worklog/config.toml";
const DATABASE_FILE_NAME: &str = "activity_monitor.db";

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Config {
    /// Directory holding the database, markdown timesheets, exports and logs.
    #[serde(default = "default_log_dir")]
    pub log_dir: String,
    /// Root of the tree watched for file changes.
    #[serde(default = "default_monitor_path")]
    pub monitor_path: String,
    #[serde(default = "default_idle_threshold_secs")]
    pub idle_threshold_secs: u64,
    #[serde(default = "default_scan_interval_secs")]
    pub scan_interval_secs: u64,
    #[serde(default = "default_git_timeout_secs")]
    pub git_timeout_secs: u64,
    /// Emit the live status table every N ticks (0 disables it).
    #[serde(default = "default_status_every_ticks")]
    pub status_every_ticks: u64,
    #[serde(default = "default_markdown_log")]
    pub markdown_log: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            monitor_path: default_monitor_path(),
            idle_threshold_secs: default_idle_threshold_secs(),
            scan_interval_secs: default_scan_interval_secs(),
            git_timeout_secs: default_git_timeout_secs(),
            status_every_ticks: default_status_every_ticks(),
            markdown_log: default_markdown_log(),
        }
    }
}

impl Config {
    pub fn log_dir_path(&self) -> PathBuf {
        expand_home(&self.log_dir)
    }

    pub fn monitor_path_buf(&self) -> PathBuf {
        expand_home(&self.monitor_path)
    }

    pub fn database_path(&self) -> PathBuf {
        self.log_dir_path().join(DATABASE_FILE_NAME)
    }

    pub fn summaries_dir(&self) -> PathBuf {
        self.log_dir_path().join("summaries")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.log_dir_path().join("logs")
    }

    pub fn idle_threshold(&self) -> Duration {
        Duration::from_secs(self.idle_threshold_secs)
    }

    /// Never zero; a zero interval would spin the tick loop.
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval_secs.max(1))
    }

    pub fn git_timeout(&self) -> Duration {
        Duration::from_secs(self.git_timeout_secs.max(1))
    }
}

fn default_log_dir() -> String {
    "~/Desktop/notes/time_log".to_string()
}

fn default_monitor_path() -> String {
    "~/development".to_string()
}

fn default_idle_threshold_secs() -> u64 {
    300
}

fn default_scan_interval_secs() -> u64 {
    3
}

fn default_git_timeout_secs() -> u64 {
    10
}

fn default_status_every_ticks() -> u64 {
    20
}

fn default_markdown_log() -> bool {
    true
}

/// Returns `~/.config/worklog/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(DEFAULT_CONFIG_RELATIVE_PATH))
}

/// Loads the config from `path` (or the default location).
///
/// A missing file is not an error: defaults are returned.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config_path = match path {
        Some(path) => path.to_path_buf(),
        None => match default_config_path() {
            Some(path) => path,
            None => return Ok(Config::default()),
        },
    };

    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "Config file missing; using defaults");
        return Ok(Config::default());
    }

    let content =
        fs_err::read_to_string(&config_path).map_err(|source| WorklogError::ConfigRead {
            path: config_path.clone(),
            source,
        })?;
    parse_config(&content).map_err(|details| WorklogError::ConfigMalformed {
        path: config_path,
        details,
    })
}

pub fn parse_config(content: &str) -> std::result::Result<Config, String> {
    toml::from_str::<Config>(content).map_err(|err| err.to_string())
}

/// Expands a leading `~` to the home directory.
pub fn expand_home(raw: &str) -> PathBuf {
    if raw == "~" {
        return dirs::home_dir().unwrap_or_else(|| PathBuf::from(raw));
    }
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(raw)
}

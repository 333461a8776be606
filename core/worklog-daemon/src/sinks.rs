//! Session sinks used by the collector.

use std::path::PathBuf;
use tracing::{debug, warn};

use worklog_core::{CompletedSession, Result, SessionSink, WorklogError};

use crate::db::Db;
use crate::markdown;

pub struct SqliteSink {
    db: Db,
}

impl SqliteSink {
    pub fn new(db: Db) -> Self {
        Self { db }
    }
}

impl SessionSink for SqliteSink {
    fn emit(&self, record: CompletedSession) -> Result<()> {
        let id = self.db.insert_session(&record).map_err(WorklogError::Sink)?;
        debug!(id, repo = %record.repo_name, "Session stored");
        Ok(())
    }
}

/// Appends each session to the daily Markdown timesheet.
pub struct MarkdownSink {
    log_dir: PathBuf,
}

impl MarkdownSink {
    pub fn new(log_dir: PathBuf) -> Self {
        Self { log_dir }
    }
}

impl SessionSink for MarkdownSink {
    fn emit(&self, record: CompletedSession) -> Result<()> {
        let path = markdown::append_session(&self.log_dir, &record).map_err(WorklogError::Sink)?;
        debug!(path = %path.display(), "Timesheet updated");
        Ok(())
    }
}

/// Emits to every inner sink; one failing sink does not stop the others.
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<(&'static str, Box<dyn SessionSink>)>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: &'static str, sink: impl SessionSink + 'static) -> Self {
        self.sinks.push((name, Box::new(sink)));
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }
}

impl SessionSink for FanoutSink {
    fn emit(&self, record: CompletedSession) -> Result<()> {
        for (name, sink) in &self.sinks {
            if let Err(err) = sink.emit(record.clone()) {
                warn!(sink = *name, error = %err, repo = %record.repo_name, "Sink failed");
            }
        }
        Ok(())
    }
}

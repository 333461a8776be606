//! Destinations for completed sessions.

use std::sync::Mutex;

use crate::error::Result;
use crate::types::CompletedSession;

/// Receives each completed session exactly once.
///
/// Called from the tick thread with no engine lock held. Implementations
/// must not call back into the engine.
pub trait SessionSink: Send + Sync {
    fn emit(&self, record: CompletedSession) -> Result<()>;
}

/// Collects records in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<CompletedSession>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<CompletedSession> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|records| records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionSink for MemorySink {
    fn emit(&self, record: CompletedSession) -> Result<()> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| crate::error::WorklogError::Sink("memory sink poisoned".to_string()))?;
        records.push(record);
        Ok(())
    }
}

//! # worklog-core
//!
//! Commit-scoped time tracking for local git repositories. File changes start
//! or extend a per-repository session, idle gaps pause it, and a new commit
//! closes it into a [`CompletedSession`] handed to a [`SessionSink`].
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime. The daemon drives the engine from plain threads.
//! - **Thread-safe engine**: One lock per repository; `git` never runs under a lock.
//! - **Graceful degradation**: Git or sink failures skip a repository for one tick, never abort.
//! - **Injectable seams**: The repository inspector and the sink are traits.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use worklog_core::{EngineSettings, GitInspector, MemorySink, SessionEngine};
//!
//! let sink = Arc::new(MemorySink::new());
//! let engine = SessionEngine::new(EngineSettings::default(), Arc::new(GitInspector::default()), sink.clone());
//! engine.on_change(std::path::Path::new("/home/me/code/app/src/main.rs"));
//! let report = engine.tick(chrono::Utc::now());
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod filter;
pub mod inspector;
pub mod scoring;
pub mod session;
pub mod sink;
pub mod task_name;
pub mod types;

pub use config::{load_config, Config};
pub use engine::{EngineSettings, SessionEngine, TickReport};
pub use error::{InspectError, Result, WorklogError};
pub use filter::should_track;
pub use inspector::{GitInspector, RepositoryInspector};
pub use scoring::productivity_score;
pub use session::{ChangeOutcome, RepoSession};
pub use sink::{MemorySink, SessionSink};
pub use task_name::extract_task_name;
pub use types::*;

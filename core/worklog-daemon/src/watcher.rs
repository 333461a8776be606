//! Recursive filesystem watcher feeding the engine.

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use std::sync::{mpsc, Arc};
use std::thread;
use tracing::{debug, warn};

use worklog_core::{should_track, SessionEngine};

/// Starts watching `root`. The returned watcher must be kept alive.
pub fn spawn(root: &Path, engine: Arc<SessionEngine>) -> Result<RecommendedWatcher, String> {
    let (tx, rx) = mpsc::channel::<Event>();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) => {
            let _ = tx.send(event);
        }
        Err(err) => warn!(error = %err, "Filesystem watch error"),
    })
    .map_err(|err| format!("Failed to create watcher: {}", err))?;

    watcher
        .watch(root, RecursiveMode::Recursive)
        .map_err(|err| format!("Failed to watch {}: {}", root.display(), err))?;

    thread::Builder::new()
        .name("worklog-watcher".to_string())
        .spawn(move || {
            for event in rx {
                handle_event(&engine, &event);
            }
            debug!("Watcher channel closed");
        })
        .map_err(|err| format!("Failed to spawn watcher thread: {}", err))?;

    Ok(watcher)
}

/// Forwards trackable paths of a create/modify event; returns how many.
pub fn handle_event(engine: &SessionEngine, event: &Event) -> usize {
    if !matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
        return 0;
    }

    event
        .paths
        .iter()
        .filter(|path| should_track(path, path.is_dir()))
        .filter(|path| engine.on_change(path).is_some())
        .count()
}

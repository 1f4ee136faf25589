//! Document root watcher.
//!
//! Logs filesystem changes under the document root so operators can see
//! hand edits and server rewrites. It is not part of the serving path.

use std::path::{Path, PathBuf};

use notify::event::{EventKind, ModifyKind};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

pub struct DocumentWatcher {
    root: PathBuf,
}

impl DocumentWatcher {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    /// Start watching; the returned watcher must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let mut watcher = RecommendedWatcher::new(
            |res: notify::Result<Event>| match res {
                Ok(event) => log_event(&event),
                Err(e) => tracing::error!(error = %e, "Document watch error"),
            },
            Config::default(),
        )?;

        watcher.watch(&self.root, RecursiveMode::Recursive)?;

        tracing::info!(root = ?self.root, "Document watcher started");
        Ok(watcher)
    }
}

/// Short label for an event kind, `None` for events not worth logging.
fn describe(kind: &EventKind) -> Option<&'static str> {
    match kind {
        EventKind::Create(_) => Some("created"),
        EventKind::Modify(ModifyKind::Name(_)) => Some("renamed"),
        EventKind::Modify(ModifyKind::Metadata(_)) => Some("metadata changed"),
        EventKind::Modify(_) => Some("written"),
        EventKind::Remove(_) => Some("removed"),
        _ => None,
    }
}

fn log_event(event: &Event) {
    let Some(change) = describe(&event.kind) else {
        return;
    };
    for path in &event.paths {
        // Our own temp files come and go on every rewrite.
        let is_temp = path
            .file_name()
            .map(|n| n.to_string_lossy().ends_with(".tmp"))
            .unwrap_or(false);
        if !is_temp {
            tracing::info!(path = ?path, change, "Document changed");
        }
    }
}

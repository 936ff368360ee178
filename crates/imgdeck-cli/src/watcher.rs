//! File system watcher that turns changes into refresh commands.
//!
//! Uses [`notify`] with debouncing to detect changes in the directory on
//! screen and forward the changed directory to the main loop.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify_debouncer_mini::{new_debouncer, DebouncedEvent, DebouncedEventKind, Debouncer};
use tokio::sync::mpsc::UnboundedSender;

const DEBOUNCE: Duration = Duration::from_millis(200);

/// Messages from the watcher to the main loop.
#[derive(Debug)]
pub enum WatchMessage {
    /// Entries of this directory changed.
    Changed(PathBuf),
    /// An error occurred while watching.
    Error(String),
}

/// Watches a single directory for changes with debouncing.
pub struct DirWatcher {
    debouncer: Debouncer<notify::RecommendedWatcher>,
    current_dir: Option<PathBuf>,
}

impl DirWatcher {
    /// Creates a watcher that sends messages through `tx`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying notify watcher cannot be initialised.
    pub fn new(tx: UnboundedSender<WatchMessage>) -> anyhow::Result<Self> {
        let debouncer = new_debouncer(
            DEBOUNCE,
            move |result: Result<Vec<DebouncedEvent>, notify::Error>| match result {
                Ok(events) => {
                    for dir in changed_dirs(&events) {
                        let _ = tx.send(WatchMessage::Changed(dir));
                    }
                }
                Err(e) => {
                    let _ = tx.send(WatchMessage::Error(format!("{e}")));
                }
            },
        )?;

        Ok(Self {
            debouncer,
            current_dir: None,
        })
    }

    /// Watches `dir`, unwatching the previous directory if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be watched.
    pub fn watch(&mut self, dir: &Path) -> anyhow::Result<()> {
        if self.current_dir.as_deref() == Some(dir) {
            return Ok(());
        }
        if let Some(prev) = self.current_dir.take() {
            let _ = self.debouncer.watcher().unwatch(&prev);
        }

        // Direct children only
        self.debouncer
            .watcher()
            .watch(dir, notify::RecursiveMode::NonRecursive)?;
        self.current_dir = Some(dir.to_path_buf());
        Ok(())
    }
}

/// Parent directories of the changed entries, deduplicated.
fn changed_dirs(events: &[DebouncedEvent]) -> BTreeSet<PathBuf> {
    events
        .iter()
        .filter(|e| matches!(e.kind, DebouncedEventKind::Any))
        .filter_map(|e| e.path.parent().map(Path::to_path_buf))
        .collect()
}

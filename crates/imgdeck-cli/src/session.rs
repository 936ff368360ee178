//! A browsing session driven from the command line.
//!
//! Batch commands go through the same [`BrowserView`] flow as an interactive
//! frontend: open the parent directory, check the files, run the batch on
//! the selection. Files from several directories, or more than
//! [`SELECTION_LIMIT`] at once, are processed in several rounds.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::bail;
use imgdeck_core::fs::entry::normalize_path;
use imgdeck_core::{
    BatchOperation, BatchTarget, BrowserView, Collaborator, Command, Config, Confirm, CoreError,
    Event, GridGeometry, ItemId, LocalCollaborator, Viewport, SELECTION_LIMIT,
};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{debug, warn};

use crate::report::{self, ListingReport};

/// Totals over every round of a batch command.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchTally {
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: bool,
}

impl BatchTally {
    pub fn exit_code(&self) -> ExitCode {
        if self.failed > 0 {
            ExitCode::FAILURE
        } else {
            ExitCode::SUCCESS
        }
    }
}

pub struct Session {
    view: BrowserView,
    events: UnboundedReceiver<Event>,
    json: bool,
}

impl Session {
    pub fn new(config: &Config, confirm: Arc<dyn Confirm>, json: bool) -> Self {
        let collab = Arc::new(LocalCollaborator::new(config.preview.scheme.clone()));
        Self::with_collaborator(collab, confirm, config.grid, json)
    }

    pub fn with_collaborator(
        collab: Arc<dyn Collaborator>,
        confirm: Arc<dyn Confirm>,
        geometry: GridGeometry,
        json: bool,
    ) -> Self {
        let (tx, events) = mpsc::unbounded_channel();
        Self {
            view: BrowserView::new(collab, confirm, tx, geometry),
            events,
            json,
        }
    }

    pub fn view(&self) -> &BrowserView {
        &self.view
    }

    /// Navigates to `path`, failing if the directory cannot be listed.
    pub async fn open(&mut self, path: Option<PathBuf>) -> anyhow::Result<()> {
        let label = path
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "the default directory".to_string());
        self.view.navigate(path).await;
        let failed = self
            .flush()
            .iter()
            .any(|e| matches!(e, Event::ListingFailed { .. }));
        if failed {
            bail!("cannot open {label}");
        }
        Ok(())
    }

    /// Applies `command`. Returns `true` if a fresh listing was applied.
    pub async fn dispatch(&mut self, command: Command) -> bool {
        self.view.dispatch(command).await;
        self.flush()
            .iter()
            .any(|e| matches!(e, Event::DirectoryLoaded { .. }))
    }

    /// Prints the directory on screen, or only the part a grid of
    /// `viewport`'s size would render.
    pub fn show(&mut self, viewport: Option<Viewport>, previews: bool) -> anyhow::Result<()> {
        if let Some(viewport) = viewport {
            self.view.on_resize(viewport);
            self.view.on_frame();
            self.flush();
        }
        if previews {
            self.resolve_previews(viewport.is_some());
        }

        let items = if viewport.is_some() {
            self.view.visible_items()
        } else {
            self.view.items()
        };
        let report = ListingReport {
            location: self.view.location(),
            breadcrumb: self.view.breadcrumb(),
            total: self.view.items().len(),
            window: viewport.map(|_| self.view.window()),
            items,
        };
        report::print_listing(&report, self.json)
    }

    fn resolve_previews(&mut self, visible_only: bool) {
        let items = if visible_only {
            self.view.visible_items()
        } else {
            self.view.items()
        };
        let ids: Vec<ItemId> = items
            .iter()
            .filter(|i| i.is_image())
            .map(|i| i.id().clone())
            .collect();
        for id in &ids {
            self.view.preview_url(id);
        }
    }

    /// Runs `make_operation(dir)` on `paths`, one round per directory and
    /// selection-sized chunk. Stops early if the user cancels.
    pub async fn run_batch<F>(
        &mut self,
        paths: &[PathBuf],
        make_operation: F,
    ) -> anyhow::Result<BatchTally>
    where
        F: Fn(&Path) -> BatchOperation,
    {
        let mut tally = BatchTally::default();

        for (dir, files) in group_by_parent(paths) {
            for chunk in files.chunks(SELECTION_LIMIT) {
                if let Err(e) = self.open(Some(dir.clone())).await {
                    warn!(dir = %dir.display(), error = %e, "skipping directory");
                    tally.failed += chunk.len();
                    continue;
                }

                self.view.set_batch_mode(true);
                for path in chunk {
                    let id = ItemId::for_path(path);
                    if self.view.item(&id).is_none() {
                        warn!(path = %path.display(), "not a listed folder or image");
                        if !self.json {
                            eprintln!("error: {}: not a folder or image here", path.display());
                        }
                        tally.failed += 1;
                        continue;
                    }
                    self.view.toggle_selection(&id, true)?;
                }
                self.flush();

                let selected = self.view.selection().len();
                if selected == 0 {
                    continue;
                }

                let result = self
                    .view
                    .run_batch(make_operation(&dir), BatchTarget::Selection)
                    .await;
                self.flush();

                match result {
                    Ok(outcome) => {
                        let ok = outcome.succeeded().len();
                        tally.succeeded += ok;
                        tally.failed += selected.saturating_sub(ok);
                    }
                    Err(CoreError::Cancelled) => {
                        tally.cancelled = true;
                        return Ok(tally);
                    }
                    Err(e) => {
                        debug!(error = %e, "round rejected");
                        tally.failed += selected;
                    }
                }
            }
        }
        Ok(tally)
    }

    /// Prints pending notifications and hands the events back.
    fn flush(&mut self) -> Vec<Event> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            report::print_event(&event, self.json);
            events.push(event);
        }
        events
    }
}

/// Normalized paths grouped by parent directory, in path order.
fn group_by_parent(paths: &[PathBuf]) -> BTreeMap<PathBuf, Vec<PathBuf>> {
    let mut groups: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();
    for path in paths {
        let path = normalize_path(path);
        let parent = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| path.clone());
        let files = groups.entry(parent).or_default();
        if !files.contains(&path) {
            files.push(path);
        }
    }
    groups
}

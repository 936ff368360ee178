//! The browser view controller.
//!
//! [`BrowserView`] owns everything shown for one directory: the item store,
//! the breadcrumb, the selection, the visible window and the batch gate. It
//! is driven through `&mut self` methods (or [`Command`]s) and reports back
//! through [`Event`]s on an unbounded channel.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::collab::{Collaborator, MutationResult};
use crate::error::{CoreError, CoreResult};
use crate::event::{Command, Event};
use crate::fs::entry::{normalize_path, Crumb, DirListing, Item, ItemId};
use crate::view::batch::{
    BatchCoordinator, BatchOperation, BatchOutcome, BatchTarget, BatchTicket, Confirm,
    ConfirmPrompt,
};
use crate::view::selection::SelectionTracker;
use crate::view::store::ItemStore;
use crate::view::window::{GridGeometry, Viewport, VisibleWindow, WindowingEngine};

/// Whether a listing replaces the view or refreshes it in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingKind {
    /// Clears the selection and batch mode and scrolls to the top.
    Navigate,
    /// Keeps the selection (minus vanished items) and the scroll position.
    Refresh,
}

/// An issued listing request. Only the most recent one is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRequest {
    seq: u64,
    path: Option<PathBuf>,
    kind: ListingKind,
}

impl ListingRequest {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// The path to list, `None` for the platform default root.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn kind(&self) -> ListingKind {
        self.kind
    }
}

/// State of the directory browser.
pub struct BrowserView {
    collab: Arc<dyn Collaborator>,
    confirm: Arc<dyn Confirm>,
    events: UnboundedSender<Event>,
    location: Option<PathBuf>,
    breadcrumb: Vec<Crumb>,
    store: ItemStore,
    loading: bool,
    batch_mode: bool,
    selection: SelectionTracker,
    windowing: WindowingEngine,
    viewport: Viewport,
    coordinator: BatchCoordinator,
    latest_request: u64,
}

impl BrowserView {
    pub fn new(
        collab: Arc<dyn Collaborator>,
        confirm: Arc<dyn Confirm>,
        events: UnboundedSender<Event>,
        geometry: GridGeometry,
    ) -> Self {
        Self {
            collab,
            confirm,
            events,
            location: None,
            breadcrumb: Vec::new(),
            store: ItemStore::new(),
            loading: false,
            batch_mode: false,
            selection: SelectionTracker::new(),
            windowing: WindowingEngine::new(geometry),
            viewport: Viewport::default(),
            coordinator: BatchCoordinator::new(),
            latest_request: 0,
        }
    }

    // ---- accessors -------------------------------------------------------

    /// The directory on screen, `None` before the first listing or at the
    /// volume root.
    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }

    pub fn breadcrumb(&self) -> &[Crumb] {
        &self.breadcrumb
    }

    pub fn items(&self) -> &[Item] {
        self.store.items()
    }

    pub fn item(&self, id: &ItemId) -> Option<&Item> {
        self.store.get(id)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn batch_mode(&self) -> bool {
        self.batch_mode
    }

    pub fn selection(&self) -> &SelectionTracker {
        &self.selection
    }

    /// `true` while a batch operation holds the gate.
    pub fn is_busy(&self) -> bool {
        self.coordinator.is_busy()
    }

    pub fn window(&self) -> VisibleWindow {
        self.windowing.window()
    }

    /// `true` when a scroll or resize is waiting for [`BrowserView::on_frame`].
    pub fn needs_frame(&self) -> bool {
        self.windowing.is_frame_pending()
    }

    /// The items inside the visible window.
    pub fn visible_items(&self) -> &[Item] {
        self.store.slice(self.windowing.window().range_for(self.store.len()))
    }

    /// Heights of the spacers above and below [`BrowserView::visible_items`].
    pub fn spacer_heights(&self) -> (f64, f64) {
        self.windowing
            .window()
            .spacer_heights(self.store.len(), self.windowing.geometry())
    }

    // ---- navigation ------------------------------------------------------

    /// Issues a navigation request and marks the view as loading.
    pub fn begin_navigation(&mut self, path: Option<PathBuf>) -> ListingRequest {
        self.issue(path, ListingKind::Navigate)
    }

    /// Issues a request to re-list the directory on screen.
    pub fn begin_refresh(&mut self) -> ListingRequest {
        let path = self.location.clone();
        self.issue(path, ListingKind::Refresh)
    }

    fn issue(&mut self, path: Option<PathBuf>, kind: ListingKind) -> ListingRequest {
        self.latest_request += 1;
        self.loading = true;
        ListingRequest {
            seq: self.latest_request,
            path,
            kind,
        }
    }

    /// Applies the response to `request`.
    ///
    /// Returns `false` when a newer request has been issued since; the
    /// response is discarded. A failed listing keeps the previous content
    /// and raises [`Event::ListingFailed`].
    pub fn apply_listing(
        &mut self,
        request: ListingRequest,
        result: CoreResult<DirListing>,
    ) -> bool {
        if request.seq != self.latest_request {
            debug!(
                seq = request.seq,
                latest = self.latest_request,
                "discarding stale listing"
            );
            return false;
        }
        self.loading = false;

        let listing = match result {
            Ok(listing) => listing,
            Err(e) => {
                warn!(path = ?request.path, error = %e, "listing failed");
                self.emit(Event::ListingFailed {
                    path: request.path,
                    error: e.to_string(),
                });
                return true;
            }
        };

        let window_before = self.windowing.window();
        let selected_before = self.selection.len();
        let previous_count = self.store.len();

        self.location = listing.location;
        self.breadcrumb = listing.breadcrumb;
        self.store.replace(listing.items);
        let count = self.store.len();

        let recompute = match request.kind {
            ListingKind::Navigate => {
                self.selection.clear();
                self.batch_mode = false;
                self.viewport.scroll_top = 0.0;
                self.windowing.reset();
                self.windowing.set_item_count(count);
                previous_count > 0 && count > 0
            }
            ListingKind::Refresh => {
                self.selection.retain_listed(self.store.items());
                if self.windowing.set_item_count(count) {
                    let geometry = *self.windowing.geometry();
                    self.viewport.clamp_scroll(count, &geometry);
                    self.windowing.on_frame(&self.viewport);
                }
                false
            }
        };
        if recompute {
            self.windowing.request_frame();
        }

        self.emit(Event::DirectoryLoaded {
            path: self.location.clone(),
            item_count: count,
        });
        if self.selection.len() != selected_before {
            self.emit(Event::SelectionChanged {
                count: self.selection.len(),
            });
        }
        let window = self.windowing.window();
        if window != window_before {
            self.emit(Event::WindowChanged { window });
        }
        true
    }

    /// Lists `path` (or the platform default root) and shows it.
    pub async fn navigate(&mut self, path: Option<PathBuf>) -> bool {
        let request = self.begin_navigation(path);
        let result = self.collab.list_directory(request.path.clone()).await;
        self.apply_listing(request, result)
    }

    /// Re-lists the directory on screen.
    pub async fn refresh(&mut self) -> bool {
        let request = self.begin_refresh();
        let result = self.collab.list_directory(request.path.clone()).await;
        self.apply_listing(request, result)
    }

    /// Refreshes if `path` is the directory on screen; other paths are ignored.
    pub async fn on_directory_changed(&mut self, path: &Path) -> bool {
        if !self.is_current(path) {
            debug!(path = %path.display(), "ignoring change outside the current directory");
            return false;
        }
        self.refresh().await
    }

    fn is_current(&self, path: &Path) -> bool {
        self.location
            .as_deref()
            .is_some_and(|loc| normalize_path(loc) == normalize_path(path))
    }

    // ---- windowing -------------------------------------------------------

    /// Records a scroll. Returns `true` when the shell should schedule a frame.
    pub fn on_scroll(&mut self, viewport: Viewport) -> bool {
        self.viewport = viewport;
        self.windowing.request_frame()
    }

    /// Records a resize. Returns `true` when the shell should schedule a frame.
    pub fn on_resize(&mut self, viewport: Viewport) -> bool {
        self.viewport = viewport;
        self.windowing.request_frame()
    }

    /// Recomputes the window for the last recorded viewport.
    pub fn on_frame(&mut self) -> Option<VisibleWindow> {
        let window = self.windowing.on_frame(&self.viewport)?;
        self.emit(Event::WindowChanged { window });
        Some(window)
    }

    // ---- selection -------------------------------------------------------

    /// Checks or unchecks the item with `id`. Returns whether the selection changed.
    ///
    /// # Errors
    ///
    /// - [`CoreError::SelectionLimitExceeded`], also raised as an event.
    /// - [`CoreError::InvalidOption`] if `id` is not in the listing.
    pub fn toggle_selection(&mut self, id: &ItemId, checked: bool) -> CoreResult<bool> {
        let item = self
            .store
            .get(id)
            .ok_or_else(|| CoreError::InvalidOption(format!("unknown item {id}")))?;

        match self.selection.toggle(item, checked) {
            Ok(changed) => {
                if changed {
                    self.emit(Event::SelectionChanged {
                        count: self.selection.len(),
                    });
                }
                Ok(changed)
            }
            Err(e) => {
                if let CoreError::SelectionLimitExceeded { limit } = e {
                    self.emit(Event::SelectionLimitExceeded { limit });
                }
                Err(e)
            }
        }
    }

    /// Enters or leaves multi-select mode. Either way the selection is cleared.
    pub fn set_batch_mode(&mut self, enabled: bool) {
        self.batch_mode = enabled;
        if !self.selection.is_empty() {
            self.selection.clear();
            self.emit(Event::SelectionChanged { count: 0 });
        }
    }

    /// Thumbnail URL for an image, resolved once and cached on the item.
    pub fn preview_url(&mut self, id: &ItemId) -> Option<String> {
        let item = self.store.get_mut(id)?;
        if !item.is_image() {
            return None;
        }
        if let Some(url) = item.preview_url() {
            return Some(url.to_string());
        }
        let url = self.collab.resolve_preview_url(item.path(), true);
        item.set_preview_url(url.clone());
        Some(url)
    }

    // ---- batch operations ------------------------------------------------

    /// Validates a batch and claims the busy gate.
    ///
    /// Rejections are also raised as [`Event::OperationRejected`].
    pub fn begin_batch(
        &mut self,
        operation: BatchOperation,
        target: &BatchTarget,
    ) -> CoreResult<BatchTicket> {
        let kind = operation.kind();
        let targets: Vec<&Item> = match target {
            BatchTarget::Selection => self.selection.selected_items(self.store.items()),
            BatchTarget::Single(id) => self.store.get(id).into_iter().collect(),
        };

        let result = self.coordinator.begin(operation, &targets);
        if let Err(e) = &result {
            warn!(operation = %kind, error = %e, "batch rejected");
            self.emit(Event::OperationRejected {
                operation: kind,
                reason: e.to_string(),
            });
        }
        result
    }

    /// Runs a batch end to end: validation, delete confirmation, execution,
    /// notification, selection pruning and refresh.
    ///
    /// # Errors
    ///
    /// - Any rejection from [`BrowserView::begin_batch`].
    /// - [`CoreError::Cancelled`] if the user declines the delete prompt.
    ///
    /// Failures of the operation itself are reported as
    /// [`BatchOutcome::Failed`], not as an error.
    pub async fn run_batch(
        &mut self,
        operation: BatchOperation,
        target: BatchTarget,
    ) -> CoreResult<BatchOutcome> {
        let mut ticket = self.begin_batch(operation, &target)?;

        if ticket.requires_confirmation() {
            let prompt = ConfirmPrompt::delete(ticket.targets().len());
            if !self.confirm.confirm(&prompt).await {
                let operation = ticket.operation().kind();
                self.coordinator.cancel(ticket);
                info!(%operation, "batch cancelled");
                self.emit(Event::OperationCancelled { operation });
                return Err(CoreError::Cancelled);
            }
            ticket.confirm();
        }

        let result = self
            .coordinator
            .execute(self.collab.as_ref(), &ticket)
            .await;
        Ok(self.finish_batch(ticket, result).await)
    }

    /// Releases the gate, reports the outcome and, unless everything failed,
    /// prunes the succeeded paths from the selection and refreshes.
    pub async fn finish_batch(
        &mut self,
        ticket: BatchTicket,
        result: CoreResult<Vec<MutationResult>>,
    ) -> BatchOutcome {
        let operation = ticket.operation().kind();
        let output_dir = ticket.operation().output_dir().map(Path::to_path_buf);
        let outcome = self.coordinator.finish(ticket, result);

        match &outcome {
            BatchOutcome::Completed { succeeded } => {
                info!(%operation, succeeded = succeeded.len(), "batch completed");
                self.emit(Event::OperationComplete {
                    operation,
                    succeeded: succeeded.len(),
                });
            }
            BatchOutcome::Partial { succeeded, failed } => {
                warn!(%operation, succeeded = succeeded.len(), failed, "batch partially failed");
                self.emit(Event::OperationPartial {
                    operation,
                    succeeded: succeeded.len(),
                    failed: *failed,
                });
            }
            BatchOutcome::Failed { reason } => {
                warn!(%operation, %reason, "batch failed");
                self.emit(Event::OperationFailed {
                    operation,
                    error: reason.clone(),
                });
            }
        }
        if outcome.is_failure() {
            return outcome;
        }

        if self.selection.prune(outcome.succeeded()) > 0 {
            self.emit(Event::SelectionChanged {
                count: self.selection.len(),
            });
        }
        self.refresh().await;

        if let Some(dir) = output_dir {
            if !self.is_current(&dir) {
                self.emit(Event::DirectoryChanged { path: dir });
            }
        }
        outcome
    }

    // ---- commands --------------------------------------------------------

    /// Applies one [`Command`]. Failures surface as events.
    pub async fn dispatch(&mut self, command: Command) {
        match command {
            Command::Navigate(path) => {
                self.navigate(path).await;
            }
            Command::Refresh => {
                self.refresh().await;
            }
            Command::DirectoryChanged(path) => {
                self.on_directory_changed(&path).await;
            }
            Command::Scroll(viewport) => {
                self.on_scroll(viewport);
            }
            Command::Resize(viewport) => {
                self.on_resize(viewport);
            }
            Command::Frame => {
                self.on_frame();
            }
            Command::SetBatchMode(enabled) => self.set_batch_mode(enabled),
            Command::ToggleSelection(id, checked) => {
                if let Err(e) = self.toggle_selection(&id, checked) {
                    debug!(error = %e, "toggle refused");
                }
            }
        }
    }

    fn emit(&self, event: Event) {
        if self.events.send(event).is_err() {
            debug!("event receiver dropped");
        }
    }
}

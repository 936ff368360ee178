//! View state for imgdeck.
//!
//! This module contains the [`browser::BrowserView`] controller together with
//! the pieces it composes: the [`store::ItemStore`], the
//! [`selection::SelectionTracker`], the [`window::WindowingEngine`] and the
//! [`batch::BatchCoordinator`].

pub mod batch;
pub mod browser;
pub mod selection;
pub mod store;
pub mod window;

pub use batch::{
    BatchCoordinator, BatchOperation, BatchOutcome, BatchTarget, BatchTicket, Confirm,
    ConfirmPrompt, OperationKind,
};
pub use browser::{BrowserView, ListingKind, ListingRequest};
pub use selection::{SelectionTracker, SELECTION_LIMIT};
pub use store::ItemStore;
pub use window::{GridGeometry, Viewport, VisibleWindow, WindowingEngine};

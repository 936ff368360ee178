//! imgdeck core library, UI-agnostic image browser logic.
//!
//! `imgdeck-core` holds everything a frontend needs to browse folders of
//! images and run batch edits on them. Rendering is left to the shell; the
//! core exchanges [`Command`]s and [`Event`]s with it.
//!
//! # Modules
//!
//! - [`fs`]: Listing model ([`Item`], [`DirListing`]), directory reads, file mutations, volume roots, preview URLs.
//! - [`imaging`]: Compress, convert, crop and watermark operations built on `image` and `cosmic-text`.
//! - [`view`]: The [`BrowserView`] controller, windowing, selection and the batch gate.
//! - [`collab`]: The [`Collaborator`] seam between the view and the disk.
//! - [`config`]: TOML-based settings.
//! - [`event`]: Event and command types for shell ↔ core communication.
//! - [`error`]: Unified error type ([`CoreError`]) and result alias ([`CoreResult`]).

pub mod collab;
pub mod config;
pub mod error;
pub mod event;
pub mod fs;
pub mod imaging;
pub mod view;

pub use collab::{Collaborator, LocalCollaborator, MutationResult};
pub use config::settings::Config;
pub use error::{CoreError, CoreResult};
pub use event::{Command, Event, Severity};
pub use fs::ops::{
    copy_output_path, delete_path, file_info, list_directory, rename_path, sort_items,
};
pub use fs::volumes::system_paths;
pub use fs::{Crumb, DirListing, FileInfo, ImageMeta, Item, ItemId, ItemKind};
pub use imaging::{
    compress_image, convert_image, crop_image, parse_color, CropRegion, PreviewMapping,
    TargetFormat, WatermarkOptions, Watermarker,
};
pub use view::{
    BatchOperation, BatchOutcome, BatchTarget, BrowserView, Confirm, ConfirmPrompt, GridGeometry,
    OperationKind, SelectionTracker, Viewport, VisibleWindow, SELECTION_LIMIT,
};

//! File system abstractions for imgdeck.
//!
//! This module provides the listing model ([`entry::Item`], [`entry::DirListing`]),
//! directory reads and file mutations ([`ops::list_directory`]), volume roots
//! ([`volumes::system_paths`]) and preview URLs ([`preview::preview_url`]).

pub mod entry;
pub mod ops;
pub mod preview;
pub mod volumes;

pub use entry::{Crumb, DirListing, ImageMeta, Item, ItemId, ItemKind};
pub use ops::FileInfo;

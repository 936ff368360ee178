//! Directory entry representation.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use sha2::{Digest, Sha256};
use unicode_normalization::UnicodeNormalization;

/// Stable identifier of an [`Item`], derived from its normalized absolute path.
///
/// The same path always yields the same id, so selection keyed by id survives
/// a refresh as long as the entry still exists. The raw path bytes are hashed:
/// names that only differ in Unicode normalization are distinct files.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Derives the id for `path`.
    pub fn for_path(path: &Path) -> Self {
        let normalized = normalize_path(path);
        let key = normalized.as_os_str().as_encoded_bytes();
        Self(format!("{:x}", Sha256::digest(key)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Makes `path` absolute and lexically resolves `.` and `..` components.
///
/// The filesystem is never consulted, so symlinks are left untouched.
pub fn normalize_path(path: &Path) -> PathBuf {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };

    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Image-specific metadata carried by [`ItemKind::Image`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageMeta {
    pub mime_type: String,
    pub size_bytes: u64,
    /// Thumbnail URL, resolved on first use.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_url: Option<String>,
}

/// What kind of entry an [`Item`] is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ItemKind {
    Folder,
    Image(ImageMeta),
}

/// A single folder or image shown in a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    id: ItemId,
    name: String,
    path: PathBuf,
    kind: ItemKind,
}

impl Item {
    /// Creates a folder item named after the last path component.
    pub fn folder(path: PathBuf) -> Self {
        let name = display_name(&path);
        Self::with_name(path, name, ItemKind::Folder)
    }

    /// Creates an image item. The preview URL starts unresolved.
    pub fn image(path: PathBuf, mime_type: impl Into<String>, size_bytes: u64) -> Self {
        let name = display_name(&path);
        let kind = ItemKind::Image(ImageMeta {
            mime_type: mime_type.into(),
            size_bytes,
            preview_url: None,
        });
        Self::with_name(path, name, kind)
    }

    /// Creates an item with an explicit display name (volume roots, for example).
    pub fn with_name(path: PathBuf, name: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            id: ItemId::for_path(&path),
            name: name.into(),
            path,
            kind,
        }
    }

    pub fn id(&self) -> &ItemId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> &ItemKind {
        &self.kind
    }

    /// Returns `true` for folders.
    pub fn is_folder(&self) -> bool {
        matches!(self.kind, ItemKind::Folder)
    }

    /// Returns `true` for images.
    pub fn is_image(&self) -> bool {
        matches!(self.kind, ItemKind::Image(_))
    }

    /// The cached preview URL, if one has been resolved.
    pub fn preview_url(&self) -> Option<&str> {
        match &self.kind {
            ItemKind::Folder => None,
            ItemKind::Image(meta) => meta.preview_url.as_deref(),
        }
    }

    /// Caches a resolved preview URL. Ignored for folders.
    pub fn set_preview_url(&mut self, url: String) {
        if let ItemKind::Image(meta) = &mut self.kind {
            meta.preview_url = Some(url);
        }
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().nfc().collect::<String>())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// One step of the breadcrumb trail.
///
/// `target` is `None` for the synthetic "Computer" root that lists volumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Crumb {
    pub title: String,
    pub target: Option<PathBuf>,
}

impl Crumb {
    pub fn new(title: impl Into<String>, target: impl Into<PathBuf>) -> Self {
        Self {
            title: title.into(),
            target: Some(target.into()),
        }
    }

    /// The synthetic root listing every volume.
    pub fn volume_root() -> Self {
        Self {
            title: VOLUME_ROOT_TITLE.to_string(),
            target: None,
        }
    }
}

/// Title of the synthetic volume root crumb.
pub const VOLUME_ROOT_TITLE: &str = "Computer";

/// The result of listing one directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DirListing {
    /// The directory that was read, or `None` for the volume root.
    pub location: Option<PathBuf>,
    pub breadcrumb: Vec<Crumb>,
    pub items: Vec<Item>,
}

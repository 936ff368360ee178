//! The filesystem/image collaborator behind the view.
//!
//! [`BrowserView`](crate::view::BrowserView) never touches the disk itself;
//! every listing and mutation goes through a [`Collaborator`]. The
//! [`LocalCollaborator`] runs the work on the blocking thread pool.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{CoreError, CoreResult};
use crate::fs::entry::DirListing;
use crate::fs::{ops, preview};
use crate::imaging::{
    compress_image, convert_image, crop_image, CropRegion, TargetFormat, WatermarkOptions,
    Watermarker,
};

/// Per-item outcome of a mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MutationResult {
    /// The source path the operation was applied to.
    pub path: PathBuf,
    pub success: bool,
    /// The file written, for operations that produce one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl MutationResult {
    pub fn succeeded(path: PathBuf, output: Option<PathBuf>) -> Self {
        Self {
            path,
            success: true,
            output,
            error: None,
        }
    }

    pub fn failed(path: PathBuf, error: impl ToString) -> Self {
        Self {
            path,
            success: false,
            output: None,
            error: Some(error.to_string()),
        }
    }

    fn from_result(path: PathBuf, result: CoreResult<Option<PathBuf>>) -> Self {
        match result {
            Ok(output) => Self::succeeded(path, output),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "item failed");
                Self::failed(path, e)
            }
        }
    }
}

/// Listing, mutation and preview services consumed by the view.
///
/// Mutations report one [`MutationResult`] per input path; an `Err` means
/// the operation failed as a whole.
#[async_trait]
pub trait Collaborator: Send + Sync {
    /// Lists `path`, or the platform default root when `None`.
    async fn list_directory(&self, path: Option<PathBuf>) -> CoreResult<DirListing>;

    async fn delete_items(&self, paths: Vec<PathBuf>) -> CoreResult<Vec<MutationResult>>;

    async fn compress_images(
        &self,
        paths: Vec<PathBuf>,
        output_dir: PathBuf,
        quality: u8,
    ) -> CoreResult<Vec<MutationResult>>;

    async fn add_watermark(
        &self,
        paths: Vec<PathBuf>,
        text: String,
        output_dir: PathBuf,
        options: WatermarkOptions,
    ) -> CoreResult<Vec<MutationResult>>;

    async fn convert_images(
        &self,
        paths: Vec<PathBuf>,
        output_dir: PathBuf,
        format: TargetFormat,
    ) -> CoreResult<Vec<MutationResult>>;

    async fn crop_images(
        &self,
        paths: Vec<PathBuf>,
        output_dir: PathBuf,
        region: CropRegion,
    ) -> CoreResult<Vec<MutationResult>>;

    /// URL the renderer loads `path` from. Pure, never touches the disk.
    fn resolve_preview_url(&self, path: &Path, thumbnail: bool) -> String;
}

/// [`Collaborator`] backed by the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalCollaborator {
    preview_scheme: String,
}

impl Default for LocalCollaborator {
    fn default() -> Self {
        Self::new(preview::DEFAULT_PREVIEW_SCHEME)
    }
}

impl LocalCollaborator {
    pub fn new(preview_scheme: impl Into<String>) -> Self {
        Self {
            preview_scheme: preview_scheme.into(),
        }
    }
}

async fn run_blocking<T, F>(task: F) -> CoreResult<T>
where
    F: FnOnce() -> CoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| CoreError::TotalFailure {
            reason: format!("background task failed: {e}"),
        })?
}

fn for_each_path<F>(paths: Vec<PathBuf>, mut op: F) -> Vec<MutationResult>
where
    F: FnMut(&Path) -> CoreResult<Option<PathBuf>>,
{
    paths
        .into_iter()
        .map(|path| {
            let result = op(&path);
            MutationResult::from_result(path, result)
        })
        .collect()
}

#[async_trait]
impl Collaborator for LocalCollaborator {
    async fn list_directory(&self, path: Option<PathBuf>) -> CoreResult<DirListing> {
        debug!(path = ?path, "listing directory");
        run_blocking(move || ops::list_directory(path.as_deref())).await
    }

    async fn delete_items(&self, paths: Vec<PathBuf>) -> CoreResult<Vec<MutationResult>> {
        run_blocking(move || {
            Ok(for_each_path(paths, |p| ops::delete_path(p).map(|()| None)))
        })
        .await
    }

    async fn compress_images(
        &self,
        paths: Vec<PathBuf>,
        output_dir: PathBuf,
        quality: u8,
    ) -> CoreResult<Vec<MutationResult>> {
        run_blocking(move || {
            Ok(for_each_path(paths, |p| {
                compress_image(p, &output_dir, quality).map(Some)
            }))
        })
        .await
    }

    async fn add_watermark(
        &self,
        paths: Vec<PathBuf>,
        text: String,
        output_dir: PathBuf,
        options: WatermarkOptions,
    ) -> CoreResult<Vec<MutationResult>> {
        run_blocking(move || {
            let mut marker = Watermarker::new()?;
            Ok(for_each_path(paths, |p| {
                marker.apply(p, &output_dir, &text, &options).map(Some)
            }))
        })
        .await
    }

    async fn convert_images(
        &self,
        paths: Vec<PathBuf>,
        output_dir: PathBuf,
        format: TargetFormat,
    ) -> CoreResult<Vec<MutationResult>> {
        run_blocking(move || {
            Ok(for_each_path(paths, |p| {
                convert_image(p, &output_dir, format).map(Some)
            }))
        })
        .await
    }

    async fn crop_images(
        &self,
        paths: Vec<PathBuf>,
        output_dir: PathBuf,
        region: CropRegion,
    ) -> CoreResult<Vec<MutationResult>> {
        run_blocking(move || {
            Ok(for_each_path(paths, |p| {
                crop_image(p, &output_dir, region).map(Some)
            }))
        })
        .await
    }

    fn resolve_preview_url(&self, path: &Path, thumbnail: bool) -> String {
        preview::preview_url(&self.preview_scheme, path, thumbnail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::test_support::write_sample;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn mutation_result_constructors() {
        let ok = MutationResult::succeeded(PathBuf::from("/a"), Some(PathBuf::from("/b")));
        assert!(ok.success);
        assert_eq!(ok.output, Some(PathBuf::from("/b")));
        assert!(ok.error.is_none());

        let err = MutationResult::failed(PathBuf::from("/a"), "boom");
        assert!(!err.success);
        assert_eq!(err.error.as_deref(), Some("boom"));
    }

    #[test]
    fn for_each_path_keeps_order_and_itemizes() {
        let paths = vec![PathBuf::from("/ok"), PathBuf::from("/bad")];
        let results = for_each_path(paths, |p| {
            if p.ends_with("bad") {
                Err(CoreError::NotFound(p.to_path_buf()))
            } else {
                Ok(None)
            }
        });

        assert_eq!(results.len(), 2);
        assert!(results[0].success);
        assert!(!results[1].success);
        assert_eq!(results[1].path, PathBuf::from("/bad"));
        assert!(results[1].error.as_deref().unwrap().contains("not found"));
    }

    #[tokio::test]
    async fn local_listing_puts_folders_first() {
        let tmp = TempDir::new().unwrap();
        for dir in ["b_dir", "A_dir", "c_dir"] {
            fs::create_dir(tmp.path().join(dir)).unwrap();
        }
        write_sample(&tmp.path().join("z.png"), 4, 4);
        write_sample(&tmp.path().join("a.jpg"), 4, 4);
        fs::write(tmp.path().join("notes.txt"), "skip me").unwrap();

        let collab = LocalCollaborator::default();
        let listing = collab
            .list_directory(Some(tmp.path().to_path_buf()))
            .await
            .unwrap();

        let names: Vec<&str> = listing.items.iter().map(|i| i.name()).collect();
        assert_eq!(names, vec!["A_dir", "b_dir", "c_dir", "a.jpg", "z.png"]);
        assert_eq!(listing.location.as_deref(), Some(tmp.path()));
    }

    #[tokio::test]
    async fn local_compress_writes_copies() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("photo.jpg");
        write_sample(&src, 16, 16);
        let out = tmp.path().join("out");

        let collab = LocalCollaborator::default();
        let results = collab
            .compress_images(vec![src.clone()], out.clone(), 60)
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert!(results[0].success);
        assert_eq!(results[0].output, Some(out.join("photo_copy.jpg")));
        assert!(src.exists());
    }

    #[tokio::test]
    async fn local_delete_itemizes_failures() {
        let tmp = TempDir::new().unwrap();
        let present = tmp.path().join("a.png");
        write_sample(&present, 2, 2);
        let missing = tmp.path().join("gone.png");

        let collab = LocalCollaborator::default();
        let results = collab
            .delete_items(vec![present.clone(), missing.clone()])
            .await
            .unwrap();

        assert!(results[0].success);
        assert!(!present.exists());
        assert!(!results[1].success);
        assert_eq!(results[1].path, missing);
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn nfc_and_nfd_names_are_separate_items() {
        use crate::fs::entry::ItemId;
        use crate::view::{
            BatchOperation, BatchTarget, BrowserView, Confirm, ConfirmPrompt, GridGeometry,
        };
        use std::sync::Arc;

        struct Yes;

        #[async_trait]
        impl Confirm for Yes {
            async fn confirm(&self, _prompt: &ConfirmPrompt) -> bool {
                true
            }
        }

        let tmp = TempDir::new().unwrap();
        let composed = tmp.path().join("caf\u{e9}.png");
        let decomposed = tmp.path().join("cafe\u{301}.png");
        write_sample(&composed, 2, 2);
        write_sample(&decomposed, 2, 2);

        let listing = LocalCollaborator::default()
            .list_directory(Some(tmp.path().to_path_buf()))
            .await
            .unwrap();
        assert_eq!(listing.items.len(), 2);
        assert_ne!(listing.items[0].id(), listing.items[1].id());

        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let mut view = BrowserView::new(
            Arc::new(LocalCollaborator::default()),
            Arc::new(Yes),
            tx,
            GridGeometry::default(),
        );
        view.navigate(Some(tmp.path().to_path_buf())).await;
        view.set_batch_mode(true);
        view.toggle_selection(&ItemId::for_path(&composed), true).unwrap();
        assert_eq!(view.selection().len(), 1);

        view.run_batch(BatchOperation::Delete, BatchTarget::Selection)
            .await
            .unwrap();

        assert!(!composed.exists());
        assert!(decomposed.exists());
        assert_eq!(view.items().len(), 1);
    }

    #[test]
    fn custom_scheme_is_used_for_previews() {
        let collab = LocalCollaborator::new("imgdeck");
        let url = collab.resolve_preview_url(Path::new("/p/a.png"), true);
        assert!(url.starts_with("imgdeck://"));
        assert!(url.ends_with("?thumbnail=1"));
    }
}

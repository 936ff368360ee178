//! Directory reading and file mutation operations.

use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::fs::entry::{Crumb, DirListing, Item};
use crate::fs::volumes;

/// File extensions (lowercase, without the dot) listed as images.
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "webp", "svg", "ico", "tiff", "tif", "raw", "heic",
    "heif", "avif",
];

/// Returns `true` if the path has a recognised image extension.
pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_lowercase();
            IMAGE_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// MIME type for an image path, falling back to `image/*`.
pub fn image_mime_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or("image/*")
        .to_string()
}

/// The directory shown when no path is given on platforms without a volume root.
///
/// The user's Desktop when it exists, otherwise the home directory.
pub fn default_root_dir() -> PathBuf {
    let user_dirs = directories::UserDirs::new();
    if let Some(desktop) = user_dirs.as_ref().and_then(|d| d.desktop_dir()) {
        if desktop.is_dir() {
            return desktop.to_path_buf();
        }
    }
    user_dirs
        .map(|d| d.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("/"))
}

/// Lists folders and images under `path`, or the platform default root when `None`.
///
/// Relative paths are resolved against [`default_root_dir`]. Entries are
/// sorted with [`sort_items`]; files that are not images are skipped, as are
/// entries whose metadata cannot be read.
///
/// # Errors
///
/// - [`CoreError::NotFound`]: the path does not exist.
/// - [`CoreError::NotADirectory`]: the path is not a directory.
/// - [`CoreError::PermissionDenied`]: read access is denied.
pub fn list_directory(path: Option<&Path>) -> CoreResult<DirListing> {
    let target = match path {
        None if volumes::has_volume_root() => return Ok(volumes::list_volumes()),
        None => default_root_dir(),
        Some(p) if p.is_absolute() => p.to_path_buf(),
        Some(p) => default_root_dir().join(p),
    };

    let items = read_items(&target)?;
    Ok(DirListing {
        breadcrumb: breadcrumb_for(&target),
        location: Some(target),
        items,
    })
}

fn read_items(dir: &Path) -> CoreResult<Vec<Item>> {
    if !dir.exists() {
        return Err(CoreError::NotFound(dir.to_path_buf()));
    }
    if !dir.is_dir() {
        return Err(CoreError::NotADirectory(dir.to_path_buf()));
    }

    let read_dir = std::fs::read_dir(dir).map_err(|e| CoreError::from_io(e, dir))?;

    let mut items = Vec::new();
    for dir_entry in read_dir {
        let dir_entry = match dir_entry {
            Ok(e) => e,
            Err(_) => continue,
        };
        let path = dir_entry.path();
        // Follows symlinks so linked folders and images show up as their targets.
        let metadata = match std::fs::metadata(&path) {
            Ok(m) => m,
            Err(_) => continue,
        };
        if metadata.is_dir() {
            items.push(Item::folder(path));
        } else if metadata.is_file() && is_image_path(&path) {
            let mime = image_mime_type(&path);
            items.push(Item::image(path, mime, metadata.len()));
        }
    }

    sort_items(&mut items);
    Ok(items)
}

/// Sorts folders before images, then by case-insensitive name.
///
/// Names that compare equal ignoring case fall back to byte order so the
/// result is a total order.
pub fn sort_items(items: &mut [Item]) {
    items.sort_by(|a, b| {
        b.is_folder()
            .cmp(&a.is_folder())
            .then_with(|| a.name().to_lowercase().cmp(&b.name().to_lowercase()))
            .then_with(|| a.name().cmp(b.name()))
    });
}

/// Builds the root-first ancestor trail for `path`.
///
/// On platforms with a volume root the trail starts with the synthetic
/// "Computer" crumb, followed by the drive.
pub fn breadcrumb_for(path: &Path) -> Vec<Crumb> {
    let mut crumbs = Vec::new();
    if volumes::has_volume_root() {
        crumbs.push(Crumb::volume_root());
    }

    let mut acc = PathBuf::new();
    let mut prefix_title: Option<String> = None;

    for component in path.components() {
        match component {
            Component::Prefix(prefix) => {
                acc.push(prefix.as_os_str());
                prefix_title = Some(prefix.as_os_str().to_string_lossy().into_owned());
            }
            Component::RootDir => {
                acc.push(component.as_os_str());
                let title = prefix_title.take().unwrap_or_else(|| "/".to_string());
                crumbs.push(Crumb::new(title, acc.clone()));
            }
            Component::Normal(name) => {
                if let Some(title) = prefix_title.take() {
                    crumbs.push(Crumb::new(title, acc.clone()));
                }
                acc.push(name);
                crumbs.push(Crumb::new(name.to_string_lossy(), acc.clone()));
            }
            Component::CurDir => {}
            Component::ParentDir => {
                acc.pop();
                crumbs.pop();
            }
        }
    }

    if let Some(title) = prefix_title {
        crumbs.push(Crumb::new(title, acc));
    }

    crumbs
}

/// Deletes a file or directory (recursively).
///
/// Symlinks are removed, never followed.
///
/// # Errors
///
/// - [`CoreError::NotFound`] if `path` does not exist.
/// - [`CoreError::PermissionDenied`] if removal is not allowed.
/// - [`CoreError::Io`] for any other I/O failure.
pub fn delete_path(path: &Path) -> CoreResult<()> {
    let meta = std::fs::symlink_metadata(path).map_err(|e| CoreError::from_io(e, path))?;

    let result = if meta.is_dir() {
        std::fs::remove_dir_all(path)
    } else {
        std::fs::remove_file(path)
    };
    result.map_err(|e| CoreError::from_io(e, path))
}

/// Renames a file or directory within its parent directory.
///
/// Returns the new path.
///
/// # Errors
///
/// - [`CoreError::NotFound`] if `path` does not exist.
/// - [`CoreError::InvalidName`] if `new_name` is invalid or already taken.
pub fn rename_path(path: &Path, new_name: &str) -> CoreResult<PathBuf> {
    if std::fs::symlink_metadata(path).is_err() {
        return Err(CoreError::NotFound(path.to_path_buf()));
    }
    if !is_valid_filename(new_name) {
        return Err(CoreError::InvalidName(new_name.to_string()));
    }

    let parent = path
        .parent()
        .ok_or_else(|| CoreError::InvalidName("no parent directory".to_string()))?;
    let new_path = parent.join(new_name);
    if new_path.exists() {
        return Err(CoreError::InvalidName(format!("{new_name} already exists")));
    }

    std::fs::rename(path, &new_path).map_err(|e| CoreError::from_io(e, path))?;
    Ok(new_path)
}

fn is_valid_filename(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains('\0')
}

const COPY_MARKER: &str = "_copy";

/// Picks a non-existing output path in `dir` for a processed copy of `stem`.
///
/// Candidates are `<base>_copy<ext>`, then `<base>_copy1<ext>`,
/// `<base>_copy2<ext>` and so on. A stem that already ends in `_copyN`
/// keeps its base and continues numbering from `N + 1`.
pub fn copy_output_path(dir: &Path, stem: &str, extension: &str) -> PathBuf {
    let (base, existing) = split_copy_suffix(stem);
    let ext = if extension.is_empty() {
        String::new()
    } else {
        format!(".{}", extension.trim_start_matches('.'))
    };

    let mut candidate = dir.join(format!("{base}{COPY_MARKER}{ext}"));
    let mut counter = existing + 1;
    while candidate.exists() {
        candidate = dir.join(format!("{base}{COPY_MARKER}{counter}{ext}"));
        counter += 1;
    }
    candidate
}

fn split_copy_suffix(stem: &str) -> (&str, u32) {
    if let Some(idx) = stem.rfind(COPY_MARKER) {
        let (base, rest) = stem.split_at(idx);
        let digits = &rest[COPY_MARKER.len()..];
        if !base.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
            let number = if digits.is_empty() {
                1
            } else {
                digits.parse().unwrap_or(1)
            };
            return (base, number);
        }
    }
    (stem, 0)
}

/// Detailed information about a single file or folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    pub name: String,
    /// `"folder"` or the lowercase file extension.
    pub kind: String,
    pub size: u64,
    pub created: Option<SystemTime>,
    pub modified: Option<SystemTime>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Reads [`FileInfo`] for `path`. Image dimensions are best effort.
///
/// # Errors
///
/// - [`CoreError::NotFound`] if `path` does not exist.
/// - [`CoreError::PermissionDenied`] if its metadata cannot be read.
pub fn file_info(path: &Path) -> CoreResult<FileInfo> {
    let meta = std::fs::metadata(path).map_err(|e| CoreError::from_io(e, path))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    if meta.is_dir() {
        return Ok(FileInfo {
            name,
            kind: "folder".to_string(),
            size: 0,
            created: meta.created().ok(),
            modified: meta.modified().ok(),
            width: None,
            height: None,
        });
    }

    let kind = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let dimensions = if is_image_path(path) {
        image::image_dimensions(path).ok()
    } else {
        None
    };

    Ok(FileInfo {
        name,
        kind,
        size: meta.len(),
        created: meta.created().ok(),
        modified: meta.modified().ok(),
        width: dimensions.map(|(w, _)| w),
        height: dimensions.map(|(_, h)| h),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_png(path: &Path, width: u32, height: u32) {
        image::RgbImage::new(width, height).save(path).unwrap();
    }

    #[test]
    fn is_image_path_is_case_insensitive() {
        assert!(is_image_path(Path::new("a.JPG")));
        assert!(is_image_path(Path::new("a.webp")));
        assert!(!is_image_path(Path::new("a.txt")));
        assert!(!is_image_path(Path::new("jpg")));
    }

    #[test]
    fn mime_type_guessed_from_extension() {
        assert_eq!(image_mime_type(Path::new("a.png")), "image/png");
        assert_eq!(image_mime_type(Path::new("a.jpeg")), "image/jpeg");
    }

    #[test]
    fn list_directory_sorts_folders_first_alphabetically() {
        let tmp = TempDir::new().unwrap();
        for dir in ["zeta", "Alpha", "mid"] {
            fs::create_dir(tmp.path().join(dir)).unwrap();
        }
        fs::write(tmp.path().join("b.png"), "x").unwrap();
        fs::write(tmp.path().join("A.jpg"), "x").unwrap();

        let listing = list_directory(Some(tmp.path())).unwrap();
        let names: Vec<&str> = listing.items.iter().map(|i| i.name()).collect();

        assert_eq!(listing.items.len(), 5);
        assert_eq!(names, vec!["Alpha", "mid", "zeta", "A.jpg", "b.png"]);
        assert!(listing.items[..3].iter().all(Item::is_folder));
        assert!(listing.items[3..].iter().all(Item::is_image));
    }

    #[test]
    fn list_directory_skips_non_images() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("notes.txt"), "x").unwrap();
        fs::write(tmp.path().join("photo.gif"), "x").unwrap();

        let listing = list_directory(Some(tmp.path())).unwrap();
        assert_eq!(listing.items.len(), 1);
        assert_eq!(listing.items[0].name(), "photo.gif");
    }

    #[test]
    fn list_directory_records_image_size() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.png"), "12345").unwrap();

        let listing = list_directory(Some(tmp.path())).unwrap();
        match listing.items[0].kind() {
            crate::ItemKind::Image(meta) => {
                assert_eq!(meta.size_bytes, 5);
                assert_eq!(meta.mime_type, "image/png");
            }
            crate::ItemKind::Folder => panic!("expected image"),
        }
    }

    #[test]
    fn list_directory_ids_are_unique_and_stable() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("d")).unwrap();
        fs::write(tmp.path().join("a.png"), "").unwrap();
        fs::write(tmp.path().join("b.png"), "").unwrap();

        let first = list_directory(Some(tmp.path())).unwrap();
        let second = list_directory(Some(tmp.path())).unwrap();

        let mut ids: Vec<_> = first.items.iter().map(|i| i.id().clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 3);
        assert_eq!(first.items, second.items);
    }

    #[test]
    fn list_directory_reports_location_and_breadcrumb() {
        let tmp = TempDir::new().unwrap();
        let listing = list_directory(Some(tmp.path())).unwrap();
        assert_eq!(listing.location.as_deref(), Some(tmp.path()));
        let last = listing.breadcrumb.last().unwrap();
        assert_eq!(last.target.as_deref(), Some(tmp.path()));
    }

    #[test]
    fn list_directory_nonexistent_returns_not_found() {
        let tmp = TempDir::new().unwrap();
        let result = list_directory(Some(&tmp.path().join("nope")));
        assert!(matches!(result.unwrap_err(), CoreError::NotFound(_)));
    }

    #[test]
    fn list_directory_on_file_returns_not_a_directory() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("a.png");
        fs::write(&file, "").unwrap();
        let result = list_directory(Some(&file));
        assert!(matches!(result.unwrap_err(), CoreError::NotADirectory(_)));
    }

    #[test]
    fn list_directory_empty_dir() {
        let tmp = TempDir::new().unwrap();
        let listing = list_directory(Some(tmp.path())).unwrap();
        assert!(listing.items.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn breadcrumb_unix_starts_at_root() {
        let crumbs = breadcrumb_for(Path::new("/home/user/photos"));
        let titles: Vec<&str> = crumbs.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["/", "home", "user", "photos"]);
        assert_eq!(crumbs[0].target.as_deref(), Some(Path::new("/")));
        assert_eq!(crumbs[2].target.as_deref(), Some(Path::new("/home/user")));
        assert_eq!(
            crumbs[3].target.as_deref(),
            Some(Path::new("/home/user/photos"))
        );
    }

    #[cfg(unix)]
    #[test]
    fn breadcrumb_of_root_is_single_crumb() {
        let crumbs = breadcrumb_for(Path::new("/"));
        assert_eq!(crumbs.len(), 1);
        assert_eq!(crumbs[0].title, "/");
    }

    #[cfg(unix)]
    #[test]
    fn breadcrumb_resolves_parent_components() {
        let crumbs = breadcrumb_for(Path::new("/a/b/../c"));
        let titles: Vec<&str> = crumbs.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["/", "a", "c"]);
        assert_eq!(crumbs[2].target.as_deref(), Some(Path::new("/a/c")));
    }

    #[test]
    fn sort_items_is_case_insensitive_with_total_order() {
        let mut items = vec![
            Item::image(PathBuf::from("/p/b.png"), "image/png", 0),
            Item::image(PathBuf::from("/p/B.png"), "image/png", 0),
            Item::folder(PathBuf::from("/p/z")),
            Item::image(PathBuf::from("/p/a.png"), "image/png", 0),
        ];
        sort_items(&mut items);
        let names: Vec<&str> = items.iter().map(|i| i.name()).collect();
        assert_eq!(names, vec!["z", "a.png", "B.png", "b.png"]);
    }

    #[test]
    fn delete_path_removes_file() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("a.png");
        fs::write(&file, "x").unwrap();

        delete_path(&file).unwrap();
        assert!(!file.exists());
    }

    #[test]
    fn delete_path_removes_directory_recursively() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("album");
        fs::create_dir_all(dir.join("nested")).unwrap();
        fs::write(dir.join("nested/a.png"), "x").unwrap();

        delete_path(&dir).unwrap();
        assert!(!dir.exists());
    }

    #[test]
    fn delete_path_missing_returns_not_found() {
        let tmp = TempDir::new().unwrap();
        let result = delete_path(&tmp.path().join("ghost.png"));
        assert!(matches!(result.unwrap_err(), CoreError::NotFound(_)));
    }

    #[cfg(unix)]
    #[test]
    fn delete_path_symlink_keeps_target() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("real");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep.png"), "x").unwrap();
        let link = tmp.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        delete_path(&link).unwrap();
        assert!(!link.exists());
        assert!(target.join("keep.png").exists());
    }

    #[test]
    fn rename_path_moves_within_parent() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("old.png");
        fs::write(&file, "x").unwrap();

        let new_path = rename_path(&file, "new.png").unwrap();
        assert_eq!(new_path, tmp.path().join("new.png"));
        assert!(new_path.exists());
        assert!(!file.exists());
    }

    #[test]
    fn rename_path_rejects_separators() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("old.png");
        fs::write(&file, "x").unwrap();

        let result = rename_path(&file, "a/b.png");
        assert!(matches!(result.unwrap_err(), CoreError::InvalidName(_)));
    }

    #[test]
    fn rename_path_rejects_existing_target() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.png"), "x").unwrap();
        fs::write(tmp.path().join("b.png"), "y").unwrap();

        let result = rename_path(&tmp.path().join("a.png"), "b.png");
        assert!(matches!(result.unwrap_err(), CoreError::InvalidName(_)));
        assert_eq!(fs::read_to_string(tmp.path().join("b.png")).unwrap(), "y");
    }

    #[test]
    fn copy_output_path_first_candidate() {
        let tmp = TempDir::new().unwrap();
        let out = copy_output_path(tmp.path(), "cat", "jpg");
        assert_eq!(out, tmp.path().join("cat_copy.jpg"));
    }

    #[test]
    fn copy_output_path_second_candidate_is_copy1() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("cat_copy.jpg"), "").unwrap();

        let out = copy_output_path(tmp.path(), "cat", "jpg");
        assert_eq!(out, tmp.path().join("cat_copy1.jpg"));
    }

    #[test]
    fn copy_output_path_skips_existing() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("cat_copy.jpg"), "").unwrap();
        fs::write(tmp.path().join("cat_copy1.jpg"), "").unwrap();

        let out = copy_output_path(tmp.path(), "cat", "jpg");
        assert_eq!(out, tmp.path().join("cat_copy2.jpg"));
    }

    #[test]
    fn copy_output_path_continues_existing_numbering() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("cat_copy.jpg"), "").unwrap();

        let out = copy_output_path(tmp.path(), "cat_copy3", "jpg");
        assert_eq!(out, tmp.path().join("cat_copy4.jpg"));
    }

    #[test]
    fn copy_output_path_of_plain_copy_starts_at_two() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("cat_copy.png"), "").unwrap();

        let out = copy_output_path(tmp.path(), "cat_copy", ".png");
        assert_eq!(out, tmp.path().join("cat_copy2.png"));
    }

    #[test]
    fn file_info_reads_image_dimensions() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("pic.png");
        write_png(&file, 12, 7);

        let info = file_info(&file).unwrap();
        assert_eq!(info.name, "pic.png");
        assert_eq!(info.kind, "png");
        assert_eq!(info.width, Some(12));
        assert_eq!(info.height, Some(7));
        assert!(info.size > 0);
    }

    #[test]
    fn file_info_folder_has_zero_size() {
        let tmp = TempDir::new().unwrap();
        let info = file_info(tmp.path()).unwrap();
        assert_eq!(info.kind, "folder");
        assert_eq!(info.size, 0);
        assert!(info.width.is_none());
    }

    #[test]
    fn file_info_undecodable_image_has_no_dimensions() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("broken.png");
        fs::write(&file, "not a png").unwrap();

        let info = file_info(&file).unwrap();
        assert!(info.width.is_none());
        assert!(info.height.is_none());
    }
}

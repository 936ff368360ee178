//! Volume roots and well-known system locations.

use std::path::{Path, PathBuf};

use crate::fs::entry::{Crumb, DirListing, Item, ItemKind};
use crate::fs::ops::default_root_dir;

/// Returns `true` on platforms whose filesystem has several roots (drive letters).
pub fn has_volume_root() -> bool {
    cfg!(windows)
}

/// Lists the mounted drive letters `A:` through `Z:` as folder items.
///
/// The breadcrumb is the single synthetic "Computer" crumb.
pub fn list_volumes() -> DirListing {
    let items = drive_letters()
        .into_iter()
        .map(|(label, root)| Item::with_name(root, label, ItemKind::Folder))
        .collect();

    DirListing {
        location: None,
        breadcrumb: vec![Crumb::volume_root()],
        items,
    }
}

fn drive_letters() -> Vec<(String, PathBuf)> {
    (b'A'..=b'Z')
        .map(|letter| {
            let label = format!("{}:", letter as char);
            let root = PathBuf::from(format!("{label}\\"));
            (label, root)
        })
        .filter(|(_, root)| root.is_dir())
        .collect()
}

/// Mount points and the Desktop, deduplicated, in discovery order.
///
/// Drive letters on Windows, `/Volumes/*` on macOS, `/mnt/*` and `/media/*`
/// on Linux. Unreadable mount directories are skipped.
pub fn system_paths() -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = if cfg!(windows) {
        drive_letters().into_iter().map(|(_, root)| root).collect()
    } else if cfg!(target_os = "macos") {
        subdirectories(Path::new("/Volumes"))
    } else {
        ["/mnt", "/media"]
            .iter()
            .flat_map(|dir| subdirectories(Path::new(dir)))
            .collect()
    };

    let desktop = desktop_dir();
    if !paths.contains(&desktop) {
        paths.push(desktop);
    }
    paths
}

fn desktop_dir() -> PathBuf {
    directories::UserDirs::new()
        .and_then(|d| d.desktop_dir().map(Path::to_path_buf))
        .unwrap_or_else(default_root_dir)
}

fn subdirectories(dir: &Path) -> Vec<PathBuf> {
    let read_dir = match std::fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(_) => return Vec::new(),
    };

    let mut dirs: Vec<PathBuf> = read_dir
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();
    dirs
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn subdirectories_lists_only_dirs_sorted() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir(tmp.path().join("b")).unwrap();
        std::fs::create_dir(tmp.path().join("a")).unwrap();
        std::fs::write(tmp.path().join("file.png"), "").unwrap();

        let dirs = subdirectories(tmp.path());
        assert_eq!(dirs, vec![tmp.path().join("a"), tmp.path().join("b")]);
    }

    #[test]
    fn subdirectories_of_missing_dir_is_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(subdirectories(&tmp.path().join("missing")).is_empty());
    }

    #[test]
    fn system_paths_end_with_desktop_and_are_unique() {
        let paths = system_paths();
        assert!(!paths.is_empty());
        let mut deduped = paths.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), paths.len());
    }

    #[test]
    fn volume_listing_has_computer_crumb() {
        let listing = list_volumes();
        assert!(listing.location.is_none());
        assert_eq!(listing.breadcrumb, vec![Crumb::volume_root()]);
        assert!(listing.items.iter().all(Item::is_folder));
    }

    #[cfg(unix)]
    #[test]
    fn unix_has_single_root() {
        assert!(!has_volume_root());
    }
}

//! Preview URLs for local image files.
//!
//! Images are served to the renderer through a custom URL scheme instead of
//! `file://`. Every path segment is percent-encoded; drive letters on Windows
//! are kept verbatim.

use std::path::Path;

/// Default custom scheme for local previews.
pub const DEFAULT_PREVIEW_SCHEME: &str = "app-local";

/// Builds the preview URL for `path` under `scheme`.
///
/// `/a b/c.jpg` becomes `app-local:///a%20b/c.jpg`;
/// `C:\dir\c.jpg` becomes `app-local:///C:/dir/c.jpg`. Thumbnails append
/// `?thumbnail=1`.
pub fn preview_url(scheme: &str, path: &Path, thumbnail: bool) -> String {
    let raw = path.to_string_lossy();
    encode_url(scheme, &raw, cfg!(windows), thumbnail)
}

fn encode_url(scheme: &str, raw: &str, windows: bool, thumbnail: bool) -> String {
    let mut url = if windows {
        let normalized = raw.replace('\\', "/");
        match split_drive(&normalized) {
            Some((drive, rest)) => format!("{scheme}:///{drive}{}", encode_segments(rest)),
            None => format!("{scheme}:///{normalized}"),
        }
    } else {
        format!("{scheme}://{}", encode_segments(raw))
    };

    if thumbnail {
        url.push_str("?thumbnail=1");
    }
    url
}

fn split_drive(path: &str) -> Option<(&str, &str)> {
    let bytes = path.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        Some(path.split_at(2))
    } else {
        None
    }
}

fn encode_segments(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

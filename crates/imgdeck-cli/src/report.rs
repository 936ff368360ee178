//! Output formatting for listings, file info and notifications.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local};
use imgdeck_core::{Crumb, Event, FileInfo, Item, ItemKind, Severity, VisibleWindow};
use serde::Serialize;

/// One directory as printed by `ls` and `watch`.
#[derive(Debug, Serialize)]
pub struct ListingReport<'a> {
    pub location: Option<&'a Path>,
    pub breadcrumb: &'a [Crumb],
    pub total: usize,
    /// Present when only the visible window is printed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<VisibleWindow>,
    pub items: &'a [Item],
}

pub fn print_listing(report: &ListingReport<'_>, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(report)?);
        return Ok(());
    }

    println!("{}", format_breadcrumb(report.breadcrumb));
    if let Some(window) = report.window {
        println!(
            "showing {}..{} of {} ({} per row)",
            window.start,
            window.end.min(report.total),
            report.total,
            window.items_per_row
        );
    }
    if report.items.is_empty() {
        println!("  (no folders or images)");
    }
    for item in report.items {
        println!("{}", format_item(item));
    }
    Ok(())
}

fn format_breadcrumb(crumbs: &[Crumb]) -> String {
    crumbs
        .iter()
        .map(|c| c.title.as_str())
        .collect::<Vec<_>>()
        .join(" > ")
}

fn format_item(item: &Item) -> String {
    match item.kind() {
        ItemKind::Folder => format!("  [dir]  {}/", item.name()),
        ItemKind::Image(meta) => {
            let mut line = format!(
                "  [img]  {:<32} {:>10}  {}",
                item.name(),
                format_size(meta.size_bytes),
                meta.mime_type
            );
            if let Some(url) = &meta.preview_url {
                line.push_str("  ");
                line.push_str(url);
            }
            line
        }
    }
}

pub fn print_file_info(info: &FileInfo, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(info)?);
        return Ok(());
    }
    println!("name:      {}", info.name);
    println!("kind:      {}", info.kind);
    println!("size:      {}", format_size(info.size));
    println!("created:   {}", format_time(info.created));
    println!("modified:  {}", format_time(info.modified));
    if let (Some(w), Some(h)) = (info.width, info.height) {
        println!("dimensions: {w} x {h}");
    }
    Ok(())
}

pub fn print_paths(paths: &[PathBuf], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string(paths)?);
    } else {
        for path in paths {
            println!("{}", path.display());
        }
    }
    Ok(())
}

/// Prints notifications; pure state updates are skipped.
pub fn print_event(event: &Event, json: bool) {
    let notable = event.severity().is_some() || matches!(event, Event::DirectoryChanged { .. });
    if !notable {
        return;
    }
    if json {
        match serde_json::to_string(event) {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::warn!(error = %e, "could not serialize event"),
        }
        return;
    }
    if let Some(line) = format_event(event) {
        eprintln!("{line}");
    }
}

fn format_event(event: &Event) -> Option<String> {
    if let Event::DirectoryChanged { path } = event {
        return Some(format!("wrote files to {}", path.display()));
    }
    let prefix = match event.severity()? {
        Severity::Info => "ok",
        Severity::Warning => "warning",
        Severity::Error => "error",
    };
    Some(format!("{prefix}: {}", event.message()?))
}

fn format_time(time: Option<SystemTime>) -> String {
    time.map(|t| DateTime::<Local>::from(t).format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imgdeck_core::OperationKind;

    #[test]
    fn format_size_units() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn breadcrumb_is_joined() {
        let crumbs = vec![Crumb::new("/", "/"), Crumb::new("photos", "/photos")];
        assert_eq!(format_breadcrumb(&crumbs), "/ > photos");
    }

    #[test]
    fn folder_line_has_slash() {
        let line = format_item(&Item::folder(PathBuf::from("/p/trips")));
        assert!(line.contains("[dir]"));
        assert!(line.ends_with("trips/"));
    }

    #[test]
    fn image_line_shows_size_and_preview() {
        let mut item = Item::image(PathBuf::from("/p/a.png"), "image/png", 2048);
        item.set_preview_url("app-local:///p/a.png?thumbnail=1".to_string());
        let line = format_item(&item);
        assert!(line.contains("2.0 KB"));
        assert!(line.contains("image/png"));
        assert!(line.ends_with("?thumbnail=1"));
    }

    #[test]
    fn partial_event_is_a_warning() {
        let event = Event::OperationPartial {
            operation: OperationKind::Delete,
            succeeded: 1,
            failed: 1,
        };
        assert_eq!(
            format_event(&event).unwrap(),
            "warning: delete: 1 succeeded, 1 failed"
        );
    }

    #[test]
    fn state_events_are_silent() {
        assert!(format_event(&Event::SelectionChanged { count: 2 }).is_none());
        let changed = Event::DirectoryChanged {
            path: PathBuf::from("/out"),
        };
        assert_eq!(format_event(&changed).unwrap(), "wrote files to /out");
    }

    #[test]
    fn missing_time_is_dash() {
        assert_eq!(format_time(None), "-");
    }
}

//! Event system for communication between the shell and the core.
//!
//! The shell translates user input into [`Command`]s, which the
//! [`BrowserView`](crate::view::BrowserView) processes and answers with
//! [`Event`]s on its event bus. Every user-visible notification is an event.

use std::path::PathBuf;

use serde::Serialize;

use crate::error::CoreError;
use crate::fs::entry::ItemId;
use crate::view::batch::OperationKind;
use crate::view::window::{Viewport, VisibleWindow};

/// A request the shell asks the view to perform.
///
/// Commands flow **shell → core**. The core never creates commands itself.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// List `path`, or the platform default root when `None`.
    Navigate(Option<PathBuf>),
    /// Re-list the current directory.
    Refresh,
    /// A directory changed outside the view.
    DirectoryChanged(PathBuf),
    /// The scroll offset changed.
    Scroll(Viewport),
    /// The container was resized.
    Resize(Viewport),
    /// The frame scheduled after a scroll or resize is due.
    Frame,
    /// Enter or leave multi-select mode.
    SetBatchMode(bool),
    /// Check or uncheck one item.
    ToggleSelection(ItemId, bool),
}

/// How prominently a notification should be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A notification the view sends back to the shell.
///
/// Events flow **core → shell**.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    /// A listing was applied.
    DirectoryLoaded {
        /// The directory listed, `None` for the volume root.
        path: Option<PathBuf>,
        item_count: usize,
    },
    /// A listing failed; the previous content is still shown.
    ListingFailed {
        path: Option<PathBuf>,
        error: String,
    },
    /// The rendered index range changed.
    WindowChanged { window: VisibleWindow },
    /// The number of selected items changed.
    SelectionChanged { count: usize },
    /// A check was refused because the selection is full.
    SelectionLimitExceeded { limit: usize },
    OperationComplete {
        operation: OperationKind,
        succeeded: usize,
    },
    OperationPartial {
        operation: OperationKind,
        succeeded: usize,
        failed: usize,
    },
    OperationFailed {
        operation: OperationKind,
        error: String,
    },
    /// The operation was refused before it started (busy, invalid options).
    OperationRejected {
        operation: OperationKind,
        reason: String,
    },
    /// The user declined the confirmation prompt.
    OperationCancelled { operation: OperationKind },
    /// Files were written into a directory other than the one on screen.
    DirectoryChanged { path: PathBuf },
}

impl Event {
    /// Severity of the user-facing notification, or `None` for state updates
    /// that need no notification.
    pub fn severity(&self) -> Option<Severity> {
        match self {
            Event::DirectoryLoaded { .. }
            | Event::WindowChanged { .. }
            | Event::SelectionChanged { .. }
            | Event::DirectoryChanged { .. } => None,
            Event::OperationComplete { .. } | Event::OperationCancelled { .. } => {
                Some(Severity::Info)
            }
            Event::SelectionLimitExceeded { .. }
            | Event::OperationPartial { .. }
            | Event::OperationRejected { .. } => Some(Severity::Warning),
            Event::ListingFailed { .. } | Event::OperationFailed { .. } => Some(Severity::Error),
        }
    }

    /// Notification text, for events that carry one.
    pub fn message(&self) -> Option<String> {
        let text = match self {
            Event::DirectoryLoaded { .. }
            | Event::WindowChanged { .. }
            | Event::SelectionChanged { .. }
            | Event::DirectoryChanged { .. } => return None,
            Event::ListingFailed { error, .. } => format!("Failed to read directory: {error}"),
            Event::SelectionLimitExceeded { limit } => {
                CoreError::SelectionLimitExceeded { limit: *limit }.to_string()
            }
            Event::OperationComplete {
                operation,
                succeeded,
            } => format!("{operation}: {succeeded} succeeded"),
            Event::OperationPartial {
                operation,
                succeeded,
                failed,
            } => {
                let detail = CoreError::PartialFailure {
                    succeeded: *succeeded,
                    failed: *failed,
                };
                format!("{operation}: {detail}")
            }
            Event::OperationFailed { operation, error } => format!("{operation} failed: {error}"),
            Event::OperationRejected { operation, reason } => {
                format!("{operation} not started: {reason}")
            }
            Event::OperationCancelled { operation } => format!("{operation} cancelled"),
        };
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_message_itemizes_counts() {
        let event = Event::OperationPartial {
            operation: OperationKind::Delete,
            succeeded: 1,
            failed: 1,
        };
        assert_eq!(event.message().unwrap(), "delete: 1 succeeded, 1 failed");
        assert_eq!(event.severity(), Some(Severity::Warning));
    }

    #[test]
    fn state_updates_have_no_message() {
        let event = Event::SelectionChanged { count: 3 };
        assert!(event.message().is_none());
        assert!(event.severity().is_none());
    }

    #[test]
    fn selection_limit_message() {
        let event = Event::SelectionLimitExceeded { limit: 10 };
        assert_eq!(
            event.message().unwrap(),
            "at most 10 items can be selected at once"
        );
    }

    #[test]
    fn failures_are_errors() {
        let event = Event::OperationFailed {
            operation: OperationKind::Compress,
            error: "disk full".to_string(),
        };
        assert_eq!(event.severity(), Some(Severity::Error));
        assert_eq!(event.message().unwrap(), "compress failed: disk full");
    }

    #[test]
    fn event_serializes_with_tag() {
        let event = Event::OperationCancelled {
            operation: OperationKind::Delete,
        };
        let value = toml::Value::try_from(&event).unwrap();
        assert_eq!(value.get("event").unwrap().as_str(), Some("operation_cancelled"));
        assert_eq!(value.get("operation").unwrap().as_str(), Some("delete"));
    }
}

//! Batch operation coordination.
//!
//! A batch runs in three steps: [`BatchCoordinator::begin`] validates the
//! request and claims the busy gate, [`BatchCoordinator::execute`] calls the
//! collaborator, and [`BatchCoordinator::finish`] releases the gate and
//! classifies the itemized results. Deletes must be confirmed on the
//! [`BatchTicket`] before they can execute.

use std::fmt;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;

use crate::collab::{Collaborator, MutationResult};
use crate::error::{CoreError, CoreResult};
use crate::fs::entry::{Item, ItemId};
use crate::imaging::placement::WatermarkOptions;
use crate::imaging::watermark::validate_text;
use crate::imaging::{CropRegion, TargetFormat};

/// Which operation a batch performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Delete,
    Compress,
    Watermark,
    Convert,
    Crop,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationKind::Delete => "delete",
            OperationKind::Compress => "compress",
            OperationKind::Watermark => "watermark",
            OperationKind::Convert => "convert",
            OperationKind::Crop => "crop",
        };
        f.write_str(name)
    }
}

/// An operation with its parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOperation {
    Delete,
    Compress {
        output_dir: PathBuf,
        quality: u8,
    },
    Watermark {
        output_dir: PathBuf,
        text: String,
        options: WatermarkOptions,
    },
    Convert {
        output_dir: PathBuf,
        format: TargetFormat,
    },
    Crop {
        output_dir: PathBuf,
        region: CropRegion,
    },
}

impl BatchOperation {
    pub fn kind(&self) -> OperationKind {
        match self {
            BatchOperation::Delete => OperationKind::Delete,
            BatchOperation::Compress { .. } => OperationKind::Compress,
            BatchOperation::Watermark { .. } => OperationKind::Watermark,
            BatchOperation::Convert { .. } => OperationKind::Convert,
            BatchOperation::Crop { .. } => OperationKind::Crop,
        }
    }

    /// Directory the operation writes into, if it produces files.
    pub fn output_dir(&self) -> Option<&Path> {
        match self {
            BatchOperation::Delete => None,
            BatchOperation::Compress { output_dir, .. }
            | BatchOperation::Watermark { output_dir, .. }
            | BatchOperation::Convert { output_dir, .. }
            | BatchOperation::Crop { output_dir, .. } => Some(output_dir),
        }
    }

    /// Whether folders are skipped as targets.
    pub fn images_only(&self) -> bool {
        !matches!(self, BatchOperation::Delete)
    }

    /// Checks parameters that don't depend on the targets.
    pub fn validate(&self) -> CoreResult<()> {
        match self {
            BatchOperation::Delete
            | BatchOperation::Convert { .. }
            | BatchOperation::Crop { .. } => Ok(()),
            BatchOperation::Compress { quality, .. } => {
                if (1..=100).contains(quality) {
                    Ok(())
                } else {
                    Err(CoreError::InvalidOption(format!(
                        "quality must be between 1 and 100, got {quality}"
                    )))
                }
            }
            BatchOperation::Watermark { text, .. } => validate_text(text),
        }
    }
}

/// What a batch applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchTarget {
    /// The current multi-selection.
    Selection,
    /// One explicitly chosen item, overriding the selection.
    Single(ItemId),
}

/// A validated batch holding the busy gate.
#[derive(Debug)]
pub struct BatchTicket {
    seq: u64,
    operation: BatchOperation,
    targets: Vec<PathBuf>,
    confirmed: bool,
}

impl BatchTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn operation(&self) -> &BatchOperation {
        &self.operation
    }

    pub fn targets(&self) -> &[PathBuf] {
        &self.targets
    }

    /// `true` for a delete that has not been confirmed yet.
    pub fn requires_confirmation(&self) -> bool {
        matches!(self.operation, BatchOperation::Delete) && !self.confirmed
    }

    /// Records the user's confirmation.
    pub fn confirm(&mut self) {
        self.confirmed = true;
    }
}

/// Result of a finished batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    Completed {
        succeeded: Vec<PathBuf>,
    },
    Partial {
        succeeded: Vec<PathBuf>,
        failed: usize,
    },
    Failed {
        reason: String,
    },
}

impl BatchOutcome {
    /// Paths that were mutated successfully.
    pub fn succeeded(&self) -> &[PathBuf] {
        match self {
            BatchOutcome::Completed { succeeded } | BatchOutcome::Partial { succeeded, .. } => {
                succeeded
            }
            BatchOutcome::Failed { .. } => &[],
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, BatchOutcome::Failed { .. })
    }
}

/// Text shown when asking the user to confirm a destructive batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmPrompt {
    pub title: String,
    pub message: String,
    pub count: usize,
}

impl ConfirmPrompt {
    pub fn delete(count: usize) -> Self {
        let noun = if count == 1 { "item" } else { "items" };
        Self {
            title: "Delete".to_string(),
            message: format!("Permanently delete {count} {noun}? This cannot be undone."),
            count,
        }
    }
}

/// Asks the user to confirm a destructive operation.
#[async_trait]
pub trait Confirm: Send + Sync {
    async fn confirm(&self, prompt: &ConfirmPrompt) -> bool;
}

/// Serializes batch operations through a busy gate.
#[derive(Debug, Default)]
pub struct BatchCoordinator {
    busy: bool,
    next_seq: u64,
}

impl BatchCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` while a ticket is outstanding.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Validates `operation` against `targets` and claims the gate.
    ///
    /// Image-only operations silently drop folder targets.
    ///
    /// # Errors
    ///
    /// - [`CoreError::InvalidOption`] for bad parameters or no usable target.
    /// - [`CoreError::Busy`] while another ticket is outstanding.
    pub fn begin(
        &mut self,
        operation: BatchOperation,
        targets: &[&Item],
    ) -> CoreResult<BatchTicket> {
        operation.validate()?;

        let paths: Vec<PathBuf> = targets
            .iter()
            .filter(|item| !operation.images_only() || item.is_image())
            .map(|item| item.path().to_path_buf())
            .collect();
        if paths.is_empty() {
            let reason = if operation.images_only() && !targets.is_empty() {
                "no images among the chosen items"
            } else {
                "nothing selected"
            };
            return Err(CoreError::InvalidOption(reason.to_string()));
        }

        if self.busy {
            return Err(CoreError::Busy);
        }
        self.busy = true;
        self.next_seq += 1;

        Ok(BatchTicket {
            seq: self.next_seq,
            operation,
            targets: paths,
            confirmed: false,
        })
    }

    /// Releases the gate without running the ticket.
    pub fn cancel(&mut self, _ticket: BatchTicket) {
        self.busy = false;
    }

    /// Runs the ticket's operation through `collab`.
    ///
    /// # Errors
    ///
    /// [`CoreError::ConfirmationRequired`] for an unconfirmed delete; any
    /// error the collaborator returns for the batch as a whole.
    pub async fn execute(
        &self,
        collab: &dyn Collaborator,
        ticket: &BatchTicket,
    ) -> CoreResult<Vec<MutationResult>> {
        if ticket.requires_confirmation() {
            return Err(CoreError::ConfirmationRequired);
        }
        let paths = ticket.targets.clone();
        match &ticket.operation {
            BatchOperation::Delete => collab.delete_items(paths).await,
            BatchOperation::Compress {
                output_dir,
                quality,
            } => {
                collab
                    .compress_images(paths, output_dir.clone(), *quality)
                    .await
            }
            BatchOperation::Watermark {
                output_dir,
                text,
                options,
            } => {
                collab
                    .add_watermark(paths, text.clone(), output_dir.clone(), options.clone())
                    .await
            }
            BatchOperation::Convert { output_dir, format } => {
                collab
                    .convert_images(paths, output_dir.clone(), *format)
                    .await
            }
            BatchOperation::Crop { output_dir, region } => {
                collab.crop_images(paths, output_dir.clone(), *region).await
            }
        }
    }

    /// Releases the gate and classifies `result`.
    pub fn finish(
        &mut self,
        _ticket: BatchTicket,
        result: CoreResult<Vec<MutationResult>>,
    ) -> BatchOutcome {
        self.busy = false;

        let results = match result {
            Ok(results) => results,
            Err(e) => {
                return BatchOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        };

        let (ok, failed): (Vec<MutationResult>, Vec<MutationResult>) =
            results.into_iter().partition(|r| r.success);
        let succeeded: Vec<PathBuf> = ok.into_iter().map(|r| r.path).collect();

        match (succeeded.is_empty(), failed.is_empty()) {
            (false, true) => BatchOutcome::Completed { succeeded },
            (false, false) => BatchOutcome::Partial {
                succeeded,
                failed: failed.len(),
            },
            (true, _) => {
                let reason = failed
                    .into_iter()
                    .find_map(|r| r.error)
                    .unwrap_or_else(|| "no item was processed".to_string());
                BatchOutcome::Failed { reason }
            }
        }
    }
}

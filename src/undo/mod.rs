//! Undo log: one record per operation kind describing the last completed run.

pub mod record;

pub use record::UndoRecord;

use crate::api::{ApiError, CollectionApi};
use crate::checkpoint::{AtomicOps, CheckpointError, CollectionId, ItemId, OperationKind};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info, warn};

/// Result type for undo operations
pub type UndoResult<T> = Result<T, UndoError>;

#[derive(Error, Debug)]
pub enum UndoError {
    #[error("Operation type mismatch: {found} != {expected}")]
    KindMismatch {
        expected: OperationKind,
        found: OperationKind,
    },

    #[error("No {kind} operation to undo")]
    NothingToUndo { kind: OperationKind },

    #[error("Failed to write undo record: {0}")]
    Storage(#[from] CheckpointError),
}

/// Direction of a single undo call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoAction {
    Remove,
    Add,
}

/// One remote call made (or planned) by an undo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoStep {
    pub action: UndoAction,
    pub collection_id: CollectionId,
    pub item_id: ItemId,
}

/// Result of undoing a record
#[derive(Debug, Clone, Default)]
pub struct UndoReport {
    /// Every call the undo needs, in execution order
    pub planned: Vec<UndoStep>,
    /// Number of calls that succeeded
    pub performed: usize,
    pub dry_run: bool,
    pub success: bool,
    pub error: Option<String>,
}

/// Persistent undo journal for one operation kind
#[derive(Debug, Clone)]
pub struct UndoLog {
    state_dir: PathBuf,
    kind: OperationKind,
}

impl UndoLog {
    pub fn new(state_dir: impl Into<PathBuf>, kind: OperationKind) -> Self {
        Self {
            state_dir: state_dir.into(),
            kind,
        }
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Path of the record file
    pub fn path(&self) -> PathBuf {
        self.state_dir.join(format!("undo_{}.json", self.kind))
    }

    /// Overwrite the stored record for this kind
    pub fn record_operation(&self, record: &UndoRecord) -> UndoResult<()> {
        if record.kind != self.kind {
            return Err(UndoError::KindMismatch {
                expected: self.kind,
                found: record.kind,
            });
        }

        let path = self.path();
        AtomicOps::write_json(&path, record)?;
        info!(path = %path.display(), items = record.items.len(), "Saved undo operation");
        Ok(())
    }

    /// The stored record, if present and readable
    pub fn last_operation(&self) -> Option<UndoRecord> {
        let path = self.path();
        if !path.exists() {
            return None;
        }

        match AtomicOps::read_json::<UndoRecord>(&path) {
            Ok(record) if record.kind == self.kind => Some(record),
            Ok(record) => {
                warn!(path = %path.display(), found = %record.kind, "Undo record has wrong operation type");
                None
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Error loading undo operation");
                None
            }
        }
    }

    /// Delete the stored record. Failures are logged, never raised.
    pub fn clear(&self) {
        let path = self.path();
        match std::fs::remove_file(&path) {
            Ok(()) => info!(path = %path.display(), "Cleared undo state"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => error!(path = %path.display(), error = %e, "Error clearing undo state"),
        }
    }

    /// Reverse a record.
    ///
    /// Moves are undone by removing each item from the destinations it was
    /// placed in and adding it back to every source; copies only remove. The
    /// first failed call aborts the undo.
    pub async fn undo<A: CollectionApi + ?Sized>(
        &self,
        api: &A,
        record: &UndoRecord,
        dry_run: bool,
    ) -> UndoReport {
        let planned = plan(record);
        let mut report = UndoReport {
            dry_run,
            ..Default::default()
        };

        if dry_run {
            info!(
                kind = %record.kind,
                calls = planned.len(),
                items = record.items.len(),
                was_move = record.was_move,
                "Would undo operation"
            );
            report.planned = planned;
            report.success = true;
            return report;
        }

        for step in &planned {
            let ids = [step.item_id.clone()];
            let result = match step.action {
                UndoAction::Remove => api.remove_items(&step.collection_id, &ids).await,
                UndoAction::Add => api.add_items(&step.collection_id, &ids).await,
            };

            match result {
                Ok(done) if done.contains(&step.item_id) => report.performed += 1,
                Ok(_) => {
                    report.error = Some(step_failure(step, None));
                    break;
                }
                Err(e) => {
                    report.error = Some(step_failure(step, Some(&e)));
                    break;
                }
            }
        }

        report.planned = planned;
        report.success = report.error.is_none();
        if let Some(message) = &report.error {
            error!(kind = %record.kind, performed = report.performed, "Error undoing operation: {}", message);
        } else {
            info!(kind = %record.kind, calls = report.performed, "Successfully undid operation");
        }
        report
    }

    /// Undo the stored record and clear it on success
    pub async fn undo_last<A: CollectionApi + ?Sized>(
        &self,
        api: &A,
        dry_run: bool,
    ) -> UndoResult<UndoReport> {
        let record = self
            .last_operation()
            .ok_or(UndoError::NothingToUndo { kind: self.kind })?;

        let report = self.undo(api, &record, dry_run).await;
        if report.success && !dry_run {
            self.clear();
        }
        Ok(report)
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }
}

fn plan(record: &UndoRecord) -> Vec<UndoStep> {
    let mut steps = Vec::new();
    for item_id in &record.items {
        for destination in &record.destinations {
            if record.is_mapped(destination, item_id) {
                steps.push(UndoStep {
                    action: UndoAction::Remove,
                    collection_id: destination.clone(),
                    item_id: item_id.clone(),
                });
            }
        }
        if record.was_move {
            for source in &record.sources {
                steps.push(UndoStep {
                    action: UndoAction::Add,
                    collection_id: source.clone(),
                    item_id: item_id.clone(),
                });
            }
        }
    }
    steps
}

fn step_failure(step: &UndoStep, error: Option<&ApiError>) -> String {
    let verb = match step.action {
        UndoAction::Remove => "remove",
        UndoAction::Add => "add",
    };
    match error {
        Some(e) => format!("{} {} in {}: {}", verb, step.item_id, step.collection_id, e),
        None => format!("{} {} in {} was rejected", verb, step.item_id, step.collection_id),
    }
}

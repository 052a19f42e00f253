//! Run reports

use crate::checkpoint::{CollectionId, ItemId, OperationKind};
use serde::Serialize;

/// How a destination ended up in this run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationStatus {
    /// Every working-set item was processed
    Succeeded,
    /// At least one working-set item failed
    PartiallyFailed,
    /// Completed by an earlier run; not reprocessed
    AlreadyComplete,
    /// Listed before the requested resume destination
    Skipped,
    /// Nothing was mutated on purpose
    DryRun,
    /// Stopped by a hard error; later destinations were not attempted
    Aborted,
}

/// Outcome of one (source, destination) pair
#[derive(Debug, Clone, Serialize)]
pub struct DestinationReport {
    pub source_id: CollectionId,
    pub destination_id: CollectionId,
    pub status: DestinationStatus,
    /// Items selected for mutation in this run, in fetch order
    pub working_set: Vec<ItemId>,
    pub succeeded: Vec<ItemId>,
    pub failed: Vec<ItemId>,
    /// Moves only: added to the destination and removed from the source
    pub moved: Vec<ItemId>,
    /// Moves only: added to the destination but still present in the source
    pub pending_source_removal: Vec<ItemId>,
    pub skipped_processed: usize,
    pub skipped_failed: usize,
    pub not_matched: usize,
    pub truncated: bool,
    pub completed: bool,
    /// Set when the destination was aborted
    pub error: Option<String>,
}

impl DestinationReport {
    pub(crate) fn new(source_id: &str, destination_id: &str, status: DestinationStatus) -> Self {
        Self {
            source_id: source_id.to_string(),
            destination_id: destination_id.to_string(),
            status,
            working_set: Vec::new(),
            succeeded: Vec::new(),
            failed: Vec::new(),
            moved: Vec::new(),
            pending_source_removal: Vec::new(),
            skipped_processed: 0,
            skipped_failed: 0,
            not_matched: 0,
            truncated: false,
            completed: false,
            error: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.error.is_none()
    }

    /// Whether this run changed anything remotely
    pub fn mutated(&self) -> bool {
        !self.succeeded.is_empty() || !self.moved.is_empty()
    }
}

/// Outcome of a whole operation
#[derive(Debug, Clone, Serialize)]
pub struct OperationReport {
    pub kind: OperationKind,
    pub dry_run: bool,
    pub destinations: Vec<DestinationReport>,
    pub undo_recorded: bool,
}

impl OperationReport {
    pub fn succeeded_count(&self) -> usize {
        self.destinations.iter().map(|d| d.succeeded.len()).sum()
    }

    pub fn failed_count(&self) -> usize {
        self.destinations.iter().map(|d| d.failed.len()).sum()
    }

    /// Items that would be (or were) mutated
    pub fn working_set_count(&self) -> usize {
        self.destinations.iter().map(|d| d.working_set.len()).sum()
    }

    pub fn pending_source_removal(&self) -> Vec<&ItemId> {
        self.destinations
            .iter()
            .flat_map(|d| d.pending_source_removal.iter())
            .collect()
    }

    pub fn is_aborted(&self) -> bool {
        self.destinations
            .iter()
            .any(|d| d.status == DestinationStatus::Aborted)
    }

    /// True when no item failed and no destination was aborted
    pub fn is_success(&self) -> bool {
        self.destinations.iter().all(DestinationReport::is_success)
    }

    /// True when the run left nothing for a follow-up run to fix
    pub fn is_clean(&self) -> bool {
        self.is_success() && self.pending_source_removal().is_empty()
    }

    /// "N succeeded, M failed"
    pub fn summary(&self) -> String {
        if self.dry_run {
            return format!("{} would be processed (dry run)", self.working_set_count());
        }
        format!(
            "{} succeeded, {} failed{}",
            self.succeeded_count(),
            self.failed_count(),
            if self.is_aborted() { " (aborted)" } else { "" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_and_flags() {
        let mut ok = DestinationReport::new("S", "D1", DestinationStatus::Succeeded);
        ok.succeeded = vec!["v1".into(), "v2".into()];
        let mut bad = DestinationReport::new("S", "D2", DestinationStatus::PartiallyFailed);
        bad.failed = vec!["v3".into()];

        let report = OperationReport {
            kind: OperationKind::Copy,
            dry_run: false,
            destinations: vec![ok, bad],
            undo_recorded: true,
        };

        assert_eq!(report.summary(), "2 succeeded, 1 failed");
        assert!(!report.is_success());
        assert!(!report.is_clean());
    }

    #[test]
    fn test_pending_removal_is_not_clean() {
        let mut d = DestinationReport::new("S", "D", DestinationStatus::Succeeded);
        d.succeeded = vec!["v1".into()];
        d.pending_source_removal = vec!["v1".into()];
        let report = OperationReport {
            kind: OperationKind::Move,
            dry_run: false,
            destinations: vec![d],
            undo_recorded: true,
        };
        assert!(report.is_success());
        assert!(!report.is_clean());
    }

    #[test]
    fn test_aborted_destination_fails_the_run() {
        let mut ok = DestinationReport::new("S", "D1", DestinationStatus::Succeeded);
        ok.succeeded = vec!["v1".into()];
        let mut aborted = DestinationReport::new("S", "D2", DestinationStatus::Aborted);
        aborted.error = Some("Classification failed: boom".into());

        let report = OperationReport {
            kind: OperationKind::Classify,
            dry_run: false,
            destinations: vec![ok, aborted],
            undo_recorded: true,
        };

        assert!(report.is_aborted());
        assert!(!report.is_success());
        assert_eq!(report.summary(), "1 succeeded, 0 failed (aborted)");
    }
}

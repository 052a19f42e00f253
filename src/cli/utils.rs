//! Shared rendering helpers for CLI commands

use crate::checkpoint::Checkpoint;
use crate::engine::{DestinationReport, DestinationStatus, OperationReport};
use crate::undo::{UndoAction, UndoStep};
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};

/// Table of the destinations recorded in a checkpoint, sorted by id
pub fn destination_table(checkpoint: &Checkpoint) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            "Destination",
            "Title",
            "Processed",
            "Failed",
            "Failures",
            "Status",
        ]);

    let mut ids: Vec<&String> = checkpoint
        .destination_metadata
        .keys()
        .chain(checkpoint.destination_progress.keys())
        .collect();
    ids.sort();
    ids.dedup();

    for id in ids {
        let title = checkpoint
            .destination_metadata
            .get(id)
            .map(|m| m.title.as_str())
            .filter(|t| !t.is_empty())
            .unwrap_or(id.as_str());
        let progress = checkpoint.progress(id).cloned().unwrap_or_default();
        let status = if progress.completed {
            "completed"
        } else {
            "in progress"
        };

        table.add_row(vec![
            Cell::new(id),
            Cell::new(title),
            Cell::new(progress.processed_items.len()),
            Cell::new(progress.failed_items.len()),
            Cell::new(progress.failure_count),
            Cell::new(status),
        ]);
    }

    table
}

/// One line per destination
pub fn destination_line(report: &DestinationReport) -> String {
    let prefix = format!("{} -> {}", report.source_id, report.destination_id);
    match report.status {
        DestinationStatus::AlreadyComplete => format!("{}: already complete", prefix),
        DestinationStatus::Skipped => format!("{}: skipped (before resume point)", prefix),
        DestinationStatus::Aborted => format!(
            "{}: aborted after {} succeeded ({})",
            prefix,
            report.succeeded.len(),
            report.error.as_deref().unwrap_or("unknown error")
        ),
        DestinationStatus::DryRun => format!(
            "{}: {} would be processed",
            prefix,
            report.working_set.len()
        ),
        DestinationStatus::Succeeded | DestinationStatus::PartiallyFailed => {
            let mut line = format!(
                "{}: {} succeeded, {} failed",
                prefix,
                report.succeeded.len(),
                report.failed.len()
            );
            if report.skipped_processed > 0 {
                line.push_str(&format!(", {} already processed", report.skipped_processed));
            }
            if report.truncated {
                line.push_str(" (limit reached)");
            }
            line
        }
    }
}

/// Human summary of an operation, one entry per line
pub fn report_lines(report: &OperationReport, verbose: bool) -> Vec<String> {
    let mut lines = Vec::new();
    for destination in &report.destinations {
        lines.push(destination_line(destination));
        if verbose {
            let ids = if report.dry_run {
                &destination.working_set
            } else {
                &destination.succeeded
            };
            lines.extend(ids.iter().map(|id| format!("  {}", id)));
        }
    }
    lines
}

/// Human description of one undo call
pub fn undo_step_line(step: &UndoStep) -> String {
    match step.action {
        UndoAction::Remove => format!("remove {} from {}", step.item_id, step.collection_id),
        UndoAction::Add => format!("add {} to {}", step.item_id, step.collection_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::{CollectionInfo, Item, OperationKind};

    #[test]
    fn test_destination_table() {
        let mut checkpoint = Checkpoint::new("PLsrc", OperationKind::Move);
        checkpoint.add_destination("PLb", CollectionInfo::new("Bravo"));
        checkpoint.add_destination("PLa", CollectionInfo::new(""));
        checkpoint
            .assign_item("v1", "PLb", true, Some(&Item::minimal("v1")))
            .unwrap();
        checkpoint.mark_complete("PLb").unwrap();

        let rendered = destination_table(&checkpoint).to_string();
        let pos_a = rendered.find("PLa").unwrap();
        let pos_b = rendered.find("PLb").unwrap();
        assert!(pos_a < pos_b);
        assert!(rendered.contains("Bravo"));
        assert!(rendered.contains("completed"));
        assert!(rendered.contains("in progress"));
    }

    #[test]
    fn test_destination_line() {
        let mut report = DestinationReport::new("S1", "D1", DestinationStatus::PartiallyFailed);
        report.succeeded = vec!["v1".into(), "v2".into()];
        report.failed = vec!["v3".into()];
        report.skipped_processed = 4;
        assert_eq!(
            destination_line(&report),
            "S1 -> D1: 2 succeeded, 1 failed, 4 already processed"
        );

        let mut aborted = DestinationReport::new("S1", "D2", DestinationStatus::Aborted);
        aborted.error = Some("Remote API error: quota".into());
        assert_eq!(
            destination_line(&aborted),
            "S1 -> D2: aborted after 0 succeeded (Remote API error: quota)"
        );
    }
}

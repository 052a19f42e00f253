//! Undo command

use crate::api::CollectionApi;
use crate::checkpoint::OperationKind;
use crate::cli::adapters::CommandContext;
use crate::cli::error::{CliError, CliResult};
use crate::cli::utils::undo_step_line;
use crate::undo::{UndoLog, UndoReport};

/// Undo options
#[derive(Debug, Clone)]
pub struct UndoOptions {
    pub kind: OperationKind,
    pub dry_run: bool,
}

/// Reverse the last recorded operation of a kind
pub async fn undo_operation<C, A>(ctx: &C, api: &A, opts: UndoOptions) -> CliResult<UndoReport>
where
    C: CommandContext + ?Sized,
    A: CollectionApi + ?Sized,
{
    let log = UndoLog::new(ctx.state_dir(), opts.kind);
    let record = log.last_operation().ok_or_else(|| {
        CliError::NotFound(format!("no undo information for {} operations", opts.kind))
    })?;

    ctx.log_info(&format!(
        "Undoing {} of {} item(s) from {}",
        record.kind,
        record.items.len(),
        record.sources.join(", ")
    ));

    let report = log.undo(api, &record, opts.dry_run).await;
    if report.success && !opts.dry_run {
        log.clear();
    }

    if let Some(journal) = ctx.journal() {
        if let Err(e) = journal.log_undo(opts.kind, &report) {
            ctx.journal_failed(&e);
        }
    }

    if opts.dry_run {
        ctx.log_info(&format!("Dry run: {} call(s) would be made", report.planned.len()));
        for step in &report.planned {
            ctx.log_info(&format!("  {}", undo_step_line(step)));
        }
    } else if report.success {
        ctx.log_success(&format!("Undid {} ({} call(s))", opts.kind, report.performed));
    } else {
        ctx.log_error(&format!(
            "Undo of {} stopped after {} of {} call(s): {}",
            opts.kind,
            report.performed,
            report.planned.len(),
            report.error.as_deref().unwrap_or("unknown error")
        ));
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Item, MemoryCollectionApi};
    use crate::cli::test_utils::MockCommandContext;
    use crate::observability::Logger;
    use crate::undo::UndoRecord;
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn test_undo_without_record() {
        let ctx = MockCommandContext::new();
        let api = MemoryCollectionApi::new();

        let err = undo_operation(
            &ctx,
            &api,
            UndoOptions {
                kind: OperationKind::Move,
                dry_run: false,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CliError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_undo_dry_run_lists_calls() {
        let ctx = MockCommandContext::new();
        let api = MemoryCollectionApi::new()
            .with_collection("S1", "Source", vec![])
            .with_collection("D1", "Dest", vec![Item::minimal("v1")]);

        let mut mapping = BTreeMap::new();
        mapping.insert("D1".to_string(), vec!["v1".to_string()]);
        let log = UndoLog::new(ctx.state_dir(), OperationKind::Move);
        log.record_operation(&UndoRecord::new(
            OperationKind::Move,
            vec!["S1".to_string()],
            true,
            mapping,
        ))
        .unwrap();

        let report = undo_operation(
            &ctx,
            &api,
            UndoOptions {
                kind: OperationKind::Move,
                dry_run: true,
            },
        )
        .await
        .unwrap();

        assert_eq!(report.planned.len(), 2);
        assert!(api.mutations().is_empty());
        assert!(log.last_operation().is_some());
        let logs = ctx.get_logs();
        assert!(logs.iter().any(|l| l == "INFO:   remove v1 from D1"));
        assert!(logs.iter().any(|l| l == "INFO:   add v1 to S1"));
    }

    #[tokio::test]
    async fn test_unwritable_journal_is_reported() {
        let journal_dir = tempfile::tempdir().unwrap();
        let journal = Logger::new(Some(journal_dir.path().join("logs/journal.md").as_path()), None).unwrap();
        std::fs::remove_dir_all(journal_dir.path().join("logs")).unwrap();

        let ctx = MockCommandContext::new().with_journal(journal);
        let api = MemoryCollectionApi::new()
            .with_collection("S1", "Source", vec![])
            .with_collection("D1", "Dest", vec![Item::minimal("v1")]);
        let mut mapping = BTreeMap::new();
        mapping.insert("D1".to_string(), vec!["v1".to_string()]);
        UndoLog::new(ctx.state_dir(), OperationKind::Copy)
            .record_operation(&UndoRecord::new(
                OperationKind::Copy,
                vec!["S1".to_string()],
                false,
                mapping,
            ))
            .unwrap();

        let report = undo_operation(
            &ctx,
            &api,
            UndoOptions {
                kind: OperationKind::Copy,
                dry_run: false,
            },
        )
        .await
        .unwrap();

        assert!(report.success);
        assert!(api.item_ids("D1").is_empty());
        assert!(ctx
            .get_logs()
            .iter()
            .any(|l| l.starts_with("WARN: Could not write journal")));
    }
}

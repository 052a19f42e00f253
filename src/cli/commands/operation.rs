//! Batch operation commands: move, copy, filter, classify, consolidate, deduplicate

use crate::api::{Classifier, CollectionApi};
use crate::checkpoint::CheckpointStore;
use crate::cli::adapters::CommandContext;
use crate::cli::error::CliResult;
use crate::cli::utils::report_lines;
use crate::engine::{BatchController, Operation, OperationReport};

/// Run options
#[derive(Debug, Clone)]
pub struct OperationOptions {
    pub operation: Operation,
    pub verbose: bool,
}

/// Run one batch operation and print its outcome
pub async fn run_operation<C, A>(
    ctx: &C,
    api: &A,
    classifier: Option<&dyn Classifier>,
    opts: OperationOptions,
) -> CliResult<OperationReport>
where
    C: CommandContext + ?Sized,
    A: CollectionApi + ?Sized,
{
    let op = &opts.operation;
    let mut controller = BatchController::new(
        api,
        CheckpointStore::new(ctx.recovery_dir()),
        ctx.state_dir(),
    )
    .with_settings(ctx.config().engine_settings());
    if let Some(classifier) = classifier {
        controller = controller.with_classifier(classifier);
    }
    if let Some(journal) = ctx.journal() {
        controller = controller.with_journal(journal);
    }

    if op.dry_run {
        ctx.log_info("Dry run: no changes will be made");
    }

    let report = match controller.run(op).await {
        Ok(report) => report,
        Err(e) => {
            if let Some(journal) = ctx.journal() {
                if let Err(journal_err) = journal.log_error(op.kind.as_str(), &e.to_string()) {
                    ctx.journal_failed(&journal_err);
                }
            }
            return Err(e.into());
        }
    };

    for line in report_lines(&report, opts.verbose) {
        ctx.log_info(&line);
    }

    let pending = report.pending_source_removal();
    if !pending.is_empty() {
        ctx.log_warn(&format!(
            "{} item(s) were added but are still in their source playlist",
            pending.len()
        ));
    }

    if report.is_clean() {
        ctx.log_success(&format!("{}: {}", op.kind, report.summary()));
    } else {
        ctx.log_error(&format!(
            "{}: {}. Rerun with --resume --retry-failed to retry",
            op.kind,
            report.summary()
        ));
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Item, MemoryCollectionApi};
    use crate::cli::test_utils::MockCommandContext;

    #[tokio::test]
    async fn test_run_operation_reports_failures() {
        let ctx = MockCommandContext::new();
        let api = MemoryCollectionApi::new()
            .with_collection("S1", "Source", vec![Item::minimal("v1"), Item::minimal("v2")])
            .with_collection("D1", "Dest", vec![]);
        api.fail_add("D1", "v2");

        let report = run_operation(
            &ctx,
            &api,
            None,
            OperationOptions {
                operation: Operation::copy_items("S1", "D1"),
                verbose: true,
            },
        )
        .await
        .unwrap();

        assert!(!report.is_clean());
        let logs = ctx.get_logs();
        assert!(logs.iter().any(|l| l == "INFO: S1 -> D1: 1 succeeded, 1 failed"));
        assert!(logs.iter().any(|l| l == "INFO:   v1"));
        assert!(logs.iter().any(|l| l.starts_with("ERROR: copy: 1 succeeded, 1 failed")));
    }

    #[tokio::test]
    async fn test_run_operation_propagates_not_found() {
        let ctx = MockCommandContext::new();
        let api = MemoryCollectionApi::new().with_collection("S1", "Source", vec![]);

        let err = run_operation(
            &ctx,
            &api,
            None,
            OperationOptions {
                operation: Operation::move_items("S1", "D404"),
                verbose: false,
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, crate::cli::CliError::NotFound(_)));
        assert!(api.mutations().is_empty());
    }
}

//! Recovery state commands: list-destinations, clear-state, cleanup

use crate::checkpoint::{Checkpoint, CheckpointStore, CleanupManager, CleanupReport, OperationKind};
use crate::cli::adapters::CommandContext;
use crate::cli::error::CliResult;
use crate::cli::utils::destination_table;

/// Checkpoint selector
#[derive(Debug, Clone)]
pub struct StateOptions {
    pub playlist: String,
    pub kind: OperationKind,
}

/// Cleanup options
#[derive(Debug, Clone, Default)]
pub struct CleanupOptions {
    pub dry_run: bool,
    pub verbose: bool,
}

/// Print the destinations recorded for a playlist.
///
/// Returns `None` when there is no usable checkpoint; that is not an error.
pub fn list_destinations<C>(ctx: &C, opts: StateOptions) -> CliResult<Option<Checkpoint>>
where
    C: CommandContext + ?Sized,
{
    let store = CheckpointStore::new(ctx.recovery_dir());
    let checkpoint = match store.load(&opts.playlist, opts.kind) {
        Ok(checkpoint) => checkpoint,
        Err(e) if e.is_missing_state() => {
            ctx.log_info(&format!(
                "No recovery state found for playlist {} ({})",
                opts.playlist, opts.kind
            ));
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    if checkpoint.destination_progress.is_empty() && checkpoint.destination_metadata.is_empty() {
        ctx.log_info("No destinations recorded yet");
    } else {
        ctx.log_info("Available destinations in recovery state:");
        ctx.print(&destination_table(&checkpoint).to_string());
    }

    Ok(Some(checkpoint))
}

/// Delete every checkpoint file of a playlist and operation kind
pub fn clear_state<C>(ctx: &C, opts: StateOptions) -> CliResult<usize>
where
    C: CommandContext + ?Sized,
{
    let store = CheckpointStore::new(ctx.recovery_dir());
    let removed = store.clear(&opts.playlist, opts.kind)?;

    if removed == 0 {
        ctx.log_info(&format!(
            "No recovery state found for playlist {} ({})",
            opts.playlist, opts.kind
        ));
    } else {
        ctx.log_success(&format!(
            "Removed {} checkpoint file(s) for {} ({})",
            removed, opts.playlist, opts.kind
        ));
    }

    Ok(removed)
}

/// Keep the newest checkpoint per key and delete the rest
pub async fn cleanup<C>(ctx: &C, opts: CleanupOptions) -> CliResult<CleanupReport>
where
    C: CommandContext + ?Sized,
{
    let manager = CleanupManager::new(ctx.recovery_dir(), opts.dry_run, opts.verbose);
    let report = manager.run_cleanup().await?;

    if let Some(journal) = ctx.journal() {
        if let Err(e) = journal.log_cleanup(&report, opts.dry_run) {
            ctx.journal_failed(&e);
        }
    }

    let verb = if opts.dry_run { "Would delete" } else { "Deleted" };
    if opts.verbose {
        for path in &report.deleted_files {
            ctx.log_info(&format!("  {} {}", verb, path.display()));
        }
    }
    for error in &report.errors {
        ctx.log_warn(error);
    }

    ctx.log_success(&format!(
        "{} {} file(s), {} freed, {} checkpoint(s) kept",
        verb,
        report.deleted_files.len(),
        ctx.format_bytes(report.freed_bytes),
        report.kept.len()
    ));

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::CollectionInfo;
    use crate::cli::test_utils::MockCommandContext;

    fn seed(ctx: &MockCommandContext) {
        let store = CheckpointStore::new(ctx.recovery_dir());
        let mut checkpoint = Checkpoint::new("PL1", OperationKind::Move);
        checkpoint.add_destination("D1", CollectionInfo::new("Favourites"));
        checkpoint.assign_item("v1", "D1", true, None).unwrap();
        store.save(&checkpoint).unwrap();
    }

    #[test]
    fn test_list_destinations() {
        let ctx = MockCommandContext::new();
        let opts = StateOptions {
            playlist: "PL1".to_string(),
            kind: OperationKind::Move,
        };
        assert!(list_destinations(&ctx, opts.clone()).unwrap().is_none());

        seed(&ctx);
        let checkpoint = list_destinations(&ctx, opts).unwrap().unwrap();
        assert!(checkpoint.has_destination("D1"));
        assert!(ctx.get_logs().iter().any(|l| l.contains("Favourites")));
    }

    #[test]
    fn test_list_destinations_other_kind() {
        let ctx = MockCommandContext::new();
        seed(&ctx);
        let found = list_destinations(
            &ctx,
            StateOptions {
                playlist: "PL1".to_string(),
                kind: OperationKind::Filter,
            },
        )
        .unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn test_clear_state() {
        let ctx = MockCommandContext::new();
        seed(&ctx);
        let opts = StateOptions {
            playlist: "PL1".to_string(),
            kind: OperationKind::Move,
        };
        assert_eq!(clear_state(&ctx, opts.clone()).unwrap(), 1);
        assert_eq!(clear_state(&ctx, opts).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_cleanup_on_empty_directory() {
        let ctx = MockCommandContext::new();
        let report = cleanup(&ctx, CleanupOptions::default()).await.unwrap();
        assert!(report.deleted_files.is_empty());
    }
}

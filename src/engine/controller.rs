//! Batch operation controller

use super::batch::apply_batch;
use super::operation::{DestinationSpec, MutationMode, Operation};
use super::report::{DestinationReport, DestinationStatus, OperationReport};
use super::working_set::{duplicate_occurrences, unique_in_order, WorkingSet};
use super::{EngineError, EngineResult};
use crate::api::{Classifier, CollectionApi, CollectionInfo, Item};
use crate::checkpoint::{
    Checkpoint, CheckpointStore, CollectionId, DestinationProgress, ItemId, OperationKind,
};
use crate::observability::Logger;
use crate::undo::{UndoLog, UndoRecord};
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Tunables for the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// Ids per mutating call
    pub batch_size: usize,
    /// Items per classifier call
    pub classify_batch_size: usize,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            batch_size: 50,
            classify_batch_size: 10,
        }
    }
}

/// Drives one [`Operation`] end to end.
///
/// Destinations are processed one at a time in the order given, one batch at
/// a time; the checkpoint is saved after every batch.
pub struct BatchController<'a, A: CollectionApi + ?Sized> {
    api: &'a A,
    store: CheckpointStore,
    state_dir: PathBuf,
    classifier: Option<&'a dyn Classifier>,
    journal: Option<&'a Logger>,
    settings: EngineSettings,
}

impl<'a, A: CollectionApi + ?Sized> BatchController<'a, A> {
    /// `state_dir` holds undo records; checkpoints go through `store`
    pub fn new(api: &'a A, store: CheckpointStore, state_dir: impl Into<PathBuf>) -> Self {
        Self {
            api,
            store,
            state_dir: state_dir.into(),
            classifier: None,
            journal: None,
            settings: EngineSettings::default(),
        }
    }

    pub fn with_classifier(mut self, classifier: &'a dyn Classifier) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Append run summaries to a markdown journal
    pub fn with_journal(mut self, journal: &'a Logger) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn with_settings(mut self, settings: EngineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn store(&self) -> &CheckpointStore {
        &self.store
    }

    /// Execute the operation.
    ///
    /// Validation, checkpoint lookup and destination lookup all finish before
    /// the first mutating call. Per-item failures end up in the report.
    ///
    /// A hard error on a destination stops the run. If an earlier destination
    /// already committed work, the undo record and summary are still written
    /// and the report carries an [`DestinationStatus::Aborted`] entry;
    /// otherwise the error is returned.
    pub async fn run(&self, op: &Operation) -> EngineResult<OperationReport> {
        op.validate()?;
        if op.kind == OperationKind::Classify && self.classifier.is_none() {
            return Err(EngineError::validation("classify requires a classifier"));
        }

        let mut checkpoints = op
            .sources
            .iter()
            .map(|source| self.open_checkpoint(op, source))
            .collect::<EngineResult<Vec<_>>>()?;

        if let Some(target) = &op.resume_destination {
            for checkpoint in &checkpoints {
                match checkpoint.progress(target) {
                    None => {
                        return Err(EngineError::validation(format!(
                            "no recorded progress for destination {} from {}",
                            target, checkpoint.source_id
                        )))
                    }
                    Some(progress) if progress.completed => {
                        return Err(EngineError::validation(format!(
                            "destination {} is already completed",
                            target
                        )))
                    }
                    Some(_) => {}
                }
            }
        }

        let mut metadata: Vec<CollectionInfo> = Vec::with_capacity(op.destinations.len());
        for destination in &op.destinations {
            metadata.push(self.api.get_collection_info(&destination.collection_id).await?);
        }
        for source in &op.sources {
            if !op.destinations.iter().any(|d| &d.collection_id == source) {
                self.api.get_collection_info(source).await?;
            }
        }

        info!(
            kind = %op.kind,
            sources = ?op.sources,
            destinations = op.destinations.len(),
            dry_run = op.dry_run,
            resume = op.resume,
            "Starting operation"
        );
        if let Some(journal) = self.journal {
            if let Err(e) = journal.log_operation_start(op) {
                warn!(error = %e, "Failed to write operation journal");
            }
        }

        let mut reports = Vec::new();
        let mut mapping: BTreeMap<CollectionId, Vec<ItemId>> = BTreeMap::new();
        let mut aborted: Option<EngineError> = None;

        'sources: for checkpoint in checkpoints.iter_mut() {
            for (destination, info) in op.destinations.iter().zip(&metadata) {
                checkpoint.add_destination(&destination.collection_id, info.clone());
            }

            let mut reached = op.resume_destination.is_none();
            for destination in &op.destinations {
                if !reached {
                    if op.resume_destination.as_deref() == Some(destination.collection_id.as_str()) {
                        reached = true;
                    } else {
                        debug!(destination = %destination.collection_id, "Skipping destination before resume point");
                        reports.push(DestinationReport::new(
                            &checkpoint.source_id,
                            &destination.collection_id,
                            DestinationStatus::Skipped,
                        ));
                        continue;
                    }
                }

                let mut report = DestinationReport::new(
                    &checkpoint.source_id,
                    &destination.collection_id,
                    DestinationStatus::Succeeded,
                );
                let result = self
                    .process_destination(op, checkpoint, destination, &mut report)
                    .await;
                if let Err(e) = &result {
                    warn!(
                        source_id = %checkpoint.source_id,
                        destination_id = %destination.collection_id,
                        error = %e,
                        "Destination aborted"
                    );
                    report.status = DestinationStatus::Aborted;
                    report.error = Some(e.to_string());
                }
                if let Some(journal) = self.journal {
                    if let Err(e) = journal.log_destination_result(&report) {
                        warn!(error = %e, "Failed to write operation journal");
                    }
                }

                if !op.dry_run && op.mutation_mode() != MutationMode::RemoveOnly {
                    let entry = mapping.entry(destination.collection_id.clone()).or_default();
                    for id in &report.succeeded {
                        if !entry.contains(id) {
                            entry.push(id.clone());
                        }
                    }
                }
                reports.push(report);

                if let Err(e) = result {
                    aborted = Some(e);
                    break 'sources;
                }
            }
        }

        if let Some(e) = aborted {
            let committed = reports
                .iter()
                .any(|r| r.mutated() || !r.failed.is_empty());
            if !committed {
                return Err(e);
            }
        }

        let mut report = OperationReport {
            kind: op.kind,
            dry_run: op.dry_run,
            destinations: reports,
            undo_recorded: false,
        };

        mapping.retain(|_, ids| !ids.is_empty());
        if !mapping.is_empty() && op.kind != OperationKind::Deduplicate {
            let record = UndoRecord::new(
                op.kind,
                op.sources.clone(),
                op.mutation_mode() == MutationMode::AddThenRemove,
                mapping,
            );
            match UndoLog::new(&self.state_dir, op.kind).record_operation(&record) {
                Ok(()) => report.undo_recorded = true,
                Err(e) => warn!(error = %e, "Failed to record undo information"),
            }
        }

        info!(kind = %op.kind, summary = %report.summary(), "Operation finished");
        if let Some(journal) = self.journal {
            if let Err(e) = journal.log_operation_summary(&report) {
                warn!(error = %e, "Failed to write operation journal");
            }
        }

        Ok(report)
    }

    fn open_checkpoint(&self, op: &Operation, source_id: &str) -> EngineResult<Checkpoint> {
        if !op.resume {
            return Ok(Checkpoint::new(source_id, op.kind));
        }

        match self.store.load(source_id, op.kind) {
            Ok(checkpoint) => {
                info!(
                    source_id,
                    kind = %op.kind,
                    remaining = checkpoint.remaining_items().len(),
                    "Resuming from checkpoint"
                );
                Ok(checkpoint)
            }
            Err(e) if e.is_missing_state() => {
                warn!(source_id, kind = %op.kind, "No usable checkpoint, starting fresh");
                Ok(Checkpoint::new(source_id, op.kind))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn process_destination(
        &self,
        op: &Operation,
        checkpoint: &mut Checkpoint,
        destination: &DestinationSpec,
        report: &mut DestinationReport,
    ) -> EngineResult<()> {
        let source_id = checkpoint.source_id.clone();
        let destination_id = destination.collection_id.as_str();
        let progress = checkpoint
            .progress(destination_id)
            .cloned()
            .unwrap_or_default();

        if progress.completed {
            info!(destination_id, "Destination already completed, skipping");
            report.status = DestinationStatus::AlreadyComplete;
            report.completed = true;
            return Ok(());
        }

        let fetched = self.api.list_items(&source_id).await?;
        for item in &fetched {
            checkpoint.register_item(item);
        }

        let mode = op.mutation_mode();
        let candidates = match mode {
            MutationMode::RemoveOnly => duplicate_occurrences(&fetched),
            _ => unique_in_order(&fetched),
        };
        let mut working = WorkingSet::from_candidates(candidates, &progress, op.retry_failed);

        match (op.kind, op.predicate_for(destination)) {
            (OperationKind::Deduplicate, _) | (_, None) => {}
            (OperationKind::Classify, Some(predicate)) => {
                let classifier = self
                    .classifier
                    .ok_or_else(|| EngineError::validation("classify requires a classifier"))?;
                working
                    .retain_classified(classifier, predicate, self.settings.classify_batch_size)
                    .await?;
            }
            (_, Some(pattern)) => working.retain_matching(pattern),
        }
        working.apply_limit(op.limit);

        report.working_set = working.items.iter().map(|i| i.id.clone()).collect();
        report.skipped_processed = working.skipped_processed;
        report.skipped_failed = working.skipped_failed;
        report.not_matched = working.not_matched;
        report.truncated = working.truncated;

        debug!(
            destination_id,
            fetched = fetched.len(),
            working = working.items.len(),
            skipped_processed = working.skipped_processed,
            skipped_failed = working.skipped_failed,
            not_matched = working.not_matched,
            "Computed working set"
        );

        if op.dry_run {
            info!(destination_id, count = working.items.len(), "Dry run, no changes made");
            report.status = DestinationStatus::DryRun;
            return Ok(());
        }

        if mode == MutationMode::AddThenRemove && !progress.pending_removal.is_empty() {
            self.retry_source_removal(checkpoint, &fetched, destination_id, &progress, report)
                .await?;
        }

        for chunk in working.items.chunks(self.settings.batch_size.max(1)) {
            let ids: Vec<ItemId> = chunk.iter().map(|i| i.id.clone()).collect();
            let outcome = apply_batch(self.api, mode, &source_id, destination_id, &ids).await;

            let mut seen = HashSet::new();
            for item in chunk {
                if !seen.insert(item.id.as_str()) {
                    continue;
                }
                let ok = outcome.succeeded(&item.id);
                checkpoint.assign_item(&item.id, destination_id, ok, Some(item))?;

                if ok {
                    report.succeeded.push(item.id.clone());
                    if mode == MutationMode::AddThenRemove {
                        if outcome.moved(&item.id) {
                            report.moved.push(item.id.clone());
                        } else {
                            checkpoint.mark_pending_removal(&item.id, destination_id)?;
                            report.pending_source_removal.push(item.id.clone());
                        }
                    }
                } else {
                    report.failed.push(item.id.clone());
                }
            }

            self.store.save(checkpoint)?;
        }

        if !report.failed.is_empty() {
            report.status = DestinationStatus::PartiallyFailed;
        }

        let ledger_clean = checkpoint
            .progress(destination_id)
            .map(|p| p.failed_items.is_empty() && p.pending_removal.is_empty())
            .unwrap_or(false);
        if report.failed.is_empty() && !working.truncated && ledger_clean {
            checkpoint.mark_complete(destination_id)?;
            self.store.save(checkpoint)?;
            report.completed = true;
        }

        if !report.pending_source_removal.is_empty() {
            warn!(
                destination_id,
                count = report.pending_source_removal.len(),
                "Items added but not removed from source"
            );
        }
        info!(
            destination_id,
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            completed = report.completed,
            "Destination processed"
        );

        Ok(())
    }

    /// Remove items a previous run added to the destination but left in the source
    async fn retry_source_removal(
        &self,
        checkpoint: &mut Checkpoint,
        fetched: &[Item],
        destination_id: &str,
        progress: &DestinationProgress,
        report: &mut DestinationReport,
    ) -> EngineResult<()> {
        let source_id = checkpoint.source_id.clone();
        let (present, gone): (Vec<ItemId>, Vec<ItemId>) = progress
            .pending_removal
            .iter()
            .cloned()
            .partition(|id| fetched.iter().any(|item| &item.id == id));

        for id in gone {
            checkpoint.resolve_pending_removal(&id, destination_id);
            report.moved.push(id);
        }

        let mut removed: Vec<ItemId> = Vec::new();
        if !present.is_empty() {
            info!(source_id = %source_id, count = present.len(), "Retrying source removal");
            match self.api.remove_items(&source_id, &present).await {
                Ok(ids) => removed = ids,
                Err(e) => warn!(source_id = %source_id, error = %e, "Source removal failed again"),
            }
        }

        for id in present {
            if removed.contains(&id) {
                checkpoint.resolve_pending_removal(&id, destination_id);
                report.moved.push(id);
            } else {
                report.pending_source_removal.push(id);
            }
        }

        self.store.save(checkpoint)?;
        Ok(())
    }
}

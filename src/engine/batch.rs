//! One mutation step against the remote API, reported as an explicit outcome

use super::operation::MutationMode;
use crate::api::{ApiError, CollectionApi, ItemId};
use tracing::warn;

/// What happened to one chunk of ids
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub mode: MutationMode,
    pub requested: Vec<ItemId>,
    /// Ids the destination accepted
    pub added: Vec<ItemId>,
    /// Ids removed from the source (moves) or the playlist itself (dedup)
    pub removed: Vec<ItemId>,
    /// Whole-call error, if any call of the step failed outright
    pub error: Option<ApiError>,
}

impl BatchOutcome {
    fn new(mode: MutationMode, requested: &[ItemId]) -> Self {
        Self {
            mode,
            requested: requested.to_vec(),
            added: Vec::new(),
            removed: Vec::new(),
            error: None,
        }
    }

    /// Whether the ledger should record `item_id` as processed
    pub fn succeeded(&self, item_id: &str) -> bool {
        match self.mode {
            MutationMode::AddOnly | MutationMode::AddThenRemove => {
                self.added.iter().any(|id| id == item_id)
            }
            MutationMode::RemoveOnly => {
                let wanted = self.requested.iter().filter(|id| *id == item_id).count();
                let done = self.removed.iter().filter(|id| *id == item_id).count();
                wanted > 0 && done >= wanted
            }
        }
    }

    /// Added to the destination and removed from the source
    pub fn moved(&self, item_id: &str) -> bool {
        self.mode == MutationMode::AddThenRemove
            && self.added.iter().any(|id| id == item_id)
            && self.removed.iter().any(|id| id == item_id)
    }
}

/// Apply one chunk. Errors are captured in the outcome, never returned.
pub async fn apply_batch<A: CollectionApi + ?Sized>(
    api: &A,
    mode: MutationMode,
    source_id: &str,
    destination_id: &str,
    item_ids: &[ItemId],
) -> BatchOutcome {
    let mut outcome = BatchOutcome::new(mode, item_ids);

    match mode {
        MutationMode::AddOnly | MutationMode::AddThenRemove => {
            match api.add_items(destination_id, item_ids).await {
                Ok(added) => {
                    outcome.added = added
                        .into_iter()
                        .filter(|id| item_ids.contains(id))
                        .collect();
                }
                Err(e) => {
                    warn!(destination_id, count = item_ids.len(), error = %e, "Add batch failed");
                    outcome.error = Some(e);
                }
            }

            // Only ids that reached the destination may leave the source
            if mode == MutationMode::AddThenRemove && !outcome.added.is_empty() {
                match api.remove_items(source_id, &outcome.added).await {
                    Ok(removed) => outcome.removed = removed,
                    Err(e) => {
                        warn!(source_id, count = outcome.added.len(), error = %e, "Source removal failed");
                        outcome.error = Some(e);
                    }
                }
            }
        }
        MutationMode::RemoveOnly => match api.remove_items(destination_id, item_ids).await {
            Ok(removed) => outcome.removed = removed,
            Err(e) => {
                warn!(destination_id, count = item_ids.len(), error = %e, "Remove batch failed");
                outcome.error = Some(e);
            }
        },
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{CallKind, Item, MemoryCollectionApi};

    fn ids(values: &[&str]) -> Vec<ItemId> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn test_move_never_removes_failed_adds() {
        let api = MemoryCollectionApi::new()
            .with_collection("S1", "Source", vec![Item::minimal("v1"), Item::minimal("v2")])
            .with_collection("D1", "Dest", vec![]);
        api.fail_add("D1", "v2");

        let outcome = apply_batch(&api, MutationMode::AddThenRemove, "S1", "D1", &ids(&["v1", "v2"])).await;

        assert!(outcome.succeeded("v1"));
        assert!(!outcome.succeeded("v2"));
        assert!(outcome.moved("v1"));
        assert_eq!(api.item_ids("S1"), vec!["v2"]);
    }

    #[tokio::test]
    async fn test_failed_removal_keeps_add_success() {
        let api = MemoryCollectionApi::new()
            .with_collection("S1", "Source", vec![Item::minimal("v1")])
            .with_collection("D1", "Dest", vec![]);
        api.fail_remove("S1", "v1");

        let outcome = apply_batch(&api, MutationMode::AddThenRemove, "S1", "D1", &ids(&["v1"])).await;

        assert!(outcome.succeeded("v1"));
        assert!(!outcome.moved("v1"));
    }

    #[tokio::test]
    async fn test_whole_call_error_fails_every_item() {
        let api = MemoryCollectionApi::new().with_collection("D1", "Dest", vec![]);
        api.fail_call("D1", CallKind::Add, ApiError::RateLimited { retry_after: None });

        let outcome = apply_batch(&api, MutationMode::AddOnly, "S1", "D1", &ids(&["v1", "v2"])).await;

        assert!(outcome.error.is_some());
        assert!(!outcome.succeeded("v1"));
        assert!(!outcome.succeeded("v2"));
    }

    #[tokio::test]
    async fn test_remove_only_counts_occurrences() {
        let api = MemoryCollectionApi::new().with_collection(
            "P1",
            "Playlist",
            vec![Item::minimal("v1"), Item::minimal("v1"), Item::minimal("v1")],
        );

        let outcome = apply_batch(&api, MutationMode::RemoveOnly, "P1", "P1", &ids(&["v1", "v1"])).await;

        assert!(outcome.succeeded("v1"));
        assert_eq!(api.item_ids("P1"), vec!["v1"]);
    }
}

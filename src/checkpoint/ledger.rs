//! Destination ledger: per-destination bookkeeping inside a checkpoint.
//!
//! All methods mutate the in-memory [`Checkpoint`] only. Persisting the result
//! is the caller's job (see [`super::CheckpointStore::save`]).

use super::models::{Checkpoint, CollectionInfo, DestinationProgress, Item, ItemId};
use super::{CheckpointError, CheckpointResult};
use std::collections::BTreeSet;

impl Checkpoint {
    /// Register a destination. Existing progress is kept; metadata is refreshed.
    pub fn add_destination(&mut self, destination_id: &str, metadata: CollectionInfo) {
        self.destination_metadata
            .insert(destination_id.to_string(), metadata);
        self.destination_progress
            .entry(destination_id.to_string())
            .or_default();
    }

    /// Whether the destination is known to this checkpoint
    pub fn has_destination(&self, destination_id: &str) -> bool {
        self.destination_progress.contains_key(destination_id)
    }

    /// Cache item data without touching any destination's progress
    pub fn register_item(&mut self, item: &Item) {
        self.items.insert(item.id.clone(), item.clone());
    }

    /// Record the outcome of one item against one destination
    pub fn assign_item(
        &mut self,
        item_id: &str,
        destination_id: &str,
        success: bool,
        item_data: Option<&Item>,
    ) -> CheckpointResult<()> {
        let progress = self
            .destination_progress
            .get_mut(destination_id)
            .ok_or_else(|| CheckpointError::unknown_destination(destination_id))?;

        if progress.completed {
            return Err(CheckpointError::destination_completed(destination_id));
        }

        if success {
            progress.failed_items.remove(item_id);
            progress.processed_items.insert(item_id.to_string());
        } else {
            progress.processed_items.remove(item_id);
            progress.pending_removal.remove(item_id);
            progress.failed_items.insert(item_id.to_string());
            progress.failure_count += 1;
        }

        match item_data {
            Some(item) if success => {
                self.items.insert(item_id.to_string(), item.clone());
            }
            _ => {
                self.items
                    .entry(item_id.to_string())
                    .or_insert_with(|| item_data.cloned().unwrap_or_else(|| Item::minimal(item_id)));
            }
        }

        Ok(())
    }

    /// Note that a processed item was added to the destination but is still in the source
    pub fn mark_pending_removal(&mut self, item_id: &str, destination_id: &str) -> CheckpointResult<()> {
        let progress = self
            .destination_progress
            .get_mut(destination_id)
            .ok_or_else(|| CheckpointError::unknown_destination(destination_id))?;
        if progress.processed_items.contains(item_id) {
            progress.pending_removal.insert(item_id.to_string());
        }
        Ok(())
    }

    /// The source no longer holds the item
    pub fn resolve_pending_removal(&mut self, item_id: &str, destination_id: &str) -> bool {
        self.destination_progress
            .get_mut(destination_id)
            .map(|p| p.pending_removal.remove(item_id))
            .unwrap_or(false)
    }

    /// Known items not yet decided for any destination
    pub fn remaining_items(&self) -> BTreeSet<ItemId> {
        let decided: BTreeSet<&ItemId> = self
            .destination_progress
            .values()
            .flat_map(|p| p.processed_items.iter().chain(p.failed_items.iter()))
            .collect();

        self.items
            .keys()
            .filter(|id| !decided.contains(id))
            .cloned()
            .collect()
    }

    /// Progress for a destination, if known
    pub fn progress(&self, destination_id: &str) -> Option<&DestinationProgress> {
        self.destination_progress.get(destination_id)
    }

    /// Mark a destination terminal. There is no way back within this checkpoint.
    pub fn mark_complete(&mut self, destination_id: &str) -> CheckpointResult<()> {
        let progress = self
            .destination_progress
            .get_mut(destination_id)
            .ok_or_else(|| CheckpointError::unknown_destination(destination_id))?;
        progress.completed = true;
        Ok(())
    }

    /// Destinations that are not yet completed
    pub fn incomplete_destinations(&self) -> Vec<&str> {
        self.destination_progress
            .iter()
            .filter(|(_, p)| !p.completed)
            .map(|(id, _)| id.as_str())
            .collect()
    }
}

//! Data models for checkpoint files

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Stable identifier of an item (video) within a collection
pub type ItemId = String;

/// Opaque identifier of a collection (playlist)
pub type CollectionId = String;

/// Kind of batch operation; part of the checkpoint and undo keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Move,
    Copy,
    Filter,
    Deduplicate,
    Classify,
    Consolidate,
}

impl OperationKind {
    /// All operation kinds, in a stable order
    pub const ALL: [OperationKind; 6] = [
        OperationKind::Move,
        OperationKind::Copy,
        OperationKind::Filter,
        OperationKind::Deduplicate,
        OperationKind::Classify,
        OperationKind::Consolidate,
    ];

    /// Name used in file names and serialized records
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Move => "move",
            OperationKind::Copy => "copy",
            OperationKind::Filter => "filter",
            OperationKind::Deduplicate => "deduplicate",
            OperationKind::Classify => "classify",
            OperationKind::Consolidate => "consolidate",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OperationKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| format!("unknown operation kind: {}", s))
    }
}

/// Cached item data. The ledger itself only tracks ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    #[serde(rename = "video_id", default)]
    pub id: ItemId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Item {
    /// Item with id only
    pub fn minimal<S: Into<String>>(id: S) -> Self {
        Self {
            id: id.into(),
            title: None,
            description: None,
        }
    }

    /// Item with id and title
    pub fn new<S: Into<String>, T: Into<String>>(id: S, title: T) -> Self {
        Self {
            id: id.into(),
            title: Some(title.into()),
            description: None,
        }
    }

    /// Builder-style description setter
    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Title, or empty string when unknown
    pub fn title_or_empty(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }
}

/// Metadata describing a collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CollectionInfo {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl CollectionInfo {
    pub fn new<S: Into<String>>(title: S) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

/// Progress of one destination within a checkpoint
///
/// `processed_items` and `failed_items` are always disjoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationProgress {
    #[serde(default)]
    pub completed: bool,
    #[serde(rename = "processed_videos", default)]
    pub processed_items: BTreeSet<ItemId>,
    #[serde(rename = "failed_videos", default)]
    pub failed_items: BTreeSet<ItemId>,
    #[serde(default)]
    pub failure_count: u32,
    /// Moves only: processed items still present in the source
    #[serde(rename = "pending_source_removal", default, skip_serializing_if = "BTreeSet::is_empty")]
    pub pending_removal: BTreeSet<ItemId>,
}

impl DestinationProgress {
    /// Whether the item has been decided (processed or failed) for this destination
    pub fn has_seen(&self, item_id: &str) -> bool {
        self.processed_items.contains(item_id) || self.failed_items.contains(item_id)
    }
}

/// In-memory state of one (source, kind) operation
#[derive(Debug, Clone, PartialEq)]
pub struct Checkpoint {
    pub source_id: CollectionId,
    pub kind: OperationKind,
    pub items: BTreeMap<ItemId, Item>,
    pub destination_metadata: BTreeMap<CollectionId, CollectionInfo>,
    pub destination_progress: BTreeMap<CollectionId, DestinationProgress>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Checkpoint {
    /// Create an empty checkpoint for a key
    pub fn new<S: Into<String>>(source_id: S, kind: OperationKind) -> Self {
        Self {
            source_id: source_id.into(),
            kind,
            items: BTreeMap::new(),
            destination_metadata: BTreeMap::new(),
            destination_progress: BTreeMap::new(),
            updated_at: None,
        }
    }

    /// Build a checkpoint from its on-disk form, migrating legacy flat sets
    pub(crate) fn from_file(file: CheckpointFile) -> Self {
        let CheckpointFile {
            playlist_id,
            operation_type,
            destination_metadata,
            mut destination_progress,
            videos,
            video_assignments,
            processed_videos,
            failed_videos,
            updated_at,
        } = file;

        let legacy_processed = processed_videos.unwrap_or_default();
        let legacy_failed: BTreeSet<ItemId> = failed_videos
            .unwrap_or_default()
            .difference(&legacy_processed)
            .cloned()
            .collect();

        let mut known: BTreeSet<CollectionId> = destination_metadata.keys().cloned().collect();
        known.extend(destination_progress.keys().cloned());
        known.extend(video_assignments.values().cloned());

        let mut progress = BTreeMap::new();
        for destination_id in known {
            let entry = match destination_progress.remove(&destination_id) {
                Some(raw) if raw.processed_videos.is_some() || raw.failed_videos.is_some() => {
                    let processed = raw.processed_videos.unwrap_or_default();
                    let failed = raw
                        .failed_videos
                        .unwrap_or_default()
                        .difference(&processed)
                        .cloned()
                        .collect();
                    let pending_removal = raw
                        .pending_source_removal
                        .unwrap_or_default()
                        .intersection(&processed)
                        .cloned()
                        .collect();
                    DestinationProgress {
                        completed: raw.completed.unwrap_or(false),
                        processed_items: processed,
                        failed_items: failed,
                        failure_count: raw.failure_count.unwrap_or(0),
                        pending_removal,
                    }
                }
                raw => DestinationProgress {
                    completed: raw.as_ref().and_then(|r| r.completed).unwrap_or(false),
                    processed_items: legacy_processed.clone(),
                    failed_items: legacy_failed.clone(),
                    failure_count: raw
                        .and_then(|r| r.failure_count)
                        .unwrap_or(legacy_failed.len() as u32),
                    pending_removal: BTreeSet::new(),
                },
            };
            progress.insert(destination_id, entry);
        }

        let mut items: BTreeMap<ItemId, Item> = videos
            .into_iter()
            .map(|(id, mut item)| {
                if item.id.is_empty() {
                    item.id = id.clone();
                }
                (id, item)
            })
            .collect();

        let referenced = progress
            .values()
            .flat_map(|p| p.processed_items.iter().chain(p.failed_items.iter()))
            .chain(legacy_processed.iter())
            .chain(legacy_failed.iter())
            .chain(video_assignments.keys());
        for id in referenced {
            if !items.contains_key(id) {
                items.insert(id.clone(), Item::minimal(id.clone()));
            }
        }

        Self {
            source_id: playlist_id,
            kind: operation_type,
            items,
            destination_metadata,
            destination_progress: progress,
            updated_at,
        }
    }

    /// Serialize to on-disk form; legacy fields are derived from canonical state
    pub(crate) fn to_file(&self) -> CheckpointFile {
        let mut processed = BTreeSet::new();
        let mut failed = BTreeSet::new();
        let mut assignments = BTreeMap::new();

        for (destination_id, progress) in &self.destination_progress {
            for id in &progress.processed_items {
                processed.insert(id.clone());
                assignments.insert(id.clone(), destination_id.clone());
            }
            failed.extend(progress.failed_items.iter().cloned());
        }
        let failed: BTreeSet<ItemId> = failed.difference(&processed).cloned().collect();

        CheckpointFile {
            playlist_id: self.source_id.clone(),
            operation_type: self.kind,
            destination_metadata: self.destination_metadata.clone(),
            destination_progress: self
                .destination_progress
                .iter()
                .map(|(id, p)| (id.clone(), RawDestinationProgress::from(p)))
                .collect(),
            videos: self.items.clone(),
            video_assignments: assignments,
            processed_videos: Some(processed),
            failed_videos: Some(failed),
            updated_at: self.updated_at,
        }
    }
}

/// On-disk checkpoint layout, including legacy flat fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct CheckpointFile {
    pub playlist_id: String,
    pub operation_type: OperationKind,
    #[serde(default)]
    pub destination_metadata: BTreeMap<CollectionId, CollectionInfo>,
    #[serde(default)]
    pub destination_progress: BTreeMap<CollectionId, RawDestinationProgress>,
    #[serde(default)]
    pub videos: BTreeMap<ItemId, Item>,
    #[serde(default)]
    pub video_assignments: BTreeMap<ItemId, CollectionId>,
    #[serde(default)]
    pub processed_videos: Option<BTreeSet<ItemId>>,
    #[serde(default)]
    pub failed_videos: Option<BTreeSet<ItemId>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Destination progress as found on disk; older files omit fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct RawDestinationProgress {
    #[serde(default)]
    pub completed: Option<bool>,
    #[serde(default)]
    pub processed_videos: Option<BTreeSet<ItemId>>,
    #[serde(default)]
    pub failed_videos: Option<BTreeSet<ItemId>>,
    #[serde(default)]
    pub failure_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_source_removal: Option<BTreeSet<ItemId>>,
}

impl From<&DestinationProgress> for RawDestinationProgress {
    fn from(progress: &DestinationProgress) -> Self {
        Self {
            completed: Some(progress.completed),
            processed_videos: Some(progress.processed_items.clone()),
            failed_videos: Some(progress.failed_items.clone()),
            failure_count: Some(progress.failure_count),
            pending_source_removal: Some(progress.pending_removal.clone())
                .filter(|pending| !pending.is_empty()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_kind_parsing() {
        assert_eq!("move".parse::<OperationKind>().unwrap(), OperationKind::Move);
        assert_eq!(
            "Deduplicate".parse::<OperationKind>().unwrap(),
            OperationKind::Deduplicate
        );
        assert!("shuffle".parse::<OperationKind>().is_err());
        assert_eq!(OperationKind::Classify.to_string(), "classify");
    }

    #[test]
    fn test_legacy_flat_sets_are_migrated() {
        let json = serde_json::json!({
            "playlist_id": "PL1",
            "operation_type": "move",
            "destination_metadata": {"D1": {"title": "Music"}},
            "videos": {"v1": {"video_id": "v1", "title": "One"}},
            "processed_videos": ["v1"],
            "failed_videos": ["v1", "v2"]
        });
        let file: CheckpointFile = serde_json::from_value(json).unwrap();
        let checkpoint = Checkpoint::from_file(file);

        let progress = &checkpoint.destination_progress["D1"];
        assert!(progress.processed_items.contains("v1"));
        assert!(progress.failed_items.contains("v2"));
        assert!(!progress.failed_items.contains("v1"));
        assert!(checkpoint.items.contains_key("v2"));
        assert_eq!(checkpoint.items["v1"].title.as_deref(), Some("One"));
    }

    #[test]
    fn test_canonical_progress_wins_over_legacy() {
        let json = serde_json::json!({
            "playlist_id": "PL1",
            "operation_type": "copy",
            "destination_progress": {
                "D1": {"completed": true, "processed_videos": ["v3"], "failed_videos": [], "failure_count": 0}
            },
            "processed_videos": ["v1"]
        });
        let file: CheckpointFile = serde_json::from_value(json).unwrap();
        let checkpoint = Checkpoint::from_file(file);

        let progress = &checkpoint.destination_progress["D1"];
        assert!(progress.completed);
        assert_eq!(progress.processed_items.len(), 1);
        assert!(progress.processed_items.contains("v3"));
    }

    #[test]
    fn test_legacy_fields_derived_on_save() {
        let mut checkpoint = Checkpoint::new("PL1", OperationKind::Move);
        let mut progress = DestinationProgress::default();
        progress.processed_items.insert("v1".to_string());
        progress.failed_items.insert("v2".to_string());
        checkpoint
            .destination_progress
            .insert("D1".to_string(), progress);

        let file = checkpoint.to_file();
        assert_eq!(file.processed_videos.unwrap().len(), 1);
        assert!(file.failed_videos.unwrap().contains("v2"));
        assert_eq!(file.video_assignments["v1"], "D1");
    }

    #[test]
    fn test_pending_removal_survives_round_trip() {
        let mut checkpoint = Checkpoint::new("PL1", OperationKind::Move);
        let mut progress = DestinationProgress::default();
        progress.processed_items.insert("v1".to_string());
        progress.pending_removal.insert("v1".to_string());
        checkpoint
            .destination_progress
            .insert("D1".to_string(), progress);

        let json = serde_json::to_value(checkpoint.to_file()).unwrap();
        assert_eq!(
            json["destination_progress"]["D1"]["pending_source_removal"],
            serde_json::json!(["v1"])
        );

        let file: CheckpointFile = serde_json::from_value(json).unwrap();
        let loaded = Checkpoint::from_file(file);
        assert!(loaded.destination_progress["D1"].pending_removal.contains("v1"));
    }
}

//! Undo record model

use crate::checkpoint::{CollectionId, ItemId, OperationKind};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Everything needed to reverse the last run of an operation kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UndoRecord {
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "operation_type")]
    pub kind: OperationKind,
    #[serde(rename = "source_playlists")]
    pub sources: Vec<CollectionId>,
    #[serde(rename = "target_playlists")]
    pub destinations: Vec<CollectionId>,
    pub was_move: bool,
    #[serde(rename = "videos")]
    pub items: Vec<ItemId>,
    pub target_mapping: BTreeMap<CollectionId, Vec<ItemId>>,
}

impl UndoRecord {
    /// Build a record from the per-destination mapping of mutated items
    pub fn new(
        kind: OperationKind,
        sources: Vec<CollectionId>,
        was_move: bool,
        target_mapping: BTreeMap<CollectionId, Vec<ItemId>>,
    ) -> Self {
        let destinations = target_mapping.keys().cloned().collect();
        let mut items: Vec<ItemId> = Vec::new();
        for ids in target_mapping.values() {
            for id in ids {
                if !items.contains(id) {
                    items.push(id.clone());
                }
            }
        }

        Self {
            timestamp: Utc::now(),
            kind,
            sources,
            destinations,
            was_move,
            items,
            target_mapping,
        }
    }

    /// Whether `item_id` was placed into `destination_id`
    pub fn is_mapped(&self, destination_id: &str, item_id: &str) -> bool {
        self.target_mapping
            .get(destination_id)
            .map(|ids| ids.iter().any(|id| id == item_id))
            .unwrap_or(false)
    }
}

/// Accept RFC 3339 as well as naive ISO timestamps written by older versions
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_collects_unique_items() {
        let mut mapping = BTreeMap::new();
        mapping.insert("D1".to_string(), vec!["v1".to_string(), "v2".to_string()]);
        mapping.insert("D2".to_string(), vec!["v2".to_string(), "v3".to_string()]);

        let record = UndoRecord::new(OperationKind::Classify, vec!["S1".into()], true, mapping);

        assert_eq!(record.destinations, vec!["D1", "D2"]);
        assert_eq!(record.items, vec!["v1", "v2", "v3"]);
        assert!(record.is_mapped("D2", "v3"));
        assert!(!record.is_mapped("D1", "v3"));
    }

    #[test]
    fn test_naive_timestamp_is_accepted() {
        let json = serde_json::json!({
            "timestamp": "2024-03-01T10:15:30.123456",
            "operation_type": "move",
            "source_playlists": ["S1"],
            "target_playlists": ["D1"],
            "was_move": true,
            "videos": ["v1"],
            "target_mapping": {"D1": ["v1"]}
        });

        let record: UndoRecord = serde_json::from_value(json).unwrap();
        assert_eq!(record.kind, OperationKind::Move);
        assert_eq!(record.timestamp.format("%Y-%m-%d").to_string(), "2024-03-01");
    }
}

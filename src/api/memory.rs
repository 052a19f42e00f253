//! In-memory collaborator implementations.
//!
//! [`MemoryCollectionApi`] behaves like the remote playlist service: ordered
//! collections that may contain duplicates, per-id partial success, and
//! not-found errors. Failures can be injected per item or per call, and every
//! call is journaled so callers can assert on the exact traffic.

use super::{ApiError, ApiResult, Classifier, CollectionApi, CollectionInfo, Item, ItemId};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

/// One journaled call against a [`MemoryCollectionApi`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    ListItems {
        collection_id: String,
    },
    AddItems {
        collection_id: String,
        item_ids: Vec<ItemId>,
    },
    RemoveItems {
        collection_id: String,
        item_ids: Vec<ItemId>,
    },
    GetCollectionInfo {
        collection_id: String,
    },
}

/// Call kinds that can be made to fail as a whole
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    List,
    Add,
    Remove,
    Info,
}

#[derive(Debug, Clone)]
struct MemoryCollection {
    info: CollectionInfo,
    items: Vec<Item>,
}

#[derive(Debug, Default)]
struct MemoryState {
    collections: HashMap<String, MemoryCollection>,
    catalog: HashMap<ItemId, Item>,
    failing_adds: HashSet<(String, ItemId)>,
    failing_removes: HashSet<(String, ItemId)>,
    failing_calls: HashMap<(String, CallKind), ApiError>,
    calls: Vec<ApiCall>,
}

impl MemoryState {
    fn check_call(&self, collection_id: &str, kind: CallKind) -> ApiResult<()> {
        if let Some(err) = self.failing_calls.get(&(collection_id.to_string(), kind)) {
            return Err(err.clone());
        }
        if !self.collections.contains_key(collection_id) {
            return Err(ApiError::not_found(collection_id));
        }
        Ok(())
    }
}

/// In-memory playlist service
#[derive(Debug, Default)]
pub struct MemoryCollectionApi {
    state: Mutex<MemoryState>,
}

impl MemoryCollectionApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Builder-style variant of [`Self::add_collection`]
    pub fn with_collection(self, collection_id: &str, title: &str, items: Vec<Item>) -> Self {
        self.add_collection(collection_id, title, items);
        self
    }

    /// Create or replace a collection
    pub fn add_collection(&self, collection_id: &str, title: &str, items: Vec<Item>) {
        let mut state = self.state();
        for item in &items {
            state.catalog.insert(item.id.clone(), item.clone());
        }
        state.collections.insert(
            collection_id.to_string(),
            MemoryCollection {
                info: CollectionInfo::new(title),
                items,
            },
        );
    }

    /// Make adding `item_id` to `collection_id` fail
    pub fn fail_add(&self, collection_id: &str, item_id: &str) {
        self.state()
            .failing_adds
            .insert((collection_id.to_string(), item_id.to_string()));
    }

    /// Make removing `item_id` from `collection_id` fail
    pub fn fail_remove(&self, collection_id: &str, item_id: &str) {
        self.state()
            .failing_removes
            .insert((collection_id.to_string(), item_id.to_string()));
    }

    /// Make every call of `kind` against `collection_id` return `error`
    pub fn fail_call(&self, collection_id: &str, kind: CallKind, error: ApiError) {
        self.state()
            .failing_calls
            .insert((collection_id.to_string(), kind), error);
    }

    /// Drop every injected failure
    pub fn clear_failures(&self) {
        let mut state = self.state();
        state.failing_adds.clear();
        state.failing_removes.clear();
        state.failing_calls.clear();
    }

    /// Current item ids of a collection, in order
    pub fn item_ids(&self, collection_id: &str) -> Vec<ItemId> {
        self.state()
            .collections
            .get(collection_id)
            .map(|c| c.items.iter().map(|i| i.id.clone()).collect())
            .unwrap_or_default()
    }

    /// Journal of calls made so far
    pub fn calls(&self) -> Vec<ApiCall> {
        self.state().calls.clone()
    }

    /// Journaled mutating calls only
    pub fn mutations(&self) -> Vec<ApiCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, ApiCall::AddItems { .. } | ApiCall::RemoveItems { .. }))
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }
}

#[async_trait]
impl CollectionApi for MemoryCollectionApi {
    async fn list_items(&self, collection_id: &str) -> ApiResult<Vec<Item>> {
        let mut state = self.state();
        state.calls.push(ApiCall::ListItems {
            collection_id: collection_id.to_string(),
        });
        state.check_call(collection_id, CallKind::List)?;
        Ok(state
            .collections
            .get(collection_id)
            .map(|c| c.items.clone())
            .unwrap_or_default())
    }

    async fn add_items(&self, collection_id: &str, item_ids: &[ItemId]) -> ApiResult<Vec<ItemId>> {
        let mut state = self.state();
        state.calls.push(ApiCall::AddItems {
            collection_id: collection_id.to_string(),
            item_ids: item_ids.to_vec(),
        });
        state.check_call(collection_id, CallKind::Add)?;

        let mut added = Vec::new();
        for id in item_ids {
            if state
                .failing_adds
                .contains(&(collection_id.to_string(), id.clone()))
            {
                continue;
            }
            let item = state
                .catalog
                .get(id)
                .cloned()
                .unwrap_or_else(|| Item::minimal(id.clone()));
            if let Some(collection) = state.collections.get_mut(collection_id) {
                collection.items.push(item);
                added.push(id.clone());
            }
        }
        Ok(added)
    }

    async fn remove_items(
        &self,
        collection_id: &str,
        item_ids: &[ItemId],
    ) -> ApiResult<Vec<ItemId>> {
        let mut state = self.state();
        state.calls.push(ApiCall::RemoveItems {
            collection_id: collection_id.to_string(),
            item_ids: item_ids.to_vec(),
        });
        state.check_call(collection_id, CallKind::Remove)?;

        let mut removed = Vec::new();
        for id in item_ids {
            if state
                .failing_removes
                .contains(&(collection_id.to_string(), id.clone()))
            {
                continue;
            }
            if let Some(collection) = state.collections.get_mut(collection_id) {
                // Drop the last occurrence so the earliest one survives
                if let Some(pos) = collection.items.iter().rposition(|i| &i.id == id) {
                    collection.items.remove(pos);
                    removed.push(id.clone());
                }
            }
        }
        Ok(removed)
    }

    async fn get_collection_info(&self, collection_id: &str) -> ApiResult<CollectionInfo> {
        let mut state = self.state();
        state.calls.push(ApiCall::GetCollectionInfo {
            collection_id: collection_id.to_string(),
        });
        state.check_call(collection_id, CallKind::Info)?;
        Ok(state
            .collections
            .get(collection_id)
            .map(|c| c.info.clone())
            .unwrap_or_default())
    }
}

/// Classifier that matches when any predicate word occurs in the item's
/// title or description, ignoring case.
#[derive(Debug, Default)]
pub struct KeywordClassifier {
    seen: Mutex<Vec<ItemId>>,
}

impl KeywordClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids of every item passed to `classify`, in call order
    pub fn classified_ids(&self) -> Vec<ItemId> {
        self.seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl Classifier for KeywordClassifier {
    async fn classify(&self, items: &[Item], predicate: &str) -> ApiResult<Vec<bool>> {
        let words: Vec<String> = predicate
            .split_whitespace()
            .map(|w| w.to_lowercase())
            .collect();
        if words.is_empty() {
            return Err(ApiError::classification("empty predicate"));
        }

        self.seen
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .extend(items.iter().map(|i| i.id.clone()));

        Ok(items
            .iter()
            .map(|item| {
                let haystack = format!(
                    "{} {}",
                    item.title_or_empty(),
                    item.description.as_deref().unwrap_or("")
                )
                .to_lowercase();
                words.iter().any(|w| haystack.contains(w.as_str()))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(ids: &[&str]) -> Vec<Item> {
        ids.iter().map(|id| Item::new(*id, format!("title {}", id))).collect()
    }

    #[tokio::test]
    async fn test_add_reports_partial_success() {
        let api = MemoryCollectionApi::new().with_collection("D1", "Dest", vec![]);
        api.fail_add("D1", "v3");

        let ids: Vec<ItemId> = vec!["v1".into(), "v2".into(), "v3".into()];
        let added = api.add_items("D1", &ids).await.unwrap();

        assert_eq!(added, vec!["v1".to_string(), "v2".to_string()]);
        assert_eq!(api.item_ids("D1"), vec!["v1", "v2"]);
    }

    #[tokio::test]
    async fn test_remove_keeps_first_occurrence() {
        let api = MemoryCollectionApi::new().with_collection(
            "S1",
            "Source",
            vec![
                Item::new("v1", "a"),
                Item::new("v2", "b"),
                Item::new("v1", "c"),
            ],
        );

        let removed = api.remove_items("S1", &["v1".to_string()]).await.unwrap();

        assert_eq!(removed, vec!["v1".to_string()]);
        let remaining = api.list_items("S1").await.unwrap();
        assert_eq!(remaining[0].title.as_deref(), Some("a"));
        assert_eq!(api.item_ids("S1"), vec!["v1", "v2"]);
    }

    #[tokio::test]
    async fn test_missing_collection_is_not_found() {
        let api = MemoryCollectionApi::new();
        let err = api.get_collection_info("nope").await.unwrap_err();
        assert_eq!(err, ApiError::not_found("nope"));
    }

    #[tokio::test]
    async fn test_call_failure_and_journal() {
        let api = MemoryCollectionApi::new().with_collection("S1", "Source", items(&["v1"]));
        api.fail_call("S1", CallKind::List, ApiError::RateLimited { retry_after: Some(30) });

        assert!(api.list_items("S1").await.is_err());
        api.clear_failures();
        assert_eq!(api.list_items("S1").await.unwrap().len(), 1);
        assert_eq!(api.calls().len(), 2);
        assert!(api.mutations().is_empty());
    }

    #[tokio::test]
    async fn test_keyword_classifier() {
        let classifier = KeywordClassifier::new();
        let input = vec![
            Item::new("v1", "Rust tutorial"),
            Item::new("v2", "Cooking show").with_description("pasta"),
            Item::new("v3", "Gardening"),
        ];

        let result = classifier.classify(&input, "rust PASTA").await.unwrap();

        assert_eq!(result, vec![true, true, false]);
        assert_eq!(classifier.classified_ids().len(), 3);
        assert!(classifier.classify(&input, "  ").await.is_err());
    }
}

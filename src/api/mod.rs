//! Collaborator interfaces: the remote playlist API and the content classifier.
//!
//! The engine never talks to a concrete remote service. Hosts implement
//! [`CollectionApi`] and [`Classifier`] for their client; this crate ships an
//! in-memory implementation ([`MemoryCollectionApi`]) and a metadata cache
//! wrapper ([`CachedCollectionApi`]).

pub mod cache;
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

pub use crate::checkpoint::{CollectionInfo, Item, ItemId};
pub use cache::{CacheStats, CachedCollectionApi, CollectionCache};
pub use memory::{ApiCall, CallKind, KeywordClassifier, MemoryCollectionApi};

/// Result type for collaborator calls
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors reported by collaborators
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("Playlist not found: {collection_id}")]
    NotFound { collection_id: String },

    #[error("Rate limit exceeded{}", retry_hint(.retry_after))]
    RateLimited { retry_after: Option<u64> },

    #[error("Request failed: {message}")]
    Request { message: String },

    #[error("Classification failed: {message}")]
    Classification { message: String },
}

fn retry_hint(retry_after: &Option<u64>) -> String {
    retry_after
        .map(|secs| format!(", retry after {}s", secs))
        .unwrap_or_default()
}

impl ApiError {
    /// Create a not found error
    pub fn not_found<S: Into<String>>(collection_id: S) -> Self {
        Self::NotFound {
            collection_id: collection_id.into(),
        }
    }

    /// Create a generic request error
    pub fn request<S: Into<String>>(message: S) -> Self {
        Self::Request {
            message: message.into(),
        }
    }

    /// Create a classification error
    pub fn classification<S: Into<String>>(message: S) -> Self {
        Self::Classification {
            message: message.into(),
        }
    }

    /// Whether a later retry may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::RateLimited { .. } | ApiError::Request { .. })
    }
}

/// Remote collection API.
///
/// `add_items` and `remove_items` report the ids that succeeded; ids missing
/// from the result failed. `remove_items` removes one occurrence per listed id,
/// keeping the earliest occurrence when an id appears several times.
#[async_trait]
pub trait CollectionApi: Send + Sync {
    /// All items of a collection, in collection order
    async fn list_items(&self, collection_id: &str) -> ApiResult<Vec<Item>>;

    /// Append items to a collection
    async fn add_items(&self, collection_id: &str, item_ids: &[ItemId]) -> ApiResult<Vec<ItemId>>;

    /// Remove items from a collection
    async fn remove_items(
        &self,
        collection_id: &str,
        item_ids: &[ItemId],
    ) -> ApiResult<Vec<ItemId>>;

    /// Collection metadata
    async fn get_collection_info(&self, collection_id: &str) -> ApiResult<CollectionInfo>;
}

/// Content classifier
#[async_trait]
pub trait Classifier: Send + Sync {
    /// One decision per input item, same order as the input
    async fn classify(&self, items: &[Item], predicate: &str) -> ApiResult<Vec<bool>>;
}

#[async_trait]
impl<T: CollectionApi + ?Sized> CollectionApi for std::sync::Arc<T> {
    async fn list_items(&self, collection_id: &str) -> ApiResult<Vec<Item>> {
        (**self).list_items(collection_id).await
    }

    async fn add_items(&self, collection_id: &str, item_ids: &[ItemId]) -> ApiResult<Vec<ItemId>> {
        (**self).add_items(collection_id, item_ids).await
    }

    async fn remove_items(
        &self,
        collection_id: &str,
        item_ids: &[ItemId],
    ) -> ApiResult<Vec<ItemId>> {
        (**self).remove_items(collection_id, item_ids).await
    }

    async fn get_collection_info(&self, collection_id: &str) -> ApiResult<CollectionInfo> {
        (**self).get_collection_info(collection_id).await
    }
}

#[async_trait]
impl<T: CollectionApi + ?Sized> CollectionApi for &T {
    async fn list_items(&self, collection_id: &str) -> ApiResult<Vec<Item>> {
        (**self).list_items(collection_id).await
    }

    async fn add_items(&self, collection_id: &str, item_ids: &[ItemId]) -> ApiResult<Vec<ItemId>> {
        (**self).add_items(collection_id, item_ids).await
    }

    async fn remove_items(
        &self,
        collection_id: &str,
        item_ids: &[ItemId],
    ) -> ApiResult<Vec<ItemId>> {
        (**self).remove_items(collection_id, item_ids).await
    }

    async fn get_collection_info(&self, collection_id: &str) -> ApiResult<CollectionInfo> {
        (**self).get_collection_info(collection_id).await
    }
}

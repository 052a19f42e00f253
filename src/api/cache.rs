//! Playlist metadata cache.
//!
//! The cache is an explicit value owned by whoever needs it; entries expire
//! after a TTL and the backing file is written only on [`CollectionCache::flush`].

use super::{ApiResult, CollectionApi, CollectionInfo, Item, ItemId};
use crate::checkpoint::{AtomicOps, CheckpointResult};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

/// Hit/miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub expired: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    value: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expiry: Option<DateTime<Utc>>,
}

impl CacheEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry.map(|e| now > e).unwrap_or(false)
    }
}

/// TTL cache of JSON values, optionally persisted to a file
#[derive(Debug, Default)]
pub struct CollectionCache {
    cache_file: Option<PathBuf>,
    entries: HashMap<String, CacheEntry>,
    stats: CacheStats,
    dirty: bool,
}

impl CollectionCache {
    /// Cache that never touches the filesystem
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open a file-backed cache. A missing or unreadable file starts empty.
    pub fn open(cache_file: impl Into<PathBuf>) -> Self {
        let cache_file = cache_file.into();
        let entries = if cache_file.exists() {
            match AtomicOps::read_json::<HashMap<String, CacheEntry>>(&cache_file) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(path = %cache_file.display(), error = %e, "Error loading cache, starting empty");
                    HashMap::new()
                }
            }
        } else {
            HashMap::new()
        };

        Self {
            cache_file: Some(cache_file),
            entries,
            stats: CacheStats::default(),
            dirty: false,
        }
    }

    pub fn cache_file(&self) -> Option<&Path> {
        self.cache_file.as_deref()
    }

    /// Value for `key` if present and not expired
    pub fn get(&mut self, key: &str) -> Option<serde_json::Value> {
        let now = Utc::now();
        match self.entries.get(key) {
            None => {
                self.stats.misses += 1;
                None
            }
            Some(entry) if entry.is_expired(now) => {
                self.entries.remove(key);
                self.dirty = true;
                self.stats.expired += 1;
                self.stats.misses += 1;
                None
            }
            Some(entry) => {
                self.stats.hits += 1;
                Some(entry.value.clone())
            }
        }
    }

    /// Store a value; `ttl_seconds = None` never expires
    pub fn set(&mut self, key: &str, value: serde_json::Value, ttl_seconds: Option<u64>) {
        let expiry = ttl_seconds.map(|ttl| Utc::now() + Duration::seconds(ttl as i64));
        self.entries
            .insert(key.to_string(), CacheEntry { value, expiry });
        self.dirty = true;
    }

    pub fn invalidate(&mut self, key: &str) {
        if self.entries.remove(key).is_some() {
            self.dirty = true;
        }
    }

    /// Drop all entries and reset statistics
    pub fn clear(&mut self) {
        self.entries.clear();
        self.stats = CacheStats::default();
        self.dirty = true;
    }

    /// Remove expired entries. Returns how many were removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = Utc::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let removed = before - self.entries.len();
        if removed > 0 {
            self.stats.expired += removed as u64;
            self.dirty = true;
            debug!(removed, "Removed expired cache entries");
        }
        removed
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write pending changes to the backing file, if any
    pub fn flush(&mut self) -> CheckpointResult<()> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(path) = &self.cache_file {
            AtomicOps::write_json(path, &self.entries)?;
        }
        self.dirty = false;
        Ok(())
    }
}

/// Wraps a [`CollectionApi`] and caches `get_collection_info` results.
///
/// Item listings and mutations always go to the inner API.
pub struct CachedCollectionApi<A> {
    inner: A,
    cache: Mutex<CollectionCache>,
    ttl_seconds: Option<u64>,
}

impl<A: CollectionApi> CachedCollectionApi<A> {
    pub fn new(inner: A, cache: CollectionCache, ttl_seconds: Option<u64>) -> Self {
        Self {
            inner,
            cache: Mutex::new(cache),
            ttl_seconds,
        }
    }

    fn cache(&self) -> MutexGuard<'_, CollectionCache> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn key(collection_id: &str) -> String {
        format!("collection_info:{}", collection_id)
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    pub fn stats(&self) -> CacheStats {
        self.cache().stats()
    }

    /// Persist the cache
    pub fn flush(&self) -> CheckpointResult<()> {
        self.cache().flush()
    }

    fn invalidate(&self, collection_id: &str) {
        self.cache().invalidate(&Self::key(collection_id));
    }
}

#[async_trait]
impl<A: CollectionApi> CollectionApi for CachedCollectionApi<A> {
    async fn list_items(&self, collection_id: &str) -> ApiResult<Vec<Item>> {
        self.inner.list_items(collection_id).await
    }

    async fn add_items(&self, collection_id: &str, item_ids: &[ItemId]) -> ApiResult<Vec<ItemId>> {
        let result = self.inner.add_items(collection_id, item_ids).await;
        // Item counts in the cached metadata are stale now
        self.invalidate(collection_id);
        result
    }

    async fn remove_items(
        &self,
        collection_id: &str,
        item_ids: &[ItemId],
    ) -> ApiResult<Vec<ItemId>> {
        let result = self.inner.remove_items(collection_id, item_ids).await;
        self.invalidate(collection_id);
        result
    }

    async fn get_collection_info(&self, collection_id: &str) -> ApiResult<CollectionInfo> {
        let key = Self::key(collection_id);
        let cached = self.cache().get(&key);
        if let Some(value) = cached {
            match serde_json::from_value::<CollectionInfo>(value) {
                Ok(info) => return Ok(info),
                Err(e) => {
                    warn!(collection_id, error = %e, "Discarding malformed cache entry");
                    self.cache().invalidate(&key);
                }
            }
        }

        let info = self.inner.get_collection_info(collection_id).await?;
        if let Ok(value) = serde_json::to_value(&info) {
            self.cache().set(&key, value, self.ttl_seconds);
        }
        Ok(info)
    }
}

//! Working-set selection: what a destination still needs from a fetched list

use super::{EngineError, EngineResult};
use crate::api::Classifier;
use crate::checkpoint::{DestinationProgress, Item};
use std::collections::HashSet;

/// Items selected for one destination plus the reasons others were dropped
#[derive(Debug, Clone, Default)]
pub struct WorkingSet {
    pub items: Vec<Item>,
    pub skipped_processed: usize,
    pub skipped_failed: usize,
    pub not_matched: usize,
    pub truncated: bool,
}

/// First occurrence of every id, in list order
pub fn unique_in_order(items: &[Item]) -> Vec<Item> {
    let mut seen = HashSet::new();
    items
        .iter()
        .filter(|item| seen.insert(item.id.as_str()))
        .cloned()
        .collect()
}

/// Every occurrence after the first, in list order
pub fn duplicate_occurrences(items: &[Item]) -> Vec<Item> {
    let mut seen = HashSet::new();
    items
        .iter()
        .filter(|item| !seen.insert(item.id.as_str()))
        .cloned()
        .collect()
}

impl WorkingSet {
    /// Drop items this destination already decided.
    ///
    /// Processed items are always skipped; failed ones only unless
    /// `retry_failed` is set.
    pub fn from_candidates(
        candidates: Vec<Item>,
        progress: &DestinationProgress,
        retry_failed: bool,
    ) -> Self {
        let mut set = WorkingSet::default();
        for item in candidates {
            if progress.processed_items.contains(&item.id) {
                set.skipped_processed += 1;
            } else if progress.failed_items.contains(&item.id) && !retry_failed {
                set.skipped_failed += 1;
            } else {
                set.items.push(item);
            }
        }
        set
    }

    /// Keep items whose title contains `pattern`, ignoring case
    pub fn retain_matching(&mut self, pattern: &str) {
        let needle = pattern.to_lowercase();
        let before = self.items.len();
        self.items
            .retain(|item| item.title_or_empty().to_lowercase().contains(&needle));
        self.not_matched += before - self.items.len();
    }

    /// Keep items the classifier accepts, classifying `batch_size` at a time
    pub async fn retain_classified(
        &mut self,
        classifier: &dyn Classifier,
        predicate: &str,
        batch_size: usize,
    ) -> EngineResult<()> {
        let mut kept = Vec::with_capacity(self.items.len());
        for chunk in self.items.chunks(batch_size.max(1)) {
            let decisions = classifier.classify(chunk, predicate).await?;
            if decisions.len() != chunk.len() {
                return Err(EngineError::Classification {
                    message: format!(
                        "classifier returned {} decisions for {} items",
                        decisions.len(),
                        chunk.len()
                    ),
                });
            }
            for (item, keep) in chunk.iter().zip(decisions) {
                if keep {
                    kept.push(item.clone());
                } else {
                    self.not_matched += 1;
                }
            }
        }
        self.items = kept;
        Ok(())
    }

    /// Truncate to `limit`, preserving order
    pub fn apply_limit(&mut self, limit: Option<usize>) {
        if let Some(limit) = limit {
            if self.items.len() > limit {
                self.items.truncate(limit);
                self.truncated = true;
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiResult, KeywordClassifier};
    use async_trait::async_trait;

    fn items(ids: &[&str]) -> Vec<Item> {
        ids.iter().map(|id| Item::new(*id, format!("Video {}", id))).collect()
    }

    fn ids(set: &WorkingSet) -> Vec<&str> {
        set.items.iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn test_resume_skips_processed() {
        let mut progress = DestinationProgress::default();
        progress.processed_items.insert("v1".into());

        let set = WorkingSet::from_candidates(items(&["v1", "v2", "v3"]), &progress, false);

        assert_eq!(ids(&set), vec!["v2", "v3"]);
        assert_eq!(set.skipped_processed, 1);
    }

    #[test]
    fn test_failed_items_need_retry_flag() {
        let mut progress = DestinationProgress::default();
        progress.failed_items.insert("v2".into());

        let without = WorkingSet::from_candidates(items(&["v1", "v2"]), &progress, false);
        assert_eq!(ids(&without), vec!["v1"]);
        assert_eq!(without.skipped_failed, 1);

        let with = WorkingSet::from_candidates(items(&["v1", "v2"]), &progress, true);
        assert_eq!(ids(&with), vec!["v1", "v2"]);
    }

    #[test]
    fn test_duplicates() {
        let list = items(&["v1", "v1", "v2", "v1"]);
        let dups: Vec<_> = duplicate_occurrences(&list).into_iter().map(|i| i.id).collect();
        assert_eq!(dups, vec!["v1", "v1"]);

        let unique: Vec<_> = unique_in_order(&list).into_iter().map(|i| i.id).collect();
        assert_eq!(unique, vec!["v1", "v2"]);
    }

    #[test]
    fn test_pattern_and_limit() {
        let mut set = WorkingSet {
            items: vec![
                Item::new("v1", "Rust Conf keynote"),
                Item::new("v2", "Cooking"),
                Item::new("v3", "rustlings walkthrough"),
                Item::minimal("v4"),
            ],
            ..Default::default()
        };

        set.retain_matching("RUST");
        assert_eq!(ids(&set), vec!["v1", "v3"]);
        assert_eq!(set.not_matched, 2);

        set.apply_limit(Some(1));
        assert_eq!(ids(&set), vec!["v1"]);
        assert!(set.truncated);

        set.apply_limit(Some(5));
        assert!(set.truncated);
    }

    #[tokio::test]
    async fn test_classification_in_batches() {
        let classifier = KeywordClassifier::new();
        let mut set = WorkingSet {
            items: (0..25)
                .map(|n| Item::new(format!("v{}", n), if n % 2 == 0 { "music" } else { "news" }))
                .collect(),
            ..Default::default()
        };

        set.retain_classified(&classifier, "music", 10).await.unwrap();

        assert_eq!(set.items.len(), 13);
        assert_eq!(set.not_matched, 12);
        assert_eq!(classifier.classified_ids().len(), 25);
    }

    struct ShortClassifier;

    #[async_trait]
    impl Classifier for ShortClassifier {
        async fn classify(&self, items: &[Item], _predicate: &str) -> ApiResult<Vec<bool>> {
            Ok(vec![true; items.len().saturating_sub(1)])
        }
    }

    #[tokio::test]
    async fn test_length_mismatch_is_an_error() {
        let mut set = WorkingSet {
            items: items(&["v1", "v2"]),
            ..Default::default()
        };

        let err = set.retain_classified(&ShortClassifier, "x", 10).await.unwrap_err();
        assert!(matches!(err, EngineError::Classification { .. }));
    }
}

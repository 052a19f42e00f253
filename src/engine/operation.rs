//! Operation description and parameter validation

use super::{EngineError, EngineResult};
use crate::checkpoint::{CollectionId, OperationKind};

/// A destination and the predicate that selects items for it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationSpec {
    pub collection_id: CollectionId,
    pub predicate: Option<String>,
}

impl DestinationSpec {
    pub fn new<S: Into<String>>(collection_id: S) -> Self {
        Self {
            collection_id: collection_id.into(),
            predicate: None,
        }
    }

    pub fn with_predicate<S: Into<String>, P: Into<String>>(collection_id: S, predicate: P) -> Self {
        Self {
            collection_id: collection_id.into(),
            predicate: Some(predicate.into()),
        }
    }
}

/// How the controller mutates collections for an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationMode {
    /// Add to the destination, keep the source
    AddOnly,
    /// Add to the destination, then remove the added ids from the source
    AddThenRemove,
    /// Remove from the collection itself
    RemoveOnly,
}

/// One batch operation request.
///
/// Not persisted: its identity is the (source, kind) key of the checkpoints
/// it touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operation {
    pub kind: OperationKind,
    pub sources: Vec<CollectionId>,
    pub destinations: Vec<DestinationSpec>,
    /// Applies to destinations without their own predicate
    pub predicate: Option<String>,
    /// Keep items in the source after they reach a destination
    pub copy: bool,
    pub retry_failed: bool,
    pub limit: Option<usize>,
    pub dry_run: bool,
    pub resume: bool,
    pub resume_destination: Option<CollectionId>,
}

impl Operation {
    fn base(kind: OperationKind, sources: Vec<CollectionId>, destinations: Vec<DestinationSpec>) -> Self {
        Self {
            kind,
            sources,
            destinations,
            predicate: None,
            copy: false,
            retry_failed: false,
            limit: None,
            dry_run: false,
            resume: false,
            resume_destination: None,
        }
    }

    /// Move every item of `source` into `destination`
    pub fn move_items(source: &str, destination: &str) -> Self {
        Self::base(
            OperationKind::Move,
            vec![source.to_string()],
            vec![DestinationSpec::new(destination)],
        )
    }

    /// Copy every item of `source` into `destination`
    pub fn copy_items(source: &str, destination: &str) -> Self {
        let mut op = Self::base(
            OperationKind::Copy,
            vec![source.to_string()],
            vec![DestinationSpec::new(destination)],
        );
        op.copy = true;
        op
    }

    /// Move (or copy) items whose title contains `pattern`
    pub fn filter(source: &str, destination: &str, pattern: &str) -> Self {
        let mut op = Self::base(
            OperationKind::Filter,
            vec![source.to_string()],
            vec![DestinationSpec::new(destination)],
        );
        op.predicate = Some(pattern.to_string());
        op
    }

    /// Distribute items across destinations by classifier predicate
    pub fn classify(source: &str, destinations: Vec<DestinationSpec>) -> Self {
        Self::base(OperationKind::Classify, vec![source.to_string()], destinations)
    }

    /// Gather items of several sources into one destination
    pub fn consolidate(sources: &[&str], destination: &str) -> Self {
        Self::base(
            OperationKind::Consolidate,
            sources.iter().map(|s| s.to_string()).collect(),
            vec![DestinationSpec::new(destination)],
        )
    }

    /// Remove repeated items from a playlist, keeping the first occurrence
    pub fn deduplicate(playlist: &str) -> Self {
        Self::base(
            OperationKind::Deduplicate,
            vec![playlist.to_string()],
            vec![DestinationSpec::new(playlist)],
        )
    }

    pub fn with_copy(mut self, copy: bool) -> Self {
        self.copy = copy;
        self
    }

    pub fn with_predicate<S: Into<String>>(mut self, predicate: S) -> Self {
        self.predicate = Some(predicate.into());
        self
    }

    pub fn with_resume(mut self) -> Self {
        self.resume = true;
        self
    }

    pub fn resume_from<S: Into<String>>(mut self, destination: S) -> Self {
        self.resume = true;
        self.resume_destination = Some(destination.into());
        self
    }

    pub fn with_retry_failed(mut self) -> Self {
        self.retry_failed = true;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Mutation strategy implied by kind and copy flag
    pub fn mutation_mode(&self) -> MutationMode {
        match self.kind {
            OperationKind::Deduplicate => MutationMode::RemoveOnly,
            OperationKind::Copy => MutationMode::AddOnly,
            _ if self.copy => MutationMode::AddOnly,
            _ => MutationMode::AddThenRemove,
        }
    }

    /// Predicate in effect for a destination
    pub fn predicate_for<'a>(&'a self, destination: &'a DestinationSpec) -> Option<&'a str> {
        destination
            .predicate
            .as_deref()
            .or(self.predicate.as_deref())
            .filter(|p| !p.trim().is_empty())
    }

    /// Checks that need no remote call and no checkpoint
    pub fn validate(&self) -> EngineResult<()> {
        if self.sources.is_empty() || self.sources.iter().any(|s| s.trim().is_empty()) {
            return Err(EngineError::validation("a source playlist is required"));
        }
        if self.sources.len() > 1 && self.kind != OperationKind::Consolidate {
            return Err(EngineError::validation(format!(
                "{} takes exactly one source playlist",
                self.kind
            )));
        }
        if self.destinations.is_empty()
            || self
                .destinations
                .iter()
                .any(|d| d.collection_id.trim().is_empty())
        {
            return Err(EngineError::validation("a destination playlist is required"));
        }
        if self.resume_destination.is_some() && !self.resume {
            return Err(EngineError::validation(
                "resume destination requires resume to be enabled",
            ));
        }
        if self.retry_failed && !self.resume {
            return Err(EngineError::validation(
                "retry of failed items requires resume to be enabled",
            ));
        }
        if let Some(target) = &self.resume_destination {
            if !self.destinations.iter().any(|d| &d.collection_id == target) {
                return Err(EngineError::validation(format!(
                    "resume destination {} is not part of this operation",
                    target
                )));
            }
        }
        if self.limit == Some(0) {
            return Err(EngineError::validation("limit must be at least 1"));
        }

        match self.kind {
            OperationKind::Filter => {
                if self.destinations.iter().any(|d| self.predicate_for(d).is_none()) {
                    return Err(EngineError::validation("filter requires a non-empty pattern"));
                }
            }
            OperationKind::Classify => {
                if self.destinations.iter().any(|d| self.predicate_for(d).is_none()) {
                    return Err(EngineError::validation(
                        "classify requires a predicate for every destination",
                    ));
                }
            }
            OperationKind::Deduplicate => {
                if self.destinations.len() != 1 || self.destinations[0].collection_id != self.sources[0] {
                    return Err(EngineError::validation(
                        "deduplicate operates on a single playlist in place",
                    ));
                }
            }
            OperationKind::Move | OperationKind::Copy | OperationKind::Consolidate => {}
        }

        if self.kind != OperationKind::Deduplicate {
            for destination in &self.destinations {
                if self.sources.contains(&destination.collection_id) {
                    return Err(EngineError::validation(format!(
                        "playlist {} is both source and destination",
                        destination.collection_id
                    )));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mutation_modes() {
        assert_eq!(Operation::move_items("S", "D").mutation_mode(), MutationMode::AddThenRemove);
        assert_eq!(Operation::copy_items("S", "D").mutation_mode(), MutationMode::AddOnly);
        assert_eq!(
            Operation::filter("S", "D", "rust").with_copy(true).mutation_mode(),
            MutationMode::AddOnly
        );
        assert_eq!(Operation::deduplicate("S").mutation_mode(), MutationMode::RemoveOnly);
    }

    #[test]
    fn test_resume_destination_requires_resume() {
        let mut op = Operation::move_items("S", "D");
        op.resume_destination = Some("D".to_string());
        assert!(matches!(op.validate(), Err(EngineError::Validation { .. })));

        assert!(Operation::move_items("S", "D").resume_from("D").validate().is_ok());
        assert!(Operation::move_items("S", "D").resume_from("X").validate().is_err());
    }

    #[test]
    fn test_retry_failed_requires_resume() {
        let op = Operation::copy_items("S", "D").with_retry_failed();
        assert!(matches!(op.validate(), Err(EngineError::Validation { .. })));

        assert!(Operation::copy_items("S", "D")
            .with_resume()
            .with_retry_failed()
            .validate()
            .is_ok());
    }

    #[test]
    fn test_single_source_unless_consolidate() {
        let mut op = Operation::move_items("S1", "D");
        op.sources.push("S2".to_string());
        assert!(op.validate().is_err());

        assert!(Operation::consolidate(&["S1", "S2"], "D").validate().is_ok());
    }

    #[test]
    fn test_predicates_required() {
        assert!(Operation::filter("S", "D", "  ").validate().is_err());
        assert!(Operation::classify("S", vec![DestinationSpec::new("D")]).validate().is_err());

        let op = Operation::classify("S", vec![DestinationSpec::new("D")]).with_predicate("music");
        assert!(op.validate().is_ok());
        assert_eq!(op.predicate_for(&op.destinations[0]), Some("music"));
    }

    #[test]
    fn test_source_cannot_be_destination() {
        assert!(Operation::move_items("S", "S").validate().is_err());
        assert!(Operation::deduplicate("S").validate().is_ok());
        assert!(Operation::move_items("S", "D").with_limit(0).validate().is_err());
    }
}

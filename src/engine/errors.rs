//! Error types for the batch engine

use crate::api::ApiError;
use crate::checkpoint::CheckpointError;
use crate::undo::UndoError;
use thiserror::Error;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Run-level failures. Per-item failures never surface here; they are
/// recorded in the ledger and reported in the operation report.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid operation: {message}")]
    Validation { message: String },

    #[error("Playlist not found: {collection_id}")]
    CollectionNotFound { collection_id: String },

    #[error("Classification failed: {message}")]
    Classification { message: String },

    #[error("Remote API error: {0}")]
    Api(ApiError),

    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] CheckpointError),

    #[error("Undo error: {0}")]
    Undo(#[from] UndoError),
}

impl EngineError {
    /// Create a validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Whether the error was raised before any remote mutation
    pub fn is_pre_mutation(&self) -> bool {
        matches!(
            self,
            EngineError::Validation { .. } | EngineError::CollectionNotFound { .. }
        )
    }
}

impl From<ApiError> for EngineError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::NotFound { collection_id } => EngineError::CollectionNotFound { collection_id },
            ApiError::Classification { message } => EngineError::Classification { message },
            other => EngineError::Api(other),
        }
    }
}

//! Error types for the checkpoint system

use std::path::PathBuf;
use thiserror::Error;

/// Result type for checkpoint operations
pub type CheckpointResult<T> = Result<T, CheckpointError>;

/// Errors raised by the checkpoint store and the destination ledger
#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Checkpoint not found for playlist {source_id} ({kind})")]
    NotFound { source_id: String, kind: String },

    #[error("Corrupted checkpoint data in {path}: {message}")]
    CorruptedData { path: PathBuf, message: String },

    #[error("Unknown destination: {destination_id}")]
    UnknownDestination { destination_id: String },

    #[error("Destination {destination_id} is already completed")]
    DestinationCompleted { destination_id: String },

    #[error("Atomic operation failed: {operation}")]
    AtomicOperationFailed { operation: String },
}

impl CheckpointError {
    /// Create a storage error
    pub fn storage<S: Into<String>>(message: S) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create a corrupted data error for a file
    pub fn corrupted<S: Into<String>>(path: impl Into<PathBuf>, message: S) -> Self {
        Self::CorruptedData {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an unknown destination error
    pub fn unknown_destination<S: Into<String>>(destination_id: S) -> Self {
        Self::UnknownDestination {
            destination_id: destination_id.into(),
        }
    }

    /// Create a completed destination error
    pub fn destination_completed<S: Into<String>>(destination_id: S) -> Self {
        Self::DestinationCompleted {
            destination_id: destination_id.into(),
        }
    }

    /// Whether the error means "no usable prior state" rather than a hard failure
    pub fn is_missing_state(&self) -> bool {
        matches!(
            self,
            CheckpointError::NotFound { .. } | CheckpointError::CorruptedData { .. }
        )
    }
}

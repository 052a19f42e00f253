//! Error types for CLI operations

use crate::checkpoint::CheckpointError;
use crate::engine::EngineError;
use crate::undo::UndoError;
use thiserror::Error;

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;

/// Errors that can occur during CLI command execution
#[derive(Error, Debug)]
pub enum CliError {
    /// Error executing a command or operation
    #[error("Execution error: {0}")]
    ExecutionError(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Checkpoint operation error
    #[error("Checkpoint error: {0}")]
    CheckpointError(String),

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerdeError(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Invalid argument or input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),
}

// Conversions from common error types
impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::SerdeError(err.to_string())
    }
}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::ExecutionError(err.to_string())
    }
}

impl From<CheckpointError> for CliError {
    fn from(err: CheckpointError) -> Self {
        CliError::CheckpointError(err.to_string())
    }
}

impl From<EngineError> for CliError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Validation { message } => CliError::ValidationError(message),
            EngineError::CollectionNotFound { collection_id } => {
                CliError::NotFound(format!("playlist {}", collection_id))
            }
            EngineError::Checkpoint(e) => e.into(),
            other => CliError::ExecutionError(other.to_string()),
        }
    }
}

impl From<UndoError> for CliError {
    fn from(err: UndoError) -> Self {
        match err {
            UndoError::NothingToUndo { kind } => {
                CliError::NotFound(format!("no undo information for {} operations", kind))
            }
            UndoError::Storage(e) => e.into(),
            other => CliError::ExecutionError(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkpoint::OperationKind;

    #[test]
    fn test_engine_error_mapping() {
        let err: CliError = EngineError::CollectionNotFound {
            collection_id: "PL404".to_string(),
        }
        .into();
        assert!(matches!(err, CliError::NotFound(ref m) if m == "playlist PL404"));

        let err: CliError = EngineError::validation("limit must be positive").into();
        assert_eq!(err.to_string(), "Validation error: limit must be positive");
    }

    #[test]
    fn test_undo_error_mapping() {
        let err: CliError = UndoError::NothingToUndo {
            kind: OperationKind::Move,
        }
        .into();
        assert!(matches!(err, CliError::NotFound(_)));
    }
}

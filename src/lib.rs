//! tubesort - resumable batch operations over playlist collections
//!
//! Moves, copies, filters, classifies, consolidates and deduplicates items
//! between remote playlists in bounded batches, checkpointing after every
//! batch so an interrupted run resumes exactly where it stopped.
//!
//! - **`checkpoint`** - checkpoint store, destination ledger, cleanup
//! - **`engine`** - the batch operation controller
//! - **`undo`** - undo log for the last operation of each kind
//! - **`api`** - collaborator traits, in-memory implementation, metadata cache
//! - **`config`** - TOML configuration and environment overrides
//! - **`observability`** - markdown journal and tracing setup
//! - **`cli`** - command-line layer (enabled with the `cli` feature)
//!
//! # Example
//!
//! ```no_run
//! use tubesort::prelude::*;
//!
//! # async fn example() -> EngineResult<()> {
//! let api = MemoryCollectionApi::new()
//!     .with_collection("PL_inbox", "Inbox", vec![Item::new("v1", "Live set")])
//!     .with_collection("PL_music", "Music", vec![]);
//!
//! let controller = BatchController::new(&api, CheckpointStore::new("data/recovery"), "data/state");
//! let report = controller
//!     .run(&Operation::filter("PL_inbox", "PL_music", "live").with_resume())
//!     .await?;
//! assert!(report.is_clean());
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod checkpoint;
pub mod config;
pub mod engine;
pub mod observability;
pub mod undo;

/// Command-line layer (enabled with the `cli` feature)
#[cfg(feature = "cli")]
pub mod cli;

/// Commonly used types
pub mod prelude {
    pub use crate::api::{
        ApiError, ApiResult, Classifier, CollectionApi, CollectionInfo, Item, ItemId,
        KeywordClassifier, MemoryCollectionApi,
    };
    pub use crate::checkpoint::{Checkpoint, CheckpointStore, OperationKind};
    pub use crate::engine::{
        BatchController, DestinationSpec, EngineError, EngineResult, Operation, OperationReport,
    };
    pub use crate::undo::{UndoLog, UndoRecord, UndoReport};
}

//! Checkpoint store and destination ledger
//!
//! A checkpoint records the progress of one operation kind against one source
//! playlist: which items are known, which destinations are involved, and for
//! each destination which items were processed or failed. Checkpoints live as
//! JSON files in the recovery directory and are rewritten atomically after
//! every batch.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tubesort::checkpoint::{Checkpoint, CheckpointStore, CollectionInfo, OperationKind};
//!
//! # fn example() -> tubesort::checkpoint::CheckpointResult<()> {
//! let store = CheckpointStore::new("data/recovery");
//! let mut checkpoint = store
//!     .load("PL123", OperationKind::Move)
//!     .unwrap_or_else(|_| Checkpoint::new("PL123", OperationKind::Move));
//!
//! checkpoint.add_destination("PL456", CollectionInfo::new("Music"));
//! checkpoint.assign_item("dQw4w9WgXcQ", "PL456", true, None)?;
//! store.save(&checkpoint)?;
//! # Ok(())
//! # }
//! ```

pub mod atomic;
pub mod cleanup;
pub mod errors;
pub mod ledger;
pub mod models;
pub mod storage;

pub use atomic::{AtomicFileWriter, AtomicOps};
pub use cleanup::{CleanupManager, CleanupReport};
pub use errors::{CheckpointError, CheckpointResult};
pub use models::{
    Checkpoint, CollectionId, CollectionInfo, DestinationProgress, Item, ItemId, OperationKind,
};
pub use storage::{CheckpointFileEntry, CheckpointStore};

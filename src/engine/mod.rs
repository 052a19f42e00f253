//! Resumable batch operation engine
//!
//! The [`BatchController`] runs an [`Operation`] (move, copy, filter,
//! classify, consolidate or deduplicate) against a [`CollectionApi`](crate::api::CollectionApi),
//! recording every item outcome in a checkpoint so an interrupted run can
//! pick up where it stopped.
//!
//! # Example
//!
//! ```no_run
//! use tubesort::api::MemoryCollectionApi;
//! use tubesort::checkpoint::CheckpointStore;
//! use tubesort::engine::{BatchController, Operation};
//!
//! # async fn example() -> tubesort::engine::EngineResult<()> {
//! let api = MemoryCollectionApi::new();
//! let controller = BatchController::new(&api, CheckpointStore::new("data/recovery"), "data/state");
//!
//! let report = controller
//!     .run(&Operation::move_items("PL_source", "PL_target").with_resume())
//!     .await?;
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod controller;
pub mod errors;
pub mod operation;
pub mod report;
pub mod working_set;

pub use batch::BatchOutcome;
pub use controller::{BatchController, EngineSettings};
pub use errors::{EngineError, EngineResult};
pub use operation::{DestinationSpec, MutationMode, Operation};
pub use report::{DestinationReport, DestinationStatus, OperationReport};
pub use working_set::WorkingSet;

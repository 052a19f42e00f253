//! Command implementations
//!
//! Each command takes a [`CommandContext`](crate::cli::CommandContext) plus an
//! options struct, so hosts can call them without going through clap.

pub mod operation;
pub mod state;
pub mod undo;

pub use operation::{run_operation, OperationOptions};
pub use state::{cleanup, clear_state, list_destinations, CleanupOptions, StateOptions};
pub use undo::{undo_operation, UndoOptions};

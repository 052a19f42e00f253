//! Adapter traits for CLI commands
//!
//! Commands talk to the host through [`CommandContext`]; [`ConsoleContext`]
//! is the terminal implementation.

pub mod console;
pub mod context;

pub use console::ConsoleContext;
pub use context::CommandContext;

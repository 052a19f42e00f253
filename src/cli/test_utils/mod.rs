//! Test helpers for CLI commands

pub mod mocks;

pub use mocks::MockCommandContext;

//! Command-line layer
//!
//! clap definitions for every operation plus the state-management commands,
//! command implementations that work through the [`CommandContext`] adapter,
//! and a runner that maps outcomes to exit codes.
//!
//! # Example
//!
//! ```rust,ignore
//! use clap::Parser;
//! use tubesort::cli::{run_cli, Cli};
//!
//! let cli = Cli::parse();
//! let api = MyPlaylistClient::connect()?;
//! std::process::exit(run_cli(&cli, &api, None).await);
//! ```

pub mod adapters;
pub mod args;
pub mod commands;
pub mod error;
pub mod playlist;
pub mod runner;
pub mod utils;

#[cfg(test)]
pub mod test_utils;

pub use adapters::{CommandContext, ConsoleContext};
pub use args::{Cli, Commands, RunFlags};
pub use error::{CliError, CliResult};
pub use playlist::parse_playlist_id;
pub use runner::{load_context, run_cli, CommandRunner, EXIT_FAILURE, EXIT_SUCCESS};

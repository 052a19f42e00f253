//! Command-line argument definitions

use crate::checkpoint::OperationKind;
use crate::cli::error::{CliError, CliResult};
use crate::cli::playlist::parse_playlist_id;
use crate::engine::{DestinationSpec, Operation};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Resumable batch operations over playlists
#[derive(Parser, Debug)]
#[command(name = "tubesort", version, about, long_about = None)]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Load environment overrides from this .env file
    #[arg(long, global = true)]
    pub env_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Flags shared by every batch operation
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct RunFlags {
    /// Simulate operations without making changes
    #[arg(long)]
    pub dry_run: bool,

    /// Resume previous operation
    #[arg(short, long)]
    pub resume: bool,

    /// Resume from specific destination playlist (implies --resume)
    #[arg(long, value_parser = parse_playlist_id)]
    pub resume_destination: Option<String>,

    /// Retry previously failed items
    #[arg(long)]
    pub retry_failed: bool,

    /// Limit number of items to process per destination
    #[arg(long)]
    pub limit: Option<usize>,

    /// Print every processed item
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Move items between playlists
    Move {
        #[arg(value_parser = parse_playlist_id)]
        source: String,
        #[arg(value_parser = parse_playlist_id)]
        target: String,
        #[command(flatten)]
        flags: RunFlags,
    },

    /// Copy items between playlists
    Copy {
        #[arg(value_parser = parse_playlist_id)]
        source: String,
        #[arg(value_parser = parse_playlist_id)]
        target: String,
        #[command(flatten)]
        flags: RunFlags,
    },

    /// Move items whose title contains a pattern
    Filter {
        #[arg(value_parser = parse_playlist_id)]
        source: String,
        #[arg(value_parser = parse_playlist_id)]
        target: String,
        /// Case-insensitive title pattern
        pattern: String,
        /// Keep matched items in the source
        #[arg(long)]
        copy: bool,
        #[command(flatten)]
        flags: RunFlags,
    },

    /// Distribute items across playlists by classifier predicate
    Classify {
        #[arg(value_parser = parse_playlist_id)]
        source: String,
        /// Destination and predicate as PLAYLIST=PREDICATE, repeatable
        #[arg(long = "into", value_name = "PLAYLIST=PREDICATE", required = true, value_parser = parse_destination)]
        destinations: Vec<DestinationSpec>,
        /// Keep classified items in the source
        #[arg(long)]
        copy: bool,
        #[command(flatten)]
        flags: RunFlags,
    },

    /// Gather several playlists into one
    Consolidate {
        #[arg(value_parser = parse_playlist_id)]
        target: String,
        #[arg(required = true, value_parser = parse_playlist_id)]
        sources: Vec<String>,
        /// Keep items in their source playlists
        #[arg(long)]
        copy: bool,
        #[command(flatten)]
        flags: RunFlags,
    },

    /// Remove repeated items from a playlist
    Deduplicate {
        #[arg(value_parser = parse_playlist_id)]
        playlist: String,
        #[command(flatten)]
        flags: RunFlags,
    },

    /// Undo the last operation of a kind
    Undo {
        #[arg(value_parser = parse_kind)]
        operation: OperationKind,
        #[arg(long)]
        dry_run: bool,
    },

    /// List destinations recorded in a checkpoint
    ListDestinations {
        #[arg(value_parser = parse_playlist_id)]
        playlist: String,
        #[arg(long, value_parser = parse_kind)]
        operation: OperationKind,
    },

    /// Delete the checkpoint files of a playlist and operation
    ClearState {
        #[arg(value_parser = parse_playlist_id)]
        playlist: String,
        #[arg(long, value_parser = parse_kind)]
        operation: OperationKind,
    },

    /// Remove superseded checkpoint files and leftover temp files
    Cleanup {
        #[arg(long)]
        dry_run: bool,
        #[arg(short, long)]
        verbose: bool,
    },
}

impl Commands {
    /// Batch operation described by the command, if it is one
    pub fn to_operation(&self) -> Option<(Operation, bool)> {
        let (op, flags) = match self {
            Commands::Move { source, target, flags } => (Operation::move_items(source, target), flags),
            Commands::Copy { source, target, flags } => (Operation::copy_items(source, target), flags),
            Commands::Filter {
                source,
                target,
                pattern,
                copy,
                flags,
            } => (Operation::filter(source, target, pattern).with_copy(*copy), flags),
            Commands::Classify {
                source,
                destinations,
                copy,
                flags,
            } => (
                Operation::classify(source, destinations.clone()).with_copy(*copy),
                flags,
            ),
            Commands::Consolidate {
                target,
                sources,
                copy,
                flags,
            } => {
                let sources: Vec<&str> = sources.iter().map(String::as_str).collect();
                (Operation::consolidate(&sources, target).with_copy(*copy), flags)
            }
            Commands::Deduplicate { playlist, flags } => (Operation::deduplicate(playlist), flags),
            _ => return None,
        };
        Some((flags.apply(op), flags.verbose))
    }
}

impl RunFlags {
    fn apply(&self, mut op: Operation) -> Operation {
        op.dry_run = self.dry_run;
        op.resume = self.resume || self.resume_destination.is_some();
        op.resume_destination = self.resume_destination.clone();
        op.retry_failed = self.retry_failed;
        op.limit = self.limit;
        op
    }
}

fn parse_kind(value: &str) -> CliResult<OperationKind> {
    value.parse().map_err(CliError::InvalidInput)
}

fn parse_destination(value: &str) -> CliResult<DestinationSpec> {
    let (playlist, predicate) = value.split_once('=').ok_or_else(|| {
        CliError::InvalidInput(format!("expected PLAYLIST=PREDICATE, got {}", value))
    })?;
    if predicate.trim().is_empty() {
        return Err(CliError::InvalidInput(format!(
            "missing predicate for {}",
            playlist
        )));
    }
    Ok(DestinationSpec::with_predicate(
        parse_playlist_id(playlist)?,
        predicate.trim(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("tubesort").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_move_with_url_and_flags() {
        let cli = parse(&[
            "move",
            "https://www.youtube.com/playlist?list=PLsrc",
            "PLdst",
            "--resume-destination",
            "PLdst",
            "--limit",
            "3",
        ]);
        let (op, verbose) = cli.command.to_operation().unwrap();
        assert_eq!(op.kind, OperationKind::Move);
        assert_eq!(op.sources, vec!["PLsrc".to_string()]);
        assert!(op.resume);
        assert_eq!(op.resume_destination.as_deref(), Some("PLdst"));
        assert_eq!(op.limit, Some(3));
        assert!(!verbose);
    }

    #[test]
    fn test_classify_destinations() {
        let cli = parse(&[
            "classify",
            "PLsrc",
            "--into",
            "PLmusic=music videos",
            "--into",
            "PLtalks=conference talks",
            "--copy",
        ]);
        let (op, _) = cli.command.to_operation().unwrap();
        assert_eq!(op.destinations.len(), 2);
        assert_eq!(op.destinations[1].predicate.as_deref(), Some("conference talks"));
        assert!(op.copy);

        assert!(Cli::try_parse_from(["tubesort", "classify", "PLsrc", "--into", "PLmusic"]).is_err());
    }

    #[test]
    fn test_consolidate_and_deduplicate() {
        let cli = parse(&["consolidate", "PLall", "PLa", "PLb", "--dry-run"]);
        let (op, _) = cli.command.to_operation().unwrap();
        assert_eq!(op.kind, OperationKind::Consolidate);
        assert_eq!(op.sources, vec!["PLa".to_string(), "PLb".to_string()]);
        assert!(op.dry_run);

        let cli = parse(&["deduplicate", "PLa", "-r"]);
        let (op, _) = cli.command.to_operation().unwrap();
        assert_eq!(op.sources, op.destinations.iter().map(|d| d.collection_id.clone()).collect::<Vec<_>>());
        assert!(op.resume);
    }

    #[test]
    fn test_state_commands() {
        let cli = parse(&["list-destinations", "PLsrc", "--operation", "filter"]);
        assert!(cli.command.to_operation().is_none());
        assert!(matches!(
            cli.command,
            Commands::ListDestinations { operation: OperationKind::Filter, .. }
        ));

        assert!(Cli::try_parse_from(["tubesort", "undo", "rename"]).is_err());
    }
}

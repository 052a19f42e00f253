//! Command dispatch and process exit codes
//!
//! The crate ships no remote API client; hosts parse a [`Cli`], supply their
//! [`CollectionApi`] (and optionally a [`Classifier`]) and call [`run_cli`].

use crate::api::{CachedCollectionApi, Classifier, CollectionApi, CollectionCache};
use crate::cli::adapters::{CommandContext, ConsoleContext};
use crate::cli::args::{Cli, Commands};
use crate::cli::commands::{
    cleanup, clear_state, list_destinations, run_operation, undo_operation, CleanupOptions,
    OperationOptions, StateOptions, UndoOptions,
};
use crate::cli::error::{CliError, CliResult};
use crate::config::{ConfigurationLoader, EnvironmentLoader};
use tracing::warn;

/// Full success
pub const EXIT_SUCCESS: i32 = 0;
/// Validation, not-found, partial failure or failed undo
pub const EXIT_FAILURE: i32 = 1;

/// Executes parsed commands against supplied collaborators
pub struct CommandRunner<'a, C: CommandContext + ?Sized, A: CollectionApi + ?Sized> {
    ctx: &'a C,
    api: &'a A,
    classifier: Option<&'a dyn Classifier>,
}

impl<'a, C: CommandContext + ?Sized, A: CollectionApi + ?Sized> CommandRunner<'a, C, A> {
    pub fn new(ctx: &'a C, api: &'a A) -> Self {
        Self {
            ctx,
            api,
            classifier: None,
        }
    }

    pub fn with_classifier(mut self, classifier: &'a dyn Classifier) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Run a command; `Ok(false)` means it ran but did not fully succeed.
    pub async fn execute(&self, command: &Commands) -> CliResult<bool> {
        if let Some((operation, verbose)) = command.to_operation() {
            let report = run_operation(
                self.ctx,
                self.api,
                self.classifier,
                OperationOptions { operation, verbose },
            )
            .await?;
            return Ok(report.is_clean());
        }

        match command {
            Commands::Undo { operation, dry_run } => {
                let report = undo_operation(
                    self.ctx,
                    self.api,
                    UndoOptions {
                        kind: *operation,
                        dry_run: *dry_run,
                    },
                )
                .await?;
                Ok(report.success)
            }
            Commands::ListDestinations {
                playlist,
                operation,
            } => {
                list_destinations(
                    self.ctx,
                    StateOptions {
                        playlist: playlist.clone(),
                        kind: *operation,
                    },
                )?;
                Ok(true)
            }
            Commands::ClearState {
                playlist,
                operation,
            } => {
                clear_state(
                    self.ctx,
                    StateOptions {
                        playlist: playlist.clone(),
                        kind: *operation,
                    },
                )?;
                Ok(true)
            }
            Commands::Cleanup { dry_run, verbose } => {
                let report = cleanup(
                    self.ctx,
                    CleanupOptions {
                        dry_run: *dry_run,
                        verbose: *verbose,
                    },
                )
                .await?;
                Ok(report.errors.is_empty())
            }
            _ => Err(CliError::InvalidInput(
                "command is not supported by this runner".to_string(),
            )),
        }
    }

    /// Run a command and map the outcome to a process exit code
    pub async fn run(&self, command: &Commands) -> i32 {
        match self.execute(command).await {
            Ok(true) => EXIT_SUCCESS,
            Ok(false) => EXIT_FAILURE,
            Err(e) => {
                self.ctx.log_error(&e.to_string());
                EXIT_FAILURE
            }
        }
    }
}

/// Build the terminal context: `.env` overrides, TOML config, tracing.
pub fn load_context(cli: &Cli) -> CliResult<ConsoleContext> {
    let env = EnvironmentLoader::new(cli.env_file.as_deref());
    let mut loader = ConfigurationLoader::new(cli.config.as_deref())
        .map_err(|e| CliError::ConfigError(format!("{:#}", e)))?;
    env.apply(&mut loader.config);

    let level = if cli.debug {
        "DEBUG".to_string()
    } else {
        loader.config.logging.log_level.clone()
    };
    crate::observability::init_tracing(&level);

    ConsoleContext::new(loader.config)
}

/// Parse-free entry point: load configuration, run one command, return the exit code.
///
/// Collection metadata goes through the on-disk cache when `cache.enabled` is set.
pub async fn run_cli<A>(cli: &Cli, api: &A, classifier: Option<&dyn Classifier>) -> i32
where
    A: CollectionApi + ?Sized,
{
    let ctx = match load_context(cli) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("{}", e);
            return EXIT_FAILURE;
        }
    };

    let cache_config = ctx.config().cache.clone();
    if !cache_config.enabled {
        return dispatch(&ctx, api, classifier, &cli.command).await;
    }

    let cache = CollectionCache::open(ctx.config().cache_file());
    let cached = CachedCollectionApi::new(api, cache, Some(cache_config.ttl_seconds));
    let code = dispatch(&ctx, &cached, classifier, &cli.command).await;
    if let Err(e) = cached.flush() {
        warn!(error = %e, "Failed to persist collection cache");
    }
    code
}

async fn dispatch<C, A>(
    ctx: &C,
    api: &A,
    classifier: Option<&dyn Classifier>,
    command: &Commands,
) -> i32
where
    C: CommandContext + ?Sized,
    A: CollectionApi + ?Sized,
{
    let mut runner = CommandRunner::new(ctx, api);
    if let Some(classifier) = classifier {
        runner = runner.with_classifier(classifier);
    }
    runner.run(command).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Item, KeywordClassifier, MemoryCollectionApi};
    use crate::cli::test_utils::MockCommandContext;
    use clap::Parser;

    fn command(args: &[&str]) -> Commands {
        Cli::try_parse_from(std::iter::once("tubesort").chain(args.iter().copied()))
            .unwrap()
            .command
    }

    fn api() -> MemoryCollectionApi {
        MemoryCollectionApi::new()
            .with_collection(
                "S1",
                "Source",
                vec![
                    Item::new("v1", "Live concert"),
                    Item::new("v2", "Cooking pasta"),
                ],
            )
            .with_collection("D1", "Music", vec![])
    }

    #[tokio::test]
    async fn test_exit_codes() {
        let ctx = MockCommandContext::new();
        let api = api();
        let runner = CommandRunner::new(&ctx, &api);

        assert_eq!(runner.run(&command(&["copy", "S1", "D1"])).await, EXIT_SUCCESS);
        assert_eq!(runner.run(&command(&["move", "S1", "D404"])).await, EXIT_FAILURE);
        assert_eq!(runner.run(&command(&["undo", "filter"])).await, EXIT_FAILURE);
        assert_eq!(
            runner
                .run(&command(&["list-destinations", "S1", "--operation", "copy"]))
                .await,
            EXIT_SUCCESS
        );
    }

    #[tokio::test]
    async fn test_classify_needs_classifier() {
        let ctx = MockCommandContext::new();
        let api = api();
        let classify = command(&["classify", "S1", "--into", "D1=concert", "--copy"]);

        let runner = CommandRunner::new(&ctx, &api);
        assert_eq!(runner.run(&classify).await, EXIT_FAILURE);

        let classifier = KeywordClassifier::new();
        let runner = CommandRunner::new(&ctx, &api).with_classifier(&classifier);
        assert_eq!(runner.run(&classify).await, EXIT_SUCCESS);
        assert_eq!(api.item_ids("D1"), vec!["v1"]);
    }

    #[tokio::test]
    async fn test_partial_failure_exit_code() {
        let ctx = MockCommandContext::new();
        let api = api();
        api.fail_add("D1", "v2");

        let runner = CommandRunner::new(&ctx, &api);
        assert_eq!(runner.run(&command(&["move", "S1", "D1"])).await, EXIT_FAILURE);

        api.clear_failures();
        assert_eq!(
            runner
                .run(&command(&["move", "S1", "D1", "--resume", "--retry-failed"]))
                .await,
            EXIT_SUCCESS
        );
        assert!(api.item_ids("S1").is_empty());
    }
}

//! Terminal implementation of [`CommandContext`]

use crate::cli::adapters::CommandContext;
use crate::cli::error::{CliError, CliResult};
use crate::config::Configuration;
use crate::observability::Logger;
use colored::*;

/// Colored terminal output plus the optional markdown journal
#[derive(Debug)]
pub struct ConsoleContext {
    config: Configuration,
    journal: Option<Logger>,
}

impl ConsoleContext {
    /// Opens the journal when `logging.log_file` is set.
    pub fn new(config: Configuration) -> CliResult<Self> {
        let journal = match config.log_file() {
            Some(path) => Some(
                Logger::new(Some(&path), Some(&config.logging.log_level))
                    .map_err(|e| CliError::ConfigError(format!("{:#}", e)))?,
            ),
            None => None,
        };

        Ok(Self { config, journal })
    }
}

impl CommandContext for ConsoleContext {
    fn config(&self) -> &Configuration {
        &self.config
    }

    fn journal(&self) -> Option<&Logger> {
        self.journal.as_ref()
    }

    fn log_info(&self, message: &str) {
        println!("{}", message);
    }

    fn log_warn(&self, message: &str) {
        eprintln!("{} {}", "⚠".yellow(), message.yellow());
    }

    fn log_error(&self, message: &str) {
        eprintln!("{} {}", "❌ Error:".red().bold(), message.red());
    }

    fn log_success(&self, message: &str) {
        println!("{} {}", "✓".green(), message.green());
    }

    fn print(&self, output: &str) {
        println!("{}", output);
    }
}

//! CommandContext adapter trait
//!
//! Gives commands access to configuration, the operation journal and user
//! facing output without coupling them to a terminal.

use crate::config::Configuration;
use crate::observability::Logger;
use std::path::PathBuf;
use tracing::warn;

/// Provides context for CLI command execution
///
/// # Example
///
/// ```rust,ignore
/// use tubesort::cli::CommandContext;
/// use tubesort::config::Configuration;
///
/// struct QuietContext {
///     config: Configuration,
/// }
///
/// impl CommandContext for QuietContext {
///     fn config(&self) -> &Configuration {
///         &self.config
///     }
///
///     fn log_info(&self, _message: &str) {}
///
///     // ... implement remaining methods
/// }
/// ```
pub trait CommandContext {
    /// Get the configuration object
    fn config(&self) -> &Configuration;

    /// Markdown journal, when one is configured
    fn journal(&self) -> Option<&Logger> {
        None
    }

    /// Report a failed journal write; the command itself carries on
    fn journal_failed(&self, error: &anyhow::Error) {
        warn!(error = %error, "Failed to write operation journal");
        self.log_warn(&format!("Could not write journal: {}", error));
    }

    /// Directory holding checkpoint files
    fn recovery_dir(&self) -> PathBuf {
        self.config().recovery_dir()
    }

    /// Directory holding undo records
    fn state_dir(&self) -> PathBuf {
        self.config().state_dir()
    }

    /// Log an informational message
    fn log_info(&self, message: &str);

    /// Log a warning message
    fn log_warn(&self, message: &str);

    /// Log an error message
    fn log_error(&self, message: &str) {
        self.log_warn(message);
    }

    /// Log a success message
    fn log_success(&self, message: &str);

    /// Print preformatted output such as a table
    fn print(&self, output: &str) {
        self.log_info(output);
    }

    /// Format bytes for human-readable display
    fn format_bytes(&self, bytes: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = bytes as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", bytes, UNITS[0])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }
}

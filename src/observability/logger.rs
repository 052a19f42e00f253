//! Markdown journal of batch operations.

use crate::checkpoint::{CleanupReport, OperationKind};
use crate::engine::{DestinationReport, DestinationStatus, Operation, OperationReport};
use crate::undo::UndoReport;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Journal of operations, undos and cleanups.
///
/// Creates a markdown file that reads as a human audit trail of what each
/// run touched. Console output goes through `tracing`; this file is the
/// durable record.
#[derive(Debug)]
pub struct Logger {
    log_file: PathBuf,
    log_level: String,
}

impl Logger {
    /// Initialize logger.
    ///
    /// # Arguments
    /// * `log_file` - Path to log file. If None, creates a timestamped file in the temp directory.
    /// * `log_level` - Logging level (defaults to "INFO").
    pub fn new(log_file: Option<&Path>, log_level: Option<&str>) -> Result<Self> {
        let log_file = match log_file {
            Some(p) => p.to_path_buf(),
            None => {
                let dir = std::env::temp_dir().join("tubesort-logs");
                dir.join(format!(
                    "tubesort_{}_{}.md",
                    Utc::now().timestamp_millis(),
                    std::process::id()
                ))
            }
        };

        let log_level = log_level.unwrap_or("INFO").to_uppercase();

        if let Some(parent) = log_file.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory: {}", parent.display()))?;
        }

        let logger = Self {
            log_file,
            log_level,
        };

        if !logger.log_file.exists() {
            logger.initialize_log_file()?;
        }

        Ok(logger)
    }

    fn initialize_log_file(&self) -> Result<()> {
        let mut file = File::create(&self.log_file)
            .with_context(|| format!("Failed to create log file: {}", self.log_file.display()))?;

        let now: DateTime<Utc> = Utc::now();

        writeln!(file, "# Playlist Operation Log\n")?;
        writeln!(file, "Log started: {}\n", now.to_rfc3339())?;
        writeln!(file, "---\n")?;

        Ok(())
    }

    fn append_to_log(&self, content: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file)
            .with_context(|| format!("Failed to open log file: {}", self.log_file.display()))?;

        write!(file, "{}", content).with_context(|| "Failed to write to log file")?;

        Ok(())
    }

    fn is_debug(&self) -> bool {
        matches!(self.log_level.as_str(), "DEBUG" | "TRACE")
    }

    /// Log the start of an operation with its parameters.
    pub fn log_operation_start(&self, op: &Operation) -> Result<()> {
        let now: DateTime<Utc> = Utc::now();
        let destinations: Vec<String> = op
            .destinations
            .iter()
            .map(|d| match &d.predicate {
                Some(p) => format!("{} ({})", d.collection_id, p),
                None => d.collection_id.clone(),
            })
            .collect();

        let mut content = format!(
            "## {} Started - {}\n\n**Sources:** {}\n**Destinations:** {}\n",
            capitalize(op.kind.as_str()),
            now.to_rfc3339(),
            op.sources.join(", "),
            destinations.join(", ")
        );
        if let Some(predicate) = &op.predicate {
            content.push_str(&format!("**Predicate:** {}\n", predicate));
        }

        let mut flags = Vec::new();
        if op.copy {
            flags.push("copy".to_string());
        }
        if op.dry_run {
            flags.push("dry-run".to_string());
        }
        if op.resume {
            flags.push("resume".to_string());
        }
        if let Some(target) = &op.resume_destination {
            flags.push(format!("resume-destination={}", target));
        }
        if op.retry_failed {
            flags.push("retry-failed".to_string());
        }
        if let Some(limit) = op.limit {
            flags.push(format!("limit={}", limit));
        }
        if !flags.is_empty() {
            content.push_str(&format!("**Flags:** {}\n", flags.join(", ")));
        }
        content.push('\n');

        self.append_to_log(&content)
    }

    /// Log the outcome of one destination.
    pub fn log_destination_result(&self, report: &DestinationReport) -> Result<()> {
        let status = match report.status {
            DestinationStatus::Succeeded => "succeeded",
            DestinationStatus::PartiallyFailed => "partially failed",
            DestinationStatus::AlreadyComplete => "already complete",
            DestinationStatus::Skipped => "skipped",
            DestinationStatus::DryRun => "dry run",
            DestinationStatus::Aborted => "aborted",
        };

        let mut content = format!(
            "### {} -> {}\n\n**Status:** {}\n**Working set:** {}\n**Succeeded:** {}\n**Failed:** {}\n",
            report.source_id,
            report.destination_id,
            status,
            report.working_set.len(),
            report.succeeded.len(),
            report.failed.len()
        );

        if let Some(error) = &report.error {
            content.push_str(&format!("**Error:** {}\n", error));
        }
        if !report.failed.is_empty() {
            content.push_str(&format!("**Failed items:** {}\n", report.failed.join(", ")));
        }
        if !report.pending_source_removal.is_empty() {
            content.push_str(&format!(
                "**Pending source removal:** {}\n",
                report.pending_source_removal.join(", ")
            ));
        }
        if report.truncated {
            content.push_str("**Truncated by limit:** yes\n");
        }
        if self.is_debug() && !report.succeeded.is_empty() {
            content.push_str(&format!(
                "**Processed items:**\n```\n{}\n```\n",
                report.succeeded.join("\n")
            ));
        }
        content.push('\n');

        self.append_to_log(&content)
    }

    /// Log the aggregate summary of an operation.
    pub fn log_operation_summary(&self, report: &OperationReport) -> Result<()> {
        let now: DateTime<Utc> = Utc::now();
        let content = format!(
            "### {} Finished - {}\n\n**Summary:** {}\n**Undo recorded:** {}\n\n---\n\n",
            capitalize(report.kind.as_str()),
            now.to_rfc3339(),
            report.summary(),
            if report.undo_recorded { "yes" } else { "no" }
        );

        self.append_to_log(&content)
    }

    /// Log an undo run.
    pub fn log_undo(&self, kind: OperationKind, report: &UndoReport) -> Result<()> {
        let now: DateTime<Utc> = Utc::now();
        let mut content = format!(
            "## Undo {} - {}\n\n**Planned calls:** {}\n**Performed:** {}\n**Dry run:** {}\n**Success:** {}\n",
            kind,
            now.to_rfc3339(),
            report.planned.len(),
            report.performed,
            report.dry_run,
            report.success
        );
        if let Some(error) = &report.error {
            content.push_str(&format!("**Error:** {}\n", error));
        }
        content.push_str("\n---\n\n");

        self.append_to_log(&content)
    }

    /// Log a recovery directory cleanup.
    pub fn log_cleanup(&self, report: &CleanupReport, dry_run: bool) -> Result<()> {
        let now: DateTime<Utc> = Utc::now();
        let mut content = format!(
            "## Cleanup - {}\n\n**Dry run:** {}\n**Deleted files:** {}\n**Freed bytes:** {}\n**Kept keys:** {}\n",
            now.to_rfc3339(),
            dry_run,
            report.deleted_files.len(),
            report.freed_bytes,
            report.kept.len()
        );
        for error in &report.errors {
            content.push_str(&format!("- {}\n", error));
        }
        content.push('\n');

        self.append_to_log(&content)
    }

    /// Log an error with context.
    pub fn log_error(&self, context: &str, error: &str) -> Result<()> {
        let now: DateTime<Utc> = Utc::now();
        let content = format!(
            "### Error - {}\n\n**Context:** {}\n**Error:** {}\n\n",
            now.to_rfc3339(),
            context,
            error
        );

        self.append_to_log(&content)
    }

    /// Get the log file path.
    pub fn log_file(&self) -> &Path {
        &self.log_file
    }

    /// Get the log level.
    pub fn log_level(&self) -> &str {
        &self.log_level
    }
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

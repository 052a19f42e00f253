//! Mock implementations of adapter traits for testing

use crate::cli::adapters::CommandContext;
use crate::config::{Configuration, StorageConfig};
use crate::observability::Logger;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Captures output as "LEVEL: message" lines; storage lives in a temp dir
#[derive(Clone)]
pub struct MockCommandContext {
    pub config: Configuration,
    pub logs: Arc<Mutex<Vec<String>>>,
    journal: Option<Arc<Logger>>,
    _data_dir: Arc<TempDir>,
}

impl MockCommandContext {
    pub fn new() -> Self {
        let data_dir = TempDir::new().unwrap();
        let config = Configuration {
            storage: StorageConfig {
                data_dir: Some(data_dir.path().to_string_lossy().to_string()),
                ..Default::default()
            },
            ..Default::default()
        };

        Self {
            config,
            logs: Arc::new(Mutex::new(Vec::new())),
            journal: None,
            _data_dir: Arc::new(data_dir),
        }
    }

    pub fn with_journal(mut self, journal: Logger) -> Self {
        self.journal = Some(Arc::new(journal));
        self
    }

    pub fn get_logs(&self) -> Vec<String> {
        self.logs.lock().unwrap().clone()
    }

    fn push(&self, level: &str, message: &str) {
        self.logs
            .lock()
            .unwrap()
            .push(format!("{}: {}", level, message));
    }
}

impl Default for MockCommandContext {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandContext for MockCommandContext {
    fn config(&self) -> &Configuration {
        &self.config
    }

    fn journal(&self) -> Option<&Logger> {
        self.journal.as_deref()
    }

    fn log_info(&self, message: &str) {
        self.push("INFO", message);
    }

    fn log_warn(&self, message: &str) {
        self.push("WARN", message);
    }

    fn log_error(&self, message: &str) {
        self.push("ERROR", message);
    }

    fn log_success(&self, message: &str) {
        self.push("SUCCESS", message);
    }
}

//! Environment variable loading and management.
//!
//! Storage locations can be overridden per host without touching the TOML
//! file: `DATA_DIR`, `RECOVERY_DIR`, `STATE_DIR` and `CACHE_DIR`.

use super::Configuration;
use std::env;
use std::path::Path;

/// Loads environment variables from .env file and system environment.
#[derive(Debug, Clone)]
pub struct EnvironmentLoader {
    env_file: Option<String>,
}

impl EnvironmentLoader {
    /// Initialize the environment loader.
    ///
    /// # Arguments
    /// * `env_file` - Path to .env file. Nothing is loaded when None.
    pub fn new(env_file: Option<&Path>) -> Self {
        // Only an explicit path is loaded, so stray .env files never leak into tests
        if let Some(path) = env_file {
            if path.exists() {
                if let Err(e) = dotenv::from_path(path) {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to load .env file");
                }
            }
        }

        Self {
            env_file: env_file.map(|p| p.to_string_lossy().to_string()),
        }
    }

    pub fn env_file(&self) -> Option<&str> {
        self.env_file.as_deref()
    }

    pub fn data_dir(&self) -> Option<String> {
        non_empty("DATA_DIR")
    }

    pub fn recovery_dir(&self) -> Option<String> {
        non_empty("RECOVERY_DIR")
    }

    pub fn state_dir(&self) -> Option<String> {
        non_empty("STATE_DIR")
    }

    pub fn cache_dir(&self) -> Option<String> {
        non_empty("CACHE_DIR")
    }

    /// Overlay any set variables onto `config`.
    pub fn apply(&self, config: &mut Configuration) {
        let storage = &mut config.storage;
        if let Some(dir) = self.data_dir() {
            storage.data_dir = Some(dir);
        }
        if let Some(dir) = self.recovery_dir() {
            storage.recovery_dir = Some(dir);
        }
        if let Some(dir) = self.state_dir() {
            storage.state_dir = Some(dir);
        }
        if let Some(dir) = self.cache_dir() {
            storage.cache_dir = Some(dir);
        }
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

impl Default for EnvironmentLoader {
    fn default() -> Self {
        Self::new(None)
    }
}

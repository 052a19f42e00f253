//! TOML configuration parsing and management.

use crate::engine::EngineSettings;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_CONFIG_PATH: &str = "config/tubesort.toml";
const CACHE_FILE_NAME: &str = "playlist_cache.json";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where checkpoints, undo records and the metadata cache live.
///
/// Unset directories derive from `data_dir`; `~` is expanded everywhere.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: Option<String>,
    pub recovery_dir: Option<String>,
    pub state_dir: Option<String>,
    pub cache_dir: Option<String>,
}

/// Execution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_classify_batch_size")]
    pub classify_batch_size: usize,
}

fn default_batch_size() -> usize {
    50
}

fn default_classify_batch_size() -> usize {
    10
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            classify_batch_size: default_classify_batch_size(),
        }
    }
}

/// Collection metadata cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    #[serde(default = "default_cache_ttl")]
    pub ttl_seconds: u64,
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_ttl() -> u64 {
    3600
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            ttl_seconds: default_cache_ttl(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Markdown journal; no journal is written when unset
    pub log_file: Option<String>,
}

fn default_log_level() -> String {
    "INFO".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_file: None,
        }
    }
}

impl Configuration {
    /// Root data directory.
    ///
    /// Falls back to the platform local data directory, then to `./data`.
    pub fn data_dir(&self) -> PathBuf {
        match &self.storage.data_dir {
            Some(dir) => expand_path(dir),
            None => dirs::data_local_dir()
                .map(|d| d.join("tubesort"))
                .unwrap_or_else(|| PathBuf::from("data")),
        }
    }

    /// Directory holding checkpoint files
    pub fn recovery_dir(&self) -> PathBuf {
        self.storage
            .recovery_dir
            .as_deref()
            .map(expand_path)
            .unwrap_or_else(|| self.data_dir().join("recovery"))
    }

    /// Directory holding undo records
    pub fn state_dir(&self) -> PathBuf {
        self.storage
            .state_dir
            .as_deref()
            .map(expand_path)
            .unwrap_or_else(|| self.data_dir().join("state"))
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.storage
            .cache_dir
            .as_deref()
            .map(expand_path)
            .unwrap_or_else(|| self.data_dir().join("cache"))
    }

    pub fn cache_file(&self) -> PathBuf {
        self.cache_dir().join(CACHE_FILE_NAME)
    }

    pub fn log_file(&self) -> Option<PathBuf> {
        self.logging.log_file.as_deref().map(expand_path)
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            batch_size: self.execution.batch_size.max(1),
            classify_batch_size: self.execution.classify_batch_size.max(1),
        }
    }
}

fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).into_owned())
}

/// Configuration loader and manager
#[derive(Debug, Clone)]
pub struct ConfigurationLoader {
    pub config_path: PathBuf,
    pub config: Configuration,
}

impl ConfigurationLoader {
    /// Initialize configuration loader.
    ///
    /// # Arguments
    /// * `config_path` - Path to TOML config file. If None, `config/tubesort.toml`
    ///   is used when present, otherwise the defaults.
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let config_path = config_path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

        let config = if config_path.exists() {
            Self::load_config(&config_path)?
        } else {
            Self::get_default_config()
        };

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Create a configuration loader from a pre-parsed Configuration.
    pub fn from_config(config: Configuration) -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            config,
        }
    }

    /// Load configuration from TOML file.
    fn load_config(path: &Path) -> Result<Configuration> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config: {}", path.display()))
    }

    /// Get default configuration.
    fn get_default_config() -> Configuration {
        Configuration::default()
    }

    /// Get configuration value by dot-notation key.
    pub fn get_string(&self, key: &str) -> Option<String> {
        let storage = &self.config.storage;
        match key {
            "storage.data_dir" => storage.data_dir.clone(),
            "storage.recovery_dir" => storage.recovery_dir.clone(),
            "storage.state_dir" => storage.state_dir.clone(),
            "storage.cache_dir" => storage.cache_dir.clone(),
            "logging.log_level" => Some(self.config.logging.log_level.clone()),
            "logging.log_file" => self.config.logging.log_file.clone(),
            _ => None,
        }
    }

    /// Get numeric configuration value.
    pub fn get_u64(&self, key: &str) -> Option<u64> {
        match key {
            "execution.batch_size" => Some(self.config.execution.batch_size as u64),
            "execution.classify_batch_size" => {
                Some(self.config.execution.classify_batch_size as u64)
            }
            "cache.ttl_seconds" => Some(self.config.cache.ttl_seconds),
            _ => None,
        }
    }

    /// Get boolean configuration value.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match key {
            "cache.enabled" => Some(self.config.cache.enabled),
            _ => None,
        }
    }
}

//! Configuration management.
//!
//! TOML file loading plus environment overrides via `.env` files.
//!
//! # Example
//!
//! ```no_run
//! use tubesort::config::{ConfigurationLoader, EnvironmentLoader};
//! use std::path::Path;
//!
//! let env = EnvironmentLoader::new(None);
//! let mut loader = ConfigurationLoader::new(Some(Path::new("config/tubesort.toml"))).unwrap();
//! env.apply(&mut loader.config);
//!
//! println!("Checkpoints in {}", loader.config.recovery_dir().display());
//! println!("Batch size: {}", loader.config.execution.batch_size);
//! ```

pub mod config;
pub mod environment;

pub use self::config::{
    CacheConfig, Configuration, ConfigurationLoader, ExecutionConfig, LoggingConfig,
    StorageConfig,
};
pub use self::environment::EnvironmentLoader;

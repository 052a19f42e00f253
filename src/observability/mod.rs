//! Observability for batch operations.
//!
//! Two outputs: a markdown [`Logger`] journal that keeps a durable audit trail
//! of every run, and `tracing` events for the console (see [`init_tracing`]).
//!
//! # Example
//!
//! ```no_run
//! use tubesort::engine::Operation;
//! use tubesort::observability::Logger;
//!
//! let journal = Logger::new(None, Some("DEBUG")).unwrap();
//! journal
//!     .log_operation_start(&Operation::move_items("PL_source", "PL_target"))
//!     .unwrap();
//! ```

pub mod logger;

pub use logger::Logger;

/// Install a console subscriber.
///
/// `TUBESORT_LOG` takes precedence over `level`, which accepts the usual
/// level names in any case. Returns silently if a subscriber is already set.
#[cfg(feature = "cli")]
pub fn init_tracing(level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_env("TUBESORT_LOG")
        .unwrap_or_else(|_| EnvFilter::new(format!("tubesort={}", level.to_lowercase())));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .try_init();
}

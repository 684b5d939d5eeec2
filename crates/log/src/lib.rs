//! # Passkeys Log
//!
//! Structured logging setup shared by the passkeys binaries.
//!
//! ## Quick Start
//!
//! ```no_run
//! fn main() -> passkeys_log::LogResult<()> {
//!     // Environment first, then debug/release presets
//!     let _guard = passkeys_log::auto_init()?;
//!
//!     tracing::info!(port = 8080, "server starting");
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod builder;
mod config;

pub use builder::{LoggerBuilder, LoggerGuard};
pub use config::{Config, DisplayConfig, Fields, Format};

/// Result type for logger operations
pub type LogResult<T> = Result<T, LogError>;

/// Error type for logger operations
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// The level directive could not be parsed
    #[error("invalid filter '{filter}': {reason}")]
    InvalidFilter {
        /// The offending directive
        filter: String,
        /// Parser message
        reason: String,
    },

    /// Unrecognised output format name
    #[error("unknown log format: {0}")]
    UnknownFormat(String),

    /// The global subscriber could not be installed
    #[error("failed to install logger: {0}")]
    Init(String),
}

// ============================================================================
// Initialization Functions
// ============================================================================

/// Auto-detect and initialize the best logging configuration
///
/// `PASSKEYS_LOG` or `RUST_LOG` selects [`Config::from_env`]; otherwise debug
/// builds get [`Config::development`] and release builds [`Config::production`].
/// Returns a no-op guard if a global subscriber is already installed.
pub fn auto_init() -> LogResult<LoggerGuard> {
    if tracing::dispatcher::has_been_set() {
        return Ok(LoggerGuard::noop());
    }

    if std::env::var("PASSKEYS_LOG").is_ok() || std::env::var("RUST_LOG").is_ok() {
        init_with(Config::from_env())
    } else if cfg!(debug_assertions) {
        init_with(Config::development())
    } else {
        init_with(Config::production())
    }
}

/// Initialize with default configuration
pub fn init() -> LogResult<LoggerGuard> {
    init_with(Config::default())
}

/// Initialize with custom configuration
pub fn init_with(config: Config) -> LogResult<LoggerGuard> {
    LoggerBuilder::from_config(config).build()
}

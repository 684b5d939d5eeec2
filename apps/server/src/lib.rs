//! Passkeys Server - HTTP transport for the passkey lifecycle service
//!
//! Wires [`passkeys_credential::PasskeyManager`] to an axum router, loads
//! layered configuration and runs the expired-passkey sweeper.

pub mod api;
pub mod cli;
pub mod config;
pub mod server;

pub use cli::Cli;
pub use config::{AppConfig, ConfigError, DatabaseBackend};

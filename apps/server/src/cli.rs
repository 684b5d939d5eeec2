//! Command-line flags.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use figment::Figment;
use figment::providers::Serialized;

use crate::config::{AppConfig, DatabaseBackend};

/// Namespaced passkey issuance and verification over HTTP
#[derive(Debug, Parser)]
#[command(name = "passkeys-server", version, about)]
pub struct Cli {
    /// Configuration file [default: ./passkeys.toml when present]
    #[arg(short, long, env = "PASSKEYS_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Address to bind, overriding `server.listen`
    #[arg(short, long, value_name = "ADDR")]
    pub listen: Option<SocketAddr>,

    /// Keep passkeys in memory instead of PostgreSQL
    #[arg(long)]
    pub memory: bool,
}

impl Cli {
    /// Configuration sources with the flags merged last.
    pub fn figment(&self) -> Figment {
        let mut figment = AppConfig::figment(self.config.as_deref());
        if let Some(listen) = self.listen {
            figment = figment.merge(Serialized::default("server.listen", listen));
        }
        if self.memory {
            figment = figment.merge(Serialized::default("database.backend", DatabaseBackend::Memory));
        }
        figment
    }

    /// Load and validate the effective configuration.
    pub fn load_config(&self) -> Result<AppConfig, crate::config::ConfigError> {
        AppConfig::from_figment(&self.figment())
    }
}

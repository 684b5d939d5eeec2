//! Configuration for passkeys-server.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use passkeys_credential::HashParams;
use passkeys_credential::utils::validate_sql_identifier;
use serde::{Deserialize, Serialize};

/// Configuration file read from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "passkeys.toml";

/// Prefix for environment overrides; nested keys are split on `__`.
pub const ENV_PREFIX: &str = "PASSKEYS_";

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A provider failed or the merged document did not deserialize.
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    /// A value deserialized but is not usable.
    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue {
        /// Dotted key of the offending value
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },
}

/// Top-level configuration for the passkeys server.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Store configuration.
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Argon2id cost parameters for new encodings.
    #[serde(default)]
    pub hashing: HashParams,

    /// Logging configuration.
    #[serde(default)]
    pub logging: passkeys_log::Config,
}

impl AppConfig {
    /// Layered configuration sources.
    ///
    /// Later sources override earlier ones:
    /// 1. Default values, with logging seeded from `PASSKEYS_LOG`/`RUST_LOG`
    /// 2. `path`, or `passkeys.toml` in the current directory (if present)
    /// 3. Environment variables with the `PASSKEYS_` prefix
    pub fn figment(path: Option<&Path>) -> Figment {
        let defaults = Self {
            logging: passkeys_log::Config::from_env(),
            ..Self::default()
        };
        let file = path.map_or_else(|| Toml::file(DEFAULT_CONFIG_FILE), Toml::file);

        Figment::from(Serialized::defaults(defaults))
            .merge(file)
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Extract and validate configuration from `figment`.
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the default sources.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::from_figment(&Self::figment(path))
    }

    /// Check values that deserialize but cannot be used.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.backend == DatabaseBackend::Postgres {
            if self.database.url.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "database.url",
                    reason: "required when database.backend is \"postgres\"".to_owned(),
                });
            }
            if self.database.max_connections == 0 {
                return Err(ConfigError::InvalidValue {
                    field: "database.max_connections",
                    reason: "must be at least 1".to_owned(),
                });
            }
            for (field, value) in [
                ("database.schema", &self.database.schema),
                ("database.table_name", &self.database.table_name),
            ] {
                validate_sql_identifier(field, value).map_err(|e| ConfigError::InvalidValue {
                    field,
                    reason: e.message,
                })?;
            }
        }

        self.hashing
            .validate()
            .map_err(|e| ConfigError::InvalidValue {
                field: "hashing",
                reason: e.to_string(),
            })?;

        if self.logging.level.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "logging.level",
                reason: "must not be empty (try \"info\")".to_owned(),
            });
        }

        Ok(())
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Socket address to bind.
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,

    /// Seconds between expired-passkey sweeps; `0` disables the sweeper.
    #[serde(default = "default_purge_interval_secs")]
    pub purge_interval_secs: u64,
}

fn default_listen() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 8080)
}

const fn default_purge_interval_secs() -> u64 {
    300
}

impl ServerConfig {
    /// Sweep interval, `None` when disabled.
    pub fn purge_interval(&self) -> Option<Duration> {
        (self.purge_interval_secs > 0).then(|| Duration::from_secs(self.purge_interval_secs))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            purge_interval_secs: default_purge_interval_secs(),
        }
    }
}

/// Which store backs the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    /// PostgreSQL via sqlx.
    #[default]
    Postgres,
    /// Process-local map; contents are lost on restart.
    Memory,
}

/// Store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Store backend.
    #[serde(default)]
    pub backend: DatabaseBackend,

    /// PostgreSQL connection URL.
    #[serde(default = "default_database_url")]
    pub url: String,

    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Connection acquire timeout in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Schema holding the passkeys table.
    #[serde(default = "default_schema")]
    pub schema: String,

    /// Table name.
    #[serde(default = "default_table_name")]
    pub table_name: String,
}

fn default_database_url() -> String {
    "postgres://localhost/passkeys".to_owned()
}

const fn default_max_connections() -> u32 {
    10
}

const fn default_connect_timeout_secs() -> u64 {
    5
}

fn default_schema() -> String {
    "public".to_owned()
}

fn default_table_name() -> String {
    "passkeys".to_owned()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: DatabaseBackend::default(),
            url: default_database_url(),
            max_connections: default_max_connections(),
            connect_timeout_secs: default_connect_timeout_secs(),
            schema: default_schema(),
            table_name: default_table_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn defaults_without_sources() {
        Jail::expect_with(|_jail| {
            let config = AppConfig::load(None).unwrap();
            assert_eq!(config.server, ServerConfig::default());
            assert_eq!(config.database, DatabaseConfig::default());
            assert_eq!(config.hashing, HashParams::default());
            Ok(())
        });
    }

    #[test]
    fn toml_file_in_working_directory() {
        Jail::expect_with(|jail| {
            jail.create_file(
                DEFAULT_CONFIG_FILE,
                r#"
                [server]
                listen = "127.0.0.1:9000"
                purge_interval_secs = 0

                [database]
                backend = "memory"

                [hashing]
                iterations = 2
                memory_kib = 19456

                [logging]
                level = "debug"
                format = "json"
                "#,
            )?;

            let config = AppConfig::load(None).unwrap();
            assert_eq!(config.server.listen, "127.0.0.1:9000".parse().unwrap());
            assert_eq!(config.server.purge_interval(), None);
            assert_eq!(config.database.backend, DatabaseBackend::Memory);
            assert_eq!(config.hashing.iterations, 2);
            assert_eq!(config.hashing.memory_kib, 19456);
            assert_eq!(config.hashing.salt_length, HashParams::default().salt_length);
            assert_eq!(config.logging.level, "debug");
            assert_eq!(config.logging.format, passkeys_log::Format::Json);
            Ok(())
        });
    }

    #[test]
    fn env_overrides_file() {
        Jail::expect_with(|jail| {
            jail.create_file(DEFAULT_CONFIG_FILE, "[database]\nmax_connections = 4\n")?;
            jail.set_env("PASSKEYS_DATABASE__MAX_CONNECTIONS", "20");
            jail.set_env("PASSKEYS_DATABASE__URL", "postgres://db/passkeys");
            jail.set_env("PASSKEYS_SERVER__LISTEN", "0.0.0.0:7000");

            let config = AppConfig::load(None).unwrap();
            assert_eq!(config.database.max_connections, 20);
            assert_eq!(config.database.url, "postgres://db/passkeys");
            assert_eq!(config.server.listen.port(), 7000);
            Ok(())
        });
    }

    #[test]
    fn explicit_path_replaces_default_file() {
        Jail::expect_with(|jail| {
            jail.create_file(DEFAULT_CONFIG_FILE, "[database]\nbackend = \"memory\"\n")?;

            let mut file = tempfile::NamedTempFile::new().unwrap();
            writeln!(file, "[database]\nmax_connections = 3").unwrap();

            let config = AppConfig::load(Some(file.path())).unwrap();
            assert_eq!(config.database.backend, DatabaseBackend::Postgres);
            assert_eq!(config.database.max_connections, 3);
            Ok(())
        });
    }

    #[test]
    fn invalid_hashing_is_reported() {
        Jail::expect_with(|jail| {
            jail.create_file(DEFAULT_CONFIG_FILE, "[hashing]\niterations = 0\n")?;

            let err = AppConfig::load(None).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidValue { field: "hashing", .. }));
            Ok(())
        });
    }

    #[test]
    fn postgres_requires_url() {
        let mut config = AppConfig::default();
        config.database.url = "  ".to_owned();
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid value for `database.url`: required when database.backend is \"postgres\""
        );

        config.database.backend = DatabaseBackend::Memory;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn table_identifiers_must_be_plain() {
        Jail::expect_with(|jail| {
            jail.set_env("PASSKEYS_DATABASE__TABLE_NAME", "passkeys; DROP TABLE users");

            let err = AppConfig::load(None).unwrap_err();
            assert!(matches!(
                err,
                ConfigError::InvalidValue { field: "database.table_name", .. }
            ));
            Ok(())
        });

        let mut config = AppConfig::default();
        config.database.schema = "auth.keys".to_owned();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "database.schema", .. })
        ));

        config.database.schema = "auth".to_owned();
        config.database.table_name = "issued_passkeys".to_owned();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unknown_backend_fails_to_load() {
        Jail::expect_with(|jail| {
            jail.set_env("PASSKEYS_DATABASE__BACKEND", "redis");
            assert!(matches!(AppConfig::load(None), Err(ConfigError::Load(_))));
            Ok(())
        });
    }
}

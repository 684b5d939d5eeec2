//! Configuration presets for common scenarios

use super::{Config, DisplayConfig, Fields, Format};

impl Config {
    /// Create configuration from environment variables
    ///
    /// Reads `PASSKEYS_LOG` (falling back to `RUST_LOG`), `PASSKEYS_LOG_FORMAT`,
    /// the `PASSKEYS_LOG_TIME`/`_SOURCE`/`_COLORS` toggles and the global
    /// `PASSKEYS_SERVICE`/`_ENV`/`_VERSION`/`_INSTANCE` fields.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`], reading variables through `lookup`
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(level) = lookup("PASSKEYS_LOG").or_else(|| lookup("RUST_LOG")) {
            config.level = level;
        }

        // Unknown formats keep the default rather than failing startup
        if let Some(format) = lookup("PASSKEYS_LOG_FORMAT") {
            config.format = format.parse().unwrap_or(Format::Compact);
        }

        config.display.apply_env(&lookup);
        config.fields = Fields::from_lookup(&lookup);

        config
    }

    /// Development configuration (pretty, debug level)
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: "debug".to_string(),
            format: Format::Pretty,
            display: DisplayConfig {
                colors: true,
                source: true,
                ..DisplayConfig::default()
            },
            ..Self::default()
        }
    }

    /// Production configuration (JSON, info level)
    #[must_use]
    pub fn production() -> Self {
        Self {
            level: "info".to_string(),
            format: Format::Json,
            display: DisplayConfig {
                colors: false,
                source: false,
                flatten: true,
                ..DisplayConfig::default()
            },
            ..Self::default()
        }
    }

    /// Test configuration (compact, no colors or timestamps)
    #[must_use]
    pub fn test() -> Self {
        Self {
            level: "trace".to_string(),
            format: Format::Compact,
            display: DisplayConfig {
                colors: false,
                time: false,
                ..DisplayConfig::default()
            },
            ..Self::default()
        }
    }
}

impl DisplayConfig {
    fn apply_env(&mut self, lookup: &impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("PASSKEYS_LOG_TIME") {
            self.time = flag(&v);
        }
        if let Some(v) = lookup("PASSKEYS_LOG_SOURCE") {
            self.source = flag(&v);
        }
        if let Some(v) = lookup("PASSKEYS_LOG_COLORS") {
            self.colors = flag(&v);
        }
    }
}

impl Fields {
    fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Self {
        Self {
            service: lookup("PASSKEYS_SERVICE"),
            env: lookup("PASSKEYS_ENV"),
            version: lookup("PASSKEYS_VERSION"),
            instance: lookup("PASSKEYS_INSTANCE"),
            custom: Default::default(),
        }
    }
}

fn flag(value: &str) -> bool {
    value != "0" && !value.eq_ignore_ascii_case("false")
}

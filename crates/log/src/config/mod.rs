//! Configuration types

mod presets;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level filter (e.g., "info", "passkeys_credential=debug,sqlx=warn")
    pub level: String,

    /// Output format
    pub format: Format,

    /// Display configuration
    pub display: DisplayConfig,

    /// Global fields attached to the root span
    pub fields: Fields,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Human-readable, multi-line
    Pretty,
    /// Compact single-line output
    Compact,
    /// Structured JSON output
    Json,
}

/// Display configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Show timestamps
    pub time: bool,
    /// Show source location (file:line)
    pub source: bool,
    /// Show target module
    pub target: bool,
    /// Show thread IDs
    pub thread_ids: bool,
    /// Use ANSI colors
    pub colors: bool,
    /// Show span list in JSON
    pub span_list: bool,
    /// Flatten JSON events
    pub flatten: bool,
}

/// Global fields configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fields {
    /// Service name
    pub service: Option<String>,
    /// Environment (dev/staging/prod)
    pub env: Option<String>,
    /// Version
    pub version: Option<String>,
    /// Instance ID
    pub instance: Option<String>,
    /// Custom fields
    #[serde(flatten)]
    pub custom: BTreeMap<String, serde_json::Value>,
}

// ============================================================================
// Implementations
// ============================================================================

impl Default for Config {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: Format::Compact,
            display: DisplayConfig::default(),
            fields: Fields::default(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            time: true,
            source: cfg!(debug_assertions),
            target: true,
            thread_ids: false,
            colors: std::io::IsTerminal::is_terminal(&std::io::stderr()),
            span_list: true,
            flatten: true,
        }
    }
}

impl Fields {
    /// Check if fields are empty
    pub fn is_empty(&self) -> bool {
        self.service.is_none()
            && self.env.is_none()
            && self.version.is_none()
            && self.instance.is_none()
            && self.custom.is_empty()
    }

    /// Render the custom fields as a single `key=value` list for the root span
    pub(crate) fn custom_summary(&self) -> String {
        self.custom
            .iter()
            .map(|(k, v)| match v {
                serde_json::Value::String(s) => format!("{k}={s}"),
                other => format!("{k}={other}"),
            })
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pretty => f.write_str("pretty"),
            Self::Compact => f.write_str("compact"),
            Self::Json => f.write_str("json"),
        }
    }
}

impl FromStr for Format {
    type Err = crate::LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(crate::LogError::UnknownFormat(other.to_string())),
        }
    }
}

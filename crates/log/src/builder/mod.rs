//! Logger builder implementation

#[macro_use]
mod format;

use tracing::Subscriber;
use tracing_subscriber::{EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, Format};
use crate::{LogError, LogResult};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Logger builder
#[derive(Debug)]
pub struct LoggerBuilder {
    config: Config,
}

/// Guard that keeps the logger alive
///
/// Holds the root span carrying the global [`Fields`](crate::Fields); the span
/// is exited when the guard is dropped.
#[derive(Debug)]
pub struct LoggerGuard {
    _root_span: Option<tracing::span::EnteredSpan>,
}

impl LoggerBuilder {
    /// Create builder from config
    #[must_use]
    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    /// Build the subscriber without installing it globally
    ///
    /// # Errors
    ///
    /// Returns [`LogError::InvalidFilter`] if the level directive cannot be parsed.
    pub fn subscriber(&self) -> LogResult<impl Subscriber + Send + Sync + 'static> {
        let filter =
            EnvFilter::try_new(&self.config.level).map_err(|e| LogError::InvalidFilter {
                filter: self.config.level.clone(),
                reason: e.to_string(),
            })?;

        let display = &self.config.display;
        let fmt_layer: BoxedLayer = match self.config.format {
            Format::Pretty => boxed_fmt_layer!(tracing_subscriber::fmt::layer().pretty(), display),
            Format::Compact => {
                boxed_fmt_layer!(tracing_subscriber::fmt::layer().compact(), display)
            }
            Format::Json => boxed_json_layer!(display),
        };

        Ok(tracing_subscriber::registry().with(fmt_layer).with(filter))
    }

    /// Build and install the logger as the global default
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Filter string cannot be parsed
    /// - A global subscriber is already installed
    pub fn build(self) -> LogResult<LoggerGuard> {
        self.subscriber()?
            .try_init()
            .map_err(|e| LogError::Init(e.to_string()))?;

        Ok(LoggerGuard {
            _root_span: self.root_span().map(tracing::Span::entered),
        })
    }

    fn root_span(&self) -> Option<tracing::Span> {
        let fields = &self.config.fields;
        if fields.is_empty() {
            return None;
        }
        Some(tracing::info_span!(
            "app",
            service = fields.service.as_deref().unwrap_or(""),
            env = fields.env.as_deref().unwrap_or(""),
            version = fields.version.as_deref().unwrap_or(""),
            instance = fields.instance.as_deref().unwrap_or(""),
            custom = %fields.custom_summary(),
        ))
    }
}

impl LoggerGuard {
    /// Guard for a logger that was already installed elsewhere
    pub(crate) fn noop() -> Self {
        Self { _root_span: None }
    }
}

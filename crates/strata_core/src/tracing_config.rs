//! Tracing subscriber configuration.
//!
//! Provides [`TracingConfig`], which installs a `tracing` subscriber for a
//! Strata program.
//!
//! # Example
//!
//! ```
//! use strata_core::{TracingConfig, TracingFormat};
//! use tracing::Level;
//!
//! TracingConfig::default()
//!     .with_level(Level::DEBUG)
//!     .with_format(TracingFormat::Compact)
//!     .init();
//!
//! tracing::debug!("subscriber installed");
//! ```

use core::fmt;
use core::str::FromStr;

use tracing::{Level, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::{Layer, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

// ─────────────────────────────────────────────────────────────────────────────
// TracingFormat
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingFormat {
    /// Human-readable colored output (default).
    #[default]
    Pretty,
    /// Compact single-line output.
    Compact,
    /// JSON structured output for log aggregation.
    Json,
}

impl TracingFormat {
    /// Returns the lowercase name of the format.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pretty => "pretty",
            Self::Compact => "compact",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for TracingFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a [`TracingFormat`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown tracing format '{0}': expected 'pretty', 'compact' or 'json'")]
pub struct ParseTracingFormatError(String);

impl FromStr for TracingFormat {
    type Err = ParseTracingFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            _ => Err(ParseTracingFormatError(s.to_string())),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingConfig
// ─────────────────────────────────────────────────────────────────────────────

/// Logging setup for a Strata program.
///
/// Installs a [`tracing_subscriber`] registry with an [`EnvFilter`] and one
/// formatting layer. Per-target levels go through `with_env_filter`:
///
/// ```
/// use strata_core::TracingConfig;
///
/// TracingConfig::default()
///     .with_env_filter("strata_resource=debug,hyper=warn,reqwest=info")
/// # ;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingConfig {
    /// Level used when no filter is set, or when the filter is invalid.
    pub level: Level,
    /// How events are rendered.
    pub format: TracingFormat,
    /// Filter directives such as `strata_resource=debug,hyper=warn`.
    pub env_filter: Option<String>,
    /// Log span enter and exit.
    pub span_events: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: TracingFormat::Pretty,
            env_filter: None,
            span_events: false,
        }
    }
}

impl TracingConfig {
    /// Info level, pretty output, no filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the fallback level.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets how events are rendered.
    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets filter directives (`target=level,...`), overriding the level.
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Logs span enter and exit when `enabled`.
    #[must_use]
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    fn filter(&self) -> EnvFilter {
        match &self.env_filter {
            Some(filter) => {
                EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))
            }
            None => EnvFilter::new(self.level.as_str()),
        }
    }

    /// Builds the formatting layer for the configured output format.
    fn fmt_layer<S>(&self) -> Box<dyn Layer<S> + Send + Sync>
    where
        S: Subscriber + for<'span> LookupSpan<'span> + 'static,
    {
        let span_events = if self.span_events {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        };
        let layer = tracing_subscriber::fmt::layer().with_span_events(span_events);

        match self.format {
            TracingFormat::Pretty => layer.pretty().boxed(),
            TracingFormat::Compact => layer.compact().boxed(),
            TracingFormat::Json => layer.json().boxed(),
        }
    }

    /// Installs the global tracing subscriber.
    ///
    /// Does nothing if a subscriber is already installed.
    pub fn init(&self) {
        let installed = tracing_subscriber::registry()
            .with(self.filter())
            .with(self.fmt_layer())
            .try_init()
            .is_ok();

        tracing::debug!(
            level = %self.level,
            format = %self.format,
            installed,
            "tracing configured"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracing_format_default_is_pretty() {
        assert_eq!(TracingFormat::default(), TracingFormat::Pretty);
    }

    #[test]
    fn tracing_format_parses_case_insensitively() {
        assert_eq!("JSON".parse(), Ok(TracingFormat::Json));
        assert_eq!(" compact ".parse(), Ok(TracingFormat::Compact));
        assert!("yaml".parse::<TracingFormat>().is_err());
    }

    #[test]
    fn tracing_config_default_level_is_info() {
        assert_eq!(TracingConfig::default().level, Level::INFO);
    }

    #[test]
    fn tracing_config_builders() {
        let config = TracingConfig::new()
            .with_level(Level::DEBUG)
            .with_format(TracingFormat::Json)
            .with_env_filter("strata_resource=debug")
            .with_span_events(true);

        assert_eq!(config.level, Level::DEBUG);
        assert_eq!(config.format, TracingFormat::Json);
        assert_eq!(config.env_filter.as_deref(), Some("strata_resource=debug"));
        assert!(config.span_events);
    }

    #[test]
    fn init_is_idempotent() {
        TracingConfig::default().init();
        TracingConfig::default().with_format(TracingFormat::Json).init();
    }
}

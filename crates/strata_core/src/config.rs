//! Program configuration read from the environment.
//!
//! | Variable | Required | Meaning |
//! |----------|----------|---------|
//! | `STRATA_PROJECT` | yes | Project name |
//! | `STRATA_STACK` | yes | Stack name |
//! | `STRATA_DRY_RUN` | no | `true` for a preview run (default `false`) |
//! | `STRATA_ENGINE_ENDPOINT` | no | Engine URL (default [`DEFAULT_ENGINE_ENDPOINT`]) |
//! | `STRATA_ENGINE_TOKEN` | no | Bearer token sent to the engine |
//! | `STRATA_LOG` | no | Log level (`debug`) or filter (`strata_resource=debug,hyper=warn`) |
//! | `STRATA_LOG_FORMAT` | no | `pretty`, `compact` or `json` |
//!
//! # Example
//!
//! ```
//! use strata_core::ProgramConfig;
//!
//! let config = ProgramConfig::from_lookup(|var| match var {
//!     "STRATA_PROJECT" => Some("web".to_string()),
//!     "STRATA_STACK" => Some("prod".to_string()),
//!     "STRATA_DRY_RUN" => Some("true".to_string()),
//!     _ => None,
//! })
//! .unwrap();
//!
//! let ctx = config.create_context();
//! assert_eq!(ctx.stack(), "prod");
//! assert!(ctx.is_dry_run());
//! ```

use core::fmt;
use std::path::PathBuf;

use strata_output::Context;
use tracing::Level;

use crate::tracing_config::{TracingConfig, TracingFormat};

/// Engine endpoint used when `STRATA_ENGINE_ENDPOINT` is unset.
pub const DEFAULT_ENGINE_ENDPOINT: &str = "http://127.0.0.1:7300";

/// Errors reading the program configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A required variable is not set.
    #[error("environment variable {0} is not set")]
    Missing(&'static str),

    /// A variable has a value that cannot be used.
    #[error("invalid value '{value}' for {var}: {reason}")]
    Invalid {
        /// The variable name.
        var: &'static str,
        /// The rejected value.
        value: String,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Configuration of a Strata program.
#[derive(Clone, PartialEq, Eq)]
pub struct ProgramConfig {
    /// Project name.
    pub project: String,
    /// Stack name.
    pub stack: String,
    /// Whether this run is a preview.
    pub dry_run: bool,
    /// Engine endpoint URL.
    pub engine_endpoint: String,
    /// Bearer token sent to the engine.
    pub engine_token: Option<String>,
    /// Tracing configuration.
    pub tracing: TracingConfig,
}

impl ProgramConfig {
    /// Loads variables from a `.env` file in the current directory or its
    /// parents, if one exists.
    ///
    /// Variables already set in the environment take precedence.
    pub fn load_dotenv() -> Option<PathBuf> {
        dotenvy::dotenv().ok()
    }

    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a required variable is missing or a value
    /// is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Reads the configuration through a variable lookup function.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a required variable is missing or a value
    /// is invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &'static str| {
            lookup(var)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let require = |var: &'static str| get(var).ok_or(ConfigError::Missing(var));

        let project = require("STRATA_PROJECT")?;
        let stack = require("STRATA_STACK")?;

        let dry_run = match get("STRATA_DRY_RUN") {
            Some(value) => parse_bool("STRATA_DRY_RUN", &value)?,
            None => false,
        };

        let engine_endpoint =
            get("STRATA_ENGINE_ENDPOINT").unwrap_or_else(|| DEFAULT_ENGINE_ENDPOINT.to_string());
        if !engine_endpoint.starts_with("http://") && !engine_endpoint.starts_with("https://") {
            return Err(ConfigError::Invalid {
                var: "STRATA_ENGINE_ENDPOINT",
                value: engine_endpoint,
                reason: "expected an http:// or https:// URL".to_string(),
            });
        }

        let mut tracing = TracingConfig::default();
        if let Some(log) = get("STRATA_LOG") {
            tracing = match log.parse::<Level>() {
                Ok(level) => tracing.with_level(level),
                Err(_) => tracing.with_env_filter(log),
            };
        }
        if let Some(format) = get("STRATA_LOG_FORMAT") {
            let format = format
                .parse::<TracingFormat>()
                .map_err(|err| ConfigError::Invalid {
                    var: "STRATA_LOG_FORMAT",
                    value: format.clone(),
                    reason: err.to_string(),
                })?;
            tracing = tracing.with_format(format);
        }

        Ok(Self {
            project,
            stack,
            dry_run,
            engine_endpoint,
            engine_token: get("STRATA_ENGINE_TOKEN"),
            tracing,
        })
    }

    /// Creates the program context for this configuration.
    #[must_use]
    pub fn create_context(&self) -> Context {
        Context::new(self.project.as_str(), self.stack.as_str()).with_dry_run(self.dry_run)
    }

    /// The tracing configuration.
    #[must_use]
    pub fn tracing(&self) -> &TracingConfig {
        &self.tracing
    }
}

impl fmt::Debug for ProgramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgramConfig")
            .field("project", &self.project)
            .field("stack", &self.stack)
            .field("dry_run", &self.dry_run)
            .field("engine_endpoint", &self.engine_endpoint)
            .field(
                "engine_token",
                &self.engine_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("tracing", &self.tracing)
            .finish()
    }
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            var,
            value: value.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}

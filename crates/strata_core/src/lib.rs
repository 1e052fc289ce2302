//! Core infrastructure for Strata programs.
//!
//! This crate provides what every program binary needs around the output
//! graph:
//!
//! - [`ProgramConfig`] - Project, stack and engine settings from the environment
//! - [`TracingConfig`] - Logging and observability via the `tracing` crate
//! - [`ProgramInfo`] - Framework version and build metadata
//!
//! # Example
//!
//! ```no_run
//! use strata_core::{ProgramConfig, ProgramInfo};
//!
//! ProgramConfig::load_dotenv();
//! let config = ProgramConfig::from_env()?;
//! config.tracing().init();
//!
//! tracing::info!(info = %ProgramInfo::default(), stack = %config.stack, "starting");
//! let ctx = config.create_context();
//! # Ok::<(), strata_core::ConfigError>(())
//! ```
//!
//! # Architecture
//!
//! - **Layer 1** (`strata_output`): output graph primitives
//! - **Layer 2** (`strata_resource`): engine boundary and resource resolution
//! - **Infrastructure** (`strata_core`): configuration and observability (this crate)

mod config;
mod program_info;
mod tracing_config;

pub use config::{ConfigError, DEFAULT_ENGINE_ENDPOINT, ProgramConfig};
pub use program_info::ProgramInfo;
pub use tracing_config::{ParseTracingFormatError, TracingConfig, TracingFormat};

//! # Strata Internal Library
//!
//! Re-exports the core Strata crates for convenience.

/// Layer 1: typed asynchronous outputs and the program context.
pub use strata_output;

/// Layer 2: engine boundary, resource resolution and stack references.
pub use strata_resource;

/// Configuration, tracing and program metadata.
pub use strata_core;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use strata_core::{ProgramConfig, ProgramInfo, TracingConfig, TracingFormat};
    pub use strata_output::prelude::*;
    pub use strata_resource::prelude::*;
}

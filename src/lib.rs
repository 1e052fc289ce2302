//! Typed asynchronous outputs and cross-stack references for infrastructure
//! programs.
//!

pub use strata_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use strata_internal::prelude::*;
}

//! Typed asynchronous output values for Strata (Layer 1).
//!
//! `strata_output` provides the value system that infrastructure programs
//! are built from:
//!
//! - [`output`] - [`Output<T>`]: a possibly unknown, possibly failed value
//!   that tracks the resources it depends on, with `Apply` combinators
//! - [`mod@all`] - [`All`]: joins several outputs into one
//! - [`value`] - untyped values, runtime type tags and narrowing
//! - [`id`] - resource names, identifiers and dependency sets
//! - [`context`] - [`Context`]: cancellation, resource graph and exports
//! - [`error`] - [`OutputError`]
//!
//! # Architecture
//!
//! - **Layer 1** (`strata_output`): output graph primitives (this crate)
//! - **Layer 2** (`strata_resource`): engine boundary and resource resolution
//!
//! # Example
//!
//! ```
//! use strata_output::{Context, OutputState, all};
//!
//! # futures::executor::block_on(async {
//! let ctx = Context::new("infra", "dev");
//!
//! let host = ctx.known("10.0.0.4".to_string());
//! let port = ctx.known(443_u16);
//! let endpoint = all((host, port)).apply(|(host, port)| format!("https://{host}:{port}"));
//!
//! assert!(matches!(
//!     endpoint.state().await,
//!     OutputState::Known(url) if url == "https://10.0.0.4:443"
//! ));
//! # });
//! ```

/// Joining outputs.
pub mod all;

/// Program execution context.
pub mod context;

/// Output error types.
pub mod error;

/// Resource identifiers and dependency sets.
pub mod id;

/// The output value type and its combinators.
pub mod output;

/// Untyped values and narrowing conversions.
pub mod value;

pub use all::{All, all, all_vec};
pub use context::{
    Context, ContextError, ExportError, ExportedValue, RunHandle, StackOutputs,
};
pub use error::{OutputError, SharedError};
pub use id::{Dependencies, ResourceId, Urn};
pub use output::{Output, OutputState, OutputValue};
pub use value::{Narrow, PropertyBag, UNKNOWN_VALUE, ValueKind, is_unknown_value};

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::all::*;
    pub use crate::context::*;
    pub use crate::error::*;
    pub use crate::id::*;
    pub use crate::output::*;
    pub use crate::value::*;
}

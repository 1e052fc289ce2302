//! Engine boundary and resource resolution for Strata (Layer 2).
//!
//! This crate connects programs built from [`strata_output`] outputs to the
//! provisioning engine that owns resource state:
//!
//! - [`engine`] - [`Engine`]: the read-resource exchange with the engine
//! - [`descriptor`] - [`ResourceDescriptor`]: what to resolve
//! - [`client`] - [`ResourceClient`]: deduplicated resolution into outputs
//! - [`stack_reference`] - [`StackReference`]: another stack's outputs
//! - [`http`] - [`HttpEngine`]: JSON-over-HTTP transport
//!
//! # Error propagation
//!
//! Validation and engine errors are returned to the caller that triggered
//! resolution *and* fail every output of the resolved resource with the
//! same error instance. Conversion errors stay local to the narrowed output.

/// Resolution client and resolved resources.
pub mod client;

/// Resource descriptors.
pub mod descriptor;

/// The engine trait and wire types.
pub mod engine;

/// Resolution errors.
pub mod error;

/// HTTP engine transport.
pub mod http;

/// Resource options.
pub mod options;

/// Stack references.
pub mod stack_reference;

pub use client::{ResolvedResource, ResourceClient};
pub use descriptor::ResourceDescriptor;
pub use engine::{Engine, EngineError, ReadResourceRequest, ReadResourceResponse};
pub use error::{ResolveError, SharedResolveError};
pub use http::HttpEngine;
pub use options::ResourceOptions;
pub use stack_reference::{STACK_REFERENCE_TYPE, StackReference, StackReferenceArgs};

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::client::*;
    pub use crate::descriptor::*;
    pub use crate::engine::*;
    pub use crate::error::{ResolveError, SharedResolveError};
    pub use crate::http::*;
    pub use crate::options::*;
    pub use crate::stack_reference::*;
}

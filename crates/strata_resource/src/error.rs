//! Error types for resource resolution.

use std::sync::Arc;

use strata_output::{ContextError, OutputError};

use crate::engine::EngineError;

/// Errors resolving a resource.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The descriptor is missing or has malformed required fields.
    #[error("invalid resource descriptor: {0}")]
    Validation(String),

    /// The resource could not be registered in the program graph.
    #[error(transparent)]
    Context(#[from] ContextError),

    /// The identifier output failed before a request could be sent.
    #[error("resource identifier failed: {0}")]
    Input(#[source] OutputError),

    /// The engine rejected or failed the request.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The engine's reply does not satisfy the read-resource contract.
    #[error("malformed engine response: {0}")]
    Malformed(String),

    /// The owning context was cancelled before resolution finished.
    #[error("resolution cancelled")]
    Cancelled,
}

impl ResolveError {
    /// Returns `true` if resolution stopped because of cancellation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled => true,
            Self::Input(err) => err.is_cancelled(),
            _ => false,
        }
    }

    /// Returns `true` if the engine reported the resource as missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Engine(EngineError::NotFound { .. }))
    }
}

/// A resolution error shared by every waiter of the same resolution.
pub type SharedResolveError = Arc<ResolveError>;

/// Converts a shared resolution error into the error carried by outputs.
///
/// Cancellation keeps its distinguishable kind; every other error is
/// shared so consumers observe the same instance.
pub(crate) fn output_error(err: &SharedResolveError) -> OutputError {
    if err.is_cancelled() {
        OutputError::Cancelled
    } else {
        OutputError::from_shared(err.clone())
    }
}

impl From<ResolveError> for OutputError {
    fn from(err: ResolveError) -> Self {
        output_error(&Arc::new(err))
    }
}

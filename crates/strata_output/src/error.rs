//! Error types carried by failed outputs.
//!
//! [`OutputError`] is cheap to clone: every consumer of a failed output
//! observes the same underlying error instance.

use core::convert::Infallible;
use std::sync::Arc;

use crate::value::ValueKind;

/// Shared, type-erased error.
pub type SharedError = Arc<dyn core::error::Error + Send + Sync>;

/// Error carried by an [`Output`](crate::Output) in the failed state.
#[derive(Debug, Clone, thiserror::Error)]
pub enum OutputError {
    /// The owning context was cancelled before the value settled.
    ///
    /// This value will never resolve; it did not fail on its own.
    #[error("output cancelled: the owning context was torn down")]
    Cancelled,

    /// A narrowing conversion found a value of the wrong type.
    #[error("type mismatch: expected {expected}, found {actual}")]
    TypeMismatch {
        /// The type the conversion expected.
        expected: &'static str,
        /// The runtime type that was actually present.
        actual: ValueKind,
    },

    /// An upstream resolution or transformation failed.
    #[error(transparent)]
    Failed(SharedError),

    /// A failure described only by a message.
    #[error("{0}")]
    Message(String),
}

impl OutputError {
    /// Wraps an arbitrary error.
    pub fn new<E>(err: E) -> Self
    where
        E: core::error::Error + Send + Sync + 'static,
    {
        Self::Failed(Arc::new(err))
    }

    /// Wraps an already shared error without re-allocating.
    ///
    /// Consumers can compare the instance with [`Arc::ptr_eq`] via [`shared`](Self::shared).
    #[must_use]
    pub fn from_shared(err: SharedError) -> Self {
        Self::Failed(err)
    }

    /// Creates an error from a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    /// Returns `true` if this error stems from cancellation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns the shared error instance, if this wraps one.
    #[must_use]
    pub fn shared(&self) -> Option<&SharedError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }
}

impl From<Infallible> for OutputError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

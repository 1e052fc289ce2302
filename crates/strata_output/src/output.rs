//! The [`Output`] value type and its `Apply` combinators.
//!
//! An `Output<T>` is a value of type `T` that may not be known yet, may have
//! failed, and records which resources it depends on. Outputs never block
//! when they are built or combined; only observing the settled
//! [`OutputState`] suspends.
//!
//! # Example
//!
//! ```
//! use strata_output::{Output, OutputState};
//!
//! # futures::executor::block_on(async {
//! let port = Output::known(8080_u16);
//! let url = port.apply(|port| format!("http://localhost:{port}"));
//!
//! let OutputState::Known(url) = url.state().await else {
//!     panic!("expected a known value");
//! };
//! assert_eq!(url, "http://localhost:8080");
//! # });
//! ```

use core::fmt;
use core::future::Future;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tokio_util::sync::CancellationToken;

use crate::error::OutputError;
use crate::id::Dependencies;

/// Marker trait for types that can flow through outputs.
///
/// Any type that is `Clone + Send + Sync + 'static` automatically implements
/// `OutputValue`. Cloning is required because every consumer of a settled
/// output receives its own copy.
pub trait OutputValue: Clone + Send + Sync + 'static {}

// Blanket implementation for all compatible types
impl<T: Clone + Send + Sync + 'static> OutputValue for T {}

/// Settled state of an output.
///
/// Exactly one of value, error or unknown holds.
#[derive(Debug, Clone)]
pub enum OutputState<T> {
    /// The value is available.
    Known(T),
    /// The value cannot be determined yet (e.g. during a preview).
    Unknown,
    /// Resolution failed.
    Failed(OutputError),
}

impl<T> OutputState<T> {
    /// Returns `true` if the value is known.
    #[must_use]
    pub fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }

    /// Returns `true` if the value is unknown.
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }

    /// Returns `true` if resolution failed.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Returns a reference to the known value.
    #[must_use]
    pub fn known(&self) -> Option<&T> {
        match self {
            Self::Known(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the carried error.
    #[must_use]
    pub fn error(&self) -> Option<&OutputError> {
        match self {
            Self::Failed(err) => Some(err),
            _ => None,
        }
    }

    /// Converts into a `Result`, mapping unknown to `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns the carried [`OutputError`] if the state is failed.
    pub fn into_result(self) -> Result<Option<T>, OutputError> {
        match self {
            Self::Known(value) => Ok(Some(value)),
            Self::Unknown => Ok(None),
            Self::Failed(err) => Err(err),
        }
    }

    /// Maps the known value, leaving unknown and failed states untouched.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> OutputState<U> {
        match self {
            Self::Known(value) => OutputState::Known(f(value)),
            Self::Unknown => OutputState::Unknown,
            Self::Failed(err) => OutputState::Failed(err),
        }
    }
}

/// Shared future resolving to an output's settled state.
pub(crate) type StateFuture<T> = Shared<BoxFuture<'static, OutputState<T>>>;

/// A typed, possibly not yet known value in the resource graph.
///
/// Outputs are immutable: every combinator returns a new output and
/// leaves its sources untouched. Cloning is cheap and clones observe the
/// same settlement. Each constructed output settles at most once, so an
/// `Apply` callback runs at most once no matter how many consumers await
/// the result.
///
/// # Cancellation
///
/// Outputs created through a [`Context`](crate::Context), and everything
/// derived from them, carry the context's cancellation token. Once the
/// token fires, outputs that have not settled yet resolve to
/// [`OutputError::Cancelled`] and pending callbacks never start.
#[derive(Clone)]
pub struct Output<T: OutputValue> {
    pub(crate) state: StateFuture<T>,
    pub(crate) deps: Dependencies,
    pub(crate) cancel: Option<CancellationToken>,
}

impl<T: OutputValue> Output<T> {
    /// Creates an output that is already known.
    #[must_use]
    pub fn known(value: T) -> Self {
        Self::settled(OutputState::Known(value))
    }

    /// Creates an output whose value is unknown.
    #[must_use]
    pub fn unknown() -> Self {
        Self::settled(OutputState::Unknown)
    }

    /// Creates an output that has already failed.
    #[must_use]
    pub fn failed(err: OutputError) -> Self {
        Self::settled(OutputState::Failed(err))
    }

    /// Creates an output from a settled state.
    #[must_use]
    pub fn settled(state: OutputState<T>) -> Self {
        let state = futures::future::ready(state).boxed().shared();
        // Completes immediately, so `peek` sees the value without an await.
        let _ = state.clone().now_or_never();
        Self {
            state,
            deps: Dependencies::new(),
            cancel: None,
        }
    }

    /// Creates an output backed by a pending resolution.
    ///
    /// The future is driven lazily by whichever consumer first awaits the
    /// output (or anything derived from it).
    pub fn from_future<F>(future: F) -> Self
    where
        F: Future<Output = OutputState<T>> + Send + 'static,
    {
        Self {
            state: future.boxed().shared(),
            deps: Dependencies::new(),
            cancel: None,
        }
    }

    /// Adds resources to this output's dependency set.
    #[must_use]
    pub fn with_dependencies(mut self, deps: &Dependencies) -> Self {
        self.deps = self.deps.union(deps);
        self
    }

    /// Binds this output to a cancellation token.
    ///
    /// If the token fires before the output settles, it resolves to
    /// [`OutputError::Cancelled`].
    #[must_use]
    pub fn with_cancellation(self, token: CancellationToken) -> Self {
        Self {
            state: guarded(self.state, Some(&token)),
            deps: self.deps,
            cancel: Some(token),
        }
    }

    /// Attaches a token without guarding the current state.
    ///
    /// Used for values that are settled at construction.
    pub(crate) fn bind(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub(crate) fn from_parts<F>(
        future: F,
        deps: Dependencies,
        cancel: Option<CancellationToken>,
    ) -> Self
    where
        F: Future<Output = OutputState<T>> + Send + 'static,
    {
        Self {
            state: guarded(future, cancel.as_ref()),
            deps,
            cancel,
        }
    }

    /// Returns the resources this output depends on.
    #[must_use]
    pub fn dependencies(&self) -> &Dependencies {
        &self.deps
    }

    /// Returns the cancellation token this output is bound to, if any.
    #[must_use]
    pub fn cancellation(&self) -> Option<&CancellationToken> {
        self.cancel.as_ref()
    }

    /// Waits for the output to settle and returns its state.
    pub async fn state(&self) -> OutputState<T> {
        self.state.clone().await
    }

    /// Returns `true` if both outputs are clones of the same output.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.state.ptr_eq(&other.state)
    }

    /// Returns the settled state without waiting.
    ///
    /// Returns `None` if the output has not been driven to completion yet.
    #[must_use]
    pub fn peek(&self) -> Option<OutputState<T>> {
        self.state.peek().cloned()
    }

    /// Transforms the settled value into a new state.
    ///
    /// This is the primitive behind [`apply`](Self::apply) and
    /// [`try_apply`](Self::try_apply). `f` is invoked only if this output
    /// is known and its context has not been cancelled; unknown and failed
    /// states propagate unchanged. The result inherits this output's
    /// dependencies and cancellation token.
    pub fn apply_state<U, F>(&self, f: F) -> Output<U>
    where
        U: OutputValue,
        F: FnOnce(T) -> OutputState<U> + Send + 'static,
    {
        let source = self.state.clone();
        let check = self.cancel.clone();

        let future = async move {
            match source.await {
                OutputState::Known(value) => {
                    if check.as_ref().is_some_and(CancellationToken::is_cancelled) {
                        return OutputState::Failed(OutputError::Cancelled);
                    }
                    f(value)
                }
                OutputState::Unknown => OutputState::Unknown,
                OutputState::Failed(err) => OutputState::Failed(err),
            }
        };

        Output::from_parts(future, self.deps.clone(), self.cancel.clone())
    }

    /// Transforms the settled value with a fallible function.
    ///
    /// An error returned by `f` fails the resulting output.
    pub fn try_apply<U, E, F>(&self, f: F) -> Output<U>
    where
        U: OutputValue,
        E: Into<OutputError>,
        F: FnOnce(T) -> Result<U, E> + Send + 'static,
    {
        self.apply_state(move |value| match f(value) {
            Ok(mapped) => OutputState::Known(mapped),
            Err(err) => OutputState::Failed(err.into()),
        })
    }

    /// Transforms the settled value.
    pub fn apply<U, F>(&self, f: F) -> Output<U>
    where
        U: OutputValue,
        F: FnOnce(T) -> U + Send + 'static,
    {
        self.apply_state(move |value| OutputState::Known(f(value)))
    }
}

/// Wraps a state future so it settles as cancelled once the token fires.
fn guarded<T, F>(future: F, cancel: Option<&CancellationToken>) -> StateFuture<T>
where
    T: OutputValue,
    F: Future<Output = OutputState<T>> + Send + 'static,
{
    match cancel {
        Some(token) => {
            let token = token.clone();
            async move {
                // A value arriving after the token fired is discarded.
                match token.run_until_cancelled(future).await {
                    Some(state) if !token.is_cancelled() => state,
                    _ => OutputState::Failed(OutputError::Cancelled),
                }
            }
            .boxed()
            .shared()
        }
        None => future.boxed().shared(),
    }
}

impl<T: OutputValue> From<T> for Output<T> {
    fn from(value: T) -> Self {
        Self::known(value)
    }
}

impl From<&str> for Output<String> {
    fn from(value: &str) -> Self {
        Self::known(value.to_string())
    }
}

impl<T: OutputValue> fmt::Debug for Output<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.state.peek() {
            Some(OutputState::Known(_)) => "known",
            Some(OutputState::Unknown) => "unknown",
            Some(OutputState::Failed(_)) => "failed",
            None => "pending",
        };
        f.debug_struct("Output")
            .field("type", &core::any::type_name::<T>())
            .field("state", &state)
            .field("dependencies", &self.deps.to_sorted_vec())
            .finish()
    }
}

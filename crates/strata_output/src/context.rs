//! Program execution context.
//!
//! A [`Context`] is passed explicitly to every resolution call. It owns the
//! program's cancellation token, the dependency graph of registered
//! resources, and the export boundary where final outputs are collected.
//!
//! # Example
//!
//! ```
//! use strata_output::{Context, ExportedValue};
//!
//! # futures::executor::block_on(async {
//! let ctx = Context::new("infra", "prod");
//!
//! let replicas = ctx.known(3_u32);
//! ctx.export("replicas", &replicas.apply(|n| n * 2)).unwrap();
//!
//! let outputs = ctx.collect_exports().await.unwrap();
//! assert_eq!(
//!     outputs.get("replicas"),
//!     Some(&ExportedValue::Known(serde_json::Value::from(6_u32)))
//! );
//! # });
//! ```

use core::fmt;
use core::future::Future;
use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use hashbrown::HashMap;
use parking_lot::{Mutex, RwLock};
use serde::{Serialize, Serializer};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::error::OutputError;
use crate::id::{Dependencies, Urn};
use crate::output::{Output, OutputState, OutputValue};

/// Errors raised while building the program graph.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContextError {
    /// A resource with the same URN was already registered.
    #[error("duplicate resource: {0}")]
    DuplicateResource(Urn),

    /// An output was already exported under this name.
    #[error("duplicate export: {0}")]
    DuplicateExport(String),
}

/// Errors surfaced when collecting exported outputs.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// An exported output failed.
    #[error("export '{name}' failed: {source}")]
    Failed {
        /// The export name.
        name: String,
        /// The error carried by the output.
        #[source]
        source: OutputError,
    },

    /// The context was cancelled before exports settled.
    #[error("program cancelled before exports settled")]
    Cancelled,
}

/// A collected export value.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportedValue {
    /// The serialized value.
    Known(Value),
    /// The value could not be determined yet.
    Unknown,
}

impl ExportedValue {
    /// Display text used for unknown values.
    pub const UNKNOWN_TEXT: &'static str = "<value not yet known>";
}

impl fmt::Display for ExportedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(value) => write!(f, "{value}"),
            Self::Unknown => f.write_str(Self::UNKNOWN_TEXT),
        }
    }
}

impl Serialize for ExportedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Known(value) => value.serialize(serializer),
            Self::Unknown => serializer.serialize_str(Self::UNKNOWN_TEXT),
        }
    }
}

/// Exported outputs of a program, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct StackOutputs(BTreeMap<String, ExportedValue>);

impl StackOutputs {
    /// Returns the export with the given name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ExportedValue> {
        self.0.get(name)
    }

    /// Number of exports.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if nothing was exported.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `true` if every export is known.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.0.values().all(|v| matches!(v, ExportedValue::Known(_)))
    }

    /// Iterates over exports in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ExportedValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

type ResourceGraph = HashMap<Urn, Dependencies>;

/// Weak handle on a program run.
///
/// Does not keep the run alive. Caches keyed by run use it to drop entries
/// for programs that have finished.
#[derive(Clone)]
pub struct RunHandle {
    run_id: Arc<str>,
    graph: Weak<RwLock<ResourceGraph>>,
    cancel: CancellationToken,
}

impl RunHandle {
    /// Unique identifier of the run.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Returns `true` while some context of the run exists and it has not
    /// been cancelled.
    #[must_use]
    pub fn is_live(&self) -> bool {
        !self.cancel.is_cancelled() && self.graph.strong_count() > 0
    }
}

impl fmt::Debug for RunHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunHandle")
            .field("run_id", &self.run_id)
            .field("live", &self.is_live())
            .finish()
    }
}

/// Explicit program context.
///
/// Cheap to clone; clones share the cancellation token, the resource graph
/// and the exports.
#[derive(Clone)]
pub struct Context {
    project: Arc<str>,
    stack: Arc<str>,
    dry_run: bool,
    run_id: Arc<str>,
    cancel: CancellationToken,
    graph: Arc<RwLock<ResourceGraph>>,
    exports: Arc<Mutex<Vec<(String, Output<Value>)>>>,
}

impl Context {
    /// Creates a context for the given project and stack.
    #[must_use]
    pub fn new(project: impl Into<Arc<str>>, stack: impl Into<Arc<str>>) -> Self {
        Self {
            project: project.into(),
            stack: stack.into(),
            dry_run: false,
            run_id: nanoid::nanoid!().into(),
            cancel: CancellationToken::new(),
            graph: Arc::new(RwLock::new(HashMap::new())),
            exports: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Marks the program as a preview (dry run).
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Replaces the default cancellation token with the provided one.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// The project name.
    #[must_use]
    pub fn project(&self) -> &str {
        &self.project
    }

    /// The stack name.
    #[must_use]
    pub fn stack(&self) -> &str {
        &self.stack
    }

    /// Whether this run is a preview.
    #[must_use]
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Unique identifier of this run.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Returns a weak handle on this run.
    #[must_use]
    pub fn handle(&self) -> RunHandle {
        RunHandle {
            run_id: self.run_id.clone(),
            graph: Arc::downgrade(&self.graph),
            cancel: self.cancel.clone(),
        }
    }

    /// The program's cancellation token.
    #[must_use]
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Cancels the program.
    ///
    /// Outputs that have not settled resolve to [`OutputError::Cancelled`]
    /// and no further `Apply` callback starts. Callbacks already running are
    /// not interrupted.
    pub fn cancel(&self) {
        if !self.cancel.is_cancelled() {
            tracing::info!(run_id = %self.run_id, stack = %self.stack, "cancelling program context");
        }
        self.cancel.cancel();
    }

    /// Returns `true` once the program has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Creates a known output bound to this context.
    #[must_use]
    pub fn known<T: OutputValue>(&self, value: T) -> Output<T> {
        Output::known(value).bind(self.cancel.clone())
    }

    /// Creates an unknown output bound to this context.
    #[must_use]
    pub fn unknown<T: OutputValue>(&self) -> Output<T> {
        Output::unknown().bind(self.cancel.clone())
    }

    /// Creates a failed output bound to this context.
    #[must_use]
    pub fn failed<T: OutputValue>(&self, err: OutputError) -> Output<T> {
        Output::failed(err).bind(self.cancel.clone())
    }

    /// Creates an output backed by a pending resolution.
    ///
    /// The output settles as cancelled if the context is cancelled first.
    pub fn from_future<T, F>(&self, future: F, deps: &Dependencies) -> Output<T>
    where
        T: OutputValue,
        F: Future<Output = OutputState<T>> + Send + 'static,
    {
        Output::from_parts(future, deps.clone(), Some(self.cancel.clone()))
    }

    /// Builds the URN of a resource owned by this program.
    #[must_use]
    pub fn urn_for(&self, type_token: &str, name: &str) -> Urn {
        Urn::new(&self.stack, &self.project, type_token, name)
    }

    /// Registers a resource and its dependencies in the program graph.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::DuplicateResource`] if the URN is taken.
    pub fn register_resource(&self, urn: Urn, deps: Dependencies) -> Result<(), ContextError> {
        let mut graph = self.graph.write();
        if graph.contains_key(&urn) {
            return Err(ContextError::DuplicateResource(urn));
        }
        tracing::debug!(urn = %urn, dependencies = deps.len(), "registered resource");
        graph.insert(urn, deps);
        Ok(())
    }

    /// Returns `true` if the resource is registered.
    #[must_use]
    pub fn contains_resource(&self, urn: &Urn) -> bool {
        self.graph.read().contains_key(urn)
    }

    /// Returns the dependencies recorded for a resource.
    #[must_use]
    pub fn dependencies_of(&self, urn: &Urn) -> Option<Dependencies> {
        self.graph.read().get(urn).cloned()
    }

    /// Returns every registered resource, sorted.
    #[must_use]
    pub fn resource_urns(&self) -> Vec<Urn> {
        let mut urns: Vec<Urn> = self.graph.read().keys().cloned().collect();
        urns.sort();
        urns
    }

    /// Exports an output under the given name.
    ///
    /// The value is serialized once it settles; a serialization failure
    /// fails the export.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::DuplicateExport`] if the name is taken.
    pub fn export<T>(&self, name: impl Into<String>, output: &Output<T>) -> Result<(), ContextError>
    where
        T: OutputValue + Serialize,
    {
        let name = name.into();
        let mut exports = self.exports.lock();
        if exports.iter().any(|(existing, _)| *existing == name) {
            return Err(ContextError::DuplicateExport(name));
        }
        let value = output.try_apply(|v| serde_json::to_value(v).map_err(OutputError::new));
        exports.push((name, value));
        Ok(())
    }

    /// Waits for every export to settle and collects the results.
    ///
    /// Unknown values are reported as [`ExportedValue::Unknown`], not as
    /// errors.
    ///
    /// # Errors
    ///
    /// Returns the first failed export in export order, or
    /// [`ExportError::Cancelled`] if the program was cancelled.
    pub async fn collect_exports(&self) -> Result<StackOutputs, ExportError> {
        let exports = self.exports.lock().clone();
        let mut collected = BTreeMap::new();

        for (name, output) in exports {
            match output.state().await {
                OutputState::Known(value) => {
                    collected.insert(name, ExportedValue::Known(value));
                }
                OutputState::Unknown => {
                    if !self.dry_run {
                        tracing::warn!(export = %name, "export is unknown outside of a preview");
                    }
                    collected.insert(name, ExportedValue::Unknown);
                }
                OutputState::Failed(OutputError::Cancelled) => return Err(ExportError::Cancelled),
                OutputState::Failed(source) => {
                    tracing::warn!(export = %name, error = %source, "export failed");
                    return Err(ExportError::Failed { name, source });
                }
            }
        }

        tracing::debug!(run_id = %self.run_id, exports = collected.len(), "collected exports");
        Ok(StackOutputs(collected))
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("project", &self.project)
            .field("stack", &self.stack)
            .field("dry_run", &self.dry_run)
            .field("run_id", &self.run_id)
            .field("cancelled", &self.cancel.is_cancelled())
            .field("resources", &self.graph.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urn_is_scoped_to_project_and_stack() {
        let ctx = Context::new("infra", "prod");
        let urn = ctx.urn_for("pkg:mod:Type", "web");
        assert_eq!(urn.as_str(), "urn:strata:prod::infra::pkg:mod:Type::web");
    }

    #[test]
    fn duplicate_resource_is_rejected() {
        let ctx = Context::new("infra", "prod");
        let urn = ctx.urn_for("pkg:mod:Type", "web");

        assert!(ctx.register_resource(urn.clone(), Dependencies::new()).is_ok());
        assert_eq!(
            ctx.register_resource(urn.clone(), Dependencies::new()),
            Err(ContextError::DuplicateResource(urn))
        );
    }

    #[test]
    fn duplicate_export_is_rejected() {
        let ctx = Context::new("infra", "prod");
        let value = ctx.known(1);
        assert!(ctx.export("a", &value).is_ok());
        assert_eq!(
            ctx.export("a", &value),
            Err(ContextError::DuplicateExport("a".to_string()))
        );
    }

    #[test]
    fn clones_share_cancellation() {
        let ctx = Context::new("infra", "prod");
        let clone = ctx.clone();
        ctx.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn handle_tracks_liveness() {
        let ctx = Context::new("p", "s");
        let handle = ctx.handle();
        assert_eq!(handle.run_id(), ctx.run_id());
        assert!(handle.is_live());

        let clone = ctx.clone();
        drop(ctx);
        assert!(handle.is_live());
        drop(clone);
        assert!(!handle.is_live());

        let cancelled = Context::new("p", "s");
        let handle = cancelled.handle();
        cancelled.cancel();
        assert!(!handle.is_live());
    }

    #[test]
    fn run_ids_are_unique() {
        let a = Context::new("p", "s");
        let b = Context::new("p", "s");
        assert_ne!(a.run_id(), b.run_id());
    }

    #[test]
    fn unknown_export_serializes_as_placeholder() {
        let rendered = serde_json::to_string(&ExportedValue::Unknown).unwrap();
        assert_eq!(rendered, "\"<value not yet known>\"");
    }
}

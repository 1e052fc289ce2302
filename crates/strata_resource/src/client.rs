//! The resource resolution client.
//!
//! [`ResourceClient`] turns a [`ResourceDescriptor`] into a
//! [`ResolvedResource`] whose fields are outputs backed by a single engine
//! request. Resolution is keyed by the resource's URN: concurrent and
//! repeated resolutions of the same resource within a program share one
//! request and observe the same outcome.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use strata_output::Context;
//! use strata_resource::{HttpEngine, ResourceClient, ResourceDescriptor};
//!
//! # async fn run() -> Result<(), strata_resource::SharedResolveError> {
//! let ctx = Context::new("app", "dev");
//! let client = ResourceClient::new(Arc::new(HttpEngine::new("http://localhost:7300")));
//!
//! let bucket = client
//!     .read_resource(&ctx, ResourceDescriptor::new("aws:s3:Bucket", "logs").with_input("logs-1234"))
//!     .await?;
//! let arn = bucket.property("arn").as_string();
//! # Ok(())
//! # }
//! ```

use core::fmt;
use core::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use hashbrown::HashMap;
use parking_lot::Mutex;
use serde_json::Value;
use strata_output::{
    Context, ContextError, Dependencies, Output, OutputState, PropertyBag, ResourceId, RunHandle,
    Urn,
};

use crate::descriptor::ResourceDescriptor;
use crate::engine::{Engine, ReadResourceRequest, ReadResourceResponse};
use crate::error::{ResolveError, SharedResolveError, output_error};

/// Outcome of a single resolution.
#[derive(Clone)]
enum Resolved {
    /// The engine returned the resource's state.
    Read(Arc<ReadResourceResponse>),
    /// The identifier was not known, so nothing was read.
    Unknown,
}

type Resolution = Shared<BoxFuture<'static, Result<Resolved, SharedResolveError>>>;

/// A resolution together with the descriptor and run that started it.
struct Cached {
    descriptor: ResourceDescriptor,
    run: RunHandle,
    resolution: Resolution,
}

/// Decrements the in-flight counter when the request finishes or is dropped.
struct InFlight(Arc<AtomicUsize>);

impl InFlight {
    fn start(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter.clone())
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Resolves resources through an [`Engine`].
///
/// Cheap to clone; clones share the engine and the resolution cache.
#[derive(Clone)]
pub struct ResourceClient {
    engine: Arc<dyn Engine>,
    resolutions: Arc<Mutex<HashMap<(Arc<str>, Urn), Cached>>>,
    in_flight: Arc<AtomicUsize>,
}

impl ResourceClient {
    /// Creates a client backed by the given engine.
    #[must_use]
    pub fn new(engine: Arc<dyn Engine>) -> Self {
        Self {
            engine,
            resolutions: Arc::new(Mutex::new(HashMap::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of engine requests currently outstanding.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Number of cached resolutions.
    ///
    /// Entries of runs that were cancelled or dropped are evicted on the
    /// next resolution.
    #[must_use]
    pub fn cached(&self) -> usize {
        self.resolutions.lock().len()
    }

    /// Resolves a resource without waiting for the engine.
    ///
    /// The descriptor is validated and the resource is registered in the
    /// context before this returns; the engine request runs once any field
    /// of the returned resource (or [`ResolvedResource::wait`]) is awaited.
    /// Resolving the same descriptor again in this context returns a
    /// resource sharing the first resolution.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Validation`] for malformed descriptors and
    /// [`ResolveError::Context`] if the resource cannot be registered,
    /// including when the URN was already resolved from a different
    /// descriptor.
    pub fn resolve(
        &self,
        ctx: &Context,
        descriptor: ResourceDescriptor,
    ) -> Result<ResolvedResource, ResolveError> {
        descriptor.validate(ctx)?;

        let urn = ctx.urn_for(descriptor.type_token(), descriptor.name());
        let key = (Arc::<str>::from(ctx.run_id()), urn.clone());

        let resolution = {
            let mut resolutions = self.resolutions.lock();
            evict_finished(&mut resolutions, ctx.run_id());

            if let Some(existing) = resolutions.get(&key) {
                if !existing.descriptor.same_read(&descriptor) {
                    tracing::warn!(urn = %urn, "resource already resolved from a different descriptor");
                    return Err(ContextError::DuplicateResource(urn).into());
                }
                tracing::debug!(urn = %urn, "sharing existing resolution");
                existing.resolution.clone()
            } else {
                let id = descriptor.identifier(ctx);
                let deps = id.dependencies().union(&descriptor.options().dependencies());
                ctx.register_resource(urn.clone(), deps)?;

                let resolution = self.start(ctx, &descriptor, urn.clone(), id);
                resolutions.insert(
                    key,
                    Cached {
                        descriptor,
                        run: ctx.handle(),
                        resolution: resolution.clone(),
                    },
                );
                resolution
            }
        };

        Ok(ResolvedResource::new(ctx, urn, resolution))
    }

    /// Resolves a resource and waits for the engine's reply.
    ///
    /// # Errors
    ///
    /// Returns the resolution error, shared with every output of the
    /// resource and every other waiter of the same resolution.
    pub async fn read_resource(
        &self,
        ctx: &Context,
        descriptor: ResourceDescriptor,
    ) -> Result<ResolvedResource, SharedResolveError> {
        let resource = self.resolve(ctx, descriptor).map_err(Arc::new)?;
        resource.wait().await?;
        Ok(resource)
    }

    fn start(
        &self,
        ctx: &Context,
        descriptor: &ResourceDescriptor,
        urn: Urn,
        id: Output<ResourceId>,
    ) -> Resolution {
        let engine = self.engine.clone();
        let in_flight = self.in_flight.clone();
        let token = ctx.cancellation_token().clone();
        let type_token = descriptor.type_token().to_string();
        let name = descriptor.name().to_string();
        let options = descriptor.options().clone();

        let resolve = async move {
            let id = match id.state().await {
                OutputState::Known(id) => id,
                OutputState::Unknown => {
                    tracing::debug!(urn = %urn, "identifier unknown; skipping read");
                    return Ok(Resolved::Unknown);
                }
                OutputState::Failed(err) => return Err(ResolveError::Input(err)),
            };

            let request = ReadResourceRequest {
                type_token,
                name,
                id,
                urn: urn.clone(),
                options,
            };
            tracing::debug!(urn = %urn, id = %request.id, "reading resource");

            let response = {
                let _guard = InFlight::start(&in_flight);
                engine.read_resource(request).await?
            };

            if response.id.is_empty() {
                return Err(ResolveError::Malformed(format!(
                    "engine returned an empty identifier for '{urn}'"
                )));
            }

            tracing::info!(
                urn = %urn,
                id = %response.id,
                properties = response.properties.len(),
                "resolved resource"
            );
            Ok::<_, ResolveError>(Resolved::Read(Arc::new(response)))
        };

        async move {
            let result = match token.run_until_cancelled(resolve).await {
                Some(result) if !token.is_cancelled() => result,
                _ => Err(ResolveError::Cancelled),
            };
            result.map_err(|err| {
                if err.is_cancelled() {
                    tracing::warn!(error = %err, "resolution cancelled");
                } else {
                    tracing::warn!(error = %err, "resolution failed");
                }
                Arc::new(err)
            })
        }
        .boxed()
        .shared()
    }
}

/// Drops resolutions of runs other than `current` that are no longer live.
fn evict_finished(resolutions: &mut HashMap<(Arc<str>, Urn), Cached>, current: &str) {
    let before = resolutions.len();
    resolutions.retain(|(run_id, _), cached| &**run_id == current || cached.run.is_live());

    let evicted = before - resolutions.len();
    if evicted > 0 {
        tracing::debug!(evicted, "evicted finished resolutions");
    }
}

impl fmt::Debug for ResourceClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceClient")
            .field("resolutions", &self.resolutions.lock().len())
            .field("in_flight", &self.in_flight())
            .finish_non_exhaustive()
    }
}

/// A resource whose state is resolved by the engine.
///
/// Every field is an output settling when the engine replies. If resolution
/// fails, every field fails with the same error.
#[derive(Clone)]
pub struct ResolvedResource {
    urn: Urn,
    id: Output<ResourceId>,
    properties: Output<PropertyBag>,
    resolution: Resolution,
}

impl ResolvedResource {
    fn new(ctx: &Context, urn: Urn, resolution: Resolution) -> Self {
        let deps = Dependencies::single(urn.clone());

        let id = ctx.from_future(
            settle(resolution.clone(), |response| response.id.clone()),
            &deps,
        );
        let properties = ctx.from_future(
            settle(resolution.clone(), |response| response.properties.clone()),
            &deps,
        );

        Self {
            urn,
            id,
            properties,
            resolution,
        }
    }

    /// The resource's URN.
    #[must_use]
    pub fn urn(&self) -> &Urn {
        &self.urn
    }

    /// The identifier the engine resolved the resource to.
    #[must_use]
    pub fn id(&self) -> &Output<ResourceId> {
        &self.id
    }

    /// All properties of the resource.
    #[must_use]
    pub fn properties(&self) -> &Output<PropertyBag> {
        &self.properties
    }

    /// Looks up a single property; a missing property is `null`.
    pub fn property(&self, key: impl Into<Output<String>>) -> Output<Value> {
        self.properties.lookup(key)
    }

    /// Waits for the resolution to finish.
    ///
    /// # Errors
    ///
    /// Returns the shared resolution error if the resolution failed.
    pub async fn wait(&self) -> Result<(), SharedResolveError> {
        self.resolution.clone().await.map(|_| ())
    }
}

impl fmt::Debug for ResolvedResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedResource")
            .field("urn", &self.urn)
            .field("id", &self.id)
            .field("properties", &self.properties)
            .finish_non_exhaustive()
    }
}

/// Projects a field out of a resolution.
async fn settle<T, F>(resolution: Resolution, field: F) -> OutputState<T>
where
    F: FnOnce(&ReadResourceResponse) -> T,
{
    match resolution.await {
        Ok(Resolved::Read(response)) => OutputState::Known(field(&response)),
        Ok(Resolved::Unknown) => OutputState::Unknown,
        Err(err) => OutputState::Failed(output_error(&err)),
    }
}

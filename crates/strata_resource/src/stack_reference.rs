//! Stack references: consuming another stack's exported outputs.
//!
//! A [`StackReference`] reads the outputs another deployment exported and
//! exposes them as outputs of the current program. Lookups accept keys that
//! are themselves outputs, since the set of exported keys is only known
//! once the reference resolves.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use strata_output::Context;
//! use strata_resource::{HttpEngine, ResourceClient, ResourceOptions, StackReference};
//!
//! # async fn run() -> Result<(), strata_resource::SharedResolveError> {
//! let ctx = Context::new("web", "prod");
//! let client = ResourceClient::new(Arc::new(HttpEngine::new("http://localhost:7300")));
//!
//! let network =
//!     StackReference::new(&ctx, &client, "infra/prod/network", None, ResourceOptions::new())
//!         .await?;
//! let vpc_id = network.get_id_output("vpcId");
//! let subnets = network.get_int_output("subnetCount");
//! # Ok(())
//! # }
//! ```

use serde_json::Value;
use strata_output::{Context, Narrow, Output, OutputState, PropertyBag, ResourceId, Urn};

use crate::client::{ResolvedResource, ResourceClient};
use crate::descriptor::ResourceDescriptor;
use crate::error::SharedResolveError;
use crate::options::ResourceOptions;

/// Type token of stack reference resources.
pub const STACK_REFERENCE_TYPE: &str = "strata:strata:StackReference";

/// Arguments for a [`StackReference`].
#[derive(Debug, Clone, Default)]
pub struct StackReferenceArgs {
    /// Fully qualified name of the referenced stack.
    ///
    /// Defaults to the reference's logical name.
    pub name: Option<Output<String>>,
}

impl StackReferenceArgs {
    /// Creates arguments naming the referenced stack.
    #[must_use]
    pub fn new(name: impl Into<Output<String>>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }
}

/// A reference to another stack's outputs.
#[derive(Debug, Clone)]
pub struct StackReference {
    resource: ResolvedResource,
    name: Output<String>,
    outputs: Output<PropertyBag>,
}

impl StackReference {
    /// Reads the referenced stack's outputs.
    ///
    /// `name` is the logical name of the reference in this program. Unless
    /// `args` names a stack explicitly, it is also the name of the stack
    /// to read.
    ///
    /// # Errors
    ///
    /// Returns the resolution error if the descriptor is invalid, the name
    /// is already in use, or the engine cannot read the stack. The same
    /// error fails every output of the reference.
    pub async fn new(
        ctx: &Context,
        client: &ResourceClient,
        name: impl Into<String>,
        args: Option<StackReferenceArgs>,
        options: ResourceOptions,
    ) -> Result<Self, SharedResolveError> {
        let mut descriptor =
            ResourceDescriptor::new(STACK_REFERENCE_TYPE, name).with_options(options);
        if let Some(stack) = args.and_then(|args| args.name) {
            descriptor = descriptor.with_input(stack);
        }

        let resource = client.read_resource(ctx, descriptor).await?;
        Ok(Self::from_resource(resource))
    }

    /// Wraps an already resolved stack reference resource.
    #[must_use]
    pub fn from_resource(resource: ResolvedResource) -> Self {
        let name = resource.property("name").as_string();
        let outputs = resource.property("outputs").apply_state(|value| match value {
            Value::Null => OutputState::Known(PropertyBag::new()),
            other => match PropertyBag::narrow(other) {
                Ok(bag) => OutputState::Known(bag),
                Err(err) => OutputState::Failed(err),
            },
        });

        Self {
            resource,
            name,
            outputs,
        }
    }

    /// The reference's URN.
    #[must_use]
    pub fn urn(&self) -> &Urn {
        self.resource.urn()
    }

    /// The identifier of the referenced stack.
    #[must_use]
    pub fn id(&self) -> &Output<ResourceId> {
        self.resource.id()
    }

    /// The fully qualified name of the referenced stack.
    #[must_use]
    pub fn name(&self) -> &Output<String> {
        &self.name
    }

    /// Every output the referenced stack exported.
    #[must_use]
    pub fn outputs(&self) -> &Output<PropertyBag> {
        &self.outputs
    }

    /// Returns the named output; a missing output is `null`.
    pub fn get_output(&self, key: impl Into<Output<String>>) -> Output<Value> {
        self.outputs.lookup(key)
    }

    /// Returns the named output as a string; a missing output is `""`.
    pub fn get_string_output(&self, key: impl Into<Output<String>>) -> Output<String> {
        self.get_output(key).as_string()
    }

    /// Returns the named output as a resource identifier.
    pub fn get_id_output(&self, key: impl Into<Output<String>>) -> Output<ResourceId> {
        self.get_output(key).as_id()
    }

    /// Returns the named output as a number.
    pub fn get_f64_output(&self, key: impl Into<Output<String>>) -> Output<f64> {
        self.get_output(key).as_f64()
    }

    /// Returns the named output as an integer, truncating fractions.
    pub fn get_int_output(&self, key: impl Into<Output<String>>) -> Output<i64> {
        self.get_output(key).as_i64()
    }

    /// Returns the named output as a boolean.
    pub fn get_bool_output(&self, key: impl Into<Output<String>>) -> Output<bool> {
        self.get_output(key).as_bool()
    }
}

//! The [`Engine`] trait and the read-resource exchange.
//!
//! The provisioning engine owns durable resource state. Programs reach it
//! through a single request/response pair: given a type token, a logical
//! name and an identifier, the engine returns the resource's current
//! properties.
//!
//! Retries, authentication and connection management belong to the
//! transport implementing [`Engine`], not to the resolution layer.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strata_output::{PropertyBag, ResourceId, Urn};

use crate::options::ResourceOptions;

/// Request to read the state of an externally managed resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadResourceRequest {
    /// Type token identifying the resource kind.
    pub type_token: String,
    /// Logical name of the resource in the requesting program.
    pub name: String,
    /// Identifier of the resource to read.
    pub id: ResourceId,
    /// URN the resource is registered under.
    pub urn: Urn,
    /// Options passed through to the engine.
    #[serde(default)]
    pub options: ResourceOptions,
}

/// Resolved state reported by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadResourceResponse {
    /// Identifier the engine resolved the resource to.
    pub id: ResourceId,
    /// Current properties of the resource.
    #[serde(default)]
    pub properties: PropertyBag,
}

/// Errors reported by an [`Engine`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// The engine has no resource with this identifier.
    #[error("resource '{id}' of type '{type_token}' not found")]
    NotFound {
        /// The requested type token.
        type_token: String,
        /// The requested identifier.
        id: String,
    },

    /// The engine could not be reached.
    #[error("engine unavailable: {0}")]
    Unavailable(String),

    /// The engine replied with a body that could not be decoded.
    #[error("invalid engine response: {0}")]
    InvalidResponse(String),

    /// The engine reported an internal failure.
    #[error("engine error (status {status}): {message}")]
    Internal {
        /// Status code reported by the engine.
        status: u16,
        /// Error message.
        message: String,
    },
}

/// Trait implemented by provisioning engine transports.
///
/// Implementations must be cheap to share; the resolution client holds
/// one behind an `Arc` and may issue requests from many tasks.
#[async_trait]
pub trait Engine: Send + Sync + 'static {
    /// Reads the current state of a resource.
    ///
    /// # Arguments
    ///
    /// * `request` - The type token, name, identifier and options of the resource
    async fn read_resource(
        &self,
        request: ReadResourceRequest,
    ) -> Result<ReadResourceResponse, EngineError>;
}

//! Resource options.

use serde::{Deserialize, Serialize};
use strata_output::{Dependencies, Urn};

/// Options scoping a resource within the program graph.
///
/// Opaque to resolution; they are validated and then forwarded to the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResourceOptions {
    /// Parent resource the new resource is scoped under.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<Urn>,

    /// Resources that must be registered before this one.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<Urn>,

    /// Provider the engine should use to read the resource.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    /// Provider version constraint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl ResourceOptions {
    /// Creates empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scopes the resource under a parent.
    #[must_use]
    pub fn with_parent(mut self, parent: Urn) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Adds an explicit dependency.
    #[must_use]
    pub fn depends_on(mut self, urn: Urn) -> Self {
        self.depends_on.push(urn);
        self
    }

    /// Selects the provider.
    #[must_use]
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Pins the provider version.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Returns the explicit dependencies, including the parent.
    #[must_use]
    pub fn dependencies(&self) -> Dependencies {
        self.parent
            .iter()
            .chain(&self.depends_on)
            .cloned()
            .collect()
    }
}

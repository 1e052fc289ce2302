//! Resource identifiers and dependency sets.

use core::fmt;
use std::sync::Arc;

use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

/// Uniform resource name identifying a resource within a program.
///
/// Format: `urn:strata:{stack}::{project}::{type}::{name}`.
///
/// Internally uses `Arc<str>` for cheap cloning (reference count bump only).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Urn(Arc<str>);

impl Urn {
    /// Builds a URN from its components.
    #[must_use]
    pub fn new(stack: &str, project: &str, type_token: &str, name: &str) -> Self {
        Self(format!("urn:strata:{stack}::{project}::{type_token}::{name}").into())
    }

    /// Creates a URN from a raw string value.
    #[must_use]
    pub fn from_string(urn: impl Into<Arc<str>>) -> Self {
        Self(urn.into())
    }

    /// Returns the URN as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the logical name segment.
    #[must_use]
    pub fn name(&self) -> &str {
        self.0
            .rsplit_once("::")
            .map_or(self.as_str(), |(_, name)| name)
    }

    /// Returns the type token segment, if the URN is well formed.
    #[must_use]
    pub fn type_token(&self) -> Option<&str> {
        let (rest, _) = self.0.rsplit_once("::")?;
        rest.rsplit_once("::").map(|(_, ty)| ty)
    }
}

impl fmt::Display for Urn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Provider-assigned identifier of a resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(Arc<str>);

impl ResourceId {
    /// Creates a new identifier.
    #[must_use]
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the identifier is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for ResourceId {
    fn from(id: String) -> Self {
        Self(id.into())
    }
}

impl From<&str> for ResourceId {
    fn from(id: &str) -> Self {
        Self(id.into())
    }
}

/// Set of resources an output depends on.
///
/// Tracks the dependency graph only; evaluation order is driven by the
/// output futures themselves. Cloning shares the underlying set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dependencies(Arc<HashSet<Urn>>);

impl Dependencies {
    /// Creates an empty dependency set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a set containing a single resource.
    #[must_use]
    pub fn single(urn: Urn) -> Self {
        let mut set = HashSet::with_capacity(1);
        set.insert(urn);
        Self(Arc::new(set))
    }

    /// Returns the union of both sets.
    ///
    /// Shares storage when either side is empty or both are the same set.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        if other.is_empty() || Arc::ptr_eq(&self.0, &other.0) {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }
        let mut merged = HashSet::with_capacity(self.len() + other.len());
        merged.extend(self.0.iter().cloned());
        merged.extend(other.0.iter().cloned());
        Self(Arc::new(merged))
    }

    /// Returns `true` if the set contains the given resource.
    #[must_use]
    pub fn contains(&self, urn: &Urn) -> bool {
        self.0.contains(urn)
    }

    /// Number of resources in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the resources in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &Urn> {
        self.0.iter()
    }

    /// Returns the resources sorted, for stable display and comparisons.
    #[must_use]
    pub fn to_sorted_vec(&self) -> Vec<Urn> {
        let mut urns: Vec<Urn> = self.0.iter().cloned().collect();
        urns.sort();
        urns
    }
}

impl FromIterator<Urn> for Dependencies {
    fn from_iter<I: IntoIterator<Item = Urn>>(iter: I) -> Self {
        Self(Arc::new(iter.into_iter().collect()))
    }
}

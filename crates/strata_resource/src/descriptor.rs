//! Resource descriptors.

use core::fmt;

use strata_output::{Context, Output, OutputState, ResourceId};

use crate::error::ResolveError;
use crate::options::ResourceOptions;

/// Caller-supplied description of a resource to resolve.
///
/// A descriptor names the resource kind, its logical name, the identifier
/// to read and the options scoping it. It is submitted once to a
/// [`ResourceClient`](crate::ResourceClient).
#[derive(Clone)]
pub struct ResourceDescriptor {
    type_token: String,
    name: String,
    input: Option<Output<String>>,
    options: ResourceOptions,
}

impl ResourceDescriptor {
    /// Creates a descriptor with no explicit identifier.
    ///
    /// Without an identifier the logical name is used.
    #[must_use]
    pub fn new(type_token: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            type_token: type_token.into(),
            name: name.into(),
            input: None,
            options: ResourceOptions::default(),
        }
    }

    /// Sets the identifier to resolve; it may come from another resource.
    #[must_use]
    pub fn with_input(mut self, input: impl Into<Output<String>>) -> Self {
        self.input = Some(input.into());
        self
    }

    /// Sets the resource options.
    #[must_use]
    pub fn with_options(mut self, options: ResourceOptions) -> Self {
        self.options = options;
        self
    }

    /// The type token.
    #[must_use]
    pub fn type_token(&self) -> &str {
        &self.type_token
    }

    /// The logical name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The explicit identifier, if any.
    #[must_use]
    pub fn input(&self) -> Option<&Output<String>> {
        self.input.as_ref()
    }

    /// The resource options.
    #[must_use]
    pub fn options(&self) -> &ResourceOptions {
        &self.options
    }

    /// Checks the required fields without contacting the engine.
    ///
    /// # Errors
    ///
    /// Returns [`ResolveError::Validation`] if the name is empty, the type
    /// token is not of the form `package:module:Type`, or the parent is not
    /// registered in the context.
    pub fn validate(&self, ctx: &Context) -> Result<(), ResolveError> {
        if self.name.trim().is_empty() {
            return Err(ResolveError::Validation(
                "resource name must not be empty".to_string(),
            ));
        }

        let segments: Vec<&str> = self.type_token.split(':').collect();
        if segments.len() != 3 || segments.iter().any(|s| s.is_empty()) {
            return Err(ResolveError::Validation(format!(
                "type token '{}' must have the form 'package:module:Type'",
                self.type_token
            )));
        }

        if let Some(parent) = &self.options.parent
            && !ctx.contains_resource(parent)
        {
            return Err(ResolveError::Validation(format!(
                "parent '{parent}' is not registered"
            )));
        }

        Ok(())
    }

    /// Returns `true` if both descriptors request the same read.
    ///
    /// Identifiers match when they are the same output or both already hold
    /// the same value.
    pub(crate) fn same_read(&self, other: &Self) -> bool {
        if self.type_token != other.type_token
            || self.name != other.name
            || self.options != other.options
        {
            return false;
        }
        match (&self.input, &other.input) {
            (None, None) => true,
            (Some(a), Some(b)) => {
                a.ptr_eq(b)
                    || matches!(
                        (a.peek(), b.peek()),
                        (Some(OutputState::Known(a)), Some(OutputState::Known(b))) if a == b
                    )
            }
            _ => false,
        }
    }

    /// Builds the identifier output sent to the engine.
    ///
    /// A missing or empty identifier defaults to the logical name. The
    /// default is applied through the output pipeline, so it keeps the
    /// input's dependencies and failure state.
    pub(crate) fn identifier(&self, ctx: &Context) -> Output<ResourceId> {
        let input = self
            .input
            .clone()
            .unwrap_or_else(|| ctx.known(String::new()));
        let name = self.name.clone();

        input
            .apply(move |id| if id.is_empty() { name } else { id })
            .apply(ResourceId::from)
    }
}

impl fmt::Debug for ResourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceDescriptor")
            .field("type_token", &self.type_token)
            .field("name", &self.name)
            .field("input", &self.input)
            .field("options", &self.options)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_output::Urn;

    fn ctx() -> Context {
        Context::new("app", "dev")
    }

    #[test]
    fn rejects_empty_name() {
        let descriptor = ResourceDescriptor::new("pkg:mod:Type", " ");
        assert!(matches!(
            descriptor.validate(&ctx()),
            Err(ResolveError::Validation(_))
        ));
    }

    #[test]
    fn rejects_malformed_type_token() {
        for token in ["", "pkg", "pkg:mod", "pkg::Type", "a:b:c:d"] {
            let descriptor = ResourceDescriptor::new(token, "name");
            assert!(
                descriptor.validate(&ctx()).is_err(),
                "token {token:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_unregistered_parent() {
        let parent = Urn::from_string("urn:strata:dev::app::pkg:mod:Group::g");
        let descriptor = ResourceDescriptor::new("pkg:mod:Type", "name")
            .with_options(ResourceOptions::new().with_parent(parent));
        assert!(descriptor.validate(&ctx()).is_err());
    }

    #[tokio::test]
    async fn identifier_defaults_to_name() {
        let ctx = ctx();
        let descriptor = ResourceDescriptor::new("pkg:mod:Type", "infra/prod/web");

        let OutputState::Known(id) = descriptor.identifier(&ctx).state().await else {
            panic!("expected known identifier");
        };
        assert_eq!(id.as_str(), "infra/prod/web");
    }

    #[tokio::test]
    async fn empty_input_defaults_to_name() {
        let ctx = ctx();
        let descriptor = ResourceDescriptor::new("pkg:mod:Type", "web").with_input("");

        let OutputState::Known(id) = descriptor.identifier(&ctx).state().await else {
            panic!("expected known identifier");
        };
        assert_eq!(id.as_str(), "web");
    }

    #[tokio::test]
    async fn explicit_input_wins() {
        let ctx = ctx();
        let descriptor = ResourceDescriptor::new("pkg:mod:Type", "web").with_input("org/prod");

        let OutputState::Known(id) = descriptor.identifier(&ctx).state().await else {
            panic!("expected known identifier");
        };
        assert_eq!(id.as_str(), "org/prod");
    }

    #[test]
    fn same_read_compares_identifiers() {
        let base = ResourceDescriptor::new("pkg:mod:Type", "web");
        assert!(base.same_read(&ResourceDescriptor::new("pkg:mod:Type", "web")));
        assert!(
            base.clone()
                .with_input("org/a")
                .same_read(&base.clone().with_input("org/a"))
        );
        assert!(
            !base
                .clone()
                .with_input("org/a")
                .same_read(&base.clone().with_input("org/b"))
        );
        assert!(!base.same_read(&base.clone().with_input("org/a")));
    }

    #[test]
    fn same_read_shares_one_pending_identifier() {
        let pending = Output::<String>::from_future(core::future::pending());
        let descriptor = ResourceDescriptor::new("pkg:mod:Type", "web").with_input(pending);

        assert!(descriptor.same_read(&descriptor.clone()));
        assert!(!descriptor.same_read(
            &ResourceDescriptor::new("pkg:mod:Type", "web")
                .with_input(Output::<String>::from_future(core::future::pending()))
        ));
    }

    #[test]
    fn same_read_compares_options() {
        let base = ResourceDescriptor::new("pkg:mod:Type", "web");
        let versioned = base
            .clone()
            .with_options(ResourceOptions::new().with_version("2.0.0"));
        assert!(!base.same_read(&versioned));
    }
}

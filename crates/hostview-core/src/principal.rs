//! Authenticated identity of the caller

use std::fmt;

/// Identity attached to a request by the host or by upstream authentication.
///
/// The view never caches the principal; every
/// [`ServerRequest::principal`](crate::ServerRequest::principal) call reads the
/// environment again, so middleware that swaps the principal mid-request is
/// seen immediately.
pub trait Principal: fmt::Debug + Send + Sync {
    /// Name of the identity, if it has one
    fn name(&self) -> Option<&str>;

    /// Scheme that authenticated the identity (`Bearer`, `Basic`, ...)
    fn authentication_type(&self) -> Option<&str> {
        None
    }

    /// Whether the identity was authenticated
    fn is_authenticated(&self) -> bool {
        self.name().is_some()
    }

    /// Whether the identity belongs to `role`
    fn is_in_role(&self, role: &str) -> bool;
}

/// A plain name-plus-roles principal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericPrincipal {
    name: String,
    authentication_type: Option<String>,
    roles: Vec<String>,
}

impl GenericPrincipal {
    /// Create an authenticated principal with no roles
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            authentication_type: None,
            roles: Vec::new(),
        }
    }

    /// Record the authentication scheme
    pub fn authenticated_by(mut self, scheme: impl Into<String>) -> Self {
        self.authentication_type = Some(scheme.into());
        self
    }

    /// Add a role
    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    /// Roles in the order they were added
    pub fn roles(&self) -> &[String] {
        &self.roles
    }
}

impl Principal for GenericPrincipal {
    fn name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn authentication_type(&self) -> Option<&str> {
        self.authentication_type.as_deref()
    }

    fn is_in_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }
}

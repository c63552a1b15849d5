//! Access policies applied to verified grants

use thiserror::Error;

use crate::scope::{Scope, Scopes};

/// An access policy
///
/// Evaluates a request and either allows it or explains why it was denied.
pub trait Policy {
    /// The request type evaluated by this policy
    type Request: ?Sized;

    /// The denial returned when a request is not permitted
    type Denial;

    /// Evaluates the request, returning `Ok` if it is allowed
    ///
    /// # Errors
    ///
    /// Returns the policy's denial if the request is not allowed.
    fn evaluate(&self, request: &Self::Request) -> Result<(), Self::Denial>;
}

/// Indicates the grant held insufficient scope to be granted access
/// to a controlled resource
#[derive(Clone, Debug, Hash, Eq, PartialEq, Error)]
#[error("missing required scope: {missing}")]
pub struct InsufficientScope {
    missing: Scope,
}

impl InsufficientScope {
    /// The first required scope that the grant did not hold
    #[must_use]
    pub fn missing(&self) -> &Scope {
        &self.missing
    }
}

/// A policy requiring that every listed scope be held
///
/// An empty requirement allows every request. Otherwise requirements are
/// checked in the order they were added and the first one missing is
/// reported.
///
/// ```
/// use grantex::{Policy, RequiredScopes, Scope, Scopes};
///
/// let policy = RequiredScopes::from_iter([Scope::from_static("read:email")]);
///
/// let held: Scopes = [Scope::from_static("read:email")].into_iter().collect();
/// assert!(policy.evaluate(&held).is_ok());
///
/// let denial = policy.evaluate(&Scopes::new()).unwrap_err();
/// assert_eq!(denial.to_string(), "missing required scope: read:email");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[must_use]
pub struct RequiredScopes(Vec<Scope>);

impl RequiredScopes {
    /// A policy that requires nothing
    #[inline]
    pub const fn none() -> Self {
        Self(Vec::new())
    }

    /// Adds a required scope
    pub fn require(self, scope: Scope) -> Self {
        let mut this = self;
        this.0.push(scope);
        this
    }

    /// Whether this policy requires no scopes at all
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the required scopes in order
    pub fn iter(&self) -> impl Iterator<Item = &Scope> {
        self.0.iter()
    }
}

impl Extend<Scope> for RequiredScopes {
    #[inline]
    fn extend<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = Scope>,
    {
        self.0.extend(iter);
    }
}

impl FromIterator<Scope> for RequiredScopes {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Scope>,
    {
        Self(iter.into_iter().collect())
    }
}

impl Policy for RequiredScopes {
    type Request = Scopes;
    type Denial = InsufficientScope;

    fn evaluate(&self, held: &Self::Request) -> Result<(), Self::Denial> {
        match self.0.iter().find(|req| !held.contains(req)) {
            Some(missing) => Err(InsufficientScope {
                missing: missing.clone(),
            }),
            None => Ok(()),
        }
    }
}

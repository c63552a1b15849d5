//! Verification settings

use std::time::Duration;

use grantex_jose::jwt::Audience;
use tokio_util::sync::CancellationToken;

use crate::{policy::RequiredScopes, scope::Scope};

/// Per-call settings for verifying a grant token
///
/// ```
/// use std::time::Duration;
/// use grantex::{Scope, VerifyOptions};
///
/// let options = VerifyOptions::new("https://api.grantex.dev/.well-known/jwks.json")
///     .require_scope(Scope::from_static("read:email"))
///     .with_audience("https://my-service.example")
///     .with_clock_tolerance(Duration::from_secs(30));
///
/// assert_eq!(options.clock_tolerance(), Duration::from_secs(30));
/// ```
#[derive(Clone, Debug)]
#[must_use]
pub struct VerifyOptions {
    jwks_uri: String,
    required_scopes: RequiredScopes,
    audience: Option<Audience>,
    clock_tolerance: Duration,
    cancellation: Option<CancellationToken>,
}

impl VerifyOptions {
    /// Verifies against the key set published at `jwks_uri`
    ///
    /// No scopes are required, the audience is not checked, and no clock
    /// tolerance is allowed.
    pub fn new(jwks_uri: impl Into<String>) -> Self {
        Self {
            jwks_uri: jwks_uri.into(),
            required_scopes: RequiredScopes::none(),
            audience: None,
            clock_tolerance: Duration::ZERO,
            cancellation: None,
        }
    }

    /// Requires that the grant hold `scope`
    pub fn require_scope(self, scope: Scope) -> Self {
        Self {
            required_scopes: self.required_scopes.require(scope),
            ..self
        }
    }

    /// Requires that the grant hold every scope in `scopes`
    pub fn require_scopes<I>(self, scopes: I) -> Self
    where
        I: IntoIterator<Item = Scope>,
    {
        let mut this = self;
        this.required_scopes.extend(scopes);
        this
    }

    /// Requires that the token audience include `audience`
    ///
    /// An empty audience disables the check.
    pub fn with_audience(self, audience: impl Into<String>) -> Self {
        let audience = audience.into();
        Self {
            audience: (!audience.is_empty()).then(|| Audience::new(audience)),
            ..self
        }
    }

    /// Allows for clock skew when checking expiry
    pub fn with_clock_tolerance(self, tolerance: Duration) -> Self {
        Self {
            clock_tolerance: tolerance,
            ..self
        }
    }

    /// Abandons the key set fetch when `token` is cancelled
    pub fn with_cancellation(self, token: CancellationToken) -> Self {
        Self {
            cancellation: Some(token),
            ..self
        }
    }

    /// The location of the key set
    #[must_use]
    pub fn jwks_uri(&self) -> &str {
        &self.jwks_uri
    }

    /// The scopes the grant must hold
    pub fn required_scopes(&self) -> &RequiredScopes {
        &self.required_scopes
    }

    /// The audience the token must name, if checked
    #[must_use]
    pub fn audience(&self) -> Option<&Audience> {
        self.audience.as_ref()
    }

    /// The permitted clock skew
    #[must_use]
    pub fn clock_tolerance(&self) -> Duration {
        self.clock_tolerance
    }

    /// The cancellation token, if any
    #[must_use]
    pub fn cancellation(&self) -> Option<&CancellationToken> {
        self.cancellation.as_ref()
    }
}

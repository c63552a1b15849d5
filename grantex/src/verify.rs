//! Offline verification of grant tokens

use grantex_jose::{
    clock::{Clock, System},
    error::JwtVerifyError,
    jwa,
    jwt::{self, CoreHeaders},
    JwtRef,
};

use crate::{
    error::VerifyError,
    fetch::KeySetFetcher,
    grant::{GrantClaims, VerifiedGrant},
    options::VerifyOptions,
    policy::Policy,
    resolver::KeySetResolver,
};

/// Verifies grant tokens against key sets obtained through a fetcher
///
/// Each verification fetches the key set once, selects the key named by the
/// token's `kid`, verifies an RS256 signature, checks expiry and (when
/// configured) audience, then checks the required scopes. Nothing is cached
/// between calls unless the fetcher itself caches.
#[derive(Clone, Debug)]
pub struct GrantVerifier<F> {
    resolver: KeySetResolver<F>,
}

impl<F> GrantVerifier<F>
where
    F: KeySetFetcher,
{
    /// Constructs a verifier that obtains key sets through `fetcher`
    pub fn new(fetcher: F) -> Self {
        Self {
            resolver: KeySetResolver::new(fetcher),
        }
    }

    /// Verifies `token` using the system clock
    ///
    /// # Errors
    ///
    /// Returns an error describing why the token was rejected.
    pub async fn verify(
        &self,
        token: &JwtRef,
        options: &VerifyOptions,
    ) -> Result<VerifiedGrant, VerifyError> {
        self.verify_with_clock(token, options, &System).await
    }

    /// Verifies `token`, taking the current time from `clock`
    ///
    /// # Errors
    ///
    /// Returns an error describing why the token was rejected.
    pub async fn verify_with_clock<K>(
        &self,
        token: &JwtRef,
        options: &VerifyOptions,
        clock: &K,
    ) -> Result<VerifiedGrant, VerifyError>
    where
        K: Clock + ?Sized,
    {
        if options.jwks_uri().is_empty() {
            return Err(VerifyError::MissingKeySetLocation);
        }

        let jwks = self
            .resolver
            .resolve(options.jwks_uri(), options.cancellation())
            .await?;

        let decomposed: jwt::Decomposed = token.decompose()?;
        let kid = decomposed.kid().ok_or(VerifyError::MissingKeyId)?;
        let key = jwks
            .get_key_by_id(kid)
            .ok_or_else(|| VerifyError::UnknownKeyId {
                kid: kid.to_owned(),
            })?;

        let validated: jwt::Validated<GrantClaims> =
            decomposed.verify_with_clock(key, &validator(options), clock)?;
        let (_, claims) = validated.extract();

        options.required_scopes().evaluate(claims.scopes())?;

        Ok(VerifiedGrant::from(claims))
    }
}

fn validator(options: &VerifyOptions) -> jwt::CoreValidator {
    let validator = jwt::CoreValidator::default()
        .add_approved_algorithm(jwa::Algorithm::RS256)
        .with_leeway(options.clock_tolerance());

    match options.audience() {
        Some(aud) => validator.require_audience(aud.clone()),
        None => validator,
    }
}

/// Verifies `token` against the key set at the configured location, fetched
/// over HTTP
///
/// ```no_run
/// use grantex::{verify_grant_token, Scope, VerifyOptions};
/// use grantex_jose::JwtRef;
///
/// # async fn check(token: &str) -> Result<(), grantex::VerifyError> {
/// let options = VerifyOptions::new("https://api.grantex.dev/.well-known/jwks.json")
///     .require_scope(Scope::from_static("read:email"));
///
/// let grant = verify_grant_token(JwtRef::from_str(token), &options).await?;
/// println!("{} acting for {}", grant.agent_did(), grant.principal_id());
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// Returns an error describing why the token was rejected. A failure to
/// build the HTTP client is reported as a key set failure.
#[cfg(feature = "reqwest")]
#[cfg_attr(docsrs, doc(cfg(feature = "reqwest")))]
pub async fn verify_grant_token(
    token: &JwtRef,
    options: &VerifyOptions,
) -> Result<VerifiedGrant, VerifyError> {
    if options.jwks_uri().is_empty() {
        return Err(VerifyError::MissingKeySetLocation);
    }

    let fetcher = crate::fetch::ReqwestFetcher::new()
        .map_err(|err| VerifyError::KeySet(crate::error::KeySetError::fetch(err)))?;

    GrantVerifier::new(fetcher).verify(token, options).await
}

/// Decodes a grant token's claims without verifying it
///
/// **WARNING:** *Neither the signature nor any claim is checked.* Only use
/// this for a token whose authenticity has already been established, for
/// example one just returned by the Grantex API.
///
/// # Errors
///
/// Returns an error if the token is not a well-formed JWT or its payload is
/// not a JSON object of grant claims.
pub fn decode_grant_token_unverified(token: &JwtRef) -> Result<VerifiedGrant, JwtVerifyError> {
    let decomposed: jwt::Decomposed = token.decompose()?;
    let claims: GrantClaims = decomposed.untrusted_claims()?;
    Ok(VerifiedGrant::from(claims))
}

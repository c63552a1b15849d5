//! Local trust primitives for Grantex delegated authorization
//!
//! Agents act for principals under scoped, time-bound grants, each carried
//! as an RS256-signed JWT. This crate makes the security decisions that can
//! be made without calling the Grantex API:
//!
//! * [`verify_grant_token`] / [`GrantVerifier`]: offline grant token
//!   verification against a remote JSON Web Key Set
//! * [`webhook`]: HMAC-SHA256 authentication of webhook deliveries
//! * [`pkce`]: S256 code verifier and challenge generation
//!
//! # Example
//!
//! ```no_run
//! use grantex::{GrantVerifier, ReqwestFetcher, Scope, VerifyOptions};
//! use grantex_jose::JwtRef;
//!
//! # async fn run(token: &str) -> Result<(), Box<dyn std::error::Error>> {
//! let verifier = GrantVerifier::new(ReqwestFetcher::new()?);
//! let options = VerifyOptions::new("https://api.grantex.dev/.well-known/jwks.json")
//!     .require_scope(Scope::from_static("calendar:read"));
//!
//! match verifier.verify(JwtRef::from_str(token), &options).await {
//!     Ok(grant) => println!("grant {} for {}", grant.grant_id(), grant.principal_id()),
//!     Err(err) if err.is_expired() => println!("ask the agent to refresh its token"),
//!     Err(err) => return Err(err.into()),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Feature flags
//!
//! The `reqwest` feature (on by default) provides [`ReqwestFetcher`] and
//! [`verify_grant_token`]. This crate does not enable TLS support in
//! `reqwest` itself; enable `default-tls` or `rustls-tls` if nothing else in
//! your application does. The `tokio` feature (on by default) lets a
//! [`CachedKeySet`] refresh itself in the background.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_must_use
)]

pub mod error;
pub mod fetch;
mod grant;
mod options;
pub mod pkce;
mod policy;
mod resolver;
pub mod scope;
mod verify;
pub mod webhook;

pub use error::{KeySetError, VerifyError};
#[cfg(feature = "reqwest")]
pub use fetch::ReqwestFetcher;
pub use fetch::{CachedKeySet, KeySetFetcher, StaticKeySet};
pub use grant::{GrantClaims, InvalidClaim, VerifiedGrant};
pub use options::VerifyOptions;
pub use pkce::PkceChallenge;
pub use policy::{InsufficientScope, Policy, RequiredScopes};
pub use resolver::KeySetResolver;
pub use scope::{Scope, ScopeRef, Scopes};
#[cfg(feature = "reqwest")]
pub use verify::verify_grant_token;
pub use verify::{decode_grant_token_unverified, GrantVerifier};
pub use webhook::{verify_webhook_signature, SIGNATURE_HEADER};

//! The subset of the Javascript/JSON Object Signing and Encryption (JOSE)
//! standards needed to verify signed grant tokens:
//!
//! * JSON Web Signature (JWS): [RFC7515][]
//! * JSON Web Key (JWK): [RFC7517][]
//! * JSON Web Algorithms (JWA): [RFC7518][]
//! * JSON Web Token (JWT): [RFC7519][]
//!
//! Only verification is supported, and only with RSA public keys. Token
//! issuance and JSON Web Encryption (JWE) are out of scope.
//!
//! [RFC7515]: https://tools.ietf.org/html/rfc7515
//! [RFC7517]: https://tools.ietf.org/html/rfc7517
//! [RFC7518]: https://tools.ietf.org/html/rfc7518
//! [RFC7519]: https://tools.ietf.org/html/rfc7519
//!
//! # Example
//!
//! ```
//! use grantex_jose::{jwa, jwt, jwt::CoreHeaders, Jwks, JwtRef};
//! # use grantex_jose::jwt::Decomposed;
//! # fn check(token: &JwtRef, jwks: &Jwks) -> Result<(), Box<dyn std::error::Error>> {
//!
//! let validator = jwt::CoreValidator::default()
//!     .add_approved_algorithm(jwa::Algorithm::RS256)
//!     .with_leeway_secs(5)
//!     .require_audience(jwt::Audience::from_static("my_api"));
//!
//! let decomposed: Decomposed = token.decompose()?;
//! let kid = decomposed.kid().ok_or("token has no key id")?;
//! let key = jwks.get_key_by_id(kid).ok_or("unknown key id")?;
//!
//! let data: jwt::Validated = decomposed.verify(key, &validator)?;
//! # let _ = data;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_must_use
)]

pub mod base64url;
pub mod clock;
pub mod error;
pub mod jwa;
pub mod jwk;
mod jwks;
pub mod jws;
pub mod jwt;

#[cfg(any(test, feature = "test-util"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-util")))]
pub mod test_util;

#[doc(inline)]
pub use jwk::Jwk;
#[doc(inline)]
pub use jwks::Jwks;
#[doc(inline)]
pub use jwt::{Jwt, JwtRef};

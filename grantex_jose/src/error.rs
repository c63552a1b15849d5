//! Common errors

#![allow(missing_copy_implementations)]

use std::error::Error as StdError;

use thiserror::Error;

use crate::jwa;

/// The JWK cannot be used with the requested algorithm
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("key incompatible with algorithm '{alg}'")]
pub struct IncompatibleAlgorithm {
    alg: jwa::Algorithm,
}

impl IncompatibleAlgorithm {
    /// The algorithm that the key refused
    #[must_use]
    pub fn algorithm(&self) -> jwa::Algorithm {
        self.alg
    }
}

#[inline]
pub(crate) fn incompatible_algorithm(alg: jwa::Algorithm) -> IncompatibleAlgorithm {
    IncompatibleAlgorithm { alg }
}

/// The provided name could not be matched with a registered algorithm
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("'{alg}' does not match any registered algorithm")]
pub struct UnknownAlgorithm {
    alg: String,
}

#[inline]
pub(crate) fn unknown_algorithm(alg: String) -> UnknownAlgorithm {
    UnknownAlgorithm { alg }
}

/// The token names an algorithm that the validator does not approve
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("algorithm '{alg}' is not permitted")]
pub struct UnsupportedAlgorithm {
    alg: String,
}

impl UnsupportedAlgorithm {
    /// The algorithm name, as it appeared in the token header
    #[must_use]
    pub fn name(&self) -> &str {
        &self.alg
    }
}

#[inline]
pub(crate) fn unsupported_algorithm(alg: impl Into<String>) -> UnsupportedAlgorithm {
    UnsupportedAlgorithm { alg: alg.into() }
}

/// The JWK has a specific usage that disallows this use
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("JWK cannot be used in this way")]
pub struct JwkUsageMismatch {
    _p: (),
}

pub(crate) const fn jwk_usage_mismatch() -> JwkUsageMismatch {
    JwkUsageMismatch { _p: () }
}

/// The JWT is malformed and cannot be parsed out into header, payload, and signature sections
#[derive(Clone, Copy, Debug, Error)]
#[error("malformed JWT")]
pub struct MalformedJwt {
    _p: (),
}

pub(crate) fn malformed_jwt() -> MalformedJwt {
    MalformedJwt { _p: () }
}

/// The JWT header section is malformed
#[derive(Debug, Error)]
#[error("malformed JWT header")]
pub struct MalformedJwtHeader {
    #[from]
    source: Box<dyn StdError + Send + Sync + 'static>,
}

pub(crate) fn malformed_jwt_header(
    source: impl Into<Box<dyn StdError + Send + Sync + 'static>>,
) -> MalformedJwtHeader {
    MalformedJwtHeader {
        source: source.into(),
    }
}

/// The JWT payload section is malformed
#[derive(Debug, Error)]
#[error("malformed JWT payload")]
pub struct MalformedJwtPayload {
    #[from]
    source: Box<dyn StdError + Send + Sync + 'static>,
}

pub(crate) fn malformed_jwt_payload(
    source: impl Into<Box<dyn StdError + Send + Sync + 'static>>,
) -> MalformedJwtPayload {
    MalformedJwtPayload {
        source: source.into(),
    }
}

/// The JWT signature section is malformed
#[derive(Debug, Error)]
#[error("malformed JWT signature")]
pub struct MalformedJwtSignature {
    #[from]
    source: Box<dyn StdError + Send + Sync + 'static>,
}

pub(crate) fn malformed_jwt_signature(
    source: impl Into<Box<dyn StdError + Send + Sync + 'static>>,
) -> MalformedJwtSignature {
    MalformedJwtSignature {
        source: source.into(),
    }
}

/// The signature did not match
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Error)]
#[error("signature mismatch")]
pub struct SignatureMismatch {
    _p: (),
}

pub(crate) const fn signature_mismatch() -> SignatureMismatch {
    SignatureMismatch { _p: () }
}

/// The key material was rejected
#[derive(Debug, Error)]
#[error("key rejected")]
pub struct KeyRejected {
    #[from]
    source: Box<dyn StdError + Send + Sync + 'static>,
}

pub(crate) fn key_rejected(
    source: impl Into<Box<dyn StdError + Send + Sync + 'static>>,
) -> KeyRejected {
    KeyRejected {
        source: source.into(),
    }
}

/// An error occurring while verifying a signature with a JWK
#[derive(Debug, Error)]
pub enum JwkVerifyError {
    /// JWT cannot be used with this algorithm
    #[error(transparent)]
    IncompatibleAlgorithm(#[from] IncompatibleAlgorithm),

    /// JWK cannot be used for signature verification
    #[error(transparent)]
    JwkUsageMismatch(#[from] JwkUsageMismatch),

    /// Signature is invalid
    #[error(transparent)]
    SignatureMismatch(#[from] SignatureMismatch),
}

impl JwkVerifyError {
    /// Whether the error is due to an incompatible algorithm
    #[must_use]
    pub fn is_incompatible_alg(&self) -> bool {
        matches!(self, Self::IncompatibleAlgorithm(_))
    }

    /// Whether the error is due to a usage mismatch
    #[must_use]
    pub fn is_usage_mismatch(&self) -> bool {
        matches!(self, Self::JwkUsageMismatch(_))
    }

    /// Whether the error is due to a signature mismatch
    #[must_use]
    pub fn is_signature_mismatch(&self) -> bool {
        matches!(self, Self::SignatureMismatch(_))
    }
}

/// An error occurring while verifying a JWT
#[derive(Debug, Error)]
pub enum JwtVerifyError {
    /// The JWT was rejected by the JWK
    #[error("token rejected by JWK")]
    JwkVerifyError(#[from] JwkVerifyError),

    /// The JWT is malformed, without a discernible header, payload, and signature
    #[error(transparent)]
    MalformedToken(#[from] MalformedJwt),

    /// The JWT header is malformed
    #[error(transparent)]
    MalformedTokenHeader(#[from] MalformedJwtHeader),

    /// The JWT payload is malformed
    #[error(transparent)]
    MalformedTokenPayload(#[from] MalformedJwtPayload),

    /// The JWT signature is malformed
    #[error(transparent)]
    MalformedTokenSignature(#[from] MalformedJwtSignature),

    /// The JWT header names an algorithm that is not approved
    #[error(transparent)]
    UnsupportedAlgorithm(#[from] UnsupportedAlgorithm),

    /// The JWT was rejected by the claims validator
    #[error(transparent)]
    ClaimsRejected(#[from] ClaimsRejected),
}

impl JwtVerifyError {
    /// Whether the token could not be taken apart or decoded
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::MalformedToken(_)
                | Self::MalformedTokenHeader(_)
                | Self::MalformedTokenPayload(_)
                | Self::MalformedTokenSignature(_)
        )
    }

    /// Whether the token named an algorithm outside of the approved set
    #[must_use]
    pub fn is_unsupported_algorithm(&self) -> bool {
        matches!(self, Self::UnsupportedAlgorithm(_))
    }

    /// Whether the signature failed to verify against the key
    #[must_use]
    pub fn is_signature_mismatch(&self) -> bool {
        matches!(self, Self::JwkVerifyError(e) if e.is_signature_mismatch())
    }

    /// Whether the token was rejected because it has expired
    #[must_use]
    pub fn is_expired(&self) -> bool {
        matches!(self, Self::ClaimsRejected(ClaimsRejected::TokenExpired))
    }

    /// Whether the token was rejected because its audience is absent or wrong
    #[must_use]
    pub fn is_audience_mismatch(&self) -> bool {
        matches!(
            self,
            Self::ClaimsRejected(ClaimsRejected::InvalidAudience { .. })
        )
    }
}

/// An error occurring when validating the claims of a JWT
#[derive(Debug, Error)]
pub enum ClaimsRejected {
    /// The token audience does not include the expected value
    #[error("token audience does not include '{expected}'")]
    InvalidAudience {
        /// The audience the validator required
        expected: String,
    },

    /// The token is expired according to the `exp` claim
    #[error("token expired")]
    TokenExpired,

    /// The token is not yet valid according to the `nbf` claim
    #[error("token not yet valid")]
    TokenNotYetValid,

    /// A required claim is missing
    #[error("required {_0} claim missing")]
    MissingRequiredClaim(&'static str),
}

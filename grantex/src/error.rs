//! Errors raised while verifying grant tokens

use std::error::Error as StdError;

use grantex_jose::{error::JwtVerifyError, jwk::KeyId};
use thiserror::Error;

use crate::{policy::InsufficientScope, scope::Scope};

/// A failure to obtain a usable key set
#[derive(Debug, Error)]
pub enum KeySetError {
    /// The key set could not be fetched
    #[error("key set fetch failed")]
    Fetch(#[source] Box<dyn StdError + Send + Sync + 'static>),

    /// The key set body was not a JSON object with a `keys` array
    #[error("key set is malformed")]
    Malformed(#[source] serde_json::Error),

    /// The fetch was cancelled before it completed
    #[error("key set fetch cancelled")]
    Cancelled,
}

impl KeySetError {
    pub(crate) fn fetch(source: impl Into<Box<dyn StdError + Send + Sync + 'static>>) -> Self {
        Self::Fetch(source.into())
    }
}

/// The reason a grant token was rejected
///
/// Every variant means the same thing to the caller: the grant must not be
/// trusted. The variants exist so that the reason can be reported and tested.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// No key set location was configured
    #[error("a key set location is required")]
    MissingKeySetLocation,

    /// The key set could not be fetched or parsed
    #[error("failed to fetch key set")]
    KeySet(#[source] KeySetError),

    /// Verification was cancelled while the key set was being fetched
    #[error("verification cancelled")]
    Cancelled,

    /// The token header carries no key identifier
    #[error("token header has no key id")]
    MissingKeyId,

    /// The token names a key that is not in the key set
    #[error("key '{kid}' not found in key set")]
    UnknownKeyId {
        /// The key identifier named by the token
        kid: KeyId,
    },

    /// The token is malformed, names a disallowed algorithm, carries a bad
    /// signature, or has claims that were rejected
    #[error(transparent)]
    Token(#[from] JwtVerifyError),

    /// The grant does not carry a required scope
    #[error(transparent)]
    Policy(#[from] InsufficientScope),
}

impl From<KeySetError> for VerifyError {
    fn from(err: KeySetError) -> Self {
        match err {
            KeySetError::Cancelled => Self::Cancelled,
            err => Self::KeySet(err),
        }
    }
}

impl VerifyError {
    /// Whether the verification was cancelled by the caller
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Whether the key set could not be retrieved
    #[must_use]
    pub fn is_key_set_failure(&self) -> bool {
        matches!(self, Self::KeySet(_))
    }

    /// Whether the token has expired
    #[must_use]
    pub fn is_expired(&self) -> bool {
        matches!(self, Self::Token(e) if e.is_expired())
    }

    /// Whether the signature did not verify against the selected key
    #[must_use]
    pub fn is_signature_mismatch(&self) -> bool {
        matches!(self, Self::Token(e) if e.is_signature_mismatch())
    }

    /// Whether the token header named an algorithm other than RS256
    #[must_use]
    pub fn is_unsupported_algorithm(&self) -> bool {
        matches!(self, Self::Token(e) if e.is_unsupported_algorithm())
    }

    /// Whether the token audience did not contain the expected audience
    #[must_use]
    pub fn is_audience_mismatch(&self) -> bool {
        matches!(self, Self::Token(e) if e.is_audience_mismatch())
    }

    /// Whether the token or its claims could not be decoded
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Token(e) if e.is_malformed())
    }

    /// Whether the token named a key that is not in the key set
    #[must_use]
    pub fn is_unknown_key_id(&self) -> bool {
        matches!(self, Self::UnknownKeyId { .. })
    }

    /// Whether the token header had no key identifier
    #[must_use]
    pub fn is_missing_key_id(&self) -> bool {
        matches!(self, Self::MissingKeyId)
    }

    /// Whether the grant lacked a required scope
    #[must_use]
    pub fn is_insufficient_scope(&self) -> bool {
        matches!(self, Self::Policy(_))
    }

    /// The required scope the grant was missing, if that is why it was
    /// rejected
    #[must_use]
    pub fn missing_scope(&self) -> Option<&Scope> {
        match self {
            Self::Policy(denial) => Some(denial.missing()),
            _ => None,
        }
    }
}

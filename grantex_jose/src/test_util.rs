//! Fixture keys and a token minter for exercising verification
//!
//! The RSA key pairs here are published test fixtures. Never trust tokens
//! signed with them outside of tests.

use std::{fmt, sync::Arc};

use ring::{
    rand::SystemRandom,
    signature::{self, RsaKeyPair},
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::{base64url::Base64Url, jwt::Jwt};

/// Key identifier of the primary fixture key
pub const TEST_KEY_ID: &str = "test-kid-1";

/// Key identifier of the secondary fixture key
pub const OTHER_KEY_ID: &str = "test-kid-2";

/// A key set holding the primary key only
pub const JWKS: &str = include_str!("../data/rsa/jwks.json");

/// A key set holding both the primary and secondary keys
pub const JWKS_BOTH: &str = include_str!("../data/rsa/jwks-both.json");

/// A key set in which the primary then the secondary key share one identifier
pub const JWKS_DUPLICATE_KID: &str = include_str!("../data/rsa/jwks-duplicate-kid.json");

/// The primary public key with only `kty`, `n`, and `e`
pub const JWK_MIN: &str = include_str!("../data/rsa/jwk-min.json");

/// A key set mixing EC, symmetric, and unusable entries with the primary RSA key
pub const MIXED_JWKS: &str = include_str!("../data/mixed/jwks.json");

const PRIMARY_PKCS8: &[u8] = include_bytes!("../data/rsa/signing-key-1.pk8");
const SECONDARY_PKCS8: &[u8] = include_bytes!("../data/rsa/signing-key-2.pk8");

/// An error while minting a test token
#[derive(Debug, Error)]
pub enum MintError {
    /// The fixture key could not be loaded
    #[error("fixture key rejected: {0}")]
    KeyRejected(String),

    /// The requested algorithm cannot be produced by this minter
    #[error("cannot mint tokens with algorithm '{0}'")]
    UnsupportedAlgorithm(String),

    /// The signing operation failed
    #[error("signing failed")]
    Signing,

    /// The header or claims could not be serialized
    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
}

/// Produces compact JWTs signed with one of the fixture RSA keys
#[derive(Clone)]
pub struct TokenMinter {
    key_pair: Result<Arc<RsaKeyPair>, String>,
    key_id: Option<String>,
}

impl fmt::Debug for TokenMinter {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TokenMinter")
            .field("key_id", &self.key_id)
            .finish_non_exhaustive()
    }
}

impl TokenMinter {
    fn from_pkcs8(pkcs8: &[u8], kid: &str) -> Self {
        let key_pair = RsaKeyPair::from_pkcs8(pkcs8)
            .map(Arc::new)
            .map_err(|e| e.to_string());
        Self {
            key_pair,
            key_id: Some(kid.to_owned()),
        }
    }

    /// Signs with the primary key, naming [`TEST_KEY_ID`]
    #[must_use]
    pub fn primary() -> Self {
        Self::from_pkcs8(PRIMARY_PKCS8, TEST_KEY_ID)
    }

    /// Signs with the secondary key, naming [`OTHER_KEY_ID`]
    #[must_use]
    pub fn secondary() -> Self {
        Self::from_pkcs8(SECONDARY_PKCS8, OTHER_KEY_ID)
    }

    /// Names a different key identifier in the header
    #[must_use]
    pub fn with_key_id(self, kid: impl Into<String>) -> Self {
        Self {
            key_id: Some(kid.into()),
            ..self
        }
    }

    /// Omits the key identifier from the header
    #[must_use]
    pub fn without_key_id(self) -> Self {
        Self {
            key_id: None,
            ..self
        }
    }

    fn key_pair(&self) -> Result<&RsaKeyPair, MintError> {
        self.key_pair
            .as_deref()
            .map_err(|e| MintError::KeyRejected(e.clone()))
    }

    /// Produces a raw RS256 signature over `message`
    ///
    /// # Errors
    ///
    /// Returns an error if the fixture key cannot be loaded or signing fails.
    pub fn sign_raw(&self, message: &[u8]) -> Result<Vec<u8>, MintError> {
        self.sign_message(&signature::RSA_PKCS1_SHA256, message)
    }

    fn sign_message(
        &self,
        padding: &'static dyn signature::RsaEncoding,
        message: &[u8],
    ) -> Result<Vec<u8>, MintError> {
        let key_pair = self.key_pair()?;
        let mut sig = vec![0; key_pair.public().modulus_len()];
        key_pair
            .sign(padding, &SystemRandom::new(), message, &mut sig)
            .map_err(|_| MintError::Signing)?;
        Ok(sig)
    }

    fn header(&self, alg: &str) -> Value {
        match &self.key_id {
            Some(kid) => json!({ "alg": alg, "typ": "JWT", "kid": kid }),
            None => json!({ "alg": alg, "typ": "JWT" }),
        }
    }

    /// Mints an RS256 token carrying `claims`
    ///
    /// # Errors
    ///
    /// Returns an error if the fixture key cannot be loaded or signing fails.
    pub fn rs256(&self, claims: &Value) -> Result<Jwt, MintError> {
        self.sign_with("RS256", claims)
    }

    /// Mints a token signed with any RSA algorithm ring can produce
    ///
    /// # Errors
    ///
    /// Returns an error if `alg` is not an RSA algorithm, the fixture key
    /// cannot be loaded, or signing fails.
    pub fn sign_with(&self, alg: &str, claims: &Value) -> Result<Jwt, MintError> {
        let padding: &'static dyn signature::RsaEncoding = match alg {
            "RS256" => &signature::RSA_PKCS1_SHA256,
            "RS384" => &signature::RSA_PKCS1_SHA384,
            "RS512" => &signature::RSA_PKCS1_SHA512,
            "PS256" => &signature::RSA_PSS_SHA256,
            "PS384" => &signature::RSA_PSS_SHA384,
            "PS512" => &signature::RSA_PSS_SHA512,
            _ => return Err(MintError::UnsupportedAlgorithm(alg.to_owned())),
        };

        let message = encode_message(&self.header(alg), claims)?;
        let sig = self.sign_message(padding, message.as_bytes())?;
        Ok(finish(message, &sig))
    }

    /// Mints an HS256 token keyed with `secret`, keeping this minter's key
    /// identifier so that it points at an RSA key in the fixture set
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn hs256(&self, secret: &[u8], claims: &Value) -> Result<Jwt, MintError> {
        let message = encode_message(&self.header("HS256"), claims)?;
        let key = ring::hmac::Key::new(ring::hmac::HMAC_SHA256, secret);
        let tag = ring::hmac::sign(&key, message.as_bytes());
        Ok(finish(message, tag.as_ref()))
    }

    /// Mints a token with an empty signature, naming `alg` in the header
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn unsigned(&self, alg: &str, claims: &Value) -> Result<Jwt, MintError> {
        let message = encode_message(&self.header(alg), claims)?;
        Ok(finish(message, &[]))
    }
}

fn encode_message(header: &Value, claims: &Value) -> Result<String, MintError> {
    let h = Base64Url::encode_slice(&serde_json::to_vec(header)?);
    let p = Base64Url::encode_slice(&serde_json::to_vec(claims)?);
    Ok(format!("{h}.{p}"))
}

fn finish(mut message: String, signature: &[u8]) -> Jwt {
    message.push('.');
    message.push_str(&Base64Url::encode_slice(signature));
    Jwt::new(message)
}

#[cfg(test)]
mod tests {
    use color_eyre::Result;

    use super::*;

    #[test]
    fn fixture_keys_load() -> Result<()> {
        TokenMinter::primary().key_pair()?;
        TokenMinter::secondary().key_pair()?;
        Ok(())
    }

    #[test]
    fn refuses_non_rsa_algorithm() {
        let err = TokenMinter::primary()
            .sign_with("ES256", &json!({}))
            .unwrap_err();
        assert!(matches!(err, MintError::UnsupportedAlgorithm(_)));
    }
}

//! Implementations of the JSON Web Keys (JWK) standard
//!
//! The specifications for JSON Web Keys can be found in [RFC7517][].
//!
//! [RFC7517]: https://tools.ietf.org/html/rfc7517

use std::convert::TryFrom;

use aliri_braid::braid;
use serde::Deserialize;

use crate::{error, jwa, jws::Verifier};

/// An identifier for a JWK
#[braid(serde, ref_doc = "A borrowed reference to JWK identifier ([`KeyId`])")]
pub struct KeyId;

/// An identified JSON Web Key
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "JwkDto")]
#[must_use]
pub struct Jwk {
    key_id: Option<KeyId>,
    usage: Option<jwa::Usage>,
    algorithm: Option<jwa::Algorithm>,
    key: Key,
}

impl Jwk {
    /// The key ID
    #[must_use]
    pub fn key_id(&self) -> Option<&KeyIdRef> {
        self.key_id.as_deref()
    }

    /// The intended usage of the key
    #[must_use]
    pub fn usage(&self) -> Option<jwa::Usage> {
        self.usage
    }

    /// The algorithm the key is restricted to, if any
    #[must_use]
    pub fn algorithm(&self) -> Option<jwa::Algorithm> {
        self.algorithm
    }

    /// Sets the key ID
    pub fn with_key_id(self, kid: KeyId) -> Self {
        Self {
            key_id: Some(kid),
            ..self
        }
    }

    /// Sets the key's usage
    pub fn with_usage(self, usage: jwa::Usage) -> Self {
        Self {
            usage: Some(usage),
            ..self
        }
    }

    /// Restricts the key to a single algorithm, with the matching usage
    pub fn with_algorithm(self, alg: jwa::Algorithm) -> Self {
        Self {
            algorithm: Some(alg),
            usage: Some(alg.to_usage()),
            ..self
        }
    }
}

impl From<jwa::RsaPublicKey> for Jwk {
    fn from(key: jwa::RsaPublicKey) -> Self {
        Self {
            key_id: None,
            usage: None,
            algorithm: None,
            key: Key::Rsa(key),
        }
    }
}

impl Verifier for Jwk {
    type Algorithm = jwa::Algorithm;
    type Error = error::JwkVerifyError;

    fn can_verify(&self, alg: Self::Algorithm) -> bool {
        self.algorithm.map_or(true, |a| a == alg) && self.key.can_verify(alg)
    }

    fn verify(
        &self,
        alg: Self::Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), Self::Error> {
        if let Some(u) = self.usage {
            if u != jwa::Usage::Signing {
                return Err(error::jwk_usage_mismatch().into());
            }
        }

        match self.algorithm {
            Some(key_alg) if key_alg == alg => {}
            Some(_) => {
                return Err(error::incompatible_algorithm(alg).into());
            }
            None => {}
        }

        self.key.verify(alg, data, signature)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct JwkDto {
    #[serde(rename = "kid", default)]
    key_id: Option<KeyId>,

    #[serde(rename = "use", default)]
    usage: Option<jwa::Usage>,

    #[serde(rename = "alg", default)]
    algorithm: Option<jwa::Algorithm>,

    #[serde(flatten)]
    key: Key,
}

impl TryFrom<JwkDto> for Jwk {
    type Error = error::IncompatibleAlgorithm;

    fn try_from(dto: JwkDto) -> Result<Self, Self::Error> {
        if let Some(alg) = dto.algorithm {
            if !dto.key.can_verify(alg) {
                return Err(error::incompatible_algorithm(alg));
            }
        }

        Ok(Self {
            key_id: dto.key_id,
            usage: dto.usage,
            algorithm: dto.algorithm,
            key: dto.key,
        })
    }
}

/// Key material, tagged by key type
#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
#[serde(tag = "kty")]
enum Key {
    #[serde(rename = "RSA")]
    Rsa(jwa::RsaPublicKey),
}

impl Verifier for Key {
    type Algorithm = jwa::Algorithm;
    type Error = error::JwkVerifyError;

    fn can_verify(&self, alg: Self::Algorithm) -> bool {
        match self {
            Self::Rsa(k) => k.can_verify(alg),
        }
    }

    fn verify(
        &self,
        alg: Self::Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), Self::Error> {
        match self {
            Self::Rsa(k) => k.verify(alg, data, signature),
        }
    }
}

//! RSA JSON Web Algorithm implementations

use std::convert::TryFrom;

use serde::{Deserialize, Serialize};

use crate::{base64url::Base64Url, error, jwa, jws};

const MIN_MODULUS_BITS: usize = 2048;
const MAX_MODULUS_BITS: usize = 8192;

/// RSA public key components
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PublicKeyDto")]
#[must_use]
pub struct PublicKey {
    /// The public modulus
    #[serde(rename = "n")]
    modulus: Base64Url,

    /// The public exponent
    #[serde(rename = "e")]
    exponent: Base64Url,
}

impl PublicKey {
    /// The public key's modulus as big-endian bytes
    #[must_use]
    pub fn modulus(&self) -> &[u8] {
        self.modulus.as_slice()
    }

    /// The public key's exponent as big-endian bytes
    #[must_use]
    pub fn exponent(&self) -> &[u8] {
        self.exponent.as_slice()
    }

    /// The size of the modulus in bits
    #[must_use]
    pub fn modulus_bits(&self) -> usize {
        bit_len(self.modulus.as_slice())
    }

    /// Constructs a public key from the modulus and exponent
    ///
    /// Leading zero octets are stripped from both components before the
    /// modulus size is checked.
    ///
    /// # Errors
    ///
    /// The modulus is outside of the 2048 to 8192 bit range, or the
    /// exponent is zero.
    pub fn from_components(
        modulus: impl Into<Base64Url>,
        exponent: impl Into<Base64Url>,
    ) -> Result<Self, error::KeyRejected> {
        let modulus = strip_leading_zeros(modulus.into());
        let exponent = strip_leading_zeros(exponent.into());

        let bits = bit_len(modulus.as_slice());
        if !(MIN_MODULUS_BITS..=MAX_MODULUS_BITS).contains(&bits) {
            return Err(error::key_rejected(format!(
                "modulus of {bits} bits is outside of the supported {MIN_MODULUS_BITS}-{MAX_MODULUS_BITS} bit range"
            )));
        }

        if exponent.as_slice().is_empty() {
            return Err(error::key_rejected("public exponent must be non-zero"));
        }

        Ok(Self { modulus, exponent })
    }
}

fn strip_leading_zeros(value: Base64Url) -> Base64Url {
    let raw = value.as_slice();
    match raw.iter().position(|&b| b != 0) {
        Some(0) => value,
        Some(idx) => Base64Url::from_raw(raw[idx..].to_vec()),
        None => Base64Url::default(),
    }
}

fn bit_len(be: &[u8]) -> usize {
    match be.first() {
        Some(&first) => (be.len() - 1) * 8 + (8 - first.leading_zeros() as usize),
        None => 0,
    }
}

impl jws::Verifier for PublicKey {
    type Algorithm = jwa::Algorithm;
    type Error = error::JwkVerifyError;

    fn can_verify(&self, alg: Self::Algorithm) -> bool {
        alg == jwa::Algorithm::RS256
    }

    fn verify(
        &self,
        alg: Self::Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), Self::Error> {
        if !self.can_verify(alg) {
            return Err(error::incompatible_algorithm(alg).into());
        }

        let pk = ring::signature::RsaPublicKeyComponents {
            n: self.modulus.as_slice(),
            e: self.exponent.as_slice(),
        };

        pk.verify(&ring::signature::RSA_PKCS1_2048_8192_SHA256, data, signature)
            .map_err(|_| error::signature_mismatch().into())
    }
}

impl TryFrom<PublicKeyDto> for PublicKey {
    type Error = error::KeyRejected;

    fn try_from(dto: PublicKeyDto) -> Result<Self, Self::Error> {
        Self::from_components(dto.modulus, dto.exponent)
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
struct PublicKeyDto {
    #[serde(rename = "n")]
    modulus: Base64Url,

    #[serde(rename = "e")]
    exponent: Base64Url,
}

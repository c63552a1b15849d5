//! Implementations of the JSON Web Algorithms (JWA) standard
//!
//! The specifications for these algorithms can be found in [RFC7518][].
//! Only RSA verification keys are implemented; the remaining registered
//! names are recognized so that a token naming one of them can be refused
//! by name rather than failing to parse.
//!
//! [RFC7518]: https://tools.ietf.org/html/rfc7518

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error;

pub mod rsa;

pub use rsa::PublicKey as RsaPublicKey;

/// A registered JWS signing algorithm
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
#[allow(clippy::upper_case_acronyms)]
#[non_exhaustive]
pub enum Algorithm {
    /// HMAC using SHA-256
    HS256,
    /// HMAC using SHA-384
    HS384,
    /// HMAC using SHA-512
    HS512,
    /// RSASSA-PKCS1-v1_5 using SHA-256
    RS256,
    /// RSASSA-PKCS1-v1_5 using SHA-384
    RS384,
    /// RSASSA-PKCS1-v1_5 using SHA-512
    RS512,
    /// RSASSA-PSS using SHA-256 and MGF1 with SHA-256
    PS256,
    /// RSASSA-PSS using SHA-384 and MGF1 with SHA-384
    PS384,
    /// RSASSA-PSS using SHA-512 and MGF1 with SHA-512
    PS512,
    /// ECDSA using P-256 and SHA-256
    ES256,
    /// ECDSA using P-384 and SHA-384
    ES384,
    /// ECDSA using P-521 and SHA-512
    ES512,
    /// Edwards-curve digital signatures
    EdDSA,
    /// No digital signature or MAC performed
    None,
}

impl Algorithm {
    /// The registered name of the algorithm
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::HS256 => "HS256",
            Self::HS384 => "HS384",
            Self::HS512 => "HS512",
            Self::RS256 => "RS256",
            Self::RS384 => "RS384",
            Self::RS512 => "RS512",
            Self::PS256 => "PS256",
            Self::PS384 => "PS384",
            Self::PS512 => "PS512",
            Self::ES256 => "ES256",
            Self::ES384 => "ES384",
            Self::ES512 => "ES512",
            Self::EdDSA => "EdDSA",
            Self::None => "none",
        }
    }

    /// Gets the usage related to this algorithm
    pub const fn to_usage(self) -> Usage {
        Usage::Signing
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = error::UnknownAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let alg = match s {
            "HS256" => Self::HS256,
            "HS384" => Self::HS384,
            "HS512" => Self::HS512,
            "RS256" => Self::RS256,
            "RS384" => Self::RS384,
            "RS512" => Self::RS512,
            "PS256" => Self::PS256,
            "PS384" => Self::PS384,
            "PS512" => Self::PS512,
            "ES256" => Self::ES256,
            "ES384" => Self::ES384,
            "ES512" => Self::ES512,
            "EdDSA" => Self::EdDSA,
            "none" => Self::None,
            _ => return Err(error::unknown_algorithm(s.to_owned())),
        };

        Ok(alg)
    }
}

impl Serialize for Algorithm {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Algorithm {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

/// The intended use for a JWK
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[must_use]
pub enum Usage {
    /// The key is intended for signing and verification
    #[serde(rename = "sig")]
    Signing,

    /// The key is intended for encryption
    #[serde(rename = "enc")]
    Encryption,
}

#[cfg(test)]
mod tests {
    use color_eyre::Result;

    use super::*;

    #[test]
    fn parses_registered_names() -> Result<()> {
        assert_eq!("RS256".parse::<Algorithm>()?, Algorithm::RS256);
        assert_eq!("EdDSA".parse::<Algorithm>()?, Algorithm::EdDSA);
        assert_eq!("none".parse::<Algorithm>()?, Algorithm::None);
        Ok(())
    }

    #[test]
    fn names_are_case_sensitive() {
        assert!("rs256".parse::<Algorithm>().is_err());
        assert!("NONE".parse::<Algorithm>().is_err());
    }

    #[test]
    fn unknown_name_is_reported() {
        let err = "RSA-OAEP".parse::<Algorithm>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "'RSA-OAEP' does not match any registered algorithm"
        );
    }

    #[test]
    fn serializes_as_registered_name() -> Result<()> {
        assert_eq!(serde_json::to_string(&Algorithm::PS384)?, r#""PS384""#);
        let usage: Usage = serde_json::from_str(r#""sig""#)?;
        assert_eq!(usage, Usage::Signing);
        Ok(())
    }
}

//! JSON Web Key Sets
//!
//! The format is defined in [RFC7517 section 5][].
//!
//! [RFC7517 section 5]: https://datatracker.ietf.org/doc/html/rfc7517#section-5

use serde::Deserialize;

use crate::{jwk, Jwk};

/// A JSON Web Key Set (JWKS)
///
/// Entries that cannot be understood as a supported JWK are skipped during
/// deserialization, so a set that mixes RSA keys with other key types still
/// yields its RSA keys.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Jwks {
    #[serde(deserialize_with = "deserialize_keys")]
    keys: Vec<Jwk>,
}

impl Jwks {
    /// Adds a key to the end of the set
    pub fn add_key(&mut self, key: Jwk) {
        self.keys.push(key);
    }

    /// A view of the keys in this set, in order
    #[must_use]
    pub fn keys(&self) -> &[Jwk] {
        &self.keys
    }

    /// The number of usable keys in the set
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the set holds no usable keys
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Gets the first key whose identifier matches `kid` exactly
    ///
    /// Keys are scanned in set order. When the set carries more than one key
    /// with the same identifier, only the first is ever returned. Keys
    /// without an identifier never match.
    #[must_use]
    pub fn get_key_by_id(&self, kid: &jwk::KeyIdRef) -> Option<&Jwk> {
        self.keys.iter().find(|k| k.key_id() == Some(kid))
    }
}

fn deserialize_keys<'de, D>(deserializer: D) -> Result<Vec<Jwk>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct MaybeJwksVisitor;

    impl<'de> serde::de::Visitor<'de> for MaybeJwksVisitor {
        type Value = Vec<Jwk>;

        fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("a list of JWK objects")
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: serde::de::SeqAccess<'de>,
        {
            let mut values = Vec::with_capacity(seq.size_hint().unwrap_or_default());
            let mut index = 0_usize;

            while let Some(value) = seq.next_element()? {
                match value {
                    MaybeJwk::Jwk(jwk) => values.push(jwk),
                    MaybeJwk::Unknown(key) => {
                        #[cfg(feature = "tracing")]
                        tracing::warn!(
                            jwks.idx = index,
                            jwk.kid = ?key.kid,
                            jwk.kty = ?key.kty,
                            jwk.alg = ?key.alg,
                            "ignoring unsupported JWK"
                        );
                        let _ = (index, key);
                    }
                }
                index += 1;
            }

            Ok(values)
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum MaybeJwk {
        Jwk(Jwk),
        Unknown(JwkLike),
    }

    #[allow(dead_code)]
    #[derive(Deserialize)]
    struct JwkLike {
        #[serde(default)]
        kid: Option<String>,
        #[serde(default)]
        kty: Option<String>,
        #[serde(default)]
        alg: Option<String>,
    }

    deserializer.deserialize_seq(MaybeJwksVisitor)
}

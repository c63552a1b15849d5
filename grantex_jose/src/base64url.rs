//! Byte buffers that serialize as unpadded URL-safe base64

use std::{error::Error, fmt};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// An error while decoding a value which is not properly formatted
/// base64url data
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InvalidBase64Data {
    source: base64::DecodeError,
}

impl From<base64::DecodeError> for InvalidBase64Data {
    fn from(err: base64::DecodeError) -> Self {
        Self { source: err }
    }
}

impl fmt::Display for InvalidBase64Data {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("invalid base64url data")
    }
}

impl Error for InvalidBase64Data {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

/// Raw bytes held in memory, encoded as unpadded base64url only when
/// displayed or serialized
#[derive(Clone, Default, Eq, PartialEq, Hash)]
#[must_use]
pub struct Base64Url(Vec<u8>);

impl Base64Url {
    /// Wraps an already-decoded buffer
    #[inline]
    pub fn from_raw(raw: impl Into<Vec<u8>>) -> Self {
        Self(raw.into())
    }

    /// Decodes an unpadded base64url string
    ///
    /// # Errors
    ///
    /// Returns an error if the input contains characters outside of the
    /// URL-safe alphabet, carries padding, or has an impossible length.
    pub fn from_encoded(enc: impl AsRef<[u8]>) -> Result<Self, InvalidBase64Data> {
        Ok(Self(URL_SAFE_NO_PAD.decode(enc)?))
    }

    /// The raw bytes
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    /// Unwraps the underlying buffer
    #[inline]
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }

    /// Encodes the buffer
    #[must_use]
    pub fn encode(&self) -> String {
        URL_SAFE_NO_PAD.encode(&self.0)
    }

    /// Encodes arbitrary bytes without taking ownership of them
    #[must_use]
    pub fn encode_slice(raw: &[u8]) -> String {
        URL_SAFE_NO_PAD.encode(raw)
    }
}

impl From<Vec<u8>> for Base64Url {
    #[inline]
    fn from(raw: Vec<u8>) -> Self {
        Self(raw)
    }
}

impl AsRef<[u8]> for Base64Url {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Base64Url {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl fmt::Debug for Base64Url {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "`{}`", self.encode())
    }
}

impl Serialize for Base64Url {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for Base64Url {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        Self::from_encoded(encoded.as_bytes()).map_err(de::Error::custom)
    }
}

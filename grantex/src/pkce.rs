//! Proof Key for Code Exchange ([RFC 7636][])
//!
//! [RFC 7636]: https://datatracker.ietf.org/doc/html/rfc7636

use std::fmt;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use ring::{
    digest,
    rand::{SecureRandom, SystemRandom},
};
use serde::Serialize;
use thiserror::Error;

const VERIFIER_ENTROPY: usize = 32;

/// The secure random source could not produce bytes
#[derive(Clone, Copy, Debug, Error)]
#[error("failed to generate random bytes")]
pub struct EntropyError {
    _p: (),
}

/// The transform used to derive a code challenge from its verifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[non_exhaustive]
pub enum ChallengeMethod {
    /// `BASE64URL(SHA256(ASCII(code_verifier)))`
    S256,
}

impl ChallengeMethod {
    /// The method name sent to the authorization server
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::S256 => "S256",
        }
    }
}

impl fmt::Display for ChallengeMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A code verifier and the challenge derived from it
///
/// Send the challenge and method with the authorization request; keep the
/// verifier and send it with the token request.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
#[must_use]
pub struct PkceChallenge {
    code_verifier: String,
    code_challenge: String,
    code_challenge_method: ChallengeMethod,
}

impl PkceChallenge {
    /// Generates a fresh verifier from the system's secure random source
    ///
    /// # Errors
    ///
    /// Returns an error if the random source fails.
    pub fn generate() -> Result<Self, EntropyError> {
        Self::generate_with_rng(&SystemRandom::new())
    }

    /// Generates a fresh verifier from `rng`
    ///
    /// Useful for sharing one [`SystemRandom`] across many generations.
    /// `SecureRandom` is sealed by `ring`, so only its own generators can be
    /// supplied here.
    ///
    /// # Errors
    ///
    /// Returns an error if the random source fails, which `ring` reports
    /// without further detail.
    pub fn generate_with_rng(rng: &dyn SecureRandom) -> Result<Self, EntropyError> {
        let mut entropy = [0_u8; VERIFIER_ENTROPY];
        rng.fill(&mut entropy)
            .map_err(|_| EntropyError { _p: () })?;

        Ok(Self::from_verifier(URL_SAFE_NO_PAD.encode(entropy)))
    }

    /// Derives the S256 challenge for an existing verifier
    ///
    /// ```
    /// use grantex::pkce::PkceChallenge;
    ///
    /// let pkce = PkceChallenge::from_verifier("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk");
    /// assert_eq!(pkce.code_challenge(), "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM");
    /// ```
    pub fn from_verifier(verifier: impl Into<String>) -> Self {
        let code_verifier = verifier.into();
        let hash = digest::digest(&digest::SHA256, code_verifier.as_bytes());

        Self {
            code_challenge: URL_SAFE_NO_PAD.encode(hash),
            code_verifier,
            code_challenge_method: ChallengeMethod::S256,
        }
    }

    /// The secret verifier, sent only with the token request
    #[must_use]
    pub fn code_verifier(&self) -> &str {
        &self.code_verifier
    }

    /// The challenge, sent with the authorization request
    #[must_use]
    pub fn code_challenge(&self) -> &str {
        &self.code_challenge
    }

    /// How the challenge was derived
    #[must_use]
    pub fn code_challenge_method(&self) -> ChallengeMethod {
        self.code_challenge_method
    }
}

impl fmt::Debug for PkceChallenge {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("PkceChallenge")
            .field("code_verifier", &"***")
            .field("code_challenge", &self.code_challenge)
            .field("code_challenge_method", &self.code_challenge_method)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use color_eyre::Result;

    use super::*;

    #[test]
    fn challenge_is_hash_of_verifier() -> Result<()> {
        let pkce = PkceChallenge::generate()?;
        let hash = digest::digest(&digest::SHA256, pkce.code_verifier().as_bytes());

        assert_eq!(pkce.code_challenge(), URL_SAFE_NO_PAD.encode(hash));
        assert_eq!(pkce.code_challenge_method(), ChallengeMethod::S256);
        assert_eq!(pkce.code_challenge_method().to_string(), "S256");
        Ok(())
    }

    #[test]
    fn verifier_is_43_url_safe_characters() -> Result<()> {
        let pkce = PkceChallenge::generate()?;
        assert_eq!(pkce.code_verifier().len(), 43);
        assert!(pkce
            .code_verifier()
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_'));
        Ok(())
    }

    #[test]
    fn shared_rng_yields_distinct_verifiers() -> Result<()> {
        let rng = SystemRandom::new();
        let a = PkceChallenge::generate_with_rng(&rng)?;
        let b = PkceChallenge::generate_with_rng(&rng)?;

        assert_eq!(a.code_verifier().len(), 43);
        assert_ne!(a.code_verifier(), b.code_verifier());
        assert_eq!(PkceChallenge::from_verifier(a.code_verifier()), a);
        Ok(())
    }

    #[test]
    fn successive_generations_differ() -> Result<()> {
        let a = PkceChallenge::generate()?;
        let b = PkceChallenge::generate()?;
        assert_ne!(a.code_verifier(), b.code_verifier());
        assert_ne!(a.code_challenge(), b.code_challenge());
        Ok(())
    }

    #[test]
    fn matches_rfc_7636_vector() {
        let pkce = PkceChallenge::from_verifier("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk");
        assert_eq!(
            pkce.code_challenge(),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn serializes_with_oauth_field_names() -> Result<()> {
        let pkce = PkceChallenge::from_verifier("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk");
        assert_eq!(
            serde_json::to_value(&pkce)?,
            serde_json::json!({
                "codeVerifier": "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk",
                "codeChallenge": "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM",
                "codeChallengeMethod": "S256",
            })
        );
        Ok(())
    }

    #[test]
    fn debug_hides_verifier() -> Result<()> {
        let pkce = PkceChallenge::generate()?;
        assert!(!format!("{pkce:?}").contains(pkce.code_verifier()));
        Ok(())
    }
}

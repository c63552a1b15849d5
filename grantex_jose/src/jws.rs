//! Implementations of the JSON Web Signature (JWS) standard
//!
//! The specifications for this standard can be found in [RFC7515][].
//!
//! [RFC7515]: https://tools.ietf.org/html/rfc7515

use std::error::Error as StdError;

/// A JWS verifier
pub trait Verifier {
    /// The verifiable signature algorithms
    type Algorithm;

    /// The error returned on a failure to verify
    type Error: StdError + Send + Sync + 'static;

    /// Whether the specific algorithm provided is compatible
    /// with this verifier
    fn can_verify(&self, alg: Self::Algorithm) -> bool;

    /// Attempts to verify the data against the signature using the
    /// specified algorithm
    ///
    /// # Errors
    ///
    /// Returns an error if the algorithm is not usable with this verifier
    /// or if the signature does not match the data.
    fn verify(
        &self,
        alg: Self::Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), Self::Error>;
}

impl<T: Verifier + ?Sized> Verifier for &'_ T {
    type Algorithm = T::Algorithm;
    type Error = T::Error;

    #[inline]
    fn can_verify(&self, alg: Self::Algorithm) -> bool {
        T::can_verify(self, alg)
    }

    #[inline]
    fn verify(
        &self,
        alg: Self::Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), Self::Error> {
        T::verify(self, alg, data, signature)
    }
}

//! Retrieval of the key set a token is verified against

use grantex_jose::Jwks;
use tokio_util::sync::CancellationToken;

use crate::{error::KeySetError, fetch::KeySetFetcher};

/// Fetches and parses the key set used to verify a token
///
/// Each call to [`resolve`](Self::resolve) performs exactly one fetch.
/// Caching, if wanted, belongs to the fetcher.
#[derive(Clone, Debug)]
pub struct KeySetResolver<F> {
    fetcher: F,
}

impl<F> KeySetResolver<F>
where
    F: KeySetFetcher,
{
    /// Resolves key sets through `fetcher`
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }

    /// The underlying fetcher
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Fetches the key set at `location` and parses it
    ///
    /// When a cancellation token is supplied and is cancelled before the
    /// fetch completes, the fetch is abandoned.
    ///
    /// # Errors
    ///
    /// Returns [`KeySetError::Cancelled`] if cancelled, [`KeySetError::Fetch`]
    /// if the fetcher fails, and [`KeySetError::Malformed`] if the document
    /// is not a key set.
    pub async fn resolve(
        &self,
        location: &str,
        cancellation: Option<&CancellationToken>,
    ) -> Result<Jwks, KeySetError> {
        let fetch = self.fetcher.fetch(location);

        let body = match cancellation {
            Some(token) => token
                .run_until_cancelled(fetch)
                .await
                .ok_or(KeySetError::Cancelled)?,
            None => fetch.await,
        }
        .map_err(KeySetError::fetch)?;

        serde_json::from_slice(&body).map_err(KeySetError::Malformed)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use color_eyre::Result;
    use grantex_jose::{jwk::KeyIdRef, test_util};

    use super::*;
    use crate::fetch::StaticKeySet;

    #[derive(Debug)]
    struct Stalled;

    #[async_trait]
    impl KeySetFetcher for Stalled {
        type Error = std::convert::Infallible;

        async fn fetch(&self, _location: &str) -> Result<Vec<u8>, Self::Error> {
            std::future::pending().await
        }
    }

    #[derive(Debug)]
    struct Refused;

    #[async_trait]
    impl KeySetFetcher for Refused {
        type Error = std::io::Error;

        async fn fetch(&self, _location: &str) -> Result<Vec<u8>, Self::Error> {
            Err(std::io::Error::from(std::io::ErrorKind::ConnectionRefused))
        }
    }

    #[tokio::test]
    async fn parses_fetched_key_set() -> Result<()> {
        let resolver = KeySetResolver::new(StaticKeySet::new(test_util::JWKS_BOTH));
        let jwks = resolver.resolve("https://issuer/jwks", None).await?;
        assert_eq!(jwks.len(), 2);
        assert!(jwks
            .get_key_by_id(KeyIdRef::from_str(test_util::OTHER_KEY_ID))
            .is_some());
        Ok(())
    }

    #[tokio::test]
    async fn malformed_body_is_reported() {
        for body in ["<html>oops</html>", r#"{"keys":"nope"}"#, ""] {
            let resolver = KeySetResolver::new(StaticKeySet::new(body));
            let err = resolver.resolve("x", None).await.unwrap_err();
            assert!(matches!(err, KeySetError::Malformed(_)), "{body:?}");
        }
    }

    #[tokio::test]
    async fn fetch_failure_carries_cause() {
        let err = KeySetResolver::new(Refused)
            .resolve("x", None)
            .await
            .unwrap_err();
        match err {
            KeySetError::Fetch(cause) => assert!(cause.is::<std::io::Error>()),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancelled_token_wins_over_ready_fetch() {
        let token = CancellationToken::new();
        token.cancel();

        let resolver = KeySetResolver::new(StaticKeySet::new(test_util::JWKS));
        let err = resolver.resolve("x", Some(&token)).await.unwrap_err();
        assert!(matches!(err, KeySetError::Cancelled));
    }

    #[tokio::test]
    async fn cancellation_interrupts_pending_fetch() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });

        let err = KeySetResolver::new(Stalled)
            .resolve("x", Some(&token))
            .await
            .unwrap_err();
        assert!(matches!(err, KeySetError::Cancelled));
    }
}

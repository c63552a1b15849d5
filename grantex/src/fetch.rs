//! Sources of raw key set documents
//!
//! Verification only needs the bytes of a JSON Web Key Set. Where those
//! bytes come from is decided by a [`KeySetFetcher`]: a plain HTTP GET, a
//! fixed document, or a cache wrapped around either.

use std::{collections::HashMap, convert::Infallible, error, fmt, sync::Arc};

use arc_swap::ArcSwap;
use async_trait::async_trait;
#[cfg(feature = "reqwest")]
use reqwest::Client;

/// An asynchronous source for key set documents
#[async_trait]
pub trait KeySetFetcher: Send + Sync {
    /// The error type returned in the event that fetching a key set fails
    type Error: error::Error + Send + Sync + 'static;

    /// Fetches the raw key set document held at `location`
    async fn fetch(&self, location: &str) -> Result<Vec<u8>, Self::Error>;
}

#[async_trait]
impl<T> KeySetFetcher for Arc<T>
where
    T: KeySetFetcher + ?Sized,
{
    type Error = T::Error;

    async fn fetch(&self, location: &str) -> Result<Vec<u8>, Self::Error> {
        (**self).fetch(location).await
    }
}

/// Fetches key sets over HTTP with a single GET per call
///
/// Non-success statuses are errors. No retries are attempted.
#[cfg(feature = "reqwest")]
#[cfg_attr(docsrs, doc(cfg(feature = "reqwest")))]
#[derive(Clone, Debug)]
pub struct ReqwestFetcher {
    client: Client,
}

#[cfg(feature = "reqwest")]
impl ReqwestFetcher {
    /// Constructs a fetcher with its own HTTP client
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(concat!("grantex/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client })
    }

    /// Constructs a fetcher that shares an existing HTTP client
    #[must_use]
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

#[cfg(feature = "reqwest")]
#[async_trait]
impl KeySetFetcher for ReqwestFetcher {
    type Error = reqwest::Error;

    async fn fetch(&self, location: &str) -> Result<Vec<u8>, Self::Error> {
        tracing::debug!(jwks.url = location, "fetching key set");
        let response = self.client.get(location).send().await?;

        if let Err(err) = response.error_for_status_ref() {
            let error: &dyn error::Error = &err;
            tracing::warn!(
                error,
                jwks.url = location,
                http.status_code = response.status().as_u16(),
                "key set fetch failed; unexpected response status",
            );
            return Err(err);
        }

        Ok(response.bytes().await?.to_vec())
    }
}

/// Serves one fixed key set document for every location
#[derive(Clone)]
pub struct StaticKeySet {
    body: Arc<[u8]>,
}

impl StaticKeySet {
    /// Serves `body` as the key set document
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        let body: Vec<u8> = body.into();
        Self { body: body.into() }
    }
}

impl fmt::Debug for StaticKeySet {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("StaticKeySet")
            .field("len", &self.body.len())
            .finish()
    }
}

#[async_trait]
impl KeySetFetcher for StaticKeySet {
    type Error = Infallible;

    async fn fetch(&self, _location: &str) -> Result<Vec<u8>, Self::Error> {
        Ok(self.body.to_vec())
    }
}

struct Inner<F> {
    fetcher: F,
    bodies: ArcSwap<HashMap<String, Arc<[u8]>>>,
}

/// Remembers the last key set document fetched from each location
///
/// The first fetch for a location goes to the wrapped fetcher; later fetches
/// are served from memory until [`refresh`](Self::refresh) replaces the
/// document. A failed refresh keeps the previous document in place.
pub struct CachedKeySet<F> {
    inner: Arc<Inner<F>>,
}

impl<F> Clone for CachedKeySet<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F: fmt::Debug> fmt::Debug for CachedKeySet<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let bodies = self.inner.bodies.load();
        f.debug_struct("CachedKeySet")
            .field("fetcher", &self.inner.fetcher)
            .field("locations", &bodies.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<F> CachedKeySet<F>
where
    F: KeySetFetcher,
{
    /// Wraps `fetcher` with an initially empty cache
    pub fn new(fetcher: F) -> Self {
        Self {
            inner: Arc::new(Inner {
                fetcher,
                bodies: ArcSwap::from_pointee(HashMap::new()),
            }),
        }
    }

    /// The cached document for `location`, if one has been fetched
    #[must_use]
    pub fn cached(&self, location: &str) -> Option<Arc<[u8]>> {
        self.inner.bodies.load().get(location).cloned()
    }

    /// Forgets the cached document for `location`
    pub fn invalidate(&self, location: &str) {
        self.inner.bodies.rcu(|current| {
            let mut bodies = (**current).clone();
            bodies.remove(location);
            bodies
        });
    }

    fn store(&self, location: &str, body: Arc<[u8]>) {
        self.inner.bodies.rcu(|current| {
            let mut bodies = (**current).clone();
            bodies.insert(location.to_owned(), Arc::clone(&body));
            bodies
        });
    }

    /// Fetches `location` again and replaces the cached document
    ///
    /// No retries are attempted. If the fetch fails, the cached document is
    /// left as it was.
    ///
    /// # Errors
    ///
    /// Returns the wrapped fetcher's error.
    pub async fn refresh(&self, location: &str) -> Result<(), F::Error> {
        match self.inner.fetcher.fetch(location).await {
            Ok(body) => {
                self.store(location, body.into());
                tracing::info!(jwks.url = location, "key set refreshed");
                Ok(())
            }
            Err(err) => {
                let error: &dyn error::Error = &err;
                tracing::warn!(
                    error,
                    jwks.url = location,
                    "key set refresh failed; keeping previous key set"
                );
                Err(err)
            }
        }
    }

    /// Spawns a task that refreshes `location` on the given interval
    ///
    /// The first refresh happens one interval from now. Failures are logged
    /// and retried at the next tick. Abort the returned handle to stop.
    #[cfg(feature = "tokio")]
    #[cfg_attr(docsrs, doc(cfg(feature = "tokio")))]
    pub fn spawn_refresh(
        &self,
        location: impl Into<String>,
        interval: std::time::Duration,
    ) -> tokio::task::JoinHandle<()>
    where
        F: 'static,
    {
        let this = self.clone();
        let location = location.into();

        tokio::spawn(async move {
            let mut timer = tokio::time::interval(interval);
            timer.tick().await;

            loop {
                timer.tick().await;
                let _ = this.refresh(&location).await;
            }
        })
    }
}

#[async_trait]
impl<F> KeySetFetcher for CachedKeySet<F>
where
    F: KeySetFetcher,
{
    type Error = F::Error;

    async fn fetch(&self, location: &str) -> Result<Vec<u8>, Self::Error> {
        if let Some(body) = self.cached(location) {
            return Ok(body.to_vec());
        }

        let body = self.inner.fetcher.fetch(location).await?;
        self.store(location, Arc::from(body.as_slice()));
        tracing::debug!(jwks.url = location, "key set cached");
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use color_eyre::Result;
    use tracing_test::traced_test;

    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("source unavailable")]
    struct Unavailable;

    #[derive(Debug, Default)]
    struct Counting {
        calls: AtomicUsize,
        failing: AtomicBool,
    }

    #[async_trait]
    impl KeySetFetcher for Counting {
        type Error = Unavailable;

        async fn fetch(&self, location: &str) -> Result<Vec<u8>, Self::Error> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                Err(Unavailable)
            } else {
                Ok(format!("{location}#{n}").into_bytes())
            }
        }
    }

    #[tokio::test]
    async fn static_key_set_ignores_location() -> Result<()> {
        let fetcher = StaticKeySet::new(r#"{"keys":[]}"#);
        assert_eq!(fetcher.fetch("a").await?, br#"{"keys":[]}"#);
        assert_eq!(fetcher.fetch("b").await?, br#"{"keys":[]}"#);
        Ok(())
    }

    #[tokio::test]
    async fn cache_serves_repeat_fetches_from_memory() -> Result<()> {
        let cache = CachedKeySet::new(Counting::default());

        assert_eq!(cache.fetch("a").await?, b"a#0");
        assert_eq!(cache.fetch("a").await?, b"a#0");
        assert_eq!(cache.fetch("b").await?, b"b#1");
        assert_eq!(cache.inner.fetcher.calls.load(Ordering::SeqCst), 2);
        Ok(())
    }

    #[tokio::test]
    async fn refresh_replaces_document() -> Result<()> {
        let cache = CachedKeySet::new(Counting::default());
        cache.fetch("a").await?;
        cache.refresh("a").await?;
        assert_eq!(cache.fetch("a").await?, b"a#1");
        Ok(())
    }

    #[tokio::test]
    #[traced_test]
    async fn failed_refresh_keeps_previous_document() -> Result<()> {
        let cache = CachedKeySet::new(Counting::default());
        cache.fetch("a").await?;

        cache.inner.fetcher.failing.store(true, Ordering::SeqCst);
        assert!(cache.refresh("a").await.is_err());
        assert_eq!(cache.fetch("a").await?, b"a#0");
        assert!(logs_contain("keeping previous key set"));
        Ok(())
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() -> Result<()> {
        let cache = CachedKeySet::new(Counting::default());
        cache.fetch("a").await?;
        cache.invalidate("a");
        assert!(cache.cached("a").is_none());
        assert_eq!(cache.fetch("a").await?, b"a#1");
        Ok(())
    }

    #[cfg(feature = "tokio")]
    #[tokio::test]
    async fn background_refresh_updates_cache() -> Result<()> {
        let cache = CachedKeySet::new(Counting::default());
        cache.fetch("a").await?;

        let handle = cache.spawn_refresh("a", std::time::Duration::from_millis(20));
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        handle.abort();

        assert_ne!(cache.cached("a").as_deref(), Some(&b"a#0"[..]));
        Ok(())
    }

    #[cfg(feature = "reqwest")]
    mod reqwest_fetcher {
        use wiremock::{
            matchers::{method, path},
            Mock, MockServer, ResponseTemplate,
        };

        use super::*;

        #[tokio::test]
        async fn fetches_body() -> Result<()> {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/.well-known/jwks.json"))
                .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"keys":[]}"#))
                .expect(1)
                .mount(&server)
                .await;

            let fetcher = ReqwestFetcher::new()?;
            let body = fetcher
                .fetch(&format!("{}/.well-known/jwks.json", server.uri()))
                .await?;
            assert_eq!(body, br#"{"keys":[]}"#);
            Ok(())
        }

        #[tokio::test]
        #[traced_test]
        async fn rejects_error_status() -> Result<()> {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .respond_with(ResponseTemplate::new(503))
                .mount(&server)
                .await;

            let err = ReqwestFetcher::new()?
                .fetch(&server.uri())
                .await
                .unwrap_err();
            assert_eq!(err.status().map(|s| s.as_u16()), Some(503));
            assert!(logs_contain("unexpected response status"));
            Ok(())
        }

        #[tokio::test]
        async fn rejects_unusable_location() -> Result<()> {
            assert!(ReqwestFetcher::new()?.fetch("not a url").await.is_err());
            Ok(())
        }
    }
}

//! Typed cache store with per-key single-flight fetch.
//!
//! Wraps a byte-level [`Cache`] backend with key namespacing, a fixed TTL and
//! JSON encoding. [`CacheStore::fetch`] is the cache-aside primitive used by
//! the repository decorators: concurrent misses on one key share a single
//! generator run.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{Mutex, OnceCell};

use inkpress_core::cache::{self, decode, encode, namespaced_key, Cache, CacheError};

/// Shared outcome of one in-flight generator run: the encoded value or its error.
type Flight<E> = Arc<OnceCell<Result<Vec<u8>, E>>>;

/// Result of [`CacheStore::fetch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fetched<T> {
    pub value: T,
    /// True when this caller did not run the generator.
    pub hit: bool,
}

/// Typed cache-aside store over a byte-level backend.
///
/// # Type Parameters
///
/// * `C` - The cache backend
/// * `E` - The generator error type, shared with every waiter of a flight
pub struct CacheStore<C, E>
where
    C: Cache,
{
    cache: Arc<C>,
    prefix: String,
    ttl: Duration,
    inflight: Mutex<HashMap<String, Flight<E>>>,
}

impl<C, E> CacheStore<C, E>
where
    C: Cache,
    E: From<CacheError> + Clone + Send + Sync,
{
    /// Creates a new store.
    ///
    /// # Arguments
    ///
    /// * `cache` - The backend, usually shared by several stores
    /// * `prefix` - Prepended to every key
    /// * `ttl` - Time-to-live for every entry written; zero means no expiry
    pub fn new(cache: Arc<C>, prefix: impl Into<String>, ttl: Duration) -> Self {
        Self {
            cache,
            prefix: prefix.into(),
            ttl,
            inflight: Mutex::new(HashMap::new()),
        }
    }

    fn full_key(&self, key: &str) -> cache::Result<String> {
        if key.is_empty() {
            return Err(CacheError::InvalidKey);
        }
        Ok(namespaced_key(&self.prefix, key))
    }

    fn entry_ttl(&self) -> Option<Duration> {
        (!self.ttl.is_zero()).then_some(self.ttl)
    }

    /// Reads and decodes a value.
    ///
    /// Fails with `CacheMiss` when absent and `InvalidValue` when the payload
    /// does not decode into `T`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> cache::Result<T> {
        let key = self.full_key(key)?;
        let bytes = self.cache.get(&key).await?.ok_or(CacheError::CacheMiss)?;
        decode(&bytes)
    }

    /// Encodes and writes a value with the store TTL.
    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> cache::Result<()> {
        let key = self.full_key(key)?;
        let bytes = encode(value)?;
        self.cache.set(&key, &bytes, self.entry_ttl()).await
    }

    pub async fn exists(&self, key: &str) -> cache::Result<bool> {
        let key = self.full_key(key)?;
        self.cache.exists(&key).await
    }

    pub async fn delete(&self, key: &str) -> cache::Result<()> {
        let key = self.full_key(key)?;
        self.cache.delete(&key).await
    }

    /// Returns the cached value for `key`, or runs `generator` and caches its result.
    ///
    /// Among concurrent callers for the same key at most one generator runs at
    /// a time; the others wait and share its encoded result or its error.
    /// Errors are never cached. A payload that fails to decode is treated as a
    /// miss, and backend failures degrade to calling the generator.
    pub async fn fetch<T, F, Fut>(&self, key: &str, generator: F) -> Result<Fetched<T>, E>
    where
        T: Serialize + DeserializeOwned + Send,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = Result<T, E>> + Send,
    {
        let key = self.full_key(key).map_err(E::from)?;

        if let Some(value) = self.read_cached::<T>(&key).await {
            tracing::trace!(%key, "Cache hit");
            return Ok(Fetched { value, hit: true });
        }

        let flight = {
            let mut inflight = self.inflight.lock().await;
            Arc::clone(
                inflight
                    .entry(key.clone())
                    .or_insert_with(|| Arc::new(OnceCell::new())),
            )
        };

        let mut produced: Option<T> = None;
        let outcome = flight
            .get_or_init(|| async {
                // A previous flight may have populated the key since the fast path
                if let Some(bytes) = self.read_cached_bytes::<T>(&key).await {
                    return Ok(bytes);
                }

                tracing::trace!(%key, "Cache miss");
                let value = generator().await?;
                let bytes = encode(&value).map_err(E::from)?;
                if let Err(err) = self.cache.set(&key, &bytes, self.entry_ttl()).await {
                    tracing::warn!(%key, error = %err, "Failed to populate cache");
                }
                produced = Some(value);
                Ok(bytes)
            })
            .await
            .clone();

        self.finish_flight(&key, &flight).await;

        if let Some(value) = produced {
            return Ok(Fetched { value, hit: false });
        }

        let bytes = outcome?;
        let value = decode(&bytes).map_err(E::from)?;
        Ok(Fetched { value, hit: true })
    }

    /// Drops the flight from the in-flight map if it is still the registered one.
    async fn finish_flight(&self, key: &str, flight: &Flight<E>) {
        let mut inflight = self.inflight.lock().await;
        if inflight
            .get(key)
            .is_some_and(|current| Arc::ptr_eq(current, flight))
        {
            inflight.remove(key);
        }
    }

    async fn read_cached<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = self.read_backend(key).await?;
        match decode(&bytes) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(%key, error = %err, "Cached value failed to decode");
                None
            }
        }
    }

    /// Like `read_cached` but keeps the bytes, checking only that they decode.
    async fn read_cached_bytes<T: DeserializeOwned>(&self, key: &str) -> Option<Vec<u8>> {
        let bytes = self.read_backend(key).await?;
        decode::<T>(&bytes).is_ok().then_some(bytes)
    }

    async fn read_backend(&self, key: &str) -> Option<Vec<u8>> {
        match self.cache.get(key).await {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!(%key, error = %err, "Cache read failed");
                None
            }
        }
    }
}

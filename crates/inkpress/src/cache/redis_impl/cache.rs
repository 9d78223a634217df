//! Redis-backed byte cache for multi-instance deployments.
//!
//! Entries are plain Redis strings under the keys handed in by
//! [`CacheStore`](crate::cache::CacheStore), which has already applied the
//! configured prefix. Expiry is delegated to Redis with millisecond
//! precision, so the lookup entries behave the same as in the LRU backend.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;

use inkpress_core::cache::{Cache, Result};

use super::error::map_redis_error;

/// Redis cache over a multiplexed [`redis::aio::ConnectionManager`].
///
/// The manager reconnects on its own, so one instance is shared by both
/// cached repositories.
pub struct RedisCache {
    conn: redis::aio::ConnectionManager,
}

impl RedisCache {
    /// Connects to `url`, e.g. `redis://localhost:6379`.
    ///
    /// Fails with `CacheError::ConnectionFailed` when the server does not answer.
    pub async fn new(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).map_err(map_redis_error)?;
        let conn = redis::aio::ConnectionManager::new(client)
            .await
            .map_err(map_redis_error)?;
        tracing::debug!(%url, "Connected to Redis cache");
        Ok(Self { conn })
    }
}

/// Whole milliseconds for `PSETEX`. Redis rejects zero, so sub-millisecond TTLs round up.
fn ttl_millis(ttl: Duration) -> u64 {
    u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1)
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        conn.get(key).await.map_err(map_redis_error)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()> {
        let mut conn = self.conn.clone();
        let written = match ttl {
            Some(ttl) => conn.pset_ex::<_, _, ()>(key, value, ttl_millis(ttl)).await,
            None => conn.set::<_, _, ()>(key, value).await,
        };
        written.map_err(map_redis_error)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        conn.exists(key).await.map_err(map_redis_error)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await.map_err(map_redis_error)
    }
}

//! Application state with repository-based storage.
//!
//! Holds the repository trait objects handed to request handlers. Whether
//! they are the plain SQLite repositories or the cached decorators is decided
//! once, here, from [`Config::cache_enabled`].

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;

use inkpress_core::metrics::CacheRecorder;
use inkpress_core::storage::{AccountRepository, ArticleRepository};

use crate::config::Config;
use crate::metrics::MetricsRecorder;
use crate::storage::{CachedAccountRepository, CachedArticleRepository, SqliteRepository};

// Both features together are rejected in `cache`; keep this pair disjoint so
// that error is the only one reported
#[cfg(all(feature = "memory", not(feature = "redis")))]
type CacheBackend = crate::cache::MemoryCache;

#[cfg(feature = "redis")]
type CacheBackend = crate::cache::RedisCache;

/// Shared application state.
///
/// Cloned for each request handler.
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<dyn AccountRepository>,
    pub articles: Arc<dyn ArticleRepository>,
    /// Renders the Prometheus exposition served at `/metrics`.
    pub metrics: PrometheusHandle,
}

impl AppState {
    /// Opens the database and wires the repositories described by `config`.
    pub async fn new(config: &Config, metrics: PrometheusHandle) -> anyhow::Result<Self> {
        // 1. Source of truth
        let sqlite = Arc::new(
            SqliteRepository::new(&config.sqlite_path)
                .await?
                .with_tag_batch_size(config.tag_batch_size),
        );

        if !config.cache_enabled {
            tracing::info!(path = %config.sqlite_path, "Cache disabled, using SQLite directly");
            return Ok(Self::from_parts(sqlite.clone(), sqlite, metrics));
        }

        // 2. One cache backend shared by both decorators
        let cache = Arc::new(cache_backend(config).await?);
        let recorder: Arc<dyn CacheRecorder> =
            Arc::new(MetricsRecorder::new(&config.metrics_namespace));

        // 3. Decorators
        let accounts = CachedAccountRepository::new(
            sqlite.clone(),
            cache.clone(),
            config.cache_prefix.clone(),
            config.cache_ttl(),
        )
        .with_recorder(recorder.clone());
        let articles = CachedArticleRepository::new(
            sqlite,
            cache,
            config.cache_prefix.clone(),
            config.cache_ttl(),
        )
        .with_recorder(recorder);

        tracing::info!(
            path = %config.sqlite_path,
            prefix = %config.cache_prefix,
            ttl_seconds = config.cache_ttl_seconds,
            "Cache enabled"
        );
        Ok(Self::from_parts(
            Arc::new(accounts),
            Arc::new(articles),
            metrics,
        ))
    }

    pub fn from_parts(
        accounts: Arc<dyn AccountRepository>,
        articles: Arc<dyn ArticleRepository>,
        metrics: PrometheusHandle,
    ) -> Self {
        Self {
            accounts,
            articles,
            metrics,
        }
    }
}

#[cfg(all(feature = "memory", not(feature = "redis")))]
async fn cache_backend(config: &Config) -> anyhow::Result<CacheBackend> {
    Ok(CacheBackend::new(config.cache_max_entries))
}

#[cfg(feature = "redis")]
async fn cache_backend(config: &Config) -> anyhow::Result<CacheBackend> {
    Ok(CacheBackend::new(&config.redis_url).await?)
}

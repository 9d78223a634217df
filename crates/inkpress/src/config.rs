use std::{env, str::FromStr, time::Duration};

use crate::storage::sqlite::DEFAULT_TAG_BATCH_SIZE;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Path to SQLite database file (default: "inkpress.db")
    pub sqlite_path: String,
    /// Wire the cached decorators in front of the repositories (default: true)
    pub cache_enabled: bool,
    /// Prefix prepended to every cache key (default: "article-")
    pub cache_prefix: String,
    /// Cache TTL in seconds, 0 disables expiry (default: 60)
    pub cache_ttl_seconds: u64,
    /// Maximum number of cache entries (default: 10,000)
    pub cache_max_entries: usize,
    /// Redis connection URL (default: "redis://localhost:6379")
    /// Note: Only used when the `redis` feature is enabled.
    #[allow(dead_code)]
    pub redis_url: String,
    /// Prefix of the exported cache counters (default: "article_server")
    pub metrics_namespace: String,
    /// Article ids per tag-loading query in list reads (default: 100)
    pub tag_batch_size: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `SQLITE_PATH` - SQLite database path (default: "inkpress.db")
    /// - `CACHE_ENABLED` - `false`/`0` wires the plain repositories (default: true)
    /// - `CACHE_PREFIX` - Cache key prefix (default: "article-")
    /// - `CACHE_TTL_SECONDS` - Cache TTL in seconds (default: 60)
    /// - `CACHE_MAX_ENTRIES` - Maximum cache entries (default: 10,000)
    /// - `REDIS_URL` - Redis connection URL (default: "redis://localhost:6379")
    /// - `METRICS_NAMESPACE` - Counter name prefix (default: "article_server")
    /// - `TAG_BATCH_SIZE` - Tag loading batch size (default: 100)
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        Self {
            sqlite_path: env::var("SQLITE_PATH").unwrap_or_else(|_| "inkpress.db".to_string()),
            cache_enabled: env::var("CACHE_ENABLED")
                .ok()
                .and_then(|v| parse_bool(&v))
                .unwrap_or(true),
            cache_prefix: env::var("CACHE_PREFIX").unwrap_or_else(|_| "article-".to_string()),
            cache_ttl_seconds: parse_var("CACHE_TTL_SECONDS", 60),
            cache_max_entries: parse_var("CACHE_MAX_ENTRIES", 10_000),
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            metrics_namespace: env::var("METRICS_NAMESPACE")
                .unwrap_or_else(|_| "article_server".to_string()),
            tag_batch_size: parse_var("TAG_BATCH_SIZE", DEFAULT_TAG_BATCH_SIZE),
        }
    }

    /// Get cache TTL as a Duration.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

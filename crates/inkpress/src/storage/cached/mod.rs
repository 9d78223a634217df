//! Cached repository decorators.
//!
//! This module provides decorator implementations that wrap the repository
//! traits with caching behavior. The decorators implement the cache-aside pattern:
//!
//! - **Reads**: Point lookups go through [`CacheStore::fetch`], so concurrent
//!   misses on one key hit the repository once
//! - **Writes**: Persist to the repository first, then refresh or invalidate the cache
//!
//! List queries and comment operations pass straight through.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let repo = Arc::new(SqliteRepository::new("inkpress.db").await?);
//! let cache = Arc::new(MemoryCache::new(10_000));
//!
//! let accounts = CachedAccountRepository::new(repo.clone(), cache.clone(), "article-", Duration::from_secs(60))
//!     .with_recorder(Arc::new(MetricsRecorder::new("article_server")));
//! ```
//!
//! [`CacheStore::fetch`]: crate::cache::CacheStore::fetch

mod account;
mod article;

pub use account::CachedAccountRepository;
pub use article::CachedArticleRepository;

//! Redis cache backend, enabled by the `redis` feature.
//!
//! Lets several server instances share one set of lookup entries so an
//! invalidation on one instance is seen by all of them.

mod cache;
mod error;

pub use cache::RedisCache;

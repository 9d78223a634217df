//! Sink for cache hit/miss observations.

/// Receives one observation per cached lookup.
///
/// `domain` is a constant cache domain such as
/// [`USER_BY_EMAIL`](crate::cache::USER_BY_EMAIL), never a per-entity key.
pub trait CacheRecorder: Send + Sync {
    fn record_cache(&self, domain: &str, hit: bool);
}

/// Recorder that drops every observation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRecorder;

impl CacheRecorder for NoopRecorder {
    fn record_cache(&self, _domain: &str, _hit: bool) {}
}

//! Cache hit/miss counters exported in Prometheus format.

use inkpress_core::metrics::CacheRecorder;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Emits `<namespace>_cache_total{key}` and `<namespace>_cache_hit{key}`.
#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    total_name: String,
    hit_name: String,
}

impl MetricsRecorder {
    pub fn new(namespace: &str) -> Self {
        Self {
            total_name: format!("{namespace}_cache_total"),
            hit_name: format!("{namespace}_cache_hit"),
        }
    }
}

impl CacheRecorder for MetricsRecorder {
    fn record_cache(&self, domain: &str, hit: bool) {
        metrics::counter!(self.total_name.clone(), "key" => domain.to_string()).increment(1);
        if hit {
            metrics::counter!(self.hit_name.clone(), "key" => domain.to_string()).increment(1);
        }
    }
}

/// Installs the global Prometheus recorder and returns the handle used to render it.
pub fn install_exporter() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    Ok(handle)
}

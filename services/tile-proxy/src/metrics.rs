//! Prometheus counters.

use anyhow::Result;
use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the global Prometheus recorder.
pub fn install_recorder() -> Result<PrometheusHandle> {
    Ok(PrometheusBuilder::new().install_recorder()?)
}

pub fn record_proxy_request(status: u16) {
    counter!("tile_proxy_requests_total", "status" => status.to_string()).increment(1);
}

pub fn record_upstream_failure() {
    counter!("tile_proxy_upstream_failures_total").increment(1);
}

pub fn record_rejected(reason: &'static str) {
    counter!("tile_proxy_rejected_total", "reason" => reason).increment(1);
}

pub fn record_vector_tile(tileset: &str, hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    counter!(
        "vector_tile_requests_total",
        "tileset" => tileset.to_string(),
        "result" => result
    )
    .increment(1);
}

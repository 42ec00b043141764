use anyhow::Result;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::time::Instant;
use tracing::info;

use crate::utils::error::ProviderError;

/// Fetch counters for the browser. Without a port nothing is exported and the
/// macros are no-ops.
#[derive(Clone, Debug, Default)]
pub struct MetricsCollector;

impl MetricsCollector {
    pub fn new(port: Option<u16>) -> Result<Self> {
        if let Some(port) = port {
            PrometheusBuilder::new()
                .with_http_listener(([127, 0, 0, 1], port))
                .install()?;
            info!(
                event = "metrics_exporter_started",
                message = "Prometheus exporter listening",
                port = port
            );
        }

        Ok(Self)
    }

    pub fn record_fetch_started(&self) {
        counter!("block_fetches_total").increment(1);
    }

    pub fn record_block(&self, block_number: u64, tx_count: usize, started: Instant) {
        counter!("transactions_loaded_total").increment(tx_count as u64);
        gauge!("browsed_block_number").set(block_number as f64);
        histogram!("block_fetch_seconds").record(started.elapsed().as_secs_f64());
    }

    pub fn record_failure(&self, error: &ProviderError) {
        counter!("block_fetch_failures_total", "kind" => error.kind()).increment(1);
    }

    pub fn record_stale(&self) {
        counter!("stale_fetches_discarded_total").increment(1);
    }
}

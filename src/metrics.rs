use axum::{routing::get, Router};
use metrics::{describe_counter, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::config::StabilizerConfig;
use crate::stabilizer::{METRIC_FRAMES, METRIC_PASSTHROUGH, METRIC_RESETS, METRIC_UNCERTAIN};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the global Prometheus recorder and publish the active
    /// stabilizer settings as static gauges. Call once per process.
    pub fn init(cfg: &StabilizerConfig) -> anyhow::Result<Self> {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| anyhow::anyhow!("prometheus: install recorder: {e}"))?;

        describe_counter!(METRIC_FRAMES, "Frames ingested by the stabilizer");
        describe_counter!(METRIC_UNCERTAIN, "Frames that ended below the confidence threshold");
        describe_counter!(METRIC_PASSTHROUGH, "Malformed frames passed through unchanged");
        describe_counter!(METRIC_RESETS, "Per-class history resets");

        gauge!("stabilizer_history_size").set(cfg.history_size as f64);
        gauge!("stabilizer_confidence_threshold").set(cfg.confidence_threshold);

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

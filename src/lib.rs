// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod classes;
pub mod config;
pub mod history;
pub mod metrics;
pub mod output;
pub mod prediction;
pub mod session;
pub mod stabilizer;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::prediction::{ClassIndex, RawPrediction, StabilizedPrediction, NO_DECISION};
pub use crate::stabilizer::PredictionStabilizer;

use tracing::info;

/// Build the full in-process app from an already loaded config.
/// `/metrics` is only mounted when a recorder handle is supplied.
pub fn app(cfg: &crate::config::AppConfig, metrics: Option<&crate::metrics::Metrics>) -> axum::Router {
    let state = api::AppState::from_config(cfg);
    let router = api::router(state);
    info!(
        history_size = cfg.stabilizer.history_size,
        threshold = cfg.stabilizer.confidence_threshold,
        classes = cfg.classes.initial.len(),
        "stabilizer app built"
    );
    match metrics {
        Some(m) => router.merge(m.router()),
        None => router,
    }
}

//! Prediction stabilizer service: binary entrypoint.
//! Loads config, installs tracing and the Prometheus recorder, and serves the
//! Axum router.

use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use prediction_stabilizer::config::AppConfig;
use prediction_stabilizer::metrics::Metrics;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("prediction_stabilizer=info,tower_http=warn"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().compact())
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = AppConfig::load().context("load stabilizer config")?;
    let metrics = Metrics::init(&cfg.stabilizer)?;
    let app = prediction_stabilizer::app(&cfg, Some(&metrics));

    let listener = tokio::net::TcpListener::bind(&cfg.server.bind_addr)
        .await
        .with_context(|| format!("bind {}", cfg.server.bind_addr))?;
    tracing::info!(addr = %cfg.server.bind_addr, "listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

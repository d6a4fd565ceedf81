//! Gatekeeper service entry point.

use std::time::Duration;

use anyhow::Context;
use axum::middleware;
use tower_http::timeout::TimeoutLayer;

use cep_weather::config::AppConfig;
use cep_weather::gatekeeper::{self, GatekeeperState};
use cep_weather::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    let _telemetry = telemetry::init("gatekeeper", &config.telemetry)?;

    let timeout = Duration::from_secs(config.http.timeout_seconds.into());
    let http = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("failed to build HTTP client")?;

    let state = GatekeeperState::new(http, config.gatekeeper.resolver_base_url.clone());
    let app = gatekeeper::router(state)
        .layer(middleware::from_fn(telemetry::trace_context))
        .layer(TimeoutLayer::new(timeout));

    let addr = format!("0.0.0.0:{}", config.gatekeeper.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("gatekeeper listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}

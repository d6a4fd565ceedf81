//! Resolver service entry point.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::middleware;
use tower_http::timeout::TimeoutLayer;

use cep_weather::config::AppConfig;
use cep_weather::lookup::viacep::ViaCepClient;
use cep_weather::lookup::weatherapi::WeatherApiClient;
use cep_weather::resolver::{self, ResolverState};
use cep_weather::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    config.validate_resolver()?;
    let _telemetry = telemetry::init("resolver", &config.telemetry)?;

    let timeout = Duration::from_secs(config.http.timeout_seconds.into());
    let http = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .context("failed to build HTTP client")?;

    let api_key = config
        .resolver
        .weather_api_key
        .clone()
        .context("weather API key missing after validation")?;

    let state = ResolverState::new(
        Arc::new(ViaCepClient::new(
            http.clone(),
            config.resolver.geocode_base_url.clone(),
        )),
        Arc::new(WeatherApiClient::new(
            http,
            config.resolver.weather_base_url.clone(),
            api_key,
        )),
    );

    let app = resolver::router(state)
        .layer(middleware::from_fn(telemetry::trace_context))
        .layer(TimeoutLayer::new(timeout));

    let addr = format!("0.0.0.0:{}", config.resolver.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("resolver listening on {addr}");

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

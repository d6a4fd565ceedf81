//! Gatekeeper service: validates the inbound postal code, forwards it to
//! the resolver with the trace context attached, and relays the resolver's
//! response verbatim.

use axum::body::Body;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::header::CONTENT_TYPE;
use axum::response::Response;
use axum::routing::post;
use axum::{Json, Router};
use opentelemetry::trace::Status;
use serde::Deserialize;
use tracing::instrument;
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::error::Error;
use crate::models::PostalCode;
use crate::telemetry;

#[derive(Clone)]
pub struct GatekeeperState {
    http: reqwest::Client,
    resolver_base_url: String,
}

impl GatekeeperState {
    pub fn new(http: reqwest::Client, resolver_base_url: String) -> Self {
        Self {
            http,
            resolver_base_url: resolver_base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CepRequest {
    cep: String,
}

pub fn router(state: GatekeeperState) -> Router {
    Router::new().route("/cep", post(handle_cep)).with_state(state)
}

#[instrument(name = "handle_cep", skip_all)]
async fn handle_cep(
    State(state): State<GatekeeperState>,
    payload: Result<Json<CepRequest>, JsonRejection>,
) -> Result<Response, Error> {
    let result = forward(&state, payload).await;

    let span = tracing::Span::current();
    match &result {
        Ok(_) => span.set_status(Status::Ok),
        Err(err) => span.set_status(Status::error(err.to_string())),
    }

    result
}

/// Validate the inbound payload and relay the resolver's response.
async fn forward(
    state: &GatekeeperState,
    payload: Result<Json<CepRequest>, JsonRejection>,
) -> Result<Response, Error> {
    let Json(request) = payload.map_err(|_| Error::InvalidRequestFormat)?;
    let cep = PostalCode::parse(&request.cep)?;
    tracing::Span::current().set_attribute("cep", cep.to_string());

    let url = format!("{}/cep/{}", state.resolver_base_url, cep);
    let mut headers = reqwest::header::HeaderMap::new();
    telemetry::inject_trace_context(&mut headers);

    // The underlying transport error is logged but never leaked to the
    // client.
    let upstream = state
        .http
        .get(&url)
        .headers(headers)
        .send()
        .await
        .map_err(|err| {
            tracing::error!(error = %err, "failed to contact resolver service");
            Error::UpstreamUnavailable(err.into())
        })?;

    let status = upstream.status();
    let content_type = upstream.headers().get(CONTENT_TYPE).cloned();
    let body = upstream.bytes().await.map_err(|err| {
        tracing::error!(error = %err, "failed to read resolver response");
        Error::UpstreamUnavailable(err.into())
    })?;

    // Opaque pass-through: the resolver's status and body are relayed
    // without reinterpretation.
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    if let Some(content_type) = content_type {
        response.headers_mut().insert(CONTENT_TYPE, content_type);
    }
    Ok(response)
}

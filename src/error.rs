//! Error taxonomy for the request pipeline.
//!
//! Every per-request failure maps to exactly one HTTP status and one
//! user-facing message, serialized as the canonical error envelope. Errors
//! are terminal for their request; nothing is retried.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use opentelemetry::trace::Status;
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::telemetry;

/// Main error type for the CEP pipeline.
#[derive(Debug, ThisError)]
pub enum Error {
    /// Request body could not be parsed as `{"cep": string}`.
    #[error("invalid request format")]
    InvalidRequestFormat,

    /// Postal code is not exactly 8 ASCII digits.
    #[error("invalid zipcode")]
    InvalidPostalCode,

    /// Geocoding upstream signalled that the code does not exist.
    #[error("can not find zipcode")]
    PostalCodeNotFound,

    /// Geocoding upstream failed for any reason other than not-found.
    #[error("error fetching city")]
    LocationLookupFailed(anyhow::Error),

    /// Weather upstream failed; unresolvable cities land here too.
    #[error("error fetching temperature")]
    WeatherLookupFailed(anyhow::Error),

    /// The resolver service could not be reached from the gatekeeper.
    #[error("resolver service unavailable")]
    UpstreamUnavailable(anyhow::Error),

    /// Startup-only: missing or invalid configuration. Aborts the process,
    /// never surfaced per request.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// The single HTTP status this error maps to.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::InvalidRequestFormat => StatusCode::BAD_REQUEST,
            Error::InvalidPostalCode => StatusCode::UNPROCESSABLE_ENTITY,
            Error::PostalCodeNotFound => StatusCode::NOT_FOUND,
            Error::LocationLookupFailed(_)
            | Error::WeatherLookupFailed(_)
            | Error::UpstreamUnavailable(_)
            | Error::Config { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Canonical client-facing error shape, used uniformly by both services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub message: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // The request-level span is current here; mark it failed exactly once.
        tracing::Span::current().set_status(Status::error(self.to_string()));

        let envelope = ErrorEnvelope {
            message: self.to_string(),
            code: status.as_u16(),
            trace_id: telemetry::current_trace_id(),
        };
        (status, Json(envelope)).into_response()
    }
}

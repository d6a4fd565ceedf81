//! HTTP-backed city lookup against a ViaCEP-style geocoding API.

use anyhow::Context as _;
use async_trait::async_trait;
use opentelemetry::trace::Status;
use opentelemetry_semantic_conventions::attribute::{HTTP_RESPONSE_STATUS_CODE, URL_FULL};
use serde::Deserialize;
use tracing::instrument;
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::lookup::{CityLookup, LookupError};
use crate::models::PostalCode;
use crate::telemetry;

/// Client for `GET {base_url}{cep}/json/` returning `{"localidade": ...}`.
#[derive(Debug, Clone)]
pub struct ViaCepClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ViaCepResponse {
    #[serde(default)]
    localidade: Option<String>,
}

impl ViaCepClient {
    pub fn new(http: reqwest::Client, base_url: String) -> Self {
        Self { http, base_url }
    }

    async fn fetch_city(&self, cep: &PostalCode) -> Result<String, LookupError> {
        let url = format!("{}{}/json/", self.base_url, cep);
        let span = tracing::Span::current();
        span.set_attribute(URL_FULL, url.clone());

        let mut headers = reqwest::header::HeaderMap::new();
        telemetry::inject_trace_context(&mut headers);

        let response = self
            .http
            .get(&url)
            .headers(headers)
            .send()
            .await
            .context("request to geocoding service failed")?;

        let status = response.status();
        span.set_attribute(HTTP_RESPONSE_STATUS_CODE, i64::from(status.as_u16()));

        // The upstream signals unknown codes two ways: a non-200 status, or
        // a 200 whose locality field is empty. Both are not-found.
        if !status.is_success() {
            return Err(LookupError::NotFound);
        }

        let payload: ViaCepResponse = response
            .json()
            .await
            .context("malformed geocoding response payload")?;

        match payload.localidade {
            Some(city) if !city.is_empty() => Ok(city),
            _ => Err(LookupError::NotFound),
        }
    }
}

#[async_trait]
impl CityLookup for ViaCepClient {
    #[instrument(name = "lookup_city", skip_all, fields(cep = %cep))]
    async fn city_for_cep(&self, cep: &PostalCode) -> Result<String, LookupError> {
        let result = self.fetch_city(cep).await;

        let span = tracing::Span::current();
        match &result {
            Ok(city) => {
                span.set_attribute("city", city.clone());
                span.set_status(Status::Ok);
            }
            Err(err) => span.set_status(Status::error(err.to_string())),
        }

        result
    }
}

//! HTTP-backed temperature lookup against a WeatherAPI-style service.

use anyhow::Context as _;
use async_trait::async_trait;
use opentelemetry::trace::Status;
use opentelemetry_semantic_conventions::attribute::HTTP_RESPONSE_STATUS_CODE;
use serde::Deserialize;
use tracing::instrument;
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::lookup::{LookupError, TemperatureLookup};
use crate::telemetry;

/// Client for `GET {base_url}?key={api_key}&q={city}` returning
/// `{"current": {"temp_c": ...}}`.
///
/// The API key is validated at startup; by the time a request reaches this
/// client the key is known to be present.
#[derive(Debug, Clone)]
pub struct WeatherApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct WeatherApiResponse {
    current: CurrentConditions,
}

#[derive(Debug, Deserialize)]
struct CurrentConditions {
    temp_c: f64,
}

impl WeatherApiClient {
    pub fn new(http: reqwest::Client, base_url: String, api_key: String) -> Self {
        Self {
            http,
            base_url,
            api_key,
        }
    }

    async fn fetch_temperature(&self, city: &str) -> Result<f64, LookupError> {
        let span = tracing::Span::current();

        let mut headers = reqwest::header::HeaderMap::new();
        telemetry::inject_trace_context(&mut headers);

        let response = self
            .http
            .get(&self.base_url)
            .query(&[("key", self.api_key.as_str()), ("q", city)])
            .headers(headers)
            .send()
            .await
            .context("request to weather service failed")?;

        let status = response.status();
        span.set_attribute(HTTP_RESPONSE_STATUS_CODE, i64::from(status.as_u16()));

        if !status.is_success() {
            return Err(LookupError::Transport(anyhow::anyhow!(
                "weather service returned status {status} for city '{city}'"
            )));
        }

        let payload: WeatherApiResponse = response
            .json()
            .await
            .context("malformed weather response payload")?;

        Ok(payload.current.temp_c)
    }
}

#[async_trait]
impl TemperatureLookup for WeatherApiClient {
    #[instrument(name = "lookup_temperature", skip(self))]
    async fn temperature_for_city(&self, city: &str) -> Result<f64, LookupError> {
        let result = self.fetch_temperature(city).await;

        let span = tracing::Span::current();
        match &result {
            Ok(temp_c) => {
                span.set_attribute("temperature_c", *temp_c);
                span.set_status(Status::Ok);
            }
            Err(err) => span.set_status(Status::error(err.to_string())),
        }

        result
    }
}

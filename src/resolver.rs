//! Resolver service: orchestrates the two external lookups and assembles
//! the temperature report.
//!
//! The steps are strictly sequential: the weather lookup never starts
//! before the city lookup has completed.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use opentelemetry::trace::Status;
use tracing::instrument;
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::error::Error;
use crate::lookup::{CityLookup, LookupError, TemperatureLookup};
use crate::models::{PostalCode, TemperatureReport};

/// Lookup collaborators, injected at construction time.
#[derive(Clone)]
pub struct ResolverState {
    city_lookup: Arc<dyn CityLookup>,
    temperature_lookup: Arc<dyn TemperatureLookup>,
}

impl ResolverState {
    pub fn new(
        city_lookup: Arc<dyn CityLookup>,
        temperature_lookup: Arc<dyn TemperatureLookup>,
    ) -> Self {
        Self {
            city_lookup,
            temperature_lookup,
        }
    }
}

pub fn router(state: ResolverState) -> Router {
    Router::new()
        .route("/cep/{cep}", get(resolve_cep))
        .with_state(state)
}

#[instrument(name = "resolve_cep", skip(state), fields(cep = %cep))]
async fn resolve_cep(
    State(state): State<ResolverState>,
    Path(cep): Path<String>,
) -> Result<Json<TemperatureReport>, Error> {
    let result = resolve(&state, &cep).await;

    let span = tracing::Span::current();
    match &result {
        Ok(_) => span.set_status(Status::Ok),
        Err(err) => span.set_status(Status::error(err.to_string())),
    }

    result.map(Json)
}

/// The full resolve operation: validate, look up city, look up
/// temperature, convert.
async fn resolve(state: &ResolverState, raw_cep: &str) -> Result<TemperatureReport, Error> {
    // Defensive re-validation; the gatekeeper already checked the shape.
    let cep = PostalCode::parse(raw_cep)?;

    let city = state
        .city_lookup
        .city_for_cep(&cep)
        .await
        .map_err(|err| match err {
            LookupError::NotFound => Error::PostalCodeNotFound,
            LookupError::Transport(cause) => {
                tracing::error!(error = %cause, %cep, "city lookup failed");
                Error::LocationLookupFailed(cause)
            }
        })?;

    let span = tracing::Span::current();
    span.set_attribute("city", city.clone());

    let temp_c = state
        .temperature_lookup
        .temperature_for_city(&city)
        .await
        .map_err(|err| {
            let cause = match err {
                LookupError::Transport(cause) => cause,
                LookupError::NotFound => anyhow::anyhow!("temperature not found"),
            };
            tracing::error!(error = %cause, city, "temperature lookup failed");
            Error::WeatherLookupFailed(cause)
        })?;

    span.set_attribute("temperature_c", temp_c);
    Ok(TemperatureReport::from_celsius(city, temp_c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::error::ErrorEnvelope;

    enum CityOutcome {
        Found(&'static str),
        NotFound,
        Broken,
    }

    struct StubCityLookup {
        outcome: CityOutcome,
        calls: AtomicUsize,
    }

    impl StubCityLookup {
        fn new(outcome: CityOutcome) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl CityLookup for StubCityLookup {
        async fn city_for_cep(&self, _cep: &PostalCode) -> Result<String, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.outcome {
                CityOutcome::Found(city) => Ok((*city).to_string()),
                CityOutcome::NotFound => Err(LookupError::NotFound),
                CityOutcome::Broken => Err(LookupError::Transport(anyhow::anyhow!("boom"))),
            }
        }
    }

    struct StubTemperatureLookup {
        temp_c: Option<f64>,
        calls: AtomicUsize,
    }

    impl StubTemperatureLookup {
        fn new(temp_c: Option<f64>) -> Arc<Self> {
            Arc::new(Self {
                temp_c,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl TemperatureLookup for StubTemperatureLookup {
        async fn temperature_for_city(&self, _city: &str) -> Result<f64, LookupError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.temp_c {
                Some(temp_c) => Ok(temp_c),
                None => Err(LookupError::Transport(anyhow::anyhow!("weather down"))),
            }
        }
    }

    async fn request(
        city: &Arc<StubCityLookup>,
        temperature: &Arc<StubTemperatureLookup>,
        uri: &str,
    ) -> (StatusCode, serde_json::Value) {
        let app = router(ResolverState::new(city.clone(), temperature.clone()));
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn resolves_to_full_report() {
        let city = StubCityLookup::new(CityOutcome::Found("São Paulo"));
        let temperature = StubTemperatureLookup::new(Some(25.5));

        let (status, body) = request(&city, &temperature, "/cep/01001000").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["city"], "São Paulo");
        assert_eq!(body["temp_C"], 25.5);
        assert_eq!(body["temp_F"], 77.9);
        assert_eq!(body["temp_K"], 298.65);
        assert_eq!(city.calls.load(Ordering::SeqCst), 1);
        assert_eq!(temperature.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalid_cep_is_rejected_without_lookups() {
        let city = StubCityLookup::new(CityOutcome::Found("São Paulo"));
        let temperature = StubTemperatureLookup::new(Some(25.5));

        for uri in ["/cep/1234567", "/cep/123456789", "/cep/1234567a"] {
            let (status, body) = request(&city, &temperature, uri).await;
            assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
            let envelope: ErrorEnvelope = serde_json::from_value(body).unwrap();
            assert_eq!(envelope.message, "invalid zipcode");
            assert_eq!(envelope.code, 422);
        }

        assert_eq!(city.calls.load(Ordering::SeqCst), 0);
        assert_eq!(temperature.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_cep_is_404_and_skips_weather() {
        let city = StubCityLookup::new(CityOutcome::NotFound);
        let temperature = StubTemperatureLookup::new(Some(25.5));

        let (status, body) = request(&city, &temperature, "/cep/99999999").await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "can not find zipcode");
        assert_eq!(body["code"], 404);
        assert_eq!(temperature.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn city_transport_failure_is_500() {
        let city = StubCityLookup::new(CityOutcome::Broken);
        let temperature = StubTemperatureLookup::new(Some(25.5));

        let (status, body) = request(&city, &temperature, "/cep/01001000").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "error fetching city");
        assert_eq!(temperature.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn weather_failure_is_500_after_city_lookup() {
        let city = StubCityLookup::new(CityOutcome::Found("São Paulo"));
        let temperature = StubTemperatureLookup::new(None);

        let (status, body) = request(&city, &temperature, "/cep/01001000").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "error fetching temperature");
        assert_eq!(body["code"], 500);
        assert_eq!(city.calls.load(Ordering::SeqCst), 1);
        assert_eq!(temperature.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn repeated_requests_yield_identical_reports() {
        let city = StubCityLookup::new(CityOutcome::Found("São Paulo"));
        let temperature = StubTemperatureLookup::new(Some(25.5));

        let (_, first) = request(&city, &temperature, "/cep/01001000").await;
        let (_, second) = request(&city, &temperature, "/cep/01001000").await;
        assert_eq!(first, second);
    }
}

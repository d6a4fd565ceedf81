//! Configuration for both services.
//!
//! Loaded once at startup from an optional `config.toml` plus environment
//! variables with the `CEPWEATHER` prefix, validated, and passed by value
//! into the component constructors. Never re-read per request.

use std::path::PathBuf;

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Root configuration for the CEP pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Edge service settings
    pub gatekeeper: GatekeeperConfig,
    /// Backend service settings
    pub resolver: ResolverConfig,
    /// Trace exporter settings
    pub telemetry: TelemetryConfig,
    /// Shared HTTP client/server settings
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatekeeperConfig {
    /// Port the gatekeeper listens on
    pub port: u16,
    /// Base URL of the resolver service
    pub resolver_base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Port the resolver listens on
    pub port: u16,
    /// Base URL of the geocoding API; the CEP and `/json/` are appended
    pub geocode_base_url: String,
    /// Full URL of the weather API current-conditions endpoint
    pub weather_base_url: String,
    /// Weather API key. Required by the resolver binary; checked at startup.
    pub weather_api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// OTLP http-proto trace endpoint
    pub otlp_endpoint: String,
    /// Fallback log filter when RUST_LOG is not set
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Deadline applied to inbound requests and every outbound call
    pub timeout_seconds: u32,
}

impl Default for GatekeeperConfig {
    fn default() -> Self {
        Self {
            port: 8081,
            resolver_base_url: "http://localhost:8090".to_string(),
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            port: 8090,
            geocode_base_url: "https://viacep.com.br/ws/".to_string(),
            weather_base_url: "http://api.weatherapi.com/v1/current.json".to_string(),
            weather_api_key: None,
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            otlp_endpoint: "http://localhost:4318/v1/traces".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_seconds: 10 }
    }
}

impl AppConfig {
    /// Load configuration from `config.toml` (if present) and environment
    /// variables, then validate the settings both services share.
    pub fn load() -> crate::Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from the specified path.
    pub fn load_from_path(config_path: Option<PathBuf>) -> crate::Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| PathBuf::from("config.toml"));
        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file)
                    .required(false)
                    .format(FileFormat::Toml),
            );
        }

        builder = builder.add_source(
            Environment::with_prefix("CEPWEATHER")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|err| Error::config(format!("failed to build configuration: {err}")))?;

        let config: AppConfig = settings
            .try_deserialize()
            .map_err(|err| Error::config(format!("failed to deserialize configuration: {err}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate settings needed by either service.
    pub fn validate(&self) -> crate::Result<()> {
        validate_url("gatekeeper.resolver_base_url", &self.gatekeeper.resolver_base_url)?;
        validate_url("resolver.geocode_base_url", &self.resolver.geocode_base_url)?;
        validate_url("resolver.weather_base_url", &self.resolver.weather_base_url)?;
        validate_url("telemetry.otlp_endpoint", &self.telemetry.otlp_endpoint)?;

        if self.http.timeout_seconds == 0 || self.http.timeout_seconds > 300 {
            return Err(Error::config(
                "http.timeout_seconds must be between 1 and 300",
            ));
        }

        Ok(())
    }

    /// Validate settings the resolver binary cannot run without. A missing
    /// weather API key aborts startup here instead of failing per request.
    pub fn validate_resolver(&self) -> crate::Result<()> {
        match self.resolver.weather_api_key.as_deref() {
            Some(key) if !key.is_empty() => Ok(()),
            _ => Err(Error::config(
                "resolver.weather_api_key is not set. \
                 Provide it via config.toml or CEPWEATHER_RESOLVER__WEATHER_API_KEY.",
            )),
        }
    }
}

fn validate_url(field: &str, value: &str) -> crate::Result<()> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(Error::config(format!(
            "{field} must be an HTTP or HTTPS URL, got '{value}'"
        )))
    }
}

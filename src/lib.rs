//! `cep-weather` - resolve a Brazilian postal code (CEP) to a city and its
//! current temperature in Celsius, Fahrenheit and Kelvin.
//!
//! Two services compose the pipeline: the gatekeeper validates and forwards
//! requests, the resolver performs the geocoding and weather lookups. A W3C
//! trace context is propagated across both hops and both external calls.

pub mod config;
pub mod error;
pub mod gatekeeper;
pub mod lookup;
pub mod models;
pub mod resolver;
pub mod telemetry;

pub use config::AppConfig;
pub use error::{Error, ErrorEnvelope};
pub use models::{PostalCode, TemperatureReport};

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, Error>;

//! External lookup collaborators consumed by the resolver.
//!
//! Both lookups are capability traits so the resolver can be wired with the
//! real HTTP-backed clients or with test doubles. The error split matters:
//! `NotFound` maps to 404 upstream, `Transport` to 500.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::PostalCode;

pub mod viacep;
pub mod weatherapi;

/// Failure modes of an external lookup.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The upstream signalled that the requested entity does not exist.
    /// For the geocoding API this includes an empty locality field inside
    /// a 200 response.
    #[error("not found")]
    NotFound,

    /// Network failure, unexpected status, or malformed payload.
    #[error(transparent)]
    Transport(#[from] anyhow::Error),
}

/// Maps a postal code to a city name.
#[async_trait]
pub trait CityLookup: Send + Sync {
    async fn city_for_cep(&self, cep: &PostalCode) -> Result<String, LookupError>;
}

/// Maps a city name to its current temperature in Celsius.
///
/// There is no distinct not-found at this layer; an unresolvable city is
/// indistinguishable from a transport failure.
#[async_trait]
pub trait TemperatureLookup: Send + Sync {
    async fn temperature_for_city(&self, city: &str) -> Result<f64, LookupError>;
}

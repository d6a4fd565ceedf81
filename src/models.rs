//! Request and response types for the CEP pipeline, plus the temperature
//! unit conversions applied before a report is sent.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Validated Brazilian postal code: exactly 8 ASCII digits.
///
/// Construction is the only validation point; once built the value is
/// immutable and safe to interpolate into lookup URLs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PostalCode(String);

impl PostalCode {
    /// Parse a raw string into a postal code.
    ///
    /// Rejects anything that is not exactly 8 ASCII digits.
    pub fn parse(raw: &str) -> crate::Result<Self> {
        if raw.len() == 8 && raw.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(raw.to_owned()))
        } else {
            Err(Error::InvalidPostalCode)
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PostalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PostalCode {
    type Err = Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        Self::parse(s)
    }
}

/// Composed result of one resolved request: the city and its current
/// temperature in all three units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemperatureReport {
    pub city: String,
    #[serde(rename = "temp_C")]
    pub temp_c: f64,
    #[serde(rename = "temp_F")]
    pub temp_f: f64,
    #[serde(rename = "temp_K")]
    pub temp_k: f64,
}

impl TemperatureReport {
    /// Build a report from the upstream Celsius reading. Fahrenheit and
    /// Kelvin are derived and rounded to 2 decimal places; the Celsius
    /// value is carried through as read.
    #[must_use]
    pub fn from_celsius(city: String, temp_c: f64) -> Self {
        Self {
            city,
            temp_c,
            temp_f: celsius_to_fahrenheit(temp_c),
            temp_k: celsius_to_kelvin(temp_c),
        }
    }
}

/// Convert Celsius to Fahrenheit, rounded to 2 decimal places.
#[must_use]
pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    round2(celsius * 1.8 + 32.0)
}

/// Convert Celsius to Kelvin, rounded to 2 decimal places.
#[must_use]
pub fn celsius_to_kelvin(celsius: f64) -> f64 {
    round2(celsius + 273.15)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

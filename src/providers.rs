//! Upstream data provider contracts.
//!
//! The orchestrator only talks to these traits, so the HTTP client can be
//! swapped for stubs in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;

use crate::domain::{
    GeoPoint, HourlySample, PollutantReading, UvIndex, WeatherCondition, WeatherReading,
};
use crate::errors::AirError;

/// Weather fields a provider actually reports. The UV index is filled in later.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservedWeather {
    pub temperature_c: f64,
    pub humidity_pct: u8,
    pub wind_kph: f64,
    pub condition: WeatherCondition,
    pub description: String,
}

impl ObservedWeather {
    #[must_use]
    pub fn with_uv(self, uv_index: UvIndex, uv_index_synthetic: bool) -> WeatherReading {
        WeatherReading {
            temperature_c: self.temperature_c,
            humidity_pct: self.humidity_pct,
            wind_kph: self.wind_kph,
            condition: self.condition,
            description: self.description,
            uv_index,
            uv_index_synthetic,
        }
    }
}

/// The four lookups the pipeline depends on.
#[async_trait]
pub trait EnvironmentProvider: Send + Sync {
    /// Best match for a place name, or `None` if nothing matched.
    async fn geocode(&self, query: &str) -> Result<Option<GeoPoint>, AirError>;

    /// Latest instantaneous pollutant concentrations.
    async fn current_pollution(&self, point: &GeoPoint) -> Result<PollutantReading, AirError>;

    async fn current_weather(&self, point: &GeoPoint) -> Result<ObservedWeather, AirError>;

    /// Hourly samples in `[start, end]`, oldest first.
    async fn pollution_history(
        &self,
        point: &GeoPoint,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<HourlySample>, AirError>;
}

/// Source of the UV index shown with the weather.
pub trait UvIndexSource: Send + Sync {
    fn uv_index(&self, point: &GeoPoint) -> UvIndex;

    /// True when the value is a placeholder rather than a measurement.
    fn is_synthetic(&self) -> bool;
}

/// Placeholder UV index: uniformly random in `[0, 9]`. No real source is wired.
#[derive(Debug, Default, Clone, Copy)]
pub struct SyntheticUv;

impl UvIndexSource for SyntheticUv {
    fn uv_index(&self, _point: &GeoPoint) -> UvIndex {
        UvIndex::clamped(rand::rng().random_range(0..UvIndex::MAX))
    }

    fn is_synthetic(&self) -> bool {
        true
    }
}

/// Operator-supplied constant UV index. Still a placeholder, not a measurement.
#[derive(Debug, Clone, Copy)]
pub struct FixedUv(pub UvIndex);

impl UvIndexSource for FixedUv {
    fn uv_index(&self, _point: &GeoPoint) -> UvIndex {
        self.0
    }

    fn is_synthetic(&self) -> bool {
        true
    }
}

//! Data models for OpenWeatherMap API responses.
//!
//! These structures match the JSON returned by the geocoding, air pollution and
//! current weather endpoints. Each response type validates itself and converts
//! into the domain types; anything we cannot interpret is `PartialData`.

use chrono::{TimeZone, Utc};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::domain::{GeoPoint, HourlySample, PollutantReading, WeatherCondition};
use crate::errors::{AirError, Step};
use crate::providers::ObservedWeather;

/// m/s to km/h.
const MPS_TO_KPH: f64 = 3.6;

/// Decode a response body for a pipeline step.
///
/// Syntax errors and truncated bodies mean the upstream is broken; well-formed
/// JSON with the wrong shape means we got data we cannot interpret.
///
/// # Errors
///
/// Returns `UpstreamUnavailable` for unparseable JSON, `PartialData` for shape mismatches.
pub fn decode<T: DeserializeOwned>(step: Step, body: &[u8]) -> Result<T, AirError> {
    serde_json::from_slice(body).map_err(|e| match e.classify() {
        serde_json::error::Category::Data => AirError::partial(step, e),
        _ => AirError::upstream(step, format!("malformed JSON: {e}")),
    })
}

/// One entry of the `/geo/1.0/direct` array.
#[derive(Debug, Clone, Deserialize)]
pub struct GeocodeEntry {
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub state: Option<String>,
}

impl GeocodeEntry {
    /// "Name, State" when a state is reported, otherwise just the name.
    #[must_use]
    pub fn display_name(&self) -> String {
        match self.state.as_deref().map(str::trim) {
            Some(state) if !state.is_empty() => format!("{}, {state}", self.name),
            _ => self.name.clone(),
        }
    }

    /// # Errors
    ///
    /// Returns `PartialData` for an empty name or out-of-range coordinates.
    pub fn into_geo_point(self) -> Result<GeoPoint, AirError> {
        if self.name.trim().is_empty() {
            return Err(AirError::partial(Step::Geocode, "empty place name"));
        }
        let name = self.display_name();
        GeoPoint::new(self.lat, self.lon, name).map_err(|e| AirError::partial(Step::Geocode, e))
    }
}

/// Response of `/data/2.5/air_pollution` and `/data/2.5/air_pollution/history`.
#[derive(Debug, Clone, Deserialize)]
pub struct PollutionResponse {
    pub list: Vec<PollutionEntry>,
}

/// A single timestamped pollution sample.
#[derive(Debug, Clone, Deserialize)]
pub struct PollutionEntry {
    /// Unix time in seconds
    pub dt: i64,
    pub components: Components,
}

/// Concentrations in µg/m³.
#[derive(Debug, Clone, Deserialize)]
pub struct Components {
    pub pm2_5: f64,
    pub pm10: f64,
    pub no2: f64,
    pub o3: f64,
    pub so2: f64,
}

impl Components {
    fn to_reading(&self, step: Step) -> Result<PollutantReading, AirError> {
        PollutantReading::new(self.pm2_5, self.pm10, self.no2, self.o3, self.so2)
            .map_err(|e| AirError::partial(step, e))
    }
}

impl PollutionResponse {
    /// The current reading is the first list entry.
    ///
    /// # Errors
    ///
    /// Returns `PartialData` if the list is empty or a concentration is invalid.
    pub fn into_current(self) -> Result<PollutantReading, AirError> {
        let entry = self
            .list
            .first()
            .ok_or_else(|| AirError::partial(Step::Pollution, "empty pollution list"))?;
        entry.components.to_reading(Step::Pollution)
    }

    /// All entries as hourly samples, in response order.
    ///
    /// # Errors
    ///
    /// Returns `PartialData` for an invalid timestamp or concentration.
    pub fn into_hourly(self) -> Result<Vec<HourlySample>, AirError> {
        self.list
            .iter()
            .map(|entry| {
                let timestamp = Utc.timestamp_opt(entry.dt, 0).single().ok_or_else(|| {
                    AirError::partial(Step::History, format!("invalid timestamp {}", entry.dt))
                })?;
                Ok(HourlySample {
                    timestamp,
                    pollutants: entry.components.to_reading(Step::History)?,
                })
            })
            .collect()
    }
}

/// Response of `/data/2.5/weather` with `units=metric`.
#[derive(Debug, Clone, Deserialize)]
pub struct WeatherResponse {
    pub weather: Vec<WeatherSummary>,
    pub main: MainBlock,
    pub wind: Wind,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherSummary {
    /// Coarse group, e.g. "Clouds"
    pub main: String,
    pub description: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MainBlock {
    /// °C
    pub temp: f64,
    /// Percent
    pub humidity: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Wind {
    /// m/s
    pub speed: f64,
}

impl WeatherResponse {
    /// # Errors
    ///
    /// Returns `PartialData` if the summary list is empty or a value is out of range.
    pub fn into_observed(self) -> Result<ObservedWeather, AirError> {
        let summary = self
            .weather
            .into_iter()
            .next()
            .ok_or_else(|| AirError::partial(Step::Weather, "empty weather list"))?;

        if !self.main.temp.is_finite() {
            return Err(AirError::partial(Step::Weather, "temperature is not a number"));
        }
        if !(0.0..=100.0).contains(&self.main.humidity) {
            return Err(AirError::partial(
                Step::Weather,
                format!("humidity {} out of range [0, 100]", self.main.humidity),
            ));
        }
        if !self.wind.speed.is_finite() || self.wind.speed < 0.0 {
            return Err(AirError::partial(
                Step::Weather,
                format!("invalid wind speed {}", self.wind.speed),
            ));
        }

        // humidity checked to be within [0, 100] above
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let humidity_pct = self.main.humidity.round() as u8;

        Ok(ObservedWeather {
            temperature_c: self.main.temp,
            humidity_pct,
            wind_kph: self.wind.speed * MPS_TO_KPH,
            condition: WeatherCondition::from_main(&summary.main),
            description: summary.description,
        })
    }
}

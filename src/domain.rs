//! Domain types for the environmental data pipeline.
//!
//! Everything here is immutable once constructed. Constructors validate the
//! ranges the rest of the crate relies on.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::aqi::AqiValue;
use crate::category::{self, Advisory, AqiCategory};
use crate::errors::AirError;

/// A geocoded location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub resolved_name: String,
}

impl GeoPoint {
    /// Create a point, rejecting out-of-range coordinates.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` if latitude or longitude is out of range.
    pub fn new(
        latitude: f64,
        longitude: f64,
        resolved_name: impl Into<String>,
    ) -> Result<Self, AirError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(AirError::InvalidInput(format!(
                "latitude {latitude} out of range [-90, 90]"
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(AirError::InvalidInput(format!(
                "longitude {longitude} out of range [-180, 180]"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
            resolved_name: resolved_name.into(),
        })
    }
}

/// Pollutant concentrations in µg/m³ at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PollutantReading {
    pub pm2_5: f64,
    pub pm10: f64,
    pub no2: f64,
    pub o3: f64,
    pub so2: f64,
}

impl PollutantReading {
    /// # Errors
    ///
    /// Returns `InvalidInput` naming the first negative or non-finite concentration.
    pub fn new(pm2_5: f64, pm10: f64, no2: f64, o3: f64, so2: f64) -> Result<Self, AirError> {
        for (name, value) in [
            ("pm2_5", pm2_5),
            ("pm10", pm10),
            ("no2", no2),
            ("o3", o3),
            ("so2", so2),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(AirError::InvalidInput(format!(
                    "{name} concentration must be a non-negative number, got {value}"
                )));
            }
        }
        Ok(Self {
            pm2_5,
            pm10,
            no2,
            o3,
            so2,
        })
    }
}

/// Coarse weather condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WeatherCondition {
    Clear,
    Clouds,
    Mist,
    Fog,
    Rain,
    Other,
}

impl WeatherCondition {
    /// Parse the provider's coarse condition name. Unknown names map to `Other`.
    #[must_use]
    pub fn from_main(main: &str) -> Self {
        match main.trim().to_lowercase().as_str() {
            "clear" => Self::Clear,
            "clouds" => Self::Clouds,
            "mist" => Self::Mist,
            "fog" => Self::Fog,
            "rain" => Self::Rain,
            _ => Self::Other,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::Clouds => "Clouds",
            Self::Mist => "Mist",
            Self::Fog => "Fog",
            Self::Rain => "Rain",
            Self::Other => "Other",
        }
    }

    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Clear => "☀️",
            Self::Clouds => "☁️",
            Self::Mist | Self::Fog => "🌫️",
            Self::Rain | Self::Other => "🌧️",
        }
    }
}

/// UV index in `[0, 10]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct UvIndex(u8);

impl UvIndex {
    pub const MAX: u8 = 10;

    /// # Errors
    ///
    /// Returns `InvalidInput` if the value exceeds 10.
    pub fn new(value: u8) -> Result<Self, AirError> {
        if value > Self::MAX {
            return Err(AirError::InvalidInput(format!(
                "uv index {value} out of range [0, {}]",
                Self::MAX
            )));
        }
        Ok(Self(value))
    }

    /// Saturate at 10 instead of failing.
    #[must_use]
    pub const fn clamped(value: u8) -> Self {
        if value > Self::MAX { Self(Self::MAX) } else { Self(value) }
    }

    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

/// Current weather at a location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherReading {
    pub temperature_c: f64,
    pub humidity_pct: u8,
    pub wind_kph: f64,
    pub condition: WeatherCondition,
    pub description: String,
    pub uv_index: UvIndex,
    /// The UV index is a placeholder, not telemetry.
    pub uv_index_synthetic: bool,
}

/// One hourly sample from the pollution history feed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HourlySample {
    pub timestamp: DateTime<Utc>,
    pub pollutants: PollutantReading,
}

/// One day of the AQI trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HistoryPoint {
    pub date: NaiveDate,
    pub aqi: AqiValue,
}

impl HistoryPoint {
    /// Chart label, e.g. "Oct 9".
    #[must_use]
    pub fn label(&self) -> String {
        self.date.format("%b %-d").to_string()
    }
}

/// Everything known about one resolved query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub location: GeoPoint,
    pub pollutants: PollutantReading,
    pub aqi: AqiValue,
    pub category: AqiCategory,
    pub weather: WeatherReading,
    pub history: Vec<HistoryPoint>,
    pub fetched_at: DateTime<Utc>,
}

impl Snapshot {
    #[must_use]
    pub fn advisory(&self) -> &'static Advisory {
        category::advisory(self.aqi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geo_point_ranges() {
        assert!(GeoPoint::new(28.61, 77.21, "New Delhi").is_ok());
        assert!(GeoPoint::new(91.0, 0.0, "x").is_err());
        assert!(GeoPoint::new(0.0, -180.5, "x").is_err());
        assert!(GeoPoint::new(f64::NAN, 0.0, "x").is_err());
    }

    #[test]
    fn test_pollutants_reject_negative() {
        assert!(PollutantReading::new(1.0, 2.0, 3.0, 4.0, 5.0).is_ok());
        let err = PollutantReading::new(1.0, 2.0, -0.1, 4.0, 5.0).unwrap_err();
        assert!(err.to_string().contains("no2"));
        assert!(PollutantReading::new(f64::NAN, 0.0, 0.0, 0.0, 0.0).is_err());
    }

    #[test]
    fn test_condition_parse() {
        assert_eq!(WeatherCondition::from_main("Clear"), WeatherCondition::Clear);
        assert_eq!(WeatherCondition::from_main("clouds"), WeatherCondition::Clouds);
        assert_eq!(WeatherCondition::from_main("Haze"), WeatherCondition::Other);
        assert_eq!(WeatherCondition::Fog.icon(), WeatherCondition::Mist.icon());
    }

    #[test]
    fn test_uv_index_range() {
        assert_eq!(UvIndex::new(10).unwrap().get(), 10);
        assert!(UvIndex::new(11).is_err());
        assert_eq!(UvIndex::clamped(42).get(), 10);
    }

    #[test]
    fn test_history_label() {
        let point = HistoryPoint {
            date: NaiveDate::from_ymd_opt(2026, 10, 9).unwrap(),
            aqi: AqiValue::new(42).unwrap(),
        };
        assert_eq!(point.label(), "Oct 9");
    }
}

//! US EPA AQI breakpoint conversion for PM2.5.

use std::fmt;

use serde::Serialize;

use crate::errors::AirError;

/// An Air Quality Index value in `[0, 500]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct AqiValue(u16);

impl AqiValue {
    pub const MAX: Self = Self(500);

    /// # Errors
    ///
    /// Returns `InvalidInput` if the value exceeds 500.
    pub fn new(value: u16) -> Result<Self, AirError> {
        if value > Self::MAX.0 {
            return Err(AirError::InvalidInput(format!(
                "AQI {value} out of range [0, 500]"
            )));
        }
        Ok(Self(value))
    }

    #[must_use]
    pub const fn get(self) -> u16 {
        self.0
    }

    /// Position on a 0-400 display gauge, as a percentage capped at 100.
    #[must_use]
    pub fn gauge_percent(self) -> f64 {
        (f64::from(self.0) / 400.0 * 100.0).min(100.0)
    }
}

impl fmt::Display for AqiValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One row of the EPA breakpoint table.
#[derive(Debug, Clone, Copy)]
pub struct Breakpoint {
    pub c_low: f64,
    pub c_high: f64,
    pub i_low: u16,
    pub i_high: u16,
}

const fn bp(c_low: f64, c_high: f64, i_low: u16, i_high: u16) -> Breakpoint {
    Breakpoint {
        c_low,
        c_high,
        i_low,
        i_high,
    }
}

/// PM2.5 breakpoints (µg/m³), ascending.
pub const PM25_BREAKPOINTS: [Breakpoint; 7] = [
    bp(0.0, 12.0, 0, 50),
    bp(12.1, 35.4, 51, 100),
    bp(35.5, 55.4, 101, 150),
    bp(55.5, 150.4, 151, 200),
    bp(150.5, 250.4, 201, 300),
    bp(250.5, 350.4, 301, 400),
    bp(350.5, 500.4, 401, 500),
];

impl Breakpoint {
    fn interpolate(&self, c: f64) -> f64 {
        let slope = f64::from(self.i_high - self.i_low) / (self.c_high - self.c_low);
        slope * (c - self.c_low) + f64::from(self.i_low)
    }
}

/// Convert a PM2.5 concentration to an AQI value.
///
/// Concentrations above the last breakpoint saturate at 500.
///
/// # Errors
///
/// Returns `InvalidInput` for negative or NaN concentrations.
pub fn pm25_to_aqi(pm25: f64) -> Result<AqiValue, AirError> {
    if pm25.is_nan() || pm25 < 0.0 {
        return Err(AirError::InvalidInput(format!(
            "PM2.5 concentration must be non-negative, got {pm25}"
        )));
    }

    let Some(bracket) = PM25_BREAKPOINTS.iter().find(|b| pm25 <= b.c_high) else {
        return Ok(AqiValue::MAX);
    };

    // f64::round is half-away-from-zero; brackets keep the result within [0, 500]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let value = bracket.interpolate(pm25).round() as u16;
    AqiValue::new(value)
}

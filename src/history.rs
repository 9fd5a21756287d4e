//! Daily downsampling of the hourly pollution history.
//!
//! One hour per day is sampled rather than averaging the day; callers that
//! chart the result show the reading at the window-relative hour.

use crate::aqi::pm25_to_aqi;
use crate::domain::{HistoryPoint, HourlySample};
use crate::errors::AirError;

/// Hourly samples per day.
pub const SAMPLES_PER_DAY: usize = 24;

/// Length of the trend window in days.
pub const HISTORY_DAYS: usize = 7;

/// Keep indices `0, 24, 48, …` (at most [`HISTORY_DAYS`] points), oldest first.
///
/// # Errors
///
/// Returns `InvalidInput` if a selected sample has a negative PM2.5 value.
pub fn downsample(samples: &[HourlySample]) -> Result<Vec<HistoryPoint>, AirError> {
    samples
        .iter()
        .step_by(SAMPLES_PER_DAY)
        .take(HISTORY_DAYS)
        .map(|sample| {
            Ok(HistoryPoint {
                date: sample.timestamp.date_naive(),
                aqi: pm25_to_aqi(sample.pollutants.pm2_5)?,
            })
        })
        .collect()
}

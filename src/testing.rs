//! Stub provider shared by the orchestrator, dashboard and server tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{GeoPoint, HourlySample, PollutantReading, WeatherCondition};
use crate::errors::{AirError, Step};
use crate::providers::{EnvironmentProvider, ObservedWeather};

struct StubCity {
    point: GeoPoint,
    pm2_5: f64,
    delay: Option<Duration>,
}

/// In-memory provider with per-step call counters.
///
/// Cities are matched on the exact (trimmed) query text. A delay configured for
/// a city is applied to its geocode lookup, so a delayed query completes after
/// a quick one started later.
#[derive(Default)]
pub struct StubProvider {
    cities: HashMap<String, StubCity>,
    failing_at: Option<Step>,
    failing_for: HashMap<String, Step>,
    calls: [AtomicUsize; 4],
    history_window: Mutex<Option<(DateTime<Utc>, DateTime<Utc>)>>,
}

impl StubProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_city(mut self, name: &str, lat: f64, lon: f64, pm2_5: f64) -> Self {
        let point = GeoPoint::new(lat, lon, name).expect("valid stub coordinates");
        self.cities.insert(
            name.to_string(),
            StubCity {
                point,
                pm2_5,
                delay: None,
            },
        );
        self
    }

    pub fn with_delay(mut self, name: &str, delay: Duration) -> Self {
        if let Some(city) = self.cities.get_mut(name) {
            city.delay = Some(delay);
        }
        self
    }

    pub fn failing_at(mut self, step: Step) -> Self {
        self.failing_at = Some(step);
        self
    }

    /// Fail `step` only for lookups of the named city.
    pub fn failing_at_for(mut self, name: &str, step: Step) -> Self {
        self.failing_for.insert(name.to_string(), step);
        self
    }

    /// Calls per step: geocode, pollution, weather, history.
    pub fn calls(&self) -> [usize; 4] {
        [0, 1, 2, 3].map(|i| self.calls[i].load(Ordering::SeqCst))
    }

    pub fn last_history_window(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        *self.history_window.lock().expect("history window lock")
    }

    fn enter(&self, step: Step, place: &str) -> Result<(), AirError> {
        let index = match step {
            Step::Geocode => 0,
            Step::Pollution => 1,
            Step::Weather => 2,
            Step::History => 3,
        };
        self.calls[index].fetch_add(1, Ordering::SeqCst);
        if self.failing_at == Some(step) || self.failing_for.get(place) == Some(&step) {
            return Err(AirError::upstream(step, "stubbed network failure"));
        }
        Ok(())
    }

    fn pm2_5_at(&self, point: &GeoPoint) -> f64 {
        self.cities
            .get(&point.resolved_name)
            .map_or(0.0, |city| city.pm2_5)
    }
}

#[async_trait]
impl EnvironmentProvider for StubProvider {
    async fn geocode(&self, query: &str) -> Result<Option<GeoPoint>, AirError> {
        self.enter(Step::Geocode, query)?;
        let Some(city) = self.cities.get(query) else {
            return Ok(None);
        };
        if let Some(delay) = city.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(Some(city.point.clone()))
    }

    async fn current_pollution(&self, point: &GeoPoint) -> Result<PollutantReading, AirError> {
        self.enter(Step::Pollution, &point.resolved_name)?;
        PollutantReading::new(self.pm2_5_at(point), 20.0, 10.0, 30.0, 5.0)
    }

    async fn current_weather(&self, point: &GeoPoint) -> Result<ObservedWeather, AirError> {
        self.enter(Step::Weather, &point.resolved_name)?;
        Ok(ObservedWeather {
            temperature_c: 24.0,
            humidity_pct: 55,
            wind_kph: 11.0,
            condition: WeatherCondition::Clouds,
            description: "scattered clouds".into(),
        })
    }

    async fn pollution_history(
        &self,
        point: &GeoPoint,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<HourlySample>, AirError> {
        self.enter(Step::History, &point.resolved_name)?;
        *self.history_window.lock().expect("history window lock") = Some((start, end));

        let pollutants = PollutantReading::new(self.pm2_5_at(point), 20.0, 10.0, 30.0, 5.0)?;
        Ok((0..168)
            .map(|hour| HourlySample {
                timestamp: start + chrono::Duration::hours(hour),
                pollutants,
            })
            .collect())
    }
}

//! Environmental data orchestration.
//!
//! Turns a free-text place name into a [`Snapshot`] by running four dependent
//! lookups in order: geocode, current pollution, current weather, history.
//! The first failure aborts the sequence; nothing is retried or cached.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};

use crate::aqi::pm25_to_aqi;
use crate::category::classify;
use crate::domain::Snapshot;
use crate::errors::{AirError, Step};
use crate::history::{self, HISTORY_DAYS};
use crate::providers::{EnvironmentProvider, SyntheticUv, UvIndexSource};

/// Sequences the upstream lookups for one query.
#[derive(Clone)]
pub struct Orchestrator {
    provider: Arc<dyn EnvironmentProvider>,
    uv_source: Arc<dyn UvIndexSource>,
    /// Upper bound on each lookup; `None` waits indefinitely
    step_timeout: Option<Duration>,
}

impl Orchestrator {
    /// Create an orchestrator with the synthetic UV placeholder and no step timeout.
    #[must_use]
    pub fn new(provider: Arc<dyn EnvironmentProvider>) -> Self {
        Self {
            provider,
            uv_source: Arc::new(SyntheticUv),
            step_timeout: None,
        }
    }

    #[must_use]
    pub fn with_uv_source(mut self, uv_source: Arc<dyn UvIndexSource>) -> Self {
        self.uv_source = uv_source;
        self
    }

    #[must_use]
    pub fn with_step_timeout(mut self, step_timeout: Option<Duration>) -> Self {
        self.step_timeout = step_timeout;
        self
    }

    /// Resolve a query against the current time.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when geocoding has no match, or the first upstream error.
    pub async fn resolve(&self, query: &str) -> Result<Snapshot, AirError> {
        self.resolve_at(query, Utc::now()).await
    }

    /// Resolve a query with the history window ending at `now`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when geocoding has no match, or the first upstream error.
    #[instrument(skip(self, now))]
    pub async fn resolve_at(&self, query: &str, now: DateTime<Utc>) -> Result<Snapshot, AirError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AirError::NotFound(query.to_string()));
        }

        // 1. Geocode
        let location = self
            .step(Step::Geocode, self.provider.geocode(query))
            .await?
            .ok_or_else(|| AirError::NotFound(query.to_string()))?;
        debug!(
            "resolved to {} ({:.4}, {:.4})",
            location.resolved_name, location.latitude, location.longitude
        );

        // 2. Current pollution
        let pollutants = self
            .step(Step::Pollution, self.provider.current_pollution(&location))
            .await?;
        let aqi = pm25_to_aqi(pollutants.pm2_5)?;
        let category = classify(aqi);
        debug!("pm2.5 {:.1} -> AQI {} ({})", pollutants.pm2_5, aqi, category);

        // 3. Current weather
        let observed = self
            .step(Step::Weather, self.provider.current_weather(&location))
            .await?;
        let weather = observed.with_uv(
            self.uv_source.uv_index(&location),
            self.uv_source.is_synthetic(),
        );

        // 4. History
        let start = now - chrono::Duration::days(HISTORY_DAYS as i64);
        let samples = self
            .step(
                Step::History,
                self.provider.pollution_history(&location, start, now),
            )
            .await?;
        let history = history::downsample(&samples)?;

        info!(
            "{}: AQI {} ({}), {} history points",
            location.resolved_name,
            aqi,
            category,
            history.len()
        );

        Ok(Snapshot {
            location,
            pollutants,
            aqi,
            category,
            weather,
            history,
            fetched_at: now,
        })
    }

    /// Await one lookup, bounded by the step timeout if configured.
    async fn step<T>(
        &self,
        step: Step,
        lookup: impl Future<Output = Result<T, AirError>>,
    ) -> Result<T, AirError> {
        match self.step_timeout {
            Some(limit) => tokio::time::timeout(limit, lookup)
                .await
                .map_err(|_| AirError::upstream(step, format!("timed out after {limit:?}")))?,
            None => lookup.await,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::category::AqiCategory;
    use crate::domain::UvIndex;
    use crate::providers::FixedUv;
    use crate::testing::StubProvider;

    fn orchestrator(stub: &Arc<StubProvider>) -> Orchestrator {
        Orchestrator::new(stub.clone())
            .with_uv_source(Arc::new(FixedUv(UvIndex::new(4).unwrap())))
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_resolve_new_delhi() {
        let stub = Arc::new(StubProvider::new().with_city("New Delhi", 28.61, 77.21, 40.0));
        let snapshot = orchestrator(&stub)
            .resolve_at("New Delhi", now())
            .await
            .unwrap();

        // (150 - 101) / (55.4 - 35.5) * (40.0 - 35.5) + 101
        let expected = (49.0_f64 / 19.9 * 4.5 + 101.0).round();
        assert_eq!(f64::from(snapshot.aqi.get()), expected);
        assert_eq!(snapshot.category, AqiCategory::UnhealthyForSensitive);
        assert_eq!(snapshot.location.resolved_name, "New Delhi");
        assert_eq!(snapshot.weather.uv_index.get(), 4);
        assert!(snapshot.weather.uv_index_synthetic);
        assert_eq!(snapshot.history.len(), 7);
        assert_eq!(snapshot.fetched_at, now());
        assert_eq!(stub.calls(), [1, 1, 1, 1]);
    }

    #[tokio::test]
    async fn test_history_window_is_trailing_week() {
        let stub = Arc::new(StubProvider::new().with_city("Lima", -12.05, -77.04, 8.0));
        orchestrator(&stub).resolve_at("Lima", now()).await.unwrap();

        let (start, end) = stub.last_history_window().unwrap();
        assert_eq!(end, now());
        assert_eq!(end - start, chrono::Duration::days(7));
    }

    #[tokio::test]
    async fn test_unknown_city_stops_after_geocode() {
        let stub = Arc::new(StubProvider::new().with_city("New Delhi", 28.61, 77.21, 40.0));
        let err = orchestrator(&stub)
            .resolve_at("Atlantis-Nowhere-XYZ", now())
            .await
            .unwrap_err();

        assert!(matches!(err, AirError::NotFound(_)));
        assert_eq!(stub.calls(), [1, 0, 0, 0]);
    }

    #[tokio::test]
    async fn test_blank_query_makes_no_calls() {
        let stub = Arc::new(StubProvider::new());
        let err = orchestrator(&stub).resolve_at("   ", now()).await.unwrap_err();

        assert!(matches!(err, AirError::NotFound(_)));
        assert_eq!(stub.calls(), [0, 0, 0, 0]);
    }

    #[tokio::test]
    async fn test_query_is_trimmed() {
        let stub = Arc::new(StubProvider::new().with_city("Oslo", 59.9, 10.7, 3.0));
        let snapshot = orchestrator(&stub).resolve_at("  Oslo \n", now()).await.unwrap();
        assert_eq!(snapshot.location.resolved_name, "Oslo");
    }

    #[tokio::test]
    async fn test_weather_failure_aborts_history() {
        let stub = Arc::new(
            StubProvider::new()
                .with_city("New Delhi", 28.61, 77.21, 40.0)
                .failing_at(Step::Weather),
        );
        let err = orchestrator(&stub)
            .resolve_at("New Delhi", now())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AirError::UpstreamUnavailable { step: Step::Weather, .. }
        ));
        assert_eq!(stub.calls(), [1, 1, 1, 0]);
    }

    #[tokio::test]
    async fn test_no_caching() {
        let stub = Arc::new(StubProvider::new().with_city("Quito", -0.18, -78.47, 12.0));
        let orchestrator = orchestrator(&stub);
        orchestrator.resolve_at("Quito", now()).await.unwrap();
        orchestrator.resolve_at("Quito", now()).await.unwrap();
        assert_eq!(stub.calls(), [2, 2, 2, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_step_timeout() {
        let stub = Arc::new(
            StubProvider::new()
                .with_city("Cairo", 30.04, 31.24, 70.0)
                .with_delay("Cairo", Duration::from_secs(60)),
        );
        let err = orchestrator(&stub)
            .with_step_timeout(Some(Duration::from_secs(5)))
            .resolve_at("Cairo", now())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AirError::UpstreamUnavailable { step: Step::Geocode, .. }
        ));
        assert_eq!(stub.calls(), [1, 0, 0, 0]);
    }
}

//! OpenWeatherMap API client.
//!
//! Provides async HTTP access to the geocoding, air pollution and weather
//! endpoints. Uses reqwest with rustls for TLS.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::domain::{GeoPoint, HourlySample, PollutantReading};
use crate::errors::{AirError, Step};
use crate::models::{self, GeocodeEntry, PollutionResponse, WeatherResponse};
use crate::providers::{EnvironmentProvider, ObservedWeather};

/// Default request timeout in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// User agent string for API requests.
const USER_AGENT: &str = concat!("aerosense/", env!("CARGO_PKG_VERSION"));

/// OpenWeatherMap base URL.
pub const OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org";

/// Client for the OpenWeatherMap APIs.
pub struct OpenWeatherClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenWeatherClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AirError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AirError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    /// GET a JSON document for one pipeline step.
    async fn get_json<T: DeserializeOwned>(
        &self,
        step: Step,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, AirError> {
        let url = format!("{}{}", self.base_url, path);

        debug!("fetching {} from {}", step, url);

        let response = self
            .client
            .get(&url)
            .query(params)
            .query(&[("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| AirError::upstream(step, e.without_url()))?;

        // Check status before parsing
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AirError::upstream(
                step,
                format!("HTTP {}: {}", status.as_u16(), body.trim()),
            ));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AirError::upstream(step, e.without_url()))?;

        models::decode(step, &body)
    }
}

fn coords(point: &GeoPoint) -> [(&'static str, String); 2] {
    [
        ("lat", point.latitude.to_string()),
        ("lon", point.longitude.to_string()),
    ]
}

#[async_trait]
impl EnvironmentProvider for OpenWeatherClient {
    #[instrument(skip(self))]
    async fn geocode(&self, query: &str) -> Result<Option<GeoPoint>, AirError> {
        let entries: Vec<GeocodeEntry> = self
            .get_json(
                Step::Geocode,
                "/geo/1.0/direct",
                &[("q", query.to_string()), ("limit", "1".to_string())],
            )
            .await?;

        debug!("geocoder returned {} matches", entries.len());
        entries
            .into_iter()
            .next()
            .map(GeocodeEntry::into_geo_point)
            .transpose()
    }

    #[instrument(skip(self), fields(place = %point.resolved_name))]
    async fn current_pollution(&self, point: &GeoPoint) -> Result<PollutantReading, AirError> {
        let response: PollutionResponse = self
            .get_json(Step::Pollution, "/data/2.5/air_pollution", &coords(point))
            .await?;
        response.into_current()
    }

    #[instrument(skip(self), fields(place = %point.resolved_name))]
    async fn current_weather(&self, point: &GeoPoint) -> Result<ObservedWeather, AirError> {
        let mut params = coords(point).to_vec();
        params.push(("units", "metric".to_string()));

        let response: WeatherResponse = self
            .get_json(Step::Weather, "/data/2.5/weather", &params)
            .await?;
        response.into_observed()
    }

    #[instrument(skip(self), fields(place = %point.resolved_name))]
    async fn pollution_history(
        &self,
        point: &GeoPoint,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<HourlySample>, AirError> {
        let mut params = coords(point).to_vec();
        params.push(("start", start.timestamp().to_string()));
        params.push(("end", end.timestamp().to_string()));

        let response: PollutionResponse = self
            .get_json(Step::History, "/data/2.5/air_pollution/history", &params)
            .await?;
        let samples = response.into_hourly()?;

        debug!("fetched {} hourly samples", samples.len());
        Ok(samples)
    }
}

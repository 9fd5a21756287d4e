//! Runtime configuration.
//!
//! Loaded from environment variables at startup; a `.env` file is read for
//! local development. Command-line flags override individual values.

use std::time::Duration;

use crate::client::{OPENWEATHER_BASE_URL, REQUEST_TIMEOUT_SECS};
use crate::dashboard::RacePolicy;
use crate::domain::UvIndex;
use crate::errors::AirError;

/// Settings shared by every command.
#[derive(Clone, Debug)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    /// Per-request HTTP timeout
    pub request_timeout: Duration,
    /// Per-step orchestration timeout; `None` waits on the HTTP timeout only
    pub step_timeout: Option<Duration>,
    pub race_policy: RacePolicy,
    /// Pinned UV index; `None` uses the random placeholder
    pub uv_index: Option<UvIndex>,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the API key is missing or a value does not parse.
    pub fn from_env() -> Result<Self, AirError> {
        // Skip .env in tests so they stay hermetic.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `Config` if the API key is missing or a value does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AirError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("OPENWEATHER_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AirError::Config("missing OPENWEATHER_API_KEY".into()))?;

        let base_url =
            lookup("AEROSENSE_BASE_URL").unwrap_or_else(|| OPENWEATHER_BASE_URL.to_string());

        let request_timeout = Duration::from_secs(
            parse_var(&lookup, "AEROSENSE_TIMEOUT_SECS")?.unwrap_or(REQUEST_TIMEOUT_SECS),
        );

        let step_timeout =
            parse_var::<u64, _>(&lookup, "AEROSENSE_STEP_TIMEOUT_SECS")?.map(Duration::from_secs);

        let race_policy = match lookup("AEROSENSE_RACE_POLICY") {
            Some(value) => value
                .parse::<RacePolicy>()
                .map_err(|e: String| AirError::Config(format!("AEROSENSE_RACE_POLICY: {e}")))?,
            None => RacePolicy::default(),
        };

        let uv_index = parse_var::<u8, _>(&lookup, "AEROSENSE_UV_INDEX")?
            .map(UvIndex::new)
            .transpose()
            .map_err(|e| AirError::Config(format!("AEROSENSE_UV_INDEX: {e}")))?;

        Ok(Self {
            api_key,
            base_url,
            request_timeout,
            step_timeout,
            race_policy,
            uv_index,
        })
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>, AirError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| {
            value
                .trim()
                .parse()
                .map_err(|e| AirError::Config(format!("invalid value for {key}: {e}")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<Config, AirError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("OPENWEATHER_API_KEY", "abc")]).unwrap();
        assert_eq!(config.api_key, "abc");
        assert_eq!(config.base_url, OPENWEATHER_BASE_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(REQUEST_TIMEOUT_SECS));
        assert_eq!(config.step_timeout, None);
        assert_eq!(config.race_policy, RacePolicy::LastCompletedWins);
        assert_eq!(config.uv_index, None);
    }

    #[test]
    fn test_missing_api_key() {
        assert!(matches!(load(&[]), Err(AirError::Config(_))));
        assert!(matches!(
            load(&[("OPENWEATHER_API_KEY", "  ")]),
            Err(AirError::Config(_))
        ));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("OPENWEATHER_API_KEY", "abc"),
            ("AEROSENSE_BASE_URL", "http://localhost:8081"),
            ("AEROSENSE_TIMEOUT_SECS", "3"),
            ("AEROSENSE_STEP_TIMEOUT_SECS", "15"),
            ("AEROSENSE_RACE_POLICY", "latest-request"),
        ])
        .unwrap();
        assert_eq!(config.base_url, "http://localhost:8081");
        assert_eq!(config.request_timeout, Duration::from_secs(3));
        assert_eq!(config.step_timeout, Some(Duration::from_secs(15)));
        assert_eq!(config.race_policy, RacePolicy::LatestRequestWins);
    }

    #[test]
    fn test_pinned_uv_index() {
        let config = load(&[("OPENWEATHER_API_KEY", "abc"), ("AEROSENSE_UV_INDEX", "7")]).unwrap();
        assert_eq!(config.uv_index.map(UvIndex::get), Some(7));

        let err = load(&[("OPENWEATHER_API_KEY", "abc"), ("AEROSENSE_UV_INDEX", "11")])
            .unwrap_err();
        assert!(matches!(err, AirError::Config(_)));
        assert!(err.to_string().contains("AEROSENSE_UV_INDEX"));
    }

    #[test]
    fn test_invalid_values() {
        let err = load(&[("OPENWEATHER_API_KEY", "abc"), ("AEROSENSE_TIMEOUT_SECS", "soon")])
            .unwrap_err();
        assert!(err.to_string().contains("AEROSENSE_TIMEOUT_SECS"));

        let err = load(&[("OPENWEATHER_API_KEY", "abc"), ("AEROSENSE_RACE_POLICY", "random")]);
        assert!(err.is_err());
    }
}

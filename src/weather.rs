//! Weather API client
//!
//! Looks up current conditions for a city from a weatherapi.com-style
//! `current.json` endpoint. Lookups are cached per city so repeated plans for
//! the same city within the TTL don't hit the service again.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};

use crate::cache::Cache;
use crate::config::WeatherConfig;
use crate::http::{USER_AGENT, build_client, trim_base_url};
use crate::models::CurrentWeather;
use crate::FoodieTourError;

/// Source of current weather for a city
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    async fn current(&self, city: &str) -> Result<CurrentWeather>;
}

/// `current.json` response, only the fields we read
#[derive(Debug, Deserialize)]
struct CurrentResponse {
    current: CurrentData,
}

#[derive(Debug, Deserialize)]
struct CurrentData {
    temp_c: f64,
    condition: ConditionData,
}

#[derive(Debug, Deserialize)]
struct ConditionData {
    text: String,
}

/// Weather API client for weatherapi.com
pub struct WeatherApiClient {
    client: ClientWithMiddleware,
    base_url: String,
    api_key: String,
    cache: Cache,
    cache_ttl: Duration,
}

impl WeatherApiClient {
    /// Create a new weather API client
    pub fn new(config: &WeatherConfig, cache: Cache) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| FoodieTourError::config("Weather API key is missing"))?;
        let client = build_client(
            Duration::from_secs(config.timeout_seconds.into()),
            config.max_retries,
            USER_AGENT,
        )?;

        Ok(Self {
            client,
            base_url: trim_base_url(&config.base_url),
            api_key,
            cache,
            cache_ttl: config.cache_ttl(),
        })
    }

    fn cache_key(city: &str) -> String {
        format!("weather:{}", city.trim().to_lowercase())
    }

    async fn fetch(&self, city: &str) -> Result<CurrentWeather> {
        let url = format!(
            "{}/current.json?key={}&q={}",
            self.base_url,
            urlencoding::encode(&self.api_key),
            urlencoding::encode(city)
        );

        let start_time = Instant::now();
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| FoodieTourError::api(format!("Weather request for {city} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            error!("Weather API returned {} for '{}'", status, city);
            return Err(FoodieTourError::api(format!(
                "Weather API request failed with status: {} - {}",
                status,
                status.canonical_reason().unwrap_or("Unknown error")
            ))
            .into());
        }

        let body: CurrentResponse = response
            .json()
            .await
            .with_context(|| format!("Invalid weather data received for {city}"))?;

        let total_duration = start_time.elapsed();
        info!(
            "Retrieved weather for '{}' in {:.3}s",
            city,
            total_duration.as_secs_f64()
        );
        if total_duration.as_secs() > 5 {
            warn!("Slow weather API response: {:.3}s", total_duration.as_secs_f64());
        }

        Ok(CurrentWeather::new(body.current.temp_c, body.current.condition.text))
    }
}

#[async_trait]
impl WeatherProvider for WeatherApiClient {
    #[instrument(skip(self))]
    async fn current(&self, city: &str) -> Result<CurrentWeather> {
        let key = Self::cache_key(city);
        if let Some(cached) = self.cache.get::<CurrentWeather>(&key).await? {
            debug!("Using cached weather for '{}'", city);
            return Ok(cached);
        }

        let weather = self.fetch(city).await?;
        self.cache.put(&key, weather.clone(), self.cache_ttl).await?;
        Ok(weather)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client_for(server: &MockServer, cache: Cache) -> WeatherApiClient {
        let config = WeatherConfig {
            api_key: Some("weather_key_123".to_string()),
            base_url: server.url("/v1"),
            ..WeatherConfig::default()
        };
        WeatherApiClient::new(&config, cache).unwrap()
    }

    #[tokio::test]
    async fn current_weather_parses_response() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v1/current.json")
                    .query_param("key", "weather_key_123")
                    .query_param("q", "Paris");
                then.status(200).json_body(json!({
                    "location": {"name": "Paris"},
                    "current": {"temp_c": 18.0, "condition": {"text": "Partly cloudy", "code": 1003}}
                }));
            })
            .await;

        let client = client_for(&server, Cache::in_memory());
        let weather = client.current("Paris").await.unwrap();

        assert_eq!(weather, CurrentWeather::new(18.0, "Partly cloudy"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn current_weather_is_cached_per_city() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/current.json");
                then.status(200).json_body(json!({
                    "current": {"temp_c": 25.5, "condition": {"text": "Sunny"}}
                }));
            })
            .await;

        let client = client_for(&server, Cache::in_memory());
        client.current("Tokyo").await.unwrap();
        let again = client.current(" tokyo ").await.unwrap();

        assert_eq!(again.temp_c, 25.5);
        mock.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/current.json");
                then.status(400).json_body(json!({
                    "error": {"code": 1006, "message": "No matching location found."}
                }));
            })
            .await;

        let client = client_for(&server, Cache::in_memory());
        let err = client.current("Atlantis").await.unwrap_err();
        let err: FoodieTourError = err.into();
        assert!(matches!(err, FoodieTourError::Api { .. }));
    }

    #[test]
    fn missing_api_key_is_config_error() {
        let config = WeatherConfig::default();
        assert!(WeatherApiClient::new(&config, Cache::in_memory()).is_err());
    }
}

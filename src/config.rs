//! Configuration management for `FoodieTour`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::FoodieTourError;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure for the `FoodieTour` application
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FoodieTourConfig {
    /// Weather API configuration
    #[serde(default)]
    pub weather: WeatherConfig,
    /// Agent orchestration service configuration
    #[serde(default)]
    pub agent: AgentConfig,
    /// Geocoding service configuration
    #[serde(default)]
    pub geocoding: GeocodingConfig,
    /// Image search configuration
    #[serde(default)]
    pub images: ImageConfig,
    /// Cache configuration
    #[serde(default)]
    pub cache: CacheConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Web server configuration
    #[serde(default)]
    pub server: ServerConfig,
}

/// Weather API configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Weather API key
    pub api_key: Option<String>,
    /// Base URL for weather API
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_weather_timeout")]
    pub timeout_seconds: u32,
    /// Maximum number of retries for failed requests
    #[serde(default)]
    pub max_retries: u32,
    /// How long a city's weather stays cached
    #[serde(default = "default_weather_cache_ttl")]
    pub cache_ttl_seconds: u64,
}

/// Agent orchestration service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Agent service API key
    pub api_key: Option<String>,
    /// Base URL of the agent service
    #[serde(default = "default_agent_base_url")]
    pub base_url: String,
    /// Model the agent runs on
    #[serde(default = "default_agent_model")]
    pub model: String,
    /// Delay between execution status polls
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    /// Give up on an execution after this many seconds, 0 waits forever
    #[serde(default)]
    pub max_wait_seconds: u64,
    /// Request timeout in seconds
    #[serde(default = "default_agent_timeout")]
    pub timeout_seconds: u32,
    /// Maximum number of retries for failed requests
    #[serde(default)]
    pub max_retries: u32,
}

/// Geocoding service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodingConfig {
    #[serde(default = "default_geocoding_base_url")]
    pub base_url: String,
    /// Nominatim rejects requests without an identifying agent
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_geocoding_timeout")]
    pub timeout_seconds: u32,
    #[serde(default = "default_lookup_cache_ttl")]
    pub cache_ttl_hours: u32,
}

/// Image search settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    /// Image search API key, images are skipped without one
    pub api_key: Option<String>,
    #[serde(default = "default_images_base_url")]
    pub base_url: String,
    #[serde(default = "default_images_timeout")]
    pub timeout_seconds: u32,
    #[serde(default = "default_lookup_cache_ttl")]
    pub cache_ttl_hours: u32,
}

/// Cache configuration settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Directory for a persistent cache, empty keeps the cache in memory
    #[serde(default)]
    pub location: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Web server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
}

// Default value functions
fn default_weather_base_url() -> String {
    "http://api.weatherapi.com/v1".to_string()
}

fn default_weather_timeout() -> u32 {
    5
}

fn default_weather_cache_ttl() -> u64 {
    3600
}

fn default_agent_base_url() -> String {
    "https://api.julep.ai/api".to_string()
}

fn default_agent_model() -> String {
    "claude-3.5-sonnet".to_string()
}

fn default_poll_interval() -> u64 {
    500
}

fn default_agent_timeout() -> u32 {
    30
}

fn default_geocoding_base_url() -> String {
    "https://nominatim.openstreetmap.org".to_string()
}

fn default_user_agent() -> String {
    "foodietour/0.1.0".to_string()
}

fn default_geocoding_timeout() -> u32 {
    10
}

fn default_images_base_url() -> String {
    "https://api.unsplash.com".to_string()
}

fn default_images_timeout() -> u32 {
    3
}

fn default_lookup_cache_ttl() -> u32 {
    24
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    8080
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_weather_base_url(),
            timeout_seconds: default_weather_timeout(),
            max_retries: 0,
            cache_ttl_seconds: default_weather_cache_ttl(),
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_agent_base_url(),
            model: default_agent_model(),
            poll_interval_ms: default_poll_interval(),
            max_wait_seconds: 0,
            timeout_seconds: default_agent_timeout(),
            max_retries: 0,
        }
    }
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: default_geocoding_base_url(),
            user_agent: default_user_agent(),
            timeout_seconds: default_geocoding_timeout(),
            cache_ttl_hours: default_lookup_cache_ttl(),
        }
    }
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_images_base_url(),
            timeout_seconds: default_images_timeout(),
            cache_ttl_hours: default_lookup_cache_ttl(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
        }
    }
}

impl WeatherConfig {
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }
}

impl AgentConfig {
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Poll deadline, `None` when executions may run forever
    #[must_use]
    pub fn max_wait(&self) -> Option<Duration> {
        (self.max_wait_seconds > 0).then(|| Duration::from_secs(self.max_wait_seconds))
    }
}

impl GeocodingConfig {
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(u64::from(self.cache_ttl_hours) * 60 * 60)
    }
}

impl ImageConfig {
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(u64::from(self.cache_ttl_hours) * 60 * 60)
    }
}

impl FoodieTourConfig {
    /// Load configuration from `config_path`, or the default location, plus environment variables
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        // Load from file if path is provided or use default location
        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // FOODIETOUR__WEATHER__API_KEY style overrides
        builder = builder.add_source(
            Environment::with_prefix("FOODIETOUR")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: FoodieTourConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("foodietour").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.weather.base_url.is_empty() {
            self.weather.base_url = default_weather_base_url();
        }
        if self.weather.timeout_seconds == 0 {
            self.weather.timeout_seconds = default_weather_timeout();
        }
        if self.weather.cache_ttl_seconds == 0 {
            self.weather.cache_ttl_seconds = default_weather_cache_ttl();
        }
        if self.agent.base_url.is_empty() {
            self.agent.base_url = default_agent_base_url();
        }
        if self.agent.model.is_empty() {
            self.agent.model = default_agent_model();
        }
        if self.agent.poll_interval_ms == 0 {
            self.agent.poll_interval_ms = default_poll_interval();
        }
        if self.agent.timeout_seconds == 0 {
            self.agent.timeout_seconds = default_agent_timeout();
        }
        if self.geocoding.base_url.is_empty() {
            self.geocoding.base_url = default_geocoding_base_url();
        }
        if self.geocoding.user_agent.is_empty() {
            self.geocoding.user_agent = default_user_agent();
        }
        if self.geocoding.timeout_seconds == 0 {
            self.geocoding.timeout_seconds = default_geocoding_timeout();
        }
        if self.geocoding.cache_ttl_hours == 0 {
            self.geocoding.cache_ttl_hours = default_lookup_cache_ttl();
        }
        if self.images.base_url.is_empty() {
            self.images.base_url = default_images_base_url();
        }
        if self.images.timeout_seconds == 0 {
            self.images.timeout_seconds = default_images_timeout();
        }
        if self.images.cache_ttl_hours == 0 {
            self.images.cache_ttl_hours = default_lookup_cache_ttl();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
        if self.server.host.is_empty() {
            self.server.host = default_server_host();
        }
        if self.server.port == 0 {
            self.server.port = default_server_port();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_api_keys()?;
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// Validate API keys and credentials
    pub fn validate_api_keys(&self) -> Result<()> {
        validate_key("Weather", self.weather.api_key.as_deref(), true)?;
        validate_key("Agent", self.agent.api_key.as_deref(), true)?;
        validate_key("Image search", self.images.api_key.as_deref(), false)?;
        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.weather.timeout_seconds > 300 {
            return Err(
                FoodieTourError::config("Weather API timeout cannot exceed 300 seconds").into(),
            );
        }

        if self.weather.max_retries > 10 || self.agent.max_retries > 10 {
            return Err(FoodieTourError::config("Max retries cannot exceed 10").into());
        }

        if self.weather.cache_ttl_seconds > 24 * 60 * 60 {
            return Err(FoodieTourError::config("Weather cache TTL cannot exceed 24 hours").into());
        }

        if self.agent.poll_interval_ms > 60_000 {
            return Err(
                FoodieTourError::config("Agent poll interval cannot exceed 60000 ms").into(),
            );
        }

        if self.geocoding.cache_ttl_hours > 168 || self.images.cache_ttl_hours > 168 {
            return Err(
                FoodieTourError::config("Lookup cache TTL cannot exceed 168 hours (1 week)")
                    .into(),
            );
        }

        if self.images.timeout_seconds > 60 {
            return Err(
                FoodieTourError::config("Image search timeout cannot exceed 60 seconds").into(),
            );
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(FoodieTourError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(FoodieTourError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (name, url) in [
            ("Weather", &self.weather.base_url),
            ("Agent", &self.agent.base_url),
            ("Geocoding", &self.geocoding.base_url),
            ("Image search", &self.images.base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(FoodieTourError::config(format!(
                    "{name} base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }
}

fn validate_key(service: &str, key: Option<&str>, required: bool) -> Result<()> {
    match key {
        None if required => Err(FoodieTourError::config(format!(
            "{service} API key is missing. Set it in config.toml or via the environment."
        ))
        .into()),
        None => Ok(()),
        Some(key) if key.is_empty() => Err(FoodieTourError::config(format!(
            "{service} API key cannot be empty if provided. Either remove it or provide a valid key."
        ))
        .into()),
        Some(key) if key.len() < 8 => Err(FoodieTourError::config(format!(
            "{service} API key appears to be invalid (too short). Please check your API key."
        ))
        .into()),
        Some(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn valid_config() -> FoodieTourConfig {
        let mut config = FoodieTourConfig::default();
        config.weather.api_key = Some("weather_key_123".to_string());
        config.agent.api_key = Some("agent_key_123".to_string());
        config
    }

    #[test]
    fn test_default_config() {
        let config = FoodieTourConfig::default();
        assert_eq!(config.weather.base_url, "http://api.weatherapi.com/v1");
        assert_eq!(config.weather.timeout_seconds, 5);
        assert_eq!(config.weather.cache_ttl(), Duration::from_secs(3600));
        assert_eq!(config.agent.poll_interval(), Duration::from_millis(500));
        assert!(config.agent.max_wait().is_none());
        assert_eq!(config.images.timeout_seconds, 3);
        assert_eq!(config.geocoding.cache_ttl(), Duration::from_secs(86_400));
        assert_eq!(config.logging.level, "info");
        assert!(config.cache.location.is_empty());
    }

    #[test]
    fn test_config_validation_missing_required_keys() {
        let config = FoodieTourConfig::default();
        let err = config.validate_api_keys().unwrap_err();
        assert!(err.to_string().contains("Weather API key is missing"));
    }

    #[test]
    fn test_config_validation_image_key_optional() {
        let config = valid_config();
        assert!(config.images.api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_short_key() {
        let mut config = valid_config();
        config.agent.api_key = Some("short".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("too short"));
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = valid_config();
        config.logging.level = "invalid".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_config_validation_numeric_ranges() {
        let mut config = valid_config();
        config.weather.timeout_seconds = 500;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("timeout cannot exceed"));
    }

    #[test]
    fn test_config_validation_base_url_scheme() {
        let mut config = valid_config();
        config.geocoding.base_url = "nominatim.local".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Geocoding base URL"));
    }

    #[test]
    fn test_apply_defaults_fills_blanks() {
        let mut config = valid_config();
        config.agent.poll_interval_ms = 0;
        config.images.base_url.clear();
        config.apply_defaults();
        assert_eq!(config.agent.poll_interval_ms, 500);
        assert_eq!(config.images.base_url, "https://api.unsplash.com");
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(
            file,
            r#"
[weather]
api_key = "weather_key_from_file"

[agent]
api_key = "agent_key_from_file"
max_wait_seconds = 120

[server]
port = 9090
"#
        )
        .unwrap();

        let config = FoodieTourConfig::load_from_path(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(
            config.weather.api_key.as_deref(),
            Some("weather_key_from_file")
        );
        assert_eq!(config.agent.max_wait(), Some(Duration::from_secs(120)));
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.images.timeout_seconds, 3);
    }

    #[test]
    fn test_config_path_generation() {
        let path = FoodieTourConfig::get_config_path();
        assert!(path.is_some());
        let path = path.unwrap();
        assert!(path.to_string_lossy().contains("foodietour"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }
}

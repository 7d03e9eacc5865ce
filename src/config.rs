//! Configuration management for `routecast`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use crate::RoutecastError;
use crate::http::HttpSettings;
use crate::pipeline::{ForecastLocation, PipelineDefaults};
use crate::sampler::SamplingStrategy;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable the Google Maps key has traditionally been read from
const MAPS_API_KEY_VAR: &str = "MAPS_API_KEY";

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RoutecastConfig {
    /// Google Maps (directions and geocoding) settings
    #[serde(default)]
    pub maps: MapsConfig,
    /// Weather forecast provider settings
    #[serde(default)]
    pub forecast: ForecastConfig,
    /// Waypoint sampling settings
    #[serde(default)]
    pub sampling: SamplingConfig,
    /// Forecast alignment settings
    #[serde(default)]
    pub alignment: AlignmentConfig,
    /// Pipeline execution settings
    #[serde(default)]
    pub pipeline: PipelineConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,
}

/// Google Maps API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapsConfig {
    /// API key; falls back to the `MAPS_API_KEY` environment variable
    pub api_key: Option<String>,
    #[serde(default = "default_maps_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    /// Retries for transient failures (0 = none)
    #[serde(default)]
    pub max_retries: u32,
}

/// Forecast provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastConfig {
    #[serde(default = "default_forecast_base_url")]
    pub base_url: String,
    /// The NWS API rejects requests without a User-Agent
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u32,
    #[serde(default)]
    pub max_retries: u32,
    /// Upper bound on hourly periods kept per place (defaults to the full span)
    #[serde(default = "default_max_periods")]
    pub max_periods: usize,
}

/// Waypoint sampling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    #[serde(default = "default_threshold_miles")]
    pub threshold_miles: f64,
    #[serde(default)]
    pub strategy: SamplingStrategy,
}

/// Forecast alignment settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlignmentConfig {
    /// Half-width of the window around the arrival time
    #[serde(default = "default_tolerance_seconds")]
    pub tolerance_seconds: i64,
    /// Samples returned when the request carries no arrival time
    #[serde(default = "default_max_samples_without_arrival")]
    pub max_samples_without_arrival: usize,
}

/// Pipeline execution settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Upper bound on in-flight lookups per request (1 = sequential)
    #[serde(default = "default_max_concurrent_lookups")]
    pub max_concurrent_lookups: usize,
    /// Where each place's forecast is fetched
    #[serde(default)]
    pub forecast_location: ForecastLocation,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty, compact or full)
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

// Default value functions
fn default_maps_base_url() -> String {
    "https://maps.googleapis.com/maps/api".to_string()
}

fn default_forecast_base_url() -> String {
    "https://api.weather.gov".to_string()
}

fn default_user_agent() -> String {
    format!("routecast/{}", crate::VERSION)
}

fn default_timeout() -> u32 {
    10
}

/// Length of the NWS hourly forecast (six and a half days)
const NWS_HOURLY_PERIODS: usize = 156;

fn default_max_periods() -> usize {
    NWS_HOURLY_PERIODS
}

fn default_threshold_miles() -> f64 {
    crate::sampler::DEFAULT_THRESHOLD_MILES
}

fn default_tolerance_seconds() -> i64 {
    crate::weather::DEFAULT_TOLERANCE_SECONDS
}

fn default_max_samples_without_arrival() -> usize {
    crate::weather::DEFAULT_SAMPLES_WITHOUT_ARRIVAL
}

fn default_max_concurrent_lookups() -> usize {
    4
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for MapsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_maps_base_url(),
            timeout_seconds: default_timeout(),
            max_retries: 0,
        }
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            base_url: default_forecast_base_url(),
            user_agent: default_user_agent(),
            timeout_seconds: default_timeout(),
            max_retries: 0,
            max_periods: default_max_periods(),
        }
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            threshold_miles: default_threshold_miles(),
            strategy: SamplingStrategy::default(),
        }
    }
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            tolerance_seconds: default_tolerance_seconds(),
            max_samples_without_arrival: default_max_samples_without_arrival(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_lookups: default_max_concurrent_lookups(),
            forecast_location: ForecastLocation::default(),
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
            host: default_host(),
            port: default_port(),
        }
    }
}

impl MapsConfig {
    #[must_use]
    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            timeout: Duration::from_secs(self.timeout_seconds.into()),
            max_retries: self.max_retries,
            user_agent: default_user_agent(),
        }
    }

    /// The API key, or a configuration error naming where to set it
    pub fn require_api_key(&self) -> crate::Result<&str> {
        self.api_key.as_deref().ok_or_else(|| {
            RoutecastError::config(format!(
                "Google Maps API key is required. Set {MAPS_API_KEY_VAR} or maps.api_key."
            ))
        })
    }
}

impl ForecastConfig {
    #[must_use]
    pub fn http_settings(&self) -> HttpSettings {
        HttpSettings {
            timeout: Duration::from_secs(self.timeout_seconds.into()),
            max_retries: self.max_retries,
            user_agent: self.user_agent.clone(),
        }
    }
}

impl RoutecastConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
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

        // Environment overrides, e.g. ROUTECAST_SAMPLING__THRESHOLD_MILES=25
        builder = builder.add_source(
            Environment::with_prefix("ROUTECAST")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: RoutecastConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to deserialize configuration")?;

        if config.maps.api_key.is_none() {
            config.maps.api_key = std::env::var(MAPS_API_KEY_VAR)
                .ok()
                .filter(|key| !key.trim().is_empty());
        }

        // Apply defaults for missing values
        config.apply_defaults();

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("routecast").join("config.toml"))
    }

    /// Apply default values to missing configuration fields
    pub fn apply_defaults(&mut self) {
        if self.maps.base_url.is_empty() {
            self.maps.base_url = default_maps_base_url();
        }
        if self.maps.timeout_seconds == 0 {
            self.maps.timeout_seconds = default_timeout();
        }
        if self.forecast.base_url.is_empty() {
            self.forecast.base_url = default_forecast_base_url();
        }
        if self.forecast.user_agent.is_empty() {
            self.forecast.user_agent = default_user_agent();
        }
        if self.forecast.timeout_seconds == 0 {
            self.forecast.timeout_seconds = default_timeout();
        }
        if self.forecast.max_periods == 0 {
            self.forecast.max_periods = default_max_periods();
        }
        if self.pipeline.max_concurrent_lookups == 0 {
            self.pipeline.max_concurrent_lookups = default_max_concurrent_lookups();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
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
        // The key may be absent here; building the maps client reports that.
        if let Some(api_key) = &self.maps.api_key {
            if api_key.trim().is_empty() {
                return Err(RoutecastError::config(
                    "Google Maps API key cannot be empty if provided. Either remove it or provide a valid key.",
                )
                .into());
            }
        }

        Ok(())
    }

    /// Validate numeric configuration ranges
    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.maps.timeout_seconds > 300 || self.forecast.timeout_seconds > 300 {
            return Err(RoutecastError::config("API timeout cannot exceed 300 seconds").into());
        }

        if self.maps.max_retries > 10 || self.forecast.max_retries > 10 {
            return Err(RoutecastError::config("API max retries cannot exceed 10").into());
        }

        let threshold = self.sampling.threshold_miles;
        if !threshold.is_finite() || threshold <= 0.0 || threshold > 1000.0 {
            return Err(RoutecastError::config(
                "Sampling threshold must be greater than 0 and at most 1000 miles",
            )
            .into());
        }

        if !(0..=86_400).contains(&self.alignment.tolerance_seconds) {
            return Err(RoutecastError::config(
                "Forecast tolerance must be between 0 and 86400 seconds",
            )
            .into());
        }

        if !(1..=NWS_HOURLY_PERIODS).contains(&self.alignment.max_samples_without_arrival) {
            return Err(RoutecastError::config(format!(
                "Samples without arrival time must be between 1 and {NWS_HOURLY_PERIODS}"
            ))
            .into());
        }

        if self.forecast.max_periods > NWS_HOURLY_PERIODS {
            return Err(RoutecastError::config(format!(
                "Forecast periods cannot exceed {NWS_HOURLY_PERIODS}"
            ))
            .into());
        }

        if self.pipeline.max_concurrent_lookups > 32 {
            return Err(RoutecastError::config("Concurrent lookups cannot exceed 32").into());
        }

        Ok(())
    }

    /// Validate string configuration values
    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(RoutecastError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "compact", "full"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(RoutecastError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        for (name, url) in [
            ("Maps", &self.maps.base_url),
            ("Forecast", &self.forecast.base_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(RoutecastError::config(format!(
                    "{name} API base URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }

    /// Pipeline defaults derived from the sampling, alignment and pipeline sections
    #[must_use]
    pub fn pipeline_defaults(&self) -> PipelineDefaults {
        PipelineDefaults {
            threshold_miles: self.sampling.threshold_miles,
            tolerance: chrono::Duration::seconds(self.alignment.tolerance_seconds),
            max_samples_without_arrival: self.alignment.max_samples_without_arrival,
            max_concurrent_lookups: self.pipeline.max_concurrent_lookups,
            forecast_location: self.pipeline.forecast_location,
        }
    }
}

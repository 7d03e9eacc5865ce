//! US National Weather Service (`api.weather.gov`) hourly forecast client

use async_trait::async_trait;
use tracing::{info, instrument};

use super::ForecastProvider;
use crate::Result;
use crate::http::HttpClient;
use crate::models::{Coordinate, ForecastSeries};

/// Forecast provider backed by the NWS gridpoint API
#[derive(Clone)]
pub struct NwsClient {
    http: HttpClient,
    base_url: String,
    /// Periods kept from the hourly forecast
    max_periods: usize,
}

impl NwsClient {
    #[must_use]
    pub fn new(http: HttpClient, base_url: impl Into<String>, max_periods: usize) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_periods,
        }
    }
}

#[async_trait]
impl ForecastProvider for NwsClient {
    #[instrument(skip(self), fields(location = %location.format_coordinates()))]
    async fn forecast(&self, location: Coordinate) -> Result<ForecastSeries> {
        let points_url = format!("{}/points/{}", self.base_url, location.format_coordinates());
        let points: wire::PointsResponse = self.http.get_json(&points_url).await?;

        let grid = points.properties;
        let forecast_url = format!(
            "{}/gridpoints/{}/{},{}/forecast/hourly",
            self.base_url, grid.grid_id, grid.grid_x, grid.grid_y
        );
        let hourly: wire::HourlyForecastResponse = self.http.get_json(&forecast_url).await?;

        let series = hourly.into_series(self.max_periods)?;
        info!(
            "Retrieved {} forecast periods from grid {} {},{}",
            series.len(),
            grid.grid_id,
            grid.grid_x,
            grid.grid_y
        );
        Ok(series)
    }
}

/// NWS API response structures and conversion utilities
mod wire {
    use chrono::{DateTime, FixedOffset, Utc};
    use serde::Deserialize;

    use crate::Result;
    use crate::models::{ForecastSample, ForecastSeries};

    #[derive(Debug, Deserialize)]
    pub struct PointsResponse {
        pub properties: PointProperties,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PointProperties {
        pub grid_id: String,
        pub grid_x: i64,
        pub grid_y: i64,
    }

    #[derive(Debug, Deserialize)]
    pub struct HourlyForecastResponse {
        pub properties: HourlyProperties,
    }

    #[derive(Debug, Deserialize)]
    pub struct HourlyProperties {
        #[serde(default)]
        pub periods: Vec<Period>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct Period {
        pub start_time: DateTime<FixedOffset>,
        pub temperature: f64,
        pub temperature_unit: Option<String>,
        pub short_forecast: String,
    }

    impl HourlyForecastResponse {
        pub fn into_series(self, max_periods: usize) -> Result<ForecastSeries> {
            let samples = self
                .properties
                .periods
                .into_iter()
                .take(max_periods)
                .map(|period| ForecastSample {
                    timestamp: period.start_time.with_timezone(&Utc),
                    description: period.short_forecast,
                    temperature: period.temperature,
                    temperature_unit: period.temperature_unit,
                })
                .collect();
            ForecastSeries::new(samples)
        }
    }
}

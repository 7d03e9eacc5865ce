//! Forecast samples, series, and the per-route result

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Place;
use crate::{Result, RoutecastError};

/// A single forecast entry
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ForecastSample {
    /// Start of the period this sample describes
    pub timestamp: DateTime<Utc>,
    /// Short human-readable description ("Mostly Sunny")
    pub description: String,
    pub temperature: f64,
    /// Unit as reported by the provider ("F", "C")
    pub temperature_unit: Option<String>,
}

/// Time-ordered, non-empty forecast for one place
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ForecastSeries {
    samples: Vec<ForecastSample>,
}

impl ForecastSeries {
    /// Build a series, ordering samples by timestamp.
    ///
    /// An empty sample list is an upstream failure: providers that answer
    /// without periods have nothing usable to offer.
    pub fn new(mut samples: Vec<ForecastSample>) -> Result<Self> {
        if samples.is_empty() {
            return Err(RoutecastError::upstream("Forecast provider returned no periods"));
        }
        samples.sort_by_key(|sample| sample.timestamp);
        Ok(Self { samples })
    }

    #[must_use]
    pub fn samples(&self) -> &[ForecastSample] {
        &self.samples
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// A place on the route together with its aligned forecasts
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherPoint {
    pub place: Place,
    pub forecasts: Vec<ForecastSample>,
}

/// Final output of one route-weather request
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct RouteWeatherResult {
    pub route_polyline: String,
    /// Weather points in route traversal order
    pub points: Vec<WeatherPoint>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternate_polylines: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn sample(offset_hours: i64) -> ForecastSample {
        let base = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        ForecastSample {
            timestamp: base + Duration::hours(offset_hours),
            description: "Sunny".to_string(),
            temperature: 72.0,
            temperature_unit: Some("F".to_string()),
        }
    }

    #[test]
    fn test_series_rejects_empty() {
        let err = ForecastSeries::new(Vec::new()).unwrap_err();
        assert!(matches!(err, RoutecastError::Upstream { .. }));
    }

    #[test]
    fn test_series_is_time_ordered() {
        let series = ForecastSeries::new(vec![sample(2), sample(0), sample(1)]).unwrap();
        let hours: Vec<_> = series
            .samples()
            .windows(2)
            .map(|pair| pair[1].timestamp - pair[0].timestamp)
            .collect();
        assert_eq!(hours, vec![Duration::hours(1), Duration::hours(1)]);
        assert_eq!(series.len(), 3);
    }

    #[test]
    fn test_result_omits_empty_alternates() {
        let result = RouteWeatherResult {
            route_polyline: "abc".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("alternate_polylines").is_none());
        assert_eq!(json["route_polyline"], "abc");
    }
}

//! Forecast retrieval and arrival-time alignment

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::Result;
use crate::models::{Coordinate, ForecastSample, ForecastSeries};

pub mod nws;

pub use nws::NwsClient;

/// Default half-width of the window around the arrival time.
pub const DEFAULT_TOLERANCE_SECONDS: i64 = 3600;

/// Number of leading samples returned when no arrival time is known.
pub const DEFAULT_SAMPLES_WITHOUT_ARRIVAL: usize = 5;

#[async_trait]
pub trait ForecastProvider: Send + Sync {
    /// Forecast series for a location; an empty series is an error.
    async fn forecast(&self, location: Coordinate) -> Result<ForecastSeries>;
}

/// Select the forecast samples relevant to a traveler arriving at `arrival`.
///
/// With an arrival time, every sample whose timestamp lies within
/// `tolerance` of it (inclusive) is kept. Without one, the first
/// `max_samples_without_arrival` samples are returned. Series order is
/// preserved either way.
#[must_use]
pub fn align(
    series: &ForecastSeries,
    arrival: Option<DateTime<Utc>>,
    tolerance: Duration,
    max_samples_without_arrival: usize,
) -> Vec<ForecastSample> {
    match arrival {
        None => series
            .samples()
            .iter()
            .take(max_samples_without_arrival)
            .cloned()
            .collect(),
        Some(arrival) => series
            .samples()
            .iter()
            .filter(|sample| (sample.timestamp - arrival).abs() <= tolerance)
            .cloned()
            .collect(),
    }
}

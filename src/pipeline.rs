//! Route weather pipeline
//!
//! Turns an origin/destination pair into weather points along the route:
//! directions -> sampled waypoints -> deduplicated places -> aligned forecasts.
//! Failures on a single waypoint drop that waypoint; only a failed
//! directions lookup fails the whole request.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

use crate::config::RoutecastConfig;
use crate::http::HttpClient;
use crate::maps::{DirectionsProvider, Geocoder, GoogleMapsClient, PlaceResolver};
use crate::models::{Coordinate, Directions, Place, RouteWeatherResult, Waypoint, WeatherPoint};
use crate::places::PlaceDeduplicator;
use crate::sampler::{DEFAULT_THRESHOLD_MILES, InterpolatingSampler, WaypointSampler};
use crate::weather::{
    self, DEFAULT_SAMPLES_WITHOUT_ARRIVAL, DEFAULT_TOLERANCE_SECONDS, ForecastProvider, NwsClient,
};
use crate::{Result, RoutecastError};

/// Where a place's forecast is requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForecastLocation {
    /// Geocode the place name and use its centre
    #[default]
    Place,
    /// Use the sampled waypoint itself
    Waypoint,
}

/// Service-wide defaults, overridable per request
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineDefaults {
    pub threshold_miles: f64,
    pub tolerance: Duration,
    pub max_samples_without_arrival: usize,
    pub max_concurrent_lookups: usize,
    pub forecast_location: ForecastLocation,
}

impl Default for PipelineDefaults {
    fn default() -> Self {
        Self {
            threshold_miles: DEFAULT_THRESHOLD_MILES,
            tolerance: Duration::seconds(DEFAULT_TOLERANCE_SECONDS),
            max_samples_without_arrival: DEFAULT_SAMPLES_WITHOUT_ARRIVAL,
            max_concurrent_lookups: 4,
            forecast_location: ForecastLocation::Place,
        }
    }
}

/// Per-request options; `None` falls back to [`PipelineDefaults`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteWeatherOptions {
    pub sampling_threshold_miles: Option<f64>,
    /// Expected arrival, applied to every place on the route
    pub arrival_time: Option<DateTime<Utc>>,
    pub want_alternates: bool,
    pub forecast_tolerance: Option<Duration>,
}

/// Orchestrates the collaborators for one route-weather request at a time.
///
/// Holds no per-request state; concurrent calls are independent.
pub struct RouteWeatherService {
    directions: Arc<dyn DirectionsProvider>,
    places: Arc<dyn PlaceResolver>,
    geocoder: Arc<dyn Geocoder>,
    forecasts: Arc<dyn ForecastProvider>,
    sampler: Arc<dyn WaypointSampler>,
    defaults: PipelineDefaults,
}

impl RouteWeatherService {
    pub fn new(
        directions: Arc<dyn DirectionsProvider>,
        places: Arc<dyn PlaceResolver>,
        geocoder: Arc<dyn Geocoder>,
        forecasts: Arc<dyn ForecastProvider>,
    ) -> Self {
        Self {
            directions,
            places,
            geocoder,
            forecasts,
            sampler: Arc::new(InterpolatingSampler),
            defaults: PipelineDefaults::default(),
        }
    }

    #[must_use]
    pub fn with_sampler(mut self, sampler: Arc<dyn WaypointSampler>) -> Self {
        self.sampler = sampler;
        self
    }

    #[must_use]
    pub fn with_defaults(mut self, defaults: PipelineDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Build the production service: Google Maps for directions and places,
    /// the National Weather Service for forecasts.
    pub fn from_config(config: &RoutecastConfig) -> Result<Self> {
        let maps_http = HttpClient::new("Google Maps", &config.maps.http_settings())?;
        let maps = Arc::new(GoogleMapsClient::new(
            maps_http,
            config.maps.require_api_key()?,
            config.maps.base_url.clone(),
        ));

        let forecast_http = HttpClient::new("NWS", &config.forecast.http_settings())?;
        let forecasts = Arc::new(NwsClient::new(
            forecast_http,
            config.forecast.base_url.clone(),
            config.forecast.max_periods,
        ));

        Ok(Self::new(maps.clone(), maps.clone(), maps, forecasts)
            .with_sampler(Arc::from(config.sampling.strategy.build()))
            .with_defaults(config.pipeline_defaults()))
    }

    #[must_use]
    pub fn defaults(&self) -> &PipelineDefaults {
        &self.defaults
    }

    /// Fetch directions and compute the weather along the route.
    ///
    /// A directions failure is returned as the request's only error.
    #[instrument(skip(self, options))]
    pub async fn compute_route_weather(
        &self,
        origin: &str,
        destination: &str,
        options: &RouteWeatherOptions,
    ) -> Result<RouteWeatherResult> {
        let origin = origin.trim();
        let destination = destination.trim();
        if origin.is_empty() {
            return Err(RoutecastError::validation("Source location is required"));
        }
        if destination.is_empty() {
            return Err(RoutecastError::validation("Destination is required"));
        }
        self.threshold_for(options)?;

        let directions = self
            .directions
            .directions(origin, destination, options.want_alternates)
            .await
            .map_err(|e| {
                error!("Directions lookup failed: {e}");
                e
            })?;

        self.run(directions, options).await
    }

    /// Sample, resolve, deduplicate and forecast an already fetched route.
    pub async fn run(
        &self,
        directions: Directions,
        options: &RouteWeatherOptions,
    ) -> Result<RouteWeatherResult> {
        let threshold = self.threshold_for(options)?;
        let tolerance = options.forecast_tolerance.unwrap_or(self.defaults.tolerance);
        let concurrency = self.defaults.max_concurrent_lookups.max(1);

        let waypoints = self.sampler.sample(&directions.route.path(), threshold);
        info!(
            "Sampled {} waypoints every {threshold} miles over {} route steps",
            waypoints.len(),
            directions.route.steps.len()
        );

        // Lookups may overlap; `buffered` keeps them in route order so the
        // region decisions below see places exactly as they are travelled.
        let lookups: Vec<_> = waypoints
            .iter()
            .map(|waypoint| self.lookup_place(*waypoint))
            .collect();
        let candidates: Vec<Option<Place>> = stream::iter(lookups)
            .buffered(concurrency)
            .collect()
            .await;

        let mut dedup = PlaceDeduplicator::new();
        let accepted: Vec<(Waypoint, Place)> = waypoints
            .into_iter()
            .zip(candidates)
            .filter_map(|(waypoint, candidate)| {
                candidate
                    .and_then(|place| dedup.admit(place))
                    .map(|place| (waypoint, place))
            })
            .collect();
        debug!("{} places accepted after region deduplication", accepted.len());

        let fetches: Vec<_> = accepted
            .into_iter()
            .map(|(waypoint, place)| {
                self.weather_point(waypoint, place, options.arrival_time, tolerance)
            })
            .collect();
        let points: Vec<WeatherPoint> = stream::iter(fetches)
            .buffered(concurrency)
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .flatten()
            .collect();

        info!("Route weather assembled with {} points", points.len());
        Ok(RouteWeatherResult {
            route_polyline: directions.polyline,
            points,
            alternate_polylines: directions.alternate_polylines,
        })
    }

    /// Forward-geocode a city name.
    pub async fn locate_city(&self, city: &str) -> Result<Coordinate> {
        let city = city.trim();
        if city.is_empty() {
            return Err(RoutecastError::validation("City is required"));
        }
        self.geocoder
            .geocode(city)
            .await?
            .ok_or_else(|| {
                RoutecastError::not_found(format!("Unable to find coordinates for city: {city}"))
            })
    }

    fn threshold_for(&self, options: &RouteWeatherOptions) -> Result<f64> {
        let threshold = options
            .sampling_threshold_miles
            .unwrap_or(self.defaults.threshold_miles);
        if !threshold.is_finite() || threshold <= 0.0 {
            return Err(RoutecastError::validation(format!(
                "Sampling threshold must be a positive number of miles, got: {threshold}"
            )));
        }
        Ok(threshold)
    }

    async fn lookup_place(&self, waypoint: Waypoint) -> Option<Place> {
        match PlaceDeduplicator::lookup(self.places.as_ref(), waypoint.location).await {
            Ok(place) => place,
            Err(e) => {
                skip_waypoint(waypoint, "place lookup", &e);
                None
            }
        }
    }

    async fn weather_point(
        &self,
        waypoint: Waypoint,
        place: Place,
        arrival: Option<DateTime<Utc>>,
        tolerance: Duration,
    ) -> Option<WeatherPoint> {
        let series = match self.fetch_series(waypoint, &place).await {
            Ok(series) => series,
            Err(e) => {
                skip_waypoint(waypoint, &format!("forecast for {}", place.name), &e);
                return None;
            }
        };

        let forecasts = weather::align(
            &series,
            arrival,
            tolerance,
            self.defaults.max_samples_without_arrival,
        );
        if forecasts.is_empty() {
            debug!("No forecast for {} near the arrival time", place.name);
            return None;
        }
        Some(WeatherPoint { place, forecasts })
    }

    async fn fetch_series(
        &self,
        waypoint: Waypoint,
        place: &Place,
    ) -> Result<crate::models::ForecastSeries> {
        let location = match self.defaults.forecast_location {
            ForecastLocation::Waypoint => waypoint.location,
            ForecastLocation::Place => {
                let query = place_query(place);
                let found = self.geocoder.geocode(&query).await?;
                found.ok_or_else(|| {
                    RoutecastError::not_found(format!(
                        "Unable to find coordinates for city: {query}"
                    ))
                })?
            }
        };
        self.forecasts.forecast(location).await
    }
}

/// Geocoding query for a place; the region narrows common town names.
fn place_query(place: &Place) -> String {
    match &place.region {
        Some(region) => format!("{}, {region}", place.name),
        None => place.name.clone(),
    }
}

fn skip_waypoint(waypoint: Waypoint, stage: &str, err: &RoutecastError) {
    let at = waypoint.location.format_coordinates();
    if err.is_recoverable() {
        warn!("Skipping waypoint {at}: {stage} failed: {err}");
    } else {
        error!("Skipping waypoint {at}: unexpected {stage} failure: {err}");
    }
}

//! Scripted collaborators for driving the pipeline without network access
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rand::RngExt;

use routecast::maps::{DirectionsProvider, Geocoder, PlaceKind, PlaceResolver};
use routecast::models::{Coordinate, Directions, ForecastSample, ForecastSeries, Route, RouteStep};
use routecast::weather::ForecastProvider;
use routecast::{RouteWeatherService, RoutecastError};

pub type Result<T> = std::result::Result<T, RoutecastError>;

/// Miles per degree of latitude at the radius used by `routecast::geo`
pub const MILES_PER_DEGREE: f64 = 3958.8 * std::f64::consts::PI / 180.0;

pub const START_LAT: f64 = 39.0;
pub const LONGITUDE: f64 = -105.0;

pub fn forecast_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
}

pub fn lat_at_mile(miles: f64) -> f64 {
    START_LAT + miles / MILES_PER_DEGREE
}

/// A due-north route of three steps and `total_miles` length
pub fn northbound_directions(total_miles: f64) -> Directions {
    let start = Coordinate::new(START_LAT, LONGITUDE);
    let first = Coordinate::new(lat_at_mile(total_miles * 0.32), LONGITUDE);
    let second = Coordinate::new(lat_at_mile(total_miles * 0.64), LONGITUDE);
    let end = Coordinate::new(lat_at_mile(total_miles), LONGITUDE);

    Directions {
        route: Route::new(vec![
            RouteStep::with_start(start, first),
            RouteStep::with_start(first, second),
            RouteStep::with_start(second, end),
        ]),
        polyline: "encoded_overview".to_string(),
        alternate_polylines: Vec::new(),
    }
}

/// `hours` hourly samples starting at [`forecast_start`]
pub fn hourly_series(hours: i64) -> ForecastSeries {
    let samples = (0..hours)
        .map(|h| ForecastSample {
            timestamp: forecast_start() + chrono::Duration::hours(h),
            description: if h < 6 { "Sunny" } else { "Partly Cloudy" }.to_string(),
            temperature: 60.0 + h as f64,
            temperature_unit: Some("F".to_string()),
        })
        .collect();
    ForecastSeries::new(samples).unwrap()
}

/// Directions provider returning a canned route, or failing with a message
pub struct FixedDirections {
    directions: Option<Directions>,
    failure: String,
    pub calls: AtomicUsize,
    pub wanted_alternates: Mutex<Vec<bool>>,
}

impl FixedDirections {
    pub fn ok(directions: Directions) -> Self {
        Self {
            directions: Some(directions),
            failure: String::new(),
            calls: AtomicUsize::new(0),
            wanted_alternates: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            directions: None,
            failure: message.to_string(),
            calls: AtomicUsize::new(0),
            wanted_alternates: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl DirectionsProvider for FixedDirections {
    async fn directions(
        &self,
        _origin: &str,
        _destination: &str,
        want_alternates: bool,
    ) -> Result<Directions> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.wanted_alternates.lock().unwrap().push(want_alternates);
        self.directions
            .clone()
            .ok_or_else(|| RoutecastError::upstream(self.failure.clone()))
    }
}

type ResolveFn = dyn Fn(Coordinate, PlaceKind) -> Result<Option<String>> + Send + Sync;

/// Reverse geocoder answering from a closure, optionally with random latency
pub struct ScriptedResolver {
    answer: Box<ResolveFn>,
    jitter: bool,
    pub calls: AtomicUsize,
}

impl ScriptedResolver {
    pub fn new(
        answer: impl Fn(Coordinate, PlaceKind) -> Result<Option<String>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            answer: Box::new(answer),
            jitter: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_jitter(mut self) -> Self {
        self.jitter = true;
        self
    }
}

#[async_trait]
impl PlaceResolver for ScriptedResolver {
    async fn reverse_geocode(
        &self,
        location: Coordinate,
        kind: PlaceKind,
    ) -> Result<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.jitter {
            let millis = rand::rng().random_range(0..15u64);
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }
        (self.answer)(location, kind)
    }
}

/// Two-county resolver: Larkspur in Douglas County up to mile 45, Monument
/// in El Paso County beyond
pub fn two_county_resolver() -> ScriptedResolver {
    ScriptedResolver::new(|location, kind| {
        let north = location.latitude > lat_at_mile(45.0);
        Ok(Some(
            match (kind, north) {
                (PlaceKind::Locality, false) => "Larkspur",
                (PlaceKind::Region, false) => "Douglas County",
                (PlaceKind::Locality, true) => "Monument",
                (PlaceKind::Region, true) => "El Paso County",
            }
            .to_string(),
        ))
    })
}

/// Forward geocoder backed by a lookup table
#[derive(Default)]
pub struct TableGeocoder {
    entries: HashMap<String, Coordinate>,
    pub queries: Mutex<Vec<String>>,
}

impl TableGeocoder {
    pub fn with(mut self, query: &str, location: Coordinate) -> Self {
        self.entries.insert(query.to_string(), location);
        self
    }
}

#[async_trait]
impl Geocoder for TableGeocoder {
    async fn geocode(&self, address: &str) -> Result<Option<Coordinate>> {
        self.queries.lock().unwrap().push(address.to_string());
        Ok(self.entries.get(address).copied())
    }
}

type ForecastFn = dyn Fn(Coordinate) -> Result<ForecastSeries> + Send + Sync;

/// Forecast provider answering from a closure
pub struct ScriptedForecasts {
    answer: Box<ForecastFn>,
    pub calls: AtomicUsize,
}

impl ScriptedForecasts {
    pub fn new(
        answer: impl Fn(Coordinate) -> Result<ForecastSeries> + Send + Sync + 'static,
    ) -> Self {
        Self {
            answer: Box::new(answer),
            calls: AtomicUsize::new(0),
        }
    }

    /// The same twelve hourly samples everywhere
    pub fn hourly() -> Self {
        Self::new(|_| Ok(hourly_series(12)))
    }
}

#[async_trait]
impl ForecastProvider for ScriptedForecasts {
    async fn forecast(&self, location: Coordinate) -> Result<ForecastSeries> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.answer)(location)
    }
}

/// Geocoder knowing the two-county towns and a pair of cities
pub fn town_geocoder() -> TableGeocoder {
    TableGeocoder::default()
        .with("Larkspur, Douglas County", Coordinate::new(39.2286, -104.8858))
        .with("Monument, El Paso County", Coordinate::new(39.0917, -104.8728))
        .with("Denver", Coordinate::new(39.7392, -104.9903))
}

pub fn service(
    directions: Arc<FixedDirections>,
    resolver: Arc<ScriptedResolver>,
    geocoder: Arc<TableGeocoder>,
    forecasts: Arc<ScriptedForecasts>,
) -> RouteWeatherService {
    RouteWeatherService::new(directions, resolver, geocoder, forecasts)
}

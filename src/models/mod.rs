//! Data models for routecast
//!
//! This module contains the core domain models organized by concern:
//! - Location: coordinates and resolved places
//! - Route: directions, route steps and sampled waypoints
//! - Forecast: forecast samples, series and the per-route result

pub mod forecast;
pub mod location;
pub mod route;

pub use forecast::{ForecastSample, ForecastSeries, RouteWeatherResult, WeatherPoint};
pub use location::{Coordinate, Place};
pub use route::{Directions, Route, RouteStep, Waypoint};

//! `routecast` - weather forecasts sampled along a driving route
//!
//! Fetches directions between two places, samples waypoints at a fixed
//! distance, names each waypoint's town (one per county) and attaches the
//! hourly forecast around the expected arrival time.

pub mod api;
pub mod config;
pub mod error;
pub mod geo;
pub mod http;
pub mod maps;
pub mod models;
pub mod pipeline;
pub mod places;
pub mod sampler;
pub mod telemetry;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use config::RoutecastConfig;
pub use error::RoutecastError;
pub use models::{Coordinate, Directions, Place, RouteWeatherResult, Waypoint, WeatherPoint};
pub use pipeline::{RouteWeatherOptions, RouteWeatherService};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, RoutecastError>;

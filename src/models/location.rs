//! Coordinates and resolved places

use serde::{Deserialize, Serialize};

use crate::{Result, RoutecastError};

/// Geographic coordinate in decimal degrees
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Coordinate {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
}

impl Coordinate {
    /// Create a coordinate without range checks
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Create a coordinate, rejecting values outside the valid lat/lon ranges
    pub fn try_new(latitude: f64, longitude: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(RoutecastError::validation(format!(
                "Latitude must be between -90 and 90, got: {latitude}"
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(RoutecastError::validation(format!(
                "Longitude must be between -180 and 180, got: {longitude}"
            )));
        }
        Ok(Self::new(latitude, longitude))
    }

    /// Format as `lat,lon` with four decimals, the form both map and weather APIs accept
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4},{:.4}", self.latitude, self.longitude)
    }
}

/// A locality resolved from a waypoint
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Place {
    /// Locality-level name (city, town)
    pub name: String,
    /// Coarser administrative unit (county); only used for deduplication
    pub region: Option<String>,
}

impl Place {
    #[must_use]
    pub fn new(name: impl Into<String>, region: Option<String>) -> Self {
        Self {
            name: name.into(),
            region,
        }
    }
}

//! Directions, route steps and sampled waypoints

use serde::{Deserialize, Serialize};

use super::Coordinate;

/// One leg of a directions result
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct RouteStep {
    /// Where the step begins, when the provider reports it
    pub start_location: Option<Coordinate>,
    /// Terminal coordinate of the step
    pub end_location: Coordinate,
}

impl RouteStep {
    #[must_use]
    pub fn new(end_location: Coordinate) -> Self {
        Self {
            start_location: None,
            end_location,
        }
    }

    #[must_use]
    pub fn with_start(start_location: Coordinate, end_location: Coordinate) -> Self {
        Self {
            start_location: Some(start_location),
            end_location,
        }
    }
}

/// Ordered sequence of route steps
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Route {
    pub steps: Vec<RouteStep>,
}

impl Route {
    #[must_use]
    pub fn new(steps: Vec<RouteStep>) -> Self {
        Self { steps }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Coordinates the route passes through, in travel order.
    ///
    /// The first step's start location (if known) is the route origin; every
    /// step then contributes its end location.
    #[must_use]
    pub fn path(&self) -> Vec<Coordinate> {
        let origin = self.steps.first().and_then(|step| step.start_location);
        origin
            .into_iter()
            .chain(self.steps.iter().map(|step| step.end_location))
            .collect()
    }
}

/// Output of a directions lookup
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Directions {
    /// Primary route
    pub route: Route,
    /// Encoded overview polyline of the primary route, passed through untouched
    pub polyline: String,
    /// Overview polylines of alternate routes, when requested
    pub alternate_polylines: Vec<String>,
}

/// A point sampled along the route
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct Waypoint {
    pub location: Coordinate,
}

impl From<Coordinate> for Waypoint {
    fn from(location: Coordinate) -> Self {
        Self { location }
    }
}

//! Waypoint sampling along a route path
//!
//! Two strategies share the [`WaypointSampler`] interface:
//! - [`InterpolatingSampler`] walks the path and emits a point exactly every
//!   `threshold` miles of travel, interpolating inside segments.
//! - [`StepSnappingSampler`] only keeps existing route vertices that are at
//!   least `threshold` miles (straight-line) from the previously kept one.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geo::{distance_miles, interpolate};
use crate::models::{Coordinate, Waypoint};

/// Default spacing between sampled waypoints.
pub const DEFAULT_THRESHOLD_MILES: f64 = 30.0;

/// Slack on the threshold comparison so exact multiples survive rounding.
const THRESHOLD_EPSILON_MILES: f64 = 1e-9;

/// Strategy for turning a route path into waypoints
pub trait WaypointSampler: Send + Sync {
    fn sample(&self, path: &[Coordinate], threshold_miles: f64) -> Vec<Waypoint>;
}

/// Which sampler to build from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingStrategy {
    #[default]
    Interpolated,
    StepSnapping,
}

impl SamplingStrategy {
    #[must_use]
    pub fn build(self) -> Box<dyn WaypointSampler> {
        match self {
            SamplingStrategy::Interpolated => Box::new(InterpolatingSampler),
            SamplingStrategy::StepSnapping => Box::new(StepSnappingSampler),
        }
    }
}

/// Emits waypoints at exact path-distance intervals.
#[derive(Debug, Clone, Copy, Default)]
pub struct InterpolatingSampler;

impl WaypointSampler for InterpolatingSampler {
    fn sample(&self, path: &[Coordinate], threshold_miles: f64) -> Vec<Waypoint> {
        let mut waypoints = Vec::new();
        if path.len() < 2 || !threshold_miles.is_finite() || threshold_miles <= 0.0 {
            return waypoints;
        }

        let mut accumulated = 0.0;
        for pair in path.windows(2) {
            let (mut segment_start, segment_end) = (pair[0], pair[1]);
            let mut segment = distance_miles(segment_start, segment_end);
            accumulated += segment;

            // `accumulated - threshold` is how far past the sample point the
            // segment end lies, so the sample sits `segment - overshoot` in.
            while accumulated + THRESHOLD_EPSILON_MILES >= threshold_miles {
                let along = (segment - (accumulated - threshold_miles)).max(0.0);
                let fraction = if segment > 0.0 { (along / segment).min(1.0) } else { 0.0 };
                let point = interpolate(segment_start, segment_end, fraction);
                waypoints.push(Waypoint::from(point));

                segment_start = point;
                segment -= along;
                accumulated -= threshold_miles;
            }
        }

        debug!(
            "Sampled {} waypoints from {} path points every {threshold_miles} miles",
            waypoints.len(),
            path.len()
        );
        waypoints
    }
}

/// Keeps route vertices spaced at least `threshold` miles apart.
#[derive(Debug, Clone, Copy, Default)]
pub struct StepSnappingSampler;

impl WaypointSampler for StepSnappingSampler {
    fn sample(&self, path: &[Coordinate], threshold_miles: f64) -> Vec<Waypoint> {
        let mut waypoints: Vec<Waypoint> = Vec::new();
        if path.len() < 2 {
            return waypoints;
        }

        for &point in path {
            let keep = match waypoints.last() {
                Some(last) => distance_miles(last.location, point) >= threshold_miles,
                None => true,
            };
            if keep {
                waypoints.push(Waypoint::from(point));
            }
        }
        waypoints
    }
}

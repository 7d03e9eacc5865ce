//! Great-circle distance and straight-segment interpolation

use crate::models::Coordinate;

/// Mean Earth radius in miles.
pub const EARTH_RADIUS_MILES: f64 = 3958.8;

/// Haversine distance between two coordinates in miles.
#[must_use]
pub fn distance_miles(from: Coordinate, to: Coordinate) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let delta_lat = (to.latitude - from.latitude).to_radians();
    let delta_lon = (to.longitude - from.longitude).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_MILES * c
}

/// Point at `fraction` (0..=1) of the way from `from` to `to`, linear in lat/lon.
#[must_use]
pub fn interpolate(from: Coordinate, to: Coordinate, fraction: f64) -> Coordinate {
    Coordinate::new(
        from.latitude + (to.latitude - from.latitude) * fraction,
        from.longitude + (to.longitude - from.longitude) * fraction,
    )
}

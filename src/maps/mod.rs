//! Map collaborators: directions, reverse geocoding and forward geocoding
//!
//! The pipeline only talks to these traits; [`google`] provides the
//! Google Maps implementation used in production.

use async_trait::async_trait;

use crate::Result;
use crate::models::{Coordinate, Directions};

pub mod google;

pub use google::GoogleMapsClient;

/// Granularity of a reverse-geocoding lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlaceKind {
    /// City or town
    Locality,
    /// County-level administrative area
    Region,
}

impl PlaceKind {
    /// Address component type used by the Google geocoding API
    #[must_use]
    pub fn component_type(self) -> &'static str {
        match self {
            PlaceKind::Locality => "locality",
            PlaceKind::Region => "administrative_area_level_2",
        }
    }
}

#[async_trait]
pub trait DirectionsProvider: Send + Sync {
    /// Fetch a driving route between two free-form addresses.
    async fn directions(
        &self,
        origin: &str,
        destination: &str,
        want_alternates: bool,
    ) -> Result<Directions>;
}

#[async_trait]
pub trait PlaceResolver: Send + Sync {
    /// Name of the `kind` area containing `location`, if any.
    async fn reverse_geocode(&self, location: Coordinate, kind: PlaceKind)
    -> Result<Option<String>>;
}

#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Coordinates of an address or place name, if it resolves.
    async fn geocode(&self, address: &str) -> Result<Option<Coordinate>>;
}

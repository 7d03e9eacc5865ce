//! Place resolution with one representative place per administrative region

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::Result;
use crate::maps::{PlaceKind, PlaceResolver};
use crate::models::{Coordinate, Place};

/// Tracks which regions already have a place on the current route.
///
/// Create one per request; the seen set must not leak across routes.
#[derive(Debug, Default)]
pub struct PlaceDeduplicator {
    seen_regions: HashSet<String>,
}

impl PlaceDeduplicator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the locality and region names around `location`.
    ///
    /// Both lookups run concurrently. A failed locality lookup is an error; a
    /// failed region lookup only loses the region, since a place without one
    /// is still admissible.
    pub async fn lookup(
        resolver: &dyn PlaceResolver,
        location: Coordinate,
    ) -> Result<Option<Place>> {
        let (locality, region) = futures::join!(
            resolver.reverse_geocode(location, PlaceKind::Locality),
            resolver.reverse_geocode(location, PlaceKind::Region),
        );

        let Some(name) = locality? else {
            debug!("No locality at {}", location.format_coordinates());
            return Ok(None);
        };

        let region = region.unwrap_or_else(|e| {
            warn!("Region lookup failed at {}: {e}", location.format_coordinates());
            None
        });

        Ok(Some(Place::new(name, region)))
    }

    /// Decide whether `candidate` joins the route.
    #[must_use]
    pub fn admit(&mut self, candidate: Place) -> Option<Place> {
        match &candidate.region {
            Some(region) if self.seen_regions.contains(region) => {
                debug!("Skipping {}: region {region} already covered", candidate.name);
                None
            }
            Some(region) => {
                self.seen_regions.insert(region.clone());
                Some(candidate)
            }
            None => Some(candidate),
        }
    }

    /// Look up the place at `location` and apply [`Self::admit`].
    pub async fn resolve(
        &mut self,
        resolver: &dyn PlaceResolver,
        location: Coordinate,
    ) -> Result<Option<Place>> {
        let candidate = Self::lookup(resolver, location).await?;
        Ok(candidate.and_then(|place| self.admit(place)))
    }

    #[must_use]
    pub fn has_seen(&self, region: &str) -> bool {
        self.seen_regions.contains(region)
    }
}

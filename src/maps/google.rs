//! Google Maps Directions and Geocoding API client

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use super::{DirectionsProvider, Geocoder, PlaceKind, PlaceResolver};
use crate::Result;
use crate::http::HttpClient;
use crate::models::{Coordinate, Directions, Route, RouteStep};

/// Client for the Google Maps web services
#[derive(Clone)]
pub struct GoogleMapsClient {
    http: HttpClient,
    api_key: String,
    base_url: String,
}

impl GoogleMapsClient {
    #[must_use]
    pub fn new(http: HttpClient, api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, endpoint: &str, params: &[(&str, &str)]) -> String {
        let query: String = params
            .iter()
            .map(|(name, value)| format!("{name}={}&", urlencoding::encode(value)))
            .collect();
        format!(
            "{}/{endpoint}/json?{query}key={}",
            self.base_url,
            urlencoding::encode(&self.api_key)
        )
    }
}

#[async_trait]
impl DirectionsProvider for GoogleMapsClient {
    #[instrument(skip(self))]
    async fn directions(
        &self,
        origin: &str,
        destination: &str,
        want_alternates: bool,
    ) -> Result<Directions> {
        let alternatives = if want_alternates { "true" } else { "false" };
        let url = self.url(
            "directions",
            &[
                ("origin", origin),
                ("destination", destination),
                ("alternatives", alternatives),
            ],
        );

        let response: wire::DirectionsResponse = self.http.get_json(&url).await?;
        let directions = response.into_directions()?;
        info!(
            "Route from '{}' to '{}' has {} steps ({} alternates)",
            origin,
            destination,
            directions.route.steps.len(),
            directions.alternate_polylines.len()
        );
        Ok(directions)
    }
}

#[async_trait]
impl PlaceResolver for GoogleMapsClient {
    async fn reverse_geocode(
        &self,
        location: Coordinate,
        kind: PlaceKind,
    ) -> Result<Option<String>> {
        let latlng = location.format_coordinates();
        let url = self.url(
            "geocode",
            &[("latlng", latlng.as_str()), ("result_type", kind.component_type())],
        );

        let response: wire::GeocodeResponse = self.http.get_json(&url).await?;
        let name = response.component_named(kind)?;
        debug!("Reverse geocoded {latlng} ({kind:?}) to {name:?}");
        Ok(name)
    }
}

#[async_trait]
impl Geocoder for GoogleMapsClient {
    async fn geocode(&self, address: &str) -> Result<Option<Coordinate>> {
        let url = self.url("geocode", &[("address", address)]);
        let response: wire::GeocodeResponse = self.http.get_json(&url).await?;
        response.first_location()
    }
}

/// Google Maps response structures and conversion utilities
mod wire {
    use serde::Deserialize;

    use super::{Coordinate, Directions, PlaceKind, Route, RouteStep};
    use crate::{Result, RoutecastError};

    #[derive(Debug, Deserialize)]
    pub struct LatLng {
        pub lat: f64,
        pub lng: f64,
    }

    impl From<LatLng> for Coordinate {
        fn from(value: LatLng) -> Self {
            Coordinate::new(value.lat, value.lng)
        }
    }

    #[derive(Debug, Deserialize)]
    pub struct DirectionsResponse {
        pub status: String,
        pub error_message: Option<String>,
        #[serde(default)]
        pub routes: Vec<RouteResponse>,
    }

    #[derive(Debug, Deserialize)]
    pub struct RouteResponse {
        pub overview_polyline: Polyline,
        #[serde(default)]
        pub legs: Vec<Leg>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Polyline {
        pub points: String,
    }

    #[derive(Debug, Deserialize)]
    pub struct Leg {
        #[serde(default)]
        pub steps: Vec<Step>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Step {
        pub start_location: Option<LatLng>,
        pub end_location: LatLng,
    }

    #[derive(Debug, Deserialize)]
    pub struct GeocodeResponse {
        pub status: String,
        pub error_message: Option<String>,
        #[serde(default)]
        pub results: Vec<GeocodeResult>,
    }

    #[derive(Debug, Deserialize)]
    pub struct GeocodeResult {
        #[serde(default)]
        pub address_components: Vec<AddressComponent>,
        pub geometry: Option<Geometry>,
    }

    #[derive(Debug, Deserialize)]
    pub struct AddressComponent {
        pub long_name: String,
        #[serde(default)]
        pub types: Vec<String>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Geometry {
        pub location: LatLng,
    }

    /// Map a Google status string to our error taxonomy.
    fn check_status(status: &str, error_message: Option<&str>, what: &str) -> Result<()> {
        let detail = error_message.unwrap_or("no details");
        match status {
            "OK" => Ok(()),
            "ZERO_RESULTS" | "NOT_FOUND" => Err(RoutecastError::not_found(format!(
                "{what}: {status}"
            ))),
            _ => Err(RoutecastError::upstream(format!(
                "{what} failed with status {status}: {detail}"
            ))),
        }
    }

    impl DirectionsResponse {
        pub fn into_directions(self) -> Result<Directions> {
            check_status(&self.status, self.error_message.as_deref(), "Directions")?;

            let mut routes = self.routes.into_iter();
            let primary = routes
                .next()
                .ok_or_else(|| {
                    RoutecastError::upstream("Directions response contained no routes")
                })?;

            let steps: Vec<RouteStep> = primary
                .legs
                .into_iter()
                .flat_map(|leg| leg.steps)
                .map(|step| RouteStep {
                    start_location: step.start_location.map(Coordinate::from),
                    end_location: step.end_location.into(),
                })
                .collect();
            if steps.is_empty() {
                return Err(RoutecastError::upstream("Directions route contained no steps"));
            }

            Ok(Directions {
                route: Route::new(steps),
                polyline: primary.overview_polyline.points,
                alternate_polylines: routes.map(|r| r.overview_polyline.points).collect(),
            })
        }
    }

    impl GeocodeResponse {
        /// Long name of the first result's component of the requested kind.
        pub fn component_named(self, kind: PlaceKind) -> Result<Option<String>> {
            if self.status == "ZERO_RESULTS" {
                return Ok(None);
            }
            check_status(&self.status, self.error_message.as_deref(), "Reverse geocoding")?;

            let wanted = kind.component_type();
            Ok(self.results.into_iter().next().and_then(|result| {
                result
                    .address_components
                    .into_iter()
                    .find(|component| component.types.iter().any(|t| t == wanted))
                    .map(|component| component.long_name)
            }))
        }

        pub fn first_location(self) -> Result<Option<Coordinate>> {
            if self.status == "ZERO_RESULTS" {
                return Ok(None);
            }
            check_status(&self.status, self.error_message.as_deref(), "Geocoding")?;

            Ok(self
                .results
                .into_iter()
                .next()
                .and_then(|result| result.geometry)
                .map(|geometry| geometry.location.into()))
        }
    }
}

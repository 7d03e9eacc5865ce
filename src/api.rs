//! HTTP endpoints for the route weather service
//!
//! `POST /getRoute` computes weather along a route, `GET /getCityLatLon`
//! geocodes a single city. Response shapes follow what the web frontend
//! consumes (`cities_weather`, `shortForecast`, ...).

use std::sync::Arc;

use axum::{
    Form, Json, Router,
    extract::{
        Query, State,
        rejection::{FormRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::RoutecastError;
use crate::models::{ForecastSample, RouteWeatherResult, WeatherPoint};
use crate::pipeline::{RouteWeatherOptions, RouteWeatherService};

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<RouteWeatherService>,
}

pub fn router(service: Arc<RouteWeatherService>) -> Router {
    Router::new()
        .route("/getRoute", post(get_route))
        .route("/getCityLatLon", get(get_city_lat_lon))
        .with_state(AppState { service })
}

/// Form fields accepted by `POST /getRoute`
#[derive(Debug, Deserialize)]
pub struct RouteForm {
    pub source: Option<String>,
    pub destination: Option<String>,
    /// RFC 3339 timestamp
    pub arrival_time: Option<String>,
    #[serde(default)]
    pub alternatives: bool,
    pub threshold_miles: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct CityQuery {
    pub city: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiForecastPeriod {
    pub time: String,
    pub temperature: f64,
    #[serde(rename = "temperatureUnit")]
    pub temperature_unit: Option<String>,
    #[serde(rename = "shortForecast")]
    pub short_forecast: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiCityWeather {
    pub city: String,
    pub weather: Vec<ApiForecastPeriod>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiRouteWeather {
    pub route: String,
    pub cities_weather: Vec<ApiCityWeather>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternate_routes: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiCoordinates {
    pub lat: f64,
    pub lon: f64,
}

impl From<&ForecastSample> for ApiForecastPeriod {
    fn from(sample: &ForecastSample) -> Self {
        Self {
            time: sample.timestamp.to_rfc3339(),
            temperature: sample.temperature,
            temperature_unit: sample.temperature_unit.clone(),
            short_forecast: sample.description.clone(),
        }
    }
}

impl From<WeatherPoint> for ApiCityWeather {
    fn from(point: WeatherPoint) -> Self {
        Self {
            city: point.place.name,
            weather: point.forecasts.iter().map(ApiForecastPeriod::from).collect(),
        }
    }
}

impl From<RouteWeatherResult> for ApiRouteWeather {
    fn from(result: RouteWeatherResult) -> Self {
        Self {
            route: result.route_polyline,
            cities_weather: result.points.into_iter().map(ApiCityWeather::from).collect(),
            alternate_routes: result.alternate_polylines,
        }
    }
}

/// Error body: `{"error": "..."}` with a status matching the failure kind
pub struct ApiError(RoutecastError);

impl From<RoutecastError> for ApiError {
    fn from(err: RoutecastError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            RoutecastError::Validation { .. } => StatusCode::BAD_REQUEST,
            RoutecastError::NotFound { .. } => StatusCode::NOT_FOUND,
            RoutecastError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            RoutecastError::Config { .. } | RoutecastError::Io { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            error!("Request failed: {}", self.0);
        } else {
            warn!("Request rejected: {}", self.0);
        }

        let body = serde_json::json!({ "error": self.0.user_message() });
        (status, Json(body)).into_response()
    }
}

fn parse_arrival_time(raw: Option<&str>) -> Result<Option<DateTime<Utc>>, RoutecastError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(value) => DateTime::parse_from_rfc3339(value)
            .map(|time| Some(time.with_timezone(&Utc)))
            .map_err(|e| {
                RoutecastError::validation(format!(
                    "arrival_time must be RFC 3339, got '{value}': {e}"
                ))
            }),
    }
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        Self(RoutecastError::validation(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self(RoutecastError::validation(rejection.body_text()))
    }
}

async fn get_route(
    State(state): State<AppState>,
    form: Result<Form<RouteForm>, FormRejection>,
) -> Result<Json<ApiRouteWeather>, ApiError> {
    let Form(form) = form?;
    let source = form.source.unwrap_or_default();
    let destination = form.destination.unwrap_or_default();

    let options = RouteWeatherOptions {
        sampling_threshold_miles: form.threshold_miles,
        arrival_time: parse_arrival_time(form.arrival_time.as_deref())?,
        want_alternates: form.alternatives,
        forecast_tolerance: None,
    };

    let result = state
        .service
        .compute_route_weather(&source, &destination, &options)
        .await?;
    Ok(Json(result.into()))
}

async fn get_city_lat_lon(
    State(state): State<AppState>,
    query: Result<Query<CityQuery>, QueryRejection>,
) -> Result<Json<ApiCoordinates>, ApiError> {
    let Query(query) = query?;
    let city = query.city.unwrap_or_default();
    let location = state.service.locate_city(&city).await?;
    Ok(Json(ApiCoordinates {
        lat: location.latitude,
        lon: location.longitude,
    }))
}

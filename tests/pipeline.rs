//! End-to-end pipeline behaviour against scripted collaborators

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use chrono::Duration;
use rstest::rstest;

use common::*;
use routecast::maps::PlaceKind;
use routecast::models::Coordinate;
use routecast::pipeline::{ForecastLocation, PipelineDefaults};
use routecast::{RouteWeatherOptions, RoutecastConfig, RoutecastError};

fn place_names(result: &routecast::RouteWeatherResult) -> Vec<String> {
    result.points.iter().map(|p| p.place.name.clone()).collect()
}

#[tokio::test]
async fn test_sixty_five_mile_route_yields_two_towns() {
    let geocoder = Arc::new(town_geocoder());
    let forecasts = Arc::new(ScriptedForecasts::hourly());
    let service = service(
        Arc::new(FixedDirections::ok(northbound_directions(65.0))),
        Arc::new(two_county_resolver()),
        geocoder.clone(),
        forecasts.clone(),
    );

    let options = RouteWeatherOptions::default();
    let result = service
        .compute_route_weather("Castle Rock, CO", "Colorado Springs, CO", &options)
        .await
        .unwrap();

    assert_eq!(result.route_polyline, "encoded_overview");
    assert_eq!(place_names(&result), vec!["Larkspur", "Monument"]);
    assert_eq!(
        result.points[0].place.region.as_deref(),
        Some("Douglas County")
    );
    for point in &result.points {
        assert_eq!(point.forecasts.len(), 5);
        assert_eq!(point.forecasts[0].timestamp, forecast_start());
        assert_eq!(point.forecasts[0].description, "Sunny");
    }

    let queries = geocoder.queries.lock().unwrap().clone();
    assert!(queries.contains(&"Larkspur, Douglas County".to_string()));
    assert!(queries.contains(&"Monument, El Paso County".to_string()));
    assert_eq!(forecasts.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_one_place_per_region() {
    let resolver = ScriptedResolver::new(|location, kind| {
        Ok(Some(match kind {
            PlaceKind::Locality if location.latitude > lat_at_mile(45.0) => "Monument".to_string(),
            PlaceKind::Locality => "Larkspur".to_string(),
            PlaceKind::Region => "Douglas County".to_string(),
        }))
    });
    let service = service(
        Arc::new(FixedDirections::ok(northbound_directions(65.0))),
        Arc::new(resolver),
        Arc::new(town_geocoder()),
        Arc::new(ScriptedForecasts::hourly()),
    );

    let result = service
        .compute_route_weather("A", "B", &RouteWeatherOptions::default())
        .await
        .unwrap();

    assert_eq!(place_names(&result), vec!["Larkspur"]);
}

#[tokio::test]
async fn test_places_without_region_are_all_kept() {
    let resolver = ScriptedResolver::new(|location, kind| {
        Ok(match kind {
            PlaceKind::Locality => Some(format!("Town {:.3}", location.latitude)),
            PlaceKind::Region => None,
        })
    });
    let service = service(
        Arc::new(FixedDirections::ok(northbound_directions(65.0))),
        Arc::new(resolver),
        Arc::new(TableGeocoder::default()),
        Arc::new(ScriptedForecasts::hourly()),
    )
    .with_defaults(PipelineDefaults {
        forecast_location: ForecastLocation::Waypoint,
        ..PipelineDefaults::default()
    });

    let result = service
        .compute_route_weather("A", "B", &RouteWeatherOptions::default())
        .await
        .unwrap();

    assert_eq!(result.points.len(), 2);
    assert!(result.points.iter().all(|p| p.place.region.is_none()));
}

#[rstest]
#[case::within_tolerance(3, 3)]
#[case::at_series_start(0, 2)]
#[case::far_future(48, 0)]
#[tokio::test]
async fn test_arrival_time_selects_forecast_window(
    #[case] arrival_offset_hours: i64,
    #[case] expected_per_point: usize,
) {
    let service = service(
        Arc::new(FixedDirections::ok(northbound_directions(65.0))),
        Arc::new(two_county_resolver()),
        Arc::new(town_geocoder()),
        Arc::new(ScriptedForecasts::hourly()),
    );
    let options = RouteWeatherOptions {
        arrival_time: Some(forecast_start() + Duration::hours(arrival_offset_hours)),
        ..RouteWeatherOptions::default()
    };

    let result = service.compute_route_weather("A", "B", &options).await.unwrap();

    if expected_per_point == 0 {
        assert!(result.points.is_empty());
        assert_eq!(result.route_polyline, "encoded_overview");
    } else {
        assert_eq!(result.points.len(), 2);
        assert!(
            result
                .points
                .iter()
                .all(|p| p.forecasts.len() == expected_per_point)
        );
    }
}

#[tokio::test]
async fn test_default_config_aligns_arrivals_a_day_ahead() {
    let config = RoutecastConfig::default();
    let periods = config.forecast.max_periods.min(48) as i64;
    let service = service(
        Arc::new(FixedDirections::ok(northbound_directions(65.0))),
        Arc::new(two_county_resolver()),
        Arc::new(town_geocoder()),
        Arc::new(ScriptedForecasts::new(move |_| Ok(hourly_series(periods)))),
    )
    .with_defaults(config.pipeline_defaults());
    let options = RouteWeatherOptions {
        arrival_time: Some(forecast_start() + Duration::hours(20)),
        ..RouteWeatherOptions::default()
    };

    let result = service.compute_route_weather("A", "B", &options).await.unwrap();

    assert_eq!(place_names(&result), vec!["Larkspur", "Monument"]);
    for point in &result.points {
        assert_eq!(point.forecasts.len(), 3);
        assert_eq!(point.forecasts[1].timestamp, forecast_start() + Duration::hours(20));
    }
}

#[tokio::test]
async fn test_forecast_tolerance_override() {
    let service = service(
        Arc::new(FixedDirections::ok(northbound_directions(65.0))),
        Arc::new(two_county_resolver()),
        Arc::new(town_geocoder()),
        Arc::new(ScriptedForecasts::hourly()),
    );
    let options = RouteWeatherOptions {
        arrival_time: Some(forecast_start() + Duration::hours(5)),
        forecast_tolerance: Some(Duration::hours(2)),
        ..RouteWeatherOptions::default()
    };

    let result = service.compute_route_weather("A", "B", &options).await.unwrap();

    assert_eq!(result.points[0].forecasts.len(), 5);
}

#[tokio::test]
async fn test_failed_forecast_drops_only_that_waypoint() {
    let forecasts = ScriptedForecasts::new(|location| {
        if location.latitude > lat_at_mile(45.0) {
            Err(RoutecastError::upstream("NWS returned 500"))
        } else {
            Ok(hourly_series(12))
        }
    });
    let service = service(
        Arc::new(FixedDirections::ok(northbound_directions(65.0))),
        Arc::new(two_county_resolver()),
        Arc::new(TableGeocoder::default()),
        Arc::new(forecasts),
    )
    .with_defaults(PipelineDefaults {
        forecast_location: ForecastLocation::Waypoint,
        ..PipelineDefaults::default()
    });

    let result = service
        .compute_route_weather("A", "B", &RouteWeatherOptions::default())
        .await
        .unwrap();

    assert_eq!(place_names(&result), vec!["Larkspur"]);
}

#[tokio::test]
async fn test_failed_locality_lookup_drops_only_that_waypoint() {
    let resolver = ScriptedResolver::new(|location, kind| {
        let north = location.latitude > lat_at_mile(45.0);
        match (kind, north) {
            (PlaceKind::Locality, false) => Err(RoutecastError::upstream("OVER_QUERY_LIMIT")),
            (PlaceKind::Locality, true) => Ok(Some("Monument".to_string())),
            (PlaceKind::Region, _) => Ok(Some("El Paso County".to_string())),
        }
    });
    let service = service(
        Arc::new(FixedDirections::ok(northbound_directions(65.0))),
        Arc::new(resolver),
        Arc::new(town_geocoder()),
        Arc::new(ScriptedForecasts::hourly()),
    );

    let result = service
        .compute_route_weather("A", "B", &RouteWeatherOptions::default())
        .await
        .unwrap();

    // The failed waypoint never claimed El Paso County, so Monument still gets it
    assert_eq!(place_names(&result), vec!["Monument"]);
}

#[tokio::test]
async fn test_ungeocodable_place_is_skipped() {
    let geocoder = TableGeocoder::default()
        .with("Monument, El Paso County", Coordinate::new(39.0917, -104.8728));
    let service = service(
        Arc::new(FixedDirections::ok(northbound_directions(65.0))),
        Arc::new(two_county_resolver()),
        Arc::new(geocoder),
        Arc::new(ScriptedForecasts::hourly()),
    );

    let result = service
        .compute_route_weather("A", "B", &RouteWeatherOptions::default())
        .await
        .unwrap();

    assert_eq!(place_names(&result), vec!["Monument"]);
}

#[tokio::test]
async fn test_directions_failure_is_the_only_top_level_error() {
    let resolver = Arc::new(two_county_resolver());
    let service = service(
        Arc::new(FixedDirections::failing("REQUEST_DENIED")),
        resolver.clone(),
        Arc::new(town_geocoder()),
        Arc::new(ScriptedForecasts::hourly()),
    );

    let err = service
        .compute_route_weather("A", "B", &RouteWeatherOptions::default())
        .await
        .unwrap_err();

    assert!(matches!(err, RoutecastError::Upstream { .. }));
    assert!(err.to_string().contains("REQUEST_DENIED"));
    assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
}

#[rstest]
#[case::blank_origin("  ", "Colorado Springs", None)]
#[case::blank_destination("Denver", "", None)]
#[case::zero_threshold("Denver", "Colorado Springs", Some(0.0))]
#[case::negative_threshold("Denver", "Colorado Springs", Some(-5.0))]
#[tokio::test]
async fn test_invalid_requests_are_rejected_before_directions(
    #[case] origin: &str,
    #[case] destination: &str,
    #[case] threshold: Option<f64>,
) {
    let directions = Arc::new(FixedDirections::ok(northbound_directions(65.0)));
    let service = service(
        directions.clone(),
        Arc::new(two_county_resolver()),
        Arc::new(town_geocoder()),
        Arc::new(ScriptedForecasts::hourly()),
    );
    let options = RouteWeatherOptions {
        sampling_threshold_miles: threshold,
        ..RouteWeatherOptions::default()
    };

    let err = service
        .compute_route_weather(origin, destination, &options)
        .await
        .unwrap_err();

    assert!(matches!(err, RoutecastError::Validation { .. }));
    assert_eq!(directions.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_threshold_override_controls_waypoint_count() {
    let resolver = Arc::new(two_county_resolver());
    let service = service(
        Arc::new(FixedDirections::ok(northbound_directions(65.0))),
        resolver.clone(),
        Arc::new(town_geocoder()),
        Arc::new(ScriptedForecasts::hourly()),
    );
    let options = RouteWeatherOptions {
        sampling_threshold_miles: Some(10.0),
        ..RouteWeatherOptions::default()
    };

    service.compute_route_weather("A", "B", &options).await.unwrap();

    // six waypoints, a locality and a region lookup each
    assert_eq!(resolver.calls.load(Ordering::SeqCst), 12);
}

#[tokio::test]
async fn test_alternates_are_passed_through() {
    let mut route = northbound_directions(65.0);
    route.alternate_polylines = vec!["alt_one".to_string(), "alt_two".to_string()];
    let directions = Arc::new(FixedDirections::ok(route));
    let service = service(
        directions.clone(),
        Arc::new(two_county_resolver()),
        Arc::new(town_geocoder()),
        Arc::new(ScriptedForecasts::hourly()),
    );
    let options = RouteWeatherOptions {
        want_alternates: true,
        ..RouteWeatherOptions::default()
    };

    let result = service.compute_route_weather("A", "B", &options).await.unwrap();

    assert_eq!(result.alternate_polylines, vec!["alt_one", "alt_two"]);
    assert_eq!(*directions.wanted_alternates.lock().unwrap(), vec![true]);
}

#[rstest]
#[case(1)]
#[case(8)]
#[tokio::test]
async fn test_results_follow_route_order_at_any_concurrency(#[case] concurrency: usize) {
    let resolver = ScriptedResolver::new(|location, _kind| {
        Ok(Some(format!("Town {:.3}", location.latitude)))
    })
    .with_jitter();
    let service = service(
        Arc::new(FixedDirections::ok(northbound_directions(65.0))),
        Arc::new(resolver),
        Arc::new(TableGeocoder::default()),
        Arc::new(ScriptedForecasts::hourly()),
    )
    .with_defaults(PipelineDefaults {
        threshold_miles: 4.0,
        max_concurrent_lookups: concurrency,
        forecast_location: ForecastLocation::Waypoint,
        ..PipelineDefaults::default()
    });

    let result = service
        .compute_route_weather("A", "B", &RouteWeatherOptions::default())
        .await
        .unwrap();

    let expected: Vec<String> = (1..=16)
        .map(|i| format!("Town {:.3}", lat_at_mile(4.0 * f64::from(i))))
        .collect();
    assert_eq!(place_names(&result), expected);
}

#[tokio::test]
async fn test_locate_city() {
    let service = service(
        Arc::new(FixedDirections::ok(northbound_directions(65.0))),
        Arc::new(two_county_resolver()),
        Arc::new(town_geocoder()),
        Arc::new(ScriptedForecasts::hourly()),
    );

    assert_eq!(
        service.locate_city(" Denver ").await.unwrap(),
        Coordinate::new(39.7392, -104.9903)
    );

    let missing = service.locate_city("Atlantis").await.unwrap_err();
    assert!(matches!(missing, RoutecastError::NotFound { .. }));
    assert!(missing.to_string().contains("Atlantis"));

    assert!(matches!(
        service.locate_city("").await,
        Err(RoutecastError::Validation { .. })
    ));
}

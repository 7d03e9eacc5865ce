use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

use routecast::api::ApiRouteWeather;
use routecast::{RouteWeatherOptions, RouteWeatherService, RoutecastConfig, telemetry, web};

#[derive(Parser)]
#[command(name = "routecast", version, about = "Weather forecasts along a driving route")]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level regardless of configuration
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API
    Serve {
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Compute the weather along one route and print it as JSON
    Route {
        origin: String,
        destination: String,
        /// Expected arrival time, RFC 3339
        #[arg(long)]
        arrival: Option<DateTime<Utc>>,
        /// Miles between sampled waypoints
        #[arg(long)]
        threshold: Option<f64>,
        /// Include alternate route polylines
        #[arg(long)]
        alternatives: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = RoutecastConfig::load_from_path(cli.config)?;
    telemetry::init(&config.logging, cli.verbose)?;

    let service = Arc::new(
        RouteWeatherService::from_config(&config).context("Failed to build route weather service")?,
    );

    match cli.command {
        Command::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            web::run(service, &config.server).await
        }
        Command::Route {
            origin,
            destination,
            arrival,
            threshold,
            alternatives,
        } => {
            let options = RouteWeatherOptions {
                sampling_threshold_miles: threshold,
                arrival_time: arrival,
                want_alternates: alternatives,
                forecast_tolerance: None,
            };
            let result = service
                .compute_route_weather(&origin, &destination, &options)
                .await?;
            println!(
                "{}",
                serde_json::to_string_pretty(&ApiRouteWeather::from(result))?
            );
            Ok(())
        }
    }
}

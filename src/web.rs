use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::api;
use crate::config::ServerConfig;
use crate::pipeline::RouteWeatherService;

pub fn app(service: Arc<RouteWeatherService>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    api::router(service).layer(cors)
}

pub async fn run(service: Arc<RouteWeatherService>, server: &ServerConfig) -> Result<()> {
    let addr = format!("{}:{}", server.host, server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Web server running at http://{addr}");

    axum::serve(listener, app(service))
        .await
        .context("Web server stopped unexpectedly")
}

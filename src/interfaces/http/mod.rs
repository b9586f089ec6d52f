//! HTTP surface: `POST /predict`, `GET /health`, `GET /metrics`.

pub mod handlers;

use crate::application::forecast::ForecastService;
use crate::infrastructure::observability::Metrics;
use anyhow::{Context, Result};
use axum::{
    Router,
    http::Method,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub forecasts: Arc<ForecastService>,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(forecasts: Arc<ForecastService>, metrics: Metrics) -> Self {
        metrics.set_model_loaded(forecasts.is_model_loaded());
        Self { forecasts, metrics }
    }
}

pub fn router(state: AppState) -> Router {
    // The chart page may be served from anywhere
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/predict", post(handlers::predict_handler))
        .route("/health", get(handlers::health_handler))
        .route("/metrics", get(handlers::metrics_handler))
        .layer(cors)
        .with_state(state)
}

/// Binds `address` and serves until Ctrl+C.
pub async fn serve(state: AppState, address: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .context(format!("Failed to bind {}", address))?;

    info!("Registering routes:");
    info!("  POST /predict");
    info!("  GET  /health");
    info!("  GET  /metrics");
    info!("Server listening on {}", address);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

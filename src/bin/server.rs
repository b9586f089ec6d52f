//! stockcast Server - HTTP forecasting service
//!
//! Loads the trained model artifact once, then answers `POST /predict`
//! requests with a 30-day autoregressive forecast. A missing or corrupt
//! artifact does not stop the server: it starts degraded and every forecast
//! request returns the "model not loaded" error.
//!
//! # Usage
//! ```sh
//! MODEL_PATH=stock_predictor_model cargo run --bin server
//! ```
//!
//! # Environment Variables
//! - `SERVER_BIND_ADDRESS` / `SERVER_PORT` - Listen address (default: 0.0.0.0:5000)
//! - `MODEL_PATH` - Model artifact to load (default: stock_predictor_model)
//! - `REFERENCE_CHECK_ENABLED` - Run the startup sanity prediction (default: true)

use anyhow::Result;
use std::sync::Arc;
use stockcast::application::forecast::ForecastService;
use stockcast::application::ml::{LstmPredictor, SequenceModel};
use stockcast::config::Config;
use stockcast::domain::ports::MarketDataService;
use stockcast::infrastructure::observability::Metrics;
use stockcast::infrastructure::yahoo::YahooMarketDataService;
use stockcast::interfaces::http::{self, AppState};
use tracing::{Level, error, info, warn};
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false).pretty();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(stdout_layer)
        .init();

    info!("stockcast Server {} starting...", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    info!(
        "Configuration loaded: model={:?}, time_step={}, horizon={}, history={}",
        config.model_path,
        config.forecast.time_step,
        config.forecast.horizon,
        config.forecast.history_period
    );

    let model: Option<Arc<dyn SequenceModel>> = match LstmPredictor::load(&config.model_path) {
        Ok(predictor) => {
            info!(
                "Model loaded: {} {}",
                predictor.name(),
                predictor.version()
            );
            if predictor.window_len() != config.forecast.time_step {
                warn!(
                    "Model expects windows of {} but FORECAST_TIME_STEP is {}; forecasts will fail",
                    predictor.window_len(),
                    config.forecast.time_step
                );
            }
            Some(Arc::new(predictor))
        }
        Err(e) => {
            error!("FATAL: Error loading model: {}. Serving in degraded mode.", e);
            None
        }
    };

    let market_data: Arc<dyn MarketDataService> =
        Arc::new(YahooMarketDataService::new(&config.market_data));
    let forecasts = Arc::new(ForecastService::new(
        model,
        market_data,
        config.forecast.settings(),
    ));

    let reference = &config.server.reference;
    if reference.enabled && forecasts.is_model_loaded() {
        match forecasts
            .reference_prediction(&reference.ticker, reference.range())
            .await
        {
            Ok(next) => info!(
                "Reference check passed: {} ({}) next close {:.2}",
                reference.ticker,
                reference.range(),
                next
            ),
            Err(e) => warn!("Reference check failed for {}: {}", reference.ticker, e),
        }
    }

    let metrics = Metrics::new()?;
    let state = AppState::new(forecasts, metrics);

    http::serve(state, &config.server.socket_address()).await
}

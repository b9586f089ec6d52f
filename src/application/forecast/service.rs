use super::rollout::autoregressive_rollout;
use crate::application::ml::SequenceModel;
use crate::domain::errors::{ForecastError, ModelError};
use crate::domain::market::{HistoryRange, PriceBar, closes};
use crate::domain::ml::MinMaxScaler;
use crate::domain::ports::MarketDataService;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct ForecastSettings {
    /// Length of the seed window taken from the end of the history
    pub time_step: usize,
    /// Number of future closes to produce
    pub horizon: usize,
    /// History requested for each forecast
    pub history: HistoryRange,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            time_step: 100,
            horizon: 30,
            history: HistoryRange::one_year(),
        }
    }
}

/// Result of one forecast request
#[derive(Debug, Clone)]
pub struct Forecast {
    pub ticker: String,
    pub company_name: String,
    pub bars: Vec<PriceBar>,
    pub predicted_prices: Vec<f64>,
}

/// Request-scoped forecasting over a shared, read-only model.
///
/// Every call fits its own scaler on the fetched closes, so concurrent
/// requests never observe each other's normalization.
pub struct ForecastService {
    model: Option<Arc<dyn SequenceModel>>,
    market_data: Arc<dyn MarketDataService>,
    settings: ForecastSettings,
}

impl ForecastService {
    /// `model` is `None` when loading failed at startup; the service then
    /// answers every forecast with [`ForecastError::ModelNotLoaded`].
    pub fn new(
        model: Option<Arc<dyn SequenceModel>>,
        market_data: Arc<dyn MarketDataService>,
        settings: ForecastSettings,
    ) -> Self {
        Self {
            model,
            market_data,
            settings,
        }
    }

    pub fn model(&self) -> Option<&Arc<dyn SequenceModel>> {
        self.model.as_ref()
    }

    pub fn is_model_loaded(&self) -> bool {
        self.model.is_some()
    }

    pub fn settings(&self) -> &ForecastSettings {
        &self.settings
    }

    pub async fn forecast(&self, ticker: Option<&str>) -> Result<Forecast, ForecastError> {
        let model = self.model.clone().ok_or(ForecastError::ModelNotLoaded)?;
        let ticker = ticker
            .filter(|t| !t.trim().is_empty())
            .ok_or(ForecastError::MissingTicker)?;

        let profile = self.market_data.get_profile(ticker).await?;
        let bars = self
            .market_data
            .get_daily_bars(ticker, self.settings.history)
            .await?;
        if bars.is_empty() {
            return Err(ForecastError::NoData {
                ticker: ticker.to_string(),
            });
        }
        debug!("Fetched {} bars for {}", bars.len(), ticker);

        let predicted_prices = self
            .project(model, ticker, &closes(&bars), self.settings.horizon)
            .await?;
        info!(
            "Forecast for {}: {} steps from last close {:.2}",
            ticker,
            predicted_prices.len(),
            bars.last().map(|b| b.close).unwrap_or_default()
        );

        Ok(Forecast {
            ticker: ticker.to_string(),
            company_name: profile.company_name,
            bars,
            predicted_prices,
        })
    }

    /// One-step prediction over a fixed reference range.
    ///
    /// Used at startup to confirm the model produces sane output; the fitted
    /// scaler is discarded afterwards.
    pub async fn reference_prediction(
        &self,
        ticker: &str,
        range: HistoryRange,
    ) -> Result<f64, ForecastError> {
        let model = self.model.clone().ok_or(ForecastError::ModelNotLoaded)?;
        let bars = self.market_data.get_daily_bars(ticker, range).await?;
        if bars.is_empty() {
            return Err(ForecastError::NoData {
                ticker: ticker.to_string(),
            });
        }

        let next = self.project(model, ticker, &closes(&bars), 1).await?;
        next.first()
            .copied()
            .ok_or_else(|| ForecastError::from(ModelError::NonFinitePrediction))
    }

    /// Normalizes `series`, rolls the model forward from its tail and maps
    /// the outputs back to prices.
    async fn project(
        &self,
        model: Arc<dyn SequenceModel>,
        ticker: &str,
        series: &[f64],
        horizon: usize,
    ) -> Result<Vec<f64>, ForecastError> {
        let time_step = self.settings.time_step;
        if series.len() < time_step {
            return Err(ForecastError::InsufficientHistory {
                ticker: ticker.to_string(),
                needed: time_step,
                available: series.len(),
            });
        }

        let scaler = MinMaxScaler::fit(series)?;
        let seed = scaler.transform(&series[series.len() - time_step..]);

        let normalized = tokio::task::spawn_blocking(move || {
            autoregressive_rollout(model.as_ref(), &seed, horizon)
        })
        .await
        .map_err(|e| ModelError::Inference {
            reason: e.to_string(),
        })??;

        Ok(scaler.inverse_transform(&normalized))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mock::MockMarketDataService;

    /// Repeats the last value of its window
    struct Persistence(usize);

    impl SequenceModel for Persistence {
        fn predict_next(&self, window: &[f64]) -> Result<f64, ModelError> {
            Ok(window[window.len() - 1])
        }
        fn window_len(&self) -> usize {
            self.0
        }
        fn name(&self) -> &str {
            "persistence"
        }
        fn version(&self) -> &str {
            "test"
        }
    }

    fn settings(time_step: usize) -> ForecastSettings {
        ForecastSettings {
            time_step,
            horizon: 30,
            history: HistoryRange::one_year(),
        }
    }

    #[tokio::test]
    async fn test_missing_model_short_circuits() {
        let service = ForecastService::new(
            None,
            Arc::new(MockMarketDataService::new()),
            ForecastSettings::default(),
        );
        let err = service.forecast(Some("GOOGL")).await.unwrap_err();
        assert!(matches!(err, ForecastError::ModelNotLoaded));
        assert!(!service.is_model_loaded());
    }

    #[tokio::test]
    async fn test_blank_ticker_is_missing() {
        let service = ForecastService::new(
            Some(Arc::new(Persistence(10))),
            Arc::new(MockMarketDataService::new()),
            settings(10),
        );
        for ticker in [None, Some(""), Some("   ")] {
            let err = service.forecast(ticker).await.unwrap_err();
            assert!(matches!(err, ForecastError::MissingTicker));
        }
    }

    #[tokio::test]
    async fn test_persistence_model_repeats_last_close() {
        let market = MockMarketDataService::new();
        market.add_linear_series("LIN", 120, 50.0, 0.5).await;
        market.set_profile("LIN", "Linear Corp").await;
        let service =
            ForecastService::new(Some(Arc::new(Persistence(100))), Arc::new(market), settings(100));

        let forecast = service.forecast(Some("LIN")).await.unwrap();
        let last_close = 50.0 + 119.0 * 0.5;
        assert_eq!(forecast.company_name, "Linear Corp");
        assert_eq!(forecast.bars.len(), 120);
        assert_eq!(forecast.predicted_prices.len(), 30);
        for price in forecast.predicted_prices {
            assert!((price - last_close).abs() < 1e-9);
        }
    }

    #[tokio::test]
    async fn test_short_history_is_an_internal_error() {
        let market = MockMarketDataService::new();
        market.add_linear_series("SHORT", 40, 10.0, 1.0).await;
        let service =
            ForecastService::new(Some(Arc::new(Persistence(100))), Arc::new(market), settings(100));

        let err = service.forecast(Some("SHORT")).await.unwrap_err();
        assert!(matches!(
            err,
            ForecastError::InsufficientHistory {
                needed: 100,
                available: 40,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_reference_prediction_is_one_step() {
        let market = MockMarketDataService::new();
        market.add_linear_series("GOOGL", 150, 100.0, 1.0).await;
        let service =
            ForecastService::new(Some(Arc::new(Persistence(100))), Arc::new(market), settings(100));

        let next = service
            .reference_prediction("GOOGL", HistoryRange::one_year())
            .await
            .unwrap();
        assert!((next - 249.0).abs() < 1e-9);
    }
}

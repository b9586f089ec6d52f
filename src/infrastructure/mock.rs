use crate::domain::market::{HistoryRange, InstrumentProfile, PriceBar};
use crate::domain::ports::MarketDataService;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory market data for tests and offline runs.
///
/// Unknown tickers behave like the real source: an empty history and a
/// profile with no company name. The requested range is ignored.
#[derive(Clone, Default)]
pub struct MockMarketDataService {
    bars: Arc<RwLock<HashMap<String, Vec<PriceBar>>>>,
    names: Arc<RwLock<HashMap<String, String>>>,
    failure: Arc<RwLock<Option<String>>>,
}

impl MockMarketDataService {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_bars(&self, ticker: &str, bars: Vec<PriceBar>) {
        self.bars.write().await.insert(ticker.to_string(), bars);
    }

    pub async fn set_profile(&self, ticker: &str, company_name: &str) {
        self.names
            .write()
            .await
            .insert(ticker.to_string(), company_name.to_string());
    }

    /// Registers `count` daily bars whose close rises by `step` from `start_price`.
    pub async fn add_linear_series(&self, ticker: &str, count: usize, start_price: f64, step: f64) {
        self.set_bars(ticker, Self::linear_bars(count, start_price, step)).await;
    }

    /// Makes every subsequent call fail with `message`.
    pub async fn fail_with(&self, message: &str) {
        *self.failure.write().await = Some(message.to_string());
    }

    pub fn linear_bars(count: usize, start_price: f64, step: f64) -> Vec<PriceBar> {
        let origin = Utc.with_ymd_and_hms(2024, 1, 1, 5, 0, 0).single().unwrap_or_default();
        (0..count)
            .map(|i| {
                let close = start_price + step * i as f64;
                PriceBar {
                    date: origin + Duration::days(i as i64),
                    open: close - step / 2.0,
                    high: close + step.abs(),
                    low: close - step.abs(),
                    close,
                    volume: 1_000 + i as u64,
                }
            })
            .collect()
    }

    async fn check_failure(&self) -> Result<()> {
        match self.failure.read().await.as_ref() {
            Some(message) => anyhow::bail!("{}", message),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl MarketDataService for MockMarketDataService {
    async fn get_profile(&self, ticker: &str) -> Result<InstrumentProfile> {
        self.check_failure().await?;
        let name = self.names.read().await.get(ticker).cloned();
        Ok(InstrumentProfile::new(ticker, name))
    }

    async fn get_daily_bars(&self, ticker: &str, _range: HistoryRange) -> Result<Vec<PriceBar>> {
        self.check_failure().await?;
        Ok(self.bars.read().await.get(ticker).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_ticker_is_empty() {
        let mock = MockMarketDataService::new();
        let bars = mock.get_daily_bars("NOPE", HistoryRange::one_year()).await.unwrap();
        assert!(bars.is_empty());
        let profile = mock.get_profile("NOPE").await.unwrap();
        assert_eq!(profile.company_name, InstrumentProfile::UNKNOWN_NAME);
    }

    #[tokio::test]
    async fn test_linear_series_and_failure() {
        let mock = MockMarketDataService::new();
        mock.add_linear_series("LIN", 3, 10.0, 2.0).await;
        let bars = mock.get_daily_bars("LIN", HistoryRange::one_year()).await.unwrap();
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![10.0, 12.0, 14.0]);
        assert!(bars[0].date < bars[1].date);

        mock.fail_with("upstream down").await;
        let err = mock.get_profile("LIN").await.unwrap_err();
        assert_eq!(err.to_string(), "upstream down");
    }
}

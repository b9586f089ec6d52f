use crate::domain::market::{HistoryRange, InstrumentProfile, PriceBar};
use anyhow::Result;
use async_trait::async_trait;

/// Pull-based source of daily price history.
///
/// An unknown ticker is not an error: implementations return an empty
/// history and leave the "not found" decision to the caller.
#[async_trait]
pub trait MarketDataService: Send + Sync {
    async fn get_profile(&self, ticker: &str) -> Result<InstrumentProfile>;

    async fn get_daily_bars(&self, ticker: &str, range: HistoryRange) -> Result<Vec<PriceBar>>;
}

use super::period::HistoryPeriod;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// One daily OHLCV observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Descriptive metadata about a listed instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentProfile {
    pub ticker: String,
    pub company_name: String,
}

impl InstrumentProfile {
    pub const UNKNOWN_NAME: &'static str = "N/A";

    pub fn new(ticker: impl Into<String>, company_name: Option<String>) -> Self {
        Self {
            ticker: ticker.into(),
            company_name: company_name
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| Self::UNKNOWN_NAME.to_string()),
        }
    }
}

/// Which slice of history to request from a market data source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryRange {
    /// Half-open `[start, end)` calendar range
    Between { start: NaiveDate, end: NaiveDate },
    /// Trailing period ending today
    Trailing(HistoryPeriod),
}

impl HistoryRange {
    pub fn between(start: NaiveDate, end: NaiveDate) -> Self {
        HistoryRange::Between { start, end }
    }

    pub fn one_year() -> Self {
        HistoryRange::Trailing(HistoryPeriod::OneYear)
    }
}

impl std::fmt::Display for HistoryRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HistoryRange::Between { start, end } => write!(f, "{}..{}", start, end),
            HistoryRange::Trailing(period) => write!(f, "last {}", period),
        }
    }
}

/// Extracts the closing-price column in date order.
pub fn closes(bars: &[PriceBar]) -> Vec<f64> {
    bars.iter().map(|bar| bar.close).collect()
}

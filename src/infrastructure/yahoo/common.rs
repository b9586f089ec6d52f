//! Yahoo Finance chart API payloads and their conversion into price bars.

use crate::domain::errors::MarketDataError;
use crate::domain::market::PriceBar;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

/// Error code Yahoo uses for unknown or delisted symbols
pub const NOT_FOUND_CODE: &str = "Not Found";

#[derive(Debug, Deserialize)]
pub struct ChartEnvelope {
    pub chart: ChartBody,
}

#[derive(Debug, Deserialize)]
pub struct ChartBody {
    pub result: Option<Vec<ChartResult>>,
    pub error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
pub struct ChartError {
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChartResult {
    pub meta: ChartMeta,
    #[serde(default)]
    pub timestamp: Vec<i64>,
    pub indicators: Indicators,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    #[serde(default)]
    pub long_name: Option<String>,
    #[serde(default)]
    pub short_name: Option<String>,
    /// Exchange offset from UTC in seconds
    #[serde(default)]
    pub gmtoffset: i64,
}

#[derive(Debug, Deserialize)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<QuoteColumns>,
    #[serde(default)]
    pub adjclose: Vec<AdjCloseColumn>,
}

#[derive(Debug, Default, Deserialize)]
pub struct QuoteColumns {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
pub struct AdjCloseColumn {
    #[serde(default)]
    pub adjclose: Vec<Option<f64>>,
}

/// Parsed chart: display name plus date-ordered bars
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartSeries {
    pub long_name: Option<String>,
    pub bars: Vec<PriceBar>,
}

impl ChartEnvelope {
    /// Converts the payload into bars.
    ///
    /// A `Not Found` error or a missing result is an empty series. Rows with
    /// any missing OHLCV value are dropped. With `auto_adjust`, OHLC are scaled
    /// by `adjclose / close` for that row.
    pub fn into_series(self, ticker: &str, auto_adjust: bool) -> Result<ChartSeries, MarketDataError> {
        if let Some(error) = self.chart.error {
            if error.code == NOT_FOUND_CODE {
                return Ok(ChartSeries::default());
            }
            return Err(MarketDataError::InvalidData {
                ticker: ticker.to_string(),
                reason: format!(
                    "{}: {}",
                    error.code,
                    error.description.unwrap_or_default()
                ),
            });
        }

        let Some(result) = self.chart.result.and_then(|r| r.into_iter().next()) else {
            return Ok(ChartSeries::default());
        };

        let long_name = result.meta.long_name.or(result.meta.short_name);
        let offset = result.meta.gmtoffset;
        let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
        let adjclose = result
            .indicators
            .adjclose
            .into_iter()
            .next()
            .map(|c| c.adjclose)
            .unwrap_or_default();

        let rows = result.timestamp.len();
        let columns = [
            ("open", quote.open.len()),
            ("high", quote.high.len()),
            ("low", quote.low.len()),
            ("close", quote.close.len()),
        ];
        if let Some((name, len)) = columns.iter().find(|(_, len)| *len != rows) {
            return Err(MarketDataError::InvalidData {
                ticker: ticker.to_string(),
                reason: format!("{} column has {} values for {} timestamps", name, len, rows),
            });
        }

        let mut bars = Vec::with_capacity(rows);
        for (i, &ts) in result.timestamp.iter().enumerate() {
            let volume = quote.volume.get(i).copied().flatten();
            let (Some(open), Some(high), Some(low), Some(close), Some(volume)) =
                (quote.open[i], quote.high[i], quote.low[i], quote.close[i], volume)
            else {
                continue;
            };

            let ratio = match adjclose.get(i).copied().flatten() {
                Some(adj) if auto_adjust && close != 0.0 => adj / close,
                _ => 1.0,
            };
            let Some(date) = session_date(ts, offset) else {
                continue;
            };

            bars.push(PriceBar {
                date,
                open: open * ratio,
                high: high * ratio,
                low: low * ratio,
                close: close * ratio,
                volume: volume.max(0.0) as u64,
            });
        }

        Ok(ChartSeries { long_name, bars })
    }
}

/// Midnight of the trading day in exchange time, expressed in UTC.
fn session_date(timestamp: i64, gmtoffset: i64) -> Option<DateTime<Utc>> {
    let local = DateTime::from_timestamp(timestamp + gmtoffset, 0)?;
    let midnight = local.date_naive().and_hms_opt(0, 0, 0)?.and_utc();
    Some(midnight - Duration::seconds(gmtoffset))
}

use super::common::{ChartEnvelope, ChartSeries};
use crate::config::MarketDataConfig;
use crate::domain::errors::MarketDataError;
use crate::domain::market::{HistoryRange, InstrumentProfile, PriceBar};
use crate::domain::ports::MarketDataService;
use crate::infrastructure::core::http_client_factory::{
    HttpClientFactory, build_url_with_query, encode_component,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use reqwest::StatusCode;
use reqwest_middleware::ClientWithMiddleware;
use tracing::{debug, error};

/// Daily history from the Yahoo Finance chart endpoint
pub struct YahooMarketDataService {
    client: ClientWithMiddleware,
    base_url: String,
    auto_adjust: bool,
}

impl YahooMarketDataService {
    pub fn new(config: &MarketDataConfig) -> Self {
        Self {
            client: HttpClientFactory::create_client(config),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auto_adjust: config.auto_adjust,
        }
    }

    fn chart_url(&self, ticker: &str) -> String {
        format!("{}/v8/finance/chart/{}", self.base_url, encode_component(ticker))
    }

    fn range_params(range: HistoryRange) -> Vec<(&'static str, String)> {
        let mut params = match range {
            HistoryRange::Between { start, end } => vec![
                ("period1", epoch_seconds(start).to_string()),
                ("period2", epoch_seconds(end).to_string()),
            ],
            HistoryRange::Trailing(period) => vec![("range", period.to_yahoo_range().to_string())],
        };
        params.push(("interval", "1d".to_string()));
        params.push(("includeAdjustedClose", "true".to_string()));
        params
    }

    async fn fetch_chart(&self, ticker: &str, params: &[(&'static str, String)]) -> Result<ChartSeries> {
        let url = build_url_with_query(&self.chart_url(ticker), params);
        debug!("YahooMarketDataService: GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context(format!("Failed to fetch chart for {}", ticker))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context(format!("Failed to read chart response for {}", ticker))?;

        if status == StatusCode::NOT_FOUND {
            // Unknown symbols come back as 404 with a "Not Found" chart error
            return match serde_json::from_str::<ChartEnvelope>(&body) {
                Ok(envelope) => Ok(envelope.into_series(ticker, self.auto_adjust)?),
                Err(_) => Ok(ChartSeries::default()),
            };
        }

        if !status.is_success() {
            error!(
                "YahooMarketDataService: API error {} for {}: {}",
                status, ticker, body
            );
            return Err(MarketDataError::Status {
                ticker: ticker.to_string(),
                status: status.as_u16(),
                body,
            }
            .into());
        }

        let envelope: ChartEnvelope = serde_json::from_str(&body)
            .context(format!("Failed to parse chart response for {}", ticker))?;
        Ok(envelope.into_series(ticker, self.auto_adjust)?)
    }
}

/// UTC midnight of `date` as a Unix timestamp
fn epoch_seconds(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

#[async_trait]
impl MarketDataService for YahooMarketDataService {
    async fn get_profile(&self, ticker: &str) -> Result<InstrumentProfile> {
        let params = [
            ("range", "5d".to_string()),
            ("interval", "1d".to_string()),
        ];
        let series = self.fetch_chart(ticker, &params).await?;
        Ok(InstrumentProfile::new(ticker, series.long_name))
    }

    async fn get_daily_bars(&self, ticker: &str, range: HistoryRange) -> Result<Vec<PriceBar>> {
        let series = self.fetch_chart(ticker, &Self::range_params(range)).await?;
        debug!(
            "YahooMarketDataService: {} bars for {} ({})",
            series.bars.len(),
            ticker,
            range
        );
        Ok(series.bars)
    }
}

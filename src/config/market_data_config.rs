//! Market data source configuration.

use super::EnvReader;
use anyhow::Result;

#[derive(Debug, Clone)]
pub struct MarketDataConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Retries for transient failures; 0 disables the retry middleware's retries
    pub max_retries: u32,
    /// Scale OHLC by the adjusted-close ratio (splits and dividends)
    pub auto_adjust: bool,
}

impl Default for MarketDataConfig {
    fn default() -> Self {
        Self {
            base_url: "https://query1.finance.yahoo.com".to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 10,
            max_retries: 0,
            auto_adjust: true,
        }
    }
}

impl MarketDataConfig {
    pub(crate) fn load(reader: &EnvReader<'_>) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            base_url: reader.string("MARKET_DATA_BASE_URL", &defaults.base_url),
            timeout_secs: reader.parse("MARKET_DATA_TIMEOUT_SECS", defaults.timeout_secs)?,
            connect_timeout_secs: reader
                .parse("MARKET_DATA_CONNECT_TIMEOUT_SECS", defaults.connect_timeout_secs)?,
            max_retries: reader.parse("MARKET_DATA_MAX_RETRIES", defaults.max_retries)?,
            auto_adjust: reader.parse_bool("MARKET_DATA_AUTO_ADJUST", defaults.auto_adjust)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_data_defaults() {
        let lookup = |_: &str| -> Option<String> { None };
        let config = MarketDataConfig::load(&EnvReader::new(&lookup)).unwrap();
        assert!(config.base_url.contains("finance.yahoo.com"));
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.connect_timeout_secs, 10);
        assert_eq!(config.max_retries, 0);
        assert!(config.auto_adjust);
    }
}

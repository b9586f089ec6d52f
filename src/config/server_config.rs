//! HTTP server and startup check settings.

use super::EnvReader;
use crate::domain::market::HistoryRange;
use anyhow::{Result, bail};
use chrono::NaiveDate;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub reference: ReferenceCheckConfig,
}

/// Startup sanity prediction over a fixed instrument and range
#[derive(Debug, Clone)]
pub struct ReferenceCheckConfig {
    pub enabled: bool,
    pub ticker: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ReferenceCheckConfig {
    pub fn range(&self) -> HistoryRange {
        HistoryRange::between(self.start, self.end)
    }
}

impl ServerConfig {
    pub(crate) fn load(reader: &EnvReader<'_>) -> Result<Self> {
        let reference = ReferenceCheckConfig {
            enabled: reader.parse_bool("REFERENCE_CHECK_ENABLED", true)?,
            ticker: reader.string("REFERENCE_TICKER", "GOOGL"),
            start: reader.date("REFERENCE_START", "2020-01-01")?,
            end: reader.date("REFERENCE_END", "2021-01-01")?,
        };
        if reference.start >= reference.end {
            bail!(
                "REFERENCE_START ({}) must be before REFERENCE_END ({})",
                reference.start,
                reference.end
            );
        }

        Ok(Self {
            bind_address: reader.string("SERVER_BIND_ADDRESS", "0.0.0.0"),
            port: reader.parse("SERVER_PORT", 5000u16)?,
            reference,
        })
    }

    pub fn socket_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let lookup = move |key: &str| map.get(key).cloned();
        ServerConfig::load(&EnvReader::new(&lookup))
    }

    #[test]
    fn test_server_config_defaults() {
        let config = load(&[]).unwrap();
        assert_eq!(config.socket_address(), "0.0.0.0:5000");
        assert!(config.reference.enabled);
        assert_eq!(config.reference.ticker, "GOOGL");
        assert_eq!(
            config.reference.range(),
            HistoryRange::between(
                NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2021, 1, 1).unwrap()
            )
        );
    }

    #[test]
    fn test_reference_range_must_be_ordered() {
        let err = load(&[("REFERENCE_START", "2022-01-01"), ("REFERENCE_END", "2021-01-01")]);
        assert!(err.is_err());
    }

    #[test]
    fn test_bad_port_is_an_error() {
        let err = load(&[("SERVER_PORT", "http")]).unwrap_err();
        assert!(err.to_string().contains("SERVER_PORT"));
    }
}

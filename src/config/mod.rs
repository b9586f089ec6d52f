//! Configuration module for stockcast.
//!
//! Settings are loaded from environment variables (after `.env` is read by
//! the binaries) and grouped by concern: Server, Forecast, Trainer and
//! Market Data.

mod forecast_config;
mod market_data_config;
mod server_config;
mod trainer_config;

pub use forecast_config::ForecastEnvConfig;
pub use market_data_config::MarketDataConfig;
pub use server_config::{ReferenceCheckConfig, ServerConfig};
pub use trainer_config::TrainerEnvConfig;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

/// Reads typed settings from a key lookup.
///
/// `Config::from_env` passes the process environment; tests pass a map.
pub(crate) struct EnvReader<'a> {
    lookup: &'a dyn Fn(&str) -> Option<String>,
}

impl<'a> EnvReader<'a> {
    pub(crate) fn new(lookup: &'a dyn Fn(&str) -> Option<String>) -> Self {
        Self { lookup }
    }

    fn raw(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|v| !v.trim().is_empty())
    }

    pub(crate) fn string(&self, key: &str, default: &str) -> String {
        self.raw(key).unwrap_or_else(|| default.to_string())
    }

    pub(crate) fn parse<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.raw(key) {
            Some(value) => value
                .trim()
                .parse::<T>()
                .map_err(|e| anyhow!("Failed to parse {}: {}", key, e)),
            None => Ok(default),
        }
    }

    pub(crate) fn date(&self, key: &str, default: &str) -> Result<NaiveDate> {
        let value = self.string(key, default);
        NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
            .context(format!("Failed to parse {} (expected YYYY-MM-DD)", key))
    }

    /// Accepts `true`/`false` in any case.
    pub(crate) fn parse_bool(&self, key: &str, default: bool) -> Result<bool> {
        match self.raw(key) {
            Some(value) => value
                .trim()
                .to_lowercase()
                .parse::<bool>()
                .map_err(|e| anyhow!("Failed to parse {}: {}", key, e)),
            None => Ok(default),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Model artifact written by the trainer and loaded by the server
    pub model_path: PathBuf,
    pub server: ServerConfig,
    pub forecast: ForecastEnvConfig,
    pub trainer: TrainerEnvConfig,
    pub market_data: MarketDataConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let reader = EnvReader::new(&lookup);

        Ok(Self {
            model_path: PathBuf::from(reader.string("MODEL_PATH", "stock_predictor_model")),
            server: ServerConfig::load(&reader).context("Failed to load server config")?,
            forecast: ForecastEnvConfig::load(&reader).context("Failed to load forecast config")?,
            trainer: TrainerEnvConfig::load(&reader).context("Failed to load trainer config")?,
            market_data: MarketDataConfig::load(&reader)
                .context("Failed to load market data config")?,
        })
    }
}

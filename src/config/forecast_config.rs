//! Request-time forecasting settings.

use super::EnvReader;
use crate::application::forecast::ForecastSettings;
use crate::domain::market::{HistoryPeriod, HistoryRange};
use anyhow::{Result, bail};

#[derive(Debug, Clone)]
pub struct ForecastEnvConfig {
    pub time_step: usize,
    pub horizon: usize,
    pub history_period: HistoryPeriod,
}

impl ForecastEnvConfig {
    pub(crate) fn load(reader: &EnvReader<'_>) -> Result<Self> {
        let time_step = reader.parse("FORECAST_TIME_STEP", 100usize)?;
        if time_step == 0 {
            bail!("FORECAST_TIME_STEP must be > 0");
        }
        Ok(Self {
            time_step,
            horizon: reader.parse("FORECAST_HORIZON", 30usize)?,
            history_period: reader.parse("FORECAST_HISTORY_PERIOD", HistoryPeriod::OneYear)?,
        })
    }

    pub fn settings(&self) -> ForecastSettings {
        ForecastSettings {
            time_step: self.time_step,
            horizon: self.horizon,
            history: HistoryRange::Trailing(self.history_period),
        }
    }
}

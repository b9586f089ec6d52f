//! Defaults for the training binary; CLI flags override them.

use super::EnvReader;
use crate::application::ml::NetworkConfig;
use crate::application::training::FitSettings;
use anyhow::Result;
use chrono::NaiveDate;

#[derive(Debug, Clone)]
pub struct TrainerEnvConfig {
    pub ticker: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub epochs: usize,
    pub batch_size: usize,
    pub layers: usize,
    pub hidden: usize,
    pub dropout: f64,
    pub learning_rate: f64,
    pub train_split: f64,
}

impl TrainerEnvConfig {
    pub(crate) fn load(reader: &EnvReader<'_>) -> Result<Self> {
        let network = NetworkConfig::default();
        let fit = FitSettings::default();

        Ok(Self {
            ticker: reader.string("TRAIN_TICKER", "GOOGL"),
            start: reader.date("TRAIN_START", "2015-01-01")?,
            end: reader.date("TRAIN_END", "2025-01-01")?,
            epochs: reader.parse("TRAIN_EPOCHS", fit.epochs)?,
            batch_size: reader.parse("TRAIN_BATCH_SIZE", fit.batch_size)?,
            layers: reader.parse("TRAIN_LAYERS", network.layers)?,
            hidden: reader.parse("TRAIN_HIDDEN", network.hidden)?,
            dropout: reader.parse("TRAIN_DROPOUT", network.dropout)?,
            learning_rate: reader.parse("TRAIN_LEARNING_RATE", fit.learning_rate)?,
            train_split: reader.parse("TRAIN_SPLIT", 0.8)?,
        })
    }
}

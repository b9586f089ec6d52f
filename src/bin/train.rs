//! Trains the stacked LSTM on one instrument's daily closes and writes the
//! model artifact the server loads.
//!
//! Flags override `TRAIN_*` environment variables, which override the
//! built-in defaults.

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use stockcast::application::ml::NetworkConfig;
use stockcast::application::training::{FitSettings, TrainingPipeline, TrainingPlan};
use stockcast::config::Config;
use stockcast::infrastructure::yahoo::YahooMarketDataService;
use tracing::{Level, info};
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Ticker symbol to train on [env: TRAIN_TICKER, default: GOOGL]
    #[arg(long)]
    ticker: Option<String>,

    /// First day of history, inclusive (YYYY-MM-DD) [default: 2015-01-01]
    #[arg(long)]
    start: Option<NaiveDate>,

    /// Last day of history, exclusive (YYYY-MM-DD) [default: 2025-01-01]
    #[arg(long)]
    end: Option<NaiveDate>,

    /// Model artifact directory to write [env: MODEL_PATH]
    #[arg(long)]
    output: Option<PathBuf>,

    /// Window length fed to the network
    #[arg(long)]
    time_step: Option<usize>,

    /// Number of stacked LSTM layers
    #[arg(long)]
    layers: Option<usize>,

    /// Units per LSTM layer
    #[arg(long)]
    hidden: Option<usize>,

    /// Dropout rate after each LSTM layer
    #[arg(long)]
    dropout: Option<f64>,

    #[arg(long)]
    epochs: Option<usize>,

    #[arg(long)]
    batch_size: Option<usize>,

    #[arg(long)]
    learning_rate: Option<f64>,

    /// Fraction of the series used for training; the rest is held out
    #[arg(long)]
    train_split: Option<f64>,

    /// Seed for weight init, shuffling and dropout (random if omitted)
    #[arg(long)]
    seed: Option<u64>,

    /// Optional CSV file receiving per-epoch loss and val_loss
    #[arg(long)]
    loss_log: Option<PathBuf>,
}

impl Args {
    fn into_plan(self, config: &Config) -> Result<TrainingPlan> {
        let defaults = &config.trainer;
        let plan = TrainingPlan {
            ticker: self.ticker.unwrap_or_else(|| defaults.ticker.clone()),
            start: self.start.unwrap_or(defaults.start),
            end: self.end.unwrap_or(defaults.end),
            network: NetworkConfig {
                time_step: self.time_step.unwrap_or(config.forecast.time_step),
                layers: self.layers.unwrap_or(defaults.layers),
                hidden: self.hidden.unwrap_or(defaults.hidden),
                dropout: self.dropout.unwrap_or(defaults.dropout),
            },
            fit: FitSettings {
                epochs: self.epochs.unwrap_or(defaults.epochs),
                batch_size: self.batch_size.unwrap_or(defaults.batch_size),
                learning_rate: self.learning_rate.unwrap_or(defaults.learning_rate),
            },
            train_split: self.train_split.unwrap_or(defaults.train_split),
            seed: self.seed,
            output: self.output.unwrap_or_else(|| config.model_path.clone()),
            loss_log: self.loss_log,
        };

        if plan.start >= plan.end {
            bail!("--start ({}) must be before --end ({})", plan.start, plan.end);
        }
        if !(0.0..=1.0).contains(&plan.train_split) {
            bail!("--train-split must be within [0, 1], got {}", plan.train_split);
        }
        if plan.fit.epochs == 0 || plan.fit.batch_size == 0 {
            bail!("--epochs and --batch-size must be > 0");
        }
        plan.network.validate()?;
        Ok(plan)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;
    let plan = args.into_plan(&config)?;

    info!(
        "Training {}x LSTM({}) on {} {}..{} (time_step={}, epochs={}, batch={}, lr={})",
        plan.network.layers,
        plan.network.hidden,
        plan.ticker,
        plan.start,
        plan.end,
        plan.network.time_step,
        plan.fit.epochs,
        plan.fit.batch_size,
        plan.fit.learning_rate
    );

    let market_data = Arc::new(YahooMarketDataService::new(&config.market_data));
    let pipeline = TrainingPipeline::new(market_data);
    let outcome = pipeline
        .run(&plan)
        .await
        .context(format!("Training failed for {}", plan.ticker))?;

    if let Some(last) = outcome.epochs.last() {
        info!("Final training loss: {:.6}", last.loss);
    }
    info!(
        "Model trained on {} windows ({} held out) saved to {:?}",
        outcome.train_pairs, outcome.eval_pairs, plan.output
    );
    Ok(())
}

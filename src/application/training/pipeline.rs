use super::fit::{EpochReport, FitSettings, fit, predict_set};
use crate::application::ml::{
    ArtifactMetadata, InferenceBackend, LstmRegressor, ModelArtifact, NetworkConfig,
    TrainingBackend,
};
use crate::domain::market::{HistoryRange, closes};
use crate::domain::ml::{MinMaxScaler, SupervisedSet, create_dataset, split_train_test};
use crate::domain::ports::MarketDataService;
use anyhow::{Context, Result, bail};
use burn::backend::ndarray::NdArrayDevice;
use burn::module::AutodiffModule;
use burn::tensor::backend::Backend;
use chrono::{NaiveDate, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use smartcore::metrics::{mean_absolute_error, mean_squared_error, r2};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Everything one training run needs
#[derive(Debug, Clone)]
pub struct TrainingPlan {
    pub ticker: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub network: NetworkConfig,
    pub fit: FitSettings,
    /// Fraction of the series used for training, the rest is held out
    pub train_split: f64,
    pub seed: Option<u64>,
    pub output: PathBuf,
    pub loss_log: Option<PathBuf>,
}

/// Hold-out error in price units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoldoutMetrics {
    pub mse: f64,
    pub mae: f64,
    pub r2: f64,
}

#[derive(Debug)]
pub struct TrainingOutcome {
    pub artifact: ModelArtifact,
    pub epochs: Vec<EpochReport>,
    pub train_pairs: usize,
    pub eval_pairs: usize,
    pub holdout: Option<HoldoutMetrics>,
}

/// Fetch, normalize, window, fit, evaluate, persist.
pub struct TrainingPipeline {
    market_data: Arc<dyn MarketDataService>,
}

impl TrainingPipeline {
    pub fn new(market_data: Arc<dyn MarketDataService>) -> Self {
        Self { market_data }
    }

    pub async fn run(&self, plan: &TrainingPlan) -> Result<TrainingOutcome> {
        plan.network.validate()?;

        info!(
            "Fetching daily history for {} ({}..{})",
            plan.ticker, plan.start, plan.end
        );
        let bars = self
            .market_data
            .get_daily_bars(&plan.ticker, HistoryRange::between(plan.start, plan.end))
            .await
            .with_context(|| format!("Failed to fetch history for {}", plan.ticker))?;
        if bars.is_empty() {
            bail!("No data found for ticker: {}.", plan.ticker);
        }
        info!("Loaded {} daily bars for {}", bars.len(), plan.ticker);

        let series = closes(&bars);
        let (scaler, scaled) = MinMaxScaler::fit_transform(&series)
            .with_context(|| format!("Failed to normalize closes for {}", plan.ticker))?;

        let time_step = plan.network.time_step;
        let (train_segment, eval_segment) = split_train_test(&scaled, plan.train_split);
        let train = create_dataset(train_segment, time_step);
        let eval = create_dataset(eval_segment, time_step);

        if train.is_empty() {
            bail!(
                "Insufficient history for {}: training segment has {} closes, need at least {}",
                plan.ticker,
                train_segment.len(),
                time_step + 2
            );
        }
        if eval.is_empty() {
            warn!(
                "Evaluation segment has {} closes (< {}); skipping hold-out evaluation",
                eval_segment.len(),
                time_step + 2
            );
        }
        info!(
            "Training on {} windows, evaluating on {} (time_step={})",
            train.len(),
            eval.len(),
            time_step
        );

        let train_pairs = train.len();
        let eval_pairs = eval.len();
        let network_config = plan.network;
        let settings = plan.fit.clone();
        let seed = plan.seed;

        let (model, epochs, holdout) = tokio::task::spawn_blocking(move || {
            train_network(network_config, &train, &eval, &settings, seed, &scaler)
        })
        .await
        .context("Training task panicked")??;

        if let Some(metrics) = &holdout {
            info!(
                "Hold-out metrics: MSE={:.4}, MAE={:.4}, R2={:.4}",
                metrics.mse, metrics.mae, metrics.r2
            );
        }

        if let Some(path) = &plan.loss_log {
            write_loss_log(path, &epochs)?;
            info!("Loss history written to {:?}", path);
        }

        let artifact = ModelArtifact {
            metadata: ArtifactMetadata {
                ticker: plan.ticker.clone(),
                trained_from: plan.start,
                trained_to: plan.end,
                train_samples: train_pairs,
                created_at: Utc::now(),
                network: network_config,
            },
            model,
        };
        artifact
            .save(&plan.output)
            .with_context(|| format!("Failed to save model to {:?}", plan.output))?;
        info!("Model saved to {:?}", plan.output);

        Ok(TrainingOutcome {
            artifact,
            epochs,
            train_pairs,
            eval_pairs,
            holdout,
        })
    }
}

fn train_network(
    config: NetworkConfig,
    train: &SupervisedSet,
    eval: &SupervisedSet,
    settings: &FitSettings,
    seed: Option<u64>,
    scaler: &MinMaxScaler,
) -> Result<(LstmRegressor<InferenceBackend>, Vec<EpochReport>, Option<HoldoutMetrics>)> {
    let mut rng = match seed {
        Some(seed) => {
            // Weight init and dropout masks draw from the backend RNG
            TrainingBackend::seed(seed);
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_os_rng(),
    };
    let device = NdArrayDevice::default();
    let model = config.init::<TrainingBackend>(&device)?;
    let (model, epochs) = fit(model, train, eval, settings, &mut rng, &device)?;
    let model = model.valid();
    let holdout = holdout_metrics(&model, eval, settings.batch_size, scaler, &device)?;
    Ok((model, epochs, holdout))
}

fn holdout_metrics(
    model: &LstmRegressor<InferenceBackend>,
    eval: &SupervisedSet,
    batch_size: usize,
    scaler: &MinMaxScaler,
    device: &NdArrayDevice,
) -> Result<Option<HoldoutMetrics>> {
    if eval.is_empty() {
        return Ok(None);
    }
    let predicted = scaler.inverse_transform(&predict_set(model, eval, batch_size, device)?);
    let actual = scaler.inverse_transform(&eval.labels);

    let mse: f64 = mean_squared_error(&actual, &predicted);
    let mae: f64 = mean_absolute_error(&actual, &predicted);
    let r2: f64 = r2(&actual, &predicted);
    Ok(Some(HoldoutMetrics { mse, mae, r2 }))
}

fn write_loss_log(path: &Path, epochs: &[EpochReport]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to open loss log {:?}", path))?;
    for report in epochs {
        writer.serialize(report)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::mock::MockMarketDataService;

    fn plan(ticker: &str, output: PathBuf) -> TrainingPlan {
        TrainingPlan {
            ticker: ticker.to_string(),
            start: NaiveDate::from_ymd_opt(2015, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            network: NetworkConfig {
                time_step: 5,
                layers: 1,
                hidden: 4,
                dropout: 0.0,
            },
            fit: FitSettings {
                epochs: 2,
                batch_size: 8,
                learning_rate: 0.01,
            },
            train_split: 0.8,
            seed: Some(1),
            output,
            loss_log: None,
        }
    }

    #[tokio::test]
    async fn test_empty_history_aborts_without_writing() {
        let output = std::env::temp_dir().join(format!("stockcast-empty-{}", std::process::id()));
        let pipeline = TrainingPipeline::new(Arc::new(MockMarketDataService::new()));

        let err = pipeline.run(&plan("NOPE", output.clone())).await.unwrap_err();
        assert!(err.to_string().contains("No data found for ticker: NOPE."));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_short_history_is_insufficient() {
        let output = std::env::temp_dir().join(format!("stockcast-short-{}", std::process::id()));
        let market = MockMarketDataService::new();
        market.add_linear_series("TINY", 6, 10.0, 1.0).await;
        let pipeline = TrainingPipeline::new(Arc::new(market));

        let err = pipeline.run(&plan("TINY", output.clone())).await.unwrap_err();
        assert!(err.to_string().contains("Insufficient history"));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_run_writes_artifact_and_loss_log() {
        let dir = std::env::temp_dir().join(format!("stockcast-train-{}", std::process::id()));
        let output = dir.join("model");
        let log = dir.join("loss.csv");
        let market = MockMarketDataService::new();
        market.add_linear_series("LIN", 60, 100.0, 1.0).await;
        let pipeline = TrainingPipeline::new(Arc::new(market));

        let mut plan = plan("LIN", output.clone());
        plan.loss_log = Some(log.clone());
        let outcome = pipeline.run(&plan).await.unwrap();

        // 48 training closes -> 42 windows; 12 held out -> 6 windows
        assert_eq!(outcome.train_pairs, 42);
        assert_eq!(outcome.artifact.metadata.train_samples, 42);
        assert_eq!(outcome.eval_pairs, 6);
        assert_eq!(outcome.epochs.len(), 2);
        assert!(outcome.holdout.is_some());
        assert!(output.join("artifact.json").exists());
        assert!(output.join("model.mpk").exists());

        let log_text = std::fs::read_to_string(&log).unwrap();
        assert_eq!(log_text.lines().count(), 3);
        assert!(log_text.starts_with("epoch,loss,val_loss"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}

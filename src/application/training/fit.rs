use crate::application::ml::network::{labels_tensor, windows_tensor};
use crate::application::ml::{InferenceBackend, LstmRegressor, TrainingBackend};
use crate::domain::errors::ModelError;
use crate::domain::ml::SupervisedSet;
use burn::backend::ndarray::NdArrayDevice;
use burn::module::AutodiffModule;
use burn::nn::loss::{MseLoss, Reduction};
use burn::optim::{AdamConfig, GradientsParams, Optimizer};
use burn::tensor::ElementConversion;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone)]
pub struct FitSettings {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
}

impl Default for FitSettings {
    fn default() -> Self {
        Self {
            epochs: 50,
            batch_size: 64,
            learning_rate: 0.001,
        }
    }
}

/// Losses recorded at the end of one epoch, in normalized units
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EpochReport {
    pub epoch: usize,
    pub loss: f64,
    pub val_loss: Option<f64>,
}

/// Mini-batch training with a fresh shuffle every epoch.
///
/// `validation` only monitors held-out loss and never feeds back into the
/// weights. Returns the trained model and one report per epoch.
pub fn fit(
    mut model: LstmRegressor<TrainingBackend>,
    train: &SupervisedSet,
    validation: &SupervisedSet,
    settings: &FitSettings,
    rng: &mut StdRng,
    device: &NdArrayDevice,
) -> Result<(LstmRegressor<TrainingBackend>, Vec<EpochReport>), ModelError> {
    let batch_size = settings.batch_size.max(1);
    let mut optimizer = AdamConfig::new()
        .with_beta_1(0.9)
        .with_beta_2(0.999)
        .with_epsilon(1e-7)
        .init();
    let loss_fn = MseLoss::new();
    let mut order: Vec<usize> = (0..train.len()).collect();
    let mut reports = Vec::with_capacity(settings.epochs);

    for epoch in 1..=settings.epochs {
        order.shuffle(rng);

        let mut weighted_loss = 0.0;
        for chunk in order.chunks(batch_size) {
            let windows: Vec<&[f64]> = chunk.iter().map(|&i| train.windows[i].as_slice()).collect();
            let labels: Vec<f64> = chunk.iter().map(|&i| train.labels[i]).collect();

            let output = model.forward(windows_tensor(&windows, device));
            let loss = loss_fn.forward(output, labels_tensor(&labels, device), Reduction::Mean);
            let batch_loss: f64 = loss.clone().into_scalar().elem();

            let grads = GradientsParams::from_grads(loss.backward(), &model);
            model = optimizer.step(settings.learning_rate, model, grads);
            weighted_loss += batch_loss * chunk.len() as f64;
        }

        let loss = weighted_loss / train.len().max(1) as f64;
        let val_loss = evaluate(&model.valid(), validation, batch_size, device)?;
        match val_loss {
            Some(val) => info!(
                "Epoch {}/{} - loss: {:.6} - val_loss: {:.6}",
                epoch, settings.epochs, loss, val
            ),
            None => info!("Epoch {}/{} - loss: {:.6}", epoch, settings.epochs, loss),
        }

        reports.push(EpochReport {
            epoch,
            loss,
            val_loss,
        });
    }

    Ok((model, reports))
}

/// Predictions for every window of `set`, computed in batches.
pub fn predict_set(
    model: &LstmRegressor<InferenceBackend>,
    set: &SupervisedSet,
    batch_size: usize,
    device: &NdArrayDevice,
) -> Result<Vec<f64>, ModelError> {
    let mut predictions = Vec::with_capacity(set.len());
    for chunk in set.windows.chunks(batch_size.max(1)) {
        let windows: Vec<&[f64]> = chunk.iter().map(|w| w.as_slice()).collect();
        predictions.extend(model.predict(&windows, device)?);
    }
    Ok(predictions)
}

/// Mean squared error over `set`, or `None` when it is empty.
fn evaluate(
    model: &LstmRegressor<InferenceBackend>,
    set: &SupervisedSet,
    batch_size: usize,
    device: &NdArrayDevice,
) -> Result<Option<f64>, ModelError> {
    if set.is_empty() {
        return Ok(None);
    }
    let predictions = predict_set(model, set, batch_size, device)?;
    let sum: f64 = predictions
        .iter()
        .zip(&set.labels)
        .map(|(p, y)| (p - y).powi(2))
        .sum();
    Ok(Some(sum / set.len() as f64))
}

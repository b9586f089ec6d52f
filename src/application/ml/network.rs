//! Stacked LSTM regressor over a univariate window, built on burn.
//!
//! Layout follows the classic Keras stack: `layers` LSTM layers of width
//! `hidden` feeding full sequences into each other, dropout after every
//! recurrent layer, and a dense scalar head on the last timestep.

use crate::domain::errors::ModelError;
use burn::backend::{Autodiff, NdArray};
use burn::module::Module;
use burn::nn::{Dropout, DropoutConfig, Linear, LinearConfig, Lstm, LstmConfig};
use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};
use serde::{Deserialize, Serialize};

/// CPU backend used for inference and for persisted weights
pub type InferenceBackend = NdArray;

/// Backend with gradient tracking, used by the trainer
pub type TrainingBackend = Autodiff<InferenceBackend>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub time_step: usize,
    pub layers: usize,
    pub hidden: usize,
    pub dropout: f64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            time_step: 100,
            layers: 3,
            hidden: 50,
            dropout: 0.2,
        }
    }
}

impl NetworkConfig {
    pub fn validate(&self) -> Result<(), ModelError> {
        let reason = if self.time_step == 0 {
            "time_step must be > 0"
        } else if self.layers == 0 {
            "layers must be > 0"
        } else if self.hidden == 0 {
            "hidden must be > 0"
        } else if !(0.0..1.0).contains(&self.dropout) {
            "dropout must be in [0, 1)"
        } else {
            return Ok(());
        };
        Err(ModelError::InvalidConfig {
            reason: reason.to_string(),
        })
    }

    /// Builds a freshly initialized network on `device`.
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<LstmRegressor<B>, ModelError> {
        self.validate()?;
        let layers = (0..self.layers)
            .map(|l| {
                let input = if l == 0 { 1 } else { self.hidden };
                LstmConfig::new(input, self.hidden, true).init(device)
            })
            .collect();

        Ok(LstmRegressor {
            layers,
            dropout: DropoutConfig::new(self.dropout).init(),
            head: LinearConfig::new(self.hidden, 1).init(device),
        })
    }
}

/// Recurrent regressor mapping a window of normalized values to the next value.
///
/// Dropout is only active on autodiff backends, so inference on
/// [`InferenceBackend`] is deterministic.
#[derive(Module, Debug)]
pub struct LstmRegressor<B: Backend> {
    layers: Vec<Lstm<B>>,
    dropout: Dropout,
    head: Linear<B>,
}

impl<B: Backend> LstmRegressor<B> {
    /// `input` is `[batch, time_step, 1]`; the output is `[batch, 1]`.
    pub fn forward(&self, input: Tensor<B, 3>) -> Tensor<B, 2> {
        let mut sequence = input;
        for lstm in &self.layers {
            let (hidden, _) = lstm.forward(sequence, None);
            sequence = self.dropout.forward(hidden);
        }

        let [batch, steps, hidden] = sequence.dims();
        let last = sequence
            .narrow(1, steps.saturating_sub(1), 1)
            .reshape([batch, hidden]);
        self.head.forward(last)
    }

    /// One prediction per window, in input order.
    pub fn predict(&self, windows: &[&[f64]], device: &B::Device) -> Result<Vec<f64>, ModelError> {
        if windows.is_empty() {
            return Ok(Vec::new());
        }
        let output = self.forward(windows_tensor(windows, device));
        let values = output
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| ModelError::Inference {
                reason: format!("{:?}", e),
            })?;
        Ok(values.into_iter().map(f64::from).collect())
    }
}

/// Packs equal-length windows into a `[batch, time_step, 1]` tensor.
pub fn windows_tensor<B: Backend>(windows: &[&[f64]], device: &B::Device) -> Tensor<B, 3> {
    let steps = windows.first().map(|w| w.len()).unwrap_or(0);
    let values: Vec<f32> = windows
        .iter()
        .flat_map(|w| w.iter().map(|&v| v as f32))
        .collect();
    Tensor::from_data(TensorData::new(values, [windows.len(), steps, 1]), device)
}

/// Packs labels into a `[batch, 1]` tensor.
pub fn labels_tensor<B: Backend>(labels: &[f64], device: &B::Device) -> Tensor<B, 2> {
    let values: Vec<f32> = labels.iter().map(|&v| v as f32).collect();
    Tensor::from_data(TensorData::new(values, [labels.len(), 1]), device)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::ndarray::NdArrayDevice;

    fn small_config(dropout: f64) -> NetworkConfig {
        NetworkConfig {
            time_step: 4,
            layers: 2,
            hidden: 3,
            dropout,
        }
    }

    #[test]
    fn test_rejects_invalid_config() {
        let device = NdArrayDevice::default();
        let config = NetworkConfig {
            dropout: 1.0,
            ..NetworkConfig::default()
        };
        assert!(config.init::<InferenceBackend>(&device).is_err());
        let config = NetworkConfig {
            layers: 0,
            ..NetworkConfig::default()
        };
        assert!(config.init::<InferenceBackend>(&device).is_err());
    }

    #[test]
    fn test_windows_tensor_is_batch_major() {
        let device = NdArrayDevice::default();
        let a = [1.0, 2.0, 3.0];
        let b = [4.0, 5.0, 6.0];
        let tensor = windows_tensor::<InferenceBackend>(&[&a[..], &b[..]], &device);
        assert_eq!(tensor.dims(), [2, 3, 1]);
        let values = tensor.into_data().to_vec::<f32>().unwrap();
        assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_one_prediction_per_window() {
        let device = NdArrayDevice::default();
        let network = small_config(0.0).init::<InferenceBackend>(&device).unwrap();
        let windows: Vec<Vec<f64>> = vec![
            vec![0.1, 0.4, 0.35, 0.8],
            vec![0.9, 0.7, 0.2, 0.05],
            vec![0.5, 0.55, 0.6, 0.65],
        ];
        let refs: Vec<&[f64]> = windows.iter().map(|w| w.as_slice()).collect();
        let predictions = network.predict(&refs, &device).unwrap();
        assert_eq!(predictions.len(), 3);
        assert!(predictions.iter().all(|p| p.is_finite()));
        assert!(network.predict(&[], &device).unwrap().is_empty());
    }

    #[test]
    fn test_inference_ignores_dropout() {
        let device = NdArrayDevice::default();
        let network = small_config(0.5).init::<InferenceBackend>(&device).unwrap();
        let window = [0.2, 0.3, 0.25, 0.4];
        let first = network.predict(&[&window[..]], &device).unwrap();
        let second = network.predict(&[&window[..]], &device).unwrap();
        assert_eq!(first, second);
    }
}

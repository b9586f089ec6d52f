use super::network::{InferenceBackend, LstmRegressor, NetworkConfig};
use super::predictor::SequenceModel;
use crate::domain::errors::ModelError;
use burn::backend::ndarray::NdArrayDevice;
use burn::module::Module;
use burn::record::{FullPrecisionSettings, NamedMpkFileRecorder};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

const METADATA_FILE: &str = "artifact.json";
/// The recorder appends `.mpk`
const WEIGHTS_FILE: &str = "model";

/// Where a trained network came from, plus the shape needed to rebuild it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub ticker: String,
    pub trained_from: NaiveDate,
    pub trained_to: NaiveDate,
    pub train_samples: usize,
    pub created_at: DateTime<Utc>,
    pub network: NetworkConfig,
}

/// Persisted model: a directory holding `artifact.json` and the recorded weights.
///
/// Written in place with no temp-dir swap; a crash mid-write leaves files
/// that fail to load.
#[derive(Debug, Clone)]
pub struct ModelArtifact {
    pub metadata: ArtifactMetadata,
    pub model: LstmRegressor<InferenceBackend>,
}

fn artifact_error(path: &Path, reason: impl ToString) -> ModelError {
    ModelError::Artifact {
        path: path.display().to_string(),
        reason: reason.to_string(),
    }
}

fn recorder() -> NamedMpkFileRecorder<FullPrecisionSettings> {
    NamedMpkFileRecorder::<FullPrecisionSettings>::new()
}

impl ModelArtifact {
    pub fn save(&self, dir: &Path) -> Result<(), ModelError> {
        fs::create_dir_all(dir).map_err(|e| artifact_error(dir, e))?;

        let metadata_path = dir.join(METADATA_FILE);
        let file = File::create(&metadata_path).map_err(|e| artifact_error(&metadata_path, e))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &self.metadata)
            .map_err(|e| artifact_error(&metadata_path, e))?;
        writer.flush().map_err(|e| artifact_error(&metadata_path, e))?;

        self.model
            .clone()
            .save_file(dir.join(WEIGHTS_FILE), &recorder())
            .map_err(|e| artifact_error(dir, format!("{:?}", e)))?;
        Ok(())
    }

    pub fn load(dir: &Path, device: &NdArrayDevice) -> Result<Self, ModelError> {
        let metadata_path = dir.join(METADATA_FILE);
        let bytes = fs::read(&metadata_path).map_err(|e| artifact_error(&metadata_path, e))?;
        let metadata: ArtifactMetadata =
            serde_json::from_slice(&bytes).map_err(|e| artifact_error(&metadata_path, e))?;

        let model = metadata
            .network
            .init::<InferenceBackend>(device)?
            .load_file(dir.join(WEIGHTS_FILE), &recorder(), device)
            .map_err(|e| artifact_error(dir, format!("{:?}", e)))?;

        Ok(Self { metadata, model })
    }
}

/// [`SequenceModel`] backed by a trained [`LstmRegressor`]
pub struct LstmPredictor {
    model: Mutex<LstmRegressor<InferenceBackend>>,
    device: NdArrayDevice,
    time_step: usize,
    version: String,
}

impl LstmPredictor {
    pub fn new(artifact: ModelArtifact, device: NdArrayDevice) -> Self {
        let meta = &artifact.metadata;
        let config = meta.network;
        let version = format!(
            "{}x{}-w{} ({} {}..{})",
            config.layers,
            config.hidden,
            config.time_step,
            meta.ticker,
            meta.trained_from,
            meta.trained_to
        );
        Self {
            model: Mutex::new(artifact.model),
            device,
            time_step: config.time_step,
            version,
        }
    }

    pub fn load(dir: &Path) -> Result<Self, ModelError> {
        let device = NdArrayDevice::default();
        let artifact = ModelArtifact::load(dir, &device)?;
        info!(
            "Successfully loaded model from {:?} (trained on {} at {})",
            dir, artifact.metadata.ticker, artifact.metadata.created_at
        );
        Ok(Self::new(artifact, device))
    }
}

impl SequenceModel for LstmPredictor {
    fn predict_next(&self, window: &[f64]) -> Result<f64, ModelError> {
        if window.len() != self.time_step {
            return Err(ModelError::WindowLength {
                expected: self.time_step,
                actual: window.len(),
            });
        }

        let model = self.model.lock().map_err(|_| ModelError::Inference {
            reason: "model lock poisoned".to_string(),
        })?;
        let value = model
            .predict(&[window], &self.device)?
            .first()
            .copied()
            .ok_or_else(|| ModelError::Inference {
                reason: "empty model output".to_string(),
            })?;

        if value.is_finite() {
            Ok(value)
        } else {
            Err(ModelError::NonFinitePrediction)
        }
    }

    fn window_len(&self) -> usize {
        self.time_step
    }

    fn name(&self) -> &str {
        "Stacked LSTM"
    }

    fn version(&self) -> &str {
        &self.version
    }
}

pub mod model_store;
pub mod network;
pub mod predictor;

pub use model_store::{ArtifactMetadata, LstmPredictor, ModelArtifact};
pub use network::{InferenceBackend, LstmRegressor, NetworkConfig, TrainingBackend};
pub use predictor::SequenceModel;

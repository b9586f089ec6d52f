use crate::domain::errors::ModelError;

/// Interface for models mapping a window of normalized closes to the next value
pub trait SequenceModel: Send + Sync {
    /// Predict the normalized value immediately following `window`.
    /// Must be deterministic for a given window.
    fn predict_next(&self, window: &[f64]) -> Result<f64, ModelError>;

    /// Number of observations each input window must contain
    fn window_len(&self) -> usize;

    /// Get model name/type
    fn name(&self) -> &str;

    /// Get model version/id
    fn version(&self) -> &str;
}

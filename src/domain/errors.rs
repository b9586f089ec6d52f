use thiserror::Error;

/// Errors raised by the forecast request flow.
///
/// Each variant maps onto one class of HTTP response; see
/// `interfaces::http::handlers` for the status codes.
#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("Model is not loaded properly. Check server logs.")]
    ModelNotLoaded,

    #[error("Stock ticker symbol not provided.")]
    MissingTicker,

    #[error("No data found for ticker: {ticker}.")]
    NoData { ticker: String },

    #[error("Not enough history for {ticker}: need {needed} closes, got {available}")]
    InsufficientHistory {
        ticker: String,
        needed: usize,
        available: usize,
    },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Scaler(#[from] ScalerError),

    #[error(transparent)]
    Upstream(#[from] anyhow::Error),
}

/// Errors related to the sequence model and its artifact
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Input window has {actual} values, model expects {expected}")]
    WindowLength { expected: usize, actual: usize },

    #[error("Model produced a non-finite prediction")]
    NonFinitePrediction,

    #[error("Invalid model configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Model artifact error at {path}: {reason}")]
    Artifact { path: String, reason: String },

    #[error("Inference task failed: {reason}")]
    Inference { reason: String },
}

/// Errors raised while fitting or applying a normalization transform
#[derive(Debug, Error, PartialEq)]
pub enum ScalerError {
    #[error("Cannot fit scaler on an empty series")]
    EmptySeries,

    #[error("Cannot fit scaler: value at index {index} is not finite")]
    NonFinite { index: usize },
}

/// Errors related to the external market data source
#[derive(Debug, Error)]
pub enum MarketDataError {
    #[error("Market data request for {ticker} failed with HTTP {status}: {body}")]
    Status {
        ticker: String,
        status: u16,
        body: String,
    },

    #[error("Invalid market data for {ticker}: {reason}")]
    InvalidData { ticker: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forecast_error_messages_match_api_contract() {
        assert_eq!(
            ForecastError::ModelNotLoaded.to_string(),
            "Model is not loaded properly. Check server logs."
        );
        assert_eq!(
            ForecastError::MissingTicker.to_string(),
            "Stock ticker symbol not provided."
        );
        let not_found = ForecastError::NoData {
            ticker: "ZZZZ".to_string(),
        };
        assert_eq!(not_found.to_string(), "No data found for ticker: ZZZZ.");
    }

    #[test]
    fn test_model_error_formatting() {
        let error = ModelError::WindowLength {
            expected: 100,
            actual: 42,
        };
        let msg = error.to_string();
        assert!(msg.contains("42"));
        assert!(msg.contains("100"));
    }
}

// Request-time forecasting
pub mod forecast;

// Sequence model, optimizer and artifact persistence
pub mod ml;

// Offline training pipeline
pub mod training;

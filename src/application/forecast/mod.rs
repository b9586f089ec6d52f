pub mod rollout;
pub mod service;

pub use rollout::autoregressive_rollout;
pub use service::{Forecast, ForecastService, ForecastSettings};

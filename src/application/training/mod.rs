pub mod fit;
pub mod pipeline;

pub use fit::{EpochReport, FitSettings};
pub use pipeline::{HoldoutMetrics, TrainingOutcome, TrainingPipeline, TrainingPlan};

// Pure data preparation for the sequence model
pub mod dataset;
pub mod scaler;

pub use dataset::{SupervisedSet, create_dataset, split_train_test};
pub use scaler::MinMaxScaler;

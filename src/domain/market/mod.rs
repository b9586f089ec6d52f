// Price history and instrument metadata
pub mod period;
pub mod types;

pub use period::HistoryPeriod;
pub use types::{HistoryRange, InstrumentProfile, PriceBar, closes};

pub mod core;
pub mod mock;
pub mod observability;
pub mod yahoo;

pub use mock::MockMarketDataService;
pub use yahoo::YahooMarketDataService;

pub mod provider;
pub mod series;
pub mod yahoo;

// Re-export the core types for convenient access (e.g. `use crate::market_data::Series`).
pub use provider::{
    fetch_universe, unlisted_symbols, FetchPlan, MarketDataProvider, RawSymbolData, SeriesRequest,
};
pub use series::Series;
pub use yahoo::YahooClient;

//! Data providers: where prices and fundamentals come from.
//!
//! Retrieval sits outside the scoring core. Providers hand over raw
//! `TickerData`; validation happens when the core builds a `PriceSeries`.

pub mod alpha_vantage;
pub mod circuit_breaker;
pub mod csv_import;
pub mod provider;
pub mod synthetic;
pub mod yahoo;

pub use alpha_vantage::AlphaVantageProvider;
pub use circuit_breaker::CircuitBreaker;
pub use csv_import::CsvProvider;
pub use provider::{DataError, DataProvider, FetchProgress, LogProgress};
pub use synthetic::SyntheticProvider;
pub use yahoo::YahooProvider;

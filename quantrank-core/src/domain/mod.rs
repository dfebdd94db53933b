//! Domain types for QuantRank

pub mod fundamentals;
pub mod price;
pub mod ticker;

pub use fundamentals::{FundamentalMetric, FundamentalSnapshot};
pub use price::{PriceBar, PriceSeries, SeriesError};
pub use ticker::TickerData;

/// Ticker symbol type alias
pub type Ticker = String;

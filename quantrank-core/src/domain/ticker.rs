//! Raw per-ticker input as handed over by a data provider.

use serde::{Deserialize, Serialize};

use super::{FundamentalSnapshot, PriceBar};

/// Everything the scoring engine needs for one ticker.
///
/// Bars are unvalidated here; the pipeline turns them into a `PriceSeries`
/// and reports malformed input per ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerData {
    pub ticker: String,
    pub bars: Vec<PriceBar>,
    #[serde(default)]
    pub fundamentals: FundamentalSnapshot,
}

impl TickerData {
    pub fn new(ticker: impl Into<String>, bars: Vec<PriceBar>, fundamentals: FundamentalSnapshot) -> Self {
        Self {
            ticker: ticker.into(),
            bars,
            fundamentals,
        }
    }
}

//! Fundamental ratios reported by a data provider.
//!
//! Providers differ in coverage, so the snapshot is sparse: any subset of
//! metrics may be present. Percent-denominated metrics (dividend yield, ROE,
//! profit margin) are stored in percent units, e.g. `3.5` for 3.5%.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Known fundamental metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundamentalMetric {
    PeRatio,
    DividendYield,
    PriceToBook,
    ReturnOnEquity,
    ProfitMargin,
    DebtToEquity,
    MarketCap,
}

impl FundamentalMetric {
    pub const ALL: [FundamentalMetric; 7] = [
        FundamentalMetric::PeRatio,
        FundamentalMetric::DividendYield,
        FundamentalMetric::PriceToBook,
        FundamentalMetric::ReturnOnEquity,
        FundamentalMetric::ProfitMargin,
        FundamentalMetric::DebtToEquity,
        FundamentalMetric::MarketCap,
    ];

    /// Stable snake_case key, matching the serde name.
    pub fn key(&self) -> &'static str {
        match self {
            FundamentalMetric::PeRatio => "pe_ratio",
            FundamentalMetric::DividendYield => "dividend_yield",
            FundamentalMetric::PriceToBook => "price_to_book",
            FundamentalMetric::ReturnOnEquity => "return_on_equity",
            FundamentalMetric::ProfitMargin => "profit_margin",
            FundamentalMetric::DebtToEquity => "debt_to_equity",
            FundamentalMetric::MarketCap => "market_cap",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.key() == key)
    }
}

impl fmt::Display for FundamentalMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Sparse metric → value mapping for one ticker.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FundamentalSnapshot {
    values: BTreeMap<FundamentalMetric, f64>,
}

impl FundamentalSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, metric: FundamentalMetric, value: f64) -> Self {
        self.values.insert(metric, value);
        self
    }

    pub fn insert(&mut self, metric: FundamentalMetric, value: f64) {
        self.values.insert(metric, value);
    }

    pub fn get(&self, metric: FundamentalMetric) -> Option<f64> {
        self.values.get(&metric).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (FundamentalMetric, f64)> + '_ {
        self.values.iter().map(|(m, v)| (*m, *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

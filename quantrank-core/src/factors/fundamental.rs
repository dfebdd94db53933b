//! Fundamental factor: banded scoring of valuation and quality ratios.
//!
//! Each metric with a configured band is scored through it; the factor is the
//! plain average over the metrics actually present. Absent metrics are
//! skipped, never filled with a neutral or ideal value.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{FactorScore, PreferenceBand};
use crate::domain::{FundamentalMetric, FundamentalSnapshot};
use crate::error::ScoringIssue;

/// Per-metric preference bands. Metrics without a band are informational only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FundamentalBands {
    bands: BTreeMap<FundamentalMetric, PreferenceBand>,
}

impl Default for FundamentalBands {
    fn default() -> Self {
        let mut bands = BTreeMap::new();
        bands.insert(
            FundamentalMetric::PeRatio,
            PreferenceBand::new(15.0, 25.0, 10.0, 25.0),
        );
        bands.insert(
            FundamentalMetric::DividendYield,
            PreferenceBand::new(2.0, 6.0, 2.0, 6.0),
        );
        bands.insert(
            FundamentalMetric::PriceToBook,
            PreferenceBand::new(1.0, 3.0, 1.0, 5.0),
        );
        bands.insert(
            FundamentalMetric::ReturnOnEquity,
            PreferenceBand::at_least(20.0, 20.0),
        );
        Self { bands }
    }
}

impl FundamentalBands {
    pub fn empty() -> Self {
        Self {
            bands: BTreeMap::new(),
        }
    }

    pub fn with(mut self, metric: FundamentalMetric, band: PreferenceBand) -> Self {
        self.bands.insert(metric, band);
        self
    }

    pub fn get(&self, metric: FundamentalMetric) -> Option<&PreferenceBand> {
        self.bands.get(&metric)
    }

    pub fn iter(&self) -> impl Iterator<Item = (FundamentalMetric, &PreferenceBand)> {
        self.bands.iter().map(|(m, b)| (*m, b))
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    pub fn validate(&self) -> Result<(), String> {
        for (metric, band) in &self.bands {
            band.validate().map_err(|e| format!("{metric}: {e}"))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundamentalResult {
    pub score: FactorScore,
    /// Band score per metric that was present.
    pub metric_scores: BTreeMap<FundamentalMetric, f64>,
    /// Banded metrics that were absent (or non-finite).
    pub missing: Vec<FundamentalMetric>,
}

pub fn score_fundamentals(
    snapshot: &FundamentalSnapshot,
    bands: &FundamentalBands,
) -> FundamentalResult {
    let mut metric_scores = BTreeMap::new();
    let mut missing = Vec::new();

    for (metric, band) in bands.iter() {
        match snapshot.get(metric).filter(|v| v.is_finite()) {
            Some(value) => {
                metric_scores.insert(metric, band.score(value));
            }
            None => missing.push(metric),
        }
    }

    let score = if metric_scores.is_empty() {
        FactorScore::unavailable(ScoringIssue::NoFundamentalMetrics)
    } else {
        let mean = metric_scores.values().sum::<f64>() / metric_scores.len() as f64;
        FactorScore::from_value(mean, "fundamental")
    };

    FundamentalResult {
        score,
        metric_scores,
        missing,
    }
}

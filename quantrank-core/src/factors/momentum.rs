//! Momentum factor: percentage price change over a lookback window.
//!
//! raw = (close[t] - close[t-W]) / close[t-W], needs W + 1 closes.

use serde::{Deserialize, Serialize};

use super::{FactorScore, Mapping};
use crate::domain::PriceSeries;
use crate::error::ScoringIssue;

/// Raw momentum plus its bounded score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomentumResult {
    /// Fractional change, e.g. 0.12 for +12%.
    pub raw: Option<f64>,
    pub score: FactorScore,
}

/// Fractional change between the last close and the close `window` bars earlier.
pub fn raw_momentum(closes: &[f64], window: usize) -> Result<f64, ScoringIssue> {
    let required = window.saturating_add(1);
    if window == 0 || closes.len() < required {
        return Err(ScoringIssue::insufficient(
            format!("momentum_{window}"),
            required,
            closes.len(),
        ));
    }

    let end = closes[closes.len() - 1];
    let start = closes[closes.len() - 1 - window];
    let raw = (end - start) / start;
    if !raw.is_finite() {
        return Err(ScoringIssue::non_finite(format!("momentum_{window}")));
    }
    Ok(raw)
}

pub fn score_momentum(series: &PriceSeries, window: usize, mapping: &Mapping) -> MomentumResult {
    match raw_momentum(series.closes(), window) {
        Ok(raw) => MomentumResult {
            raw: Some(raw),
            score: FactorScore::from_value(mapping.apply(raw), "momentum"),
        },
        Err(reason) => MomentumResult {
            raw: None,
            score: FactorScore::unavailable(reason),
        },
    }
}

//! Weighted combination of the three factor scores.
//!
//! Unavailable factors are dropped and the remaining configured weights are
//! rescaled proportionally to sum to one. The weights actually used are kept
//! on the result.

use serde::{Deserialize, Serialize};

use crate::config::Weights;
use crate::error::ScoringIssue;
use crate::factors::FactorScore;

/// Renormalized weights applied to a composite. Dropped factors carry 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectiveWeights {
    pub momentum: f64,
    pub technical: f64,
    pub fundamental: f64,
}

impl EffectiveWeights {
    pub fn sum(&self) -> f64 {
        self.momentum + self.technical + self.fundamental
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositeScore {
    pub value: f64,
    pub weights: EffectiveWeights,
}

/// Combine factor scores under `weights`.
///
/// A factor counts only when it is available and its configured weight is
/// positive. With nothing left to weigh, the ticker has no composite.
pub fn combine(
    momentum: &FactorScore,
    technical: &FactorScore,
    fundamental: &FactorScore,
    weights: &Weights,
) -> Result<CompositeScore, ScoringIssue> {
    let used = |score: &FactorScore, w: f64| match score.value() {
        Some(v) if w > 0.0 => Some((v, w)),
        _ => None,
    };
    let m = used(momentum, weights.momentum);
    let t = used(technical, weights.technical);
    let f = used(fundamental, weights.fundamental);

    let total: f64 = [m, t, f].iter().flatten().map(|(_, w)| w).sum();
    if total <= 0.0 {
        return Err(ScoringIssue::NoAvailableFactors);
    }

    let share = |part: Option<(f64, f64)>| part.map_or(0.0, |(_, w)| w / total);
    let effective = EffectiveWeights {
        momentum: share(m),
        technical: share(t),
        fundamental: share(f),
    };

    let value = m.map_or(0.0, |(v, _)| v * effective.momentum)
        + t.map_or(0.0, |(v, _)| v * effective.technical)
        + f.map_or(0.0, |(v, _)| v * effective.fundamental);

    if !value.is_finite() {
        return Err(ScoringIssue::non_finite("composite"));
    }

    Ok(CompositeScore {
        value: value.clamp(0.0, 1.0),
        weights: effective,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn avail(v: f64) -> FactorScore {
        FactorScore::from_value(v, "test")
    }

    fn missing() -> FactorScore {
        FactorScore::unavailable(ScoringIssue::NoFundamentalMetrics)
    }

    #[test]
    fn all_factors_use_configured_weights() {
        let c = combine(&avail(1.0), &avail(0.5), &avail(0.0), &Weights::default()).unwrap();
        assert!((c.value - (0.40 + 0.175)).abs() < 1e-12);
        assert_eq!(c.weights.momentum, 0.40);
        assert_eq!(c.weights.technical, 0.35);
        assert_eq!(c.weights.fundamental, 0.25);
    }

    #[test]
    fn missing_fundamental_renormalizes() {
        let c = combine(&avail(0.8), &avail(0.6), &missing(), &Weights::default()).unwrap();
        assert!((c.weights.momentum - 0.40 / 0.75).abs() < 1e-12);
        assert!((c.weights.technical - 0.35 / 0.75).abs() < 1e-12);
        assert_eq!(c.weights.fundamental, 0.0);
        assert!((c.weights.sum() - 1.0).abs() < 1e-12);
        let expected = 0.8 * 0.40 / 0.75 + 0.6 * 0.35 / 0.75;
        assert!((c.value - expected).abs() < 1e-12);
    }

    #[test]
    fn single_factor_takes_full_weight() {
        let c = combine(&missing(), &missing(), &avail(0.3), &Weights::default()).unwrap();
        assert_eq!(c.weights.fundamental, 1.0);
        assert!((c.value - 0.3).abs() < 1e-12);
    }

    #[test]
    fn nothing_available_is_excluded_not_zero() {
        let err = combine(&missing(), &missing(), &missing(), &Weights::default()).unwrap_err();
        assert_eq!(err, ScoringIssue::NoAvailableFactors);
    }

    #[test]
    fn zero_weighted_factor_does_not_count() {
        let weights = Weights::new(1.0, 0.0, 0.0);
        let err = combine(&missing(), &avail(0.9), &avail(0.9), &weights).unwrap_err();
        assert_eq!(err, ScoringIssue::NoAvailableFactors);
    }
}

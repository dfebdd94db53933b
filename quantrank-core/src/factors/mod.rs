//! Factor families: momentum, technical and fundamental sub-scores.
//!
//! Every factor produces a `FactorScore`: either a value in [0, 1] or an
//! explicit "unavailable" with the reason. Unavailable is never encoded as a
//! sentinel number, so it cannot leak into the composite as a fake 0.

pub mod band;
pub mod fundamental;
pub mod mapping;
pub mod momentum;
pub mod technical;

pub use band::PreferenceBand;
pub use fundamental::{score_fundamentals, FundamentalBands, FundamentalResult};
pub use mapping::Mapping;
pub use momentum::{raw_momentum, score_momentum, MomentumResult};
pub use technical::{score_technical, SignalWeights, TechnicalBreakdown, TechnicalResult};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ScoringIssue;

/// The three factor families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorKind {
    Momentum,
    Technical,
    Fundamental,
}

impl fmt::Display for FactorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FactorKind::Momentum => f.write_str("momentum"),
            FactorKind::Technical => f.write_str("technical"),
            FactorKind::Fundamental => f.write_str("fundamental"),
        }
    }
}

/// A bounded sub-score in [0, 1], or the reason it could not be computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FactorScore {
    Available { value: f64 },
    Unavailable { reason: ScoringIssue },
}

impl FactorScore {
    /// Wrap a computed value; non-finite values become unavailable.
    pub fn from_value(value: f64, what: &str) -> Self {
        if value.is_finite() {
            FactorScore::Available {
                value: value.clamp(0.0, 1.0),
            }
        } else {
            FactorScore::Unavailable {
                reason: ScoringIssue::non_finite(what),
            }
        }
    }

    pub fn unavailable(reason: ScoringIssue) -> Self {
        FactorScore::Unavailable { reason }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            FactorScore::Available { value } => Some(*value),
            FactorScore::Unavailable { .. } => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, FactorScore::Available { .. })
    }

    pub fn reason(&self) -> Option<&ScoringIssue> {
        match self {
            FactorScore::Available { .. } => None,
            FactorScore::Unavailable { reason } => Some(reason),
        }
    }
}

/// Weighted mean of `(value, weight)` pairs; `None` if the weights sum to zero.
pub(crate) fn weighted_mean(parts: &[(f64, f64)]) -> Option<f64> {
    let total: f64 = parts.iter().map(|(_, w)| w).sum();
    if total <= 0.0 {
        return None;
    }
    Some(parts.iter().map(|(v, w)| v * w).sum::<f64>() / total)
}

//! Per-ticker scoring issues and batch-level ranking errors.
//!
//! Per-ticker problems never abort a batch: they degrade a factor to
//! unavailable or exclude the ticker, and are reported as diagnostics.
//! Only an empty universe or an invalid configuration fails the whole run.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;
use crate::domain::FundamentalMetric;

/// A structured, per-ticker scoring issue.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScoringIssue {
    #[error("insufficient history for {indicator}: need {required} closes, have {available}")]
    InsufficientHistory {
        indicator: String,
        required: usize,
        available: usize,
    },

    #[error("fundamental metric '{metric}' is missing")]
    MissingFundamentalMetric { metric: FundamentalMetric },

    #[error("no scorable fundamental metric present")]
    NoFundamentalMetrics,

    #[error("no factor available; ticker excluded from ranking")]
    NoAvailableFactors,

    #[error("malformed input: {reason}")]
    MalformedInput { reason: String },

    #[error("non-finite value computed for {what}")]
    NonFinite { what: String },
}

impl ScoringIssue {
    pub fn insufficient(indicator: impl Into<String>, required: usize, available: usize) -> Self {
        ScoringIssue::InsufficientHistory {
            indicator: indicator.into(),
            required,
            available,
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        ScoringIssue::MalformedInput {
            reason: reason.into(),
        }
    }

    pub fn non_finite(what: impl Into<String>) -> Self {
        ScoringIssue::NonFinite { what: what.into() }
    }
}

/// Everything that went wrong (or was skipped) for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerDiagnostic {
    pub ticker: String,
    pub issues: Vec<ScoringIssue>,
    /// True when the ticker produced no composite score.
    pub excluded: bool,
}

/// Batch-level failures of `rank`.
#[derive(Debug, Error)]
pub enum RankError {
    #[error("empty universe: no tickers to rank")]
    EmptyUniverse,

    #[error("invalid scoring config: {0}")]
    InvalidConfig(#[from] ConfigError),
}

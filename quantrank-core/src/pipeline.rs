//! Per-ticker scoring pipeline and the batch `rank` entry point.
//!
//! series -> indicators -> factor scores -> composite, per ticker, in
//! parallel. The global sort happens only after every ticker is scored.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

use crate::composite::{combine, CompositeScore};
use crate::config::ScoringConfig;
use crate::domain::{FundamentalMetric, FundamentalSnapshot, PriceSeries, TickerData};
use crate::error::{RankError, ScoringIssue, TickerDiagnostic};
use crate::factors::{
    score_fundamentals, score_momentum, score_technical, FactorScore, TechnicalBreakdown,
};
use crate::indicators::IndicatorSnapshot;
use crate::ranker::{rank_scores, RankedResult};

/// Full scoring outcome for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredTicker {
    pub ticker: String,
    pub momentum: FactorScore,
    pub raw_momentum: Option<f64>,
    pub technical: FactorScore,
    pub technical_breakdown: TechnicalBreakdown,
    pub fundamental: FactorScore,
    pub fundamental_metrics: BTreeMap<FundamentalMetric, f64>,
    /// Latest indicator readings; `None` when the series was rejected.
    #[serde(default)]
    pub indicators: Option<IndicatorSnapshot>,
    /// Raw fundamentals as supplied.
    #[serde(default)]
    pub fundamentals: FundamentalSnapshot,
    /// `None` when the ticker is excluded from ranking.
    pub composite: Option<CompositeScore>,
    pub issues: Vec<ScoringIssue>,
}

impl ScoredTicker {
    fn rejected(ticker: &str, issue: ScoringIssue) -> Self {
        Self {
            ticker: ticker.to_string(),
            momentum: FactorScore::unavailable(issue.clone()),
            raw_momentum: None,
            technical: FactorScore::unavailable(issue.clone()),
            technical_breakdown: TechnicalBreakdown::default(),
            fundamental: FactorScore::unavailable(issue.clone()),
            fundamental_metrics: BTreeMap::new(),
            indicators: None,
            fundamentals: FundamentalSnapshot::new(),
            composite: None,
            issues: vec![issue],
        }
    }

    pub fn is_ranked_candidate(&self) -> bool {
        self.composite.is_some()
    }

    fn diagnostic(&self) -> Option<TickerDiagnostic> {
        (!self.issues.is_empty()).then(|| TickerDiagnostic {
            ticker: self.ticker.clone(),
            issues: self.issues.clone(),
            excluded: self.composite.is_none(),
        })
    }
}

/// Outcome of one ranking run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingReport {
    pub ranked: RankedResult,
    /// Every input ticker in input order, including excluded ones.
    pub scored: Vec<ScoredTicker>,
    /// Tickers with at least one issue.
    pub diagnostics: Vec<TickerDiagnostic>,
    pub config_hash: String,
    pub universe_size: usize,
}

impl RankingReport {
    pub fn excluded(&self) -> impl Iterator<Item = &TickerDiagnostic> {
        self.diagnostics.iter().filter(|d| d.excluded)
    }

    pub fn scored_ticker(&self, ticker: &str) -> Option<&ScoredTicker> {
        self.scored.iter().find(|s| s.ticker == ticker)
    }
}

/// Score one ticker in isolation. A malformed series rejects the whole ticker.
///
/// Fails only when `config` does not validate.
pub fn score_ticker(data: &TickerData, config: &ScoringConfig) -> Result<ScoredTicker, RankError> {
    config.validate()?;
    Ok(score_validated(data, config))
}

/// Requires a validated config: indicator constructors assert on their periods.
fn score_validated(data: &TickerData, config: &ScoringConfig) -> ScoredTicker {
    if data.ticker.trim().is_empty() {
        return ScoredTicker::rejected(&data.ticker, ScoringIssue::malformed("empty ticker symbol"));
    }

    let series = match PriceSeries::new(data.ticker.as_str(), data.bars.clone()) {
        Ok(series) => series,
        Err(e) => return ScoredTicker::rejected(&data.ticker, ScoringIssue::malformed(e.to_string())),
    };

    let momentum = score_momentum(&series, config.momentum_window, &config.momentum_mapping);
    let snapshot = IndicatorSnapshot::compute(&series, &config.technical);
    let technical = score_technical(&snapshot, &config.technical);
    let fundamental = score_fundamentals(&data.fundamentals, &config.fundamental_bands);

    let mut issues = Vec::new();
    issues.extend(momentum.score.reason().cloned());
    issues.extend(snapshot.gaps());
    issues.extend(
        fundamental
            .missing
            .iter()
            .map(|&metric| ScoringIssue::MissingFundamentalMetric { metric }),
    );
    issues.extend(fundamental.score.reason().cloned());

    let composite = match combine(
        &momentum.score,
        &technical.score,
        &fundamental.score,
        &config.weights,
    ) {
        Ok(composite) => Some(composite),
        Err(issue) => {
            issues.push(issue);
            None
        }
    };

    ScoredTicker {
        ticker: data.ticker.clone(),
        momentum: momentum.score,
        raw_momentum: momentum.raw,
        technical: technical.score,
        technical_breakdown: technical.breakdown,
        fundamental: fundamental.score,
        fundamental_metrics: fundamental.metric_scores,
        indicators: Some(snapshot),
        fundamentals: data.fundamentals.clone(),
        composite,
        issues,
    }
}

/// Score a batch and select the top N.
///
/// Per-ticker failures are isolated into diagnostics. Only an invalid config
/// or an empty batch fails the call.
pub fn rank(batch: &[TickerData], config: &ScoringConfig) -> Result<RankingReport, RankError> {
    config.validate()?;
    if batch.is_empty() {
        return Err(RankError::EmptyUniverse);
    }
    let config_hash = config.config_hash()?;

    let mut seen = HashSet::new();
    let firsts: Vec<bool> = batch.iter().map(|d| seen.insert(d.ticker.as_str())).collect();

    let scored: Vec<ScoredTicker> = batch
        .par_iter()
        .zip(firsts.par_iter())
        .map(|(data, &first)| {
            if first {
                score_validated(data, config)
            } else {
                ScoredTicker::rejected(
                    &data.ticker,
                    ScoringIssue::malformed("duplicate ticker in batch"),
                )
            }
        })
        .collect();

    let diagnostics: Vec<TickerDiagnostic> = scored.iter().filter_map(ScoredTicker::diagnostic).collect();
    for diag in diagnostics.iter().filter(|d| d.excluded) {
        debug!(ticker = %diag.ticker, issues = diag.issues.len(), "ticker excluded from ranking");
    }

    let candidates = scored
        .iter()
        .filter_map(|s| s.composite.map(|c| (s.ticker.clone(), c)))
        .collect();
    let ranked = rank_scores(candidates, config.top_n);

    debug!(
        universe = batch.len(),
        ranked = ranked.len(),
        excluded = scored.iter().filter(|s| !s.is_ranked_candidate()).count(),
        "ranking complete"
    );

    Ok(RankingReport {
        ranked,
        scored,
        diagnostics,
        config_hash,
        universe_size: batch.len(),
    })
}

//! Technical factor: four indicator-based sub-signals averaged into one score.
//!
//! - price vs SMA: relative distance of the close above/below each SMA
//! - EMA crossover: (EMA_fast - EMA_slow) / EMA_slow
//! - RSI: preference band peaking at healthy momentum (default 50-60)
//! - MACD: (line - signal) / close
//!
//! Sub-signals whose indicators are absent are dropped and the rest are
//! re-averaged with their configured weights.

use serde::{Deserialize, Serialize};

use super::{weighted_mean, FactorScore};
use crate::config::TechnicalParams;
use crate::error::ScoringIssue;
use crate::indicators::IndicatorSnapshot;

/// Internal weights of the four technical sub-signals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalWeights {
    pub price_vs_sma: f64,
    pub ema_crossover: f64,
    pub rsi: f64,
    pub macd: f64,
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self {
            price_vs_sma: 1.0,
            ema_crossover: 1.0,
            rsi: 1.0,
            macd: 1.0,
        }
    }
}

impl SignalWeights {
    pub fn validate(&self) -> Result<(), String> {
        let all = [self.price_vs_sma, self.ema_crossover, self.rsi, self.macd];
        if all.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err("technical signal weights must be finite and >= 0".into());
        }
        if all.iter().sum::<f64>() <= 0.0 {
            return Err("technical signal weights must not all be zero".into());
        }
        Ok(())
    }
}

/// Per-sub-signal scores in [0, 1]; `None` when the inputs were absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TechnicalBreakdown {
    pub price_vs_sma: Option<f64>,
    pub ema_crossover: Option<f64>,
    pub rsi: Option<f64>,
    pub macd: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalResult {
    pub score: FactorScore,
    pub breakdown: TechnicalBreakdown,
}

pub fn score_technical(snapshot: &IndicatorSnapshot, params: &TechnicalParams) -> TechnicalResult {
    let breakdown = TechnicalBreakdown {
        price_vs_sma: price_vs_sma(snapshot, params),
        ema_crossover: ema_crossover(snapshot, params),
        rsi: snapshot
            .rsi
            .value
            .map(|rsi| params.rsi_band.score(rsi))
            .filter(|v| v.is_finite()),
        macd: macd(snapshot, params),
    };

    let w = &params.signal_weights;
    let parts: Vec<(f64, f64)> = [
        (breakdown.price_vs_sma, w.price_vs_sma),
        (breakdown.ema_crossover, w.ema_crossover),
        (breakdown.rsi, w.rsi),
        (breakdown.macd, w.macd),
    ]
    .into_iter()
    .filter_map(|(value, weight)| value.map(|v| (v, weight)))
    .collect();

    let score = match weighted_mean(&parts) {
        Some(value) => FactorScore::from_value(value, "technical"),
        None => FactorScore::unavailable(shortest_gap(snapshot)),
    };

    TechnicalResult { score, breakdown }
}

fn price_vs_sma(snapshot: &IndicatorSnapshot, params: &TechnicalParams) -> Option<f64> {
    let close = snapshot.close?;
    let scores: Vec<(f64, f64)> = snapshot
        .sma
        .iter()
        .filter_map(|r| r.value)
        .map(|sma| (close - sma) / sma)
        .filter(|d| d.is_finite())
        .map(|d| (params.sma_mapping.apply(d), 1.0))
        .collect();
    weighted_mean(&scores)
}

fn ema_crossover(snapshot: &IndicatorSnapshot, params: &TechnicalParams) -> Option<f64> {
    let fast = snapshot.ema_fast.value?;
    let slow = snapshot.ema_slow.value?;
    let gap = (fast - slow) / slow;
    gap.is_finite().then(|| params.ema_mapping.apply(gap))
}

fn macd(snapshot: &IndicatorSnapshot, params: &TechnicalParams) -> Option<f64> {
    let line = snapshot.macd_line.value?;
    let signal = snapshot.macd_signal.value?;
    let close = snapshot.close?;
    let gap = (line - signal) / close;
    gap.is_finite().then(|| params.macd_mapping.apply(gap))
}

/// The absent indicator that needs the least history explains why nothing was scorable.
fn shortest_gap(snapshot: &IndicatorSnapshot) -> ScoringIssue {
    snapshot
        .readings()
        .filter(|r| r.value.is_none())
        .min_by_key(|r| r.required)
        .map(|r| ScoringIssue::insufficient(&r.name, r.required, snapshot.available_closes))
        .unwrap_or_else(|| ScoringIssue::non_finite("technical"))
}

//! Point-in-time indicator readings for one price series.

use serde::{Deserialize, Serialize};

use super::{Ema, Indicator, Macd, Rsi, Sma};
use crate::config::TechnicalParams;
use crate::domain::PriceSeries;
use crate::error::ScoringIssue;

/// Latest value of one indicator, `None` when the series is too short
/// (or the value came out non-finite).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub name: String,
    pub required: usize,
    pub value: Option<f64>,
}

impl Reading {
    fn last_of(name: &str, required: usize, series: &[f64]) -> Self {
        Self {
            name: name.to_string(),
            required,
            value: series.last().copied().filter(|v| v.is_finite()),
        }
    }
}

/// Indicators evaluated at the last bar of a series. Computed once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSnapshot {
    pub available_closes: usize,
    pub close: Option<f64>,
    pub sma: Vec<Reading>,
    pub ema_fast: Reading,
    pub ema_slow: Reading,
    pub rsi: Reading,
    pub macd_line: Reading,
    pub macd_signal: Reading,
}

impl IndicatorSnapshot {
    pub fn compute(series: &PriceSeries, params: &TechnicalParams) -> Self {
        let closes = series.closes();

        let sma = params
            .sma_periods
            .iter()
            .map(|&period| {
                let ind = Sma::new(period);
                Reading::last_of(ind.name(), ind.required_closes(), &ind.compute(closes))
            })
            .collect();

        let ema_fast = Ema::new(params.ema_fast);
        let ema_slow = Ema::new(params.ema_slow);
        let rsi = Rsi::new(params.rsi_period, params.rsi_method);
        let macd = Macd::new(params.ema_fast, params.ema_slow, params.macd_signal);
        let (line, signal) = macd.compute_lines(closes);

        Self {
            available_closes: closes.len(),
            close: series.last_close(),
            sma,
            ema_fast: Reading::last_of(
                ema_fast.name(),
                ema_fast.required_closes(),
                &ema_fast.compute(closes),
            ),
            ema_slow: Reading::last_of(
                ema_slow.name(),
                ema_slow.required_closes(),
                &ema_slow.compute(closes),
            ),
            rsi: Reading::last_of(rsi.name(), rsi.required_closes(), &rsi.compute(closes)),
            macd_line: Reading::last_of("macd_line", macd.required_closes(), &line),
            macd_signal: Reading::last_of("macd_signal", macd.signal_required_closes(), &signal),
        }
    }

    /// Latest SMA for a configured period.
    pub fn sma(&self, period: usize) -> Option<f64> {
        let name = format!("sma_{period}");
        self.sma.iter().find(|r| r.name == name).and_then(|r| r.value)
    }

    pub fn readings(&self) -> impl Iterator<Item = &Reading> {
        self.sma.iter().chain([
            &self.ema_fast,
            &self.ema_slow,
            &self.rsi,
            &self.macd_line,
            &self.macd_signal,
        ])
    }

    /// One issue per absent reading.
    pub fn gaps(&self) -> Vec<ScoringIssue> {
        self.readings()
            .filter(|r| r.value.is_none())
            .map(|r| {
                if self.available_closes < r.required {
                    ScoringIssue::insufficient(&r.name, r.required, self.available_closes)
                } else {
                    ScoringIssue::non_finite(&r.name)
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PriceBar;
    use chrono::NaiveDate;

    fn series(closes: &[f64]) -> PriceSeries {
        let base = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| PriceBar {
                date: base + chrono::Duration::days(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 0,
            })
            .collect();
        PriceSeries::new("TEST", bars).unwrap()
    }

    #[test]
    fn short_series_marks_long_indicators_absent() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let snap = IndicatorSnapshot::compute(&series(&closes), &TechnicalParams::default());

        assert!(snap.sma(20).is_some());
        assert_eq!(snap.sma(50), None);
        assert_eq!(snap.sma(200), None);
        assert!(snap.ema_fast.value.is_some());
        assert!(snap.ema_slow.value.is_some());
        assert_eq!(snap.rsi.value, Some(100.0));
        assert!(snap.macd_line.value.is_some());
        assert!(snap.macd_signal.value.is_some());

        let gaps = snap.gaps();
        assert_eq!(gaps.len(), 2);
        assert!(gaps.contains(&ScoringIssue::insufficient("sma_200", 200, 40)));
    }

    #[test]
    fn empty_series_has_everything_absent() {
        let snap = IndicatorSnapshot::compute(&series(&[]), &TechnicalParams::default());
        assert_eq!(snap.close, None);
        assert!(snap.readings().all(|r| r.value.is_none()));
        assert_eq!(snap.gaps().len(), 8);
    }

    #[test]
    fn snapshot_is_deterministic() {
        let closes: Vec<f64> = (0..250).map(|i| 100.0 + (i as f64 * 0.3).sin() * 5.0).collect();
        let s = series(&closes);
        let params = TechnicalParams::default();
        assert_eq!(IndicatorSnapshot::compute(&s, &params), IndicatorSnapshot::compute(&s, &params));
    }
}

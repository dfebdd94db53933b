//! Moving Average Convergence Divergence (MACD).
//!
//! line[t]   = EMA_fast[t] - EMA_slow[t]
//! signal[t] = EMA_signal of the defined part of the line
//! Required closes: slow for the line, slow + signal - 1 for the signal line.

use super::ema::ema_of_series;
use super::Indicator;

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    name: String,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        assert!(fast >= 1 && signal >= 1, "MACD periods must be >= 1");
        assert!(fast < slow, "MACD fast period must be shorter than slow period");
        Self {
            fast,
            slow,
            signal,
            name: format!("macd_{fast}_{slow}_{signal}"),
        }
    }

    /// Closes needed before the signal line has its first value.
    pub fn signal_required_closes(&self) -> usize {
        self.slow.saturating_add(self.signal - 1)
    }

    /// Compute the MACD line and its signal line.
    pub fn compute_lines(&self, closes: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let line = self.compute(closes);
        let mut signal = vec![f64::NAN; closes.len()];

        // The line's warmup region is NaN; the signal EMA starts where the line does.
        if let Some(start) = line.iter().position(|v| !v.is_nan()) {
            let tail = ema_of_series(&line[start..], self.signal);
            signal[start..].copy_from_slice(&tail);
        }

        (line, signal)
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn required_closes(&self) -> usize {
        self.slow
    }

    fn compute(&self, closes: &[f64]) -> Vec<f64> {
        let fast = ema_of_series(closes, self.fast);
        let slow = ema_of_series(closes, self.slow);
        fast.iter().zip(&slow).map(|(f, s)| f - s).collect()
    }
}

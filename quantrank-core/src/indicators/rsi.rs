//! Relative Strength Index (RSI).
//!
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss), over `period` close-to-close changes.
//! Required closes: period + 1.
//! Edge cases: avg_loss == 0 → 100; avg_gain == 0 → 0; both zero → 50.
//!
//! Two averaging methods:
//! - `Simple`: plain mean of gains and losses over the last `period` changes.
//!   A window with no losing period is exactly 100.
//! - `Wilder`: seed with the simple mean, then smooth with alpha = 1/period.

use serde::{Deserialize, Serialize};

use super::Indicator;

/// How average gain and loss are formed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RsiMethod {
    #[default]
    Simple,
    Wilder,
}

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    method: RsiMethod,
    name: String,
}

impl Rsi {
    pub fn new(period: usize, method: RsiMethod) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            method,
            name: format!("rsi_{period}"),
        }
    }

    fn changes(closes: &[f64]) -> Vec<f64> {
        let mut changes = vec![f64::NAN; closes.len()];
        for i in 1..closes.len() {
            changes[i] = closes[i] - closes[i - 1];
        }
        changes
    }

    fn compute_simple(&self, changes: &[f64], result: &mut [f64]) {
        let n = changes.len();
        for i in self.period..n {
            let window = &changes[(i + 1 - self.period)..=i];
            if window.iter().any(|c| c.is_nan()) {
                continue;
            }
            let (gain, loss) = split_gain_loss(window);
            result[i] = compute_rsi(gain / self.period as f64, loss / self.period as f64);
        }
    }

    fn compute_wilder(&self, changes: &[f64], result: &mut [f64]) {
        let n = changes.len();
        let seed = &changes[1..=self.period];
        if seed.iter().any(|c| c.is_nan()) {
            return;
        }
        let (gain, loss) = split_gain_loss(seed);
        let mut avg_gain = gain / self.period as f64;
        let mut avg_loss = loss / self.period as f64;
        result[self.period] = compute_rsi(avg_gain, avg_loss);

        let alpha = 1.0 / self.period as f64;
        for i in (self.period + 1)..n {
            let ch = changes[i];
            if ch.is_nan() {
                for val in result.iter_mut().skip(i) {
                    *val = f64::NAN;
                }
                return;
            }
            let gain = ch.max(0.0);
            let loss = (-ch).max(0.0);
            avg_gain = alpha * gain + (1.0 - alpha) * avg_gain;
            avg_loss = alpha * loss + (1.0 - alpha) * avg_loss;
            result[i] = compute_rsi(avg_gain, avg_loss);
        }
    }
}

impl Indicator for Rsi {
    fn name(&self) -> &str {
        &self.name
    }

    fn required_closes(&self) -> usize {
        self.period.saturating_add(1)
    }

    fn compute(&self, closes: &[f64]) -> Vec<f64> {
        let n = closes.len();
        let mut result = vec![f64::NAN; n];

        if n <= self.period {
            return result;
        }

        let changes = Self::changes(closes);
        match self.method {
            RsiMethod::Simple => self.compute_simple(&changes, &mut result),
            RsiMethod::Wilder => self.compute_wilder(&changes, &mut result),
        }
        result
    }
}

/// Sum of gains and sum of losses (as a positive number) over a window.
fn split_gain_loss(changes: &[f64]) -> (f64, f64) {
    changes.iter().fold((0.0, 0.0), |(gain, loss), &ch| {
        if ch > 0.0 {
            (gain + ch, loss)
        } else {
            (gain, loss - ch)
        }
    })
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0 // no movement
    } else if avg_loss == 0.0 {
        100.0
    } else if avg_gain == 0.0 {
        0.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_approx;

    #[test]
    fn rsi_all_gains_is_100() {
        let closes: Vec<f64> = (0..15).map(|i| 100.0 + i as f64).collect();
        for method in [RsiMethod::Simple, RsiMethod::Wilder] {
            let result = Rsi::new(14, method).compute(&closes);
            assert_eq!(result[14], 100.0);
        }
    }

    #[test]
    fn rsi_all_losses_is_0() {
        let result = Rsi::new(3, RsiMethod::Simple).compute(&[105.0, 104.0, 103.0, 102.0, 101.0]);
        assert_approx(result[3], 0.0, 1e-9);
        assert_approx(result[4], 0.0, 1e-9);
    }

    #[test]
    fn rsi_flat_is_50() {
        let result = Rsi::new(3, RsiMethod::Simple).compute(&[100.0; 6]);
        assert_eq!(result[5], 50.0);
    }

    #[test]
    fn rsi_simple_known_value() {
        // Changes: +0.34, -0.25, -0.48 → gain 0.34, loss 0.73
        // RSI = 100 - 100 / (1 + 0.34/0.73)
        let result = Rsi::new(3, RsiMethod::Simple).compute(&[44.0, 44.34, 44.09, 43.61]);
        let expected = 100.0 - 100.0 / (1.0 + 0.34 / 0.73);
        assert_approx(result[3], expected, 1e-9);
    }

    #[test]
    fn rsi_simple_forgets_losses_outside_window() {
        // One early loss, then a 3-period run of gains
        let closes = [100.0, 90.0, 91.0, 92.0, 93.0];
        let simple = Rsi::new(3, RsiMethod::Simple).compute(&closes);
        let wilder = Rsi::new(3, RsiMethod::Wilder).compute(&closes);
        assert_eq!(simple[4], 100.0);
        assert!(wilder[4] < 100.0);
    }

    #[test]
    fn rsi_bounds() {
        let closes = [100.0, 105.0, 98.0, 110.0, 95.0, 115.0, 90.0, 120.0];
        for method in [RsiMethod::Simple, RsiMethod::Wilder] {
            for (i, &v) in Rsi::new(3, method).compute(&closes).iter().enumerate() {
                if !v.is_nan() {
                    assert!((0.0..=100.0).contains(&v), "RSI out of bounds at {i}: {v}");
                }
            }
        }
    }

    #[test]
    fn rsi_too_short_is_all_nan() {
        let closes: Vec<f64> = (0..14).map(|i| 100.0 + i as f64).collect();
        let result = Rsi::new(14, RsiMethod::Simple).compute(&closes);
        assert!(result.iter().all(|v| v.is_nan()));
        assert_eq!(Rsi::new(14, RsiMethod::Simple).required_closes(), 15);
    }
}

//! Indicator library.
//!
//! Indicators are pure functions: a close-price series in, a numeric series of
//! the same length out. The warmup region (not enough history yet) is `NaN`,
//! never zero. `IndicatorSnapshot` reads the last value of each series and
//! turns `NaN` into `None`, so absence stays distinct from a neutral value.

pub mod ema;
pub mod macd;
pub mod rsi;
pub mod sma;
pub mod snapshot;

pub use ema::{ema_of_series, Ema};
pub use macd::Macd;
pub use rsi::{Rsi, RsiMethod};
pub use sma::Sma;
pub use snapshot::{IndicatorSnapshot, Reading};

/// Trait for close-price indicators.
///
/// # Look-ahead guard
/// No output value at index t may depend on closes after t.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "sma_20", "rsi_14").
    fn name(&self) -> &str;

    /// Number of closes needed before the first valid output.
    fn required_closes(&self) -> usize;

    /// Compute the indicator over the entire series.
    ///
    /// Returns a `Vec<f64>` of the same length as `closes`; values before
    /// `required_closes() - 1` are `NaN`.
    fn compute(&self, closes: &[f64]) -> Vec<f64>;
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

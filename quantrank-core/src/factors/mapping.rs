//! Monotonic maps from an unbounded raw signal into [0, 1].

use serde::{Deserialize, Serialize};

/// How a raw signal (a return, a relative gap) becomes a score in [0, 1].
///
/// Both variants map 0 to 0.5 and are non-decreasing in the input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Mapping {
    /// Clamp to [-cap, +cap], then rescale linearly.
    Clamped { cap: f64 },
    /// `1 / (1 + e^(-x / scale))`; strictly increasing, never saturates early.
    Logistic { scale: f64 },
}

impl Mapping {
    pub fn apply(&self, x: f64) -> f64 {
        match *self {
            Mapping::Clamped { cap } => (x.clamp(-cap, cap) + cap) / (2.0 * cap),
            Mapping::Logistic { scale } => 1.0 / (1.0 + (-x / scale).exp()),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let (name, param) = match *self {
            Mapping::Clamped { cap } => ("cap", cap),
            Mapping::Logistic { scale } => ("scale", scale),
        };
        if !param.is_finite() || param <= 0.0 {
            return Err(format!("mapping {name} must be finite and > 0, got {param}"));
        }
        Ok(())
    }
}

//! Preference bands: trapezoidal scoring around an ideal range.
//!
//! ```text
//!  1 |        ________
//!    |       /        \
//!  0 |______/          \______
//!       low-tol low  high  high+tol
//! ```

use serde::{Deserialize, Serialize};

/// Score 1 inside `[ideal_low, ideal_high]`, decaying linearly to 0 over the
/// tolerance on each side.
///
/// `ideal_high = None` leaves the band open above, which turns it into a
/// "higher is better" threshold mapping. A zero tolerance is a hard edge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreferenceBand {
    pub ideal_low: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ideal_high: Option<f64>,
    pub lower_tolerance: f64,
    #[serde(default)]
    pub upper_tolerance: f64,
}

impl PreferenceBand {
    pub fn new(ideal_low: f64, ideal_high: f64, lower_tolerance: f64, upper_tolerance: f64) -> Self {
        Self {
            ideal_low,
            ideal_high: Some(ideal_high),
            lower_tolerance,
            upper_tolerance,
        }
    }

    /// Open-ended band: everything at or above `ideal_low` scores 1.
    pub fn at_least(ideal_low: f64, lower_tolerance: f64) -> Self {
        Self {
            ideal_low,
            ideal_high: None,
            lower_tolerance,
            upper_tolerance: 0.0,
        }
    }

    pub fn score(&self, x: f64) -> f64 {
        if x < self.ideal_low {
            return decay(self.ideal_low - x, self.lower_tolerance);
        }
        match self.ideal_high {
            Some(high) if x > high => decay(x - high, self.upper_tolerance),
            _ => 1.0,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let finite = self.ideal_low.is_finite()
            && self.ideal_high.map_or(true, f64::is_finite)
            && self.lower_tolerance.is_finite()
            && self.upper_tolerance.is_finite();
        if !finite {
            return Err("band parameters must be finite".into());
        }
        if self.lower_tolerance < 0.0 || self.upper_tolerance < 0.0 {
            return Err("band tolerances must be >= 0".into());
        }
        if let Some(high) = self.ideal_high {
            if high < self.ideal_low {
                return Err(format!(
                    "band ideal_high ({high}) is below ideal_low ({})",
                    self.ideal_low
                ));
            }
        }
        Ok(())
    }
}

fn decay(distance: f64, tolerance: f64) -> f64 {
    if tolerance <= 0.0 {
        return 0.0;
    }
    (1.0 - distance / tolerance).max(0.0)
}

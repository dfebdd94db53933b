//! Scoring configuration: factor weights, windows, mappings and bands.
//!
//! Every field has a default, so a partial TOML file only overrides what it
//! names. `validate` runs before any ticker is scored.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::factors::{FundamentalBands, Mapping, PreferenceBand, SignalWeights};
use crate::indicators::RsiMethod;

/// Tolerance on the weight sum.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Longest window or indicator period accepted, in bars (about 40 years of sessions).
pub const MAX_PERIOD: usize = 10_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(String),

    #[error("{0}")]
    Invalid(String),
}

/// Composite weights of the three factors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub momentum: f64,
    pub technical: f64,
    pub fundamental: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            momentum: 0.40,
            technical: 0.35,
            fundamental: 0.25,
        }
    }
}

impl Weights {
    pub fn new(momentum: f64, technical: f64, fundamental: f64) -> Self {
        Self {
            momentum,
            technical,
            fundamental,
        }
    }

    pub fn sum(&self) -> f64 {
        self.momentum + self.technical + self.fundamental
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, w) in [
            ("momentum", self.momentum),
            ("technical", self.technical),
            ("fundamental", self.fundamental),
        ] {
            if !w.is_finite() || w < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "weight '{name}' must be finite and non-negative, got {w}"
                )));
            }
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::Invalid(format!(
                "weights must sum to 1.0, got {sum}"
            )));
        }
        Ok(())
    }

    /// Rescales to sum to one. Fails on negative, non-finite or all-zero input.
    pub fn normalized(&self) -> Result<Self, ConfigError> {
        let parts = [self.momentum, self.technical, self.fundamental];
        if parts.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(ConfigError::Invalid(
                "weights must be finite and non-negative".into(),
            ));
        }
        let sum = self.sum();
        if sum <= 0.0 {
            return Err(ConfigError::Invalid("weights sum to zero".into()));
        }
        Ok(Self::new(
            self.momentum / sum,
            self.technical / sum,
            self.fundamental / sum,
        ))
    }
}

/// Indicator periods and sub-signal mappings for the technical factor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TechnicalParams {
    pub sma_periods: Vec<usize>,
    pub ema_fast: usize,
    pub ema_slow: usize,
    pub macd_signal: usize,
    pub rsi_period: usize,
    pub rsi_method: RsiMethod,
    pub rsi_band: PreferenceBand,
    pub sma_mapping: Mapping,
    pub ema_mapping: Mapping,
    pub macd_mapping: Mapping,
    pub signal_weights: SignalWeights,
}

impl Default for TechnicalParams {
    fn default() -> Self {
        Self {
            sma_periods: vec![20, 50, 200],
            ema_fast: 12,
            ema_slow: 26,
            macd_signal: 9,
            rsi_period: 14,
            rsi_method: RsiMethod::Simple,
            rsi_band: PreferenceBand::new(50.0, 60.0, 25.0, 25.0),
            sma_mapping: Mapping::Clamped { cap: 0.10 },
            ema_mapping: Mapping::Clamped { cap: 0.05 },
            macd_mapping: Mapping::Clamped { cap: 0.01 },
            signal_weights: SignalWeights::default(),
        }
    }
}

impl TechnicalParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));
        if self.sma_periods.is_empty() {
            return invalid("technical.sma_periods must not be empty".into());
        }
        if self.sma_periods.iter().any(|p| *p == 0) {
            return invalid("technical.sma_periods must be positive".into());
        }
        let mut seen = std::collections::BTreeSet::new();
        if let Some(dup) = self.sma_periods.iter().find(|p| !seen.insert(**p)) {
            return invalid(format!("technical.sma_periods lists {dup} more than once"));
        }
        if self.ema_fast == 0 || self.ema_slow == 0 || self.macd_signal == 0 {
            return invalid("technical EMA/MACD periods must be positive".into());
        }
        let longest = self
            .sma_periods
            .iter()
            .chain([&self.ema_slow, &self.macd_signal, &self.rsi_period])
            .max()
            .copied()
            .unwrap_or(0);
        if longest > MAX_PERIOD {
            return invalid(format!(
                "technical period {longest} exceeds the maximum of {MAX_PERIOD}"
            ));
        }
        if self.ema_fast >= self.ema_slow {
            return invalid(format!(
                "technical.ema_fast ({}) must be below ema_slow ({})",
                self.ema_fast, self.ema_slow
            ));
        }
        if self.rsi_period == 0 {
            return invalid("technical.rsi_period must be positive".into());
        }
        self.rsi_band
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("technical.rsi_band: {e}")))?;
        for (name, mapping) in [
            ("sma_mapping", &self.sma_mapping),
            ("ema_mapping", &self.ema_mapping),
            ("macd_mapping", &self.macd_mapping),
        ] {
            mapping
                .validate()
                .map_err(|e| ConfigError::Invalid(format!("technical.{name}: {e}")))?;
        }
        self.signal_weights
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("technical.signal_weights: {e}")))
    }
}

/// Full scoring configuration for one ranking run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Look-back window (in bars) of the momentum factor.
    pub momentum_window: usize,
    pub momentum_mapping: Mapping,
    pub weights: Weights,
    pub top_n: usize,
    pub technical: TechnicalParams,
    pub fundamental_bands: FundamentalBands,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            momentum_window: 30,
            momentum_mapping: Mapping::Logistic { scale: 0.10 },
            weights: Weights::default(),
            top_n: 5,
            technical: TechnicalParams::default(),
            fundamental_bands: FundamentalBands::default(),
        }
    }
}

impl ScoringConfig {
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.momentum_window == 0 {
            return Err(ConfigError::Invalid("momentum_window must be positive".into()));
        }
        if self.momentum_window > MAX_PERIOD {
            return Err(ConfigError::Invalid(format!(
                "momentum_window {} exceeds the maximum of {MAX_PERIOD}",
                self.momentum_window
            )));
        }
        if self.top_n == 0 {
            return Err(ConfigError::Invalid("top_n must be at least 1".into()));
        }
        self.momentum_mapping
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("momentum_mapping: {e}")))?;
        self.weights.validate()?;
        self.technical.validate()?;
        self.fundamental_bands
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("fundamental_bands: {e}")))
    }

    /// Content hash of the configuration, stable across runs.
    pub fn config_hash(&self) -> Result<String, ConfigError> {
        let json = serde_json::to_string(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}

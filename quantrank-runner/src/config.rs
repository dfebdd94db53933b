//! Serializable run configuration: universe, data source, scoring.
//!
//! ```toml
//! [universe]
//! market = "UK"            # or an explicit list:
//! # tickers = ["AZN.L", "VOD.L"]
//!
//! [data]
//! provider = "yahoo"       # yahoo | alpha_vantage | csv | synthetic
//! lookback_days = 365
//! request_delay_ms = 500
//!
//! [scoring]
//! top_n = 10
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use quantrank_core::{ConfigError, ScoringConfig};

use crate::markets::Market;

/// Content hash of a run configuration.
pub type RunId = String;

/// Which tickers to rank. Explicit tickers win over a market.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UniverseConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market: Option<Market>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tickers: Vec<String>,
}

impl UniverseConfig {
    /// Explicit tickers (deduplicated, order kept), else the market list,
    /// else the UK list.
    pub fn resolve(&self) -> Vec<String> {
        if self.tickers.is_empty() {
            return self.market.unwrap_or(Market::Uk).tickers();
        }
        let mut seen = std::collections::HashSet::new();
        self.tickers
            .iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty() && seen.insert(t.clone()))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    #[default]
    Yahoo,
    AlphaVantage,
    Csv,
    Synthetic,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ProviderKind::Yahoo => "yahoo",
            ProviderKind::AlphaVantage => "alpha_vantage",
            ProviderKind::Csv => "csv",
            ProviderKind::Synthetic => "synthetic",
        })
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yahoo" => Ok(ProviderKind::Yahoo),
            "alpha_vantage" | "alpha-vantage" | "alphavantage" => Ok(ProviderKind::AlphaVantage),
            "csv" => Ok(ProviderKind::Csv),
            "synthetic" => Ok(ProviderKind::Synthetic),
            other => Err(format!("unknown provider '{other}' (expected yahoo, alpha_vantage, csv or synthetic)")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub provider: ProviderKind,
    /// Calendar days of history to request, ending at the as-of date.
    pub lookback_days: u32,
    /// Pause between consecutive provider calls.
    pub request_delay_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csv_dir: Option<PathBuf>,
    /// Alpha Vantage key; `ALPHA_VANTAGE_API_KEY` when unset. Never written
    /// back out, so it stays out of saved configs and the run id.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Yahoo,
            lookback_days: 365,
            request_delay_ms: 500,
            csv_dir: None,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub universe: UniverseConfig,
    pub data: DataConfig,
    pub scoring: ScoringConfig,
}

impl RunConfig {
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
        self.scoring.validate()?;
        if self.data.lookback_days == 0 {
            return Err(ConfigError::Invalid("data.lookback_days must be positive".into()));
        }
        if self.data.provider == ProviderKind::Csv && self.data.csv_dir.is_none() {
            return Err(ConfigError::Invalid(
                "data.csv_dir is required for the csv provider".into(),
            ));
        }
        if self.universe.resolve().is_empty() {
            return Err(ConfigError::Invalid("universe resolves to no tickers".into()));
        }
        Ok(())
    }

    /// Deterministic hash of the whole run configuration.
    pub fn run_id(&self) -> Result<RunId, ConfigError> {
        let json = serde_json::to_string(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;
        Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_run_config_is_valid_uk_yahoo() {
        let config = RunConfig::default();
        config.validate().unwrap();
        assert_eq!(config.data.provider, ProviderKind::Yahoo);
        assert_eq!(config.universe.resolve().len(), 50);
    }

    #[test]
    fn explicit_tickers_win_over_market() {
        let universe = UniverseConfig {
            market: Some(Market::My),
            tickers: vec!["VOD.L".into(), " AZN.L ".into(), "VOD.L".into(), "".into()],
        };
        assert_eq!(universe.resolve(), vec!["VOD.L", "AZN.L"]);
    }

    #[test]
    fn parses_toml_with_nested_scoring() {
        let config = RunConfig::from_toml(
            r#"
            [universe]
            market = "MY"

            [data]
            provider = "csv"
            csv_dir = "/data/prices"
            request_delay_ms = 0

            [scoring]
            top_n = 10

            [scoring.weights]
            momentum = 0.5
            technical = 0.25
            fundamental = 0.25
            "#,
        )
        .unwrap();
        assert_eq!(config.universe.market, Some(Market::My));
        assert_eq!(config.data.provider, ProviderKind::Csv);
        assert_eq!(config.data.lookback_days, 365);
        assert_eq!(config.scoring.top_n, 10);
        assert_eq!(config.scoring.weights.momentum, 0.5);
        config.validate().unwrap();
    }

    #[test]
    fn alpha_vantage_key_is_read_but_never_written() {
        let config = RunConfig::from_toml(
            r#"
            [data]
            provider = "alpha_vantage"
            api_key = "secret-key"
            "#,
        )
        .unwrap();
        assert_eq!(config.data.provider, ProviderKind::AlphaVantage);
        assert_eq!(config.data.api_key.as_deref(), Some("secret-key"));
        assert!(!config.to_toml().unwrap().contains("secret-key"));

        let mut keyless = config.clone();
        keyless.data.api_key = None;
        assert_eq!(config.run_id().unwrap(), keyless.run_id().unwrap());
        assert_eq!("alpha-vantage".parse::<ProviderKind>().unwrap(), ProviderKind::AlphaVantage);
    }

    #[test]
    fn csv_provider_requires_dir() {
        let mut config = RunConfig::default();
        config.data.provider = ProviderKind::Csv;
        assert!(config.validate().is_err());
    }

    #[test]
    fn run_id_deterministic_and_sensitive() {
        let a = RunConfig::default();
        let mut b = RunConfig::default();
        assert_eq!(a.run_id().unwrap(), b.run_id().unwrap());
        b.scoring.top_n = 7;
        assert_ne!(a.run_id().unwrap(), b.run_id().unwrap());
    }

    #[test]
    fn toml_roundtrip() {
        let mut config = RunConfig::default();
        config.universe.tickers = vec!["AZN.L".into()];
        let text = config.to_toml().unwrap();
        assert_eq!(RunConfig::from_toml(&text).unwrap(), config);
    }

    proptest::proptest! {
        #[test]
        fn resolved_tickers_are_unique_and_trimmed(
            tickers in proptest::collection::vec("[ A-Z]{0,5}", 1..20)
        ) {
            let universe = UniverseConfig { market: None, tickers };
            let resolved = universe.resolve();
            let unique: std::collections::HashSet<_> = resolved.iter().collect();
            proptest::prop_assert_eq!(unique.len(), resolved.len());
            for t in &resolved {
                proptest::prop_assert!(!t.is_empty());
                proptest::prop_assert_eq!(t.trim(), t.as_str());
            }
        }
    }
}

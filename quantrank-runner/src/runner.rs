//! Ranking runner: wires provider, loader, and the core `rank` entry point.
//!
//! - `build_provider()`: concrete provider for a `DataConfig`
//! - `run_ranking()`: resolve universe, load, score, and package a `RankRun`

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use quantrank_core::data::{
    AlphaVantageProvider, CircuitBreaker, CsvProvider, DataError, DataProvider, LogProgress, SyntheticProvider,
    YahooProvider,
};
use quantrank_core::{rank, ConfigError, RankError, RankingReport};

use crate::config::{DataConfig, ProviderKind, RunConfig, RunId};
use crate::data_loader::{load_universe, LoadError, LoadOptions};
use crate::markets::Market;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Load(#[from] LoadError),
    #[error("provider error: {0}")]
    Provider(#[from] DataError),
    #[error("ranking error: {0}")]
    Rank(#[from] RankError),
    #[error("no data returned for any of the {attempted} tickers")]
    NoData { attempted: usize },
}

/// Current schema version for persisted runs.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchFailure {
    pub ticker: String,
    pub error: String,
}

/// Complete result of one ranking run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankRun {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub generated_at: NaiveDateTime,
    pub as_of: NaiveDate,
    pub start_date: NaiveDate,
    pub provider: String,
    pub market: Option<Market>,
    pub tickers_requested: usize,
    pub report: RankingReport,
    /// Tickers the provider could not deliver; never scored.
    pub fetch_failures: Vec<FetchFailure>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

pub fn build_provider(data: &DataConfig) -> Result<Box<dyn DataProvider>, RunError> {
    let provider: Box<dyn DataProvider> = match data.provider {
        ProviderKind::Yahoo => Box::new(YahooProvider::new(Arc::new(CircuitBreaker::default_provider()))?),
        ProviderKind::AlphaVantage => Box::new(AlphaVantageProvider::new(
            data.api_key.clone(),
            Arc::new(CircuitBreaker::default_provider()),
        )?),
        ProviderKind::Csv => {
            let dir = data.csv_dir.clone().ok_or_else(|| {
                ConfigError::Invalid("data.csv_dir is required for the csv provider".into())
            })?;
            Box::new(CsvProvider::new(dir))
        }
        ProviderKind::Synthetic => Box::new(SyntheticProvider::new()),
    };
    Ok(provider)
}

/// Load the configured universe through `provider` and rank it as of `as_of`.
///
/// Fetch failures are carried on the result. Fails only on bad config, an
/// unusable provider, or when no ticker could be fetched at all.
pub fn run_ranking(
    config: &RunConfig,
    provider: &dyn DataProvider,
    as_of: NaiveDate,
) -> Result<RankRun, RunError> {
    config.validate()?;
    let tickers = config.universe.resolve();
    let start = as_of - Duration::days(i64::from(config.data.lookback_days));
    let opts = LoadOptions {
        start,
        end: as_of,
        request_delay: std::time::Duration::from_millis(config.data.request_delay_ms),
    };

    info!(
        provider = provider.name(),
        tickers = tickers.len(),
        %start,
        end = %as_of,
        "loading universe"
    );
    let loaded = load_universe(&tickers, provider, &opts, Some(&LogProgress))?;
    if loaded.data.is_empty() {
        return Err(RunError::NoData {
            attempted: loaded.attempted(),
        });
    }
    for (ticker, error) in &loaded.failures {
        warn!(ticker = %ticker, error = %error, "excluded: no data");
    }

    let report = rank(&loaded.data, &config.scoring)?;
    info!(
        scored = report.scored.len(),
        ranked = report.ranked.len(),
        excluded = report.excluded().count(),
        "ranking complete"
    );

    Ok(RankRun {
        schema_version: SCHEMA_VERSION,
        run_id: config.run_id()?,
        generated_at: chrono::Local::now().naive_local(),
        as_of,
        start_date: start,
        provider: provider.name().to_string(),
        market: if config.universe.tickers.is_empty() {
            Some(config.universe.market.unwrap_or(Market::Uk))
        } else {
            None
        },
        tickers_requested: tickers.len(),
        report,
        fetch_failures: loaded
            .failures
            .into_iter()
            .map(|(ticker, e)| FetchFailure {
                ticker,
                error: e.to_string(),
            })
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UniverseConfig;
    use quantrank_core::TickerData;

    fn synthetic_config(tickers: &[&str]) -> RunConfig {
        let mut config = RunConfig::default();
        config.universe = UniverseConfig {
            market: None,
            tickers: tickers.iter().map(|t| t.to_string()).collect(),
        };
        config.data.provider = ProviderKind::Synthetic;
        config.data.request_delay_ms = 0;
        config.scoring.top_n = 3;
        config
    }

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 28).unwrap()
    }

    struct NothingProvider;

    impl DataProvider for NothingProvider {
        fn name(&self) -> &str {
            "nothing"
        }

        fn fetch(&self, ticker: &str, _start: NaiveDate, _end: NaiveDate) -> Result<TickerData, DataError> {
            Err(DataError::SymbolNotFound {
                symbol: ticker.to_string(),
            })
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    #[test]
    fn synthetic_run_ranks_top_n() {
        let config = synthetic_config(&["AZN.L", "VOD.L", "BP.L", "TSCO.L", "BARC.L"]);
        let provider = build_provider(&config.data).unwrap();
        let run = run_ranking(&config, provider.as_ref(), as_of()).unwrap();
        assert_eq!(run.report.ranked.len(), 3);
        assert_eq!(run.tickers_requested, 5);
        assert_eq!(run.provider, "synthetic");
        assert!(run.fetch_failures.is_empty());
        assert_eq!(run.start_date, NaiveDate::from_ymd_opt(2023, 6, 29).unwrap());
        assert!(run.market.is_none());
    }

    #[test]
    fn provider_returning_nothing_is_no_data() {
        let config = synthetic_config(&["A", "B"]);
        let err = run_ranking(&config, &NothingProvider, as_of()).unwrap_err();
        assert!(matches!(err, RunError::NoData { attempted: 2 }));
    }

    #[test]
    fn invalid_scoring_config_fails_before_fetching() {
        let mut config = synthetic_config(&["A"]);
        config.scoring.weights.momentum = 0.9;
        let err = run_ranking(&config, &NothingProvider, as_of()).unwrap_err();
        assert!(matches!(err, RunError::Config(_)));
    }

    #[test]
    fn csv_provider_needs_dir() {
        let data = DataConfig {
            provider: ProviderKind::Csv,
            ..DataConfig::default()
        };
        assert!(matches!(build_provider(&data), Err(RunError::Config(_))));
    }

    #[test]
    fn alpha_vantage_provider_uses_configured_key() {
        let data = DataConfig {
            provider: ProviderKind::AlphaVantage,
            api_key: Some("demo".into()),
            ..DataConfig::default()
        };
        let provider = build_provider(&data).unwrap();
        assert_eq!(provider.name(), "alpha_vantage");
        assert!(provider.is_available());
    }
}

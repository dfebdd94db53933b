//! QuantRank Core: the stock scoring and ranking engine.
//!
//! - Domain types (price bars, validated series, fundamental snapshots)
//! - Indicator library (SMA, EMA, RSI, MACD) and the per-ticker snapshot
//! - Factor families: momentum, technical, fundamental
//! - Composite scorer with weight renormalization
//! - Deterministic top-N ranker and the parallel `rank` entry point
//! - Data providers feeding the engine (Yahoo Finance, CSV, synthetic)

pub mod composite;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod factors;
pub mod indicators;
pub mod pipeline;
pub mod ranker;

pub use composite::{combine, CompositeScore, EffectiveWeights};
pub use config::{ConfigError, ScoringConfig, TechnicalParams, Weights};
pub use domain::{FundamentalMetric, FundamentalSnapshot, PriceBar, PriceSeries, TickerData};
pub use error::{RankError, ScoringIssue, TickerDiagnostic};
pub use factors::FactorScore;
pub use pipeline::{rank, score_ticker, RankingReport, ScoredTicker};
pub use ranker::{RankedEntry, RankedResult};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything crossing the rayon boundary is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        require_send::<TickerData>();
        require_sync::<TickerData>();
        require_send::<ScoringConfig>();
        require_sync::<ScoringConfig>();
        require_send::<ScoredTicker>();
        require_sync::<ScoredTicker>();
        require_send::<RankingReport>();
        require_sync::<RankingReport>();
        require_send::<indicators::IndicatorSnapshot>();
        require_sync::<indicators::IndicatorSnapshot>();

        require_send::<data::YahooProvider>();
        require_sync::<data::YahooProvider>();
        require_send::<data::CsvProvider>();
        require_sync::<data::CsvProvider>();
    }
}

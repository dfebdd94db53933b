//! QuantRank Runner: ranking orchestration on top of `quantrank-core`.
//!
//! - Market universes (LSE top 50, FTSE Bursa Malaysia Top 100)
//! - Run configuration loaded from TOML
//! - Sequential, rate-friendly batch loading with per-ticker failure isolation
//! - Ranking runs packaged with provenance
//! - JSON / CSV / Markdown export
//! - Logging initialization

pub mod config;
pub mod data_loader;
pub mod export;
pub mod logging;
pub mod markets;
pub mod runner;

pub use config::{DataConfig, ProviderKind, RunConfig, RunId, UniverseConfig};
pub use data_loader::{load_universe, LoadError, LoadOptions, LoadedUniverse};
pub use logging::{init_logging, LogFormat};
pub use markets::Market;
pub use runner::{build_provider, run_ranking, FetchFailure, RankRun, RunError, SCHEMA_VERSION};

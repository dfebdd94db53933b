//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over data sources (Yahoo Finance, CSV
//! directory, synthetic) so the runner can swap implementations and tests can
//! mock them.

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::TickerData;

/// Per-ticker retrieval failures. A failure excludes that ticker upstream of
/// scoring; it never becomes a zero score.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("hard stop: data provider has blocked requests (circuit breaker tripped)")]
    CircuitBreakerTripped,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error in {path}: {reason}")]
    Csv { path: String, reason: String },

    #[error("data error: {0}")]
    Other(String),
}

/// Source of per-ticker price history and fundamentals.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily bars in `[start, end]` plus the latest fundamentals.
    fn fetch(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<TickerData, DataError>;

    /// False when the provider refuses requests (rate limited, blocked).
    fn is_available(&self) -> bool;
}

/// Progress callback for multi-ticker loads.
pub trait FetchProgress: Send {
    fn on_start(&self, ticker: &str, index: usize, total: usize);

    fn on_complete(&self, ticker: &str, index: usize, total: usize, result: &Result<(), DataError>);

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize);
}

/// Progress reporter that emits tracing events.
pub struct LogProgress;

impl FetchProgress for LogProgress {
    fn on_start(&self, ticker: &str, index: usize, total: usize) {
        info!(ticker, "[{}/{}] fetching", index + 1, total);
    }

    fn on_complete(&self, ticker: &str, _index: usize, _total: usize, result: &Result<(), DataError>) {
        if let Err(e) = result {
            warn!(ticker, error = %e, "fetch failed");
        }
    }

    fn on_batch_complete(&self, succeeded: usize, failed: usize, total: usize) {
        info!(succeeded, failed, total, "fetch complete");
    }
}

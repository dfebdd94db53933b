//! Batch loading of a ticker universe through a data provider.
//!
//! Tickers are fetched one at a time with a fixed pause between calls, which
//! keeps free providers from rate limiting us. A failed ticker is recorded and
//! skipped; it never aborts the batch. Once the provider reports itself
//! unavailable (circuit breaker open), the remaining tickers are marked failed
//! without further requests.

use chrono::NaiveDate;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use quantrank_core::data::{DataError, DataProvider, FetchProgress};
use quantrank_core::TickerData;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no tickers to load")]
    EmptyUniverse,

    #[error("data provider '{provider}' is unavailable")]
    ProviderUnavailable { provider: String },
}

#[derive(Debug, Clone)]
pub struct LoadOptions {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Pause between consecutive fetches.
    pub request_delay: Duration,
}

#[derive(Debug, Default)]
pub struct LoadedUniverse {
    /// Successfully fetched tickers, in request order.
    pub data: Vec<TickerData>,
    pub failures: Vec<(String, DataError)>,
}

impl LoadedUniverse {
    pub fn attempted(&self) -> usize {
        self.data.len() + self.failures.len()
    }
}

pub fn load_universe(
    tickers: &[String],
    provider: &dyn DataProvider,
    opts: &LoadOptions,
    progress: Option<&dyn FetchProgress>,
) -> Result<LoadedUniverse, LoadError> {
    if tickers.is_empty() {
        return Err(LoadError::EmptyUniverse);
    }
    if !provider.is_available() {
        return Err(LoadError::ProviderUnavailable {
            provider: provider.name().to_string(),
        });
    }

    let total = tickers.len();
    let mut loaded = LoadedUniverse::default();

    for (i, ticker) in tickers.iter().enumerate() {
        if !provider.is_available() {
            warn!(ticker = %ticker, "provider unavailable, skipping");
            let result: Result<(), DataError> = Err(DataError::CircuitBreakerTripped);
            if let Some(p) = progress {
                p.on_complete(ticker, i, total, &result);
            }
            loaded.failures.push((ticker.clone(), DataError::CircuitBreakerTripped));
            continue;
        }

        if i > 0 && !opts.request_delay.is_zero() {
            std::thread::sleep(opts.request_delay);
        }
        if let Some(p) = progress {
            p.on_start(ticker, i, total);
        }

        match provider.fetch(ticker, opts.start, opts.end) {
            Ok(data) => {
                debug!(ticker = %ticker, bars = data.bars.len(), "loaded");
                if let Some(p) = progress {
                    p.on_complete(ticker, i, total, &Ok(()));
                }
                loaded.data.push(data);
            }
            Err(e) => {
                let result: Result<(), DataError> = Err(e);
                if let Some(p) = progress {
                    p.on_complete(ticker, i, total, &result);
                }
                if let Err(e) = result {
                    loaded.failures.push((ticker.clone(), e));
                }
            }
        }
    }

    if let Some(p) = progress {
        p.on_batch_complete(loaded.data.len(), loaded.failures.len(), total);
    }
    Ok(loaded)
}

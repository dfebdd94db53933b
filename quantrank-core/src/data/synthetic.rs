//! Deterministic synthetic data for offline demos and tests.
//!
//! Each ticker gets its own random walk seeded from the BLAKE3 hash of its
//! symbol, so the same ticker always yields the same bars and fundamentals.

use chrono::{Datelike, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::provider::{DataError, DataProvider};
use crate::domain::{FundamentalMetric, FundamentalSnapshot, PriceBar, TickerData};

#[derive(Debug, Clone, Default)]
pub struct SyntheticProvider;

impl SyntheticProvider {
    pub fn new() -> Self {
        Self
    }

    fn rng_for(ticker: &str) -> StdRng {
        StdRng::from_seed(*blake3::hash(ticker.as_bytes()).as_bytes())
    }

    /// Weekday bars from `start` to `end` inclusive, starting near 100.
    pub fn generate_bars(ticker: &str, start: NaiveDate, end: NaiveDate) -> Vec<PriceBar> {
        let mut rng = Self::rng_for(ticker);
        // Per-ticker drift so rankings are not a coin toss
        let drift: f64 = rng.gen_range(-0.002..0.003);
        let mut price = rng.gen_range(20.0..200.0_f64);
        let mut bars = Vec::new();
        let mut current = start;

        while current <= end {
            if matches!(current.weekday(), Weekday::Sat | Weekday::Sun) {
                current += chrono::Duration::days(1);
                continue;
            }
            let daily_return: f64 = drift + rng.gen_range(-0.02..0.02);
            let open = price;
            let close = (price * (1.0 + daily_return)).max(0.01);
            let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.01));
            let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.01));
            let volume = rng.gen_range(500_000..5_000_000u64);

            bars.push(PriceBar {
                date: current,
                open,
                high,
                low,
                close,
                volume,
            });
            price = close;
            current += chrono::Duration::days(1);
        }
        bars
    }

    /// Plausible ratios in percent units; some metrics are left out at random.
    pub fn generate_fundamentals(ticker: &str) -> FundamentalSnapshot {
        // Separate stream from the bars
        let mut rng = Self::rng_for(&format!("{ticker}#fundamentals"));
        let mut snapshot = FundamentalSnapshot::new();
        let ranges = [
            (FundamentalMetric::PeRatio, 5.0, 45.0),
            (FundamentalMetric::DividendYield, 0.0, 9.0),
            (FundamentalMetric::PriceToBook, 0.5, 8.0),
            (FundamentalMetric::ReturnOnEquity, -5.0, 40.0),
            (FundamentalMetric::ProfitMargin, -2.0, 30.0),
            (FundamentalMetric::DebtToEquity, 0.0, 200.0),
        ];
        for (metric, low, high) in ranges {
            if rng.gen_bool(0.85) {
                snapshot.insert(metric, rng.gen_range(low..high));
            }
        }
        snapshot.insert(FundamentalMetric::MarketCap, rng.gen_range(1e9..2e11));
        snapshot
    }
}

impl DataProvider for SyntheticProvider {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn fetch(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<TickerData, DataError> {
        Ok(TickerData::new(
            ticker,
            Self::generate_bars(ticker, start, end),
            Self::generate_fundamentals(ticker),
        ))
    }

    fn is_available(&self) -> bool {
        true
    }
}

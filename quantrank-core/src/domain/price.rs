//! Price bars and the validated, chronologically ordered price series.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Daily OHLCV bar for a single ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// Reasons a raw bar list cannot become a `PriceSeries`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("duplicate date {date} at index {index}")]
    DuplicateDate { date: NaiveDate, index: usize },

    #[error("dates not ascending: {previous} followed by {date} at index {index}")]
    NotChronological {
        previous: NaiveDate,
        date: NaiveDate,
        index: usize,
    },

    #[error("invalid close {close} on {date}")]
    InvalidClose { date: NaiveDate, close: f64 },
}

/// Chronologically ascending price history with no duplicate dates.
///
/// Only constructible through [`PriceSeries::new`], so every instance has passed
/// validation. Never mutated after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    ticker: String,
    bars: Vec<PriceBar>,
    closes: Vec<f64>,
}

impl PriceSeries {
    /// Validate and wrap a bar list.
    ///
    /// Closes must be finite and strictly positive; they feed ratios downstream.
    /// An empty list is accepted: every price-derived factor will simply be
    /// unavailable.
    pub fn new(ticker: impl Into<String>, bars: Vec<PriceBar>) -> Result<Self, SeriesError> {
        for (index, bar) in bars.iter().enumerate() {
            if !bar.close.is_finite() || bar.close <= 0.0 {
                return Err(SeriesError::InvalidClose {
                    date: bar.date,
                    close: bar.close,
                });
            }
            if index == 0 {
                continue;
            }
            let previous = bars[index - 1].date;
            if bar.date == previous {
                return Err(SeriesError::DuplicateDate {
                    date: bar.date,
                    index,
                });
            }
            if bar.date < previous {
                return Err(SeriesError::NotChronological {
                    previous,
                    date: bar.date,
                    index,
                });
            }
        }

        let closes = bars.iter().map(|b| b.close).collect();
        Ok(Self {
            ticker: ticker.into(),
            bars,
            closes,
        })
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    /// Closing prices in chronological order.
    pub fn closes(&self) -> &[f64] {
        &self.closes
    }

    pub fn last_close(&self) -> Option<f64> {
        self.closes.last().copied()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

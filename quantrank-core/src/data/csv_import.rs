//! CSV directory provider for offline runs and Yahoo outages.
//!
//! Layout:
//! - `<dir>/<TICKER>.csv` with header `date,open,high,low,close,volume`
//! - `<dir>/fundamentals.csv` (optional) with a `ticker` column and one column
//!   per metric key (`pe_ratio`, `dividend_yield`, ...). Blank cells are absent.

use chrono::NaiveDate;
use std::path::{Path, PathBuf};

use super::provider::{DataError, DataProvider};
use crate::domain::{FundamentalMetric, FundamentalSnapshot, PriceBar, TickerData};

pub const FUNDAMENTALS_FILE: &str = "fundamentals.csv";

pub struct CsvProvider {
    dir: PathBuf,
}

impl CsvProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn csv_error(path: &Path, e: impl std::fmt::Display) -> DataError {
        DataError::Csv {
            path: path.display().to_string(),
            reason: e.to_string(),
        }
    }

    pub fn read_bars(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<PriceBar>, DataError> {
        let path = self.dir.join(format!("{ticker}.csv"));
        if !path.exists() {
            return Err(DataError::SymbolNotFound {
                symbol: ticker.to_string(),
            });
        }

        let mut reader = csv::Reader::from_path(&path).map_err(|e| Self::csv_error(&path, e))?;
        let mut bars = Vec::new();
        for row in reader.deserialize::<PriceBar>() {
            let bar = row.map_err(|e| Self::csv_error(&path, e))?;
            if bar.date >= start && bar.date <= end {
                bars.push(bar);
            }
        }
        Ok(bars)
    }

    /// Fundamentals row for `ticker`; empty when the file or row is missing.
    pub fn read_fundamentals(&self, ticker: &str) -> Result<FundamentalSnapshot, DataError> {
        let path = self.dir.join(FUNDAMENTALS_FILE);
        if !path.exists() {
            return Ok(FundamentalSnapshot::new());
        }

        let mut reader = csv::Reader::from_path(&path).map_err(|e| Self::csv_error(&path, e))?;
        let headers = reader.headers().map_err(|e| Self::csv_error(&path, e))?.clone();
        let ticker_col = headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case("ticker"))
            .ok_or_else(|| Self::csv_error(&path, "missing 'ticker' column"))?;
        let metric_cols: Vec<(usize, FundamentalMetric)> = headers
            .iter()
            .enumerate()
            .filter_map(|(i, h)| FundamentalMetric::from_key(h.trim()).map(|m| (i, m)))
            .collect();

        for record in reader.records() {
            let record = record.map_err(|e| Self::csv_error(&path, e))?;
            if record.get(ticker_col).map(str::trim) != Some(ticker) {
                continue;
            }
            let mut snapshot = FundamentalSnapshot::new();
            for &(col, metric) in &metric_cols {
                let cell = record.get(col).unwrap_or("").trim();
                if cell.is_empty() {
                    continue;
                }
                let value: f64 = cell
                    .parse()
                    .map_err(|_| Self::csv_error(&path, format!("bad {metric} value '{cell}' for {ticker}")))?;
                snapshot.insert(metric, value);
            }
            return Ok(snapshot);
        }
        Ok(FundamentalSnapshot::new())
    }
}

impl DataProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<TickerData, DataError> {
        let bars = self.read_bars(ticker, start, end)?;
        let fundamentals = self.read_fundamentals(ticker)?;
        Ok(TickerData::new(ticker, bars, fundamentals))
    }

    fn is_available(&self) -> bool {
        self.dir.is_dir()
    }
}

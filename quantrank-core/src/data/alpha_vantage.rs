//! Alpha Vantage data provider.
//!
//! Daily bars come from `TIME_SERIES_DAILY_ADJUSTED`; closes are the adjusted
//! closes. Alpha Vantage supplies no fundamentals here, so tickers score on
//! momentum and technicals only.
//!
//! The free tier allows 5 calls per minute: calls are spaced at least 12 s
//! apart, including the base-symbol fallback for LSE tickers.

use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::circuit_breaker::CircuitBreaker;
use super::provider::{DataError, DataProvider};
use crate::domain::{FundamentalSnapshot, PriceBar, TickerData};

const BASE_URL: &str = "https://www.alphavantage.co/query";

/// Environment variable read when no key is configured.
pub const API_KEY_ENV: &str = "ALPHA_VANTAGE_API_KEY";

/// `compact` returns the latest 100 sessions, roughly 140 calendar days.
const COMPACT_CALENDAR_DAYS: i64 = 140;

#[derive(Debug, Deserialize)]
struct DailyResponse {
    #[serde(rename = "Time Series (Daily)")]
    series: Option<BTreeMap<NaiveDate, DailyRow>>,
    #[serde(rename = "Error Message")]
    error_message: Option<String>,
    #[serde(rename = "Note")]
    note: Option<String>,
    #[serde(rename = "Information")]
    information: Option<String>,
}

/// Every field arrives as a string.
#[derive(Debug, Deserialize)]
struct DailyRow {
    #[serde(rename = "1. open")]
    open: String,
    #[serde(rename = "2. high")]
    high: String,
    #[serde(rename = "3. low")]
    low: String,
    #[serde(rename = "4. close")]
    close: String,
    #[serde(rename = "5. adjusted close")]
    adjusted_close: Option<String>,
    #[serde(rename = "6. volume")]
    volume: String,
}

fn num(field: &str, value: &str) -> Result<f64, DataError> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| DataError::ResponseFormatChanged(format!("non-numeric {field}: {value:?}")))
}

pub struct AlphaVantageProvider {
    client: reqwest::blocking::Client,
    api_key: String,
    circuit_breaker: Arc<CircuitBreaker>,
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl AlphaVantageProvider {
    /// Uses `api_key`, else `ALPHA_VANTAGE_API_KEY`.
    pub fn new(api_key: Option<String>, circuit_breaker: Arc<CircuitBreaker>) -> Result<Self, DataError> {
        let api_key = api_key
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                DataError::AuthenticationRequired(format!(
                    "Alpha Vantage needs an API key: set data.api_key or {API_KEY_ENV} \
                     (free key at https://www.alphavantage.co/support/#api-key)"
                ))
            })?;

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            circuit_breaker,
            min_interval: Duration::from_secs(12),
            last_call: Mutex::new(None),
        })
    }

    pub fn with_min_interval(mut self, min_interval: Duration) -> Self {
        self.min_interval = min_interval;
        self
    }

    /// LSE tickers use the `.LSE` suffix instead of Yahoo's `.L`.
    pub fn provider_symbol(ticker: &str) -> String {
        match ticker.strip_suffix(".L") {
            Some(base) => format!("{base}.LSE"),
            None => ticker.to_string(),
        }
    }

    fn output_size(start: NaiveDate, end: NaiveDate) -> &'static str {
        if (end - start).num_days() > COMPACT_CALENDAR_DAYS {
            "full"
        } else {
            "compact"
        }
    }

    fn daily_url(&self, symbol: &str, output_size: &str) -> Result<String, DataError> {
        let url = reqwest::Url::parse_with_params(
            BASE_URL,
            &[
                ("function", "TIME_SERIES_DAILY_ADJUSTED"),
                ("symbol", symbol),
                ("outputsize", output_size),
                ("apikey", self.api_key.as_str()),
            ],
        )
        .map_err(|e| DataError::Other(format!("invalid Alpha Vantage URL for {symbol}: {e}")))?;
        Ok(url.into())
    }

    fn parse_daily(
        symbol: &str,
        resp: DailyResponse,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<PriceBar>, DataError> {
        if let Some(msg) = resp.error_message {
            debug!(symbol, %msg, "alpha vantage error message");
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        let Some(series) = resp.series else {
            return Err(match resp.note.or(resp.information) {
                Some(msg) if msg.to_lowercase().contains("api key") && !msg.contains("rate limit") => {
                    DataError::AuthenticationRequired(msg)
                }
                Some(_) => DataError::RateLimited { retry_after_secs: 60 },
                None => DataError::ResponseFormatChanged("no daily time series in response".into()),
            });
        };

        let mut bars = Vec::new();
        // BTreeMap keys iterate in ascending date order
        for (date, row) in series.range(start..=end) {
            let close = num("close", &row.close)?;
            let adjusted = match &row.adjusted_close {
                Some(v) => num("adjusted close", v)?,
                None => close,
            };
            // Scale the rest of the bar with the adjustment so it stays consistent
            let factor = if close > 0.0 { adjusted / close } else { 1.0 };
            bars.push(PriceBar {
                date: *date,
                open: num("open", &row.open)? * factor,
                high: num("high", &row.high)? * factor,
                low: num("low", &row.low)? * factor,
                close: adjusted,
                volume: row.volume.trim().parse::<u64>().unwrap_or(0),
            });
        }

        if bars.is_empty() {
            return Err(DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            });
        }
        Ok(bars)
    }

    /// Sleep until `min_interval` has passed since the previous call.
    fn throttle(&self) {
        let mut last = self.last_call.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(prev) = *last {
            let wait = self.min_interval.saturating_sub(prev.elapsed());
            if !wait.is_zero() {
                std::thread::sleep(wait);
            }
        }
        *last = Some(Instant::now());
    }

    fn request(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<PriceBar>, DataError> {
        if !self.circuit_breaker.is_allowed() {
            return Err(DataError::CircuitBreakerTripped);
        }
        self.throttle();

        let url = self.daily_url(symbol, Self::output_size(start, end))?;
        let resp = self
            .client
            .get(&url)
            .send()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;

        let status = resp.status();
        if status == reqwest::StatusCode::FORBIDDEN {
            self.circuit_breaker.trip();
            return Err(DataError::CircuitBreakerTripped);
        }
        if !status.is_success() {
            self.circuit_breaker.record_failure();
            return Err(DataError::Other(format!("HTTP {status} for {symbol}")));
        }

        let body: DailyResponse = resp.json().map_err(|e| {
            DataError::ResponseFormatChanged(format!("failed to parse response for {symbol}: {e}"))
        })?;
        match Self::parse_daily(symbol, body, start, end) {
            Err(e @ DataError::RateLimited { .. }) => {
                self.circuit_breaker.record_failure();
                Err(e)
            }
            other => {
                self.circuit_breaker.record_success();
                other
            }
        }
    }
}

impl DataProvider for AlphaVantageProvider {
    fn name(&self) -> &str {
        "alpha_vantage"
    }

    fn fetch(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<TickerData, DataError> {
        let symbol = Self::provider_symbol(ticker);
        let bars = match self.request(&symbol, start, end) {
            // Some LSE listings are only known under the bare symbol
            Err(DataError::SymbolNotFound { .. }) if symbol != ticker => {
                let base = ticker.trim_end_matches(".L");
                warn!(ticker, symbol = %symbol, fallback = base, "retrying with base symbol");
                self.request(base, start, end)?
            }
            other => other?,
        };
        debug!(ticker, bars = bars.len(), "alpha vantage fetch ok");
        Ok(TickerData::new(ticker, bars, FundamentalSnapshot::new()))
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}

//! Yahoo Finance data provider.
//!
//! Daily bars come from the v8 chart API, fundamentals from the v10
//! quoteSummary API. Handles rate limiting, retries with exponential backoff,
//! response parsing, and the circuit breaker.
//!
//! quoteSummary needs a session cookie plus a matching crumb token. The crumb
//! is fetched once per provider, cached, and refreshed after a 401.
//!
//! Yahoo has no official API and changes formats without notice. A failed
//! fundamentals request degrades to an empty snapshot; prices still score.

use chrono::{NaiveDate, NaiveTime};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

use super::circuit_breaker::CircuitBreaker;
use super::provider::{DataError, DataProvider};
use crate::domain::{FundamentalMetric, FundamentalSnapshot, PriceBar, TickerData};

const BASE_URL: &str = "https://query2.finance.yahoo.com";
/// Any response from here sets the session cookie the crumb is bound to.
const COOKIE_URL: &str = "https://fc.yahoo.com";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    open: Vec<Option<f64>>,
    high: Vec<Option<f64>>,
    low: Vec<Option<f64>>,
    close: Vec<Option<f64>>,
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResponse {
    quote_summary: SummaryResult,
}

#[derive(Debug, Deserialize)]
struct SummaryResult {
    result: Option<Vec<SummaryModules>>,
    error: Option<ApiError>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryModules {
    #[serde(default)]
    summary_detail: Option<SummaryDetail>,
    #[serde(default)]
    default_key_statistics: Option<KeyStatistics>,
    #[serde(default)]
    financial_data: Option<FinancialData>,
}

/// Yahoo wraps numbers as `{"raw": 1.23, "fmt": "1.23"}`; empty objects mean absent.
#[derive(Debug, Default, Deserialize)]
struct Num {
    raw: Option<f64>,
}

fn raw(n: &Option<Num>) -> Option<f64> {
    n.as_ref().and_then(|n| n.raw).filter(|v| v.is_finite())
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryDetail {
    trailing_pe: Option<Num>,
    forward_pe: Option<Num>,
    dividend_yield: Option<Num>,
    market_cap: Option<Num>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyStatistics {
    price_to_book: Option<Num>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinancialData {
    return_on_equity: Option<Num>,
    profit_margins: Option<Num>,
    debt_to_equity: Option<Num>,
}

pub struct YahooProvider {
    client: reqwest::blocking::Client,
    circuit_breaker: Arc<CircuitBreaker>,
    crumb: Mutex<Option<String>>,
    max_retries: u32,
    base_delay: Duration,
}

impl YahooProvider {
    pub fn new(circuit_breaker: Arc<CircuitBreaker>) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .cookie_store(true)
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            circuit_breaker,
            crumb: Mutex::new(None),
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        })
    }

    fn chart_url(ticker: &str, start: NaiveDate, end: NaiveDate) -> String {
        let start_ts = start.and_time(NaiveTime::MIN).and_utc().timestamp();
        // period2 is exclusive
        let end_ts = end.succ_opt().unwrap_or(end).and_time(NaiveTime::MIN).and_utc().timestamp();
        format!(
            "{BASE_URL}/v8/finance/chart/{ticker}\
             ?period1={start_ts}&period2={end_ts}&interval=1d"
        )
    }

    fn summary_url(ticker: &str, crumb: &str) -> Result<String, DataError> {
        let url = reqwest::Url::parse_with_params(
            &format!("{BASE_URL}/v10/finance/quoteSummary/{ticker}"),
            &[
                ("modules", "summaryDetail,defaultKeyStatistics,financialData"),
                ("crumb", crumb),
            ],
        )
        .map_err(|e| DataError::Other(format!("invalid quoteSummary URL for {ticker}: {e}")))?;
        Ok(url.into())
    }

    /// A crumb is a short opaque token; anything else (HTML, JSON error) means
    /// the cookie handshake failed.
    fn parse_crumb(body: &str) -> Result<String, DataError> {
        let crumb = body.trim();
        if crumb.is_empty() || crumb.len() > 64 || crumb.contains(['<', '{', ' ']) {
            return Err(DataError::AuthenticationRequired(
                "Yahoo Finance did not issue a crumb".into(),
            ));
        }
        Ok(crumb.to_string())
    }

    fn cached_crumb(&self) -> Option<String> {
        self.crumb.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    fn invalidate_crumb(&self) {
        *self.crumb.lock().unwrap_or_else(|e| e.into_inner()) = None;
    }

    /// Cached crumb, or a fresh one from the cookie + getcrumb handshake.
    fn crumb(&self) -> Result<String, DataError> {
        if let Some(crumb) = self.cached_crumb() {
            return Ok(crumb);
        }
        if !self.circuit_breaker.is_allowed() {
            return Err(DataError::CircuitBreakerTripped);
        }

        // Status is irrelevant here (usually 404); only the Set-Cookie matters.
        self.client
            .get(COOKIE_URL)
            .send()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;

        let resp = self
            .client
            .get(format!("{BASE_URL}/v1/test/getcrumb"))
            .send()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;
        match resp.status() {
            reqwest::StatusCode::FORBIDDEN => {
                self.circuit_breaker.trip();
                return Err(DataError::CircuitBreakerTripped);
            }
            reqwest::StatusCode::TOO_MANY_REQUESTS => {
                self.circuit_breaker.record_failure();
                return Err(DataError::RateLimited { retry_after_secs: 60 });
            }
            status if !status.is_success() => {
                return Err(DataError::AuthenticationRequired(format!(
                    "getcrumb returned HTTP {status}"
                )));
            }
            _ => {}
        }
        let body = resp
            .text()
            .map_err(|e| DataError::ResponseFormatChanged(format!("unreadable crumb: {e}")))?;
        let crumb = Self::parse_crumb(&body)?;
        debug!("yahoo crumb acquired");
        *self.crumb.lock().unwrap_or_else(|e| e.into_inner()) = Some(crumb.clone());
        Ok(crumb)
    }

    fn parse_chart(ticker: &str, resp: ChartResponse) -> Result<Vec<PriceBar>, DataError> {
        let result = resp.chart.result.ok_or_else(|| match resp.chart.error {
            Some(err) if err.code == "Not Found" => DataError::SymbolNotFound {
                symbol: ticker.to_string(),
            },
            Some(err) => DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description)),
            None => DataError::ResponseFormatChanged("empty result with no error".into()),
        })?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

        let timestamps = data
            .timestamp
            .ok_or_else(|| DataError::ResponseFormatChanged("no timestamps".into()))?;

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

        let mut bars = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let date = chrono::DateTime::from_timestamp(ts, 0)
                .map(|dt| dt.naive_utc().date())
                .ok_or_else(|| DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}")))?;

            // No close means a non-trading placeholder row
            let Some(close) = quote.close.get(i).copied().flatten() else {
                continue;
            };
            bars.push(PriceBar {
                date,
                open: quote.open.get(i).copied().flatten().unwrap_or(close),
                high: quote.high.get(i).copied().flatten().unwrap_or(close),
                low: quote.low.get(i).copied().flatten().unwrap_or(close),
                close,
                volume: quote.volume.get(i).copied().flatten().unwrap_or(0),
            });
        }

        if bars.is_empty() {
            return Err(DataError::SymbolNotFound {
                symbol: ticker.to_string(),
            });
        }
        Ok(bars)
    }

    fn parse_summary(ticker: &str, resp: SummaryResponse) -> Result<FundamentalSnapshot, DataError> {
        let modules = match (resp.quote_summary.result, resp.quote_summary.error) {
            (Some(result), _) => result.into_iter().next().unwrap_or_default(),
            (None, Some(err)) if err.code == "Not Found" => {
                return Err(DataError::SymbolNotFound {
                    symbol: ticker.to_string(),
                })
            }
            (None, Some(err)) => {
                return Err(DataError::ResponseFormatChanged(format!(
                    "{}: {}",
                    err.code, err.description
                )))
            }
            (None, None) => SummaryModules::default(),
        };

        let detail = modules.summary_detail.unwrap_or_default();
        let stats = modules.default_key_statistics.unwrap_or_default();
        let financial = modules.financial_data.unwrap_or_default();

        let mut snapshot = FundamentalSnapshot::new();
        let mut set = |metric, value: Option<f64>| {
            if let Some(v) = value {
                snapshot.insert(metric, v);
            }
        };
        set(
            FundamentalMetric::PeRatio,
            raw(&detail.trailing_pe).or_else(|| raw(&detail.forward_pe)),
        );
        set(
            FundamentalMetric::DividendYield,
            raw(&detail.dividend_yield).map(|y| if y < 1.0 { y * 100.0 } else { y }),
        );
        set(FundamentalMetric::MarketCap, raw(&detail.market_cap));
        set(FundamentalMetric::PriceToBook, raw(&stats.price_to_book));
        set(
            FundamentalMetric::ReturnOnEquity,
            raw(&financial.return_on_equity).map(|r| r * 100.0),
        );
        set(
            FundamentalMetric::ProfitMargin,
            raw(&financial.profit_margins).map(|r| r * 100.0),
        );
        set(FundamentalMetric::DebtToEquity, raw(&financial.debt_to_equity));
        Ok(snapshot)
    }

    /// GET `url` and decode JSON, with retry and circuit breaker logic.
    fn get_json<T: DeserializeOwned>(&self, ticker: &str, url: &str) -> Result<T, DataError> {
        if !self.circuit_breaker.is_allowed() {
            return Err(DataError::CircuitBreakerTripped);
        }

        let mut last_error = None;
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                std::thread::sleep(self.base_delay * 2u32.pow(attempt - 1));
            }
            if !self.circuit_breaker.is_allowed() {
                return Err(DataError::CircuitBreakerTripped);
            }

            let resp = match self.client.get(url).send() {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() => {
                    last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                    continue;
                }
                Err(e) => return Err(DataError::NetworkUnreachable(e.to_string())),
            };

            let status = resp.status();
            if status == reqwest::StatusCode::FORBIDDEN {
                // IP ban
                self.circuit_breaker.trip();
                return Err(DataError::CircuitBreakerTripped);
            }
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                self.circuit_breaker.record_failure();
                let retry_after = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                last_error = Some(DataError::RateLimited {
                    retry_after_secs: retry_after,
                });
                continue;
            }
            if status == reqwest::StatusCode::UNAUTHORIZED {
                return Err(DataError::AuthenticationRequired(
                    "Yahoo Finance requires authentication".into(),
                ));
            }
            if status == reqwest::StatusCode::NOT_FOUND {
                return Err(DataError::SymbolNotFound {
                    symbol: ticker.to_string(),
                });
            }
            if !status.is_success() {
                self.circuit_breaker.record_failure();
                last_error = Some(DataError::Other(format!("HTTP {status} for {ticker}")));
                continue;
            }

            let body = resp.json::<T>().map_err(|e| {
                DataError::ResponseFormatChanged(format!("failed to parse response for {ticker}: {e}"))
            })?;
            self.circuit_breaker.record_success();
            return Ok(body);
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }

    pub fn fetch_bars(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<PriceBar>, DataError> {
        let chart = self.get_json(ticker, &Self::chart_url(ticker, start, end))?;
        Self::parse_chart(ticker, chart)
    }

    pub fn fetch_fundamentals(&self, ticker: &str) -> Result<FundamentalSnapshot, DataError> {
        let crumb = self.crumb()?;
        let summary = match self.get_json(ticker, &Self::summary_url(ticker, &crumb)?) {
            Err(DataError::AuthenticationRequired(_)) => {
                // Crumb expired with its cookie; one fresh handshake, then give up.
                self.invalidate_crumb();
                let crumb = self.crumb()?;
                self.get_json(ticker, &Self::summary_url(ticker, &crumb)?)?
            }
            other => other?,
        };
        Self::parse_summary(ticker, summary)
    }
}

impl DataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn fetch(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<TickerData, DataError> {
        let bars = self.fetch_bars(ticker, start, end)?;
        let fundamentals = match self.fetch_fundamentals(ticker) {
            Ok(snapshot) => snapshot,
            Err(DataError::CircuitBreakerTripped) => return Err(DataError::CircuitBreakerTripped),
            Err(e) => {
                warn!(ticker, error = %e, "fundamentals unavailable; scoring on prices only");
                FundamentalSnapshot::new()
            }
        };
        debug!(ticker, bars = bars.len(), metrics = fundamentals.len(), "yahoo fetch ok");
        Ok(TickerData::new(ticker, bars, fundamentals))
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}

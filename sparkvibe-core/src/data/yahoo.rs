//! Yahoo Finance data provider.
//!
//! Daily bars come from the v8 chart API. Fundamentals and earnings evidence
//! come from the v10 quoteSummary API, which needs a session cookie plus a
//! crumb token; the crumb is fetched lazily and dropped on HTTP 401. The v7
//! quote endpoint is read best-effort for the next earnings timestamp, and the
//! v1 visualization endpoint for past and scheduled report dates.
//!
//! Yahoo Finance has no official API and is subject to unannounced format changes.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use super::circuit_breaker::CircuitBreaker;
use super::provider::{DataError, MarketDataProvider};
use crate::domain::{Bar, Fundamentals};
use crate::earnings::{EarningsEvidence, EARNINGS_HISTORY_LIMIT};

const CHART_URL: &str = "https://query2.finance.yahoo.com/v8/finance/chart/";
const SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary/";
const QUOTE_URL: &str = "https://query2.finance.yahoo.com/v7/finance/quote";
const COOKIE_URL: &str = "https://fc.yahoo.com";
const CRUMB_URL: &str = "https://query2.finance.yahoo.com/v1/test/getcrumb";
const EARNINGS_DATES_URL: &str = "https://query1.finance.yahoo.com/v1/finance/visualization";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                          (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

const FUNDAMENTAL_MODULES: &str = "summaryDetail,defaultKeyStatistics";
const EARNINGS_MODULES: &str = "calendarEvents";

// ── v8 chart ────────────────────────────────────────────────────────

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
    #[serde(default)]
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
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

// ── v10 quoteSummary ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResponse {
    quote_summary: SummaryResult,
}

#[derive(Debug, Deserialize)]
struct SummaryResult {
    result: Option<Vec<SummaryData>>,
    error: Option<ApiError>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SummaryData {
    summary_detail: Option<SummaryDetail>,
    default_key_statistics: Option<KeyStatistics>,
    calendar_events: Option<CalendarEvents>,
}

/// Yahoo wraps numbers as `{"raw": 1.0, "fmt": "1.00"}`; missing values are `{}`.
#[derive(Debug, Default, Clone, Copy, Deserialize)]
struct RawValue {
    raw: Option<f64>,
}

fn raw(v: &Option<RawValue>) -> Option<f64> {
    v.and_then(|r| r.raw).filter(|x| x.is_finite())
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SummaryDetail {
    market_cap: Option<RawValue>,
    #[serde(rename = "trailingPE")]
    trailing_pe: Option<RawValue>,
    #[serde(rename = "forwardPE")]
    forward_pe: Option<RawValue>,
    average_volume: Option<RawValue>,
    previous_close: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct KeyStatistics {
    trailing_eps: Option<RawValue>,
    forward_eps: Option<RawValue>,
    peg_ratio: Option<RawValue>,
    price_to_book: Option<RawValue>,
    short_percent_of_float: Option<RawValue>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CalendarEvents {
    earnings: Option<CalendarEarnings>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct CalendarEarnings {
    earnings_date: Vec<RawValue>,
    earnings_call_date: Vec<RawValue>,
}

// ── v1 visualization (earnings report dates) ────────────────────────

#[derive(Debug, Deserialize)]
struct VisualizationResponse {
    finance: VisualizationResult,
}

#[derive(Debug, Deserialize)]
struct VisualizationResult {
    result: Option<Vec<VisualizationData>>,
    error: Option<ApiError>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct VisualizationData {
    documents: Vec<VisualizationDocument>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct VisualizationDocument {
    columns: Vec<VisualizationColumn>,
    rows: Vec<Vec<Value>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct VisualizationColumn {
    id: String,
    label: String,
}

impl VisualizationColumn {
    fn is_start_date(&self) -> bool {
        self.id == "startdatetime" || self.label == "Event Start Date"
    }
}

/// Report time as an ISO string or epoch milliseconds.
fn report_datetime(v: &Value) -> Option<NaiveDateTime> {
    match v {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.naive_utc())
            .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f"))
            .ok(),
        Value::Number(n) => n.as_i64().and_then(|ms| timestamp_to_naive(ms / 1000)),
        _ => None,
    }
}

// ── v7 quote ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteResponse {
    quote_response: QuoteResult,
}

#[derive(Debug, Deserialize)]
struct QuoteResult {
    #[serde(default)]
    result: Vec<QuoteRecord>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct QuoteRecord {
    earnings_timestamp: Option<i64>,
    eps_trailing_twelve_months: Option<f64>,
}

fn timestamp_to_naive(ts: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp(ts, 0).map(|dt| dt.naive_utc())
}

fn raw_timestamps(values: &[RawValue]) -> Vec<NaiveDateTime> {
    values
        .iter()
        .filter_map(|v| v.raw)
        .filter_map(|ts| timestamp_to_naive(ts as i64))
        .collect()
}

fn retry_after(headers: &reqwest::header::HeaderMap) -> u64 {
    headers
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(60)
}

/// Yahoo Finance data provider.
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
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            circuit_breaker,
            crumb: Mutex::new(None),
            max_retries: 0,
            base_delay: Duration::from_millis(500),
        })
    }

    /// Retry failed requests with exponential backoff (off by default).
    pub fn with_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// `base` followed by the symbol as one path segment. `Url` leaves `^`
    /// alone in paths, so index symbols are escaped here.
    fn url_for(base: &str, symbol: &str) -> Result<Url, DataError> {
        let mut segment = String::with_capacity(symbol.len() + 4);
        for b in symbol.bytes() {
            if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'=') {
                segment.push(char::from(b));
            } else {
                segment.push_str(&format!("%{b:02X}"));
            }
        }
        Url::parse(&format!("{base}{segment}"))
            .map_err(|e| DataError::Other(format!("cannot build URL for {symbol}: {e}")))
    }

    /// Build the chart API URL for a symbol and date range.
    fn chart_url(symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Url, DataError> {
        let start_ts = start.and_time(NaiveTime::MIN).and_utc().timestamp();
        let end_ts = end.and_time(NaiveTime::MIN).and_utc().timestamp() + 86_399;
        let mut url = Self::url_for(CHART_URL, symbol)?;
        url.query_pairs_mut()
            .append_pair("period1", &start_ts.to_string())
            .append_pair("period2", &end_ts.to_string())
            .append_pair("interval", "1d");
        Ok(url)
    }

    fn summary_url(symbol: &str, modules: &str, crumb: &str) -> Result<Url, DataError> {
        let mut url = Self::url_for(SUMMARY_URL, symbol)?;
        url.query_pairs_mut()
            .append_pair("modules", modules)
            .append_pair("crumb", crumb);
        Ok(url)
    }

    fn earnings_dates_url(crumb: &str) -> Result<Url, DataError> {
        let mut url =
            Url::parse(EARNINGS_DATES_URL).map_err(|e| DataError::Other(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("lang", "en-US")
            .append_pair("region", "US")
            .append_pair("crumb", crumb);
        Ok(url)
    }

    fn earnings_dates_query(symbol: &str) -> Value {
        json!({
            "size": EARNINGS_HISTORY_LIMIT,
            "query": {
                "operator": "and",
                "operands": [
                    { "operator": "eq", "operands": ["ticker", symbol] },
                    { "operator": "eq", "operands": ["eventtype", "2"] }
                ]
            },
            "sortField": "startdatetime",
            "sortType": "DESC",
            "entityIdType": "earnings",
            "includeFields": ["startdatetime", "eventtype"]
        })
    }

    fn quote_url(symbol: &str, crumb: &str) -> Result<Url, DataError> {
        let mut url = Url::parse(QUOTE_URL).map_err(|e| DataError::Other(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("symbols", symbol)
            .append_pair("crumb", crumb);
        Ok(url)
    }

    /// Session crumb for the authenticated endpoints, fetched once and cached.
    fn crumb(&self) -> Result<String, DataError> {
        let mut cached = self.crumb.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(crumb) = cached.as_ref() {
            return Ok(crumb.clone());
        }

        // Only the cookie matters; fc.yahoo.com answers 404 regardless.
        if let Err(e) = self.client.get(COOKIE_URL).send() {
            tracing::debug!(error = %e, "cookie request failed");
        }

        if !self.circuit_breaker.is_allowed() {
            return Err(DataError::CircuitBreakerTripped);
        }
        let resp = self
            .client
            .get(CRUMB_URL)
            .send()
            .map_err(|e| DataError::NetworkUnreachable(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(self.crumb_failure(status, resp.headers()));
        }
        let text = resp
            .text()
            .map_err(|e| DataError::ResponseFormatChanged(e.to_string()))?;
        let crumb = text.trim();
        if crumb.is_empty() || crumb.contains('<') {
            return Err(DataError::AuthenticationRequired(
                "crumb response was not a token".into(),
            ));
        }

        tracing::debug!("obtained Yahoo crumb");
        *cached = Some(crumb.to_string());
        Ok(crumb.to_string())
    }

    /// Error for a non-success crumb response. Counts against the breaker.
    fn crumb_failure(
        &self,
        status: reqwest::StatusCode,
        headers: &reqwest::header::HeaderMap,
    ) -> DataError {
        match status {
            reqwest::StatusCode::FORBIDDEN => {
                self.circuit_breaker.trip();
                DataError::CircuitBreakerTripped
            }
            reqwest::StatusCode::TOO_MANY_REQUESTS => {
                self.circuit_breaker.record_failure();
                DataError::RateLimited {
                    retry_after_secs: retry_after(headers),
                }
            }
            reqwest::StatusCode::UNAUTHORIZED => {
                self.circuit_breaker.record_failure();
                DataError::AuthenticationRequired(format!("crumb request returned HTTP {status}"))
            }
            _ => {
                self.circuit_breaker.record_failure();
                DataError::Other(format!("crumb request returned HTTP {status}"))
            }
        }
    }

    fn clear_crumb(&self) {
        *self.crumb.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn get_json<T: DeserializeOwned>(&self, symbol: &str, url: &Url) -> Result<T, DataError> {
        self.send_json(symbol, || self.client.get(url.clone()))
    }

    /// Send a request with retry and circuit breaker logic, decoding JSON.
    /// `request` builds a fresh request for every attempt.
    fn send_json<T, F>(&self, symbol: &str, request: F) -> Result<T, DataError>
    where
        T: DeserializeOwned,
        F: Fn() -> reqwest::blocking::RequestBuilder,
    {
        if !self.circuit_breaker.is_allowed() {
            return Err(DataError::CircuitBreakerTripped);
        }

        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                std::thread::sleep(delay);
            }

            if !self.circuit_breaker.is_allowed() {
                return Err(DataError::CircuitBreakerTripped);
            }

            match request().send() {
                Ok(resp) => {
                    let status = resp.status();

                    if status == reqwest::StatusCode::FORBIDDEN {
                        self.circuit_breaker.trip();
                        return Err(DataError::CircuitBreakerTripped);
                    }

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        self.circuit_breaker.record_failure();
                        last_error = Some(DataError::RateLimited {
                            retry_after_secs: retry_after(resp.headers()),
                        });
                        continue;
                    }

                    if status == reqwest::StatusCode::UNAUTHORIZED {
                        self.clear_crumb();
                        return Err(DataError::AuthenticationRequired(
                            "Yahoo Finance rejected the session crumb".into(),
                        ));
                    }

                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Err(DataError::SymbolNotFound {
                            symbol: symbol.to_string(),
                        });
                    }

                    if !status.is_success() {
                        self.circuit_breaker.record_failure();
                        last_error = Some(DataError::Other(format!("HTTP {status} for {symbol}")));
                        continue;
                    }

                    let body: T = resp.json().map_err(|e| {
                        DataError::ResponseFormatChanged(format!(
                            "failed to parse response for {symbol}: {e}"
                        ))
                    })?;
                    self.circuit_breaker.record_success();
                    return Ok(body);
                }
                Err(e) => {
                    if e.is_connect() || e.is_timeout() {
                        last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                        continue;
                    }
                    return Err(DataError::NetworkUnreachable(e.to_string()));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }

    fn summary(&self, symbol: &str, modules: &str) -> Result<SummaryData, DataError> {
        let crumb = self.crumb()?;
        let url = Self::summary_url(symbol, modules, &crumb)?;
        let resp: SummaryResponse = self.get_json(symbol, &url)?;
        Self::parse_summary(symbol, resp)
    }

    /// Past and scheduled report dates, newest first.
    fn earnings_dates(&self, symbol: &str) -> Result<Vec<NaiveDateTime>, DataError> {
        let crumb = self.crumb()?;
        let url = Self::earnings_dates_url(&crumb)?;
        let body = Self::earnings_dates_query(symbol);
        let resp: VisualizationResponse =
            self.send_json(symbol, || self.client.post(url.clone()).json(&body))?;
        Self::parse_earnings_dates(symbol, resp)
    }

    fn quote(&self, symbol: &str) -> Result<QuoteRecord, DataError> {
        let crumb = self.crumb()?;
        let url = Self::quote_url(symbol, &crumb)?;
        let resp: QuoteResponse = self.get_json(symbol, &url)?;
        resp.quote_response
            .result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            })
    }

    fn api_error(symbol: &str, err: Option<ApiError>) -> DataError {
        match err {
            Some(err) if err.code == "Not Found" => DataError::SymbolNotFound {
                symbol: symbol.to_string(),
            },
            Some(err) => {
                DataError::ResponseFormatChanged(format!("{}: {}", err.code, err.description))
            }
            None => DataError::ResponseFormatChanged("empty result with no error".into()),
        }
    }

    /// Parse the chart API response into bars, skipping all-null rows.
    fn parse_chart(symbol: &str, resp: ChartResponse) -> Result<Vec<Bar>, DataError> {
        let ChartResult { result, error } = resp.chart;
        let result = result.ok_or_else(|| Self::api_error(symbol, error))?;

        let data = result
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("result array is empty".into()))?;

        let no_data = || DataError::NoData {
            symbol: symbol.to_string(),
        };
        let timestamps = data.timestamp.ok_or_else(no_data)?;

        let quote = data
            .indicators
            .quote
            .into_iter()
            .next()
            .ok_or_else(|| DataError::ResponseFormatChanged("no quote data".into()))?;

        let mut bars = Vec::with_capacity(timestamps.len());
        for (i, &ts) in timestamps.iter().enumerate() {
            let date = timestamp_to_naive(ts)
                .map(|dt| dt.date())
                .ok_or_else(|| {
                    DataError::ResponseFormatChanged(format!("invalid timestamp: {ts}"))
                })?;

            let open = quote.open.get(i).copied().flatten();
            let high = quote.high.get(i).copied().flatten();
            let low = quote.low.get(i).copied().flatten();
            let close = quote.close.get(i).copied().flatten();
            let volume = quote.volume.get(i).copied().flatten();

            // Holidays and half-populated rows come back as all nulls
            if open.is_none()
                && high.is_none()
                && low.is_none()
                && close.is_none()
                && volume.is_none()
            {
                continue;
            }

            bars.push(Bar {
                date,
                open: open.unwrap_or(f64::NAN),
                high: high.unwrap_or(f64::NAN),
                low: low.unwrap_or(f64::NAN),
                close: close.unwrap_or(f64::NAN),
                volume: volume.unwrap_or(0),
            });
        }

        if bars.is_empty() {
            return Err(no_data());
        }
        Ok(bars)
    }

    fn parse_summary(symbol: &str, resp: SummaryResponse) -> Result<SummaryData, DataError> {
        let SummaryResult { result, error } = resp.quote_summary;
        result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| Self::api_error(symbol, error))
    }

    fn parse_earnings_dates(
        symbol: &str,
        resp: VisualizationResponse,
    ) -> Result<Vec<NaiveDateTime>, DataError> {
        let VisualizationResult { result, error } = resp.finance;
        let data = result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| Self::api_error(symbol, error))?;
        let Some(doc) = data.documents.into_iter().next() else {
            return Ok(Vec::new());
        };
        let column = doc
            .columns
            .iter()
            .position(VisualizationColumn::is_start_date)
            .ok_or_else(|| {
                DataError::ResponseFormatChanged("no startdatetime column in earnings dates".into())
            })?;
        Ok(doc
            .rows
            .iter()
            .filter_map(|row| row.get(column).and_then(report_datetime))
            .take(EARNINGS_HISTORY_LIMIT)
            .collect())
    }

    fn fundamentals_from(data: &SummaryData) -> Fundamentals {
        let detail = data.summary_detail.as_ref();
        let stats = data.default_key_statistics.as_ref();
        Fundamentals {
            market_cap: detail.and_then(|d| raw(&d.market_cap)),
            trailing_pe: detail.and_then(|d| raw(&d.trailing_pe)),
            forward_pe: detail.and_then(|d| raw(&d.forward_pe)),
            trailing_eps: stats.and_then(|s| raw(&s.trailing_eps)),
            forward_eps: stats.and_then(|s| raw(&s.forward_eps)),
            eps_ttm: None,
            peg_ratio: stats.and_then(|s| raw(&s.peg_ratio)),
            price_to_book: stats.and_then(|s| raw(&s.price_to_book)),
            short_percent_of_float: stats.and_then(|s| raw(&s.short_percent_of_float)),
            average_volume: detail.and_then(|d| raw(&d.average_volume)),
            previous_close: detail.and_then(|d| raw(&d.previous_close)),
        }
    }

    fn evidence_from(data: &SummaryData) -> EarningsEvidence {
        let calendar = data
            .calendar_events
            .as_ref()
            .and_then(|c| c.earnings.as_ref());
        EarningsEvidence {
            listed_dates: calendar
                .map(|c| raw_timestamps(&c.earnings_date))
                .unwrap_or_default(),
            calendar_dates: calendar
                .map(|c| raw_timestamps(&c.earnings_call_date))
                .unwrap_or_default(),
            history: Vec::new(),
            next_timestamp: None,
        }
    }
}

impl MarketDataProvider for YahooProvider {
    fn name(&self) -> &str {
        "yahoo_finance"
    }

    fn history(&self, symbol: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<Bar>, DataError> {
        let url = Self::chart_url(symbol, start, end)?;
        let resp: ChartResponse = self.get_json(symbol, &url)?;
        let bars = Self::parse_chart(symbol, resp)?;
        tracing::debug!(symbol, bars = bars.len(), "fetched history");
        Ok(bars)
    }

    fn fundamentals(&self, symbol: &str) -> Result<Fundamentals, DataError> {
        let data = self.summary(symbol, FUNDAMENTAL_MODULES)?;
        let mut fundamentals = Self::fundamentals_from(&data);

        if fundamentals.trailing_eps.is_none() && fundamentals.forward_eps.is_none() {
            match self.quote(symbol) {
                Ok(q) => fundamentals.eps_ttm = q.eps_trailing_twelve_months,
                Err(e) => tracing::debug!(symbol, error = %e, "quote lookup for TTM EPS failed"),
            }
        }
        Ok(fundamentals)
    }

    fn earnings_evidence(&self, symbol: &str) -> Result<EarningsEvidence, DataError> {
        let data = self.summary(symbol, EARNINGS_MODULES)?;
        let mut evidence = Self::evidence_from(&data);

        match self.earnings_dates(symbol) {
            Ok(dates) => evidence.history = dates,
            Err(e) => tracing::debug!(symbol, error = %e, "earnings dates lookup failed"),
        }

        match self.quote(symbol) {
            Ok(q) => evidence.next_timestamp = q.earnings_timestamp.and_then(timestamp_to_naive),
            Err(e) => tracing::debug!(symbol, error = %e, "quote lookup for earnings timestamp failed"),
        }
        Ok(evidence)
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chart(json: &str) -> ChartResponse {
        serde_json::from_str(json).unwrap()
    }

    fn summary(json: &str) -> SummaryResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn chart_url_encodes_caret_symbols() {
        let d = |m, day| NaiveDate::from_ymd_opt(2024, m, day).unwrap();
        let url = YahooProvider::chart_url("^VIX", d(1, 1), d(1, 2)).unwrap();
        let s = url.as_str();
        assert!(
            s.starts_with("https://query2.finance.yahoo.com/v8/finance/chart/%5EVIX?"),
            "{s}"
        );
        assert!(s.contains("period1=1704067200"));
        assert!(s.contains("period2=1704239999"));
        assert!(s.contains("interval=1d"));
    }

    #[test]
    fn parse_chart_skips_null_rows() {
        let resp = chart(
            r#"{"chart":{"result":[{"timestamp":[1704205800,1704292200,1704378600],
            "indicators":{"quote":[{"open":[187.15,null,182.09],"high":[188.44,null,183.09],
            "low":[183.89,null,180.88],"close":[185.64,null,181.91],
            "volume":[82488700,null,71983600]}]}}],"error":null}}"#,
        );
        let bars = YahooProvider::parse_chart("AAPL", resp).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(bars[1].close, 181.91);
        assert_eq!(bars[1].volume, 71_983_600);
    }

    #[test]
    fn parse_chart_not_found() {
        let resp = chart(
            r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#,
        );
        let err = YahooProvider::parse_chart("XXXX", resp).unwrap_err();
        assert!(matches!(err, DataError::SymbolNotFound { symbol } if symbol == "XXXX"));
    }

    #[test]
    fn parse_chart_without_timestamps_is_no_data() {
        let resp = chart(
            r#"{"chart":{"result":[{"indicators":{"quote":[{}]}}],"error":null}}"#,
        );
        let err = YahooProvider::parse_chart("SPY", resp).unwrap_err();
        assert!(matches!(err, DataError::NoData { .. }));
    }

    #[test]
    fn fundamentals_from_summary() {
        let resp = summary(
            r#"{"quoteSummary":{"result":[{
                "summaryDetail":{"marketCap":{"raw":2870000000000,"fmt":"2.87T"},
                    "trailingPE":{"raw":29.4},"forwardPE":{},"averageVolume":{"raw":58000000},
                    "previousClose":{"raw":184.25}},
                "defaultKeyStatistics":{"trailingEps":{"raw":6.43},"pegRatio":{"raw":2.1},
                    "priceToBook":{"raw":47.8},"shortPercentOfFloat":{"raw":0.0072}}
            }],"error":null}}"#,
        );
        let data = YahooProvider::parse_summary("AAPL", resp).unwrap();
        let f = YahooProvider::fundamentals_from(&data);
        assert_eq!(f.market_cap, Some(2.87e12));
        assert_eq!(f.trailing_pe, Some(29.4));
        assert_eq!(f.forward_pe, None);
        assert_eq!(f.eps(), Some(6.43));
        assert_eq!(f.previous_close, Some(184.25));
        assert_eq!(f.forward_eps, None);
    }

    #[test]
    fn evidence_from_summary() {
        let resp = summary(
            r#"{"quoteSummary":{"result":[{
                "calendarEvents":{"earnings":{"earningsDate":[{"raw":1722542400}],
                    "earningsCallDate":[]}}
            }],"error":null}}"#,
        );
        let data = YahooProvider::parse_summary("AAPL", resp).unwrap();
        let ev = YahooProvider::evidence_from(&data);
        assert_eq!(ev.listed_dates.len(), 1);
        assert_eq!(
            ev.listed_dates[0].date(),
            NaiveDate::from_ymd_opt(2024, 8, 1).unwrap()
        );
        assert!(ev.calendar_dates.is_empty());
        assert!(ev.history.is_empty());
        assert!(ev.next_timestamp.is_none());
    }

    #[test]
    fn summary_url_keeps_plain_symbols_and_query() {
        let url = YahooProvider::summary_url("BRK-B", EARNINGS_MODULES, "abc/def").unwrap();
        let s = url.as_str();
        assert!(s.starts_with("https://query2.finance.yahoo.com/v10/finance/quoteSummary/BRK-B?"));
        assert!(s.contains("modules=calendarEvents"));
        assert!(s.contains("crumb=abc%2Fdef"));
    }

    #[test]
    fn earnings_dates_are_report_dates() {
        let resp: VisualizationResponse = serde_json::from_str(
            r#"{"finance":{"result":[{"documents":[{
                "columns":[{"id":"ticker","label":"Symbol"},
                    {"id":"startdatetime","label":"Event Start Date"},
                    {"id":"eventtype","label":"Event Type"}],
                "rows":[["AAPL","2024-08-01T20:30:00Z","2"],
                    ["AAPL","2024-05-02T20:30:00.000Z","2"],
                    ["AAPL",1706820600000,"2"],
                    ["AAPL",null,"2"]]
            }]}],"error":null}}"#,
        )
        .unwrap();
        let dates = YahooProvider::parse_earnings_dates("AAPL", resp).unwrap();
        let days: Vec<NaiveDate> = dates.iter().map(|d| d.date()).collect();
        assert_eq!(
            days,
            vec![
                NaiveDate::from_ymd_opt(2024, 8, 1).unwrap(),
                NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
                NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            ]
        );
    }

    #[test]
    fn earnings_dates_without_start_column_is_format_change() {
        let resp: VisualizationResponse = serde_json::from_str(
            r#"{"finance":{"result":[{"documents":[{"columns":[{"id":"ticker"}],
                "rows":[["AAPL"]]}]}],"error":null}}"#,
        )
        .unwrap();
        assert!(matches!(
            YahooProvider::parse_earnings_dates("AAPL", resp),
            Err(DataError::ResponseFormatChanged(_))
        ));
    }

    #[test]
    fn earnings_query_asks_for_report_events() {
        let body = YahooProvider::earnings_dates_query("MSFT");
        assert_eq!(body["size"], EARNINGS_HISTORY_LIMIT);
        assert_eq!(body["query"]["operands"][0]["operands"][1], "MSFT");
        assert_eq!(body["sortType"], "DESC");
    }

    #[test]
    fn crumb_rate_limit_counts_against_breaker() {
        let breaker = Arc::new(CircuitBreaker::with_threshold(Duration::from_secs(60), 2));
        let provider = YahooProvider::new(breaker.clone()).unwrap();
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("retry-after", "120".parse().unwrap());

        let err = provider.crumb_failure(reqwest::StatusCode::TOO_MANY_REQUESTS, &headers);
        assert!(matches!(err, DataError::RateLimited { retry_after_secs: 120 }));
        assert!(breaker.is_allowed());

        let err = provider.crumb_failure(
            reqwest::StatusCode::SERVICE_UNAVAILABLE,
            &reqwest::header::HeaderMap::new(),
        );
        assert!(matches!(err, DataError::Other(_)));
        assert!(!breaker.is_allowed());
    }

    #[test]
    fn crumb_forbidden_trips_breaker() {
        let breaker = Arc::new(CircuitBreaker::new(Duration::from_secs(60)));
        let provider = YahooProvider::new(breaker.clone()).unwrap();
        let err = provider.crumb_failure(
            reqwest::StatusCode::FORBIDDEN,
            &reqwest::header::HeaderMap::new(),
        );
        assert!(matches!(err, DataError::CircuitBreakerTripped));
        assert!(!breaker.is_allowed());
    }

    #[test]
    fn summary_error_maps_to_not_found() {
        let resp = summary(
            r#"{"quoteSummary":{"result":null,"error":{"code":"Not Found","description":"Quote not found"}}}"#,
        );
        assert!(matches!(
            YahooProvider::parse_summary("NOPE", resp),
            Err(DataError::SymbolNotFound { .. })
        ));
    }
}

// =============================================================================
// Yahoo Finance chart API client
// =============================================================================
//
// Public endpoint, no signing:
//   GET {base}/v8/finance/chart/{symbol}?interval=1h&range=3mo
//
// The response carries parallel arrays (timestamp, open, high, low, close,
// volume) where any element may be null for a halted or missing sample.
// =============================================================================

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::market_data::provider::{MarketDataProvider, SeriesRequest};
use crate::market_data::series::PriceBar;

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

/// Yahoo rejects requests without a browser-like agent.
const USER_AGENT: &str = "Mozilla/5.0 (compatible; bandwatch/1.0)";

/// Chart-API client. Every request is bounded by `timeout`.
#[derive(Clone)]
pub struct YahooClient {
    base_url: String,
    client: reqwest::Client,
}

impl YahooClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, timeout)
    }

    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("failed to build reqwest client")?;

        let base_url = base_url.into();
        debug!(base_url = %base_url, timeout_ms = timeout.as_millis() as u64, "YahooClient initialised");

        Ok(Self { base_url, client })
    }

    fn chart_url(&self, symbol: &str, request: &SeriesRequest) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .with_context(|| format!("invalid base url {}", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("base url cannot carry a path: {}", self.base_url))?
            .extend(["v8", "finance", "chart", symbol]);
        url.query_pairs_mut()
            .append_pair("interval", &request.interval.to_string())
            .append_pair("range", &request.range);
        Ok(url)
    }
}

#[async_trait]
impl MarketDataProvider for YahooClient {
    fn name(&self) -> &str {
        "yahoo"
    }

    #[instrument(skip(self), name = "yahoo::fetch_series")]
    async fn fetch_series(&self, symbol: &str, request: &SeriesRequest) -> Result<Vec<PriceBar>> {
        let url = self.chart_url(symbol, request)?;

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .context("GET /v8/finance/chart request failed")?;

        let status = resp.status();
        let body = resp.text().await.context("failed to read chart response")?;

        if !status.is_success() {
            anyhow::bail!("Yahoo GET /v8/finance/chart/{symbol} returned {status}: {body}");
        }

        let bars = parse_chart(&body)?;
        debug!(symbol, interval = %request.interval, count = bars.len(), "chart fetched");
        Ok(bars)
    }
}

impl std::fmt::Debug for YahooClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YahooClient")
            .field("base_url", &self.base_url)
            .finish()
    }
}

// =============================================================================
// Response parsing
// =============================================================================

#[derive(Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

#[derive(Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<ChartError>,
}

#[derive(Deserialize)]
struct ChartError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: ChartIndicators,
}

#[derive(Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<Quote>,
}

#[derive(Deserialize, Default)]
struct Quote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

/// Parse a chart-API body into bars. Samples with any missing price are
/// skipped; an error payload from Yahoo becomes an `Err`.
fn parse_chart(body: &str) -> Result<Vec<PriceBar>> {
    let parsed: ChartResponse = serde_json::from_str(body).context("failed to parse chart JSON")?;

    if let Some(err) = parsed.chart.error {
        anyhow::bail!("Yahoo chart error {}: {}", err.code, err.description);
    }

    let Some(result) = parsed.chart.result.and_then(|r| r.into_iter().next()) else {
        return Ok(Vec::new());
    };

    let Some(quote) = result.indicators.quote.into_iter().next() else {
        return Ok(Vec::new());
    };

    let field = |v: &[Option<f64>], i: usize| v.get(i).copied().flatten();

    let mut bars = Vec::with_capacity(result.timestamp.len());
    for (i, &ts) in result.timestamp.iter().enumerate() {
        let (Some(open), Some(high), Some(low), Some(close)) = (
            field(&quote.open, i),
            field(&quote.high, i),
            field(&quote.low, i),
            field(&quote.close, i),
        ) else {
            continue;
        };

        let Some(timestamp) = DateTime::<Utc>::from_timestamp(ts, 0) else {
            continue;
        };

        let volume = field(&quote.volume, i)
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(|v| v as u64);

        bars.push(PriceBar::new(timestamp, open, high, low, close, volume));
    }

    Ok(bars)
}

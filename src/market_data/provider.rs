// =============================================================================
// Market-data provider boundary
// =============================================================================
//
// The monitoring loop only ever sees raw per-symbol bars through the
// `MarketDataProvider` trait. Three granularities are requested per symbol:
// the indicator source series, a daily series for lookback metrics and an
// intraday series for the session high/low. Only the source series is
// mandatory; the other two degrade to empty.
// =============================================================================

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::market_data::series::PriceBar;
use crate::types::Frequency;

/// One request to the upstream provider: bar interval plus lookback range in
/// provider notation (`"3mo"`, `"2y"`, `"1d"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesRequest {
    pub interval: Frequency,
    pub range: String,
}

impl SeriesRequest {
    pub fn new(interval: Frequency, range: impl Into<String>) -> Self {
        Self {
            interval,
            range: range.into(),
        }
    }
}

/// Which series to fetch for every symbol in a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchPlan {
    pub source: SeriesRequest,
    pub daily: SeriesRequest,
    pub intraday: SeriesRequest,
}

/// Source of OHLCV bars.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Fetch raw bars for `symbol`. Bars may be unsorted or contain gaps;
    /// an empty vec means the provider had nothing for this request.
    async fn fetch_series(
        &self,
        symbol: &str,
        request: &SeriesRequest,
    ) -> anyhow::Result<Vec<PriceBar>>;
}

/// Raw bars fetched for one symbol.
#[derive(Debug, Clone, Default)]
pub struct RawSymbolData {
    pub source: Vec<PriceBar>,
    pub daily: Vec<PriceBar>,
    pub intraday: Vec<PriceBar>,
}

/// Result of fetching the whole universe.
#[derive(Debug, Default)]
pub struct UniverseFetch {
    /// Symbols with a non-empty source series, in universe order.
    pub data: Vec<(String, RawSymbolData)>,
    /// Symbols whose source series errored or came back empty.
    pub failed: Vec<String>,
}

impl UniverseFetch {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Fetch every symbol's series with at most `concurrency` symbols in flight.
///
/// A symbol lands in `failed` when its source series is unusable; daily and
/// intraday errors only leave those series empty.
pub async fn fetch_universe(
    provider: &dyn MarketDataProvider,
    symbols: &[String],
    plan: &FetchPlan,
    concurrency: usize,
) -> UniverseFetch {
    let mut results: Vec<(usize, String, Option<RawSymbolData>)> =
        stream::iter(symbols.iter().cloned().enumerate())
            .map(|(idx, symbol): (usize, String)| async move {
                let data = fetch_symbol(provider, &symbol, plan).await;
                (idx, symbol, data)
            })
            .buffer_unordered(concurrency.max(1))
            .collect()
            .await;

    results.sort_by_key(|(idx, _, _)| *idx);

    let mut fetch = UniverseFetch::default();
    for (_, symbol, data) in results {
        match data {
            Some(d) => fetch.data.push((symbol, d)),
            None => fetch.failed.push(symbol),
        }
    }
    fetch
}

/// Symbols for which `request` yields no bars at all, in input order.
///
/// Used once at startup to flag delisted or misspelled tickers that would
/// otherwise fail quietly on every cycle.
pub async fn unlisted_symbols(
    provider: &dyn MarketDataProvider,
    symbols: &[String],
    request: &SeriesRequest,
    concurrency: usize,
) -> Vec<String> {
    let mut results: Vec<(usize, String, bool)> = stream::iter(symbols.iter().cloned().enumerate())
        .map(|(idx, symbol): (usize, String)| async move {
            let listed = match provider.fetch_series(&symbol, request).await {
                Ok(bars) => !bars.is_empty(),
                Err(e) => {
                    debug!(symbol = %symbol, error = %e, "symbol check request failed");
                    false
                }
            };
            (idx, symbol, listed)
        })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    results.sort_by_key(|(idx, _, _)| *idx);
    results
        .into_iter()
        .filter(|(_, _, listed)| !listed)
        .map(|(_, symbol, _)| symbol)
        .collect()
}

async fn fetch_symbol(
    provider: &dyn MarketDataProvider,
    symbol: &str,
    plan: &FetchPlan,
) -> Option<RawSymbolData> {
    let (source, daily, intraday) = tokio::join!(
        provider.fetch_series(symbol, &plan.source),
        provider.fetch_series(symbol, &plan.daily),
        provider.fetch_series(symbol, &plan.intraday),
    );

    let source = match source {
        Ok(bars) if !bars.is_empty() => bars,
        Ok(_) => {
            debug!(symbol, provider = provider.name(), "no source bars returned");
            return None;
        }
        Err(e) => {
            warn!(symbol, provider = provider.name(), error = %e, "source series fetch failed");
            return None;
        }
    };

    let daily = daily.unwrap_or_else(|e| {
        debug!(symbol, error = %e, "daily series fetch failed, metrics will be partial");
        Vec::new()
    });
    let intraday = intraday.unwrap_or_else(|e| {
        debug!(symbol, error = %e, "intraday series fetch failed, no day high/low");
        Vec::new()
    });

    Some(RawSymbolData {
        source,
        daily,
        intraday,
    })
}

// =============================================================================
// In-memory provider for tests
// =============================================================================
#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    /// Serves canned bars keyed by (symbol, interval). Optionally sleeps per
    /// request and records the peak number of concurrent requests.
    #[derive(Default)]
    pub struct StaticProvider {
        series: HashMap<(String, Frequency), Vec<PriceBar>>,
        delay: Option<Duration>,
        in_flight: AtomicUsize,
        pub peak_in_flight: AtomicUsize,
        pub requests: AtomicUsize,
    }

    impl StaticProvider {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_series(mut self, symbol: &str, interval: Frequency, bars: Vec<PriceBar>) -> Self {
            self.series.insert((symbol.to_string(), interval), bars);
            self
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }
    }

    #[async_trait]
    impl MarketDataProvider for StaticProvider {
        fn name(&self) -> &str {
            "static"
        }

        async fn fetch_series(
            &self,
            symbol: &str,
            request: &SeriesRequest,
        ) -> anyhow::Result<Vec<PriceBar>> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(self
                .series
                .get(&(symbol.to_string(), request.interval))
                .cloned()
                .unwrap_or_default())
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::testing::StaticProvider;
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use std::sync::atomic::Ordering;

    fn plan() -> FetchPlan {
        FetchPlan {
            source: SeriesRequest::new(Frequency::hours(1), "3mo"),
            daily: SeriesRequest::new(Frequency::days(1), "2y"),
            intraday: SeriesRequest::new(Frequency::minutes(1), "1d"),
        }
    }

    fn bars(n: i64) -> Vec<PriceBar> {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 2, 4, 0, 0).unwrap();
        (0..n)
            .map(|i| PriceBar::new(t0 + Duration::hours(i), 10.0, 11.0, 9.0, 10.5, None))
            .collect()
    }

    #[tokio::test]
    async fn fetch_universe_splits_failed_symbols() {
        let provider = StaticProvider::new()
            .with_series("AAA.NS", Frequency::hours(1), bars(5))
            .with_series("AAA.NS", Frequency::days(1), bars(2))
            .with_series("CCC.NS", Frequency::hours(1), bars(3));

        let symbols = vec!["AAA.NS".to_string(), "BBB.NS".to_string(), "CCC.NS".to_string()];
        let fetch = fetch_universe(&provider, &symbols, &plan(), 2).await;

        let names: Vec<_> = fetch.data.iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(names, vec!["AAA.NS", "CCC.NS"]);
        assert_eq!(fetch.failed, vec!["BBB.NS".to_string()]);

        let aaa = &fetch.data[0].1;
        assert_eq!(aaa.source.len(), 5);
        assert_eq!(aaa.daily.len(), 2);
        assert!(aaa.intraday.is_empty());
    }

    #[tokio::test]
    async fn fetch_universe_bounds_symbols_in_flight() {
        let symbols: Vec<String> = (0..10).map(|i| format!("S{i}.NS")).collect();
        let provider = symbols
            .iter()
            .fold(StaticProvider::new(), |p, s| p.with_series(s, Frequency::hours(1), bars(3)))
            .with_delay(std::time::Duration::from_millis(20));

        let fetch = fetch_universe(&provider, &symbols, &plan(), 2).await;
        assert_eq!(fetch.data.len(), 10);
        assert!(fetch.failed.is_empty());

        // Each symbol issues its three series requests together.
        let peak = provider.peak_in_flight.load(Ordering::SeqCst);
        assert!(peak <= 2 * 3, "peak in flight {peak}");
        assert!(peak > 3, "symbols never overlapped");
        assert_eq!(provider.requests.load(Ordering::SeqCst), 3 * symbols.len());
    }

    #[tokio::test]
    async fn unlisted_symbols_reports_tickers_without_history() {
        let provider = StaticProvider::new()
            .with_series("TCS.NS", Frequency::days(1), bars(3))
            .with_series("HAVELLS.NS", Frequency::days(1), bars(3));
        let symbols: Vec<String> = ["HAVELS.NS", "TCS.NS", "HAVELLS.NS", "TORNPHARM.NS"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let unlisted = unlisted_symbols(&provider, &symbols, &plan().daily, 3).await;
        assert_eq!(unlisted, vec!["HAVELS.NS".to_string(), "TORNPHARM.NS".to_string()]);
        assert_eq!(provider.requests.load(Ordering::SeqCst), symbols.len());
    }

    #[tokio::test]
    async fn fetch_universe_empty_when_provider_has_nothing() {
        let provider = StaticProvider::new();
        let symbols = vec!["AAA.NS".to_string()];
        let fetch = fetch_universe(&provider, &symbols, &plan(), 4).await;
        assert!(fetch.is_empty());
        assert_eq!(fetch.failed.len(), 1);
    }
}

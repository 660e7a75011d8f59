// =============================================================================
// Monitoring Loop: one cycle lock, periodic and manual triggers
// =============================================================================
//
// A cycle walks the whole universe through
//
//   Fetching -> Preparing -> Computing -> Classifying -> Emitting -> Idle
//
// while holding the cycle lock. Periodic and manual triggers both take the
// lock, so cycles never interleave; a manual request that arrives mid-cycle
// waits and then runs its own full cycle.
//
// Symbols that cannot be evaluated are skipped. A cycle with no usable data
// at all is aborted with `CycleError::FetchUnavailable`.
// =============================================================================

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::alerts::{classify, PushMessage, RefreshAck};
use crate::api::broadcast::AlertBroadcaster;
use crate::market_data::{fetch_universe, MarketDataProvider};
use crate::monitor::pipeline;
use crate::runtime_config::RuntimeConfig;

// =============================================================================
// Types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleTrigger {
    Periodic,
    Manual,
}

impl fmt::Display for CycleTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Periodic => write!(f, "periodic"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleStage {
    Idle,
    Fetching,
    Preparing,
    Computing,
    Classifying,
    Emitting,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CycleError {
    /// Nothing usable came back from the provider (including a timeout).
    #[error("market data unavailable: {0}")]
    FetchUnavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CycleOutcome {
    Completed,
    Aborted { reason: String },
}

/// Summary of one cycle, kept as the "last cycle" for the status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    pub cycle_id: Uuid,
    pub trigger: CycleTrigger,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub symbols_requested: usize,
    pub symbols_fetched: usize,
    pub symbols_evaluated: usize,
    pub symbols_skipped: usize,
    pub alerts_emitted: usize,
    pub outcome: CycleOutcome,
}

impl CycleReport {
    fn begin(cycle_id: Uuid, trigger: CycleTrigger, symbols_requested: usize) -> Self {
        let now = Utc::now();
        Self {
            cycle_id,
            trigger,
            started_at: now,
            finished_at: now,
            symbols_requested,
            symbols_fetched: 0,
            symbols_evaluated: 0,
            symbols_skipped: 0,
            alerts_emitted: 0,
            outcome: CycleOutcome::Completed,
        }
    }
}

/// Cycle entry/exit counters. Equal whenever no cycle is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CycleCounters {
    pub entries: u64,
    pub exits: u64,
}

// =============================================================================
// Monitor
// =============================================================================

pub struct Monitor {
    config: Arc<RuntimeConfig>,
    provider: Arc<dyn MarketDataProvider>,
    broadcaster: AlertBroadcaster,
    cycle_lock: Mutex<()>,
    stage: RwLock<CycleStage>,
    last_report: RwLock<Option<CycleReport>>,
    entries: AtomicU64,
    exits: AtomicU64,
}

/// Held for the duration of a cycle; records the exit even if the cycle
/// future is dropped part-way.
struct CycleGuard<'a> {
    monitor: &'a Monitor,
    _lock: MutexGuard<'a, ()>,
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        *self.monitor.stage.write() = CycleStage::Idle;
        self.monitor.exits.fetch_add(1, Ordering::SeqCst);
    }
}

impl Monitor {
    pub fn new(
        config: Arc<RuntimeConfig>,
        provider: Arc<dyn MarketDataProvider>,
        broadcaster: AlertBroadcaster,
    ) -> Self {
        Self {
            config,
            provider,
            broadcaster,
            cycle_lock: Mutex::new(()),
            stage: RwLock::new(CycleStage::Idle),
            last_report: RwLock::new(None),
            entries: AtomicU64::new(0),
            exits: AtomicU64::new(0),
        }
    }

    pub fn stage(&self) -> CycleStage {
        *self.stage.read()
    }

    pub fn last_report(&self) -> Option<CycleReport> {
        self.last_report.read().clone()
    }

    pub fn counters(&self) -> CycleCounters {
        // Read exits first so a cycle finishing in between cannot make
        // exits appear ahead of entries.
        let exits = self.exits.load(Ordering::SeqCst);
        let entries = self.entries.load(Ordering::SeqCst);
        CycleCounters { entries, exits }
    }

    /// Run one full cycle under the cycle lock.
    pub async fn run_cycle(&self, trigger: CycleTrigger) -> Result<CycleReport, CycleError> {
        let lock = self.cycle_lock.lock().await;
        self.entries.fetch_add(1, Ordering::SeqCst);
        let _guard = CycleGuard {
            monitor: self,
            _lock: lock,
        };

        let cycle_id = Uuid::new_v4();
        let span = info_span!("cycle", id = %cycle_id, trigger = %trigger);
        let mut report = CycleReport::begin(cycle_id, trigger, self.config.symbols.len());

        let result = self.execute(&mut report).instrument(span).await;

        report.finished_at = Utc::now();
        if let Err(e) = &result {
            report.outcome = CycleOutcome::Aborted {
                reason: e.to_string(),
            };
        }
        *self.last_report.write() = Some(report.clone());

        result.map(|()| report)
    }

    /// Periodic producer: a cycle immediately, then one per interval measured
    /// from the end of the previous cycle. Never returns.
    pub async fn run_periodic(self: Arc<Self>) {
        let interval = self.config.cycle_interval();
        info!(interval_mins = self.config.cycle_interval_mins, "periodic monitor started");

        loop {
            if let Err(e) = self.run_cycle(CycleTrigger::Periodic).await {
                warn!(error = %e, "periodic cycle aborted, waiting for next schedule");
            }
            tokio::time::sleep(interval).await;
        }
    }

    /// Manual producer: waits for any running cycle, runs a fresh one and
    /// reports the outcome.
    pub async fn manual_refresh(&self) -> RefreshAck {
        match self.run_cycle(CycleTrigger::Manual).await {
            Ok(_) => RefreshAck::success(),
            Err(e) => RefreshAck::failure(e.to_string()),
        }
    }

    fn set_stage(&self, stage: CycleStage) {
        *self.stage.write() = stage;
        debug!(?stage, "cycle stage");
    }

    async fn execute(&self, report: &mut CycleReport) -> Result<(), CycleError> {
        let config = &self.config;

        // --- Fetching --------------------------------------------------------
        self.set_stage(CycleStage::Fetching);
        info!(symbols = config.symbols.len(), provider = self.provider.name(), "cycle started");

        let fetch = tokio::time::timeout(
            config.fetch_timeout(),
            fetch_universe(
                self.provider.as_ref(),
                &config.symbols,
                &config.fetch_plan(),
                config.fetch_concurrency,
            ),
        )
        .await
        .map_err(|_| {
            CycleError::FetchUnavailable(format!(
                "fetch timed out after {}s",
                config.fetch_timeout_secs
            ))
        })?;

        if fetch.is_empty() {
            return Err(CycleError::FetchUnavailable(format!(
                "no data returned for any of {} symbols",
                config.symbols.len()
            )));
        }
        report.symbols_fetched = fetch.data.len();
        report.symbols_skipped = fetch.failed.len();
        if !fetch.failed.is_empty() {
            info!(count = fetch.failed.len(), symbols = ?fetch.failed, "symbols without source data");
        }

        // --- Preparing -------------------------------------------------------
        self.set_stage(CycleStage::Preparing);
        let prepared: Vec<_> = fetch
            .data
            .into_iter()
            .map(|(symbol, raw)| pipeline::prepare(symbol, raw))
            .collect();

        // --- Computing -------------------------------------------------------
        self.set_stage(CycleStage::Computing);
        let now = Utc::now();
        let mut snapshots = Vec::with_capacity(prepared.len());
        for p in &prepared {
            match pipeline::compute(p, config, now) {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(reason) => {
                    info!(symbol = %p.symbol, %reason, "symbol skipped");
                    report.symbols_skipped += 1;
                }
            }
        }
        report.symbols_evaluated = snapshots.len();

        // --- Classifying -----------------------------------------------------
        self.set_stage(CycleStage::Classifying);
        let events: Vec<_> = snapshots
            .iter()
            .flat_map(|s| classify(s, &config.percent_b_tiers, &config.rsi_tiers))
            .collect();

        // --- Emitting --------------------------------------------------------
        self.set_stage(CycleStage::Emitting);
        for event in &events {
            let receivers = self.broadcaster.broadcast(&PushMessage::alert(event));
            info!(
                symbol = %event.symbol,
                tier = %event.tier,
                trigger = event.trigger.key(),
                percent_b = event.percent_b,
                rsi = event.rsi,
                receivers,
                "alert emitted"
            );
        }
        report.alerts_emitted = events.len();

        info!(
            fetched = report.symbols_fetched,
            evaluated = report.symbols_evaluated,
            skipped = report.symbols_skipped,
            alerts = report.alerts_emitted,
            "cycle complete"
        );
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::market_data::provider::testing::StaticProvider;
    use crate::monitor::pipeline::fixtures::{crash_hourly, flat_hourly, oscillating_hourly};
    use crate::types::Frequency;

    fn config(symbols: &[&str]) -> RuntimeConfig {
        RuntimeConfig {
            symbols: symbols.iter().map(|s| s.to_string()).collect(),
            ..RuntimeConfig::default()
        }
    }

    fn monitor(cfg: RuntimeConfig, provider: StaticProvider) -> Arc<Monitor> {
        Arc::new(Monitor::new(
            Arc::new(cfg),
            Arc::new(provider),
            AlertBroadcaster::new(64),
        ))
    }

    fn assert_send<T: Send>(_: &T) {}

    #[test]
    fn cycle_futures_are_send() {
        // Spawned by main and by the API handlers.
        let m = monitor(config(&["CALM.NS"]), StaticProvider::new());
        assert_send(&m.run_cycle(CycleTrigger::Periodic));
        assert_send(&m.manual_refresh());
        assert_send(&m.clone().run_periodic());
    }

    #[tokio::test]
    async fn crash_emits_green_alert() {
        let provider = StaticProvider::new()
            .with_series("CRASH.NS", Frequency::hours(1), crash_hourly(60))
            .with_series("CALM.NS", Frequency::hours(1), oscillating_hourly(60))
            .with_series("FLAT.NS", Frequency::hours(1), flat_hourly(60));
        let m = monitor(config(&["CRASH.NS", "CALM.NS", "FLAT.NS", "GONE.NS"]), provider);
        let mut rx = m.broadcaster.subscribe();

        let report = m.run_cycle(CycleTrigger::Periodic).await.unwrap();
        assert_eq!(report.symbols_requested, 4);
        assert_eq!(report.symbols_fetched, 3);
        assert_eq!(report.symbols_evaluated, 2);
        // GONE.NS had no data, FLAT.NS has a degenerate band.
        assert_eq!(report.symbols_skipped, 2);
        assert!(report.alerts_emitted >= 1);
        assert_eq!(report.outcome, CycleOutcome::Completed);

        let mut frames = Vec::new();
        while let Ok(text) = rx.try_recv() {
            frames.push(serde_json::from_str::<serde_json::Value>(&text).unwrap());
        }
        assert_eq!(frames.len(), report.alerts_emitted);
        let crash = frames
            .iter()
            .find(|f| f["data"]["symbol"] == "CRASH.NS" && f["data"]["trigger"] == "Bollinger_%b")
            .expect("crash alert");
        assert_eq!(crash["event"], "new_alert");
        assert_eq!(crash["data"]["type"], "green");

        assert_eq!(m.stage(), CycleStage::Idle);
        assert_eq!(m.last_report(), Some(report));
    }

    #[tokio::test]
    async fn total_fetch_failure_aborts_cycle() {
        let m = monitor(config(&["A.NS", "B.NS"]), StaticProvider::new());

        let err = m.run_cycle(CycleTrigger::Periodic).await.unwrap_err();
        assert!(matches!(err, CycleError::FetchUnavailable(_)));

        let report = m.last_report().unwrap();
        assert!(matches!(report.outcome, CycleOutcome::Aborted { .. }));
        assert_eq!(m.counters(), CycleCounters { entries: 1, exits: 1 });
        assert_eq!(m.stage(), CycleStage::Idle);

        let ack = m.manual_refresh().await;
        assert!(!ack.is_success());
        assert!(ack.message.unwrap().contains("no data returned"));
    }

    #[tokio::test]
    async fn fetch_timeout_aborts_cycle() {
        let mut cfg = config(&["SLOW.NS"]);
        cfg.fetch_timeout_secs = 1;
        let provider = StaticProvider::new()
            .with_series("SLOW.NS", Frequency::hours(1), oscillating_hourly(40))
            .with_delay(Duration::from_secs(3));
        let m = monitor(cfg, provider);

        let err = m.run_cycle(CycleTrigger::Manual).await.unwrap_err();
        assert_eq!(err, CycleError::FetchUnavailable("fetch timed out after 1s".into()));
        assert_eq!(m.counters(), CycleCounters { entries: 1, exits: 1 });
    }

    #[tokio::test]
    async fn manual_refresh_acknowledges_success() {
        let provider =
            StaticProvider::new().with_series("CALM.NS", Frequency::hours(1), oscillating_hourly(40));
        let m = monitor(config(&["CALM.NS"]), provider);
        assert_eq!(m.manual_refresh().await, RefreshAck::success());
        assert_eq!(m.last_report().unwrap().trigger, CycleTrigger::Manual);
    }

    #[tokio::test]
    async fn concurrent_cycles_never_interleave() {
        let provider = StaticProvider::new()
            .with_series("CALM.NS", Frequency::hours(1), oscillating_hourly(40))
            .with_delay(Duration::from_millis(200));
        let m = monitor(config(&["CALM.NS"]), provider);

        let periodic = tokio::spawn({
            let m = m.clone();
            async move { m.run_cycle(CycleTrigger::Periodic).await }
        });

        // Let the periodic cycle take the lock, then fire a manual one.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(m.stage(), CycleStage::Fetching);
        assert_eq!(m.counters(), CycleCounters { entries: 1, exits: 0 });

        let manual = tokio::spawn({
            let m = m.clone();
            async move { m.manual_refresh().await }
        });

        // The manual request waits behind the running cycle.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(m.counters().entries, 1);

        let first = periodic.await.unwrap().unwrap();
        assert!(manual.await.unwrap().is_success());
        let second = m.last_report().unwrap();

        assert_eq!(second.trigger, CycleTrigger::Manual);
        assert!(first.finished_at <= second.started_at);
        assert_eq!(m.counters(), CycleCounters { entries: 2, exits: 2 });
    }
}

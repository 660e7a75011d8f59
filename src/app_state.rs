// =============================================================================
// Central Application State
// =============================================================================
//
// Ties the monitor, the push-channel broadcaster and the effective config
// together for the HTTP and WebSocket handlers. Shared via `Arc<AppState>`.
// =============================================================================

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use crate::api::broadcast::AlertBroadcaster;
use crate::market_data::MarketDataProvider;
use crate::monitor::cycle::{CycleCounters, CycleReport, CycleStage};
use crate::monitor::Monitor;
use crate::runtime_config::RuntimeConfig;

pub struct AppState {
    pub config: Arc<RuntimeConfig>,
    pub monitor: Arc<Monitor>,
    pub broadcaster: AlertBroadcaster,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: RuntimeConfig, provider: Arc<dyn MarketDataProvider>) -> Self {
        let config = Arc::new(config);
        let broadcaster = AlertBroadcaster::new(config.push_channel_capacity);
        let monitor = Arc::new(Monitor::new(config.clone(), provider, broadcaster.clone()));
        Self {
            config,
            monitor,
            broadcaster,
            start_time: Instant::now(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Current monitor status for the dashboard.
    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot {
            stage: self.monitor.stage(),
            counters: self.monitor.counters(),
            universe_size: self.config.symbols.len(),
            subscribers: self.broadcaster.subscriber_count(),
            last_cycle: self.monitor.last_report(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub stage: CycleStage,
    pub counters: CycleCounters,
    pub universe_size: usize,
    pub subscribers: usize,
    pub last_cycle: Option<CycleReport>,
}

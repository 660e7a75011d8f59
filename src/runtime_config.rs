// =============================================================================
// Runtime Configuration: indicator, tier and scheduling settings
// =============================================================================
//
// Every tunable of the monitor lives here: the symbol universe, the three
// fetch granularities, band and RSI parameters, both tier tables, lookback
// windows and cycle timing.
//
// All fields carry `#[serde(default = ...)]` so a partial JSON file only
// overrides what it names.
// =============================================================================

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::alerts::classifier::TierThresholds;
use crate::market_data::{FetchPlan, SeriesRequest};
use crate::metrics::LookbackWindow;
use crate::types::{Frequency, MaMode};
use crate::universe::DEFAULT_UNIVERSE;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_symbols() -> Vec<String> {
    DEFAULT_UNIVERSE.iter().map(|s| s.to_string()).collect()
}

fn default_source() -> SeriesRequest {
    SeriesRequest::new(Frequency::hours(1), "3mo")
}

fn default_daily() -> SeriesRequest {
    SeriesRequest::new(Frequency::days(1), "2y")
}

fn default_intraday() -> SeriesRequest {
    SeriesRequest::new(Frequency::minutes(1), "1d")
}

fn default_percent_b_tiers() -> TierThresholds {
    TierThresholds::PERCENT_B
}

fn default_rsi_tiers() -> TierThresholds {
    TierThresholds::RSI
}

fn default_lookback_windows() -> Vec<LookbackWindow> {
    vec![
        LookbackWindow::new("1D", 1),
        LookbackWindow::new("5D", 5),
        LookbackWindow::new("1M", 20),
        LookbackWindow::new("1Y", 252),
    ]
}

/// One week.
const MAX_CYCLE_INTERVAL_MINS: u64 = 7 * 24 * 60;

fn default_cycle_interval_mins() -> u64 {
    60
}

fn default_fetch_timeout_secs() -> u64 {
    300
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_fetch_concurrency() -> usize {
    8
}

fn default_push_channel_capacity() -> usize {
    256
}

fn default_check_symbols_on_startup() -> bool {
    true
}

fn default_band_frequency() -> Frequency {
    Frequency::hours(2)
}

fn default_band_length() -> usize {
    20
}

fn default_num_std() -> f64 {
    2.0
}

fn default_rsi_frequency() -> Frequency {
    Frequency::hours(1)
}

fn default_rsi_period() -> usize {
    14
}

// =============================================================================
// BandParams / RsiParams
// =============================================================================

/// Volatility band settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandParams {
    /// Frequency the source series is resampled to before banding.
    #[serde(default = "default_band_frequency")]
    pub frequency: Frequency,

    /// Rolling window length L.
    #[serde(default = "default_band_length")]
    pub length: usize,

    /// Deviation multiplier k.
    #[serde(default = "default_num_std")]
    pub num_std: f64,

    #[serde(default)]
    pub ma_mode: MaMode,
}

impl Default for BandParams {
    fn default() -> Self {
        Self {
            frequency: default_band_frequency(),
            length: default_band_length(),
            num_std: default_num_std(),
            ma_mode: MaMode::default(),
        }
    }
}

/// RSI settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RsiParams {
    #[serde(default = "default_rsi_frequency")]
    pub frequency: Frequency,

    #[serde(default = "default_rsi_period")]
    pub period: usize,
}

impl Default for RsiParams {
    fn default() -> Self {
        Self {
            frequency: default_rsi_frequency(),
            period: default_rsi_period(),
        }
    }
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level configuration for the monitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    // --- Universe -----------------------------------------------------------

    /// Tickers evaluated every cycle.
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,

    // --- Fetch granularities ------------------------------------------------

    /// Series the indicators are computed from.
    #[serde(default = "default_source")]
    pub source: SeriesRequest,

    /// Daily bars for the lookback metrics.
    #[serde(default = "default_daily")]
    pub daily: SeriesRequest,

    /// Intraday bars for the session high/low and current price.
    #[serde(default = "default_intraday")]
    pub intraday: SeriesRequest,

    // --- Indicators ---------------------------------------------------------

    #[serde(default)]
    pub band: BandParams,

    #[serde(default)]
    pub rsi: RsiParams,

    // --- Alert tiers --------------------------------------------------------

    #[serde(default = "default_percent_b_tiers")]
    pub percent_b_tiers: TierThresholds,

    #[serde(default = "default_rsi_tiers")]
    pub rsi_tiers: TierThresholds,

    #[serde(default = "default_lookback_windows")]
    pub lookback_windows: Vec<LookbackWindow>,

    // --- Scheduling ---------------------------------------------------------

    /// Sleep between the end of one periodic cycle and the start of the next.
    #[serde(default = "default_cycle_interval_mins")]
    pub cycle_interval_mins: u64,

    /// Upper bound on fetching the whole universe.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Per-HTTP-request timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Symbols fetched concurrently.
    #[serde(default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,

    /// Buffered push messages per subscriber before it starts lagging.
    #[serde(default = "default_push_channel_capacity")]
    pub push_channel_capacity: usize,

    /// Probe every symbol's daily history once at startup and log the ones
    /// the provider does not list.
    #[serde(default = "default_check_symbols_on_startup")]
    pub check_symbols_on_startup: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            symbols: default_symbols(),
            source: default_source(),
            daily: default_daily(),
            intraday: default_intraday(),
            band: BandParams::default(),
            rsi: RsiParams::default(),
            percent_b_tiers: default_percent_b_tiers(),
            rsi_tiers: default_rsi_tiers(),
            lookback_windows: default_lookback_windows(),
            cycle_interval_mins: default_cycle_interval_mins(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            fetch_concurrency: default_fetch_concurrency(),
            push_channel_capacity: default_push_channel_capacity(),
            check_symbols_on_startup: default_check_symbols_on_startup(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let mut config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;
        config.normalize_symbols();

        info!(
            path = %path.display(),
            symbols = config.symbols.len(),
            band = %config.band.frequency,
            rsi = %config.rsi.frequency,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Replace the universe with a comma-separated list, e.g. from the
    /// environment.
    pub fn set_symbols_from_list(&mut self, list: &str) {
        self.symbols = list.split(',').map(str::to_string).collect();
        self.normalize_symbols();
    }

    /// Trim, uppercase and dedup the universe, keeping first occurrences.
    pub fn normalize_symbols(&mut self) {
        let mut seen = HashSet::new();
        self.symbols = self
            .symbols
            .iter()
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .filter(|s| seen.insert(s.clone()))
            .collect();
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        ensure!(!self.symbols.is_empty(), "symbol universe is empty");
        ensure!(self.band.length > 0, "band length must be positive");
        ensure!(
            self.band.num_std.is_finite() && self.band.num_std > 0.0,
            "band deviation multiplier must be positive, got {}",
            self.band.num_std
        );
        ensure!(self.rsi.period > 0, "RSI period must be positive");
        ensure!(
            self.band.frequency.as_secs() >= self.source.interval.as_secs(),
            "band frequency {} is finer than the source interval {}",
            self.band.frequency,
            self.source.interval
        );
        ensure!(
            self.rsi.frequency.as_secs() >= self.source.interval.as_secs(),
            "RSI frequency {} is finer than the source interval {}",
            self.rsi.frequency,
            self.source.interval
        );
        ensure!(
            self.percent_b_tiers.is_ordered(),
            "%b tier thresholds must be finite and ordered: {:?}",
            self.percent_b_tiers
        );
        ensure!(
            self.rsi_tiers.is_ordered(),
            "RSI tier thresholds must be finite and ordered: {:?}",
            self.rsi_tiers
        );
        ensure!(
            self.lookback_windows.iter().all(|w| w.periods > 0 && !w.label.is_empty()),
            "lookback windows need a label and a positive period"
        );
        ensure!(
            (1..=MAX_CYCLE_INTERVAL_MINS).contains(&self.cycle_interval_mins),
            "cycle interval must be between 1 and {MAX_CYCLE_INTERVAL_MINS} minutes, got {}",
            self.cycle_interval_mins
        );
        ensure!(self.fetch_timeout_secs > 0, "fetch timeout must be positive");
        ensure!(self.fetch_concurrency > 0, "fetch concurrency must be positive");
        ensure!(self.push_channel_capacity > 0, "push channel capacity must be positive");
        Ok(())
    }

    pub fn fetch_plan(&self) -> FetchPlan {
        FetchPlan {
            source: self.source.clone(),
            daily: self.daily.clone(),
            intraday: self.intraday.clone(),
        }
    }

    pub fn cycle_interval(&self) -> Duration {
        Duration::from_secs(self.cycle_interval_mins.saturating_mul(60))
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

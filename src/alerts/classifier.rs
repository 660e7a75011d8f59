// =============================================================================
// Alert Classifier: tiered threshold crossings for %b and RSI
// =============================================================================
//
// Each indicator has its own four-threshold table. A value falls in at most
// one tier; the ranges are written out explicitly rather than relying on
// branch order:
//
//   x <  extreme_low                 => green  (extreme low)
//   extreme_low <= x < low           => blue   (low)
//   high < x <= extreme_high         => orange (high)
//   x >  extreme_high                => red    (extreme high)
//
// The %b and RSI tables are evaluated independently, so one snapshot yields
// zero, one or two events.
// =============================================================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::metrics::SymbolMetrics;
use crate::types::AlertTier;

/// Latest indicator values for one symbol, as handed to [`classify`].
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSnapshot {
    pub symbol: String,
    pub percent_b: f64,
    pub rsi: f64,
    /// Current price: last intraday close, else last daily close, else last
    /// source close.
    pub price: Option<f64>,
    pub metrics: SymbolMetrics,
    pub evaluated_at: DateTime<Utc>,
}

/// Threshold table for one indicator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierThresholds {
    pub extreme_low: f64,
    pub low: f64,
    pub high: f64,
    pub extreme_high: f64,
}

impl TierThresholds {
    /// Default %b table.
    pub const PERCENT_B: Self = Self {
        extreme_low: -10.0,
        low: 0.0,
        high: 100.0,
        extreme_high: 120.0,
    };

    /// Default RSI table.
    pub const RSI: Self = Self {
        extreme_low: 5.0,
        low: 10.0,
        high: 90.0,
        extreme_high: 95.0,
    };

    /// Thresholds must be finite and non-decreasing for the tiers to be
    /// disjoint.
    pub fn is_ordered(&self) -> bool {
        let all = [self.extreme_low, self.low, self.high, self.extreme_high];
        all.iter().all(|v| v.is_finite()) && all.windows(2).all(|w| w[0] <= w[1])
    }

    /// Tier for `value`, or `None` inside the neutral zone. Non-finite values
    /// never match.
    pub fn classify(&self, value: f64) -> Option<AlertTier> {
        if !value.is_finite() {
            return None;
        }
        if value < self.extreme_low {
            Some(AlertTier::Green)
        } else if self.extreme_low <= value && value < self.low {
            Some(AlertTier::Blue)
        } else if value > self.extreme_high {
            Some(AlertTier::Red)
        } else if self.high < value && value <= self.extreme_high {
            Some(AlertTier::Orange)
        } else {
            None
        }
    }

    fn boundary(&self, tier: AlertTier) -> f64 {
        match tier {
            AlertTier::Green => self.extreme_low,
            AlertTier::Blue => self.low,
            AlertTier::Orange => self.high,
            AlertTier::Red => self.extreme_high,
        }
    }
}

/// Which indicator fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlertTrigger {
    #[serde(rename = "Bollinger_%b")]
    PercentB,
    #[serde(rename = "RSI")]
    Rsi,
}

impl AlertTrigger {
    /// Payload key of the triggering metric.
    pub fn key(&self) -> &'static str {
        match self {
            Self::PercentB => "Bollinger_%b",
            Self::Rsi => "RSI",
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Self::PercentB => "Bollinger %b",
            Self::Rsi => "RSI",
        }
    }

    fn unit(&self) -> &'static str {
        match self {
            Self::PercentB => "%",
            Self::Rsi => "",
        }
    }
}

/// One threshold crossing for one symbol in one cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertEvent {
    pub symbol: String,
    pub tier: AlertTier,
    pub trigger: AlertTrigger,
    pub message: String,
    pub percent_b: f64,
    pub rsi: f64,
    /// Current price.
    pub value: Option<f64>,
    pub metrics: Vec<(String, f64)>,
    pub time: DateTime<Utc>,
}

/// Map a snapshot to its alert events: the %b event (if any) first, then the
/// RSI event (if any).
///
/// A snapshot whose %b or RSI is not finite is skipped entirely.
pub fn classify(
    snapshot: &IndicatorSnapshot,
    percent_b_tiers: &TierThresholds,
    rsi_tiers: &TierThresholds,
) -> Vec<AlertEvent> {
    if !snapshot.percent_b.is_finite() || !snapshot.rsi.is_finite() {
        return Vec::new();
    }

    let checks = [
        (AlertTrigger::PercentB, snapshot.percent_b, percent_b_tiers),
        (AlertTrigger::Rsi, snapshot.rsi, rsi_tiers),
    ];

    checks
        .into_iter()
        .filter_map(|(trigger, value, table)| {
            let tier = table.classify(value)?;
            Some(AlertEvent {
                symbol: snapshot.symbol.clone(),
                tier,
                trigger,
                message: alert_message(&snapshot.symbol, trigger, tier, table.boundary(tier)),
                percent_b: snapshot.percent_b,
                rsi: snapshot.rsi,
                value: snapshot.price,
                metrics: snapshot.metrics.named(),
                time: snapshot.evaluated_at,
            })
        })
        .collect()
}

fn alert_message(symbol: &str, trigger: AlertTrigger, tier: AlertTier, boundary: f64) -> String {
    let name = trigger.describe();
    let unit = trigger.unit();
    match tier {
        AlertTier::Green | AlertTier::Blue => {
            format!("ALERT: {name} for {symbol} has dropped below {boundary}{unit}!")
        }
        AlertTier::Orange | AlertTier::Red => {
            format!("WARNING: {name} for {symbol} is above {boundary}{unit}!")
        }
    }
}

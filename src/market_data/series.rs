use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Frequency, Unavailable};

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// One OHLCV sample of a symbol's market activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    #[serde(default)]
    pub volume: Option<u64>,
    /// Mean of open/high/low/close. Populated by [`Series::prepare`].
    #[serde(default)]
    pub ohlc4: f64,
}

impl PriceBar {
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: Option<u64>,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
            ohlc4: (open + high + low + close) / 4.0,
        }
    }

    fn is_finite(&self) -> bool {
        self.open.is_finite() && self.high.is_finite() && self.low.is_finite() && self.close.is_finite()
    }
}

/// Time-ordered bars for one symbol at one sampling frequency.
///
/// A series is allowed to be empty or shorter than any indicator window;
/// consumers check [`Series::require_len`] before computing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    bars: Vec<PriceBar>,
}

impl Series {
    /// Normalise a raw series: drop bars with non-finite prices, sort by
    /// timestamp, collapse duplicate timestamps (the later bar wins) and
    /// recompute OHLC4.
    pub fn prepare(raw: Vec<PriceBar>) -> Self {
        let mut bars: Vec<PriceBar> = raw.into_iter().filter(PriceBar::is_finite).collect();

        // Stable sort keeps provider order among equal timestamps, so the
        // last one seen is the last one in its run.
        bars.sort_by_key(|b| b.timestamp);

        let mut out: Vec<PriceBar> = Vec::with_capacity(bars.len());
        for mut bar in bars {
            bar.ohlc4 = (bar.open + bar.high + bar.low + bar.close) / 4.0;
            match out.last_mut() {
                Some(last) if last.timestamp == bar.timestamp => *last = bar,
                _ => out.push(bar),
            }
        }

        Self { bars: out }
    }

    /// Aggregate into buckets of `freq`.
    ///
    /// open = first, high = max, low = min, close = last, OHLC4 = mean of the
    /// bucket's OHLC4, volume = sum. Buckets with no source bars are not
    /// emitted. Expects a prepared (sorted) series.
    pub fn resample(&self, freq: Frequency) -> Series {
        let mut out: Vec<PriceBar> = Vec::new();
        let mut ohlc4_sum = 0.0;
        let mut count = 0usize;

        for bar in &self.bars {
            let start = freq.bucket_start(bar.timestamp);

            match out.last_mut() {
                Some(current) if current.timestamp == start => {
                    current.high = current.high.max(bar.high);
                    current.low = current.low.min(bar.low);
                    current.close = bar.close;
                    current.volume = match (current.volume, bar.volume) {
                        (Some(a), Some(b)) => Some(a.saturating_add(b)),
                        (a, b) => a.or(b),
                    };
                    ohlc4_sum += bar.ohlc4;
                    count += 1;
                }
                _ => {
                    if let Some(prev) = out.last_mut() {
                        prev.ohlc4 = ohlc4_sum / count as f64;
                    }
                    out.push(PriceBar {
                        timestamp: start,
                        ..bar.clone()
                    });
                    ohlc4_sum = bar.ohlc4;
                    count = 1;
                }
            }
        }

        if let Some(last) = out.last_mut() {
            last.ohlc4 = ohlc4_sum / count as f64;
        }

        Series { bars: out }
    }

    /// Fail with [`Unavailable::InsufficientHistory`] when shorter than `need`.
    pub fn require_len(&self, series: &'static str, need: usize) -> Result<&Self, Unavailable> {
        if self.bars.len() < need {
            return Err(Unavailable::InsufficientHistory {
                series,
                have: self.bars.len(),
                need,
            });
        }
        Ok(self)
    }

    pub fn bars(&self) -> &[PriceBar] {
        &self.bars
    }

    pub fn last(&self) -> Option<&PriceBar> {
        self.bars.last()
    }

    pub fn ohlc4(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.ohlc4).collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

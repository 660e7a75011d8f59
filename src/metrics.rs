// =============================================================================
// Auxiliary per-symbol metrics
// =============================================================================
//
// - Day high / low from the latest intraday session.
// - For each lookback window W (trading days), the change of the latest daily
//   close against the close W sessions earlier, plus that session's high/low.
//
// Windows the daily history cannot satisfy are omitted, never zero-filled.
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::market_data::Series;

/// A named lookback window, e.g. `1M` = 20 trading periods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookbackWindow {
    pub label: String,
    pub periods: usize,
}

impl LookbackWindow {
    pub fn new(label: impl Into<String>, periods: usize) -> Self {
        Self {
            label: label.into(),
            periods,
        }
    }
}

/// Metrics for a single satisfied lookback window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowMetrics {
    pub label: String,
    pub periods: usize,
    pub value_change: f64,
    /// Non-finite when the reference close is zero; stripped at emission.
    pub percent_change: f64,
    pub reference_high: f64,
    pub reference_low: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SymbolMetrics {
    /// Latest daily close.
    pub current_close: Option<f64>,
    /// Latest intraday close.
    pub last_trade: Option<f64>,
    pub day_high: Option<f64>,
    pub day_low: Option<f64>,
    pub windows: Vec<WindowMetrics>,
}

impl SymbolMetrics {
    /// Flatten into the payload key/value pairs, in a stable order.
    pub fn named(&self) -> Vec<(String, f64)> {
        let mut out = Vec::with_capacity(2 + self.windows.len() * 4);
        if let Some(h) = self.day_high {
            out.push(("Day_High".to_string(), h));
        }
        if let Some(l) = self.day_low {
            out.push(("Day_Low".to_string(), l));
        }
        for w in &self.windows {
            out.push((format!("{}_Change", w.label), w.value_change));
            out.push((format!("{}_%Change", w.label), w.percent_change));
            out.push((format!("{}_High", w.label), w.reference_high));
            out.push((format!("{}_Low", w.label), w.reference_low));
        }
        out
    }
}

/// Compute metrics from prepared daily and intraday series.
pub fn extract(daily: &Series, intraday: &Series, windows: &[LookbackWindow]) -> SymbolMetrics {
    let (day_high, day_low) = match session_range(intraday) {
        Some((h, l)) => (Some(h), Some(l)),
        None => (None, None),
    };

    let bars = daily.bars();
    let current_close = bars.last().map(|b| b.close);

    let windows = match current_close {
        Some(current) => windows
            .iter()
            .filter_map(|w| {
                let idx = bars.len().checked_sub(w.periods + 1)?;
                let reference = &bars[idx];
                let value_change = current - reference.close;
                Some(WindowMetrics {
                    label: w.label.clone(),
                    periods: w.periods,
                    value_change,
                    percent_change: value_change / reference.close * 100.0,
                    reference_high: reference.high,
                    reference_low: reference.low,
                })
            })
            .collect(),
        None => Vec::new(),
    };

    SymbolMetrics {
        current_close,
        last_trade: intraday.last().map(|b| b.close),
        day_high,
        day_low,
        windows,
    }
}

/// High/low across the intraday bars sharing the final bar's UTC date.
fn session_range(intraday: &Series) -> Option<(f64, f64)> {
    let session = intraday.last()?.timestamp.date_naive();
    intraday
        .bars()
        .iter()
        .filter(|b| b.timestamp.date_naive() == session)
        .fold(None, |acc, b| match acc {
            None => Some((b.high, b.low)),
            Some((h, l)) => Some((f64::max(h, b.high), f64::min(l, b.low))),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::series::PriceBar;
    use chrono::{Duration, TimeZone, Utc};

    fn default_windows() -> Vec<LookbackWindow> {
        vec![
            LookbackWindow::new("1D", 1),
            LookbackWindow::new("5D", 5),
            LookbackWindow::new("1M", 20),
            LookbackWindow::new("1Y", 252),
        ]
    }

    fn daily(closes: &[f64]) -> Series {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Series::prepare(
            closes
                .iter()
                .enumerate()
                .map(|(i, &c)| PriceBar::new(t0 + Duration::days(i as i64), c, c + 1.0, c - 1.0, c, None))
                .collect(),
        )
    }

    #[test]
    fn short_daily_history_omits_windows() {
        // 6 points satisfy 1D and 5D only.
        let m = extract(&daily(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0]), &Series::default(), &default_windows());
        let labels: Vec<_> = m.windows.iter().map(|w| w.label.as_str()).collect();
        assert_eq!(labels, vec!["1D", "5D"]);

        let five = &m.windows[1];
        assert!((five.value_change - 5.0).abs() < 1e-12);
        assert!((five.percent_change - 50.0).abs() < 1e-12);
        assert_eq!(five.reference_high, 11.0);
        assert_eq!(five.reference_low, 9.0);
    }

    #[test]
    fn exactly_w_points_is_not_enough() {
        let m = extract(&daily(&[10.0]), &Series::default(), &[LookbackWindow::new("1D", 1)]);
        assert!(m.windows.is_empty());
        assert_eq!(m.current_close, Some(10.0));
    }

    #[test]
    fn empty_inputs_yield_empty_metrics() {
        let m = extract(&Series::default(), &Series::default(), &default_windows());
        assert_eq!(m, SymbolMetrics::default());
        assert!(m.named().is_empty());
    }

    #[test]
    fn day_range_uses_latest_session_only() {
        let yesterday = Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap();
        let today = Utc.with_ymd_and_hms(2024, 6, 4, 4, 0, 0).unwrap();
        let intraday = Series::prepare(vec![
            PriceBar::new(yesterday, 50.0, 99.0, 1.0, 50.0, None),
            PriceBar::new(today, 20.0, 21.0, 19.5, 20.5, None),
            PriceBar::new(today + Duration::minutes(1), 20.5, 22.0, 20.0, 21.5, None),
        ]);
        let m = extract(&Series::default(), &intraday, &[]);
        assert_eq!(m.day_high, Some(22.0));
        assert_eq!(m.day_low, Some(19.5));
        assert_eq!(m.last_trade, Some(21.5));
    }

    #[test]
    fn zero_reference_close_gives_non_finite_pct() {
        let m = extract(&daily(&[0.0, 5.0]), &Series::default(), &[LookbackWindow::new("1D", 1)]);
        assert!(!m.windows[0].percent_change.is_finite());
        assert!((m.windows[0].value_change - 5.0).abs() < 1e-12);
    }

    #[test]
    fn named_keys() {
        let m = extract(&daily(&[10.0, 12.0]), &Series::default(), &[LookbackWindow::new("1D", 1)]);
        let keys: Vec<_> = m.named().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["1D_Change", "1D_%Change", "1D_High", "1D_Low"]);
    }
}

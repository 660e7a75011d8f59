// =============================================================================
// Per-symbol pipeline: raw bars to an indicator snapshot
// =============================================================================
//
// prepare  -> sort / dedup / OHLC4 for all three series
// compute  -> resample the source series per indicator, band %b and RSI on
//             OHLC4, auxiliary metrics from daily + intraday
//
// Everything here is pure; the cycle in `monitor::cycle` drives it.
// =============================================================================

use chrono::{DateTime, Utc};

use crate::alerts::classifier::IndicatorSnapshot;
use crate::indicators::bollinger::latest_percent_b;
use crate::indicators::rsi::latest_rsi;
use crate::market_data::{RawSymbolData, Series};
use crate::metrics;
use crate::runtime_config::RuntimeConfig;
use crate::types::Unavailable;

/// All three series of one symbol after preparation.
#[derive(Debug, Clone)]
pub struct PreparedSymbol {
    pub symbol: String,
    pub source: Series,
    pub daily: Series,
    pub intraday: Series,
}

pub fn prepare(symbol: String, raw: RawSymbolData) -> PreparedSymbol {
    PreparedSymbol {
        symbol,
        source: Series::prepare(raw.source),
        daily: Series::prepare(raw.daily),
        intraday: Series::prepare(raw.intraday),
    }
}

/// Compute %b, RSI and metrics for a prepared symbol.
///
/// Short or flat series come back as [`Unavailable`]; the caller skips the
/// symbol.
pub fn compute(
    prepared: &PreparedSymbol,
    config: &RuntimeConfig,
    now: DateTime<Utc>,
) -> Result<IndicatorSnapshot, Unavailable> {
    let band = &config.band;
    let band_series = prepared.source.resample(band.frequency);
    band_series.require_len("band", band.length)?;
    let percent_b = latest_percent_b(&band_series.ohlc4(), band.length, band.num_std, band.ma_mode)?;

    let rsi_params = &config.rsi;
    let rsi_series = prepared.source.resample(rsi_params.frequency);
    rsi_series.require_len("rsi", rsi_params.period + 1)?;
    let rsi = latest_rsi(&rsi_series.ohlc4(), rsi_params.period)?;

    let metrics = metrics::extract(&prepared.daily, &prepared.intraday, &config.lookback_windows);
    let price = metrics
        .last_trade
        .or(metrics.current_close)
        .or_else(|| prepared.source.last().map(|b| b.close));

    Ok(IndicatorSnapshot {
        symbol: prepared.symbol.clone(),
        percent_b,
        rsi,
        price,
        metrics,
        evaluated_at: now,
    })
}

// =============================================================================
// Bar fixtures shared by the monitor tests
// =============================================================================
#[cfg(test)]
pub(crate) mod fixtures {
    use std::f64::consts::TAU;

    use chrono::{Duration, TimeZone, Utc};

    use crate::market_data::series::PriceBar;

    /// Hourly bars from midnight UTC oscillating ±1% around 100 with a
    /// 10-hour period, volume 1000.
    pub fn oscillating_hourly(n: usize) -> Vec<PriceBar> {
        let t0 = Utc.with_ymd_and_hms(2024, 6, 3, 0, 0, 0).unwrap();
        let price = |i: usize| 100.0 * (1.0 + 0.01 * (i as f64 * TAU / 10.0).sin());
        (0..n)
            .map(|i| {
                let close = price(i);
                let open = if i == 0 { close } else { price(i - 1) };
                PriceBar::new(
                    t0 + Duration::hours(i as i64),
                    open,
                    open.max(close) + 0.05,
                    open.min(close) - 0.05,
                    close,
                    Some(1000),
                )
            })
            .collect()
    }

    /// Oscillation whose final bar closes 20% lower.
    pub fn crash_hourly(n: usize) -> Vec<PriceBar> {
        let mut bars = oscillating_hourly(n);
        if let Some(last) = bars.last_mut() {
            let open = last.open;
            let close = open * 0.8;
            *last = PriceBar::new(last.timestamp, open, open + 0.05, close - 0.05, close, Some(5000));
        }
        bars
    }

    /// Hourly bars with a constant price.
    pub fn flat_hourly(n: usize) -> Vec<PriceBar> {
        let t0 = Utc.with_ymd_and_hms(2024, 6, 3, 0, 0, 0).unwrap();
        (0..n)
            .map(|i| PriceBar::new(t0 + Duration::hours(i as i64), 100.0, 100.0, 100.0, 100.0, Some(1000)))
            .collect()
    }

    /// Daily bars with closes rising by one per day from 100.
    pub fn rising_daily(n: usize) -> Vec<PriceBar> {
        let t0 = Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap();
        (0..n)
            .map(|i| {
                let c = 100.0 + i as f64;
                PriceBar::new(t0 + Duration::days(i as i64), c, c + 2.0, c - 2.0, c, Some(10_000))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;
    use crate::alerts::classifier::{classify, AlertTrigger};
    use crate::market_data::series::PriceBar;
    use crate::types::AlertTier;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 4, 16, 0, 0).unwrap()
    }

    fn evaluate_symbol(
        symbol: &str,
        raw: RawSymbolData,
        config: &RuntimeConfig,
        now: DateTime<Utc>,
    ) -> Result<IndicatorSnapshot, Unavailable> {
        compute(&prepare(symbol.to_string(), raw), config, now)
    }

    fn raw(source: Vec<PriceBar>) -> RawSymbolData {
        RawSymbolData {
            source,
            ..RawSymbolData::default()
        }
    }

    #[test]
    fn oscillation_yields_finite_indicators() {
        // 40 hourly bars resample to exactly 20 two-hour points.
        let cfg = RuntimeConfig::default();
        let prepared = prepare("TCS.NS".into(), raw(oscillating_hourly(40)));
        assert_eq!(prepared.source.resample(cfg.band.frequency).bars().len(), 20);

        let snap = compute(&prepared, &cfg, now()).unwrap();
        assert!(snap.percent_b.is_finite());
        assert!((0.0..=100.0).contains(&snap.rsi));
        assert_eq!(snap.evaluated_at, now());
    }

    #[test]
    fn flat_series_is_degenerate() {
        let cfg = RuntimeConfig::default();
        let err = evaluate_symbol("FLAT.NS", raw(flat_hourly(40)), &cfg, now()).unwrap_err();
        assert_eq!(err, Unavailable::DegenerateBand);
    }

    #[test]
    fn short_source_is_insufficient() {
        // 30 hourly bars -> 15 two-hour points < 20.
        let cfg = RuntimeConfig::default();
        let err = evaluate_symbol("NEW.NS", raw(oscillating_hourly(30)), &cfg, now()).unwrap_err();
        assert_eq!(
            err,
            Unavailable::InsufficientHistory {
                series: "band",
                have: 15,
                need: 20
            }
        );
    }

    #[test]
    fn rsi_needs_its_own_history() {
        let mut cfg = RuntimeConfig::default();
        cfg.band.frequency = cfg.source.interval;
        cfg.band.length = 5;
        cfg.rsi.period = 14;
        let err = evaluate_symbol("NEW.NS", raw(oscillating_hourly(12)), &cfg, now()).unwrap_err();
        assert!(matches!(err, Unavailable::InsufficientHistory { series: "rsi", .. }));
    }

    #[test]
    fn crash_triggers_extreme_low_percent_b() {
        let cfg = RuntimeConfig::default();
        let snap = evaluate_symbol("CRASH.NS", raw(crash_hourly(60)), &cfg, now()).unwrap();
        assert!(snap.percent_b < -10.0, "%b = {}", snap.percent_b);

        let events = classify(&snap, &cfg.percent_b_tiers, &cfg.rsi_tiers);
        assert_eq!(events[0].trigger, AlertTrigger::PercentB);
        assert_eq!(events[0].tier, AlertTier::Green);
        assert_eq!(events[0].symbol, "CRASH.NS");
    }

    #[test]
    fn price_falls_back_through_series() {
        let cfg = RuntimeConfig::default();
        let source = oscillating_hourly(40);
        let source_close = source.last().unwrap().close;

        let snap = evaluate_symbol("A.NS", raw(source.clone()), &cfg, now()).unwrap();
        assert_eq!(snap.price, Some(source_close));

        let daily = rising_daily(30);
        let with_daily = RawSymbolData {
            source: source.clone(),
            daily: daily.clone(),
            intraday: Vec::new(),
        };
        let snap = evaluate_symbol("A.NS", with_daily, &cfg, now()).unwrap();
        assert_eq!(snap.price, Some(129.0));
        // 30 daily points satisfy 1D, 5D and 1M, not 1Y.
        assert_eq!(snap.metrics.windows.len(), 3);

        let t = Utc.with_ymd_and_hms(2024, 6, 4, 9, 15, 0).unwrap();
        let intraday = vec![
            PriceBar::new(t, 101.0, 102.5, 100.5, 101.5, None),
            PriceBar::new(t + Duration::minutes(1), 101.5, 101.9, 101.0, 101.2, None),
        ];
        let full = RawSymbolData {
            source,
            daily,
            intraday,
        };
        let snap = evaluate_symbol("A.NS", full, &cfg, now()).unwrap();
        assert_eq!(snap.price, Some(101.2));
        assert_eq!(snap.metrics.day_high, Some(102.5));
        assert_eq!(snap.metrics.day_low, Some(100.5));
    }

    #[test]
    fn unsorted_duplicated_input_matches_clean_input() {
        let cfg = RuntimeConfig::default();
        let clean = oscillating_hourly(40);
        let mut messy = clean.clone();
        messy.reverse();
        messy.push(clean[5].clone());

        let a = evaluate_symbol("A.NS", raw(clean), &cfg, now()).unwrap();
        let b = evaluate_symbol("A.NS", raw(messy), &cfg, now()).unwrap();
        assert_eq!(a.percent_b, b.percent_b);
        assert_eq!(a.rsi, b.rsi);
    }
}

// =============================================================================
// Bollinger Bands and %b
// =============================================================================
//
// Middle band = L-period moving average (simple or exponential), upper and
// lower = middle ± k·σ with σ the L-period rolling population standard
// deviation. %b locates a price inside the band:
//
//   %b = (price - lower) / (upper - lower) * 100
//
// 0 sits on the lower band, 100 on the upper band; values beyond either end
// are expected during strong moves.
// =============================================================================

use serde::Serialize;

use crate::indicators::ema::{calculate_ema, calculate_sma};
use crate::types::{MaMode, Unavailable};

/// Relative band width below which %b is treated as undefined.
const DEGENERATE_WIDTH: f64 = 1e-12;

/// Band values at a single point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BandPoint {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

impl BandPoint {
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }

    /// Position of `price` within the band, in percent.
    ///
    /// Zero-width bands (constant prices) yield [`Unavailable::DegenerateBand`].
    pub fn percent_b(&self, price: f64) -> Result<f64, Unavailable> {
        let width = self.width();
        if !width.is_finite() || width.abs() <= DEGENERATE_WIDTH * self.middle.abs().max(1.0) {
            return Err(Unavailable::DegenerateBand);
        }

        let pct = (price - self.lower) / width * 100.0;
        if pct.is_finite() {
            Ok(pct)
        } else {
            Err(Unavailable::DegenerateBand)
        }
    }
}

/// Compute the band for every point of `values`.
///
/// The output is index-aligned with the input; points inside the warm-up
/// window (the first `period - 1`) are `None`.
pub fn calculate_bands(
    values: &[f64],
    period: usize,
    num_std: f64,
    mode: MaMode,
) -> Vec<Option<BandPoint>> {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }

    let middles = match mode {
        MaMode::Simple => calculate_sma(values, period),
        MaMode::Exponential => calculate_ema(values, period),
    };

    for (offset, (&middle, window)) in middles.iter().zip(values.windows(period)).enumerate() {
        let std_dev = population_std(window);
        if !std_dev.is_finite() {
            continue;
        }
        out[offset + period - 1] = Some(BandPoint {
            upper: middle + num_std * std_dev,
            middle,
            lower: middle - num_std * std_dev,
        });
    }

    out
}

/// %b of the most recent value against the most recent band.
///
/// # Errors
/// - [`Unavailable::BandUnavailable`] when the band is undefined at the final
///   point (input shorter than `period`, or a broken series).
/// - [`Unavailable::DegenerateBand`] when the final band has zero width.
pub fn latest_percent_b(
    values: &[f64],
    period: usize,
    num_std: f64,
    mode: MaMode,
) -> Result<f64, Unavailable> {
    let bands = calculate_bands(values, period, num_std, mode);
    let (Some(&price), Some(Some(band))) = (values.last(), bands.last()) else {
        return Err(Unavailable::BandUnavailable);
    };
    band.percent_b(price)
}

fn population_std(window: &[f64]) -> f64 {
    let n = window.len() as f64;
    let mean = window.iter().sum::<f64>() / n;
    let variance = window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n;
    variance.sqrt()
}

// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the indicators the alert pipeline
// runs on. Series helpers return empty vecs for short input; the `latest_*`
// entry points return `Result<f64, Unavailable>` so callers handle
// insufficient data and degenerate numerics explicitly.

pub mod bollinger;
pub mod ema;
pub mod rsi;

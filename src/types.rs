// =============================================================================
// Shared types used across the bandwatch engine
// =============================================================================

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Frequency
// =============================================================================

/// Unit of a sampling [`Frequency`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrequencyUnit {
    Minute,
    Hour,
    Day,
    Week,
}

impl FrequencyUnit {
    fn seconds(self) -> i64 {
        match self {
            Self::Minute => 60,
            Self::Hour => 3_600,
            Self::Day => 86_400,
            Self::Week => 604_800,
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            Self::Minute => "m",
            Self::Hour => "h",
            Self::Day => "d",
            Self::Week => "wk",
        }
    }
}

/// Sampling frequency of a price series, e.g. `1h`, `2h`, `1d`.
///
/// Serialized as its textual form so config files read naturally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Frequency {
    pub amount: u32,
    pub unit: FrequencyUnit,
}

impl Frequency {
    pub const fn new(amount: u32, unit: FrequencyUnit) -> Self {
        Self { amount, unit }
    }

    pub const fn minutes(amount: u32) -> Self {
        Self::new(amount, FrequencyUnit::Minute)
    }

    pub const fn hours(amount: u32) -> Self {
        Self::new(amount, FrequencyUnit::Hour)
    }

    pub const fn days(amount: u32) -> Self {
        Self::new(amount, FrequencyUnit::Day)
    }

    /// Length of one bucket in seconds.
    pub fn as_secs(&self) -> i64 {
        i64::from(self.amount) * self.unit.seconds()
    }

    /// Start of the bucket containing `ts`. Buckets are aligned to the Unix
    /// epoch, which coincides with midnight UTC for any divisor of a day.
    pub fn bucket_start(&self, ts: DateTime<Utc>) -> DateTime<Utc> {
        let width = self.as_secs().max(1);
        let start = ts.timestamp().div_euclid(width) * width;
        DateTime::<Utc>::from_timestamp(start, 0).unwrap_or(ts)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.unit.suffix())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid frequency '{input}': {reason}")]
pub struct FrequencyParseError {
    input: String,
    reason: &'static str,
}

impl FromStr for Frequency {
    type Err = FrequencyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().to_ascii_lowercase();
        let split = trimmed
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(trimmed.len());
        let (digits, suffix) = trimmed.split_at(split);

        let err = |reason| FrequencyParseError {
            input: s.to_string(),
            reason,
        };

        let amount: u32 = digits.parse().map_err(|_| err("missing amount"))?;
        if amount == 0 {
            return Err(err("amount must be positive"));
        }

        let unit = match suffix {
            "m" | "min" => FrequencyUnit::Minute,
            "h" => FrequencyUnit::Hour,
            "d" => FrequencyUnit::Day,
            "w" | "wk" => FrequencyUnit::Week,
            _ => return Err(err("unknown unit")),
        };

        Ok(Self { amount, unit })
    }
}

impl TryFrom<String> for Frequency {
    type Error = FrequencyParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Frequency> for String {
    fn from(value: Frequency) -> Self {
        value.to_string()
    }
}

// =============================================================================
// Moving-average mode
// =============================================================================

/// Moving average used for the band center line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaMode {
    Simple,
    Exponential,
}

impl Default for MaMode {
    fn default() -> Self {
        Self::Exponential
    }
}

impl fmt::Display for MaMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple => write!(f, "sma"),
            Self::Exponential => write!(f, "ema"),
        }
    }
}

// =============================================================================
// Alert tiers
// =============================================================================

/// Severity tier of an alert, named after the dashboard colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertTier {
    /// Extreme low.
    Green,
    /// Low.
    Blue,
    /// High.
    Orange,
    /// Extreme high.
    Red,
}

impl AlertTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Orange => "orange",
            Self::Red => "red",
        }
    }
}

impl fmt::Display for AlertTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Unavailable: expected, per-symbol "no value" outcomes
// =============================================================================

/// Why a symbol could not be evaluated this cycle.
///
/// These are routine (newly listed symbols, thin trading, flat prices) and
/// only ever skip the affected symbol.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Unavailable {
    #[error("insufficient history for {series}: have {have} points, need {need}")]
    InsufficientHistory {
        series: &'static str,
        have: usize,
        need: usize,
    },

    #[error("band unavailable: rolling window undefined at the latest point")]
    BandUnavailable,

    #[error("band unavailable: zero-width band")]
    DegenerateBand,

    #[error("RSI unavailable: series too short")]
    RsiUnavailable,
}

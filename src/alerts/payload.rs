// =============================================================================
// Push payloads
// =============================================================================
//
// Every frame on the push channel is `{"event": <name>, "data": <payload>}`.
// Alert payloads are flat JSON objects; numbers that are not finite are left
// out entirely so clients never see `null` or `"NaN"`.
// =============================================================================

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::alerts::classifier::AlertEvent;

/// A message on the push channel.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum PushMessage {
    /// A tiered threshold crossing.
    NewAlert(Map<String, Value>),
    /// Result of a manual refresh, sent to the requester only.
    RefreshComplete(RefreshAck),
}

impl PushMessage {
    pub fn alert(event: &AlertEvent) -> Self {
        Self::NewAlert(alert_payload(event))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AckStatus {
    Success,
    Failure,
}

/// Acknowledgment of a manual refresh.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RefreshAck {
    pub status: AckStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RefreshAck {
    pub fn success() -> Self {
        Self {
            status: AckStatus::Success,
            message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: AckStatus::Failure,
            message: Some(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == AckStatus::Success
    }
}

/// RFC 3339, UTC, whole seconds: `2024-06-04T09:15:00Z`.
pub fn canonical_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Flatten an alert event into its transport payload.
pub fn alert_payload(event: &AlertEvent) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("symbol".into(), Value::String(event.symbol.clone()));
    map.insert("type".into(), Value::String(event.tier.as_str().to_string()));
    map.insert("trigger".into(), Value::String(event.trigger.key().to_string()));
    map.insert("message".into(), Value::String(event.message.clone()));
    insert_finite(&mut map, "Bollinger_%b", event.percent_b);
    insert_finite(&mut map, "RSI", event.rsi);
    if let Some(value) = event.value {
        insert_finite(&mut map, "Value", value);
    }
    map.insert("time".into(), Value::String(canonical_time(event.time)));
    for (key, value) in &event.metrics {
        insert_finite(&mut map, key, *value);
    }
    map
}

fn insert_finite(map: &mut Map<String, Value>, key: &str, value: f64) {
    // `from_f64` is `None` exactly for NaN and the infinities.
    if let Some(n) = Number::from_f64(value) {
        map.insert(key.to_string(), Value::Number(n));
    }
}

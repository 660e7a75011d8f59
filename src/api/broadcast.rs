// =============================================================================
// Push-channel broadcaster
// =============================================================================
//
// Fan-out of serialized `PushMessage` frames to every connected WebSocket
// client. Sending with no subscribers is not an error; a slow subscriber
// that falls more than `capacity` frames behind skips the oldest ones.
// =============================================================================

use tokio::sync::broadcast;
use tracing::warn;

use crate::alerts::PushMessage;

#[derive(Debug, Clone)]
pub struct AlertBroadcaster {
    tx: broadcast::Sender<String>,
}

impl AlertBroadcaster {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Send to all current subscribers. Returns how many received it.
    pub fn broadcast(&self, msg: &PushMessage) -> usize {
        match serde_json::to_string(msg) {
            Ok(json) => self.tx.send(json).unwrap_or(0),
            Err(e) => {
                warn!(error = %e, "failed to serialise push message");
                0
            }
        }
    }
}

// =============================================================================
// WebSocket Handler: push channel for alerts and refresh acknowledgments
// =============================================================================
//
// Clients connect to `/api/v1/ws` and receive every `new_alert` frame
// broadcast by the monitor. A client may send `refresh_request` (either the
// bare string or `{"event":"refresh_request"}`); the manual cycle runs in the
// background and its `refresh_complete` acknowledgment goes to that client
// only.
//
// The handler also answers Ping frames with Pong and closes cleanly on Close.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::sync::{broadcast::error::RecvError, mpsc};
use tracing::{debug, info, warn};

use crate::alerts::{PushMessage, RefreshAck};
use crate::app_state::AppState;

const REFRESH_REQUEST: &str = "refresh_request";

// =============================================================================
// WebSocket upgrade handler
// =============================================================================

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    info!("WebSocket connection accepted, upgrading");
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
}

// =============================================================================
// Connection handler
// =============================================================================

/// Manages a single WebSocket connection lifecycle.
///
/// `tokio::select!` over three sources:
///   1. broadcast alert frames, forwarded as-is;
///   2. refresh acknowledgments for this connection;
///   3. inbound client frames.
async fn handle_ws_connection(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let mut alerts = state.broadcaster.subscribe();
    let (ack_tx, mut ack_rx) = mpsc::channel::<RefreshAck>(4);

    loop {
        tokio::select! {
            // ── Broadcast alerts ────────────────────────────────────────
            frame = alerts.recv() => {
                match frame {
                    Ok(text) => {
                        if let Err(e) = sender.send(Message::Text(text)).await {
                            debug!(error = %e, "WebSocket send failed, disconnecting");
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "WebSocket client lagging, alerts dropped");
                    }
                    Err(RecvError::Closed) => break,
                }
            }

            // ── Refresh acknowledgments for this client ─────────────────
            Some(ack) = ack_rx.recv() => {
                match serde_json::to_string(&PushMessage::RefreshComplete(ack)) {
                    Ok(json) => {
                        if let Err(e) = sender.send(Message::Text(json)).await {
                            debug!(error = %e, "failed to send refresh ack, disconnecting");
                            break;
                        }
                    }
                    Err(e) => warn!(error = %e, "failed to serialise refresh ack"),
                }
            }

            // ── Inbound frames ──────────────────────────────────────────
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if is_refresh_request(&text) {
                            info!("manual refresh requested over WebSocket");
                            let monitor = state.monitor.clone();
                            let ack_tx = ack_tx.clone();
                            tokio::spawn(async move {
                                let ack = monitor.manual_refresh().await;
                                // The client may have gone away meanwhile.
                                let _ = ack_tx.send(ack).await;
                            });
                        } else {
                            debug!(msg = %text, "unrecognised WebSocket text frame ignored");
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if let Err(e) = sender.send(Message::Pong(data)).await {
                            debug!(error = %e, "failed to send Pong, disconnecting");
                            break;
                        }
                    }
                    Some(Ok(Message::Pong(_))) => {}
                    Some(Ok(Message::Binary(_))) => {
                        debug!("WebSocket binary message ignored");
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("WebSocket Close frame received, disconnecting");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(error = %e, "WebSocket receive error, disconnecting");
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    info!("WebSocket connection closed");
}

/// Accepts the bare event name, a JSON string of it, or an object whose
/// `event` field names it.
fn is_refresh_request(text: &str) -> bool {
    let text = text.trim();
    if text == REFRESH_REQUEST {
        return true;
    }
    match serde_json::from_str::<Value>(text) {
        Ok(Value::String(s)) => s == REFRESH_REQUEST,
        Ok(Value::Object(obj)) => obj.get("event").and_then(Value::as_str) == Some(REFRESH_REQUEST),
        _ => false,
    }
}

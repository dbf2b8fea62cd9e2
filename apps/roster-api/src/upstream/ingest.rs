//! WebSocket endpoint the voice-server bridge pushes presence events into.
//!
//! One bridge at a time. Frames are JSON [`UpstreamEvent`]s; anything that
//! doesn't parse is logged and skipped. When the bridge goes away the link is
//! reported down.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::StreamExt;
use parking_lot::Mutex;
use roster_common::id::{self, prefix};
use tokio::sync::mpsc;

use crate::gateway::server::send_close;
use crate::AppState;

use super::events::UpstreamEvent;

/// Another bridge is already feeding events.
const CLOSE_BRIDGE_CONFLICT: u16 = 4009;

/// Cloneable sending side of the adapter's event queue.
#[derive(Clone)]
pub struct UpstreamHandle {
    events: mpsc::Sender<UpstreamEvent>,
    attached: Arc<Mutex<Option<String>>>,
}

/// Releases the bridge slot on drop.
pub struct BridgeGuard {
    pub bridge_id: String,
    attached: Arc<Mutex<Option<String>>>,
}

impl Drop for BridgeGuard {
    fn drop(&mut self) {
        let mut attached = self.attached.lock();
        if attached.as_deref() == Some(self.bridge_id.as_str()) {
            *attached = None;
        }
    }
}

impl UpstreamHandle {
    pub fn new(events: mpsc::Sender<UpstreamEvent>) -> Self {
        Self {
            events,
            attached: Arc::new(Mutex::new(None)),
        }
    }

    /// Queue an event for the adapter. Waits when the queue is full so order
    /// is kept. Returns `false` once the adapter has stopped.
    pub async fn send(&self, event: UpstreamEvent) -> bool {
        self.events.send(event).await.is_ok()
    }

    /// Claim the bridge slot, or `None` if a bridge is already attached.
    pub fn attach(&self) -> Option<BridgeGuard> {
        let mut attached = self.attached.lock();
        if attached.is_some() {
            return None;
        }
        let bridge_id = id::prefixed_ulid(prefix::BRIDGE);
        *attached = Some(bridge_id.clone());
        Some(BridgeGuard {
            bridge_id,
            attached: Arc::clone(&self.attached),
        })
    }

    pub fn bridge_attached(&self) -> bool {
        self.attached.lock().is_some()
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/upstream", get(ws_upgrade))
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_bridge(socket, state.upstream.clone()))
}

async fn handle_bridge(socket: WebSocket, upstream: UpstreamHandle) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    let Some(guard) = upstream.attach() else {
        tracing::warn!("second upstream bridge rejected");
        let _ = send_close(&mut ws_tx, CLOSE_BRIDGE_CONFLICT, "Bridge already attached").await;
        return;
    };
    let bridge_id = guard.bridge_id.clone();
    tracing::info!(%bridge_id, "upstream bridge attached");

    while let Some(msg) = ws_rx.next().await {
        let text = match msg {
            Ok(Message::Text(t)) => t,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                tracing::debug!(?e, %bridge_id, "bridge read error");
                break;
            }
        };

        let event: UpstreamEvent = match serde_json::from_str(&text) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(%bridge_id, error = %e, "malformed upstream frame skipped");
                continue;
            }
        };

        if !upstream.send(event).await {
            tracing::error!(%bridge_id, "upstream adapter stopped, closing bridge");
            break;
        }
    }

    // Queued before the slot is released so a replacement bridge's link_up
    // lands after this.
    upstream.send(UpstreamEvent::LinkDown).await;
    drop(guard);
    tracing::info!(%bridge_id, "upstream bridge detached");
}

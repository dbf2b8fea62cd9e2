//! Outbound side of a viewer connection.
//!
//! [`drain`] owns a session's [`ViewerFeed`] and writes each dispatch to a
//! [`SessionTransport`], numbering frames as it goes. Production uses the
//! WebSocket sink; tests plug in in-memory transports.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::SinkExt;

use super::events::GatewayMessage;
use super::hub::BroadcastHub;
use super::session::ViewerFeed;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("send failed: {0}")]
    Send(String),
}

/// A per-viewer channel that can carry text frames.
#[async_trait]
pub trait SessionTransport: Send {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError>;

    /// Best-effort close once the queue is finished.
    async fn close(&mut self) -> Result<(), TransportError>;
}

/// The write half of an axum WebSocket.
pub struct WsTransport {
    sink: SplitSink<WebSocket, Message>,
}

impl WsTransport {
    pub fn new(sink: SplitSink<WebSocket, Message>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl SessionTransport for WsTransport {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.sink
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.sink
            .close()
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }
}

/// Write every queued dispatch to `transport` until the queue closes.
///
/// Returns `Err` on the first failed write; the caller treats that as the
/// viewer being gone.
pub async fn drain<T: SessionTransport>(
    session_id: String,
    mut feed: ViewerFeed,
    hub: Arc<BroadcastHub>,
    mut transport: T,
) -> Result<(), TransportError> {
    let mut seq = 0u64;

    while let Some(dispatch) = feed.recv(&hub).await {
        seq += 1;
        let text = serde_json::to_string(&GatewayMessage::dispatch(&dispatch, seq))?;
        if let Err(e) = transport.send_text(text).await {
            tracing::debug!(%session_id, seq, error = %e, "viewer write failed");
            return Err(e);
        }
        tracing::trace!(%session_id, seq, event = dispatch.event_name(), "pushed to viewer");
    }

    // Queue closed: the hub dropped this session.
    if let Err(e) = transport.close().await {
        tracing::debug!(%session_id, error = %e, "viewer close failed");
    }
    Ok(())
}

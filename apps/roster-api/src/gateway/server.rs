//! WebSocket upgrade handler and per-viewer connection loop.

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};

use crate::AppState;

use super::session::ViewerSession;
use super::transport::{drain, WsTransport};

pub fn router() -> Router<AppState> {
    Router::new().route("/clients", get(ws_upgrade))
}

async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_connection(socket, state))
}

async fn handle_connection(socket: WebSocket, state: AppState) {
    let (ws_tx, mut ws_rx) = socket.split();

    let (session, feed) = ViewerSession::open(state.config.viewer_queue_capacity);
    let session_id = session.session_id.clone();
    let hub = state.roster.hub().clone();

    if let Err(err) = hub.on_viewer_connect(session) {
        tracing::debug!(%session_id, error = %err, "viewer could not be registered");
        return;
    }

    let mut writer = tokio::spawn(drain(
        session_id.clone(),
        feed,
        hub.clone(),
        WsTransport::new(ws_tx),
    ));

    // Viewers have nothing to say; we only watch for the socket going away.
    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => {
                        tracing::debug!(?e, %session_id, "ws read error");
                        break;
                    }
                }
            }

            // Writer finished: transport error, or the hub dropped us.
            result = &mut writer => {
                if let Ok(Err(e)) = result {
                    tracing::debug!(%session_id, error = %e, "viewer transport failed");
                }
                break;
            }
        }
    }

    hub.on_viewer_disconnect(&session_id);
    writer.abort();

    tracing::info!(%session_id, "viewer session ended");
}

/// Send a WebSocket close frame with a code and reason.
pub(crate) async fn send_close(
    ws_tx: &mut SplitSink<WebSocket, Message>,
    code: u16,
    reason: &str,
) -> Result<(), axum::Error> {
    let close_msg = Message::Close(Some(CloseFrame {
        code,
        reason: reason.to_string().into(),
    }));
    ws_tx.send(close_msg).await
}

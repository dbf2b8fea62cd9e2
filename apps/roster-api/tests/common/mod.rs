#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::time;
use tokio_tungstenite::tungstenite;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use roster_api::config::Config;
use roster_api::AppState;

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Build an AppState with its upstream adapter already running.
pub fn test_state() -> AppState {
    let (state, adapter, events) = AppState::new(Config::default());
    tokio::spawn(adapter.run(events));
    state
}

/// Build the full application router wired to a fresh state.
pub fn test_app() -> (Router, AppState) {
    let state = test_state();
    let app = roster_api::routes::router().with_state(state.clone());
    (app, state)
}

/// Start an actual TCP server for WebSocket testing. The server runs in the
/// background.
pub async fn start_ws_server() -> (SocketAddr, AppState) {
    let (app, state) = test_app();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (addr, state)
}

pub async fn connect(addr: SocketAddr, path: &str) -> WsStream {
    let url = format!("ws://{addr}{path}");
    let (ws_stream, _) = tokio_tungstenite::connect_async(&url)
        .await
        .expect("ws connect");
    ws_stream
}

/// Connect a viewer and consume the two frames every viewer gets on connect.
/// Returns the stream plus the initial `link` and `clients` payloads.
pub async fn connect_viewer(
    addr: SocketAddr,
) -> (WsStream, serde_json::Value, serde_json::Value) {
    let mut ws = connect(addr, "/clients").await;

    let link = next_frame(&mut ws).await;
    assert_eq!(link["t"], "link");
    assert_eq!(link["s"], 1);

    let clients = next_frame(&mut ws).await;
    assert_eq!(clients["t"], "clients");
    assert_eq!(clients["s"], 2);

    (ws, link["d"].clone(), clients["d"].clone())
}

/// Read the next text frame as JSON.
pub async fn next_frame(ws: &mut WsStream) -> serde_json::Value {
    loop {
        let msg = time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timeout waiting for frame")
            .expect("stream ended")
            .expect("ws read error");

        match msg {
            tungstenite::Message::Text(text) => {
                return serde_json::from_str(&text).expect("parse frame");
            }
            tungstenite::Message::Ping(_) | tungstenite::Message::Pong(_) => continue,
            other => panic!("Expected text frame, got: {other:?}"),
        }
    }
}

/// Read frames until one with event name `t` arrives.
pub async fn next_event(ws: &mut WsStream, t: &str) -> serde_json::Value {
    loop {
        let frame = next_frame(ws).await;
        if frame["t"] == t {
            return frame;
        }
    }
}

pub async fn send_event(bridge: &mut WsStream, event: serde_json::Value) {
    bridge
        .send(tungstenite::Message::Text(event.to_string().into()))
        .await
        .expect("send upstream event");
}

pub fn client_joined(clid: &str, nickname: &str, client_type: &str) -> serde_json::Value {
    serde_json::json!({
        "event": "client_joined",
        "client": {
            "clid": clid,
            "cid": "1",
            "client_database_id": format!("db{clid}"),
            "client_nickname": nickname,
            "client_type": client_type,
        }
    })
}

/// Poll until `check` holds, panicking after a few seconds.
pub async fn wait_until(state: &AppState, check: impl Fn(&AppState) -> bool) {
    let deadline = time::Instant::now() + Duration::from_secs(5);
    while !check(state) {
        assert!(time::Instant::now() < deadline, "condition not reached in time");
        time::sleep(Duration::from_millis(10)).await;
    }
}

pub fn nicknames(clients: &serde_json::Value) -> Vec<String> {
    clients
        .as_array()
        .expect("clients payload is an array")
        .iter()
        .map(|c| c["client_nickname"].as_str().unwrap().to_string())
        .collect()
}

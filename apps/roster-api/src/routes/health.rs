use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let hub = state.roster.hub();
    Json(serde_json::json!({
        "status": "ok",
        "link": hub.link_status().state,
        "bridge_attached": state.upstream.bridge_attached(),
        "viewers": hub.viewer_count(),
        "clients": hub.snapshot().len(),
    }))
}

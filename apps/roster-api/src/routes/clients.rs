//! Read-only REST view of the roster, for consumers that can't hold a socket.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::error::ApiError;
use crate::roster::{ClientRecord, RosterSnapshot};
use crate::upstream::LinkStatus;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct RosterResponse {
    pub link: LinkStatus,
    pub clients: RosterSnapshot,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/clients", get(list_clients))
        .route("/clients/{clid}", get(get_client))
}

async fn list_clients(State(state): State<AppState>) -> Json<RosterResponse> {
    let hub = state.roster.hub();
    Json(RosterResponse {
        link: hub.link_status(),
        clients: hub.snapshot(),
    })
}

async fn get_client(
    State(state): State<AppState>,
    Path(clid): Path<String>,
) -> Result<Json<ClientRecord>, ApiError> {
    let hub = state.roster.hub();

    let link = hub.link_status();
    if !link.state.is_fresh() {
        return Err(ApiError::service_unavailable("Voice server link is down"));
    }

    hub.snapshot()
        .iter()
        .find(|c| c.clid.as_str() == clid)
        .cloned()
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Client not connected"))
}

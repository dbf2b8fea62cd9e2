pub mod clients;
pub mod health;

use axum::Router;

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(crate::gateway::server::router())
        .merge(crate::upstream::ingest::router())
        .nest("/api/v1", clients::router())
}

//! Health check endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub online_identities: usize,
    pub active_rooms: usize,
}

/// Health check endpoint reporting relay liveness counters
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let stats = state.relay.stats().await;

    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        online_identities: stats.online_identities,
        active_rooms: stats.active_rooms,
    })
}

/// Liveness probe (just returns 200 if the server is running)
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

//! HTTP routes

pub mod health;

use axum::{
    http::{HeaderValue, Method},
    routing::get,
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{state::AppState, websocket::ws_handler};

/// Create all routes
pub fn create_router(state: AppState) -> Router {
    let cors = state
        .config
        .client_url
        .parse::<HeaderValue>()
        .map(|origin| {
            CorsLayer::new()
                .allow_origin(origin)
                .allow_methods([Method::GET, Method::POST])
        })
        .unwrap_or_else(|_| {
            tracing::warn!(
                client_url = %state.config.client_url,
                "CLIENT_URL is not a valid origin, CORS disabled"
            );
            CorsLayer::new()
        });

    Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/ws", get(ws_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

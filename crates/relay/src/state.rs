//! Application state shared across all HTTP and WebSocket handlers

use std::sync::Arc;

use crate::config::Config;
use crate::websocket::RelayState;

/// Application state handed to the axum router
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub relay: RelayState,
}

impl AppState {
    /// Create application state from configuration
    pub fn new(config: Config) -> Self {
        let relay = RelayState::new(config.typing_timeout());
        Self {
            config: Arc::new(config),
            relay,
        }
    }
}

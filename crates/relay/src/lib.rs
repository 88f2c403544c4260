//! Chat Relay Library
//!
//! Real-time messaging relay: presence tracking, room membership, message
//! and reaction fan-out, and typing indicators with automatic expiry.

pub mod config;
pub mod routes;
pub mod state;
pub mod websocket;

pub use config::Config;
pub use state::AppState;
pub use websocket::RelayState;

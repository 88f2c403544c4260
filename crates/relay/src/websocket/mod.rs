//! Real-time relay core
//!
//! Provides the WebSocket infrastructure for the chat relay:
//! - Presence tracking (who is online, status, last-seen)
//! - Room membership (who is joined where)
//! - Typing indicators with automatic inactivity expiry
//! - Message and reaction fan-out (room broadcast, private unicast)
//!
//! # Architecture
//!
//! - **Connection**: handle for one live WebSocket connection
//! - **Presence**: registry of connected identities
//! - **Rooms**: room id -> member set index
//! - **Typing**: per (room, identity) typing state machine with timers
//! - **Router**: builds message/reaction events and picks destinations
//! - **Fanout**: explicit broadcast/unicast addressing
//! - **State**: the owned container bundle shared across connections
//! - **Handler**: axum WebSocket route handler and connection lifecycle
//! - **Events**: type-safe event definitions for client/server communication

pub mod connection;
pub mod events;
pub mod fanout;
pub mod handler;
pub mod presence;
pub mod rooms;
pub mod router;
pub mod state;
pub mod typing;

pub use handler::ws_handler;
pub use state::{RelayState, RelayStats};

//! Relay state container
//!
//! Bundles the owned state containers (presence, rooms, typing, routing)
//! shared across all connections. Constructible per process or per test,
//! no globals.

use std::time::Duration;

use super::connection::ConnectionMap;
use super::fanout::Fanout;
use super::presence::PresenceRegistry;
use super::rooms::RoomIndex;
use super::router::MessageRouter;
use super::typing::TypingCoordinator;

/// Shared relay state handed into each connection's event-handling context
#[derive(Clone)]
pub struct RelayState {
    pub connections: ConnectionMap,
    pub presence: PresenceRegistry,
    pub rooms: RoomIndex,
    pub typing: TypingCoordinator,
    pub router: MessageRouter,
    pub fanout: Fanout,
}

impl RelayState {
    /// Create relay state with the given typing inactivity timeout
    pub fn new(typing_timeout: Duration) -> Self {
        let connections = ConnectionMap::new();
        let presence = PresenceRegistry::new();
        let rooms = RoomIndex::new();
        let fanout = Fanout::new(presence.clone(), rooms.clone(), connections.clone());
        let typing = TypingCoordinator::new(fanout.clone(), typing_timeout);
        let router = MessageRouter::new(fanout.clone());

        Self {
            connections,
            presence,
            rooms,
            typing,
            router,
            fanout,
        }
    }

    /// Snapshot of the relay's liveness counters
    pub async fn stats(&self) -> RelayStats {
        RelayStats {
            online_identities: self.presence.count().await,
            active_rooms: self.rooms.count().await,
        }
    }
}

/// Liveness counters exposed by the health endpoint
#[derive(Debug, Clone)]
pub struct RelayStats {
    /// Number of registered identities
    pub online_identities: usize,
    /// Number of rooms with at least one member
    pub active_rooms: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::websocket::connection::Connection;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_stats() {
        let relay = RelayState::new(Duration::from_millis(3000));
        let (tx, _rx) = mpsc::unbounded_channel();

        relay
            .presence
            .register("u1", "Alice", None, Arc::new(Connection::new(tx)))
            .await;
        relay.rooms.join("general", "u1").await;

        let stats = relay.stats().await;
        assert_eq!(stats.online_identities, 1);
        assert_eq!(stats.active_rooms, 1);
    }
}

//! Event fan-out
//!
//! Explicit pub/sub addressing over the presence registry and room index:
//! broadcast-all, room-wide, room-excluding-sender, and unicast-by-identity.
//! Send errors are ignored at this layer; closed connections are reaped by
//! their own disconnect path.

use super::connection::ConnectionMap;
use super::events::ServerEvent;
use super::presence::PresenceRegistry;
use super::rooms::RoomIndex;

/// Delivers one logical event to one or more live connections
#[derive(Clone)]
pub struct Fanout {
    presence: PresenceRegistry,
    rooms: RoomIndex,
    connections: ConnectionMap,
}

impl Fanout {
    /// Create a fan-out over the given state containers
    pub fn new(presence: PresenceRegistry, rooms: RoomIndex, connections: ConnectionMap) -> Self {
        Self {
            presence,
            rooms,
            connections,
        }
    }

    /// Deliver to every live connection, identified or not
    pub async fn broadcast_all(&self, event: ServerEvent) {
        for conn in self.connections.all().await {
            if conn.send(event.clone()).is_err() {
                tracing::warn!(
                    session_id = %conn.session_id,
                    "Failed to send event to connection (likely closed)"
                );
            }
        }
    }

    /// Deliver to every current member of a room, sender included
    pub async fn room(&self, room_id: &str, event: ServerEvent) {
        let members = self.rooms.members(room_id).await;
        self.send_to_members(&members, event).await;
    }

    /// Deliver to every current member of a room except one identity
    pub async fn room_except(&self, room_id: &str, exclude_identity: &str, event: ServerEvent) {
        let members: Vec<String> = self
            .rooms
            .members(room_id)
            .await
            .into_iter()
            .filter(|id| id != exclude_identity)
            .collect();
        self.send_to_members(&members, event).await;
    }

    /// Deliver to the single connection bound to an identity
    ///
    /// Returns false if the identity is not currently registered.
    pub async fn identity(&self, identity_id: &str, event: ServerEvent) -> bool {
        match self.presence.connection_of(identity_id).await {
            Some(conn) => {
                if conn.send(event).is_err() {
                    tracing::warn!(
                        identity_id = %identity_id,
                        session_id = %conn.session_id,
                        "Failed to send event to connection (likely closed)"
                    );
                }
                true
            }
            None => false,
        }
    }

    async fn send_to_members(&self, members: &[String], event: ServerEvent) {
        let mut failed = 0usize;
        let connections = self.presence.connections_of(members).await;
        let recipients = connections.len();
        for conn in connections {
            if conn.send(event.clone()).is_err() {
                failed += 1;
            }
        }

        if failed > 0 {
            tracing::warn!(recipients, failed, "Some room recipients were unreachable");
        }
    }
}

//! WebSocket connection management
//!
//! Represents an active WebSocket connection as a handle that outbound
//! events can be pushed through, plus the session-keyed map of every live
//! connection (identified or not).

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use super::events::ServerEvent;

/// Represents an active WebSocket connection
#[derive(Debug)]
pub struct Connection {
    /// Unique session ID for this connection
    pub session_id: Uuid,

    /// Channel to send events to this connection
    pub sender: mpsc::UnboundedSender<ServerEvent>,
}

impl Connection {
    /// Create a new connection
    pub fn new(sender: mpsc::UnboundedSender<ServerEvent>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            sender,
        }
    }

    /// Send an event to this connection
    ///
    /// Returns Ok(()) if sent successfully, Err if connection is closed
    #[allow(clippy::result_large_err)] // Error type is from tokio mpsc, containing the failed event
    pub fn send(&self, event: ServerEvent) -> Result<(), mpsc::error::SendError<ServerEvent>> {
        self.sender.send(event)
    }
}

/// Map of every live connection keyed by session id
///
/// Unlike the presence registry, a connection appears here for its whole
/// socket lifetime, before any identity is bound to it.
#[derive(Clone, Default)]
pub struct ConnectionMap {
    connections: Arc<RwLock<HashMap<Uuid, Arc<Connection>>>>,
}

impl ConnectionMap {
    /// Create an empty connection map
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a newly opened connection
    pub async fn insert(&self, conn: Arc<Connection>) {
        let mut connections = self.connections.write().await;
        connections.insert(conn.session_id, conn);
    }

    /// Stop tracking a closed connection
    pub async fn remove(&self, session_id: &Uuid) {
        let mut connections = self.connections.write().await;
        connections.remove(session_id);
    }

    /// Snapshot of every live connection
    pub async fn all(&self) -> Vec<Arc<Connection>> {
        let connections = self.connections.read().await;
        connections.values().map(Arc::clone).collect()
    }

    /// Number of live connections
    pub async fn count(&self) -> usize {
        let connections = self.connections.read().await;
        connections.len()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_delivers_event() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let conn = Connection::new(tx);

        conn.send(ServerEvent::Error {
            message: "boom".into(),
        })
        .unwrap();

        assert!(matches!(
            rx.try_recv().unwrap(),
            ServerEvent::Error { .. }
        ));
    }

    #[tokio::test]
    async fn test_send_after_receiver_dropped_errors() {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = Connection::new(tx);
        drop(rx);

        assert!(conn
            .send(ServerEvent::Error {
                message: "boom".into()
            })
            .is_err());
    }

    #[tokio::test]
    async fn test_connection_map_insert_and_remove() {
        let map = ConnectionMap::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let conn = Arc::new(Connection::new(tx));

        map.insert(Arc::clone(&conn)).await;
        assert_eq!(map.count().await, 1);
        assert_eq!(map.all().await[0].session_id, conn.session_id);

        map.remove(&conn.session_id).await;
        assert_eq!(map.count().await, 0);
        assert!(map.all().await.is_empty());
    }
}

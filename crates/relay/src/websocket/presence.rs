//! Presence registry
//!
//! Tracks connected identities, their status/last-seen, and the single
//! live connection bound to each identity.

use std::collections::HashMap;
use std::sync::Arc;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::connection::Connection;
use super::events::OnlineIdentity;

struct Registered {
    identity: OnlineIdentity,
    conn: Arc<Connection>,
}

/// Registry of currently connected identities
///
/// At most one connection is bound per identity id; a later registration
/// for the same id supersedes the previous one (last-writer-wins).
#[derive(Clone)]
pub struct PresenceRegistry {
    identities: Arc<RwLock<HashMap<String, Registered>>>,
}

impl PresenceRegistry {
    /// Create a new presence registry
    pub fn new() -> Self {
        Self {
            identities: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register an identity and bind it to a connection
    ///
    /// Upserts in place: a previous binding for the same id is overwritten
    /// and its connection orphaned, not closed. Status is reset to "online".
    pub async fn register(
        &self,
        identity_id: &str,
        display_name: &str,
        avatar_url: Option<String>,
        conn: Arc<Connection>,
    ) {
        let mut identities = self.identities.write().await;
        identities.insert(
            identity_id.to_string(),
            Registered {
                identity: OnlineIdentity {
                    id: identity_id.to_string(),
                    display_name: display_name.to_string(),
                    avatar_url,
                    status: "online".to_string(),
                    last_seen: OffsetDateTime::now_utc(),
                },
                conn,
            },
        );

        tracing::info!(
            identity_id = %identity_id,
            display_name = %display_name,
            online_count = identities.len(),
            "Identity registered"
        );
    }

    /// Update an identity's presence status, refreshing last-seen
    ///
    /// Returns the new last-seen timestamp, or None (no-op) if the identity
    /// is not currently registered.
    pub async fn update_status(&self, identity_id: &str, status: &str) -> Option<OffsetDateTime> {
        let mut identities = self.identities.write().await;
        let registered = identities.get_mut(identity_id)?;
        registered.identity.status = status.to_string();
        registered.identity.last_seen = OffsetDateTime::now_utc();

        tracing::debug!(
            identity_id = %identity_id,
            status = %status,
            "Identity status updated"
        );

        Some(registered.identity.last_seen)
    }

    /// Remove an identity if it is still bound to the given session
    ///
    /// The session check keeps a superseded connection's late disconnect
    /// from evicting a fresh registration for the same identity id.
    /// Returns true if the identity was removed.
    pub async fn deregister(&self, identity_id: &str, session_id: &Uuid) -> bool {
        let mut identities = self.identities.write().await;
        match identities.get(identity_id) {
            Some(registered) if registered.conn.session_id == *session_id => {
                identities.remove(identity_id);
                tracing::info!(
                    identity_id = %identity_id,
                    online_count = identities.len(),
                    "Identity deregistered"
                );
                true
            }
            _ => false,
        }
    }

    /// Snapshot of all currently registered identities
    pub async fn list_online(&self) -> Vec<OnlineIdentity> {
        let identities = self.identities.read().await;
        identities.values().map(|r| r.identity.clone()).collect()
    }

    /// Resolve the live connection for an identity
    pub async fn connection_of(&self, identity_id: &str) -> Option<Arc<Connection>> {
        let identities = self.identities.read().await;
        identities.get(identity_id).map(|r| Arc::clone(&r.conn))
    }

    /// Resolve live connections for a set of identities, skipping absentees
    pub async fn connections_of(&self, identity_ids: &[String]) -> Vec<Arc<Connection>> {
        let identities = self.identities.read().await;
        identity_ids
            .iter()
            .filter_map(|id| identities.get(id).map(|r| Arc::clone(&r.conn)))
            .collect()
    }

    /// Number of currently registered identities
    pub async fn count(&self) -> usize {
        let identities = self.identities.read().await;
        identities.len()
    }
}

impl Default for PresenceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

//! Room membership index
//!
//! Tracks which identities are joined to which rooms. Room entries are
//! created lazily on first join and pruned as soon as they empty.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Map of room id -> set of member identity ids
#[derive(Clone)]
pub struct RoomIndex {
    rooms: Arc<RwLock<HashMap<String, HashSet<String>>>>,
}

impl RoomIndex {
    /// Create a new room index
    pub fn new() -> Self {
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Add an identity to a room, creating the room entry if absent
    ///
    /// Returns true if the identity was newly added (set semantics,
    /// repeated joins are idempotent).
    pub async fn join(&self, room_id: &str, identity_id: &str) -> bool {
        let mut rooms = self.rooms.write().await;
        let members = rooms.entry(room_id.to_string()).or_default();
        let added = members.insert(identity_id.to_string());

        tracing::debug!(
            room_id = %room_id,
            identity_id = %identity_id,
            room_size = members.len(),
            "Identity joined room"
        );

        added
    }

    /// Remove an identity from a room, pruning the entry if it empties
    ///
    /// Returns true if the identity was a member.
    pub async fn leave(&self, room_id: &str, identity_id: &str) -> bool {
        let mut rooms = self.rooms.write().await;
        let Some(members) = rooms.get_mut(room_id) else {
            return false;
        };

        let removed = members.remove(identity_id);
        if members.is_empty() {
            rooms.remove(room_id);
            tracing::debug!(room_id = %room_id, "Removed empty room");
        } else if removed {
            tracing::debug!(
                room_id = %room_id,
                identity_id = %identity_id,
                room_size = members.len(),
                "Identity left room"
            );
        }

        removed
    }

    /// True if the room has no entry or an empty member set
    pub async fn is_empty(&self, room_id: &str) -> bool {
        let rooms = self.rooms.read().await;
        rooms.get(room_id).map_or(true, HashSet::is_empty)
    }

    /// Snapshot of a room's member identity ids
    pub async fn members(&self, room_id: &str) -> Vec<String> {
        let rooms = self.rooms.read().await;
        rooms
            .get(room_id)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Rooms that currently contain the given identity
    pub async fn rooms_of(&self, identity_id: &str) -> Vec<String> {
        let rooms = self.rooms.read().await;
        rooms
            .iter()
            .filter(|(_, members)| members.contains(identity_id))
            .map(|(room_id, _)| room_id.clone())
            .collect()
    }

    /// Total number of active rooms
    pub async fn count(&self) -> usize {
        let rooms = self.rooms.read().await;
        rooms.len()
    }
}

impl Default for RoomIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_join_and_leave() {
        let rooms = RoomIndex::new();

        assert!(rooms.is_empty("general").await);
        assert!(rooms.join("general", "u1").await);
        assert!(!rooms.is_empty("general").await);
        assert_eq!(rooms.members("general").await, vec!["u1".to_string()]);

        assert!(rooms.leave("general", "u1").await);
        assert!(rooms.is_empty("general").await);
        // Empty room entry is pruned, not kept around
        assert_eq!(rooms.count().await, 0);
    }

    #[tokio::test]
    async fn test_join_is_idempotent() {
        let rooms = RoomIndex::new();

        assert!(rooms.join("general", "u1").await);
        assert!(!rooms.join("general", "u1").await);
        assert_eq!(rooms.members("general").await.len(), 1);
    }

    #[tokio::test]
    async fn test_leave_nonmember_is_noop() {
        let rooms = RoomIndex::new();

        assert!(!rooms.leave("general", "u1").await);
        rooms.join("general", "u1").await;
        assert!(rooms.leave("general", "u1").await);
        assert!(!rooms.leave("general", "u1").await);
    }

    #[tokio::test]
    async fn test_rooms_of() {
        let rooms = RoomIndex::new();
        rooms.join("a", "u1").await;
        rooms.join("b", "u1").await;
        rooms.join("b", "u2").await;

        let mut of_u1 = rooms.rooms_of("u1").await;
        of_u1.sort();
        assert_eq!(of_u1, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(rooms.rooms_of("u2").await, vec!["b".to_string()]);
        assert_eq!(rooms.count().await, 2);
    }
}

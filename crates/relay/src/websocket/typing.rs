//! Typing coordinator
//!
//! Per (room, identity) typing state machine with automatic inactivity
//! expiry. Start/stop broadcasts are edge-triggered: repeated starts while
//! already typing rearm the timer without re-announcing.
//!
//! The rearm-vs-fire race is resolved with a monotonic generation counter:
//! every start stamps the entry with a fresh generation and spawns an expiry
//! task carrying that generation; the expiry acts only if the stored
//! generation still matches, so a superseded timer can never fire late.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use super::events::ServerEvent;
use super::fanout::Fanout;

struct TypingEntry {
    generation: u64,
    display_name: String,
}

/// Tracks who is typing in which room, with self-healing timeouts
#[derive(Clone)]
pub struct TypingCoordinator {
    /// room id -> identity id -> current typing entry
    entries: Arc<RwLock<HashMap<String, HashMap<String, TypingEntry>>>>,
    next_generation: Arc<AtomicU64>,
    fanout: Fanout,
    timeout: Duration,
}

impl TypingCoordinator {
    /// Create a coordinator with the given inactivity timeout
    pub fn new(fanout: Fanout, timeout: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            next_generation: Arc::new(AtomicU64::new(0)),
            fanout,
            timeout,
        }
    }

    /// Mark an identity as typing in a room and (re)arm its expiry timer
    ///
    /// Broadcasts `typing_start` to the rest of the room only on the
    /// idle -> typing transition.
    pub async fn start(&self, room_id: &str, identity_id: &str, display_name: &str) {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);

        let was_typing = {
            let mut entries = self.entries.write().await;
            let room = entries.entry(room_id.to_string()).or_default();
            room.insert(
                identity_id.to_string(),
                TypingEntry {
                    generation,
                    display_name: display_name.to_string(),
                },
            )
            .is_some()
        };

        if !was_typing {
            tracing::debug!(
                room_id = %room_id,
                identity_id = %identity_id,
                "Typing started"
            );
            self.fanout
                .room_except(
                    room_id,
                    identity_id,
                    ServerEvent::TypingStart {
                        room_id: room_id.to_string(),
                        identity_id: identity_id.to_string(),
                        display_name: display_name.to_string(),
                    },
                )
                .await;
        }

        // The deadline is fixed here, not when the spawned task first polls,
        // so rearming is synchronous with the call
        let deadline = tokio::time::Instant::now() + self.timeout;
        let coordinator = self.clone();
        let room_id = room_id.to_string();
        let identity_id = identity_id.to_string();
        tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            coordinator.expire(&room_id, &identity_id, generation).await;
        });
    }

    /// Clear an identity's typing state in a room
    ///
    /// Idempotent: broadcasts `typing_stop` room-wide (stopper included)
    /// only if the identity was actually marked typing. Removing the entry
    /// also invalidates any pending expiry timer for the pair.
    pub async fn stop(&self, room_id: &str, identity_id: &str) {
        if let Some(display_name) = self.remove_entry(room_id, identity_id, None).await {
            self.broadcast_stop(room_id, identity_id, display_name).await;
        }
    }

    /// Clear an identity's typing state across every room (disconnect path)
    pub async fn stop_all(&self, identity_id: &str) {
        let typing_rooms: Vec<String> = {
            let entries = self.entries.read().await;
            entries
                .iter()
                .filter(|(_, room)| room.contains_key(identity_id))
                .map(|(room_id, _)| room_id.clone())
                .collect()
        };

        for room_id in typing_rooms {
            self.stop(&room_id, identity_id).await;
        }
    }

    /// True if the identity is currently marked typing in the room
    pub async fn is_typing(&self, room_id: &str, identity_id: &str) -> bool {
        let entries = self.entries.read().await;
        entries
            .get(room_id)
            .is_some_and(|room| room.contains_key(identity_id))
    }

    /// Timer-driven stop, gated on the generation still being current
    async fn expire(&self, room_id: &str, identity_id: &str, generation: u64) {
        if let Some(display_name) = self
            .remove_entry(room_id, identity_id, Some(generation))
            .await
        {
            tracing::debug!(
                room_id = %room_id,
                identity_id = %identity_id,
                "Typing expired"
            );
            self.broadcast_stop(room_id, identity_id, display_name).await;
        }
    }

    /// Remove the pair's entry, pruning the room map if it empties
    ///
    /// When a generation is given, removal happens only if it matches the
    /// stored one (a mismatch means the timer was superseded by a rearm).
    /// Returns the display name recorded at start time if an entry was
    /// actually removed.
    async fn remove_entry(
        &self,
        room_id: &str,
        identity_id: &str,
        generation: Option<u64>,
    ) -> Option<String> {
        let mut entries = self.entries.write().await;
        let room = entries.get_mut(room_id)?;
        let current = room.get(identity_id)?;
        if let Some(generation) = generation {
            if current.generation != generation {
                return None;
            }
        }

        let removed = room.remove(identity_id);
        if room.is_empty() {
            entries.remove(room_id);
        }
        removed.map(|entry| entry.display_name)
    }

    async fn broadcast_stop(&self, room_id: &str, identity_id: &str, display_name: String) {
        self.fanout
            .room(
                room_id,
                ServerEvent::TypingStop {
                    room_id: room_id.to_string(),
                    identity_id: identity_id.to_string(),
                    display_name,
                },
            )
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::websocket::connection::{Connection, ConnectionMap};
    use crate::websocket::presence::PresenceRegistry;
    use crate::websocket::rooms::RoomIndex;
    use tokio::sync::mpsc;

    struct Fixture {
        presence: PresenceRegistry,
        rooms: RoomIndex,
        typing: TypingCoordinator,
    }

    fn fixture(timeout_ms: u64) -> Fixture {
        let presence = PresenceRegistry::new();
        let rooms = RoomIndex::new();
        let fanout = Fanout::new(presence.clone(), rooms.clone(), ConnectionMap::new());
        let typing = TypingCoordinator::new(fanout, Duration::from_millis(timeout_ms));
        Fixture {
            presence,
            rooms,
            typing,
        }
    }

    async fn member(fx: &Fixture, id: &str, room: &str) -> mpsc::UnboundedReceiver<ServerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        fx.presence
            .register(id, id, None, Arc::new(Connection::new(tx)))
            .await;
        fx.rooms.join(room, id).await;
        rx
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<ServerEvent>) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn starts(events: &[ServerEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, ServerEvent::TypingStart { .. }))
            .count()
    }

    fn stops(events: &[ServerEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, ServerEvent::TypingStop { .. }))
            .count()
    }

    /// Let spawned expiry tasks run without letting the paused clock
    /// auto-advance.
    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_is_edge_triggered() {
        let fx = fixture(3000);
        let _alice = member(&fx, "alice", "general").await;
        let mut bob = member(&fx, "bob", "general").await;

        for _ in 0..5 {
            fx.typing.start("general", "alice", "alice").await;
        }
        settle().await;

        assert_eq!(starts(&drain(&mut bob)), 1);
        assert!(fx.typing.is_typing("general", "alice").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_fires_exactly_once_at_boundary() {
        let fx = fixture(3000);
        let _alice = member(&fx, "alice", "general").await;
        let mut bob = member(&fx, "bob", "general").await;

        fx.typing.start("general", "alice", "alice").await;
        settle().await;

        tokio::time::advance(Duration::from_millis(2999)).await;
        settle().await;
        assert_eq!(stops(&drain(&mut bob)), 0);
        assert!(fx.typing.is_typing("general", "alice").await);

        tokio::time::advance(Duration::from_millis(1)).await;
        settle().await;
        assert_eq!(stops(&drain(&mut bob)), 1);
        assert!(!fx.typing.is_typing("general", "alice").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rearm_invalidates_previous_timer() {
        let fx = fixture(3000);
        let _alice = member(&fx, "alice", "general").await;
        let mut bob = member(&fx, "bob", "general").await;

        fx.typing.start("general", "alice", "alice").await;
        tokio::time::advance(Duration::from_millis(2000)).await;
        settle().await;

        // Rearm: the timer armed at t=0 must not fire at t=3000
        fx.typing.start("general", "alice", "alice").await;
        tokio::time::advance(Duration::from_millis(2999)).await;
        settle().await;
        let before_deadline = drain(&mut bob);
        assert_eq!(stops(&before_deadline), 0);
        assert!(fx.typing.is_typing("general", "alice").await);

        // The rearmed timer fires at t=2000+3000
        tokio::time::advance(Duration::from_millis(1)).await;
        settle().await;
        let at_deadline = drain(&mut bob);
        assert_eq!(stops(&at_deadline), 1);

        // Exactly one start broadcast across both arms
        assert_eq!(starts(&before_deadline) + starts(&at_deadline), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_explicit_stop_broadcasts_room_wide_once() {
        let fx = fixture(3000);
        let mut alice = member(&fx, "alice", "general").await;
        let mut bob = member(&fx, "bob", "general").await;

        fx.typing.start("general", "alice", "alice").await;
        fx.typing.stop("general", "alice").await;
        settle().await;

        // Stop broadcast includes the stopper
        assert_eq!(stops(&drain(&mut alice)), 1);
        assert_eq!(stops(&drain(&mut bob)), 1);

        // Stop on an already-idle pair is a silent no-op
        fx.typing.stop("general", "alice").await;
        settle().await;
        assert_eq!(stops(&drain(&mut alice)), 0);
        assert_eq!(stops(&drain(&mut bob)), 0);

        // The pending timer was invalidated by the explicit stop
        tokio::time::advance(Duration::from_millis(3000)).await;
        settle().await;
        assert_eq!(stops(&drain(&mut bob)), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_all_clears_every_room() {
        let fx = fixture(3000);
        let _alice_a = member(&fx, "alice", "a").await;
        let mut bob_a = member(&fx, "bob", "a").await;
        fx.rooms.join("b", "alice").await;
        fx.rooms.join("b", "bob").await;

        fx.typing.start("a", "alice", "alice").await;
        fx.typing.start("b", "alice", "alice").await;
        settle().await;
        drain(&mut bob_a);

        fx.typing.stop_all("alice").await;
        settle().await;

        assert!(!fx.typing.is_typing("a", "alice").await);
        assert!(!fx.typing.is_typing("b", "alice").await);
        // bob is in both rooms, so they see one stop per room
        assert_eq!(stops(&drain(&mut bob_a)), 2);
    }
}

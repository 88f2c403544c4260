//! Message router
//!
//! Builds message and reaction events (generated id + timestamp) and fans
//! them out: room broadcast, private unicast with sender confirmation, or
//! sender-only failure notice. Nothing here is persisted; events exist only
//! for the duration of fan-out.

use time::OffsetDateTime;
use uuid::Uuid;

use super::connection::Connection;
use super::events::{MessageEvent, MessageKind, PrivateMessageEvent, ReactionEvent, ServerEvent};
use super::fanout::Fanout;

/// Message body fields shared by room and private sends
#[derive(Debug, Clone)]
pub struct MessageBody {
    pub content: String,
    pub kind: MessageKind,
    pub file_url: Option<String>,
    pub file_name: Option<String>,
    pub file_size: Option<u64>,
}

/// Routes chat messages and reactions to their destinations
#[derive(Clone)]
pub struct MessageRouter {
    fanout: Fanout,
}

impl MessageRouter {
    /// Create a router over the given fan-out
    pub fn new(fanout: Fanout) -> Self {
        Self { fanout }
    }

    /// Broadcast a message to every current member of a room, sender included
    pub async fn route_room_message(
        &self,
        sender_id: &str,
        sender_name: &str,
        room_id: String,
        body: MessageBody,
    ) {
        let message = MessageEvent {
            id: Uuid::new_v4(),
            room_id: room_id.clone(),
            sender_id: sender_id.to_string(),
            sender_name: sender_name.to_string(),
            content: body.content,
            message_kind: body.kind,
            file_url: body.file_url,
            file_name: body.file_name,
            file_size: body.file_size,
            created_at: OffsetDateTime::now_utc(),
        };

        tracing::debug!(
            room_id = %room_id,
            sender_id = %sender_id,
            message_id = %message.id,
            "Routing room message"
        );

        self.fanout
            .room(&room_id, ServerEvent::MessageReceived { message })
            .await;
    }

    /// Deliver a private message to the recipient's live connection
    ///
    /// On success the sender gets a separate sent-confirmation copy; if the
    /// recipient is not currently online, the sender gets a failure notice
    /// and the message is dropped, not queued.
    pub async fn route_private_message(
        &self,
        sender_id: &str,
        sender_name: &str,
        sender_conn: &Connection,
        recipient_id: String,
        body: MessageBody,
    ) {
        let message = PrivateMessageEvent {
            id: Uuid::new_v4(),
            recipient_id: recipient_id.clone(),
            sender_id: sender_id.to_string(),
            sender_name: sender_name.to_string(),
            content: body.content,
            message_kind: body.kind,
            file_url: body.file_url,
            file_name: body.file_name,
            file_size: body.file_size,
            created_at: OffsetDateTime::now_utc(),
        };

        let delivered = self
            .fanout
            .identity(
                &recipient_id,
                ServerEvent::PrivateMessageReceived {
                    message: message.clone(),
                },
            )
            .await;

        if delivered {
            let _ = sender_conn.send(ServerEvent::PrivateMessageSent { message });
        } else {
            tracing::debug!(
                sender_id = %sender_id,
                recipient_id = %recipient_id,
                "Private message recipient offline"
            );
            let _ = sender_conn.send(ServerEvent::PrivateMessageFailed {
                error: "recipient offline".to_string(),
            });
        }
    }

    /// Broadcast a reaction add to the room named in the payload
    ///
    /// Reactions are room-scoped only; without a room id the event is
    /// silently dropped.
    pub async fn route_reaction_add(
        &self,
        sender_id: &str,
        sender_name: &str,
        message_id: String,
        emoji: String,
        room_id: Option<String>,
    ) {
        let Some(room_id) = room_id else {
            tracing::debug!(sender_id = %sender_id, "Dropping reaction without room id");
            return;
        };

        let reaction = ReactionEvent {
            id: Uuid::new_v4(),
            message_id,
            identity_id: sender_id.to_string(),
            display_name: sender_name.to_string(),
            emoji,
            created_at: OffsetDateTime::now_utc(),
        };

        self.fanout
            .room(&room_id, ServerEvent::ReactionAdded { reaction })
            .await;
    }

    /// Broadcast a reaction removal to the room named in the payload
    pub async fn route_reaction_remove(
        &self,
        sender_id: &str,
        message_id: String,
        emoji: String,
        room_id: Option<String>,
    ) {
        let Some(room_id) = room_id else {
            tracing::debug!(sender_id = %sender_id, "Dropping reaction without room id");
            return;
        };

        self.fanout
            .room(
                &room_id,
                ServerEvent::ReactionRemoved {
                    message_id,
                    identity_id: sender_id.to_string(),
                    emoji,
                },
            )
            .await;
    }
}

//! WebSocket event types and serialization
//!
//! Defines all client-to-server and server-to-client event types
//! with type-safe serde serialization.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

// =============================================================================
// Client-to-Server Events
// =============================================================================

/// Events sent from client to server
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Bind an authenticated identity to this connection
    IdentityJoin {
        identity_id: String,
        display_name: String,
        #[serde(default)]
        avatar_url: Option<String>,
    },

    /// Join a chat room
    RoomJoin { room_id: String },

    /// Leave a chat room
    RoomLeave { room_id: String },

    /// Send a message to a room
    MessageSend {
        room_id: String,
        content: String,
        #[serde(default)]
        message_kind: MessageKind,
        #[serde(default)]
        file_url: Option<String>,
        #[serde(default)]
        file_name: Option<String>,
        #[serde(default)]
        file_size: Option<u64>,
    },

    /// Send a private message to another identity
    MessagePrivate {
        recipient_id: String,
        content: String,
        #[serde(default)]
        message_kind: MessageKind,
        #[serde(default)]
        file_url: Option<String>,
        #[serde(default)]
        file_name: Option<String>,
        #[serde(default)]
        file_size: Option<u64>,
    },

    /// Start typing in a room
    TypingStart { room_id: String },

    /// Stop typing in a room
    TypingStop { room_id: String },

    /// Add an emoji reaction to a message
    ReactionAdd {
        message_id: String,
        emoji: String,
        #[serde(default)]
        room_id: Option<String>,
    },

    /// Remove an emoji reaction from a message
    ReactionRemove {
        message_id: String,
        emoji: String,
        #[serde(default)]
        room_id: Option<String>,
    },

    /// Update presence status ("online" | "away" | ...)
    StatusUpdate { status: String },
}

// =============================================================================
// Server-to-Client Events
// =============================================================================

/// Events sent from server to client
#[derive(Debug, Serialize, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Connection acknowledged
    Connected { session_id: Uuid },

    /// Full snapshot of currently online identities
    OnlineList { identities: Vec<OnlineIdentity> },

    /// An identity changed its presence status
    StatusChanged {
        identity_id: String,
        status: String,
        #[serde(with = "time::serde::rfc3339")]
        last_seen: OffsetDateTime,
    },

    /// An identity joined a room
    MemberJoined {
        room_id: String,
        identity_id: String,
        display_name: String,
    },

    /// An identity left a room
    MemberLeft {
        room_id: String,
        identity_id: String,
        display_name: String,
    },

    /// Room message broadcast (sender included)
    MessageReceived { message: MessageEvent },

    /// Private message delivered to the recipient
    PrivateMessageReceived { message: PrivateMessageEvent },

    /// Sent-confirmation copy delivered to the sender
    PrivateMessageSent { message: PrivateMessageEvent },

    /// Private message could not be delivered
    PrivateMessageFailed { error: String },

    /// An identity started typing in a room
    TypingStart {
        room_id: String,
        identity_id: String,
        display_name: String,
    },

    /// An identity stopped typing in a room
    TypingStop {
        room_id: String,
        identity_id: String,
        display_name: String,
    },

    /// Emoji reaction added to a message
    ReactionAdded { reaction: ReactionEvent },

    /// Emoji reaction removed from a message
    ReactionRemoved {
        message_id: String,
        identity_id: String,
        emoji: String,
    },

    /// Error message
    Error { message: String },
}

// =============================================================================
// Event Data Structures
// =============================================================================

/// Message kind carried by room and private messages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    #[default]
    Text,
    Image,
    File,
    Video,
}

/// Publicly visible state of a connected identity
#[derive(Debug, Serialize, Clone)]
pub struct OnlineIdentity {
    pub id: String,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub status: String,
    #[serde(with = "time::serde::rfc3339")]
    pub last_seen: OffsetDateTime,
}

/// Room message event data
#[derive(Debug, Serialize, Clone)]
pub struct MessageEvent {
    pub id: Uuid,
    pub room_id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub content: String,
    pub message_kind: MessageKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Private message event data
#[derive(Debug, Serialize, Clone)]
pub struct PrivateMessageEvent {
    pub id: Uuid,
    pub recipient_id: String,
    pub sender_id: String,
    pub sender_name: String,
    pub content: String,
    pub message_kind: MessageKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Reaction event data
#[derive(Debug, Serialize, Clone)]
pub struct ReactionEvent {
    pub id: Uuid,
    pub message_id: String,
    pub identity_id: String,
    pub display_name: String,
    pub emoji: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

//! WebSocket handler for Axum
//!
//! Owns the per-connection lifecycle: upgrade, identity binding, event
//! dispatch into the relay's state containers, and disconnect cleanup.

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{stream::StreamExt, SinkExt};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::state::AppState;

use super::{
    connection::Connection,
    events::{ClientEvent, ServerEvent},
    router::MessageBody,
    state::RelayState,
};

/// Per-connection lifecycle state
///
/// A connection starts unidentified; `identity_join` moves it to identified
/// and unlocks the remaining operations.
#[derive(Default)]
struct Session {
    identity: Option<SessionIdentity>,
}

struct SessionIdentity {
    id: String,
    display_name: String,
}

/// WebSocket handler - upgrades HTTP connection to WebSocket
pub async fn ws_handler(ws: WebSocketUpgrade, State(app_state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state.relay.clone()))
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, relay: RelayState) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    // Channel for pushing events to this connection's writer task
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();
    let conn = Arc::new(Connection::new(tx));
    let session_id = conn.session_id;
    relay.connections.insert(Arc::clone(&conn)).await;

    tracing::info!(session_id = %session_id, "WebSocket connection opened");

    // Connection acknowledgment
    let _ = conn.send(ServerEvent::Connected { session_id });

    // Writer task: serialize and forward events to the socket
    let send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => {
                    if ws_sender.send(Message::Text(json)).await.is_err() {
                        break; // Connection closed
                    }
                }
                Err(e) => {
                    tracing::error!(error = ?e, "Failed to serialize WebSocket event");
                }
            }
        }
    });

    // Read loop: one handler invocation per inbound event
    let mut session = Session::default();
    while let Some(msg) = ws_receiver.next().await {
        let Ok(msg) = msg else { break };
        match msg {
            Message::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => {
                    handle_client_event(event, &conn, &mut session, &relay).await;
                }
                Err(e) => {
                    tracing::warn!(
                        error = ?e,
                        session_id = %session_id,
                        "Failed to parse client event"
                    );
                    let _ = conn.send(ServerEvent::Error {
                        message: "Invalid event format".to_string(),
                    });
                }
            },
            Message::Close(_) => {
                tracing::info!(session_id = %session_id, "WebSocket close frame received");
                break;
            }
            Message::Ping(_) | Message::Pong(_) => {
                // Axum handles ping/pong automatically
            }
            _ => {} // Ignore binary messages
        }
    }

    tracing::info!(session_id = %session_id, "WebSocket connection closing");
    relay.connections.remove(&session_id).await;
    disconnect_cleanup(&conn, &session, &relay).await;
    send_task.abort();
}

/// Handle client event
async fn handle_client_event(
    event: ClientEvent,
    conn: &Arc<Connection>,
    session: &mut Session,
    relay: &RelayState,
) {
    // identity_join is the only event legal before identification
    match event {
        ClientEvent::IdentityJoin {
            identity_id,
            display_name,
            avatar_url,
        } => {
            relay
                .presence
                .register(&identity_id, &display_name, avatar_url, Arc::clone(conn))
                .await;
            session.identity = Some(SessionIdentity {
                id: identity_id,
                display_name,
            });

            let identities = relay.presence.list_online().await;
            relay
                .fanout
                .broadcast_all(ServerEvent::OnlineList { identities })
                .await;
        }

        event => {
            let Some(identity) = session.identity.as_ref() else {
                tracing::debug!(
                    session_id = %conn.session_id,
                    "Dropping event from unidentified connection"
                );
                let _ = conn.send(ServerEvent::Error {
                    message: "identity_join required".to_string(),
                });
                return;
            };
            handle_identified_event(event, identity, conn, relay).await;
        }
    }
}

/// Handle events that require a bound identity
async fn handle_identified_event(
    event: ClientEvent,
    identity: &SessionIdentity,
    conn: &Arc<Connection>,
    relay: &RelayState,
) {
    use ClientEvent::*;

    match event {
        // Bound by the caller before dispatching here
        IdentityJoin { .. } => {}

        RoomJoin { room_id } => {
            if relay.rooms.join(&room_id, &identity.id).await {
                relay
                    .fanout
                    .room_except(
                        &room_id,
                        &identity.id,
                        ServerEvent::MemberJoined {
                            room_id: room_id.clone(),
                            identity_id: identity.id.clone(),
                            display_name: identity.display_name.clone(),
                        },
                    )
                    .await;
            }
        }

        RoomLeave { room_id } => {
            // Typing cleanup is part of the same logical leave operation:
            // a departed member cannot be typing
            relay.typing.stop(&room_id, &identity.id).await;
            if relay.rooms.leave(&room_id, &identity.id).await {
                relay
                    .fanout
                    .room(
                        &room_id,
                        ServerEvent::MemberLeft {
                            room_id: room_id.clone(),
                            identity_id: identity.id.clone(),
                            display_name: identity.display_name.clone(),
                        },
                    )
                    .await;
            }
        }

        MessageSend {
            room_id,
            content,
            message_kind,
            file_url,
            file_name,
            file_size,
        } => {
            relay
                .router
                .route_room_message(
                    &identity.id,
                    &identity.display_name,
                    room_id,
                    MessageBody {
                        content,
                        kind: message_kind,
                        file_url,
                        file_name,
                        file_size,
                    },
                )
                .await;
        }

        MessagePrivate {
            recipient_id,
            content,
            message_kind,
            file_url,
            file_name,
            file_size,
        } => {
            relay
                .router
                .route_private_message(
                    &identity.id,
                    &identity.display_name,
                    conn,
                    recipient_id,
                    MessageBody {
                        content,
                        kind: message_kind,
                        file_url,
                        file_name,
                        file_size,
                    },
                )
                .await;
        }

        TypingStart { room_id } => {
            relay
                .typing
                .start(&room_id, &identity.id, &identity.display_name)
                .await;
        }

        TypingStop { room_id } => {
            relay.typing.stop(&room_id, &identity.id).await;
        }

        ReactionAdd {
            message_id,
            emoji,
            room_id,
        } => {
            relay
                .router
                .route_reaction_add(
                    &identity.id,
                    &identity.display_name,
                    message_id,
                    emoji,
                    room_id,
                )
                .await;
        }

        ReactionRemove {
            message_id,
            emoji,
            room_id,
        } => {
            relay
                .router
                .route_reaction_remove(&identity.id, message_id, emoji, room_id)
                .await;
        }

        StatusUpdate { status } => {
            if let Some(last_seen) = relay.presence.update_status(&identity.id, &status).await {
                relay
                    .fanout
                    .broadcast_all(ServerEvent::StatusChanged {
                        identity_id: identity.id.clone(),
                        status,
                        last_seen,
                    })
                    .await;
            }
        }
    }
}

/// Disconnect cleanup
///
/// Order matters for broadcast correctness: typing stops and room leaves
/// emit their normal notifications first, then the identity is deregistered
/// and the refreshed online list broadcast. Safe to invoke repeatedly; a
/// never-identified connection is a pure no-op.
async fn disconnect_cleanup(conn: &Connection, session: &Session, relay: &RelayState) {
    let Some(identity) = session.identity.as_ref() else {
        return;
    };

    // A superseded connection's late disconnect must leave the fresh
    // binding's typing and room state untouched, not just its presence row
    let still_bound = relay
        .presence
        .connection_of(&identity.id)
        .await
        .is_some_and(|bound| bound.session_id == conn.session_id);
    if !still_bound {
        tracing::debug!(
            session_id = %conn.session_id,
            identity_id = %identity.id,
            "Skipping cleanup for superseded connection"
        );
        return;
    }

    relay.typing.stop_all(&identity.id).await;

    for room_id in relay.rooms.rooms_of(&identity.id).await {
        if relay.rooms.leave(&room_id, &identity.id).await {
            relay
                .fanout
                .room(
                    &room_id,
                    ServerEvent::MemberLeft {
                        room_id: room_id.clone(),
                        identity_id: identity.id.clone(),
                        display_name: identity.display_name.clone(),
                    },
                )
                .await;
        }
    }

    if relay
        .presence
        .deregister(&identity.id, &conn.session_id)
        .await
    {
        let identities = relay.presence.list_online().await;
        relay
            .fanout
            .broadcast_all(ServerEvent::OnlineList { identities })
            .await;
    }
}

/**
 * Room Socket Handlers
 *
 * `GET /rooms/{room_id}/ws` upgrades to a WebSocket and runs one connection
 * loop per client:
 *
 * - text frames are parsed as envelopes; frames that break the protocol
 *   (malformed, addressed to another room, client-sent presence) are logged
 *   and skipped
 * - a `join` registers the connection in the room's presence, is relayed to the
 *   other members, and triggers a `presence_update` to everyone
 * - every other envelope is relayed verbatim to the other members
 * - on disconnect the member is removed and presence is rebroadcast
 */

use axum::{
    extract::{
        ws::{Message, WebSocket},
        Path, State, WebSocketUpgrade,
    },
    response::Response,
    Json,
};
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use crate::backend::error::BackendError;
use crate::backend::realtime::broadcast::RelayFrame;
use crate::backend::rooms::state::{RoomRegistry, RoomSummary};
use crate::shared::event::{Envelope, PresencePayload, RoomEvent};
use crate::shared::participant::{Participant, RoomId};

/// Upgrade a request on `/rooms/{room_id}/ws`
pub async fn handle_room_socket(
    ws: WebSocketUpgrade,
    Path(room_id): Path<String>,
    State(registry): State<RoomRegistry>,
) -> Result<Response, BackendError> {
    let room_id = RoomId::parse(&room_id)?;
    Ok(ws.on_upgrade(move |socket| run_connection(socket, room_id, registry)))
}

/// `GET /rooms`
pub async fn list_rooms(State(registry): State<RoomRegistry>) -> Json<Vec<RoomSummary>> {
    Json(registry.rooms().await)
}

/// `GET /health`
pub async fn health() -> &'static str {
    "ok"
}

async fn run_connection(mut socket: WebSocket, room_id: RoomId, registry: RoomRegistry) {
    let conn = Uuid::new_v4();
    let mut frames = registry.subscribe(&room_id).await;
    tracing::info!("[Relay] Connection {} opened on {}", conn, room_id);

    loop {
        tokio::select! {
            frame = frames.recv() => match frame {
                Ok(frame) => {
                    if !frame.is_for(conn) {
                        continue;
                    }
                    if socket.send(Message::Text(frame.text.to_string().into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("[Relay] Connection {} lagged, skipped {} frames", conn, skipped);
                }
                Err(RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    if let Err(e) = handle_frame(&registry, &room_id, conn, text.as_str()).await {
                        if e.status_code().is_server_error() {
                            tracing::error!("[Relay] Frame from {} failed: {}", conn, e);
                        } else {
                            tracing::warn!("[Relay] Skipping frame from {}: {}", conn, e);
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!("[Relay] Connection {} failed: {}", conn, e);
                    break;
                }
            },
        }
    }

    if let Some(participants) = registry.leave(&room_id, conn).await {
        if let Err(e) = publish_presence(&registry, &room_id, participants).await {
            tracing::error!("[Relay] Presence after {} left {}: {}", conn, room_id, e);
        }
    }
    tracing::info!("[Relay] Connection {} closed on {}", conn, room_id);
}

async fn handle_frame(
    registry: &RoomRegistry,
    room_id: &RoomId,
    conn: Uuid,
    text: &str,
) -> Result<(), BackendError> {
    let envelope = Envelope::from_json(text)
        .map_err(|e| BackendError::protocol(format!("malformed frame: {}", e)))?;

    if let Some(target) = envelope.event.room_id() {
        if target != room_id {
            return Err(BackendError::protocol(format!(
                "{} addressed to {} on {}",
                envelope.event.name(),
                target,
                room_id
            )));
        }
    }

    match &envelope.event {
        RoomEvent::Join(payload) => {
            let participants = registry.join(room_id, conn, payload.participant.clone()).await;
            registry
                .publish(room_id, RelayFrame::from_connection(conn, text))
                .await;
            publish_presence(registry, room_id, participants).await
        }
        RoomEvent::PresenceUpdate(_) => Err(BackendError::protocol(
            "presence_update is only sent by the relay",
        )),
        _ => {
            let reached = registry
                .publish(room_id, RelayFrame::from_connection(conn, text))
                .await;
            tracing::debug!(
                "[Relay] {} from {} relayed ({} receivers)",
                envelope.event.name(),
                conn,
                reached.saturating_sub(1)
            );
            Ok(())
        }
    }
}

async fn publish_presence(
    registry: &RoomRegistry,
    room_id: &RoomId,
    participants: Vec<Participant>,
) -> Result<(), BackendError> {
    let event = RoomEvent::PresenceUpdate(PresencePayload { participants });
    let text = Envelope::from_relay(event).to_json()?;
    registry.publish(room_id, RelayFrame::from_relay(text)).await;
    Ok(())
}

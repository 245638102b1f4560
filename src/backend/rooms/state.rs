/**
 * Room Registry
 *
 * One entry per active room: the room's broadcast channel and its presence
 * list, keyed by connection. The relay never looks inside positions or
 * annotations; presence is the only room state it keeps.
 */

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::backend::realtime::broadcast::{broadcast_frame, RelayFrame, RoomBroadcast};
use crate::shared::participant::{Participant, RoomId};

struct Room {
    sender: RoomBroadcast,
    /// Members in join order
    members: Vec<(Uuid, Participant)>,
}

impl Room {
    fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            members: Vec::new(),
        }
    }

    /// Presence snapshot; a participant connected twice is listed once.
    fn snapshot(&self) -> Vec<Participant> {
        let mut participants: Vec<Participant> = Vec::with_capacity(self.members.len());
        for (_, participant) in &self.members {
            if !participants.iter().any(|p| p.id == participant.id) {
                participants.push(participant.clone());
            }
        }
        participants
    }
}

/// Room listing entry served by `GET /rooms`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub room_id: RoomId,
    pub members: usize,
}

/// Shared registry of active rooms
#[derive(Clone)]
pub struct RoomRegistry {
    rooms: Arc<RwLock<HashMap<RoomId, Room>>>,
    capacity: usize,
}

impl RoomRegistry {
    pub fn new(capacity: usize) -> Self {
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            capacity: capacity.max(1),
        }
    }

    /// Receiver for a room's frames, creating the room on first use
    pub async fn subscribe(&self, room_id: &RoomId) -> broadcast::Receiver<RelayFrame> {
        let mut rooms = self.rooms.write().await;
        rooms
            .entry(room_id.clone())
            .or_insert_with(|| Room::new(self.capacity))
            .sender
            .subscribe()
    }

    /// Register `participant` under connection `conn` and return the new
    /// presence snapshot. A repeated join from the same connection replaces
    /// its entry.
    pub async fn join(&self, room_id: &RoomId, conn: Uuid, participant: Participant) -> Vec<Participant> {
        let mut rooms = self.rooms.write().await;
        let room = rooms
            .entry(room_id.clone())
            .or_insert_with(|| Room::new(self.capacity));
        match room.members.iter_mut().find(|(id, _)| *id == conn) {
            Some(entry) => entry.1 = participant,
            None => room.members.push((conn, participant)),
        }
        tracing::info!("[Relay] {} now has {} members", room_id, room.members.len());
        room.snapshot()
    }

    /// Remove connection `conn`. Returns the new snapshot when it was a
    /// member, `None` when it never joined.
    pub async fn leave(&self, room_id: &RoomId, conn: Uuid) -> Option<Vec<Participant>> {
        let mut rooms = self.rooms.write().await;
        let room = rooms.get_mut(room_id)?;
        let before = room.members.len();
        room.members.retain(|(id, _)| *id != conn);
        if room.members.len() == before {
            return None;
        }
        tracing::info!("[Relay] {} now has {} members", room_id, room.members.len());
        Some(room.snapshot())
    }

    /// Current presence snapshot of a room (empty for unknown rooms)
    pub async fn presence(&self, room_id: &RoomId) -> Vec<Participant> {
        let rooms = self.rooms.read().await;
        rooms.get(room_id).map(Room::snapshot).unwrap_or_default()
    }

    /// Publish a frame to a room. Returns the receiver count.
    pub async fn publish(&self, room_id: &RoomId, frame: RelayFrame) -> usize {
        let rooms = self.rooms.read().await;
        match rooms.get(room_id) {
            Some(room) => broadcast_frame(&room.sender, frame),
            None => {
                tracing::debug!("[Relay] Dropping frame for unknown room {}", room_id);
                0
            }
        }
    }

    /// Active rooms, sorted by id
    pub async fn rooms(&self) -> Vec<RoomSummary> {
        let rooms = self.rooms.read().await;
        let mut summaries: Vec<RoomSummary> = rooms
            .iter()
            .map(|(room_id, room)| RoomSummary {
                room_id: room_id.clone(),
                members: room.snapshot().len(),
            })
            .collect();
        summaries.sort_by(|a, b| a.room_id.cmp(&b.room_id));
        summaries
    }

    /// Drop rooms with no members and no open receivers. Returns how many
    /// were removed.
    pub async fn cleanup_empty_rooms(&self) -> usize {
        let mut rooms = self.rooms.write().await;
        let before = rooms.len();
        rooms.retain(|_, room| !room.members.is_empty() || room.sender.receiver_count() > 0);
        before - rooms.len()
    }
}

/**
 * Room Event Vocabulary
 *
 * Every message exchanged over a room channel is an `Envelope` wrapping one
 * `RoomEvent`. On the wire the event is adjacently tagged:
 *
 * ```json
 * {"sender":"u1","seq":7,"sentAt":"...","event":"move","payload":{"roomId":"r1","fen":"..."}}
 * ```
 *
 * `sender` names the participant; `connection` names the transport link the
 * envelope left through, stamped by the transport. One participant may be
 * connected more than once (two browser tabs), so ordering is per connection:
 * `seq` is monotonic within a connection and lets a receiver drop stale or
 * replayed envelopes. Envelopes produced by the relay itself (presence
 * snapshots) carry neither.
 */
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::board::annotation::AnnotationSet;
use crate::board::control::ControlAssignment;
use crate::board::position::MovePayload;
use crate::shared::message::ChatLine;
use crate::shared::participant::{Participant, ParticipantId, RoomId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinPayload {
    pub room_id: RoomId,
    pub participant: Participant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresencePayload {
    pub participants: Vec<Participant>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveMessage {
    pub room_id: RoomId,
    #[serde(flatten)]
    pub update: MovePayload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationMessage {
    pub room_id: RoomId,
    #[serde(flatten)]
    pub set: AnnotationSet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControlsMessage {
    pub room_id: RoomId,
    pub controls: ControlAssignment,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRequest {
    pub room_id: RoomId,
}

/// Event exchanged over a room channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "snake_case")]
pub enum RoomEvent {
    /// Announce presence
    Join(JoinPayload),
    /// Full membership snapshot, produced by the relay
    PresenceUpdate(PresencePayload),
    /// Full-position replace or incremental standard move
    Move(MoveMessage),
    /// Full annotation replace
    Annotations(AnnotationMessage),
    /// Append-only chat line
    Chat(ChatLine),
    /// Full control-assignment replace
    Controls(ControlsMessage),
    /// A late joiner asking the coach to re-send the room state
    SyncRequest(SyncRequest),
}

impl RoomEvent {
    /// Wire name of the event
    pub fn name(&self) -> &'static str {
        match self {
            RoomEvent::Join(_) => "join",
            RoomEvent::PresenceUpdate(_) => "presence_update",
            RoomEvent::Move(_) => "move",
            RoomEvent::Annotations(_) => "annotations",
            RoomEvent::Chat(_) => "chat",
            RoomEvent::Controls(_) => "controls",
            RoomEvent::SyncRequest(_) => "sync_request",
        }
    }

    /// Room the event is addressed to. Presence snapshots are room-implicit.
    pub fn room_id(&self) -> Option<&RoomId> {
        match self {
            RoomEvent::Join(p) => Some(&p.room_id),
            RoomEvent::PresenceUpdate(_) => None,
            RoomEvent::Move(p) => Some(&p.room_id),
            RoomEvent::Annotations(p) => Some(&p.room_id),
            RoomEvent::Chat(p) => Some(&p.room_id),
            RoomEvent::Controls(p) => Some(&p.room_id),
            RoomEvent::SyncRequest(p) => Some(&p.room_id),
        }
    }
}

/// A room event plus ordering metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<ParticipantId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Option<Uuid>,
    #[serde(default)]
    pub seq: u64,
    pub sent_at: String,
    #[serde(flatten)]
    pub event: RoomEvent,
}

impl Envelope {
    /// Wrap an event sent by `sender` as its `seq`-th envelope
    pub fn new(sender: ParticipantId, seq: u64, event: RoomEvent) -> Self {
        Self {
            sender: Some(sender),
            connection: None,
            seq,
            sent_at: get_timestamp(),
            event,
        }
    }

    /// Wrap an event produced by the relay
    pub fn from_relay(event: RoomEvent) -> Self {
        Self {
            sender: None,
            connection: None,
            seq: 0,
            sent_at: get_timestamp(),
            event,
        }
    }

    /// Mark the envelope as sent through `connection`
    pub fn with_connection(mut self, connection: Uuid) -> Self {
        self.connection = Some(connection);
        self
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Get the current timestamp as an RFC3339 string
pub(crate) fn get_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::fen::START_FEN;
    use crate::board::square::Square;
    use serde_json::json;

    fn room() -> RoomId {
        RoomId::parse("lesson-1").unwrap()
    }

    #[test]
    fn test_move_envelope_wire_shape() {
        let envelope = Envelope::new(
            ParticipantId::from("u1"),
            3,
            RoomEvent::Move(MoveMessage {
                room_id: room(),
                update: MovePayload::full(START_FEN),
            }),
        );
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["sender"], "u1");
        assert_eq!(value["seq"], 3);
        assert_eq!(value["event"], "move");
        assert_eq!(
            value["payload"],
            json!({ "roomId": "lesson-1", "fen": START_FEN })
        );
    }

    #[test]
    fn test_incremental_move_round_trip() {
        let update = MovePayload::incremental(
            Square::parse("e2").unwrap(),
            Square::parse("e4").unwrap(),
            None,
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1",
        );
        let envelope = Envelope::new(
            ParticipantId::from("u1"),
            1,
            RoomEvent::Move(MoveMessage { room_id: room(), update }),
        );
        let back = Envelope::from_json(&envelope.to_json().unwrap()).unwrap();
        assert_eq!(back, envelope);
    }

    #[test]
    fn test_connection_id_on_the_wire() {
        let connection = Uuid::new_v4();
        let envelope = Envelope::new(
            ParticipantId::from("c1"),
            1,
            RoomEvent::SyncRequest(SyncRequest { room_id: room() }),
        )
        .with_connection(connection);
        let value = serde_json::to_value(&envelope).unwrap();
        assert_eq!(value["connection"], connection.to_string());

        let bare = r#"{"sender":"c1","seq":1,"sentAt":"x","event":"sync_request","payload":{"roomId":"lesson-1"}}"#;
        assert_eq!(Envelope::from_json(bare).unwrap().connection, None);
    }

    #[test]
    fn test_relay_presence_has_no_sender() {
        let envelope = Envelope::from_relay(RoomEvent::PresenceUpdate(PresencePayload {
            participants: vec![Participant::coach("c1", "Coach")],
        }));
        let value = serde_json::to_value(&envelope).unwrap();
        assert!(value.get("sender").is_none());
        assert_eq!(value["event"], "presence_update");
        assert_eq!(value["payload"]["participants"][0]["role"], "Coach");
    }

    #[test]
    fn test_parse_annotations_from_wire() {
        let text = r#"{
            "sender": "c1", "seq": 9, "sentAt": "2026-01-01T00:00:00Z",
            "event": "annotations",
            "payload": {
                "roomId": "lesson-1",
                "arrows": [{"from": "g1", "to": "f3"}],
                "squares": {"f3": {"background": "yellow"}}
            }
        }"#;
        let envelope = Envelope::from_json(text).unwrap();
        match envelope.event {
            RoomEvent::Annotations(message) => {
                assert_eq!(message.set.arrows.len(), 1);
                assert!(message.set.squares.contains_key(&Square::parse("f3").unwrap()));
            }
            other => panic!("Expected annotations, got {}", other.name()),
        }
    }

    #[test]
    fn test_event_names_and_rooms() {
        let event = RoomEvent::SyncRequest(SyncRequest { room_id: room() });
        assert_eq!(event.name(), "sync_request");
        assert_eq!(event.room_id(), Some(&room()));
        let presence = RoomEvent::PresenceUpdate(PresencePayload { participants: vec![] });
        assert_eq!(presence.room_id(), None);
    }

    #[test]
    fn test_unknown_event_is_rejected() {
        let text = r#"{"seq":1,"sentAt":"x","event":"teleport","payload":{}}"#;
        assert!(Envelope::from_json(text).is_err());
    }
}

/**
 * Classroom Session
 *
 * One participant's engine instance: the position state machine, control
 * manager, annotation channel and playlist navigator, plus the presence list,
 * chat log and connectivity indicator. It is the only component that talks to
 * the transport.
 *
 * ## Flow
 *
 * Local actions commit optimistically and then broadcast. There is no
 * acknowledgement; if the send fails the failure is logged and the local
 * state stays as committed. Incoming envelopes go through `handle_incoming`,
 * which drops the session's own echoes, envelopes for other rooms and stale
 * envelopes before applying the event.
 *
 * ## Ordering
 *
 * Every envelope carries its connection's sequence number. A receiver
 * remembers the highest number seen per connection and drops anything not
 * newer. A `join` restarts that connection's numbering. Envelopes without a
 * connection id fall back to one stream per participant.
 *
 * ## Late joiners
 *
 * A student's `join` is followed by a `sync_request`. Any coach session
 * answers with the full position, the control assignment and the current
 * annotations.
 */
use std::collections::{BTreeMap, HashMap};

use uuid::Uuid;

use crate::board::annotation::{AnnotationChannel, AnnotationSet, Arrow, SquareStyle};
use crate::board::control::ControlManager;
use crate::board::codec::Mode;
use crate::board::playlist::{Chapter, Direction, PlaylistNavigator};
use crate::board::position::{MovePayload, PositionState};
use crate::board::rules::Promotion;
use crate::board::square::{Side, Square};
use crate::client::transport::{ConnectionEvent, ConnectionStatus, RoomTransport, TransportEvent};
use crate::shared::config::AppConfig;
use crate::shared::error::ClassroomError;
use crate::shared::event::{
    AnnotationMessage, ControlsMessage, Envelope, JoinPayload, MoveMessage, RoomEvent, SyncRequest,
};
use crate::shared::message::ChatLine;
use crate::shared::participant::{Participant, ParticipantId, RoomId};

/// Stream a sequence number belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum StreamKey {
    Connection(Uuid),
    Participant(ParticipantId),
}

pub struct ClassroomSession<T: RoomTransport> {
    room_id: RoomId,
    me: Participant,
    transport: T,
    position: PositionState,
    controls: ControlManager,
    annotations: AnnotationChannel,
    playlist: PlaylistNavigator,
    presence: Vec<Participant>,
    chat: Vec<ChatLine>,
    status: ConnectionStatus,
    next_seq: u64,
    last_seen: HashMap<StreamKey, u64>,
}

impl<T: RoomTransport> ClassroomSession<T> {
    pub fn new(room_id: RoomId, me: Participant, transport: T, config: &AppConfig) -> Self {
        let mut position = PositionState::new();
        position.set_free_mode(config.free_mode);
        let status = if transport.is_connected() {
            ConnectionStatus::Connected
        } else {
            ConnectionStatus::Disconnected
        };
        Self {
            room_id,
            me,
            transport,
            position,
            controls: ControlManager::new(),
            annotations: AnnotationChannel::new(),
            playlist: PlaylistNavigator::new(),
            presence: Vec::new(),
            chat: Vec::new(),
            status,
            next_seq: 0,
            last_seen: HashMap::new(),
        }
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn participant(&self) -> &Participant {
        &self.me
    }

    pub fn position(&self) -> &PositionState {
        &self.position
    }

    pub fn controls(&self) -> &ControlManager {
        &self.controls
    }

    pub fn annotations(&self) -> &AnnotationSet {
        self.annotations.current()
    }

    pub fn playlist(&self) -> &PlaylistNavigator {
        &self.playlist
    }

    pub fn presence(&self) -> &[Participant] {
        &self.presence
    }

    pub fn chat(&self) -> &[ChatLine] {
        &self.chat
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn send(&mut self, event: RoomEvent) -> usize {
        self.next_seq += 1;
        let name = event.name();
        let envelope = Envelope::new(self.me.id.clone(), self.next_seq, event);
        match self.transport.emit(envelope) {
            Ok(reached) => reached,
            Err(e) => {
                tracing::warn!("[Session] {} not delivered: {}", name, e);
                0
            }
        }
    }

    fn broadcast_position(&mut self, update: MovePayload) {
        self.annotations.clear_local();
        let room_id = self.room_id.clone();
        self.send(RoomEvent::Move(MoveMessage { room_id, update }));
    }

    fn broadcast_annotations(&mut self, set: AnnotationSet) {
        let room_id = self.room_id.clone();
        self.send(RoomEvent::Annotations(AnnotationMessage { room_id, set }));
    }

    fn broadcast_controls(&mut self) {
        let message = ControlsMessage {
            room_id: self.room_id.clone(),
            controls: self.controls.assignment().clone(),
        };
        self.send(RoomEvent::Controls(message));
    }

    /// Announce presence. Students also ask for the current room state.
    pub fn join(&mut self) {
        self.next_seq = 0;
        let payload = JoinPayload {
            room_id: self.room_id.clone(),
            participant: self.me.clone(),
        };
        self.send(RoomEvent::Join(payload));
        tracing::info!("[Session] {} joined {}", self.me.display_name, self.room_id);
        if !self.me.role.is_coach() {
            self.request_sync();
        }
    }

    /// Ask the room to re-send its state.
    pub fn request_sync(&mut self) {
        let room_id = self.room_id.clone();
        self.send(RoomEvent::SyncRequest(SyncRequest { room_id }));
    }

    /// A drag-drop move from `from` to `to`.
    ///
    /// Checked in order: not scrubbing, allowed to move the piece's side, then
    /// dispatched by mode. Nothing is broadcast when any check fails.
    pub fn attempt_move(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<Promotion>,
    ) -> Result<MovePayload, ClassroomError> {
        if self.position.is_scrubbing() {
            return Err(ClassroomError::invalid_state(
                "Reviewing an earlier move; return to the live position first",
            ));
        }
        let side = self.position.side_at(from).ok_or_else(|| {
            ClassroomError::validation("from", format!("no piece on {}", from))
        })?;
        if !self.controls.authorize(side, &self.me.id, self.me.role) {
            tracing::warn!("[Session] {} may not move {}", self.me.id, side);
            return Err(ClassroomError::permission(format!(
                "You do not have control of {}",
                side
            )));
        }

        let update = match self.position.mode() {
            Mode::Standard => self.position.apply_standard_move(from, to, promotion)?,
            Mode::Freeform => self.position.apply_freeform_move(from, to)?,
        };
        self.broadcast_position(update.clone());
        Ok(update)
    }

    /// Load pasted game data and broadcast it.
    pub fn load_position(&mut self, raw: &str, label: Option<&str>) -> Result<(), ClassroomError> {
        let update = self.position.load_position(raw, label)?;
        self.broadcast_position(update);
        Ok(())
    }

    /// Load game data outside any playlist.
    pub fn load_adhoc(&mut self, raw: &str, label: Option<&str>) -> Result<(), ClassroomError> {
        self.load_position(raw, label)?;
        if self.playlist.is_active() {
            tracing::info!("[Session] Leaving playlist");
            self.playlist.clear();
        }
        Ok(())
    }

    pub fn undo(&mut self) -> Result<(), ClassroomError> {
        let update = self.position.undo_last_move()?;
        self.broadcast_position(update);
        Ok(())
    }

    pub fn reset(&mut self) {
        let update = self.position.reset();
        self.broadcast_position(update);
    }

    /// Local review of past plies; never broadcast.
    pub fn scrub_to(&mut self, ply: Option<usize>) -> Result<(), ClassroomError> {
        self.position.scrub_to(ply)
    }

    pub fn set_free_mode(&mut self, enabled: bool) {
        self.position.set_free_mode(enabled);
    }

    pub fn export_pgn(&self, headers: &[(String, String)]) -> Result<String, ClassroomError> {
        self.position.export_pgn(headers)
    }

    pub fn assign_control(
        &mut self,
        side: Side,
        participant: Option<ParticipantId>,
    ) -> Result<(), ClassroomError> {
        self.controls.assign(self.me.role, side, participant)?;
        self.broadcast_controls();
        Ok(())
    }

    pub fn toggle_control(&mut self, side: Side, participant: ParticipantId) -> Result<(), ClassroomError> {
        self.controls.toggle(self.me.role, side, participant)?;
        self.broadcast_controls();
        Ok(())
    }

    pub fn set_annotations(&mut self, arrows: Vec<Arrow>, squares: BTreeMap<Square, SquareStyle>) {
        let set = self.annotations.set(arrows, squares);
        self.broadcast_annotations(set);
    }

    pub fn toggle_arrow(&mut self, from: Square, to: Square) {
        let set = self.annotations.toggle_arrow(from, to);
        self.broadcast_annotations(set);
    }

    pub fn toggle_square(&mut self, square: Square, style: SquareStyle) {
        let set = self.annotations.toggle_square(square, style);
        self.broadcast_annotations(set);
    }

    pub fn clear_annotations(&mut self) {
        let set = self.annotations.clear();
        self.broadcast_annotations(set);
    }

    pub fn send_chat(&mut self, text: &str) -> Result<(), ClassroomError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ClassroomError::validation("text", "Message cannot be empty"));
        }
        let line = ChatLine::new(self.room_id.clone(), text, self.me.display_name.clone());
        self.chat.push(line.clone());
        self.send(RoomEvent::Chat(line));
        Ok(())
    }

    /// Start a playlist at `start`.
    pub fn play_playlist(&mut self, chapters: Vec<Chapter>, start: usize) -> Result<(), ClassroomError> {
        let update = self.playlist.load_playlist(chapters, start, &mut self.position)?;
        self.broadcast_position(update);
        Ok(())
    }

    /// Move to the neighbouring chapter. `Ok(false)` at either end.
    pub fn advance_chapter(&mut self, direction: Direction) -> Result<bool, ClassroomError> {
        match self.playlist.advance(direction, &mut self.position)? {
            Some(update) => {
                self.broadcast_position(update);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Apply an envelope from the room. Returns whether it changed anything.
    pub fn handle_incoming(&mut self, envelope: Envelope) -> bool {
        if envelope.connection == Some(self.transport.connection_id()) {
            return false;
        }

        if let Some(room) = envelope.event.room_id() {
            if *room != self.room_id {
                tracing::warn!("[Session] Ignoring {} for room {}", envelope.event.name(), room);
                return false;
            }
        }

        if let Some(sender) = &envelope.sender {
            let key = match envelope.connection {
                Some(connection) => StreamKey::Connection(connection),
                None => StreamKey::Participant(sender.clone()),
            };
            let restarts = matches!(envelope.event, RoomEvent::Join(_));
            let last = self.last_seen.get(&key).copied();
            if !restarts && last.is_some_and(|seen| envelope.seq <= seen) {
                tracing::debug!(
                    "[Session] Dropping stale {} #{} from {}",
                    envelope.event.name(),
                    envelope.seq,
                    sender
                );
                return false;
            }
            self.last_seen.insert(key, envelope.seq);
        }

        match envelope.event {
            RoomEvent::Join(payload) => {
                tracing::info!("[Session] {} joined", payload.participant.display_name);
                match self.presence.iter_mut().find(|p| p.id == payload.participant.id) {
                    Some(existing) => *existing = payload.participant,
                    None => self.presence.push(payload.participant),
                }
                true
            }
            RoomEvent::PresenceUpdate(payload) => {
                tracing::debug!("[Session] {} in the room", payload.participants.len());
                self.presence = payload.participants;
                true
            }
            RoomEvent::Move(message) => {
                let applied = self.position.receive_remote(&message.update).applied();
                if applied {
                    self.annotations.clear_local();
                }
                applied
            }
            RoomEvent::Annotations(message) => {
                self.annotations.receive(message.set);
                true
            }
            RoomEvent::Chat(line) => {
                self.chat.push(line);
                true
            }
            RoomEvent::Controls(message) => {
                self.controls.receive(message.controls);
                true
            }
            RoomEvent::SyncRequest(_) => {
                if !self.me.role.is_coach() {
                    return false;
                }
                tracing::info!("[Session] Re-sending room state");
                let update = self.position.full_payload();
                let room_id = self.room_id.clone();
                self.send(RoomEvent::Move(MoveMessage { room_id, update }));
                self.broadcast_controls();
                let set = self.annotations.current().clone();
                self.broadcast_annotations(set);
                true
            }
        }
    }

    /// Update the connectivity indicator. Nothing is rolled back or replayed.
    pub fn handle_connection(&mut self, event: ConnectionEvent) {
        match event {
            ConnectionEvent::Connected => {
                tracing::info!("[Session] Connected to {}", self.room_id);
                self.status = ConnectionStatus::Connected;
            }
            ConnectionEvent::Disconnected { reason } => {
                tracing::warn!("[Session] Disconnected from {}: {}", self.room_id, reason);
                self.status = ConnectionStatus::Disconnected;
            }
        }
    }

    pub fn handle_transport_event(&mut self, event: TransportEvent) -> bool {
        match event {
            TransportEvent::Envelope(envelope) => self.handle_incoming(envelope),
            TransportEvent::Connection(connection) => {
                self.handle_connection(connection);
                true
            }
        }
    }
}

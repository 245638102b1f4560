//! Common test utilities and helpers
//!
//! - Custom assertion macros
//! - Sessions wired to an in-process hub
#![allow(dead_code)]

pub mod assertions;

use chessroom::board::Square;
use chessroom::client::{ClassroomSession, HubReceiver, HubTransport, LocalHub};
use chessroom::shared::{AppConfig, Participant, RoomId};

pub type HubSession = ClassroomSession<HubTransport>;

pub const LESSON: &str = "lesson-42";

pub fn sq(name: &str) -> Square {
    Square::parse(name).unwrap()
}

pub fn lesson() -> RoomId {
    RoomId::parse(LESSON).unwrap()
}

/// A session in the lesson room plus its incoming side
pub fn connect(hub: &LocalHub, who: Participant) -> (HubSession, HubReceiver) {
    let (transport, receiver) = hub.connect(who.id.clone());
    (
        ClassroomSession::new(lesson(), who, transport, &AppConfig::default()),
        receiver,
    )
}

/// Apply everything queued for `session`; returns how many envelopes changed
/// its state.
pub fn pump(session: &mut HubSession, receiver: &mut HubReceiver) -> usize {
    receiver
        .drain()
        .into_iter()
        .filter(|envelope| session.handle_incoming(envelope.clone()))
        .count()
}

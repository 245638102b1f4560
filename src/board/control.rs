//! Control manager.
//!
//! Maps each side to the participant allowed to move it. The check is local
//! and advisory: every client enforces it on its own drag-drop input, nothing
//! enforces it on the wire.

use serde::{Deserialize, Serialize};

use crate::board::square::Side;
use crate::shared::error::ClassroomError;
use crate::shared::participant::{ParticipantId, Role};

/// Who may move which side. `None` leaves a side unrestricted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlAssignment {
    pub white: Option<ParticipantId>,
    pub black: Option<ParticipantId>,
}

impl ControlAssignment {
    pub fn get(&self, side: Side) -> Option<&ParticipantId> {
        match side {
            Side::White => self.white.as_ref(),
            Side::Black => self.black.as_ref(),
        }
    }

    fn slot(&mut self, side: Side) -> &mut Option<ParticipantId> {
        match side {
            Side::White => &mut self.white,
            Side::Black => &mut self.black,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ControlManager {
    assignment: ControlAssignment,
}

impl ControlManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assignment(&self) -> &ControlAssignment {
        &self.assignment
    }

    pub fn holder(&self, side: Side) -> Option<&ParticipantId> {
        self.assignment.get(side)
    }

    /// Set the holder of `side`. Only a coach may change controls.
    ///
    /// Returns the full assignment to broadcast.
    pub fn assign(
        &mut self,
        actor: Role,
        side: Side,
        participant: Option<ParticipantId>,
    ) -> Result<ControlAssignment, ClassroomError> {
        if !actor.is_coach() {
            tracing::warn!("[Control] {} tried to assign {}", actor, side);
            return Err(ClassroomError::permission("Only the coach can assign controls"));
        }
        tracing::info!(
            "[Control] {} -> {}",
            side,
            participant.as_ref().map(ParticipantId::as_str).unwrap_or("anyone")
        );
        *self.assignment.slot(side) = participant;
        Ok(self.assignment.clone())
    }

    /// Give `side` to `participant`, or take it back if they already hold it.
    pub fn toggle(
        &mut self,
        actor: Role,
        side: Side,
        participant: ParticipantId,
    ) -> Result<ControlAssignment, ClassroomError> {
        let next = if self.holder(side) == Some(&participant) {
            None
        } else {
            Some(participant)
        };
        self.assign(actor, side, next)
    }

    /// Adopt an assignment broadcast by the coach.
    pub fn receive(&mut self, assignment: ControlAssignment) {
        tracing::debug!("[Control] Received {:?}", assignment);
        self.assignment = assignment;
    }

    /// Whether `participant` acting as `role` may move `side`.
    pub fn authorize(&self, side: Side, participant: &ParticipantId, role: Role) -> bool {
        if role.is_coach() {
            return true;
        }
        match self.holder(side) {
            None => true,
            Some(holder) => holder == participant,
        }
    }
}

/**
 * Room and Participant Identity
 *
 * The engine never authenticates anyone. It receives a pre-identified viewer
 * (id, display name, role) from the host application and a room id chosen by
 * whoever scheduled the class. Both travel in every join announcement and in
 * the relay's presence snapshots.
 */
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::shared::error::ClassroomError;

/// Opaque room identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Parse a room id; any non-blank string without whitespace is accepted
    pub fn parse(value: &str) -> Result<Self, ClassroomError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ClassroomError::validation("room_id", "Room id cannot be empty"));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(ClassroomError::validation(
                "room_id",
                format!("Room id '{}' contains whitespace", trimmed),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for RoomId {
    type Err = ClassroomError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

/// Identifier of a participant, as issued by the host application's auth layer
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(String);

impl ParticipantId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ParticipantId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Classroom role of a participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Coach,
    Student,
}

impl Role {
    pub fn is_coach(self) -> bool {
        matches!(self, Role::Coach)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Coach => f.write_str("Coach"),
            Role::Student => f.write_str("Student"),
        }
    }
}

/// A connected room member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub id: ParticipantId,
    pub display_name: String,
    pub role: Role,
}

impl Participant {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, role: Role) -> Self {
        Self {
            id: ParticipantId::new(id),
            display_name: display_name.into(),
            role,
        }
    }

    pub fn coach(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self::new(id, display_name, Role::Coach)
    }

    pub fn student(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self::new(id, display_name, Role::Student)
    }
}

/**
 * Chat Line
 *
 * One line of the room's side chat. Lines are append-only: nobody edits or
 * deletes them, and every receiver simply pushes them onto its local log.
 */
use serde::{Deserialize, Serialize};

use crate::shared::event::get_timestamp;
use crate::shared::participant::RoomId;

/// A single chat line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatLine {
    pub room_id: RoomId,
    /// The message text content
    pub text: String,
    /// RFC3339 timestamp taken by the sender
    pub time: String,
    /// Display name of the author
    pub sender: String,
}

impl ChatLine {
    /// Create a chat line stamped with the current time
    pub fn new(room_id: RoomId, text: impl Into<String>, sender: impl Into<String>) -> Self {
        Self {
            room_id,
            text: text.into(),
            time: get_timestamp(),
            sender: sender.into(),
        }
    }
}

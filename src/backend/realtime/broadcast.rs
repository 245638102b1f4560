/**
 * Room Frame Broadcasting
 *
 * Every room has one `tokio::sync::broadcast` channel. Each connection task
 * holds a receiver and forwards frames to its socket, skipping the ones it
 * originated itself. Frames carry the already-serialized envelope so the text
 * is encoded once per publish, not once per member.
 */

use std::sync::Arc;

use tokio::sync::broadcast;
use uuid::Uuid;

/// A serialized envelope on its way to a room's members
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayFrame {
    /// Connection that produced the frame; `None` for relay-produced frames,
    /// which go to every member.
    pub origin: Option<Uuid>,
    pub text: Arc<str>,
}

impl RelayFrame {
    pub fn from_connection(origin: Uuid, text: impl Into<Arc<str>>) -> Self {
        Self {
            origin: Some(origin),
            text: text.into(),
        }
    }

    pub fn from_relay(text: impl Into<Arc<str>>) -> Self {
        Self {
            origin: None,
            text: text.into(),
        }
    }

    /// Whether the connection `conn` should receive this frame
    pub fn is_for(&self, conn: Uuid) -> bool {
        self.origin != Some(conn)
    }
}

/// Broadcast channel of a single room
pub type RoomBroadcast = broadcast::Sender<RelayFrame>;

/// Publish a frame to all subscribers of a room
///
/// Returns the number of receivers the frame reached (0 if none).
pub fn broadcast_frame(broadcast_tx: &RoomBroadcast, frame: RelayFrame) -> usize {
    match broadcast_tx.send(frame) {
        Ok(subscriber_count) => {
            tracing::debug!("[Relay] Frame broadcast to {} subscribers", subscriber_count);
            subscriber_count
        }
        Err(e) => {
            tracing::debug!("[Relay] No subscribers to receive frame: {:?}", e);
            0
        }
    }
}

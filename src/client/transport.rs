/**
 * Session Transport
 *
 * A room channel that can emit envelopes to every other member. The session
 * only needs `emit` and a connectivity flag; incoming envelopes reach it
 * through whatever receive loop the transport provides.
 *
 * Two implementations exist:
 *
 * - `HubTransport` - an in-process room over `tokio::sync::broadcast`, used
 *   to embed several sessions in one process and by the tests
 * - `WsTransport` (in `client::ws`) - a WebSocket connection to the relay
 *
 * Each connection has its own id, stamped on every envelope it emits, so a
 * participant connected twice still has two distinguishable streams.
 *
 * Delivery is best effort. Nothing is queued while disconnected.
 */
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast;
use uuid::Uuid;

use crate::shared::error::ClassroomError;
use crate::shared::event::Envelope;
use crate::shared::participant::ParticipantId;

/// A room-scoped publish channel
pub trait RoomTransport: Send + Sync {
    /// Send an envelope to the room. Returns the number of subscribers it reached.
    fn emit(&self, envelope: Envelope) -> Result<usize, ClassroomError>;

    fn is_connected(&self) -> bool;

    /// Id of this connection, stamped on every emitted envelope
    fn connection_id(&self) -> Uuid;
}

impl<T: RoomTransport + ?Sized> RoomTransport for Arc<T> {
    fn emit(&self, envelope: Envelope) -> Result<usize, ClassroomError> {
        (**self).emit(envelope)
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn connection_id(&self) -> Uuid {
        (**self).connection_id()
    }
}

/// Connectivity change reported by a transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    Connected,
    Disconnected { reason: String },
}

/// Something a transport's receive loop delivers to the session
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Envelope(Envelope),
    Connection(ConnectionEvent),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connected,
}

/// In-process room
#[derive(Debug, Clone)]
pub struct LocalHub {
    sender: broadcast::Sender<Envelope>,
}

impl LocalHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Attach a participant to the room.
    pub fn connect(&self, participant: ParticipantId) -> (HubTransport, HubReceiver) {
        let connection = Uuid::new_v4();
        let connected = Arc::new(AtomicBool::new(true));
        let transport = HubTransport {
            connection,
            sender: self.sender.clone(),
            connected: connected.clone(),
        };
        let receiver = HubReceiver {
            participant,
            connection,
            receiver: self.sender.subscribe(),
            connected,
        };
        (transport, receiver)
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Sending half of a hub connection
#[derive(Debug, Clone)]
pub struct HubTransport {
    connection: Uuid,
    sender: broadcast::Sender<Envelope>,
    connected: Arc<AtomicBool>,
}

impl HubTransport {
    /// Simulate a dropped link; emits fail until [`HubTransport::reconnect`].
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    pub fn reconnect(&self) {
        self.connected.store(true, Ordering::SeqCst);
    }
}

impl RoomTransport for HubTransport {
    fn emit(&self, envelope: Envelope) -> Result<usize, ClassroomError> {
        if !self.is_connected() {
            return Err(ClassroomError::transport("Not connected to the room"));
        }
        let event = envelope.event.name();
        match self.sender.send(envelope.with_connection(self.connection)) {
            Ok(subscriber_count) => {
                tracing::debug!("[Transport] {} sent to {} subscribers", event, subscriber_count);
                Ok(subscriber_count)
            }
            Err(_) => {
                tracing::debug!("[Transport] No subscribers to receive {}", event);
                Ok(0)
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn connection_id(&self) -> Uuid {
        self.connection
    }
}

/// Receiving half of a hub connection. Skips envelopes its own transport sent.
#[derive(Debug)]
pub struct HubReceiver {
    participant: ParticipantId,
    connection: Uuid,
    receiver: broadcast::Receiver<Envelope>,
    connected: Arc<AtomicBool>,
}

impl HubReceiver {
    fn accept(&self, envelope: &Envelope) -> bool {
        self.connected.load(Ordering::SeqCst)
            && envelope.connection != Some(self.connection)
    }

    /// Wait for the next envelope from someone else. `None` once the hub is gone.
    pub async fn recv(&mut self) -> Option<Envelope> {
        loop {
            match self.receiver.recv().await {
                Ok(envelope) if self.accept(&envelope) => return Some(envelope),
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("[Transport] {} lagged, skipped {} envelopes", self.participant, skipped);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Everything already delivered, without waiting.
    pub fn drain(&mut self) -> Vec<Envelope> {
        let mut out = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(envelope) => {
                    if self.accept(&envelope) {
                        out.push(envelope);
                    }
                }
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    tracing::warn!("[Transport] {} lagged, skipped {} envelopes", self.participant, skipped);
                }
                Err(_) => return out,
            }
        }
    }
}

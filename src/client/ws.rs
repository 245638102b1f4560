//! WebSocket transport to the room relay.
//!
//! One reader task turns text frames into envelopes; one writer task drains
//! an unbounded queue into the socket. Both report through the same
//! `TransportEvent` channel the session loop reads.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use uuid::Uuid;

use crate::client::transport::{ConnectionEvent, RoomTransport, TransportEvent};
use crate::shared::config::AppConfig;
use crate::shared::error::ClassroomError;
use crate::shared::event::Envelope;
use crate::shared::participant::{Participant, RoomId};

/// Sending half of a relay connection
#[derive(Debug, Clone)]
pub struct WsTransport {
    connection: Uuid,
    outgoing: mpsc::UnboundedSender<Message>,
    connected: Arc<AtomicBool>,
}

impl WsTransport {
    /// Open `{socket_url}/rooms/{room_id}/ws` on the relay named by `config`.
    ///
    /// Returns the transport and the channel carrying incoming envelopes and
    /// connectivity changes, bounded by `config.event_capacity`. The first
    /// item on the channel is `ConnectionEvent::Connected`.
    pub async fn connect(
        config: &AppConfig,
        room_id: &RoomId,
        participant: &Participant,
    ) -> Result<(Self, mpsc::Receiver<TransportEvent>), ClassroomError> {
        let url = format!("{}/rooms/{}/ws", config.socket_url.trim_end_matches('/'), room_id);
        tracing::info!("[Transport] {} connecting to {}", participant.id, url);

        let (socket, _response) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| {
                tracing::warn!("[Transport] Could not reach {}: {}", url, e);
                ClassroomError::transport(format!("Could not reach the room relay: {}", e))
            })?;
        let (mut write, mut read) = socket.split();

        let connected = Arc::new(AtomicBool::new(true));
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Message>();
        let (in_tx, in_rx) = mpsc::channel(config.event_capacity.max(1));
        // the receiver is still in hand, so this cannot fail
        let _ = in_tx.try_send(TransportEvent::Connection(ConnectionEvent::Connected));

        let writer_flag = connected.clone();
        tokio::spawn(async move {
            while let Some(message) = out_rx.recv().await {
                if let Err(e) = write.send(message).await {
                    tracing::warn!("[Transport] Send failed: {}", e);
                    writer_flag.store(false, Ordering::SeqCst);
                    break;
                }
            }
            let _ = write.close().await;
        });

        let reader_flag = connected.clone();
        let who = participant.id.clone();
        tokio::spawn(async move {
            let reason = loop {
                match read.next().await {
                    Some(Ok(Message::Text(text))) => match Envelope::from_json(text.as_str()) {
                        Ok(envelope) => {
                            if in_tx.send(TransportEvent::Envelope(envelope)).await.is_err() {
                                break "session closed".to_string();
                            }
                        }
                        Err(e) => tracing::warn!("[Transport] Skipping malformed frame: {}", e),
                    },
                    Some(Ok(Message::Close(frame))) => {
                        break frame
                            .map(|f| f.reason.to_string())
                            .filter(|r| !r.is_empty())
                            .unwrap_or_else(|| "closed by relay".to_string());
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => break e.to_string(),
                    None => break "connection ended".to_string(),
                }
            };
            reader_flag.store(false, Ordering::SeqCst);
            tracing::info!("[Transport] {} disconnected: {}", who, reason);
            let _ = in_tx
                .send(TransportEvent::Connection(ConnectionEvent::Disconnected { reason }))
                .await;
        });

        Ok((
            Self {
                connection: Uuid::new_v4(),
                outgoing: out_tx,
                connected,
            },
            in_rx,
        ))
    }

    /// Close the connection.
    pub fn close(&self) {
        self.connected.store(false, Ordering::SeqCst);
        let _ = self.outgoing.send(Message::Close(None));
    }
}

impl RoomTransport for WsTransport {
    /// Queue the envelope for the relay. The relay fans it out, so the
    /// reported subscriber count is always 1.
    fn emit(&self, envelope: Envelope) -> Result<usize, ClassroomError> {
        if !self.is_connected() {
            return Err(ClassroomError::transport("Not connected to the room relay"));
        }
        let text = envelope.with_connection(self.connection).to_json()?;
        self.outgoing
            .send(Message::Text(text.into()))
            .map_err(|_| ClassroomError::transport("Relay connection closed"))?;
        Ok(1)
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn connection_id(&self) -> Uuid {
        self.connection
    }
}

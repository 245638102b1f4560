//! Client Module
//!
//! The per-participant side of a classroom: the session that wires the board
//! engine to a room transport, the transports themselves, and the HTTP
//! collaborators.
//!
//! # Module Structure
//!
//! ```text
//! client/
//! ├── mod.rs        - Module exports
//! ├── session.rs    - ClassroomSession
//! ├── transport.rs  - RoomTransport trait and the in-process hub
//! ├── ws.rs         - WebSocket transport to the relay
//! └── api.rs        - Video token and syllabus endpoints
//! ```

pub mod api;
pub mod session;
pub mod transport;
pub mod ws;

pub use api::ClassroomApi;
pub use session::ClassroomSession;
pub use transport::{
    ConnectionEvent, ConnectionStatus, HubReceiver, HubTransport, LocalHub, RoomTransport,
    TransportEvent,
};
pub use ws::WsTransport;

//! Rooms Module
//!
//! Room-scoped pub/sub with presence tracking.
//!
//! # Module Structure
//!
//! ```text
//! rooms/
//! ├── mod.rs       - Module exports
//! ├── state.rs     - RoomRegistry (channels and presence)
//! └── handlers.rs  - WebSocket connection loop and listing endpoints
//! ```

/// Room registry
pub mod state;

/// Socket and listing handlers
pub mod handlers;

pub use handlers::{handle_room_socket, health, list_rooms};
pub use state::{RoomRegistry, RoomSummary};

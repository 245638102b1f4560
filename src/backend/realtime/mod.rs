//! Real-time Fan-out
//!
//! Room-scoped broadcasting used by the relay's socket handlers.
//!
//! # Module Structure
//!
//! ```text
//! realtime/
//! ├── mod.rs          - Module exports
//! └── broadcast.rs    - RelayFrame and the broadcast helper
//! ```

/// Frame broadcasting utilities
pub mod broadcast;

pub use broadcast::{broadcast_frame, RelayFrame, RoomBroadcast};

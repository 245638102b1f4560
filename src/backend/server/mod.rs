//! Server Module
//!
//! Initialization and configuration of the relay's axum server.
//!
//! # Module Structure
//!
//! ```text
//! server/
//! ├── mod.rs          - Module exports and documentation
//! ├── state.rs        - AppState and FromRef implementations
//! ├── config.rs       - RelayConfig loaded from the environment
//! └── init.rs         - Server initialization and app creation
//! ```
//!
//! # Initialization Flow
//!
//! 1. **Configuration Loading**: `RelayConfig::from_env`
//! 2. **State Creation**: an empty `RoomRegistry`
//! 3. **Background Tasks**: periodic sweep of empty rooms
//! 4. **Router Creation**: socket, listing and health routes

/// Application state management
pub mod state;

/// Server configuration loading
pub mod config;

/// Server initialization
pub mod init;

pub use config::RelayConfig;
pub use init::create_app;
pub use state::AppState;

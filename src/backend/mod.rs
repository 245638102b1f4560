//! Backend Module
//!
//! The room relay: an axum server that fans room envelopes out over
//! WebSockets and keeps each room's presence list. It never interprets
//! positions, annotations or control assignments; every client runs its own
//! engine and the relay only moves envelopes between them.
//!
//! This module is only compiled when the `ssr` feature is enabled.
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs          - Module exports and documentation
//! ├── main.rs         - chessroom-relay binary
//! ├── server/         - Configuration, state and initialization
//! ├── routes/         - Router assembly
//! ├── rooms/          - Room registry and socket handlers
//! ├── realtime/       - Per-room frame broadcasting
//! └── error/          - Error types
//! ```
//!
//! # Thread Safety
//!
//! The registry sits behind `Arc<RwLock<>>`; each room owns a
//! `broadcast::Sender` that every connection task subscribes to. A slow
//! connection lags and skips frames instead of blocking the room.
//!
//! # Example
//!
//! ```rust,no_run
//! use chessroom::backend::server::{create_app, RelayConfig};
//!
//! # async fn example() -> std::io::Result<()> {
//! let app = create_app(RelayConfig::from_env());
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//! axum::serve(listener, app).await
//! # }
//! ```

/// Server setup and configuration
pub mod server;

/// Route configuration
pub mod routes;

/// Room registry and socket handlers
pub mod rooms;

/// Per-room broadcasting
pub mod realtime;

/// Backend error types
pub mod error;

pub use error::BackendError;
pub use rooms::RoomRegistry;
pub use server::{create_app, RelayConfig};

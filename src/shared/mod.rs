//! Shared Module
//!
//! Types shared between the classroom client and the relay server: room and
//! participant identity, the room event vocabulary, chat lines, the error
//! type and client configuration.
//!
//! # Overview
//!
//! Everything here is plain serializable data. The relay only ever looks at
//! `Envelope` headers and `join` payloads; the board types inside `move`,
//! `annotations` and `controls` events pass through it untouched.

/// Chat line data structure
pub mod message;

/// Room event vocabulary and envelope
pub mod event;

/// Shared error types
pub mod error;

/// Room and participant identity
pub mod participant;

/// Application configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use config::{AppConfig, AppConfigBuilder, ConfigError};
pub use error::ClassroomError;
pub use event::{Envelope, RoomEvent};
pub use message::ChatLine;
pub use participant::{Participant, ParticipantId, Role, RoomId};

//! Chessroom - Main Library
//!
//! Chessroom keeps one chessboard in sync across everyone in a coaching
//! session. Each participant runs its own engine instance; the instances
//! converge by exchanging small room events through a relay that never
//! interprets them.
//!
//! # Overview
//!
//! - Standard positions are governed by chess rules, with move history,
//!   undo, and a read-only history scrubber
//! - Freeform positions (no kings, extra pieces, impossible setups) are
//!   editable by dragging pieces anywhere
//! - The coach hands the white and black pieces to specific participants
//! - Arrows and square highlights are shared and cleared on every move
//! - A lesson playlist steps through the chapters of a syllabus
//!
//! # Module Structure
//!
//! - **`shared`** - Wire types shared by client and relay
//!   - Room and participant identity, the event vocabulary and envelope
//!   - Chat lines, error type, client configuration
//!
//! - **`board`** - The synchronization engine
//!   - FEN and PGN codecs, the freeform editor, the rules adapter
//!   - Position state machine, control manager, annotations, playlist
//!
//! - **`client`** - One participant's session
//!   - `ClassroomSession`, the transport trait, the in-process hub and the
//!     WebSocket transport, HTTP collaborators
//!
//! - **`backend`** - The relay server (only compiled with `ssr`)
//!
//! # Feature Flags
//!
//! - **`ssr`** (default) - enables the relay server and its dependencies
//!
//! # Usage
//!
//! ```rust,no_run
//! use chessroom::board::Square;
//! use chessroom::client::{ClassroomSession, LocalHub};
//! use chessroom::shared::{AppConfig, Participant, RoomId};
//!
//! # fn example() -> Result<(), chessroom::shared::ClassroomError> {
//! let hub = LocalHub::new(64);
//! let coach = Participant::coach("c1", "Coach");
//! let (transport, _incoming) = hub.connect(coach.id.clone());
//! let room = RoomId::parse("lesson-1")?;
//! let mut session = ClassroomSession::new(room, coach, transport, &AppConfig::default());
//! session.join();
//! session.attempt_move(Square::parse("e2")?, Square::parse("e4")?, None)?;
//! # Ok(())
//! # }
//! ```

/// Shared wire types
pub mod shared;

/// Board synchronization engine
pub mod board;

/// Per-participant classroom session and transports
pub mod client;

/// Relay server
#[cfg(feature = "ssr")]
pub mod backend;

/// Debug utilities (only in debug builds)
#[cfg(debug_assertions)]
pub mod debug;

//! Board Module
//!
//! The synchronization engine proper. Everything here is synchronous and
//! transport-agnostic: transitions commit locally and hand back the payload
//! that the classroom session broadcasts.
//!
//! Leaf-first:
//!
//! - [`square`], [`fen`] - squares, sides and the FEN placement grid
//! - [`editor`] - freeform piece relocation
//! - [`rules`] - standard chess through the `chess` crate
//! - [`pgn`] - game records
//! - [`codec`] - pasted text to position
//! - [`position`] - the position state machine
//! - [`control`], [`annotation`], [`playlist`] - per-room side state

pub mod square;
pub mod fen;
pub mod editor;
pub mod rules;
pub mod pgn;
pub mod codec;
pub mod position;
pub mod control;
pub mod annotation;
pub mod playlist;

pub use annotation::{AnnotationChannel, AnnotationSet, Arrow, SquareStyle};
pub use codec::{LoadedPosition, Mode};
pub use control::{ControlAssignment, ControlManager};
pub use fen::START_FEN;
pub use playlist::{Chapter, Direction, PlaylistNavigator};
pub use position::{MovePayload, PositionState, RemoteOutcome};
pub use rules::{Game, Outcome, Promotion};
pub use square::{Side, Square};

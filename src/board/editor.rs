//! Freeform board editor.
//!
//! Relocates pieces on a FEN without consulting any chess rules. This is the
//! only way a freeform board (puzzle diagrams, partial setups, positions
//! without kings) changes.

use crate::board::fen::{join_fen, split_fen, Placement};
use crate::board::square::Square;
use crate::shared::error::ClassroomError;

/// Move whatever stands on `from` to `to`, overwriting the destination.
///
/// The fields after the placement (side to move, castling, ...) are passed
/// through unchanged. An occupied destination is a capture; nothing checks
/// whether the piece could actually get there.
pub fn move_piece(fen: &str, from: Square, to: Square) -> Result<String, ClassroomError> {
    let (field, rest) = split_fen(fen);
    let mut placement = Placement::parse(field)?;

    let piece = placement.get(from).ok_or_else(|| {
        ClassroomError::validation("from", format!("no piece on {}", from))
    })?;
    if from == to {
        return Ok(join_fen(&placement.encode(), rest));
    }

    placement.set(from, None);
    placement.set(to, Some(piece));

    tracing::debug!("[Editor] {} {} -> {}", piece, from, to);
    Ok(join_fen(&placement.encode(), rest))
}

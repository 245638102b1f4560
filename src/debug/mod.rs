//! Debug utilities and helpers
//!
//! Only compiled into debug builds. The position state machine calls
//! [`check_position`] after every committed transition, and trace logs use
//! [`render_board`] to dump the grid.

use crate::board::codec::Mode;
use crate::board::fen::placement_of;
use crate::board::rules::is_standard;

/// Debug mode feature flag
pub const DEBUG_MODE: bool = cfg!(debug_assertions);

/// Validate state invariant
///
/// Checks a state invariant and logs an error if it fails.
/// Only active in debug builds.
pub fn validate_invariant(condition: bool, message: &str) {
    if DEBUG_MODE && !condition {
        tracing::error!("Invariant violation: {}", message);
        #[cfg(debug_assertions)]
        {
            panic!("Invariant violation: {}", message);
        }
    }
}

/// Check the position invariants: the FEN always carries a valid 8x8
/// placement, the mode agrees with the rules engine, and only standard
/// positions have a move history.
pub fn check_position(mode: Mode, fen: &str, history_len: usize) {
    validate_invariant(
        placement_of(fen).is_ok(),
        "position FEN must carry an 8x8 placement",
    );
    validate_invariant(
        (mode == Mode::Standard) == is_standard(fen),
        "mode must be Standard exactly when the rules engine accepts the FEN",
    );
    validate_invariant(
        mode == Mode::Standard || history_len == 0,
        "freeform positions have no move history",
    );
}

/// ASCII dump of a FEN's placement, eighth rank on top.
pub fn render_board(fen: &str) -> String {
    let placement = match placement_of(fen) {
        Ok(placement) => placement,
        Err(e) => return format!("<unreadable board: {}>", e),
    };
    let mut out = String::new();
    for (row, cells) in placement.rows().iter().enumerate() {
        out.push_str(&format!("{} ", 8 - row));
        for cell in cells {
            out.push(' ');
            out.push(cell.unwrap_or('.'));
        }
        out.push('\n');
    }
    out.push_str("   a b c d e f g h");
    out
}

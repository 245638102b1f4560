//! Position codec.
//!
//! Turns whatever a coach pasted (a PGN, a PGN with a `FEN` tag, a bare FEN,
//! a puzzle diagram) into a position the state machine can adopt. The
//! cascade is ordered; each step runs only when the previous one produced
//! nothing:
//!
//! 1. PGN movetext that replays to completion with at least one ply
//! 2. an embedded `[FEN "..."]` tag
//! 3. the trimmed input itself, if it looks like a FEN
//! 4. the candidate FEN as a standard position
//! 5. the candidate FEN as a freeform diagram
//!
//! Only input that yields no 8x8 placement at all is an error.

use serde::{Deserialize, Serialize};

use crate::board::fen::{looks_like_fen, placement_of, START_FEN};
use crate::board::pgn;
use crate::board::rules::Game;
use crate::shared::error::ClassroomError;

/// Whether a position is driven by the rules engine or edited by hand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Standard,
    Freeform,
}

/// Result of decoding game data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedPosition {
    pub mode: Mode,
    /// Live position
    pub fen: String,
    /// Position the history replays from. Equal to `fen` when there is no history.
    pub start_fen: String,
    pub history: Vec<String>,
}

impl LoadedPosition {
    fn standard(game: &Game) -> Self {
        Self {
            mode: Mode::Standard,
            fen: game.fen(),
            start_fen: game.start_fen().to_string(),
            history: game.history().to_vec(),
        }
    }

    fn freeform(fen: &str) -> Self {
        Self {
            mode: Mode::Freeform,
            fen: fen.to_string(),
            start_fen: fen.to_string(),
            history: Vec::new(),
        }
    }
}

/// Decode pasted game data.
pub fn load(raw: &str) -> Result<LoadedPosition, ClassroomError> {
    let text = raw.trim();
    if text.is_empty() {
        return Err(ClassroomError::parse("No game data to load"));
    }

    let record = pgn::parse(text);
    let tagged = pgn::fen_tag(&record);
    let header_fen = tagged.as_deref();

    if !record.sans.is_empty() {
        let start = header_fen.unwrap_or(START_FEN);
        match Game::replay(start, &record.sans) {
            Ok(game) => {
                tracing::info!(
                    "[Codec] Loaded PGN with {} plies, {} to move",
                    game.ply_count(),
                    game.side_to_move()
                );
                return Ok(LoadedPosition::standard(&game));
            }
            Err(e) => tracing::debug!("[Codec] Not a replayable PGN: {}", e),
        }
    }

    let candidate = match header_fen {
        Some(fen) => fen,
        None if looks_like_fen(text) => text,
        // a tagged game with no moves starts from the initial position
        None if record.sans.is_empty() && !record.headers.is_empty() => START_FEN,
        None => {
            tracing::warn!("[Codec] Input is neither PGN nor FEN");
            return Err(ClassroomError::parse("Failed to recognize game data"));
        }
    };
    classify(candidate)
}

/// Standard-or-freeform decision for an already-resolved FEN.
///
/// Also used for incoming full-position updates, where no PGN or header
/// handling applies.
pub fn classify(fen: &str) -> Result<LoadedPosition, ClassroomError> {
    let fen = fen.trim();
    match Game::from_fen(fen) {
        Ok(game) => {
            tracing::debug!("[Codec] Standard position {}", game.fen());
            Ok(LoadedPosition::standard(&game))
        }
        Err(rejection) => {
            placement_of(fen).map_err(|e| {
                tracing::warn!("[Codec] Unusable FEN '{}': {}", fen, e);
                ClassroomError::parse(format!("Not a usable position: {}", e))
            })?;
            tracing::debug!("[Codec] Freeform position ({})", rejection);
            Ok(LoadedPosition::freeform(fen))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_pgn_becomes_standard_with_history() {
        let loaded = load("1. e4 e5 2. Nf3 Nc6").unwrap();
        assert_eq!(loaded.mode, Mode::Standard);
        assert_eq!(loaded.history, vec!["e4", "e5", "Nf3", "Nc6"]);
        assert_eq!(loaded.start_fen, START_FEN);
        assert_eq!(
            loaded.fen,
            "r1bqkbnr/pppp1ppp/2n5/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R w KQkq - 2 3"
        );
    }

    #[test]
    fn test_tagged_game_without_moves_is_initial_position() {
        let loaded = load("[Event \"Lesson\"]\n[Result \"*\"]\n\n*").unwrap();
        assert_eq!(loaded.mode, Mode::Standard);
        assert_eq!(loaded.fen, START_FEN);
        assert!(loaded.history.is_empty());
    }

    #[test]
    fn test_pgn_with_fen_header_replays_from_it() {
        let text = "[FEN \"4k3/8/8/8/8/8/4P3/4K3 w - - 0 1\"]\n1. e4 Kd7";
        let loaded = load(text).unwrap();
        assert_eq!(loaded.mode, Mode::Standard);
        assert_eq!(loaded.start_fen, "4k3/8/8/8/8/8/4P3/4K3 w - - 0 1");
        assert_eq!(loaded.history, vec!["e4", "Kd7"]);
    }

    #[test]
    fn test_header_fen_without_moves() {
        let text = "[Event \"Puzzle\"]\n[FEN \"8/8/8/8/3Q4/8/8/8 w - - 0 1\"]\n*";
        let loaded = load(text).unwrap();
        assert_eq!(loaded.mode, Mode::Freeform);
        assert_eq!(loaded.fen, "8/8/8/8/3Q4/8/8/8 w - - 0 1");
    }

    #[test]
    fn test_bare_fen_kings_only_is_standard() {
        let loaded = load("8/8/8/4k3/8/8/8/4K3 w - - 0 1").unwrap();
        assert_eq!(loaded.mode, Mode::Standard);
        assert_eq!(loaded.fen, "8/8/8/4k3/8/8/8/4K3 w - - 0 1");
        assert!(loaded.history.is_empty());
    }

    #[test]
    fn test_diagram_with_default_castling_field_is_standard() {
        let loaded = load("4k3/8/8/8/8/8/8/4K3 w KQkq - 0 1").unwrap();
        assert_eq!(loaded.mode, Mode::Standard);
        assert_eq!(loaded.fen, "4k3/8/8/8/8/8/8/4K3 w - - 0 1");

        // a rook endgame keeps the right its pieces still support
        let loaded = load("4k3/8/8/8/8/8/8/4K2R w KQkq - 0 1").unwrap();
        assert_eq!(loaded.mode, Mode::Standard);
        assert_eq!(loaded.fen, "4k3/8/8/8/8/8/8/4K2R w K - 0 1");
    }

    #[test]
    fn test_empty_board_is_freeform() {
        let loaded = load("8/8/8/8/8/8/8/8 w - - 0 1").unwrap();
        assert_eq!(loaded.mode, Mode::Freeform);
        assert_eq!(loaded.fen, "8/8/8/8/8/8/8/8 w - - 0 1");
    }

    #[test]
    fn test_illegal_pgn_falls_through() {
        // second move is impossible; no FEN to fall back on
        assert_matches!(
            load("1. e4 e4"),
            Err(ClassroomError::ParseError { .. })
        );
    }

    #[test]
    fn test_garbage_and_blank_input() {
        assert_matches!(load(""), Err(ClassroomError::ParseError { .. }));
        assert_matches!(load("   \n"), Err(ClassroomError::ParseError { .. }));
        assert_matches!(load("hello world"), Err(ClassroomError::ParseError { .. }));
        assert_matches!(load("8/8/8"), Err(ClassroomError::ParseError { .. }));
    }
}

/**
 * Position State Machine
 *
 * Owns the canonical position of one participant: mode, live FEN, the FEN
 * the move history starts from, the SAN history, and the local-only view
 * index used for scrubbing through past plies.
 *
 * Every transition that changes the shared position returns the
 * `MovePayload` the caller has to broadcast. The state machine itself never
 * touches a transport, which keeps it a plain value that tests can drive
 * directly.
 *
 * ## Transitions
 *
 * - `apply_standard_move` / `apply_freeform_move` - local drag-drop moves
 * - `load_position` - pasted or chapter game data, through the codec
 * - `receive_remote` - a `move` event from another participant
 * - `scrub_to` - local review of past plies, never broadcast
 * - `undo_last_move` / `reset` - coach controls, broadcast as full positions
 *
 * Rules engine values are re-derived from `(start_fen, history)` on every
 * transition; no engine object outlives a call.
 */
use serde::{Deserialize, Serialize};

use crate::board::codec::{self, LoadedPosition, Mode};
use crate::board::editor;
use crate::board::fen::{placement_of, START_FEN};
use crate::board::pgn;
use crate::board::rules::{Game, Promotion};
use crate::board::square::{piece_side, Side, Square};
use crate::shared::error::ClassroomError;

/// Position update carried by a `move` event.
///
/// With `from`/`to` it is an incremental standard move; without them it is a
/// full-position replace. A full replace may also carry the start FEN and
/// history so that receivers keep the same move list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Square>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Square>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<Promotion>,
    pub fen: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_fen: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<String>>,
}

impl MovePayload {
    /// A full-position replace carrying only a FEN
    pub fn full(fen: impl Into<String>) -> Self {
        Self {
            from: None,
            to: None,
            promotion: None,
            fen: fen.into(),
            start_fen: None,
            history: None,
        }
    }

    /// An incremental standard move
    pub fn incremental(
        from: Square,
        to: Square,
        promotion: Option<Promotion>,
        fen: impl Into<String>,
    ) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
            promotion,
            fen: fen.into(),
            start_fen: None,
            history: None,
        }
    }

    pub fn is_incremental(&self) -> bool {
        self.from.is_some() && self.to.is_some()
    }
}

/// What a remote `move` event did to the local position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteOutcome {
    /// The whole position was replaced
    Replaced,
    /// One ply was appended to the local history
    Advanced,
    /// The update could not be applied; the last known state is kept
    Ignored,
}

impl RemoteOutcome {
    pub fn applied(self) -> bool {
        !matches!(self, RemoteOutcome::Ignored)
    }
}

/// Canonical position of one participant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionState {
    mode: Mode,
    fen: String,
    start_fen: String,
    history: Vec<String>,
    view_index: Option<usize>,
    free_mode: bool,
    label: Option<String>,
}

impl Default for PositionState {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionState {
    /// The standard starting position, freeform drags allowed.
    pub fn new() -> Self {
        Self {
            mode: Mode::Standard,
            fen: START_FEN.to_string(),
            start_fen: START_FEN.to_string(),
            history: Vec::new(),
            view_index: None,
            free_mode: true,
            label: None,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Live FEN, regardless of scrubbing
    pub fn fen(&self) -> &str {
        &self.fen
    }

    pub fn start_fen(&self) -> &str {
        &self.start_fen
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// `None` while showing the live position
    pub fn view_index(&self) -> Option<usize> {
        self.view_index
    }

    pub fn is_scrubbing(&self) -> bool {
        self.view_index.is_some()
    }

    /// Name of the chapter or game that was loaded last
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn free_mode(&self) -> bool {
        self.free_mode
    }

    /// Allow or forbid drag moves on freeform boards.
    pub fn set_free_mode(&mut self, enabled: bool) {
        if self.free_mode != enabled {
            tracing::info!(
                "[Position] Freeform moves {}",
                if enabled { "enabled" } else { "disabled" }
            );
        }
        self.free_mode = enabled;
    }

    /// FEN to draw: the scrubbed ply if scrubbing, otherwise the live position.
    pub fn display_fen(&self) -> String {
        match self.view_index {
            Some(ply) => self
                .game()
                .and_then(|game| game.fen_after(ply))
                .unwrap_or_else(|_| self.fen.clone()),
            None => self.fen.clone(),
        }
    }

    /// Piece on `square` in the live position.
    pub fn piece_at(&self, square: Square) -> Option<char> {
        placement_of(&self.fen).ok().and_then(|p| p.get(square))
    }

    /// Side of the piece on `square` in the live position.
    pub fn side_at(&self, square: Square) -> Option<Side> {
        self.piece_at(square).and_then(piece_side)
    }

    fn game(&self) -> Result<Game, ClassroomError> {
        Game::replay(&self.start_fen, &self.history)
    }

    fn ensure_live(&self) -> Result<(), ClassroomError> {
        if self.is_scrubbing() {
            return Err(ClassroomError::invalid_state(
                "Reviewing an earlier move; return to the live position first",
            ));
        }
        Ok(())
    }

    /// Play a legal move on a standard position.
    pub fn apply_standard_move(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<Promotion>,
    ) -> Result<MovePayload, ClassroomError> {
        self.ensure_live()?;
        if self.mode != Mode::Standard {
            return Err(ClassroomError::invalid_state(
                "Freeform board; moves are not rule-checked",
            ));
        }

        let (game, san) = self.game()?.play(from, to, promotion).map_err(|e| {
            tracing::warn!("[Position] Rejected {}{}: {}", from, to, e);
            e
        })?;
        self.commit_game(&game);
        tracing::info!("[Position] {} ({} plies)", san, self.history.len());

        Ok(MovePayload::incremental(
            from,
            to,
            promotion_in(&san),
            self.fen.clone(),
        ))
    }

    /// Relocate a piece on a freeform board.
    pub fn apply_freeform_move(
        &mut self,
        from: Square,
        to: Square,
    ) -> Result<MovePayload, ClassroomError> {
        self.ensure_live()?;
        if self.mode != Mode::Freeform {
            return Err(ClassroomError::invalid_state(
                "Standard position; moves go through the rules engine",
            ));
        }
        if !self.free_mode {
            return Err(ClassroomError::invalid_state(
                "Freeform moves are disabled for this board",
            ));
        }

        let fen = editor::move_piece(&self.fen, from, to)?;
        // an edit can complete a legal setup, which then plays by the rules
        let loaded = codec::classify(&fen)?;
        if loaded.mode == Mode::Standard {
            tracing::info!("[Position] Freeform edit produced a standard position");
        }
        self.replace(loaded);
        Ok(MovePayload::full(self.fen.clone()))
    }

    /// Decode pasted game data and adopt it.
    pub fn load_position(
        &mut self,
        raw: &str,
        label: Option<&str>,
    ) -> Result<MovePayload, ClassroomError> {
        let loaded = codec::load(raw)?;
        tracing::info!(
            "[Position] Loaded {} as {:?} ({} plies)",
            label.unwrap_or("position"),
            loaded.mode,
            loaded.history.len()
        );
        self.replace(loaded);
        self.label = label.map(str::to_string);
        Ok(self.full_payload())
    }

    /// Back to the standard starting position.
    pub fn reset(&mut self) -> MovePayload {
        self.replace(LoadedPosition {
            mode: Mode::Standard,
            fen: START_FEN.to_string(),
            start_fen: START_FEN.to_string(),
            history: Vec::new(),
        });
        self.label = None;
        tracing::info!("[Position] Reset to start position");
        self.full_payload()
    }

    /// Take back the last ply.
    pub fn undo_last_move(&mut self) -> Result<MovePayload, ClassroomError> {
        self.ensure_live()?;
        if self.mode != Mode::Standard {
            return Err(ClassroomError::invalid_state(
                "Undo is only available on standard positions",
            ));
        }
        let game = self
            .game()?
            .undo()
            .ok_or_else(|| ClassroomError::invalid_state("No moves to undo"))?;
        self.commit_game(&game);
        tracing::info!("[Position] Undo, {} plies remain", self.history.len());
        Ok(self.full_payload())
    }

    /// Show the position after ply `ply`, or the live position for `None`.
    pub fn scrub_to(&mut self, ply: Option<usize>) -> Result<(), ClassroomError> {
        if let Some(k) = ply {
            if k >= self.history.len() {
                return Err(ClassroomError::validation(
                    "view_index",
                    format!("ply {} is outside a history of {}", k, self.history.len()),
                ));
            }
        }
        self.view_index = ply;
        tracing::debug!("[Position] Viewing {:?}", ply);
        Ok(())
    }

    /// Apply a `move` event from another participant.
    ///
    /// Failures are logged and absorbed; the next full-position broadcast
    /// brings a diverged participant back in line.
    pub fn receive_remote(&mut self, payload: &MovePayload) -> RemoteOutcome {
        if payload.is_incremental() {
            self.receive_incremental(payload)
        } else {
            self.receive_full(payload)
        }
    }

    fn receive_incremental(&mut self, payload: &MovePayload) -> RemoteOutcome {
        let (Some(from), Some(to)) = (payload.from, payload.to) else {
            return RemoteOutcome::Ignored;
        };
        if self.mode != Mode::Standard {
            tracing::warn!("[Position] Remote move {}{} on a freeform board, ignored", from, to);
            return RemoteOutcome::Ignored;
        }

        match self.game().and_then(|game| game.play(from, to, payload.promotion)) {
            Ok((game, san)) => {
                self.commit_game(&game);
                if self.fen != payload.fen {
                    tracing::warn!(
                        "[Position] Remote {} gives {}, sender reported {}",
                        san,
                        self.fen,
                        payload.fen
                    );
                }
                tracing::debug!("[Position] Remote move {}", san);
                RemoteOutcome::Advanced
            }
            Err(e) => {
                tracing::warn!("[Position] Could not replay remote move {}{}: {}", from, to, e);
                RemoteOutcome::Ignored
            }
        }
    }

    fn receive_full(&mut self, payload: &MovePayload) -> RemoteOutcome {
        if let (Some(start), Some(history)) = (&payload.start_fen, &payload.history) {
            match Game::replay(start, history) {
                Ok(game) if game.fen() == payload.fen => {
                    self.replace(LoadedPosition {
                        mode: Mode::Standard,
                        fen: game.fen(),
                        start_fen: game.start_fen().to_string(),
                        history: game.history().to_vec(),
                    });
                    tracing::debug!("[Position] Remote position with {} plies", history.len());
                    return RemoteOutcome::Replaced;
                }
                Ok(_) => tracing::warn!("[Position] Remote history does not reach its FEN"),
                Err(e) => tracing::warn!("[Position] Remote history does not replay: {}", e),
            }
        }

        match codec::classify(&payload.fen) {
            Ok(loaded) => {
                tracing::debug!("[Position] Remote {:?} position", loaded.mode);
                self.replace(loaded);
                RemoteOutcome::Replaced
            }
            Err(e) => {
                tracing::warn!("[Position] Ignoring remote position: {}", e);
                RemoteOutcome::Ignored
            }
        }
    }

    /// Export the live game as PGN. Freeform boards have no game record.
    pub fn export_pgn(&self, headers: &[(String, String)]) -> Result<String, ClassroomError> {
        if self.mode != Mode::Standard {
            return Err(ClassroomError::invalid_state(
                "Freeform positions cannot be exported as PGN",
            ));
        }
        let mut headers = headers.to_vec();
        if let Some(label) = &self.label {
            if !headers.iter().any(|(key, _)| key == "Event") {
                headers.push(("Event".to_string(), label.clone()));
            }
        }
        Ok(pgn::write(&headers, &self.game()?))
    }

    /// Full-position payload for the current state.
    pub fn full_payload(&self) -> MovePayload {
        let mut payload = MovePayload::full(self.fen.clone());
        if !self.history.is_empty() {
            payload.start_fen = Some(self.start_fen.clone());
            payload.history = Some(self.history.clone());
        }
        payload
    }

    fn commit_game(&mut self, game: &Game) {
        self.fen = game.fen();
        self.history = game.history().to_vec();
        self.check();
    }

    fn replace(&mut self, loaded: LoadedPosition) {
        self.mode = loaded.mode;
        self.fen = loaded.fen;
        self.start_fen = loaded.start_fen;
        self.history = loaded.history;
        self.view_index = None;
        self.check();
    }

    fn check(&self) {
        #[cfg(debug_assertions)]
        {
            crate::debug::check_position(self.mode, &self.fen, self.history.len());
            tracing::trace!("[Position]\n{}", crate::debug::render_board(&self.fen));
        }
    }
}

fn promotion_in(san: &str) -> Option<Promotion> {
    let (_, piece) = san.split_once('=')?;
    match piece.chars().next()? {
        'Q' => Some(Promotion::Queen),
        'R' => Some(Promotion::Rook),
        'B' => Some(Promotion::Bishop),
        'N' => Some(Promotion::Knight),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    fn sq(s: &str) -> Square {
        Square::parse(s).unwrap()
    }

    #[test]
    fn test_standard_move_returns_incremental_payload() {
        let mut state = PositionState::new();
        let payload = state.apply_standard_move(sq("e2"), sq("e4"), None).unwrap();
        assert!(payload.is_incremental());
        assert_eq!(payload.fen, state.fen());
        assert_eq!(payload.promotion, None);
        assert_eq!(state.history(), &["e4"]);
    }

    #[test]
    fn test_piece_lookup_on_live_position() {
        let state = PositionState::new();
        assert_eq!(state.piece_at(sq("g1")), Some('N'));
        assert_eq!(state.side_at(sq("d8")), Some(Side::Black));
        assert_eq!(state.side_at(sq("e4")), None);
    }

    #[test]
    fn test_illegal_move_leaves_state() {
        let mut state = PositionState::new();
        let before = state.clone();
        assert_matches!(
            state.apply_standard_move(sq("e2"), sq("e5"), None),
            Err(ClassroomError::IllegalMove { .. })
        );
        assert_eq!(state, before);
    }

    #[test]
    fn test_freeform_move_broadcasts_full_position() {
        let mut state = PositionState::new();
        state.load_position("8/8/8/8/8/8/8/R7 w - - 0 1", None).unwrap();
        assert_eq!(state.mode(), Mode::Freeform);
        let payload = state.apply_freeform_move(sq("a1"), sq("h8")).unwrap();
        assert!(!payload.is_incremental());
        assert_eq!(payload.fen, "7R/8/8/8/8/8/8/8 w - - 0 1");
        assert!(state.history().is_empty());
    }

    #[test]
    fn test_mode_dispatch_is_strict() {
        let mut state = PositionState::new();
        assert_matches!(
            state.apply_freeform_move(sq("e2"), sq("e4")),
            Err(ClassroomError::InvalidState { .. })
        );
        state.load_position("8/8/8/8/8/8/8/R7 w - - 0 1", None).unwrap();
        assert_matches!(
            state.apply_standard_move(sq("a1"), sq("a2"), None),
            Err(ClassroomError::InvalidState { .. })
        );
    }

    #[test]
    fn test_strict_mode_blocks_freeform_drags() {
        let mut state = PositionState::new();
        state.load_position("8/8/8/8/8/8/8/R7 w - - 0 1", None).unwrap();
        state.set_free_mode(false);
        assert_matches!(
            state.apply_freeform_move(sq("a1"), sq("a2")),
            Err(ClassroomError::InvalidState { .. })
        );
    }

    #[test]
    fn test_freeform_edit_completing_a_setup_becomes_standard() {
        let mut state = PositionState::new();
        state.load_position("4k3/8/8/8/8/8/8/8 w - - 0 1", None).unwrap();
        assert_eq!(state.mode(), Mode::Freeform);
        state.apply_freeform_move(sq("e8"), sq("d8")).unwrap();
        assert_eq!(state.mode(), Mode::Freeform);

        // black is in check with white to move, which no game can reach
        state.load_position("4k3/8/8/8/8/8/8/4R1K1 w - - 0 1", None).unwrap();
        assert_eq!(state.mode(), Mode::Freeform);
        let payload = state.apply_freeform_move(sq("e1"), sq("a1")).unwrap();
        assert_eq!(state.mode(), Mode::Standard);
        assert_eq!(payload.fen, "4k3/8/8/8/8/8/8/R5K1 w - - 0 1");
        assert!(state.apply_standard_move(sq("a1"), sq("a8"), None).is_ok());
    }

    #[test]
    fn test_failed_load_keeps_state() {
        let mut state = PositionState::new();
        state.apply_standard_move(sq("d2"), sq("d4"), None).unwrap();
        let before = state.clone();
        assert!(state.load_position("nonsense", None).is_err());
        assert_eq!(state, before);
    }

    #[test]
    fn test_load_pgn_payload_carries_history() {
        let mut state = PositionState::new();
        let payload = state.load_position("1. e4 e5 2. Nf3 Nc6", Some("Italian")).unwrap();
        assert_eq!(payload.history.as_deref().map(|h| h.len()), Some(4));
        assert_eq!(payload.start_fen.as_deref(), Some(START_FEN));
        assert_eq!(state.label(), Some("Italian"));
    }

    #[test]
    fn test_scrub_blocks_moves_and_is_local() {
        let mut state = PositionState::new();
        state.load_position("1. e4 e5 2. Nf3 Nc6", None).unwrap();
        let live = state.fen().to_string();

        state.scrub_to(Some(0)).unwrap();
        assert_eq!(
            state.display_fen(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
        );
        assert_eq!(state.fen(), live);
        assert_eq!(state.history().len(), 4);
        assert_matches!(
            state.apply_standard_move(sq("f1"), sq("c4"), None),
            Err(ClassroomError::InvalidState { .. })
        );
        assert!(state.scrub_to(Some(4)).is_err());
        assert_eq!(state.view_index(), Some(0));

        state.scrub_to(None).unwrap();
        assert_eq!(state.display_fen(), live);
        assert!(state.apply_standard_move(sq("f1"), sq("c4"), None).is_ok());
    }

    #[test]
    fn test_undo_broadcasts_full_position() {
        let mut state = PositionState::new();
        state.apply_standard_move(sq("e2"), sq("e4"), None).unwrap();
        let payload = state.undo_last_move().unwrap();
        assert!(!payload.is_incremental());
        assert_eq!(payload.fen, START_FEN);
        assert!(state.history().is_empty());
        assert_matches!(
            state.undo_last_move(),
            Err(ClassroomError::InvalidState { .. })
        );
    }

    #[test]
    fn test_remote_incremental_move() {
        let mut sender = PositionState::new();
        let mut receiver = PositionState::new();
        let payload = sender.apply_standard_move(sq("g1"), sq("f3"), None).unwrap();
        assert_eq!(receiver.receive_remote(&payload), RemoteOutcome::Advanced);
        assert_eq!(receiver.fen(), sender.fen());
        assert_eq!(receiver.history(), sender.history());
    }

    #[test]
    fn test_remote_move_that_does_not_replay_is_ignored() {
        let mut receiver = PositionState::new();
        let before = receiver.clone();
        let bogus = MovePayload::incremental(sq("e7"), sq("e5"), None, "whatever");
        assert_eq!(receiver.receive_remote(&bogus), RemoteOutcome::Ignored);
        assert_eq!(receiver, before);
    }

    #[test]
    fn test_remote_full_replace_falls_back_to_freeform() {
        let mut receiver = PositionState::new();
        let outcome = receiver.receive_remote(&MovePayload::full("8/8/8/8/8/8/8/8 w - - 0 1"));
        assert_eq!(outcome, RemoteOutcome::Replaced);
        assert_eq!(receiver.mode(), Mode::Freeform);

        assert_eq!(
            receiver.receive_remote(&MovePayload::full("garbage")),
            RemoteOutcome::Ignored
        );
        assert_eq!(receiver.fen(), "8/8/8/8/8/8/8/8 w - - 0 1");
    }

    #[test]
    fn test_remote_full_replace_with_history() {
        let mut coach = PositionState::new();
        let payload = coach.load_position("1. d4 d5 2. c4", None).unwrap();
        let mut student = PositionState::new();
        assert_eq!(student.receive_remote(&payload), RemoteOutcome::Replaced);
        assert_eq!(student.history(), coach.history());

        // follow-up incremental moves replay on the shared history
        let next = coach.apply_standard_move(sq("e7"), sq("e6"), None).unwrap();
        assert_eq!(student.receive_remote(&next), RemoteOutcome::Advanced);
        assert_eq!(student.fen(), coach.fen());
    }

    #[test]
    fn test_remote_history_without_matching_fen_uses_fen() {
        let mut student = PositionState::new();
        let mut payload = MovePayload::full("8/8/8/4k3/8/8/8/4K3 w - - 0 1");
        payload.start_fen = Some(START_FEN.to_string());
        payload.history = Some(vec!["e4".to_string()]);
        assert_eq!(student.receive_remote(&payload), RemoteOutcome::Replaced);
        assert_eq!(student.fen(), "8/8/8/4k3/8/8/8/4K3 w - - 0 1");
        assert!(student.history().is_empty());
    }

    #[test]
    fn test_promotion_reported_in_payload() {
        let mut state = PositionState::new();
        state.load_position("8/P6k/8/8/8/8/8/K7 w - - 0 1", None).unwrap();
        let payload = state.apply_standard_move(sq("a7"), sq("a8"), None).unwrap();
        assert_eq!(payload.promotion, Some(Promotion::Queen));
    }

    #[test]
    fn test_reset_and_export() {
        let mut state = PositionState::new();
        state.load_position("1. e4 e5", Some("Open game")).unwrap();
        let pgn = state.export_pgn(&[]).unwrap();
        assert!(pgn.contains("[Event \"Open game\"]"));
        assert!(pgn.contains("1. e4 e5 *"));

        let payload = state.reset();
        assert_eq!(payload, MovePayload::full(START_FEN));
        assert_eq!(state.label(), None);

        state.load_position("8/8/8/8/8/8/8/8", None).unwrap();
        assert!(state.export_pgn(&[]).is_err());
    }

    #[test]
    fn test_payload_wire_shape() {
        let full = serde_json::to_value(MovePayload::full(START_FEN)).unwrap();
        assert_eq!(full, serde_json::json!({ "fen": START_FEN }));

        let mv = MovePayload::incremental(sq("e2"), sq("e4"), Some(Promotion::Queen), "x");
        let json = serde_json::to_value(&mv).unwrap();
        assert_eq!(json["from"], "e2");
        assert_eq!(json["promotion"], "q");
        let back: MovePayload = serde_json::from_value(json).unwrap();
        assert_eq!(back, mv);
    }
}

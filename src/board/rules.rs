//! Rule engine adapter.
//!
//! Wraps the `chess` crate behind an immutable [`Game`] value derived from a
//! start FEN and a SAN move list. Every transition returns a new `Game`; no
//! engine object is shared or mutated across callers.
//!
//! The board type of the `chess` crate tracks neither the half-move clock nor
//! the full-move number, and it has no SAN writer, so both are handled here.

use chess::{Board, BoardStatus, ChessMove, Color, MoveGen, Piece, Rank};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::board::fen::{split_fen, Placement, START_FEN};
use crate::board::square::{Side, Square};
use crate::shared::error::ClassroomError;

/// Piece chosen for a pawn reaching the last rank. Serialized as the
/// lowercase letter used on the wire (`"q"`, `"r"`, `"b"`, `"n"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Promotion {
    #[serde(rename = "q")]
    Queen,
    #[serde(rename = "r")]
    Rook,
    #[serde(rename = "b")]
    Bishop,
    #[serde(rename = "n")]
    Knight,
}

impl Promotion {
    fn piece(self) -> Piece {
        match self {
            Promotion::Queen => Piece::Queen,
            Promotion::Rook => Piece::Rook,
            Promotion::Bishop => Piece::Bishop,
            Promotion::Knight => Piece::Knight,
        }
    }
}

/// Half-move clock and full-move number of a position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clocks {
    pub halfmove: u32,
    pub fullmove: u32,
}

impl Default for Clocks {
    fn default() -> Self {
        Self {
            halfmove: 0,
            fullmove: 1,
        }
    }
}

/// How the live game stands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Ongoing,
    Checkmate { winner: Side },
    Stalemate,
}

#[derive(Clone, Copy)]
struct Snapshot {
    board: Board,
    clocks: Clocks,
}

/// A standard chess game: start position plus the moves played from it.
#[derive(Clone)]
pub struct Game {
    start_fen: String,
    start: Snapshot,
    current: Snapshot,
    moves: Vec<ChessMove>,
    history: Vec<String>,
}

impl fmt::Debug for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Game")
            .field("start_fen", &self.start_fen)
            .field("history", &self.history)
            .field("fen", &self.fen())
            .finish()
    }
}

impl Game {
    /// The standard starting position with no moves played.
    pub fn standard() -> Self {
        let start = Snapshot {
            board: Board::default(),
            clocks: Clocks::default(),
        };
        Self {
            start_fen: START_FEN.to_string(),
            start,
            current: start,
            moves: Vec::new(),
            history: Vec::new(),
        }
    }

    /// Build a game from a FEN the rules engine accepts as a legal base position.
    pub fn from_fen(fen: &str) -> Result<Self, ClassroomError> {
        // the engine's own parser is not trusted with malformed grids
        let placement = Placement::parse(split_fen(fen).0)?;

        let normalized = with_supported_castling(&normalize_fen(fen), &placement);
        let board = Board::from_str(&normalized).map_err(|e| {
            ClassroomError::parse(format!("rules engine rejected position: {:?}", e))
        })?;
        let start = Snapshot {
            board,
            clocks: clocks_of(&normalized),
        };
        Ok(Self {
            start_fen: normalized,
            start,
            current: start,
            moves: Vec::new(),
            history: Vec::new(),
        })
    }

    /// Re-derive a game by replaying `sans` from `start_fen`.
    pub fn replay(start_fen: &str, sans: &[String]) -> Result<Self, ClassroomError> {
        let mut game = Self::from_fen(start_fen)?;
        for san in sans {
            game = game.play_san(san)?;
        }
        Ok(game)
    }

    /// Play a move given in SAN.
    pub fn play_san(&self, san: &str) -> Result<Self, ClassroomError> {
        let mv = resolve_san(&self.current.board, san)
            .ok_or_else(|| ClassroomError::parse(format!("'{}' is not a legal move here", san)))?;
        Ok(self.with_move(mv))
    }

    /// Play a move given by origin and destination squares.
    ///
    /// When a pawn reaches the last rank and no promotion piece is given, it
    /// becomes a queen. A promotion given for any other move is ignored.
    pub fn play(
        &self,
        from: Square,
        to: Square,
        promotion: Option<Promotion>,
    ) -> Result<(Self, String), ClassroomError> {
        let src = from.to_chess();
        let dst = to.to_chess();
        let candidates: Vec<ChessMove> = MoveGen::new_legal(&self.current.board)
            .filter(|m| m.get_source() == src && m.get_dest() == dst)
            .collect();

        let chosen = match candidates.as_slice() {
            [] => None,
            [only] => Some(*only),
            many => {
                let wanted = promotion.unwrap_or(Promotion::Queen).piece();
                many.iter().copied().find(|m| m.get_promotion() == Some(wanted))
            }
        };
        let mv = chosen.ok_or_else(|| ClassroomError::illegal_move(from.to_string(), to.to_string()))?;

        let next = self.with_move(mv);
        let san = next.history.last().cloned().unwrap_or_default();
        Ok((next, san))
    }

    fn with_move(&self, mv: ChessMove) -> Self {
        let san = san_for(&self.current.board, mv);
        let mut next = self.clone();
        next.current = advance(&self.current, mv);
        next.moves.push(mv);
        next.history.push(san);
        next
    }

    /// The game with its last ply taken back, or `None` at the start position.
    pub fn undo(&self) -> Option<Self> {
        if self.moves.is_empty() {
            return None;
        }
        Some(self.truncated(self.moves.len() - 1))
    }

    fn truncated(&self, plies: usize) -> Self {
        let mut current = self.start;
        for mv in &self.moves[..plies] {
            current = advance(&current, *mv);
        }
        Self {
            start_fen: self.start_fen.clone(),
            start: self.start,
            current,
            moves: self.moves[..plies].to_vec(),
            history: self.history[..plies].to_vec(),
        }
    }

    /// FEN of the live position. A game with no moves reports its start FEN
    /// exactly as it was loaded.
    pub fn fen(&self) -> String {
        if self.moves.is_empty() {
            return self.start_fen.clone();
        }
        render_fen(&self.current.board, self.current.clocks)
    }

    /// FEN after ply `ply` (0-based) has been played.
    pub fn fen_after(&self, ply: usize) -> Result<String, ClassroomError> {
        if ply >= self.moves.len() {
            return Err(ClassroomError::validation(
                "ply",
                format!("ply {} is beyond the {} moves played", ply, self.moves.len()),
            ));
        }
        Ok(self.truncated(ply + 1).fen())
    }

    pub fn start_fen(&self) -> &str {
        &self.start_fen
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn ply_count(&self) -> usize {
        self.history.len()
    }

    pub fn side_to_move(&self) -> Side {
        Side::from_chess(self.current.board.side_to_move())
    }

    /// Side to move at the start position.
    pub fn starting_side(&self) -> Side {
        Side::from_chess(self.start.board.side_to_move())
    }

    pub fn starting_fullmove(&self) -> u32 {
        self.start.clocks.fullmove
    }

    pub fn outcome(&self) -> Outcome {
        match self.current.board.status() {
            BoardStatus::Ongoing => Outcome::Ongoing,
            BoardStatus::Stalemate => Outcome::Stalemate,
            BoardStatus::Checkmate => Outcome::Checkmate {
                winner: self.side_to_move().opposite(),
            },
        }
    }
}

/// Whether the rules engine accepts `fen` as a legal base position.
pub fn is_standard(fen: &str) -> bool {
    Game::from_fen(fen).is_ok()
}

/// Fill in any FEN fields missing after the placement with `w - - 0 1`.
pub fn normalize_fen(fen: &str) -> String {
    const DEFAULTS: [&str; 6] = ["", "w", "-", "-", "0", "1"];
    let fields: Vec<&str> = fen.split_whitespace().collect();
    (0..6)
        .map(|i| fields.get(i).copied().unwrap_or(DEFAULTS[i]))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Drop castling rights whose king or rook is off its home square.
///
/// Diagrams are often pasted with a default `KQkq` field the placement cannot
/// support, which the engine would otherwise refuse outright.
fn with_supported_castling(normalized: &str, placement: &Placement) -> String {
    let mut fields: Vec<String> = normalized.split_whitespace().map(str::to_string).collect();
    let Some(castling) = fields.get(2).cloned() else {
        return normalized.to_string();
    };
    let on = |file: u8, rank: u8, piece: char| {
        Square::new(file, rank)
            .map(|square| placement.get(square) == Some(piece))
            .unwrap_or(false)
    };
    let kept: String = castling
        .chars()
        .filter(|right| match right {
            'K' => on(4, 0, 'K') && on(7, 0, 'R'),
            'Q' => on(4, 0, 'K') && on(0, 0, 'R'),
            'k' => on(4, 7, 'k') && on(7, 7, 'r'),
            'q' => on(4, 7, 'k') && on(0, 7, 'r'),
            _ => false,
        })
        .collect();
    if kept == castling {
        return normalized.to_string();
    }
    let kept = if kept.is_empty() { "-".to_string() } else { kept };
    tracing::debug!("[Rules] Castling rights {} reduced to {}", castling, kept);
    fields[2] = kept;
    fields.join(" ")
}

fn clocks_of(normalized: &str) -> Clocks {
    let fields: Vec<&str> = normalized.split_whitespace().collect();
    let halfmove = fields.get(4).and_then(|f| f.parse().ok()).unwrap_or(0);
    let fullmove = fields
        .get(5)
        .and_then(|f| f.parse().ok())
        .filter(|n: &u32| *n >= 1)
        .unwrap_or(1);
    Clocks { halfmove, fullmove }
}

fn advance(snapshot: &Snapshot, mv: ChessMove) -> Snapshot {
    let board = &snapshot.board;
    let moving = board.piece_on(mv.get_source());
    let pawn_move = moving == Some(Piece::Pawn);
    let capture = board.piece_on(mv.get_dest()).is_some()
        || (pawn_move && mv.get_source().get_file() != mv.get_dest().get_file());

    let halfmove = if pawn_move || capture {
        0
    } else {
        snapshot.clocks.halfmove + 1
    };
    let fullmove = if board.side_to_move() == Color::Black {
        snapshot.clocks.fullmove + 1
    } else {
        snapshot.clocks.fullmove
    };

    Snapshot {
        board: board.make_move_new(mv),
        clocks: Clocks { halfmove, fullmove },
    }
}

fn piece_letter(piece: Piece) -> char {
    match piece {
        Piece::Pawn => 'P',
        Piece::Knight => 'N',
        Piece::Bishop => 'B',
        Piece::Rook => 'R',
        Piece::Queen => 'Q',
        Piece::King => 'K',
    }
}

fn piece_char(piece: Piece, color: Color) -> char {
    let letter = piece_letter(piece);
    match color {
        Color::White => letter,
        Color::Black => letter.to_ascii_lowercase(),
    }
}

fn render_fen(board: &Board, clocks: Clocks) -> String {
    let mut placement = Placement::empty();
    for square in chess::ALL_SQUARES.iter() {
        if let (Some(piece), Some(color)) = (board.piece_on(*square), board.color_on(*square)) {
            placement.set(Square::from_chess(*square), Some(piece_char(piece, color)));
        }
    }

    let mut castling = String::new();
    let white = board.castle_rights(Color::White);
    let black = board.castle_rights(Color::Black);
    if white.has_kingside() {
        castling.push('K');
    }
    if white.has_queenside() {
        castling.push('Q');
    }
    if black.has_kingside() {
        castling.push('k');
    }
    if black.has_queenside() {
        castling.push('q');
    }
    if castling.is_empty() {
        castling.push('-');
    }

    // the engine records the capturable pawn; FEN wants the square behind it
    let en_passant = board
        .en_passant()
        .map(|pawn| {
            let rank = match board.side_to_move() {
                Color::White => Rank::Sixth,
                Color::Black => Rank::Third,
            };
            chess::Square::make_square(rank, pawn.get_file()).to_string()
        })
        .unwrap_or_else(|| "-".to_string());

    format!(
        "{} {} {} {} {} {}",
        placement.encode(),
        Side::from_chess(board.side_to_move()).fen_char(),
        castling,
        en_passant,
        clocks.halfmove,
        clocks.fullmove
    )
}

/// Standard algebraic notation for a legal move on `board`.
pub(crate) fn san_for(board: &Board, mv: ChessMove) -> String {
    let src = mv.get_source();
    let dst = mv.get_dest();
    let piece = board.piece_on(src).unwrap_or(Piece::Pawn);
    let from = Square::from_chess(src);
    let file_delta = src.get_file().to_index() as i32 - dst.get_file().to_index() as i32;

    let mut san = String::new();
    if piece == Piece::King && file_delta.abs() == 2 {
        san.push_str(if file_delta < 0 { "O-O" } else { "O-O-O" });
    } else if piece == Piece::Pawn {
        if file_delta != 0 {
            san.push(from.file_char());
            san.push('x');
        }
        san.push_str(&dst.to_string());
        if let Some(promoted) = mv.get_promotion() {
            san.push('=');
            san.push(piece_letter(promoted));
        }
    } else {
        san.push(piece_letter(piece));
        let rivals: Vec<chess::Square> = MoveGen::new_legal(board)
            .filter(|m| {
                m.get_dest() == dst
                    && m.get_source() != src
                    && board.piece_on(m.get_source()) == Some(piece)
            })
            .map(|m| m.get_source())
            .collect();
        if !rivals.is_empty() {
            let shares_file = rivals.iter().any(|s| s.get_file() == src.get_file());
            let shares_rank = rivals.iter().any(|s| s.get_rank() == src.get_rank());
            if !shares_file {
                san.push(from.file_char());
            } else if !shares_rank {
                san.push(from.rank_char());
            } else {
                san.push(from.file_char());
                san.push(from.rank_char());
            }
        }
        if board.piece_on(dst).is_some() {
            san.push('x');
        }
        san.push_str(&dst.to_string());
    }

    let next = board.make_move_new(mv);
    if next.status() == BoardStatus::Checkmate {
        san.push('#');
    } else if next.checkers().popcnt() > 0 {
        san.push('+');
    }
    san
}

fn normalize_san(token: &str) -> String {
    token
        .trim()
        .replace("0-0-0", "O-O-O")
        .replace("0-0", "O-O")
        .replace("e.p.", "")
        .trim_end_matches(['+', '#', '!', '?'])
        .replace('=', "")
}

/// Find the legal move on `board` that `token` denotes.
pub(crate) fn resolve_san(board: &Board, token: &str) -> Option<ChessMove> {
    let wanted = normalize_san(token);
    if wanted.is_empty() {
        return None;
    }
    let legal: Vec<ChessMove> = MoveGen::new_legal(board).collect();

    if let Some(exact) = legal
        .iter()
        .copied()
        .find(|m| normalize_san(&san_for(board, *m)) == wanted)
    {
        return Some(exact);
    }
    loose_match(board, &legal, &wanted)
}

/// Accept over-specified SAN such as `Ngf3` or `Pe4` when exactly one legal
/// move fits every hint in the token.
fn loose_match(board: &Board, legal: &[ChessMove], wanted: &str) -> Option<ChessMove> {
    let mut chars: Vec<char> = wanted.chars().filter(|c| *c != 'x' && *c != '-').collect();

    let mut promotion = None;
    if chars.len() >= 3 {
        if let Some(last) = chars.last().copied() {
            let promoted = match last.to_ascii_uppercase() {
                'Q' => Some(Piece::Queen),
                'R' => Some(Piece::Rook),
                'B' if chars[chars.len() - 2].is_ascii_digit() => Some(Piece::Bishop),
                'N' => Some(Piece::Knight),
                _ => None,
            };
            if promoted.is_some() && chars[chars.len() - 2].is_ascii_digit() {
                promotion = promoted;
                chars.pop();
            }
        }
    }

    let piece = match chars.first() {
        Some('N') => Piece::Knight,
        Some('B') => Piece::Bishop,
        Some('R') => Piece::Rook,
        Some('Q') => Piece::Queen,
        Some('K') => Piece::King,
        Some('P') => Piece::Pawn,
        _ => {
            chars.insert(0, 'P');
            Piece::Pawn
        }
    };
    if chars.len() < 3 {
        return None;
    }
    let dest_text: String = chars[chars.len() - 2..].iter().collect();
    let dest = Square::parse(&dest_text).ok()?.to_chess();
    let hints = &chars[1..chars.len() - 2];

    let mut fits = legal.iter().copied().filter(|m| {
        let from = Square::from_chess(m.get_source());
        m.get_dest() == dest
            && board.piece_on(m.get_source()) == Some(piece)
            && m.get_promotion() == promotion
            && hints
                .iter()
                .all(|h| *h == from.file_char() || *h == from.rank_char())
    });
    let first = fits.next()?;
    if fits.next().is_some() {
        return None;
    }
    Some(first)
}

//! FEN placement field codec.
//!
//! Only the first FEN field is interpreted here. The remaining fields (side to
//! move, castling, en passant, clocks) are carried through untouched so that a
//! freeform board keeps whatever the coach typed.

use crate::board::square::Square;
use crate::shared::error::ClassroomError;

/// The standard starting position
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

const PIECES: &str = "pnbrqkPNBRQK";

/// Decoded 8x8 piece grid. Row 0 is the eighth rank, column 0 the a-file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    grid: [[Option<char>; 8]; 8],
}

impl Placement {
    /// Decode a placement field (`rnbqkbnr/pppppppp/8/...`).
    pub fn parse(field: &str) -> Result<Self, ClassroomError> {
        let ranks: Vec<&str> = field.split('/').collect();
        if ranks.len() != 8 {
            return Err(ClassroomError::parse(format!(
                "placement has {} ranks, expected 8",
                ranks.len()
            )));
        }

        let mut grid = [[None; 8]; 8];
        for (row, rank) in ranks.iter().enumerate() {
            let mut col = 0usize;
            for ch in rank.chars() {
                if let Some(run) = ch.to_digit(10) {
                    if run == 0 || run > 8 {
                        return Err(ClassroomError::parse(format!(
                            "invalid empty-square run '{}' in rank {}",
                            ch,
                            8 - row
                        )));
                    }
                    col += run as usize;
                } else if PIECES.contains(ch) {
                    if col < 8 {
                        grid[row][col] = Some(ch);
                    }
                    col += 1;
                } else {
                    return Err(ClassroomError::parse(format!(
                        "invalid piece '{}' in rank {}",
                        ch,
                        8 - row
                    )));
                }
                if col > 8 {
                    break;
                }
            }
            if col != 8 {
                return Err(ClassroomError::parse(format!(
                    "rank {} covers {} files, expected 8",
                    8 - row,
                    col
                )));
            }
        }
        Ok(Self { grid })
    }

    pub fn empty() -> Self {
        Self {
            grid: [[None; 8]; 8],
        }
    }

    pub fn get(&self, square: Square) -> Option<char> {
        self.grid[square.fen_row()][square.file() as usize]
    }

    pub fn set(&mut self, square: Square, piece: Option<char>) {
        self.grid[square.fen_row()][square.file() as usize] = piece;
    }

    pub fn piece_count(&self) -> usize {
        self.grid.iter().flatten().filter(|p| p.is_some()).count()
    }

    /// Re-encode in canonical run-length form.
    pub fn encode(&self) -> String {
        let mut ranks = Vec::with_capacity(8);
        for row in &self.grid {
            let mut rank = String::new();
            let mut empty = 0;
            for cell in row {
                match cell {
                    Some(piece) => {
                        if empty > 0 {
                            rank.push_str(&empty.to_string());
                            empty = 0;
                        }
                        rank.push(*piece);
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                rank.push_str(&empty.to_string());
            }
            ranks.push(rank);
        }
        ranks.join("/")
    }

    /// Rows of the grid, eighth rank first. Used for board dumps.
    pub fn rows(&self) -> &[[Option<char>; 8]; 8] {
        &self.grid
    }
}

/// Split a FEN into its placement field and the untouched remainder.
///
/// The remainder keeps its original spacing after the first separator so that
/// reassembly with [`join_fen`] round-trips.
pub fn split_fen(fen: &str) -> (&str, Option<&str>) {
    let trimmed = fen.trim();
    match trimmed.split_once(char::is_whitespace) {
        Some((placement, rest)) => (placement, Some(rest)),
        None => (trimmed, None),
    }
}

pub fn join_fen(placement: &str, rest: Option<&str>) -> String {
    match rest {
        Some(rest) => format!("{} {}", placement, rest),
        None => placement.to_string(),
    }
}

/// Heuristic used by the position codec: FEN-shaped text contains a `/`.
pub fn looks_like_fen(text: &str) -> bool {
    text.contains('/')
}

/// Decode the placement field of a full FEN.
pub fn placement_of(fen: &str) -> Result<Placement, ClassroomError> {
    Placement::parse(split_fen(fen).0)
}

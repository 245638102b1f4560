//! Board squares and sides.
//!
//! Squares arrive from drag-drop handlers and remote messages as algebraic
//! strings (`"e4"`). They are validated once here so that the freeform editor
//! and the rules adapter can index the grid without re-checking bounds.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::shared::error::ClassroomError;

const FILES: &[u8; 8] = b"abcdefgh";

/// A square on the 8x8 board. `file` 0 is the a-file, `rank` 0 is the first rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Square {
    file: u8,
    rank: u8,
}

impl Square {
    pub fn new(file: u8, rank: u8) -> Result<Self, ClassroomError> {
        if file > 7 || rank > 7 {
            return Err(ClassroomError::validation(
                "square",
                format!("file {} / rank {} is off the board", file, rank),
            ));
        }
        Ok(Self { file, rank })
    }

    pub fn parse(text: &str) -> Result<Self, ClassroomError> {
        let bytes = text.trim().as_bytes();
        if bytes.len() != 2 {
            return Err(ClassroomError::validation(
                "square",
                format!("'{}' is not a square", text),
            ));
        }
        let file = FILES
            .iter()
            .position(|f| *f == bytes[0].to_ascii_lowercase())
            .ok_or_else(|| {
                ClassroomError::validation("square", format!("'{}' has no valid file", text))
            })?;
        let rank = match bytes[1] {
            b'1'..=b'8' => bytes[1] - b'1',
            _ => {
                return Err(ClassroomError::validation(
                    "square",
                    format!("'{}' has no valid rank", text),
                ))
            }
        };
        Ok(Self {
            file: file as u8,
            rank,
        })
    }

    pub fn file(self) -> u8 {
        self.file
    }

    pub fn rank(self) -> u8 {
        self.rank
    }

    /// Row index in a FEN placement field, where row 0 is the eighth rank.
    pub fn fen_row(self) -> usize {
        7 - self.rank as usize
    }

    pub fn file_char(self) -> char {
        FILES[self.file as usize] as char
    }

    pub fn rank_char(self) -> char {
        (b'1' + self.rank) as char
    }

    pub(crate) fn to_chess(self) -> chess::Square {
        chess::Square::make_square(
            chess::Rank::from_index(self.rank as usize),
            chess::File::from_index(self.file as usize),
        )
    }

    pub(crate) fn from_chess(square: chess::Square) -> Self {
        Self {
            file: square.get_file().to_index() as u8,
            rank: square.get_rank().to_index() as u8,
        }
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file_char(), self.rank_char())
    }
}

impl FromStr for Square {
    type Err = ClassroomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Square {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Square {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Square::parse(&text).map_err(serde::de::Error::custom)
    }
}

/// A side of the board, also the key of a control assignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn opposite(self) -> Self {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    pub fn fen_char(self) -> char {
        match self {
            Side::White => 'w',
            Side::Black => 'b',
        }
    }

    pub(crate) fn from_chess(color: chess::Color) -> Self {
        match color {
            chess::Color::White => Side::White,
            chess::Color::Black => Side::Black,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::White => f.write_str("white"),
            Side::Black => f.write_str("black"),
        }
    }
}

/// Side owning a FEN piece letter: uppercase is white, lowercase is black.
pub fn piece_side(piece: char) -> Option<Side> {
    match piece {
        'P' | 'N' | 'B' | 'R' | 'Q' | 'K' => Some(Side::White),
        'p' | 'n' | 'b' | 'r' | 'q' | 'k' => Some(Side::Black),
        _ => None,
    }
}

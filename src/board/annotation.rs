//! Annotation channel.
//!
//! Arrows and highlighted squares drawn over the board. The whole set is
//! replaced on every broadcast (last write wins) and cleared whenever a move
//! is applied.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::board::square::Square;

/// Highlight style of a square, passed through to the renderer untouched
pub type SquareStyle = serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Arrow {
    pub from: Square,
    pub to: Square,
}

/// Full annotation state
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationSet {
    #[serde(default)]
    pub arrows: Vec<Arrow>,
    #[serde(default)]
    pub squares: BTreeMap<Square, SquareStyle>,
}

impl AnnotationSet {
    pub fn is_empty(&self) -> bool {
        self.arrows.is_empty() && self.squares.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AnnotationChannel {
    current: AnnotationSet,
}

impl AnnotationChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &AnnotationSet {
        &self.current
    }

    /// Replace the local set; returns what to broadcast.
    pub fn set(&mut self, arrows: Vec<Arrow>, squares: BTreeMap<Square, SquareStyle>) -> AnnotationSet {
        self.current = AnnotationSet { arrows, squares };
        self.current.clone()
    }

    /// Adopt a remote broadcast.
    pub fn receive(&mut self, set: AnnotationSet) {
        self.current = set;
    }

    /// Empty the set; returns the empty set to broadcast.
    pub fn clear(&mut self) -> AnnotationSet {
        self.clear_local();
        self.current.clone()
    }

    /// Empty the set without broadcasting, after a move was applied.
    pub fn clear_local(&mut self) {
        if !self.current.is_empty() {
            tracing::debug!("[Annotation] Cleared after move");
        }
        self.current = AnnotationSet::default();
    }

    /// Draw an arrow, or erase it if it is already there.
    pub fn toggle_arrow(&mut self, from: Square, to: Square) -> AnnotationSet {
        let arrow = Arrow { from, to };
        match self.current.arrows.iter().position(|a| *a == arrow) {
            Some(index) => {
                self.current.arrows.remove(index);
            }
            None => self.current.arrows.push(arrow),
        }
        self.current.clone()
    }

    /// Highlight a square, or remove an identical highlight.
    pub fn toggle_square(&mut self, square: Square, style: SquareStyle) -> AnnotationSet {
        if self.current.squares.get(&square) == Some(&style) {
            self.current.squares.remove(&square);
        } else {
            self.current.squares.insert(square, style);
        }
        self.current.clone()
    }
}

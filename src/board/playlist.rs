//! Lesson playlist navigator.
//!
//! Walks an ordered list of syllabus chapters, loading each one into the
//! position state machine. Navigation stops at either end; it never wraps.

use serde::{Deserialize, Serialize};

use crate::board::position::{MovePayload, PositionState};
use crate::shared::error::ClassroomError;

/// A syllabus chapter as served by the syllabus endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub pgn: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fen: Option<String>,
}

impl Chapter {
    pub fn new(name: impl Into<String>, pgn: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            pgn: pgn.into(),
            fen: None,
        }
    }

    /// Game data to load: the PGN when present, otherwise the FEN.
    pub fn payload(&self) -> Option<&str> {
        if !self.pgn.trim().is_empty() {
            return Some(&self.pgn);
        }
        self.fen.as_deref().filter(|fen| !fen.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

#[derive(Debug, Clone, Default)]
pub struct PlaylistNavigator {
    chapters: Vec<Chapter>,
    current: Option<usize>,
}

impl PlaylistNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn current(&self) -> Option<&Chapter> {
        self.current.and_then(|i| self.chapters.get(i))
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    pub fn has_previous(&self) -> bool {
        matches!(self.current, Some(i) if i > 0)
    }

    pub fn has_next(&self) -> bool {
        matches!(self.current, Some(i) if i + 1 < self.chapters.len())
    }

    /// Start a playlist at `start`, loading that chapter into `position`.
    ///
    /// Nothing changes if the chapter cannot be loaded.
    pub fn load_playlist(
        &mut self,
        chapters: Vec<Chapter>,
        start: usize,
        position: &mut PositionState,
    ) -> Result<MovePayload, ClassroomError> {
        let chapter = chapters.get(start).ok_or_else(|| {
            ClassroomError::validation(
                "chapter",
                format!("chapter {} of a playlist of {}", start + 1, chapters.len()),
            )
        })?;
        let payload = load_chapter(chapter, position)?;

        tracing::info!(
            "[Playlist] Playing '{}' ({}/{})",
            chapter.name,
            start + 1,
            chapters.len()
        );
        self.chapters = chapters;
        self.current = Some(start);
        Ok(payload)
    }

    /// Load the neighbouring chapter. `Ok(None)` at either end of the list.
    pub fn advance(
        &mut self,
        direction: Direction,
        position: &mut PositionState,
    ) -> Result<Option<MovePayload>, ClassroomError> {
        let Some(current) = self.current else {
            return Ok(None);
        };
        let next = match direction {
            Direction::Previous => current.checked_sub(1),
            Direction::Next => Some(current + 1).filter(|i| *i < self.chapters.len()),
        };
        let Some(next) = next else {
            tracing::debug!("[Playlist] Already at the {:?} end", direction);
            return Ok(None);
        };

        let payload = load_chapter(&self.chapters[next], position)?;
        self.current = Some(next);
        tracing::info!(
            "[Playlist] Chapter {}/{}: {}",
            next + 1,
            self.chapters.len(),
            self.chapters[next].name
        );
        Ok(Some(payload))
    }

    /// Leave playlist mode.
    pub fn clear(&mut self) {
        self.chapters.clear();
        self.current = None;
    }
}

fn load_chapter(
    chapter: &Chapter,
    position: &mut PositionState,
) -> Result<MovePayload, ClassroomError> {
    let data = chapter.payload().ok_or_else(|| {
        tracing::warn!("[Playlist] Chapter '{}' has no game data", chapter.name);
        ClassroomError::validation("chapter", format!("'{}' has no data", chapter.name))
    })?;
    position.load_position(data, Some(&chapter.name))
}

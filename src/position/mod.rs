//! Caret position resolution.
//!
//! Maps a caret offset in a terminal text buffer to a screen `(row, column)`
//! pair. The live probe is expensive, so results are memoized.
//!
//! - **geometry**: the probe itself (text before the caret → row/column)
//! - **cache**: `PositionCache`, a keyed memo with explicit invalidation
//! - **calculator**: `PositionCalculator`, cache-first lookup with fallback
//! - **background**: off-thread probing with stale-result rejection
//!
//! ```text
//! caret event ─► PositionCalculator ─► PositionCache (hit) ─► (row, column)
//!                        │ miss
//!                        └─► geometry::probe(BoundTerminal) ─► cache.set
//! ```
//!
//! Host objects (text positions, terminals, window regions) are supplied
//! through the traits below; this module never constructs them.

pub mod background;
pub mod cache;
pub mod calculator;
pub mod geometry;

use std::fmt;

use thiserror::Error;

pub use background::BackgroundProbe;
pub use cache::{CacheStats, PositionCache};
pub use calculator::PositionCalculator;

/// A 1-based screen position. `(0, 0)` means "unknown".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ScreenPosition {
    pub row: u32,
    pub column: u32,
}

impl ScreenPosition {
    /// Safe default when there is nothing to resolve against
    pub const UNKNOWN: ScreenPosition = ScreenPosition { row: 0, column: 0 };

    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    pub fn is_unknown(&self) -> bool {
        *self == Self::UNKNOWN
    }
}

impl From<(u32, u32)> for ScreenPosition {
    fn from((row, column): (u32, u32)) -> Self {
        Self { row, column }
    }
}

impl From<ScreenPosition> for (u32, u32) {
    fn from(pos: ScreenPosition) -> Self {
        (pos.row, pos.column)
    }
}

impl PartialEq<(u32, u32)> for ScreenPosition {
    fn eq(&self, other: &(u32, u32)) -> bool {
        (self.row, self.column) == *other
    }
}

impl fmt::Display for ScreenPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}, column {}", self.row, self.column)
    }
}

/// Identity of a caret position: which buffer, which character offset
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Bookmark {
    pub buffer: u64,
    /// Offset in characters from the start of the buffer
    pub offset: usize,
}

impl Bookmark {
    pub const fn new(buffer: u64, offset: usize) -> Self {
        Self { buffer, offset }
    }
}

/// Cache key used by the calculator
pub type PositionKey = Bookmark;

/// Inclusive screen rectangle, 1-based
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub top: u32,
    pub left: u32,
    pub bottom: u32,
    pub right: u32,
}

impl Rect {
    pub const fn new(top: u32, left: u32, bottom: u32, right: u32) -> Self {
        Self { top, left, bottom, right }
    }

    pub fn contains(&self, pos: ScreenPosition) -> bool {
        (self.top..=self.bottom).contains(&pos.row) && (self.left..=self.right).contains(&pos.column)
    }

    /// Move `pos` to the nearest point inside the rectangle
    pub fn clamp(&self, pos: ScreenPosition) -> ScreenPosition {
        ScreenPosition {
            row: pos.row.max(self.top).min(self.bottom.max(self.top)),
            column: pos.column.max(self.left).min(self.right.max(self.left)),
        }
    }
}

/// Why a live probe produced no position
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("text position is no longer valid")]
    InvalidPosition,

    #[error("buffer {0} is not available")]
    BufferUnavailable(u64),

    #[error("probe returned {got} characters for offset {offset}")]
    Inconsistent { offset: usize, got: usize },

    #[error("background probe worker has stopped")]
    WorkerGone,

    #[error("probe failed: {0}")]
    Failed(String),
}

/// A caret-bearing text position handle owned by the host
pub trait TextPosition {
    /// `None` when the handle no longer refers to a live position
    fn bookmark(&self) -> Option<Bookmark>;
}

impl TextPosition for Bookmark {
    fn bookmark(&self) -> Option<Bookmark> {
        Some(*self)
    }
}

/// The terminal a position is resolved against
pub trait BoundTerminal: Send + Sync {
    fn id(&self) -> u64;

    /// Text from the start of the bookmark's buffer up to its offset.
    ///
    /// This is the expensive call the cache exists to avoid.
    fn text_before(&self, bookmark: &Bookmark) -> Result<String, ProbeError>;
}

/// Window region restricting navigation to a sub-rectangle
pub trait RegionBounds: Send + Sync {
    /// A region definition is in progress; coordinates are not clipped
    fn is_defining(&self) -> bool;

    /// The enabled region, if any
    fn bounds(&self) -> Option<Rect>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_clamp() {
        let rect = Rect::new(2, 5, 10, 40);
        assert_eq!(rect.clamp(ScreenPosition::new(1, 1)), (2, 5));
        assert_eq!(rect.clamp(ScreenPosition::new(20, 50)), (10, 40));
        assert_eq!(rect.clamp(ScreenPosition::new(4, 12)), (4, 12));
    }

    #[test]
    fn test_rect_contains() {
        let rect = Rect::new(2, 5, 10, 40);
        assert!(rect.contains(ScreenPosition::new(2, 5)));
        assert!(rect.contains(ScreenPosition::new(10, 40)));
        assert!(!rect.contains(ScreenPosition::new(11, 40)));
    }

    #[test]
    fn test_unknown_position() {
        assert!(ScreenPosition::default().is_unknown());
        assert_eq!(ScreenPosition::UNKNOWN.to_string(), "row 0, column 0");
    }
}

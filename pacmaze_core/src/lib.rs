use serde::{Deserialize, Serialize};

pub mod agent;
pub mod config;
pub mod environment;
pub mod map;
pub mod maze;

/// Represents a 2D grid coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub fn new(x: usize, y: usize) -> Self {
        Position { x, y }
    }

    /// Applies a displacement, returning `None` when the result would
    /// leave the usize range (stepping off the grid's top or left edge).
    pub fn offset(&self, dx: isize, dy: isize) -> Option<Position> {
        let x = self.x.checked_add_signed(dx)?;
        let y = self.y.checked_add_signed(dy)?;
        Some(Position { x, y })
    }
}

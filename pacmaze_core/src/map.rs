use std::ops::Index;

use serde::{Deserialize, Serialize};

use crate::Position;

/// A generic 2D grid structure.
///
/// Stores elements of type `T` in a flat vector using row-major order.
/// Provides methods for accessing elements via (x, y) coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

impl<T> Grid<T> {
    /// Creates a grid from a row-major cell vector.
    ///
    /// # Panics
    ///
    /// Panics if `cells.len() != width * height`.
    pub fn from_rows(width: usize, height: usize, cells: Vec<T>) -> Self {
        assert_eq!(
            cells.len(),
            width.checked_mul(height).expect("Grid size overflow"),
            "cell count must match grid dimensions"
        );
        Grid {
            width,
            height,
            cells,
        }
    }

    /// Returns the width of the grid.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the height of the grid.
    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Checks if the given coordinates are within the grid boundaries.
    #[inline]
    pub fn is_valid(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    /// Gets an immutable reference to the cell at the given coordinates.
    ///
    /// Returns `None` if the coordinates are out of bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        if self.is_valid(x, y) {
            self.cells.get(y * self.width + x)
        } else {
            None
        }
    }
}

/// Indexing using Position coordinates for access.
impl<T> Index<Position> for Grid<T> {
    type Output = T;

    #[inline]
    fn index(&self, index: Position) -> &Self::Output {
        match self.get(index.x, index.y) {
            Some(cell) => cell,
            None => panic!(
                "Grid index ({}, {}) out of bounds for grid size ({}, {})",
                index.x, index.y, self.width, self.height
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indexes_in_row_major_order() {
        let grid = Grid::from_rows(3, 2, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(grid[Position::new(0, 0)], 0);
        assert_eq!(grid[Position::new(2, 0)], 2);
        assert_eq!(grid[Position::new(0, 1)], 3);
        assert_eq!(grid[Position::new(2, 1)], 5);
    }

    #[test]
    fn get_out_of_bounds_is_none() {
        let grid = Grid::from_rows(2, 2, vec![0, 1, 2, 3]);
        assert_eq!(grid.get(2, 0), None);
        assert_eq!(grid.get(0, 2), None);
    }
}

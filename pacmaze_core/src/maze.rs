use std::{collections::HashSet, path::Path};

use serde::{Deserialize, Serialize};

use crate::{Position, map::Grid};

/// Represents the static type of a cell in the maze grid.
///
/// Pellets and start markers are recorded alongside the grid rather than
/// inside it; once parsed, every cell is simply passable or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cell {
    Floor,
    Wall,
}

/// Represents errors found while parsing a maze description.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MazeError {
    #[error("Maze description is empty")]
    Empty,
    #[error("Inconsistent width at row {row}: expected {expected}, found {found}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("No agent start ('P') found in maze")]
    MissingAgentStart,
    #[error("Multiple agent starts ('P') found in maze")]
    MultipleAgentStarts,
    #[error("No adversary start ('G') found in maze")]
    MissingAdversaryStart,
    #[error("Multiple adversary starts ('G') found in maze")]
    MultipleAdversaryStarts,
    #[error("Failed to read maze file: {0}")]
    Io(String),
}

/// An immutable maze layout: wall geometry, the two start positions and
/// the set of cells that initially hold a pellet.
#[derive(Debug, Clone)]
pub struct Maze {
    grid: Grid<Cell>,
    agent_start: Position,
    adversary_start: Position,
    pellets: HashSet<Position>,
}

impl Maze {
    /// Parses a maze from its text form, one line per row.
    ///
    /// Characters: `#` wall, `.` pellet, `P` agent start (exactly one),
    /// `G` adversary start (exactly one), anything else floor.
    pub fn parse(text: &str) -> Result<Maze, MazeError> {
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim_end)
            .filter(|line| !line.is_empty())
            .collect();
        if lines.is_empty() {
            return Err(MazeError::Empty);
        }

        let height = lines.len();
        let width = lines[0].chars().count();
        if width == 0 {
            return Err(MazeError::Empty);
        }

        let mut cells = Vec::with_capacity(width * height);
        let mut pellets = HashSet::new();
        let mut agent_start: Option<Position> = None;
        let mut adversary_start: Option<Position> = None;

        for (y, line) in lines.iter().enumerate() {
            let row: Vec<char> = line.chars().collect();
            if row.len() != width {
                return Err(MazeError::RaggedRow {
                    row: y,
                    expected: width,
                    found: row.len(),
                });
            }
            for (x, ch) in row.into_iter().enumerate() {
                let pos = Position::new(x, y);
                let cell = match ch {
                    '#' => Cell::Wall,
                    '.' => {
                        pellets.insert(pos);
                        Cell::Floor
                    }
                    'P' => {
                        if agent_start.replace(pos).is_some() {
                            return Err(MazeError::MultipleAgentStarts);
                        }
                        Cell::Floor
                    }
                    'G' => {
                        if adversary_start.replace(pos).is_some() {
                            return Err(MazeError::MultipleAdversaryStarts);
                        }
                        Cell::Floor
                    }
                    _ => Cell::Floor,
                };
                cells.push(cell);
            }
        }

        Ok(Maze {
            grid: Grid::from_rows(width, height, cells),
            agent_start: agent_start.ok_or(MazeError::MissingAgentStart)?,
            adversary_start: adversary_start.ok_or(MazeError::MissingAdversaryStart)?,
            pellets,
        })
    }

    /// Reads and parses a maze file.
    pub fn load(path: impl AsRef<Path>) -> Result<Maze, MazeError> {
        let text = std::fs::read_to_string(path).map_err(|e| MazeError::Io(e.to_string()))?;
        Maze::parse(&text)
    }

    pub fn width(&self) -> usize {
        self.grid.width()
    }

    pub fn height(&self) -> usize {
        self.grid.height()
    }

    pub fn agent_start(&self) -> Position {
        self.agent_start
    }

    pub fn adversary_start(&self) -> Position {
        self.adversary_start
    }

    /// The full set of pellet positions the maze starts with.
    pub fn pellets(&self) -> &HashSet<Position> {
        &self.pellets
    }

    /// Whether the cell at `pos` blocks movement. Off-grid positions are
    /// treated as walls, so mazes without a boundary wall stay closed.
    pub fn is_blocked(&self, pos: Position) -> bool {
        match self.grid.get(pos.x, pos.y) {
            Some(Cell::Floor) => false,
            Some(Cell::Wall) | None => true,
        }
    }

    pub fn cell(&self, x: usize, y: usize) -> Option<&Cell> {
        self.grid.get(x, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = "#####\n\
                           #P..#\n\
                           #.#.#\n\
                           #..G#\n\
                           #####";

    #[test]
    fn parses_layout_and_starts() {
        let maze = Maze::parse(FIXTURE).unwrap();
        assert_eq!(maze.width(), 5);
        assert_eq!(maze.height(), 5);
        assert_eq!(maze.agent_start(), Position::new(1, 1));
        assert_eq!(maze.adversary_start(), Position::new(3, 3));
        assert_eq!(maze.pellets().len(), 6);
        assert!(maze.is_blocked(Position::new(0, 0)));
        assert!(maze.is_blocked(Position::new(2, 2)));
        assert!(!maze.is_blocked(Position::new(1, 1)));
    }

    #[test]
    fn off_grid_positions_are_blocked() {
        let maze = Maze::parse(FIXTURE).unwrap();
        assert!(maze.is_blocked(Position::new(5, 0)));
        assert!(maze.is_blocked(Position::new(0, 99)));
    }

    #[test]
    fn rejects_missing_starts() {
        assert_eq!(
            Maze::parse("###\n#.#\n###").unwrap_err(),
            MazeError::MissingAgentStart
        );
        assert_eq!(
            Maze::parse("###\n#P#\n###").unwrap_err(),
            MazeError::MissingAdversaryStart
        );
    }

    #[test]
    fn rejects_duplicate_starts() {
        assert_eq!(
            Maze::parse("#####\n#PPG#\n#####").unwrap_err(),
            MazeError::MultipleAgentStarts
        );
        assert_eq!(
            Maze::parse("#####\n#PGG#\n#####").unwrap_err(),
            MazeError::MultipleAdversaryStarts
        );
    }

    #[test]
    fn rejects_ragged_rows() {
        assert_eq!(
            Maze::parse("####\n#PG\n####").unwrap_err(),
            MazeError::RaggedRow {
                row: 1,
                expected: 4,
                found: 3
            }
        );
    }

    #[test]
    fn rejects_empty_input() {
        assert_eq!(Maze::parse("").unwrap_err(), MazeError::Empty);
        assert_eq!(Maze::parse("\n\n").unwrap_err(), MazeError::Empty);
    }
}

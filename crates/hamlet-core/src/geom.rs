//! Grid cells and continuous positions.
//!
//! Positions are measured in tile units: the cell `(col, row)` spans
//! `[col, col + 1) × [row, row + 1)` and its centre is at
//! `(col + 0.5, row + 0.5)`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A cell of the tile grid, addressed by column and row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCell {
    /// Column, growing east.
    pub col: i32,
    /// Row, growing south.
    pub row: i32,
}

impl GridCell {
    /// Create a cell from column and row.
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    /// Manhattan (L1) distance.
    pub fn manhattan(self, other: GridCell) -> u32 {
        self.col.abs_diff(other.col) + self.row.abs_diff(other.row)
    }

    /// The four cardinal neighbours in expansion order: up, down, left, right.
    pub fn neighbours(self) -> [GridCell; 4] {
        [
            Self::new(self.col, self.row - 1),
            Self::new(self.col, self.row + 1),
            Self::new(self.col - 1, self.row),
            Self::new(self.col + 1, self.row),
        ]
    }

    /// Offset by `(dc, dr)`.
    pub fn offset(self, dc: i32, dr: i32) -> Self {
        Self::new(self.col + dc, self.row + dr)
    }
}

impl fmt::Display for GridCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.col, self.row)
    }
}

/// A continuous position in tile units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

impl Position {
    /// Create a position.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// The centre of `cell`.
    pub fn centre_of(cell: GridCell) -> Self {
        Self::new(f64::from(cell.col) + 0.5, f64::from(cell.row) + 0.5)
    }

    /// The cell containing this position.
    pub fn cell(self) -> GridCell {
        GridCell::new(self.x.floor() as i32, self.y.floor() as i32)
    }

    /// Euclidean distance.
    pub fn distance(self, other: Position) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Move toward `target` by at most `step`, snapping when within reach.
    ///
    /// Returns the new position and whether `target` was reached.
    pub fn step_toward(self, target: Position, step: f64) -> (Position, bool) {
        let dist = self.distance(target);
        if dist <= step {
            return (target, true);
        }
        let scale = step / dist;
        (
            Position::new(
                self.x + (target.x - self.x) * scale,
                self.y + (target.y - self.y) * scale,
            ),
            false,
        )
    }
}

//! Rectangular integer grids used by the evaluation workload.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A single grid cell. ARC colours are 0-9, but any non-negative value is valid.
pub type Cell = u32;

/// A non-empty, rectangular grid of non-negative integers.
///
/// Construction validates the shape, so every `Grid` in the program has at
/// least one row, no empty rows and equal row lengths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<Cell>>", into = "Vec<Vec<Cell>>")]
pub struct Grid {
    rows: Vec<Vec<Cell>>,
}

/// Why a set of rows is not a grid
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("grid has no rows")]
    Empty,

    #[error("row {row} is empty")]
    EmptyRow { row: usize },

    #[error("row {row} has {found} cells, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
}

impl Grid {
    /// Validate rows into a grid.
    pub fn new(rows: Vec<Vec<Cell>>) -> Result<Self, GridError> {
        let width = match rows.first() {
            None => return Err(GridError::Empty),
            Some(first) => first.len(),
        };

        for (row, cells) in rows.iter().enumerate() {
            if cells.is_empty() {
                return Err(GridError::EmptyRow { row });
            }
            if cells.len() != width {
                return Err(GridError::Ragged {
                    row,
                    expected: width,
                    found: cells.len(),
                });
            }
        }

        Ok(Self { rows })
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.rows[0].len()
    }

    /// Row-major view of the cells.
    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// Cell at `(row, col)`, if inside the grid.
    pub fn get(&self, row: usize, col: usize) -> Option<Cell> {
        self.rows.get(row).and_then(|r| r.get(col)).copied()
    }

    /// Compact JSON form (`[[1,2],[3,4]]`), used as the voting key.
    pub fn canonical(&self) -> String {
        let rows: Vec<String> = self
            .rows
            .iter()
            .map(|row| {
                let cells: Vec<String> = row.iter().map(|c| c.to_string()).collect();
                format!("[{}]", cells.join(","))
            })
            .collect();
        format!("[{}]", rows.join(","))
    }

    /// Copy of the cells resized to `height x width`, filling new cells with `fill`.
    ///
    /// Cells outside the target area are dropped.
    pub fn padded(&self, height: usize, width: usize, fill: Cell) -> Vec<Vec<Cell>> {
        (0..height)
            .map(|r| {
                (0..width)
                    .map(|c| self.get(r, c).unwrap_or(fill))
                    .collect()
            })
            .collect()
    }

    /// Consume the grid, returning its rows.
    pub fn into_rows(self) -> Vec<Vec<Cell>> {
        self.rows
    }
}

impl TryFrom<Vec<Vec<Cell>>> for Grid {
    type Error = GridError;

    fn try_from(rows: Vec<Vec<Cell>>) -> Result<Self, Self::Error> {
        Grid::new(rows)
    }
}

impl From<Grid> for Vec<Vec<Cell>> {
    fn from(grid: Grid) -> Self {
        grid.rows
    }
}

/// Bracketed prompt form: `[[1, 2], [3, 4]]`.
impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "[")?;
            for (j, cell) in row.iter().enumerate() {
                if j > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", cell)?;
            }
            write!(f, "]")?;
        }
        write!(f, "]")
    }
}

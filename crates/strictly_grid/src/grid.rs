//! The N×N mark grid.

use crate::rules;
use crate::types::{Cell, Mark};
use std::fmt;
use tracing::{debug, instrument};

/// Grid size used when none is configured.
pub const DEFAULT_SIZE: usize = 3;

/// Error constructing a grid.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum GridError {
    /// A grid needs at least one row and one column.
    #[display("Grid size must be at least 1")]
    ZeroSize,

    /// Rows handed to [`Grid::from_rows`] do not form a square.
    #[display("Row {} has {} cells, expected {}", row, found, expected)]
    NotSquare {
        /// Offending row.
        row: usize,
        /// Cells in that row.
        found: usize,
        /// Number of rows, which every row must match.
        expected: usize,
    },
}

impl std::error::Error for GridError {}

/// Error placing a mark. The grid is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum PlaceError {
    /// The coordinates fall outside the grid.
    #[display("Position ({}, {}) is outside the {}x{} board", row, col, size, size)]
    OutOfRange {
        /// Requested row.
        row: usize,
        /// Requested column.
        col: usize,
        /// Grid size.
        size: usize,
    },

    /// The cell already holds a mark.
    #[display("Position ({}, {}) is already taken by {}", row, col, by)]
    Occupied {
        /// Requested row.
        row: usize,
        /// Requested column.
        col: usize,
        /// Mark already there.
        by: Mark,
    },
}

impl std::error::Error for PlaceError {}

/// N×N grid of cells, stored row-major.
///
/// Cells only go from empty to occupied, and only through [`Grid::place`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    size: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// Creates an empty `size`×`size` grid.
    #[instrument]
    pub fn new(size: usize) -> Result<Self, GridError> {
        if size == 0 {
            return Err(GridError::ZeroSize);
        }
        Ok(Self {
            size,
            cells: vec![Cell::Empty; size * size],
        })
    }

    /// Rebuilds a grid from rows of cells, e.g. a board received on the wire.
    #[instrument(skip(rows), fields(rows = rows.len()))]
    pub fn from_rows(rows: Vec<Vec<Cell>>) -> Result<Self, GridError> {
        let size = rows.len();
        if size == 0 {
            return Err(GridError::ZeroSize);
        }
        let mut cells = Vec::with_capacity(size * size);
        for (row, cells_in_row) in rows.into_iter().enumerate() {
            if cells_in_row.len() != size {
                return Err(GridError::NotSquare {
                    row,
                    found: cells_in_row.len(),
                    expected: size,
                });
            }
            cells.extend(cells_in_row);
        }
        Ok(Self { size, cells })
    }

    /// Side length.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Cell at `(row, col)`, or `None` outside the grid.
    pub fn get(&self, row: usize, col: usize) -> Option<Cell> {
        self.index(row, col).map(|i| self.cells[i])
    }

    /// Rows, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.cells.chunks(self.size)
    }

    /// Places `mark` at `(row, col)` if the cell exists and is empty.
    #[instrument(skip(self), fields(size = self.size))]
    pub fn place(&mut self, row: usize, col: usize, mark: Mark) -> Result<(), PlaceError> {
        let index = self.index(row, col).ok_or(PlaceError::OutOfRange {
            row,
            col,
            size: self.size,
        })?;

        if let Cell::Occupied(by) = self.cells[index] {
            debug!(row, col, ?by, "Rejected placement on occupied cell");
            return Err(PlaceError::Occupied { row, col, by });
        }

        self.cells[index] = Cell::Occupied(mark);
        Ok(())
    }

    /// True if `mark` fills a row, a column or either diagonal.
    pub fn check_win(&self, mark: Mark) -> bool {
        rules::check_win(self, mark)
    }

    /// True if no empty cell remains.
    pub fn is_full(&self) -> bool {
        rules::is_full(self)
    }

    /// The mark owning a complete line, if any.
    pub fn winner(&self) -> Option<Mark> {
        rules::winner(self)
    }

    fn index(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.size && col < self.size).then(|| row * self.size + col)
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self {
            size: DEFAULT_SIZE,
            cells: vec![Cell::Empty; DEFAULT_SIZE * DEFAULT_SIZE],
        }
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let separator = "-".repeat(self.size * 4 - 3);
        for (r, row) in self.rows().enumerate() {
            let symbols: Vec<&str> = row.iter().map(|cell| cell.symbol()).collect();
            writeln!(f, "{}", symbols.join(" | "))?;
            if r + 1 < self.size {
                writeln!(f, "{}", separator)?;
            }
        }
        Ok(())
    }
}

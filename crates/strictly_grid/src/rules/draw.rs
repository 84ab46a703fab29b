//! Draw detection for N×N grids.

use super::win::winner;
use crate::Grid;
use tracing::instrument;

/// Checks if the grid has no empty cell left.
#[instrument(skip(grid), fields(size = grid.size()))]
pub fn is_full(grid: &Grid) -> bool {
    grid.rows().flatten().all(|cell| !cell.is_empty())
}

/// A full grid where nobody completed a line.
#[instrument(skip(grid), fields(size = grid.size()))]
pub fn is_draw(grid: &Grid) -> bool {
    is_full(grid) && winner(grid).is_none()
}

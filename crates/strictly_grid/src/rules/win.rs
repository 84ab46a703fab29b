//! Win detection for N×N grids.

use crate::{Cell, Grid, Mark};
use strum::IntoEnumIterator;
use tracing::instrument;

/// Checks whether `mark` owns a complete line.
///
/// Every row, every column and both diagonals are scanned on each call.
#[instrument(skip(grid), fields(size = grid.size()))]
pub fn check_win(grid: &Grid, mark: Mark) -> bool {
    let n = grid.size();
    let owned = |row: usize, col: usize| grid.get(row, col) == Some(Cell::Occupied(mark));

    let any_row = (0..n).any(|row| (0..n).all(|col| owned(row, col)));
    let any_col = (0..n).any(|col| (0..n).all(|row| owned(row, col)));
    let main_diagonal = (0..n).all(|i| owned(i, i));
    let anti_diagonal = (0..n).all(|i| owned(i, n - 1 - i));

    any_row || any_col || main_diagonal || anti_diagonal
}

/// Returns the mark that owns a complete line, if any.
#[instrument(skip(grid), fields(size = grid.size()))]
pub fn winner(grid: &Grid) -> Option<Mark> {
    Mark::iter().find(|mark| check_win(grid, *mark))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_with(size: usize, moves: &[(usize, usize, Mark)]) -> Grid {
        let mut grid = Grid::new(size).unwrap();
        for &(row, col, mark) in moves {
            grid.place(row, col, mark).unwrap();
        }
        grid
    }

    #[test]
    fn test_no_winner_empty_board() {
        let grid = Grid::new(3).unwrap();
        assert!(!check_win(&grid, Mark::X));
        assert!(!check_win(&grid, Mark::O));
        assert_eq!(winner(&grid), None);
    }

    #[test]
    fn test_winner_top_row() {
        let grid = grid_with(3, &[(0, 0, Mark::X), (0, 1, Mark::X), (0, 2, Mark::X)]);
        assert!(check_win(&grid, Mark::X));
        assert!(!check_win(&grid, Mark::O));
        assert_eq!(winner(&grid), Some(Mark::X));
    }

    #[test]
    fn test_winner_column() {
        let grid = grid_with(4, &[(0, 2, Mark::O), (1, 2, Mark::O), (2, 2, Mark::O), (3, 2, Mark::O)]);
        assert!(check_win(&grid, Mark::O));
    }

    #[test]
    fn test_winner_anti_diagonal() {
        let grid = grid_with(3, &[(0, 2, Mark::O), (1, 1, Mark::O), (2, 0, Mark::O)]);
        assert_eq!(winner(&grid), Some(Mark::O));
    }

    #[test]
    fn test_no_winner_incomplete() {
        let grid = grid_with(3, &[(0, 0, Mark::X), (0, 1, Mark::X), (0, 2, Mark::O)]);
        assert_eq!(winner(&grid), None);
    }

    #[test]
    fn test_single_cell_grid_wins_immediately() {
        let grid = grid_with(1, &[(0, 0, Mark::X)]);
        assert!(check_win(&grid, Mark::X));
        assert!(!check_win(&grid, Mark::O));
    }
}

//! Game rules for N×N grids.
//!
//! Pure functions over a [`Grid`](crate::Grid). Rules are kept apart from
//! cell storage so the coordinator and the client evaluate boards the same way.

pub mod draw;
pub mod win;

pub use draw::{is_draw, is_full};
pub use win::{check_win, winner};

use crate::{Grid, Mark, Outcome};
use tracing::instrument;

/// Evaluates the board right after `mark` moved.
///
/// A win is checked before a full board, so a last move that both completes
/// a line and fills the grid is a win.
#[instrument(skip(grid), fields(size = grid.size()))]
pub fn evaluate(grid: &Grid, mark: Mark) -> Option<Outcome> {
    if check_win(grid, mark) {
        Some(Outcome::Winner(mark))
    } else if is_full(grid) {
        Some(Outcome::Draw)
    } else {
        None
    }
}

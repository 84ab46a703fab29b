//! Strictly Grid - pure game logic for N×N mark grids
//!
//! Owns the board and the rules shared by the coordinator and its clients.
//! Nothing in here performs I/O.
//!
//! # Example
//!
//! ```
//! use strictly_grid::{Grid, Mark};
//!
//! let mut grid = Grid::new(3).unwrap();
//! grid.place(0, 0, Mark::X).unwrap();
//! assert!(!grid.check_win(Mark::X));
//! assert!(grid.place(0, 0, Mark::O).is_err());
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod grid;
mod outcome;
pub mod rules;
mod types;

pub use grid::{Grid, GridError, PlaceError, DEFAULT_SIZE};
pub use outcome::Outcome;
pub use types::{Cell, Mark};

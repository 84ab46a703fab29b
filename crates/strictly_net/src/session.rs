//! Game session state: one grid, two participants, one turn counter.

use derive_getters::Getters;
use strictly_grid::{Grid, Mark, Outcome, PlaceError, rules};
use tracing::{debug, info, instrument, warn};

/// Number of participants in every game.
pub const SEATS: usize = 2;

/// A participant seated in a game.
#[derive(Debug, Clone, PartialEq, Eq, Getters, derive_new::new)]
pub struct Participant {
    /// Display name.
    name: String,
    /// Assigned mark.
    mark: Mark,
    /// Seat index, 0 or 1. Seat 0 moves first.
    seat: usize,
}

impl Participant {
    /// Participant for a seat, named by connection order.
    pub fn for_seat(seat: usize) -> Self {
        Self::new(format!("Player {}", seat + 1), Mark::for_seat(seat), seat)
    }

    /// 1-based number announced on the wire.
    pub fn player_number(&self) -> u8 {
        (self.seat + 1) as u8
    }
}

/// Error applying a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum MoveError {
    /// The grid rejected the placement.
    #[display("{}", _0)]
    Illegal(PlaceError),

    /// The game is already over.
    #[display("Game is already over")]
    GameOver,
}

impl std::error::Error for MoveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MoveError::Illegal(e) => Some(e),
            MoveError::GameOver => None,
        }
    }
}

impl From<PlaceError> for MoveError {
    fn from(err: PlaceError) -> Self {
        MoveError::Illegal(err)
    }
}

/// State of one game.
///
/// Only [`GameSession::apply_move`] mutates it, and only until an outcome
/// is set.
#[derive(Debug, Clone)]
pub struct GameSession {
    grid: Grid,
    participants: [Participant; SEATS],
    turn: u64,
    outcome: Option<Outcome>,
}

impl GameSession {
    /// Creates a session. Seat 0 moves first.
    #[instrument(skip(grid), fields(size = grid.size()))]
    pub fn new(grid: Grid, participants: [Participant; SEATS]) -> Self {
        info!(
            first = %participants[0].name(),
            second = %participants[1].name(),
            "Creating game session"
        );
        Self {
            grid,
            participants,
            turn: 0,
            outcome: None,
        }
    }

    /// The board.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Both participants in seat order.
    pub fn participants(&self) -> &[Participant; SEATS] {
        &self.participants
    }

    /// Number of accepted moves so far.
    pub fn turn(&self) -> u64 {
        self.turn
    }

    /// Outcome, once the game has ended.
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// Seat of the participant who moves now.
    pub fn active_index(&self) -> usize {
        (self.turn % SEATS as u64) as usize
    }

    /// Participant who moves now.
    pub fn active(&self) -> &Participant {
        &self.participants[self.active_index()]
    }

    /// Participant waiting for the other.
    pub fn waiting(&self) -> &Participant {
        &self.participants[1 - self.active_index()]
    }

    /// Participant holding `mark`.
    pub fn holder_of(&self, mark: Mark) -> &Participant {
        if *self.participants[0].mark() == mark {
            &self.participants[0]
        } else {
            &self.participants[1]
        }
    }

    /// Places the active participant's mark.
    ///
    /// Returns the outcome if the move ended the game. A rejected move leaves
    /// the board and the turn counter untouched.
    #[instrument(skip(self), fields(turn = self.turn))]
    pub fn apply_move(&mut self, row: usize, col: usize) -> Result<Option<Outcome>, MoveError> {
        if self.outcome.is_some() {
            warn!(row, col, "Move after game over");
            return Err(MoveError::GameOver);
        }

        let mark = *self.active().mark();
        self.grid.place(row, col, mark)?;

        let outcome = rules::evaluate(&self.grid, mark);
        match outcome {
            Some(outcome) => {
                info!(row, col, %outcome, "Game decided");
                self.outcome = Some(outcome);
            }
            None => {
                self.turn += 1;
                debug!(row, col, ?mark, next_turn = self.turn, "Move accepted");
            }
        }
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(size: usize) -> GameSession {
        GameSession::new(
            Grid::new(size).unwrap(),
            [Participant::for_seat(0), Participant::for_seat(1)],
        )
    }

    #[test]
    fn test_seats_get_names_and_marks() {
        let p = Participant::for_seat(1);
        assert_eq!(p.name(), "Player 2");
        assert_eq!(*p.mark(), Mark::O);
        assert_eq!(p.player_number(), 2);
    }

    #[test]
    fn test_moves_after_outcome_rejected() {
        let mut game = session(1);
        assert_eq!(game.apply_move(0, 0), Ok(Some(Outcome::Winner(Mark::X))));
        assert_eq!(game.apply_move(0, 0), Err(MoveError::GameOver));
        assert_eq!(game.turn(), 0);
    }
}

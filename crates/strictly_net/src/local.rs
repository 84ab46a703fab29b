//! Hot-seat play: both participants share one process, no network.
//!
//! Progress is reported as the same [`ServerMessage`]s a networked game
//! sends.

use crate::codec::ServerMessage;
use crate::coordinator::Termination;
use crate::moves::MoveSource;
use crate::session::{GameSession, SEATS};
use tracing::{debug, info, instrument, warn};

/// Plays `session` to the end, asking each seat's source for its moves.
///
/// A rejected move is reported as `InvalidMove` and the same seat is asked
/// again. A source that gives up ends the game as aborted.
#[instrument(skip_all, fields(size = session.grid().size()))]
pub async fn play_local<F>(
    mut session: GameSession,
    mut sources: [&mut dyn MoveSource; SEATS],
    mut observe: F,
) -> Termination
where
    F: FnMut(&ServerMessage),
{
    info!("Local game started");
    loop {
        observe(&ServerMessage::Board(session.grid().clone()));

        let seat = session.active_index();
        let mover = session.active().clone();
        observe(&ServerMessage::YourTurn {
            mark: *mover.mark(),
            name: mover.name().clone(),
        });

        loop {
            let Some((row, col)) = sources[seat].next_move(session.grid(), *mover.mark()).await else {
                warn!(name = %mover.name(), "Move source gave up");
                let termination = Termination::Aborted(mover);
                observe(&ServerMessage::GameOver(termination.verdict()));
                return termination;
            };

            match session.apply_move(row, col) {
                Ok(None) => break,
                Ok(Some(outcome)) => {
                    let termination = Termination::decided(&session, outcome);
                    info!(verdict = ?termination.verdict(), "Local game finished");
                    observe(&ServerMessage::Board(session.grid().clone()));
                    observe(&ServerMessage::GameOver(termination.verdict()));
                    return termination;
                }
                Err(e) => {
                    debug!(seat, row, col, error = %e, "Rejected local move");
                    observe(&ServerMessage::InvalidMove {
                        reason: format!("Invalid move: {}", e),
                    });
                }
            }
        }
    }
}

//! Turn coordinator typestate.
//!
//! Each phase is its own type:
//!
//! - [`AwaitingPlayers`] collects exactly two channels.
//! - [`InProgress`] owns the session and drives the turn loop.
//! - [`Finished`] always carries a [`Termination`], never an `Option`.
//!
//! Within a game everything is sequential: the coordinator only ever waits on
//! the active participant's channel.

use crate::channel::{Channel, ChannelError};
use crate::codec::{ClientMessage, ServerMessage, Verdict};
use crate::session::{GameSession, Participant, SEATS};
use strictly_grid::{Grid, Outcome};
use tracing::{debug, info, instrument, warn};

/// Error while seating participants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum LobbyError {
    /// Both seats are taken.
    #[display("Game already has two participants")]
    Full,

    /// Not enough participants to start.
    #[display("Waiting for {} more participant(s)", _0)]
    NotReady(usize),
}

impl std::error::Error for LobbyError {}

/// How a game ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// The participant completed a line.
    Won(Participant),
    /// The board filled up.
    Draw,
    /// The participant disconnected while it was their turn.
    Aborted(Participant),
}

impl Termination {
    /// Termination for a decided session.
    pub fn decided(session: &GameSession, outcome: Outcome) -> Self {
        match outcome {
            Outcome::Winner(mark) => Termination::Won(session.holder_of(mark).clone()),
            Outcome::Draw => Termination::Draw,
        }
    }

    /// The announcement sent to participants.
    pub fn verdict(&self) -> Verdict {
        match self {
            Termination::Won(winner) => Verdict::Win {
                winner: winner.name().clone(),
            },
            Termination::Draw => Verdict::Draw,
            Termination::Aborted(departed) => Verdict::Aborted {
                departed: departed.name().clone(),
            },
        }
    }
}

// ─────────────────────────────────────────────────────────────
//  AwaitingPlayers Phase
// ─────────────────────────────────────────────────────────────

/// Game waiting for its two participants.
///
/// Seats are filled in attach order: the first channel plays X.
pub struct AwaitingPlayers<C> {
    grid: Grid,
    seated: Vec<(Participant, C)>,
}

impl<C: Channel> AwaitingPlayers<C> {
    /// Opens a lobby for a game on `grid`.
    #[instrument(skip(grid), fields(size = grid.size()))]
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            seated: Vec::with_capacity(SEATS),
        }
    }

    /// Seats the next participant.
    #[instrument(skip(self, channel), fields(peer = %channel.peer()))]
    pub fn attach(&mut self, channel: C) -> Result<Participant, LobbyError> {
        if self.seated.len() >= SEATS {
            warn!("Rejecting participant, game is full");
            return Err(LobbyError::Full);
        }

        let participant = Participant::for_seat(self.seated.len());
        info!(
            name = %participant.name(),
            mark = ?participant.mark(),
            "Participant seated"
        );
        self.seated.push((participant.clone(), channel));
        Ok(participant)
    }

    /// Drops seated participants whose connection already closed and
    /// renumbers the rest from seat 0. Returns how many were dropped.
    ///
    /// Nothing has been sent before the game starts, so renumbering is not
    /// visible to anyone.
    #[instrument(skip(self))]
    pub async fn evict_disconnected(&mut self) -> usize {
        let mut kept = Vec::with_capacity(SEATS);
        let mut evicted = 0;
        for (participant, mut channel) in std::mem::take(&mut self.seated) {
            if channel.is_connected().await {
                kept.push(channel);
            } else {
                info!(name = %participant.name(), peer = %channel.peer(), "Seated participant left before the game started");
                channel.close().await;
                evicted += 1;
            }
        }
        self.seated = kept
            .into_iter()
            .enumerate()
            .map(|(seat, channel)| (Participant::for_seat(seat), channel))
            .collect();
        evicted
    }

    /// Number of seated participants.
    pub fn seated(&self) -> usize {
        self.seated.len()
    }

    /// True once both seats are filled.
    pub fn is_ready(&self) -> bool {
        self.seated.len() == SEATS
    }

    /// Starts the game.
    ///
    /// Tells each participant who they are, then shows both the empty board.
    #[instrument(skip(self))]
    pub async fn start(self) -> Result<InProgress<C>, LobbyError> {
        let [(first, first_channel), (second, second_channel)]: [(Participant, C); SEATS] = self
            .seated
            .try_into()
            .map_err(|seated: Vec<_>| LobbyError::NotReady(SEATS - seated.len()))?;

        let mut game = InProgress {
            session: GameSession::new(self.grid, [first, second]),
            channels: [first_channel, second_channel],
        };

        for seat in 0..SEATS {
            let participant = &game.session.participants()[seat];
            let info = ServerMessage::PlayerInfo {
                player_number: participant.player_number(),
                mark: *participant.mark(),
                name: participant.name().clone(),
            };
            game.channels[seat].send(&info).await;
        }
        game.broadcast_board().await;

        info!("Game started");
        Ok(game)
    }
}

// ─────────────────────────────────────────────────────────────
//  InProgress Phase
// ─────────────────────────────────────────────────────────────

/// Game accepting moves.
pub struct InProgress<C> {
    session: GameSession,
    channels: [C; SEATS],
}

impl<C: Channel> InProgress<C> {
    /// The session state.
    pub fn session(&self) -> &GameSession {
        &self.session
    }

    /// Runs turns until someone wins, the board fills, or the active
    /// participant disconnects.
    #[instrument(skip(self))]
    pub async fn play(mut self) -> Finished<C> {
        loop {
            let active = self.session.active_index();
            let mover = self.session.active().clone();
            debug!(turn = self.session.turn(), seat = active, "Turn begins");

            self.channels[active]
                .send(&ServerMessage::YourTurn {
                    mark: *mover.mark(),
                    name: mover.name().clone(),
                })
                .await;
            self.channels[1 - active]
                .send(&ServerMessage::WaitTurn {
                    active: mover.name().clone(),
                })
                .await;

            if let Some(termination) = self.take_turn(active).await {
                info!(verdict = ?termination.verdict(), "Game finished");
                return Finished {
                    session: self.session,
                    channels: self.channels,
                    termination,
                };
            }
        }
    }

    /// Receives from the active seat until a legal move lands.
    ///
    /// Returns `Some` when the game ended.
    async fn take_turn(&mut self, active: usize) -> Option<Termination> {
        loop {
            let (row, col) = match self.channels[active].receive().await {
                Ok(ClientMessage::Move { row, col }) => (row, col),
                Err(ChannelError::Disconnected) => return Some(self.abort(active).await),
                Err(ChannelError::Malformed(e)) if e.is_unrecognized() => {
                    warn!(peer = %self.channels[active].peer(), error = %e, "Ignoring unrecognized line");
                    continue;
                }
                Err(ChannelError::Malformed(e)) => {
                    self.reject(active, format!("Malformed move: {}", e)).await;
                    continue;
                }
            };

            match self.session.apply_move(row, col) {
                Ok(None) => {
                    self.broadcast_board().await;
                    return None;
                }
                Ok(Some(outcome)) => {
                    self.broadcast_board().await;
                    let termination = Termination::decided(&self.session, outcome);
                    self.broadcast(&ServerMessage::GameOver(termination.verdict()))
                        .await;
                    return Some(termination);
                }
                Err(e) => {
                    self.reject(active, format!("Invalid move, try again: {}", e)).await;
                }
            }
        }
    }

    async fn reject(&mut self, seat: usize, reason: String) {
        debug!(seat, %reason, "Rejecting move");
        self.channels[seat]
            .send(&ServerMessage::InvalidMove { reason })
            .await;
    }

    async fn abort(&mut self, departed_seat: usize) -> Termination {
        let departed = self.session.participants()[departed_seat].clone();
        warn!(
            name = %departed.name(),
            peer = %self.channels[departed_seat].peer(),
            "Active participant disconnected, aborting game"
        );
        let termination = Termination::Aborted(departed);
        self.channels[1 - departed_seat]
            .send(&ServerMessage::GameOver(termination.verdict()))
            .await;
        termination
    }

    async fn broadcast_board(&mut self) {
        let board = ServerMessage::Board(self.session.grid().clone());
        self.broadcast(&board).await;
    }

    async fn broadcast(&mut self, message: &ServerMessage) {
        for channel in self.channels.iter_mut() {
            channel.send(message).await;
        }
    }
}

// ─────────────────────────────────────────────────────────────
//  Finished Phase
// ─────────────────────────────────────────────────────────────

/// Game over. No further moves are read.
pub struct Finished<C> {
    session: GameSession,
    channels: [C; SEATS],
    termination: Termination,
}

impl<C: Channel> Finished<C> {
    /// How the game ended.
    pub fn termination(&self) -> &Termination {
        &self.termination
    }

    /// Final session state.
    pub fn session(&self) -> &GameSession {
        &self.session
    }

    /// Closes both channels and returns the termination.
    #[instrument(skip(self))]
    pub async fn close(mut self) -> Termination {
        for channel in self.channels.iter_mut() {
            channel.close().await;
        }
        self.termination
    }
}

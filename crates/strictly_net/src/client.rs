//! Participant side of the protocol.
//!
//! One [`GameClient`] is one connection: it connects once and plays on the
//! same socket until the game is over.

use crate::codec::{ClientMessage, ServerMessage, Verdict};
use crate::moves::MoveSource;
use strictly_grid::{Grid, Mark};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tracing::{debug, info, instrument, warn};

/// Error on the client side.
#[derive(Debug, derive_more::Display)]
pub enum ClientError {
    /// Could not reach the server.
    #[display("Failed to connect to {}: {}", address, source)]
    Connect {
        /// Address we tried.
        address: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// Reading or writing the socket failed.
    #[display("Connection error: {}", _0)]
    Io(std::io::Error),

    /// The server closed the connection before the game was over.
    #[display("Server closed the connection")]
    Disconnected,

    /// The move source gave up.
    #[display("Left the game")]
    GaveUp,
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::Connect { source, .. } => Some(source),
            ClientError::Io(e) => Some(e),
            ClientError::Disconnected | ClientError::GaveUp => None,
        }
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Io(err)
    }
}

/// Who the server said we are.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seat {
    /// 1 or 2.
    pub player_number: u8,
    /// Our mark.
    pub mark: Mark,
    /// Our display name.
    pub name: String,
}

/// A connected participant.
pub struct GameClient {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
    seat: Option<Seat>,
    grid: Option<Grid>,
    turn_mark: Option<Mark>,
}

impl GameClient {
    /// Connects to a server.
    #[instrument]
    pub async fn connect(address: &str) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(address)
            .await
            .map_err(|source| ClientError::Connect {
                address: address.to_string(),
                source,
            })?;
        info!("Connected to server");

        let (reader, writer) = stream.into_split();
        Ok(Self {
            lines: BufReader::new(reader).lines(),
            writer,
            seat: None,
            grid: None,
            turn_mark: None,
        })
    }

    /// Our seat, once the game has started.
    pub fn seat(&self) -> Option<&Seat> {
        self.seat.as_ref()
    }

    /// Latest board received.
    pub fn grid(&self) -> Option<&Grid> {
        self.grid.as_ref()
    }

    /// Plays until the server announces the end of the game.
    ///
    /// `observe` sees every server message in arrival order; lines that do
    /// not decode are logged and skipped.
    #[instrument(skip_all)]
    pub async fn play<M, F>(&mut self, moves: &mut M, mut observe: F) -> Result<Verdict, ClientError>
    where
        M: MoveSource,
        F: FnMut(&ServerMessage) + Send,
    {
        loop {
            let Some(line) = self.lines.next_line().await? else {
                warn!("Server closed the connection mid-game");
                return Err(ClientError::Disconnected);
            };

            let message = match ServerMessage::decode(&line) {
                Ok(message) => message,
                Err(e) => {
                    warn!(error = %e, %line, "Skipping undecodable line");
                    continue;
                }
            };
            observe(&message);

            match message {
                ServerMessage::PlayerInfo {
                    player_number,
                    mark,
                    name,
                } => {
                    debug!(player_number, ?mark, %name, "Seated");
                    self.seat = Some(Seat {
                        player_number,
                        mark,
                        name,
                    });
                }
                ServerMessage::Board(grid) => self.grid = Some(grid),
                ServerMessage::YourTurn { mark, .. } => {
                    self.turn_mark = Some(mark);
                    self.send_move(moves, mark).await?;
                }
                ServerMessage::InvalidMove { reason } => {
                    debug!(%reason, "Move rejected, retrying");
                    let mark = self
                        .turn_mark
                        .or_else(|| self.seat.as_ref().map(|seat| seat.mark))
                        .unwrap_or(Mark::X);
                    self.send_move(moves, mark).await?;
                }
                ServerMessage::WaitTurn { .. } => {}
                ServerMessage::GameOver(verdict) => {
                    info!(?verdict, "Game over");
                    self.shutdown().await;
                    return Ok(verdict);
                }
            }
        }
    }

    async fn send_move<M: MoveSource>(&mut self, moves: &mut M, mark: Mark) -> Result<(), ClientError> {
        let grid = self.grid.clone().unwrap_or_default();
        let Some((row, col)) = moves.next_move(&grid, mark).await else {
            info!("Move source gave up, leaving the game");
            self.shutdown().await;
            return Err(ClientError::GaveUp);
        };

        let line = ClientMessage::Move { row, col }.encode();
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await?;
        debug!(row, col, "Move sent");
        Ok(())
    }

    async fn shutdown(&mut self) {
        if let Err(e) = self.writer.shutdown().await {
            debug!(error = %e, "Shutdown failed");
        }
    }
}

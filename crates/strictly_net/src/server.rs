//! TCP game server.
//!
//! Connections are seated in accept order; every two connections form one
//! game that runs in its own task with its own grid, channels and counter.

use crate::channel::TcpChannel;
use crate::config::{ConfigError, ServerConfig};
use crate::coordinator::{AwaitingPlayers, LobbyError, Termination};
use std::net::SocketAddr;
use std::time::Duration;
use strictly_grid::{Grid, GridError};
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tracing::{Instrument, debug, error, info, info_span, instrument, warn};

/// Pause after a failed accept so a persistent error does not spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Error starting or running the server.
#[derive(Debug, derive_more::Display)]
pub enum ServerError {
    /// Configuration rejected.
    #[display("{}", _0)]
    Config(ConfigError),

    /// Grid size rejected.
    #[display("{}", _0)]
    Grid(GridError),

    /// Could not bind the listener.
    #[display("Failed to bind {}: {}", address, source)]
    Bind {
        /// Address we tried.
        address: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A game could not be seated.
    #[display("{}", _0)]
    Lobby(LobbyError),
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServerError::Config(e) => Some(e),
            ServerError::Grid(e) => Some(e),
            ServerError::Bind { source, .. } => Some(source),
            ServerError::Lobby(e) => Some(e),
        }
    }
}

impl From<ConfigError> for ServerError {
    fn from(err: ConfigError) -> Self {
        ServerError::Config(err)
    }
}

impl From<GridError> for ServerError {
    fn from(err: GridError) -> Self {
        ServerError::Grid(err)
    }
}

impl From<LobbyError> for ServerError {
    fn from(err: LobbyError) -> Self {
        ServerError::Lobby(err)
    }
}

/// Accepts participants and runs their games.
pub struct GameServer {
    listener: TcpListener,
    config: ServerConfig,
}

impl GameServer {
    /// Validates the config and binds the listener.
    #[instrument(skip(config), fields(address = %config.bind_address()))]
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        config.validate()?;
        Grid::new(*config.grid_size())?;

        let address = config.bind_address();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|source| ServerError::Bind {
                address: address.clone(),
                source,
            })?;

        info!(
            grid_size = config.grid_size(),
            games = ?config.games(),
            "Server listening"
        );
        Ok(Self { listener, config })
    }

    /// Address actually bound, useful with port 0.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections until the configured number of games has started,
    /// then waits for those games to finish. Runs forever without a limit.
    #[instrument(skip(self))]
    pub async fn run(self) -> Result<(), ServerError> {
        let mut games = JoinSet::new();
        let mut started: u32 = 0;
        let mut lobby = self.open_lobby()?;

        while !self.config.games().is_some_and(|limit| started >= limit) {
            let (stream, addr) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    warn!(error = %e, "Accept failed");
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                    continue;
                }
            };

            let channel = TcpChannel::from_tcp(stream, self.config.send_timeout());
            if lobby.evict_disconnected().await > 0 {
                debug!(seated = lobby.seated(), "Lobby pruned before seating");
            }
            let participant = lobby.attach(channel)?;
            info!(%addr, name = %participant.name(), "Participant connected");

            if lobby.is_ready() {
                started += 1;
                let ready = std::mem::replace(&mut lobby, self.open_lobby()?);
                games.spawn(run_game(ready).instrument(info_span!("game", id = started)));
            } else {
                info!("Waiting for a second participant");
            }

            while let Some(result) = games.try_join_next() {
                log_game_result(result);
            }
        }

        info!(started, "Game limit reached, waiting for running games");
        while let Some(result) = games.join_next().await {
            log_game_result(result);
        }
        Ok(())
    }

    fn open_lobby(&self) -> Result<AwaitingPlayers<TcpChannel>, ServerError> {
        Ok(AwaitingPlayers::new(Grid::new(*self.config.grid_size())?))
    }
}

async fn run_game(lobby: AwaitingPlayers<TcpChannel>) -> Result<Termination, LobbyError> {
    let game = lobby.start().await?;
    let finished = game.play().await;
    Ok(finished.close().await)
}

fn log_game_result(result: Result<Result<Termination, LobbyError>, tokio::task::JoinError>) {
    match result {
        Ok(Ok(termination)) => debug!(?termination, "Game task finished"),
        Ok(Err(e)) => warn!(error = %e, "Game could not start"),
        Err(e) => error!(error = %e, "Game task failed"),
    }
}

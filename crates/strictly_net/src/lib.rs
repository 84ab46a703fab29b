//! Strictly Net - networked two-player grid games
//!
//! A coordinator seats two remote participants, alternates turns, validates
//! moves against a shared [`strictly_grid::Grid`], and announces the result.
//!
//! # Architecture
//!
//! - **Codec**: typed messages to and from `|`-separated lines
//! - **Channel**: one framed byte stream per participant
//! - **Coordinator**: typestate turn loop (`AwaitingPlayers` → `InProgress` → `Finished`)
//! - **Server**: TCP listener pairing connections into games
//! - **Client**: participant side, playing from any [`MoveSource`]
//! - **Local**: hot-seat game at one terminal, no network
//!
//! # Example
//!
//! ```no_run
//! use strictly_net::{GameServer, ServerConfig};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = ServerConfig::default().with_port(9999).with_games(Some(1));
//! let server = GameServer::bind(config).await?;
//! server.run().await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod channel;
mod client;
mod codec;
mod config;
mod coordinator;
mod local;
mod moves;
mod server;
mod session;

// Crate-level exports - Wire protocol
pub use codec::{
    CELL_SEPARATOR, ClientMessage, ProtocolError, SEPARATOR, ServerMessage, Tag, Verdict, sanitize,
};

// Crate-level exports - Channels
pub use channel::{Channel, ChannelError, DEFAULT_SEND_TIMEOUT, LineChannel, MAX_LINE_BYTES, TcpChannel};

// Crate-level exports - Game state and coordination
pub use coordinator::{AwaitingPlayers, Finished, InProgress, LobbyError, Termination};
pub use session::{GameSession, MoveError, Participant, SEATS};

// Crate-level exports - Server
pub use config::{ConfigError, ServerConfig};
pub use server::{GameServer, ServerError};

// Crate-level exports - Client
pub use client::{ClientError, GameClient, Seat};
pub use moves::{MoveSource, ScriptedMoves, StdinMoves, parse_one_based};

// Crate-level exports - Local play
pub use local::play_local;

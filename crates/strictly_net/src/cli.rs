//! Command-line interface for strictly_net.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use strictly_net::ServerConfig;

/// Strictly Net - two-player grid games over TCP
#[derive(Parser, Debug)]
#[command(name = "strictly_net")]
#[command(about = "Networked tic-tac-toe server and client", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the game server
    Server(ServerArgs),

    /// Join a game as a participant
    Client {
        /// Server host
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Server port
        #[arg(short, long, default_value = "9999")]
        port: u16,
    },

    /// Two players taking turns at this terminal
    Local {
        /// Board side length
        #[arg(long, default_value_t = strictly_grid::DEFAULT_SIZE)]
        size: usize,
    },
}

/// Server options. Flags override the config file.
#[derive(clap::Args, Debug)]
pub struct ServerArgs {
    /// Path to the TOML config file (defaults are used if it is missing)
    #[arg(short, long, default_value = "strictly_net.toml")]
    pub config: PathBuf,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Board side length
    #[arg(long)]
    pub size: Option<usize>,

    /// Stop after this many games
    #[arg(long)]
    pub games: Option<u32>,

    /// Per-message send timeout in milliseconds
    #[arg(long)]
    pub send_timeout_ms: Option<u64>,
}

impl ServerArgs {
    /// Applies command-line overrides on top of `config`.
    pub fn apply(&self, mut config: ServerConfig) -> ServerConfig {
        if let Some(host) = &self.host {
            config = config.with_host(host.as_str());
        }
        if let Some(port) = self.port {
            config = config.with_port(port);
        }
        if let Some(size) = self.size {
            config = config.with_grid_size(size);
        }
        if let Some(games) = self.games {
            config = config.with_games(Some(games));
        }
        if let Some(ms) = self.send_timeout_ms {
            config = config.with_send_timeout_ms(ms);
        }
        config
    }
}

//! Strictly Net - Unified CLI
//!
//! Runs either the game server or an interactive participant.

#![warn(missing_docs)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command, ServerArgs};
use strictly_grid::Grid;
use strictly_net::{
    GameClient, GameServer, GameSession, Participant, ServerConfig, ServerMessage, StdinMoves,
    Verdict, play_local,
};
use tracing::{info, instrument, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,strictly_net=debug,strictly_grid=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Server(args) => run_server(args).await,
        Command::Client { host, port } => run_client(host, port).await,
        Command::Local { size } => run_local(size).await,
    }
}

/// Run the game server until its game limit is reached or Ctrl-C.
#[instrument(skip(args))]
async fn run_server(args: ServerArgs) -> Result<()> {
    let config = ServerConfig::load_or_default(&args.config)?;
    let config = args.apply(config);

    let server = GameServer::bind(config).await?;
    info!(address = %server.local_addr()?, "Server ready - waiting for participants");

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => warn!("Interrupted, shutting down"),
    }
    Ok(())
}

/// Join a game and play it from stdin.
#[instrument]
async fn run_client(host: String, port: u16) -> Result<()> {
    let address = format!("{}:{}", host, port);
    let mut client = GameClient::connect(&address)
        .await
        .with_context(|| format!("Could not join a game at {}", address))?;

    let mut moves = StdinMoves::new();
    let mut me: Option<String> = None;
    let verdict = client
        .play(&mut moves, |message| print_message(message, &mut me))
        .await?;

    info!(?verdict, "Left the game");
    Ok(())
}

/// Play a hot-seat game with both participants reading from stdin.
#[instrument]
async fn run_local(size: usize) -> Result<()> {
    let grid = Grid::new(size).context("Invalid board size")?;
    let session = GameSession::new(grid, [Participant::for_seat(0), Participant::for_seat(1)]);

    let mut first = StdinMoves::new();
    let mut second = first.clone();
    let termination = play_local(session, [&mut first, &mut second], print_local).await;

    info!(verdict = ?termination.verdict(), "Local game over");
    Ok(())
}

fn print_local(message: &ServerMessage) {
    match message {
        ServerMessage::Board(grid) => print!("\n{}\n", grid),
        ServerMessage::YourTurn { mark, name } => println!("{} ({})", name, mark),
        ServerMessage::InvalidMove { .. } => println!("Invalid move"),
        ServerMessage::GameOver(Verdict::Win { winner }) => println!("{} wins", winner),
        ServerMessage::GameOver(Verdict::Draw) => println!("It's a draw"),
        ServerMessage::GameOver(Verdict::Aborted { departed }) => {
            println!("{} left the game", departed)
        }
        ServerMessage::PlayerInfo { .. } | ServerMessage::WaitTurn { .. } => {}
    }
}

fn print_message(message: &ServerMessage, me: &mut Option<String>) {
    match message {
        ServerMessage::PlayerInfo { mark, name, .. } => {
            println!("You are {} ({})", name, mark);
            *me = Some(name.clone());
        }
        ServerMessage::Board(grid) => {
            println!("{}", "=".repeat(grid.size() * 4));
            print!("{}", grid);
            println!("{}", "=".repeat(grid.size() * 4));
        }
        ServerMessage::YourTurn { name, .. } => println!("{}'s turn", name),
        ServerMessage::WaitTurn { active } => println!("Waiting for {} to make a move", active),
        ServerMessage::InvalidMove { reason } => println!("{}", reason),
        ServerMessage::GameOver(Verdict::Win { winner }) => {
            if me.as_deref() == Some(winner.as_str()) {
                println!("Congratulations, You won");
            } else {
                println!("{} wins", winner);
            }
        }
        ServerMessage::GameOver(Verdict::Draw) => println!("Draw Game"),
        ServerMessage::GameOver(Verdict::Aborted { departed }) => {
            println!("{} left the game", departed)
        }
    }
}

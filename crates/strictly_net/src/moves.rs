//! Where a client's moves come from.

use std::collections::VecDeque;
use std::io::Write;
use std::sync::Arc;
use strictly_grid::{Grid, Mark};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;
use tracing::{debug, instrument};

/// Supplies moves when the server asks for one.
#[async_trait::async_trait]
pub trait MoveSource: Send {
    /// Next `(row, col)`, 0-indexed. `None` gives up the game.
    async fn next_move(&mut self, grid: &Grid, mark: Mark) -> Option<(usize, usize)>;
}

/// Plays a fixed list of moves, then gives up.
#[derive(Debug, Clone, Default)]
pub struct ScriptedMoves {
    moves: VecDeque<(usize, usize)>,
}

impl ScriptedMoves {
    /// Creates a script from 0-indexed moves.
    pub fn new(moves: impl IntoIterator<Item = (usize, usize)>) -> Self {
        Self {
            moves: moves.into_iter().collect(),
        }
    }

    /// Moves not played yet.
    pub fn remaining(&self) -> usize {
        self.moves.len()
    }
}

#[async_trait::async_trait]
impl MoveSource for ScriptedMoves {
    #[instrument(skip(self, _grid))]
    async fn next_move(&mut self, _grid: &Grid, mark: Mark) -> Option<(usize, usize)> {
        let next = self.moves.pop_front();
        debug!(?mark, ?next, remaining = self.moves.len(), "Scripted move");
        next
    }
}

/// Prompts on stdout and reads `row col` (1-based) from stdin.
///
/// Clones share one buffered reader, so two seats at the same terminal do
/// not lose each other's input.
#[derive(Clone)]
pub struct StdinMoves {
    lines: Arc<Mutex<Lines<BufReader<Stdin>>>>,
}

impl StdinMoves {
    /// Reads from the process's stdin.
    pub fn new() -> Self {
        Self {
            lines: Arc::new(Mutex::new(BufReader::new(tokio::io::stdin()).lines())),
        }
    }
}

impl Default for StdinMoves {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl MoveSource for StdinMoves {
    async fn next_move(&mut self, grid: &Grid, mark: Mark) -> Option<(usize, usize)> {
        let n = grid.size();
        loop {
            print!("{} - enter row col (1-{}): ", mark, n);
            // A prompt that fails to flush still leaves stdin readable.
            let _ = std::io::stdout().flush();

            let line = match self.lines.lock().await.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) | Err(_) => return None,
            };
            match parse_one_based(&line, n) {
                Ok(cell) => return Some(cell),
                Err(hint) => println!("{}", hint),
            }
        }
    }
}

/// Parses `row col` typed by a person (1-based) into 0-indexed coordinates.
pub fn parse_one_based(input: &str, size: usize) -> Result<(usize, usize), String> {
    let numbers: Vec<usize> = input
        .split_whitespace()
        .map(str::parse)
        .collect::<Result<_, _>>()
        .map_err(|_| "Please enter two numbers separated by a space".to_string())?;

    match numbers.as_slice() {
        [row, col] if (1..=size).contains(row) && (1..=size).contains(col) => Ok((row - 1, col - 1)),
        [_, _] => Err(format!("Please enter numbers between 1 and {}", size)),
        _ => Err("Please enter two numbers separated by a space".to_string()),
    }
}

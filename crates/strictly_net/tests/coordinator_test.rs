//! Turn coordinator tests over scripted in-memory channels.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use strictly_grid::{Cell, Grid, Mark};
use strictly_net::{
    AwaitingPlayers, Channel, ChannelError, ClientMessage, Finished, LobbyError, ServerMessage,
    Termination, Verdict,
};

type Log = Arc<Mutex<Vec<(usize, ServerMessage)>>>;

/// Replays raw lines as the participant's input and records everything sent.
/// Running out of lines looks like a disconnect.
struct ScriptedChannel {
    seat: usize,
    inbound: VecDeque<String>,
    log: Log,
    connected: bool,
}

impl ScriptedChannel {
    fn new(seat: usize, lines: &[&str], log: &Log) -> Self {
        Self {
            seat,
            inbound: lines.iter().map(|line| format!("{}\n", line)).collect(),
            log: Arc::clone(log),
            connected: true,
        }
    }

    fn gone(mut self) -> Self {
        self.connected = false;
        self
    }
}

#[async_trait::async_trait]
impl Channel for ScriptedChannel {
    async fn send(&mut self, message: &ServerMessage) {
        self.log.lock().unwrap().push((self.seat, message.clone()));
    }

    async fn receive(&mut self) -> Result<ClientMessage, ChannelError> {
        match self.inbound.pop_front() {
            Some(line) => ClientMessage::decode(&line).map_err(ChannelError::from),
            None => Err(ChannelError::Disconnected),
        }
    }

    async fn is_connected(&mut self) -> bool {
        self.connected
    }

    fn peer(&self) -> &str {
        "scripted"
    }
}

async fn play(size: usize, first: &[&str], second: &[&str]) -> (Finished<ScriptedChannel>, Vec<(usize, ServerMessage)>) {
    let log: Log = Arc::default();
    let mut lobby = AwaitingPlayers::new(Grid::new(size).unwrap());
    lobby.attach(ScriptedChannel::new(0, first, &log)).unwrap();
    lobby.attach(ScriptedChannel::new(1, second, &log)).unwrap();

    let finished = lobby.start().await.unwrap().play().await;
    let messages = log.lock().unwrap().clone();
    (finished, messages)
}

fn turn_order(messages: &[(usize, ServerMessage)]) -> Vec<usize> {
    messages
        .iter()
        .filter(|(_, m)| matches!(m, ServerMessage::YourTurn { .. }))
        .map(|(seat, _)| *seat)
        .collect()
}

fn sent_to(messages: &[(usize, ServerMessage)], seat: usize) -> Vec<ServerMessage> {
    messages
        .iter()
        .filter(|(s, _)| *s == seat)
        .map(|(_, m)| m.clone())
        .collect()
}

const X_TOP_ROW: [&str; 3] = ["MOVE|0|0", "MOVE|0|1", "MOVE|0|2"];
const O_MIDDLE: [&str; 2] = ["MOVE|1|1", "MOVE|1|0"];

#[tokio::test]
async fn test_game_opens_with_identities_then_board() {
    let (_, messages) = play(3, &X_TOP_ROW, &O_MIDDLE).await;

    let empty = ServerMessage::Board(Grid::new(3).unwrap());
    assert_eq!(
        messages[..4],
        [
            (
                0,
                ServerMessage::PlayerInfo {
                    player_number: 1,
                    mark: Mark::X,
                    name: "Player 1".to_string(),
                }
            ),
            (
                1,
                ServerMessage::PlayerInfo {
                    player_number: 2,
                    mark: Mark::O,
                    name: "Player 2".to_string(),
                }
            ),
            (0, empty.clone()),
            (1, empty),
        ]
    );
}

#[tokio::test]
async fn test_top_row_win() {
    let (finished, messages) = play(3, &X_TOP_ROW, &O_MIDDLE).await;

    let Termination::Won(winner) = finished.termination() else {
        panic!("expected a win, got {:?}", finished.termination());
    };
    assert_eq!(winner.name(), "Player 1");
    assert_eq!(finished.session().turn(), 4);

    let game_over = ServerMessage::GameOver(Verdict::Win {
        winner: "Player 1".to_string(),
    });
    let n = messages.len();
    assert_eq!(messages[n - 2], (0, game_over.clone()));
    assert_eq!(messages[n - 1], (1, game_over));

    // The final board reaches both participants before the verdict.
    let ServerMessage::Board(final_board) = &messages[n - 3].1 else {
        panic!("expected the final board before GAME_OVER");
    };
    assert_eq!(final_board.get(0, 2), Some(Cell::Occupied(Mark::X)));
    assert_eq!(final_board.winner(), Some(Mark::X));
}

#[tokio::test]
async fn test_turns_alternate_starting_with_first_seat() {
    let (_, messages) = play(3, &X_TOP_ROW, &O_MIDDLE).await;
    assert_eq!(turn_order(&messages), vec![0, 1, 0, 1, 0]);

    // Every YOUR_TURN is followed by WAIT_TURN to the other seat naming the mover.
    for (i, (seat, message)) in messages.iter().enumerate() {
        if let ServerMessage::YourTurn { name, .. } = message {
            assert_eq!(
                messages[i + 1],
                (1 - seat, ServerMessage::WaitTurn { active: name.clone() })
            );
        }
    }
}

#[tokio::test]
async fn test_illegal_moves_are_retried_without_advancing() {
    let (finished, messages) = play(
        3,
        &X_TOP_ROW,
        &["MOVE|0|0", "MOVE|3|0", "MOVE|1|1", "MOVE|1|0"],
    )
    .await;

    assert!(matches!(finished.termination(), Termination::Won(_)));
    assert_eq!(turn_order(&messages), vec![0, 1, 0, 1, 0]);

    let rejections: Vec<_> = sent_to(&messages, 1)
        .into_iter()
        .filter_map(|m| match m {
            ServerMessage::InvalidMove { reason } => Some(reason),
            _ => None,
        })
        .collect();
    assert_eq!(rejections.len(), 2);
    assert!(rejections[0].contains("already taken"));
    assert!(rejections[1].contains("outside"));
    assert!(
        sent_to(&messages, 0)
            .iter()
            .all(|m| !matches!(m, ServerMessage::InvalidMove { .. }))
    );
}

#[tokio::test]
async fn test_malformed_move_rejected_unknown_lines_ignored() {
    let (finished, messages) = play(
        3,
        &["HELLO", "", "MOVE|a|b", "MOVE|0|0", "MOVE|0|1", "MOVE|0|2"],
        &O_MIDDLE,
    )
    .await;

    assert!(matches!(finished.termination(), Termination::Won(_)));
    let rejections: Vec<_> = sent_to(&messages, 0)
        .into_iter()
        .filter_map(|m| match m {
            ServerMessage::InvalidMove { reason } => Some(reason),
            _ => None,
        })
        .collect();
    assert_eq!(rejections.len(), 1);
    assert!(rejections[0].starts_with("Malformed move"));
}

#[tokio::test]
async fn test_full_board_is_a_draw() {
    let (finished, messages) = play(
        3,
        &["MOVE|0|0", "MOVE|0|2", "MOVE|1|0", "MOVE|2|1", "MOVE|2|2"],
        &["MOVE|0|1", "MOVE|1|1", "MOVE|2|0", "MOVE|1|2"],
    )
    .await;

    assert_eq!(finished.termination(), &Termination::Draw);
    assert_eq!(finished.session().grid().to_string().lines().next(), Some("X | O | X"));
    assert!(finished.session().grid().is_full());

    let n = messages.len();
    assert_eq!(messages[n - 2], (0, ServerMessage::GameOver(Verdict::Draw)));
    assert_eq!(messages[n - 1], (1, ServerMessage::GameOver(Verdict::Draw)));
}

#[tokio::test]
async fn test_active_disconnect_aborts_game() {
    let (finished, messages) = play(3, &["MOVE|0|0"], &["MOVE|1|1"]).await;

    let Termination::Aborted(departed) = finished.termination() else {
        panic!("expected an abort, got {:?}", finished.termination());
    };
    assert_eq!(departed.name(), "Player 1");

    assert_eq!(
        messages.last(),
        Some(&(
            1,
            ServerMessage::GameOver(Verdict::Aborted {
                departed: "Player 1".to_string(),
            })
        ))
    );
    assert!(
        sent_to(&messages, 0)
            .iter()
            .all(|m| !matches!(m, ServerMessage::GameOver(_)))
    );
    assert_eq!(turn_order(&messages), vec![0, 1, 0]);
}

#[tokio::test]
async fn test_single_cell_game_ends_on_first_move() {
    let (finished, messages) = play(1, &["MOVE|0|0"], &[]).await;

    assert!(matches!(finished.termination(), Termination::Won(_)));
    assert_eq!(turn_order(&messages), vec![0]);
    assert_eq!(finished.session().turn(), 0);
}

#[tokio::test]
async fn test_lobby_seats_exactly_two() {
    let log: Log = Arc::default();
    let mut lobby = AwaitingPlayers::new(Grid::default());

    let first = lobby.attach(ScriptedChannel::new(0, &[], &log)).unwrap();
    assert_eq!(*first.mark(), Mark::X);
    assert!(!lobby.is_ready());

    let second = lobby.attach(ScriptedChannel::new(1, &[], &log)).unwrap();
    assert_eq!(second.name(), "Player 2");
    assert!(lobby.is_ready());

    assert_eq!(
        lobby.attach(ScriptedChannel::new(2, &[], &log)).err(),
        Some(LobbyError::Full)
    );
    assert_eq!(lobby.seated(), 2);
}

#[tokio::test]
async fn test_start_needs_two_participants() {
    let log: Log = Arc::default();
    let mut lobby = AwaitingPlayers::new(Grid::default());
    lobby.attach(ScriptedChannel::new(0, &[], &log)).unwrap();

    assert_eq!(lobby.start().await.err(), Some(LobbyError::NotReady(1)));
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_departed_lobby_member_is_replaced() {
    let log: Log = Arc::default();
    let mut lobby = AwaitingPlayers::new(Grid::default());
    lobby.attach(ScriptedChannel::new(9, &[], &log).gone()).unwrap();

    assert_eq!(lobby.evict_disconnected().await, 1);
    assert_eq!(lobby.seated(), 0);

    // The next arrivals take both seats as if the first never came.
    lobby.attach(ScriptedChannel::new(0, &X_TOP_ROW, &log)).unwrap();
    lobby.attach(ScriptedChannel::new(1, &O_MIDDLE, &log)).unwrap();
    let finished = lobby.start().await.unwrap().play().await;

    let Termination::Won(winner) = finished.termination() else {
        panic!("expected a win, got {:?}", finished.termination());
    };
    assert_eq!(winner.name(), "Player 1");
    assert!(log.lock().unwrap().iter().all(|(seat, _)| *seat != 9));
}

#[tokio::test]
async fn test_eviction_renumbers_remaining_seat() {
    let log: Log = Arc::default();
    let mut lobby = AwaitingPlayers::new(Grid::default());
    lobby.attach(ScriptedChannel::new(0, &[], &log).gone()).unwrap();
    lobby.attach(ScriptedChannel::new(1, &[], &log)).unwrap();

    assert_eq!(lobby.evict_disconnected().await, 1);
    assert!(!lobby.is_ready());

    let next = lobby.attach(ScriptedChannel::new(2, &[], &log)).unwrap();
    assert_eq!(next.name(), "Player 2");
    assert_eq!(*next.mark(), Mark::O);
}


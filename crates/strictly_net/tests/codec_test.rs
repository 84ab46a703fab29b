//! Wire format tests for the line protocol.

use strictly_grid::{Cell, Grid, Mark};
use strictly_net::{ClientMessage, ProtocolError, ServerMessage, Tag, Verdict};

fn grid_from(rows: &[&str]) -> Grid {
    let mut grid = Grid::new(rows.len()).unwrap();
    for (r, row) in rows.iter().enumerate() {
        for (c, symbol) in row.chars().enumerate() {
            match symbol {
                'X' => grid.place(r, c, Mark::X).unwrap(),
                'O' => grid.place(r, c, Mark::O).unwrap(),
                _ => {}
            }
        }
    }
    grid
}

#[test]
fn test_server_lines_match_wire_spelling() {
    let cases = [
        (
            ServerMessage::PlayerInfo {
                player_number: 1,
                mark: Mark::X,
                name: "Player 1".to_string(),
            },
            "PLAYER_INFO|1|X|Player 1\n",
        ),
        (
            ServerMessage::YourTurn {
                mark: Mark::O,
                name: "Player 2".to_string(),
            },
            "YOUR_TURN|O|Player 2\n",
        ),
        (
            ServerMessage::WaitTurn {
                active: "Player 1".to_string(),
            },
            "WAIT_TURN|Player 1\n",
        ),
        (
            ServerMessage::InvalidMove {
                reason: "Cell taken".to_string(),
            },
            "INVALID_MOVE|Cell taken\n",
        ),
        (
            ServerMessage::GameOver(Verdict::Win {
                winner: "Player 1".to_string(),
            }),
            "GAME_OVER|WIN|Player 1\n",
        ),
        (ServerMessage::GameOver(Verdict::Draw), "GAME_OVER|DRAW\n"),
        (
            ServerMessage::GameOver(Verdict::Aborted {
                departed: "Player 2".to_string(),
            }),
            "GAME_OVER|ABORTED|Player 2\n",
        ),
    ];

    for (message, line) in cases {
        assert_eq!(message.encode(), line);
        assert_eq!(ServerMessage::decode(line), Ok(message));
    }
}

#[test]
fn test_empty_board_uses_spaces() {
    let board = ServerMessage::Board(Grid::new(3).unwrap());
    assert_eq!(board.encode(), "BOARD|3| , , | , , | , , \n");
}

#[test]
fn test_board_with_marks() {
    let grid = grid_from(&["XO.", ".X.", "..O"]);
    let line = ServerMessage::Board(grid.clone()).encode();
    assert_eq!(line, "BOARD|3|X,O, | ,X, | , ,O\n");

    let ServerMessage::Board(decoded) = ServerMessage::decode(&line).unwrap() else {
        panic!("expected a board");
    };
    assert_eq!(decoded, grid);
    assert_eq!(decoded.get(0, 1), Some(Cell::Occupied(Mark::O)));
    assert_eq!(decoded.get(2, 0), Some(Cell::Empty));
}

#[test]
fn test_single_cell_board_keeps_its_space() {
    let line = ServerMessage::Board(Grid::new(1).unwrap()).encode();
    assert_eq!(line, "BOARD|1| \n");
    assert_eq!(
        ServerMessage::decode(&line),
        Ok(ServerMessage::Board(Grid::new(1).unwrap()))
    );
}

#[test]
fn test_board_rejects_bad_shapes() {
    assert!(matches!(
        ServerMessage::decode("BOARD|2|X,O\n"),
        Err(ProtocolError::FieldCount { tag: Tag::Board, .. })
    ));
    assert!(matches!(
        ServerMessage::decode("BOARD|2|X,O|X\n"),
        Err(ProtocolError::InvalidBoard(_))
    ));
    assert!(matches!(
        ServerMessage::decode("BOARD|1|Q\n"),
        Err(ProtocolError::InvalidSymbol(_))
    ));
    assert!(matches!(
        ServerMessage::decode("BOARD|three| \n"),
        Err(ProtocolError::InvalidNumber { tag: Tag::Board, .. })
    ));
}

#[test]
fn test_free_text_cannot_break_framing() {
    let message = ServerMessage::WaitTurn {
        active: "a|b\nc".to_string(),
    };
    assert_eq!(message.encode(), "WAIT_TURN|a b c\n");
}

#[test]
fn test_move_lines() {
    assert_eq!(ClientMessage::Move { row: 1, col: 2 }.encode(), "MOVE|1|2\n");
    assert_eq!(
        ClientMessage::decode("MOVE|1|2\r\n"),
        Ok(ClientMessage::Move { row: 1, col: 2 })
    );
    assert_eq!(
        ClientMessage::decode("MOVE| 0 | 2 "),
        Ok(ClientMessage::Move { row: 0, col: 2 })
    );
}

#[test]
fn test_move_errors() {
    assert_eq!(
        ClientMessage::decode("MOVE|1\n"),
        Err(ProtocolError::FieldCount {
            tag: Tag::Move,
            expected: 3,
            found: 2,
        })
    );
    assert!(matches!(
        ClientMessage::decode("MOVE|-1|0\n"),
        Err(ProtocolError::InvalidNumber { field: "row", .. })
    ));
    assert!(matches!(
        ClientMessage::decode("MOVE|0|x\n"),
        Err(ProtocolError::InvalidNumber { field: "col", .. })
    ));
}

#[test]
fn test_unrecognized_lines() {
    let empty = ClientMessage::decode("\n").unwrap_err();
    assert_eq!(empty, ProtocolError::Empty);
    assert!(empty.is_unrecognized());

    let unknown = ClientMessage::decode("HELLO|there\n").unwrap_err();
    assert_eq!(unknown, ProtocolError::UnknownTag("HELLO".to_string()));
    assert!(unknown.is_unrecognized());

    let wrong_way = ClientMessage::decode("GAME_OVER|DRAW\n").unwrap_err();
    assert_eq!(wrong_way, ProtocolError::WrongDirection(Tag::GameOver));
    assert!(wrong_way.is_unrecognized());

    assert_eq!(
        ServerMessage::decode("MOVE|0|0\n"),
        Err(ProtocolError::WrongDirection(Tag::Move))
    );
    assert!(!ClientMessage::decode("MOVE|a|b\n").unwrap_err().is_unrecognized());
}

#[test]
fn test_unknown_verdict_rejected() {
    assert!(matches!(
        ServerMessage::decode("GAME_OVER|TIE\n"),
        Err(ProtocolError::InvalidSymbol(_))
    ));
    assert!(matches!(
        ServerMessage::decode("GAME_OVER|WIN\n"),
        Err(ProtocolError::FieldCount { .. })
    ));
}

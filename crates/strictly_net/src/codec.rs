//! Line protocol spoken between the coordinator and its participants.
//!
//! Every message is one line of `|`-separated fields ending in `\n`. The
//! first field names the message. Nothing outside this module knows the wire
//! spelling, so the coordinator only ever sees typed messages.

use strictly_grid::{Cell, Grid, Mark};
use tracing::instrument;

/// Field separator.
pub const SEPARATOR: &str = "|";

/// Separator between cells of one board row.
pub const CELL_SEPARATOR: &str = ",";

/// Message discriminator, the first field of every line.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Tag {
    /// `PLAYER_INFO`
    PlayerInfo,
    /// `BOARD`
    Board,
    /// `YOUR_TURN`
    YourTurn,
    /// `WAIT_TURN`
    WaitTurn,
    /// `INVALID_MOVE`
    InvalidMove,
    /// `GAME_OVER`
    GameOver,
    /// `MOVE`
    Move,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "UPPERCASE")]
enum VerdictKind {
    Win,
    Draw,
    Aborted,
}

/// How a game ended, as announced to the participants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Someone completed a line.
    Win {
        /// Display name of the winner.
        winner: String,
    },
    /// The board filled up.
    Draw,
    /// A participant disconnected mid-game.
    Aborted {
        /// Display name of the participant that left.
        departed: String,
    },
}

/// Error decoding a line.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum ProtocolError {
    /// Nothing but whitespace.
    #[display("Empty line")]
    Empty,

    /// First field is not a known message type.
    #[display("Unknown message type {:?}", _0)]
    UnknownTag(String),

    /// Known message type, but not one this side accepts.
    #[display("{} is not accepted on this side of the connection", _0)]
    WrongDirection(Tag),

    /// Wrong number of fields for the message type.
    #[display("{} expects {} fields, got {}", tag, expected, found)]
    FieldCount {
        /// Message type.
        tag: Tag,
        /// Fields required, including the tag.
        expected: usize,
        /// Fields received.
        found: usize,
    },

    /// A numeric field did not parse.
    #[display("{} field {} is not a number: {:?}", tag, field, value)]
    InvalidNumber {
        /// Message type.
        tag: Tag,
        /// Field name.
        field: &'static str,
        /// Raw field text.
        value: String,
    },

    /// A mark or cell symbol is not recognised.
    #[display("Unknown symbol {:?}", _0)]
    InvalidSymbol(String),

    /// Board rows do not form an N×N grid.
    #[display("Malformed board: {}", _0)]
    InvalidBoard(String),

    /// No line terminator within the length limit. The whole line was dropped.
    #[display("Line exceeds {} bytes", _0)]
    LineTooLong(u64),
}

impl std::error::Error for ProtocolError {}

impl ProtocolError {
    /// True when the line is not a message this side understands at all,
    /// as opposed to a recognised message with bad fields.
    pub fn is_unrecognized(&self) -> bool {
        matches!(
            self,
            ProtocolError::Empty | ProtocolError::UnknownTag(_) | ProtocolError::WrongDirection(_)
        )
    }
}

/// Messages sent by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerMessage {
    /// Tells a participant who they are.
    PlayerInfo {
        /// 1 for the first participant, 2 for the second.
        player_number: u8,
        /// Assigned mark.
        mark: Mark,
        /// Display name.
        name: String,
    },
    /// Full board snapshot.
    Board(Grid),
    /// Sent to the participant who must move now.
    YourTurn {
        /// Mark to play.
        mark: Mark,
        /// Display name of the mover.
        name: String,
    },
    /// Sent to the idle participant.
    WaitTurn {
        /// Display name of the participant being waited on.
        active: String,
    },
    /// The last move was rejected; the same participant moves again.
    InvalidMove {
        /// Human readable reason.
        reason: String,
    },
    /// Final message of a game.
    GameOver(Verdict),
}

/// Messages sent by a participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientMessage {
    /// Place the sender's mark, 0-indexed.
    Move {
        /// Row.
        row: usize,
        /// Column.
        col: usize,
    },
}

impl ServerMessage {
    /// Message discriminator.
    pub fn tag(&self) -> Tag {
        match self {
            ServerMessage::PlayerInfo { .. } => Tag::PlayerInfo,
            ServerMessage::Board(_) => Tag::Board,
            ServerMessage::YourTurn { .. } => Tag::YourTurn,
            ServerMessage::WaitTurn { .. } => Tag::WaitTurn,
            ServerMessage::InvalidMove { .. } => Tag::InvalidMove,
            ServerMessage::GameOver(_) => Tag::GameOver,
        }
    }

    /// Encodes the message as one newline-terminated line.
    pub fn encode(&self) -> String {
        let mut line = Line::new(self.tag());
        match self {
            ServerMessage::PlayerInfo {
                player_number,
                mark,
                name,
            } => {
                line.field(player_number.to_string());
                line.field(mark.symbol());
                line.text(name);
            }
            ServerMessage::Board(grid) => {
                line.field(grid.size().to_string());
                for row in grid.rows() {
                    let symbols: Vec<&str> = row.iter().map(|cell| cell.symbol()).collect();
                    line.field(symbols.join(CELL_SEPARATOR));
                }
            }
            ServerMessage::YourTurn { mark, name } => {
                line.field(mark.symbol());
                line.text(name);
            }
            ServerMessage::WaitTurn { active } => line.text(active),
            ServerMessage::InvalidMove { reason } => line.text(reason),
            ServerMessage::GameOver(verdict) => match verdict {
                Verdict::Win { winner } => {
                    line.field(VerdictKind::Win.to_string());
                    line.text(winner);
                }
                Verdict::Draw => line.field(VerdictKind::Draw.to_string()),
                Verdict::Aborted { departed } => {
                    line.field(VerdictKind::Aborted.to_string());
                    line.text(departed);
                }
            },
        }
        line.finish()
    }

    /// Decodes one line received from the coordinator.
    #[instrument(level = "trace")]
    pub fn decode(line: &str) -> Result<Self, ProtocolError> {
        let (tag, fields) = split(line)?;
        match tag {
            Tag::PlayerInfo => {
                expect_fields(tag, &fields, 4)?;
                Ok(ServerMessage::PlayerInfo {
                    player_number: number(tag, "player_num", fields[1])?,
                    mark: mark(fields[2])?,
                    name: fields[3].to_string(),
                })
            }
            Tag::Board => decode_board(&fields).map(ServerMessage::Board),
            Tag::YourTurn => {
                expect_fields(tag, &fields, 3)?;
                Ok(ServerMessage::YourTurn {
                    mark: mark(fields[1])?,
                    name: fields[2].to_string(),
                })
            }
            Tag::WaitTurn => {
                expect_fields(tag, &fields, 2)?;
                Ok(ServerMessage::WaitTurn {
                    active: fields[1].to_string(),
                })
            }
            Tag::InvalidMove => {
                expect_fields(tag, &fields, 2)?;
                Ok(ServerMessage::InvalidMove {
                    reason: fields[1].to_string(),
                })
            }
            Tag::GameOver => decode_verdict(&fields).map(ServerMessage::GameOver),
            Tag::Move => Err(ProtocolError::WrongDirection(tag)),
        }
    }
}

impl ClientMessage {
    /// Encodes the message as one newline-terminated line.
    pub fn encode(&self) -> String {
        match self {
            ClientMessage::Move { row, col } => {
                let mut line = Line::new(Tag::Move);
                line.field(row.to_string());
                line.field(col.to_string());
                line.finish()
            }
        }
    }

    /// Decodes one line received from a participant.
    #[instrument(level = "trace")]
    pub fn decode(line: &str) -> Result<Self, ProtocolError> {
        let (tag, fields) = split(line)?;
        match tag {
            Tag::Move => {
                expect_fields(tag, &fields, 3)?;
                Ok(ClientMessage::Move {
                    row: number(tag, "row", fields[1])?,
                    col: number(tag, "col", fields[2])?,
                })
            }
            other => Err(ProtocolError::WrongDirection(other)),
        }
    }
}

/// Replaces characters that would break framing in free text.
pub fn sanitize(text: &str) -> String {
    text.replace(SEPARATOR, " ").replace(['\r', '\n'], " ")
}

struct Line {
    fields: Vec<String>,
}

impl Line {
    fn new(tag: Tag) -> Self {
        Self {
            fields: vec![tag.to_string()],
        }
    }

    fn field(&mut self, value: impl Into<String>) {
        self.fields.push(value.into());
    }

    fn text(&mut self, value: &str) {
        self.fields.push(sanitize(value));
    }

    fn finish(self) -> String {
        let mut line = self.fields.join(SEPARATOR);
        line.push('\n');
        line
    }
}

// Only the line terminator is stripped: an empty cell is a space.
fn split(line: &str) -> Result<(Tag, Vec<&str>), ProtocolError> {
    let line = line.strip_suffix('\n').unwrap_or(line);
    let line = line.strip_suffix('\r').unwrap_or(line);
    if line.trim().is_empty() {
        return Err(ProtocolError::Empty);
    }

    let fields: Vec<&str> = line.split(SEPARATOR).collect();
    let raw_tag = fields[0].trim();
    let tag = raw_tag
        .parse::<Tag>()
        .map_err(|_| ProtocolError::UnknownTag(raw_tag.to_string()))?;
    Ok((tag, fields))
}

fn expect_fields(tag: Tag, fields: &[&str], expected: usize) -> Result<(), ProtocolError> {
    if fields.len() == expected {
        Ok(())
    } else {
        Err(ProtocolError::FieldCount {
            tag,
            expected,
            found: fields.len(),
        })
    }
}

fn number<T: std::str::FromStr>(tag: Tag, field: &'static str, raw: &str) -> Result<T, ProtocolError> {
    raw.trim().parse().map_err(|_| ProtocolError::InvalidNumber {
        tag,
        field,
        value: raw.to_string(),
    })
}

fn mark(raw: &str) -> Result<Mark, ProtocolError> {
    raw.trim()
        .parse()
        .map_err(|_| ProtocolError::InvalidSymbol(raw.to_string()))
}

fn decode_board(fields: &[&str]) -> Result<Grid, ProtocolError> {
    if fields.len() < 2 {
        return Err(ProtocolError::FieldCount {
            tag: Tag::Board,
            expected: 2,
            found: fields.len(),
        });
    }
    let size: usize = number(Tag::Board, "size", fields[1])?;
    expect_fields(Tag::Board, fields, size.saturating_add(2))?;

    let rows = fields[2..]
        .iter()
        .map(|row| {
            row.split(CELL_SEPARATOR)
                .map(|symbol| {
                    Cell::from_symbol(symbol)
                        .ok_or_else(|| ProtocolError::InvalidSymbol(symbol.to_string()))
                })
                .collect::<Result<Vec<Cell>, ProtocolError>>()
        })
        .collect::<Result<Vec<_>, _>>()?;

    Grid::from_rows(rows).map_err(|e| ProtocolError::InvalidBoard(e.to_string()))
}

fn decode_verdict(fields: &[&str]) -> Result<Verdict, ProtocolError> {
    if fields.len() < 2 {
        return Err(ProtocolError::FieldCount {
            tag: Tag::GameOver,
            expected: 2,
            found: fields.len(),
        });
    }
    let kind = fields[1]
        .trim()
        .parse::<VerdictKind>()
        .map_err(|_| ProtocolError::InvalidSymbol(fields[1].to_string()))?;

    match kind {
        VerdictKind::Win => {
            expect_fields(Tag::GameOver, fields, 3)?;
            Ok(Verdict::Win {
                winner: fields[2].to_string(),
            })
        }
        VerdictKind::Draw => {
            expect_fields(Tag::GameOver, fields, 2)?;
            Ok(Verdict::Draw)
        }
        VerdictKind::Aborted => {
            expect_fields(Tag::GameOver, fields, 3)?;
            Ok(Verdict::Aborted {
                departed: fields[2].to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_use_wire_spelling() {
        assert_eq!(Tag::PlayerInfo.to_string(), "PLAYER_INFO");
        assert_eq!(Tag::YourTurn.to_string(), "YOUR_TURN");
        assert_eq!("INVALID_MOVE".parse::<Tag>(), Ok(Tag::InvalidMove));
        assert_eq!(VerdictKind::Aborted.to_string(), "ABORTED");
    }

    #[test]
    fn test_line_too_long_is_a_bad_move() {
        let err = ProtocolError::LineTooLong(8192);
        assert!(!err.is_unrecognized());
        assert_eq!(err.to_string(), "Line exceeds 8192 bytes");
    }

    #[test]
    fn test_sanitize_keeps_one_line() {
        assert_eq!(sanitize("a|b\nc\r"), "a b c ");
    }
}

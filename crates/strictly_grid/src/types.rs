//! Marks and cells.

/// A participant's mark.
///
/// The wire spelling is the single-letter symbol, so `strum` handles both
/// directions.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
    strum::EnumIter,
)]
pub enum Mark {
    /// First participant's mark (moves first).
    X,
    /// Second participant's mark.
    O,
}

impl Mark {
    /// Returns the other mark.
    pub fn opponent(self) -> Self {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }

    /// Mark assigned to the participant in the given seat (0 or 1).
    pub fn for_seat(seat: usize) -> Self {
        if seat % 2 == 0 { Mark::X } else { Mark::O }
    }

    /// Symbol used on the wire and in rendering.
    pub fn symbol(self) -> &'static str {
        self.into()
    }
}

/// One cell of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Cell {
    /// Nobody has played here.
    #[default]
    Empty,
    /// Taken by a mark. Never changes afterwards.
    Occupied(Mark),
}

impl Cell {
    /// Symbol used on the wire: the mark letter, or a single space.
    pub fn symbol(self) -> &'static str {
        match self {
            Cell::Empty => " ",
            Cell::Occupied(mark) => mark.symbol(),
        }
    }

    /// Parses a wire symbol. A space or an empty token is an empty cell.
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            " " | "" => Some(Cell::Empty),
            other => other.parse::<Mark>().ok().map(Cell::Occupied),
        }
    }

    /// Returns true if no mark occupies this cell.
    pub fn is_empty(self) -> bool {
        matches!(self, Cell::Empty)
    }
}

//! The 3x3 grid and its line checks

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, InvalidMoveReason, Result};
use crate::{CELLS, SIZE};

/// One of the two symbols that can occupy a cell
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    pub fn opponent(self) -> Mark {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Mark::X => 'X',
            Mark::O => 'O',
        }
    }

    pub fn from_char(c: char) -> Option<Mark> {
        match c {
            'X' | 'x' => Some(Mark::X),
            'O' | 'o' => Some(Mark::O),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Cell {
    Empty,
    Marked(Mark),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            _ => false,
        }
    }

    // digit of this cell in the base-3 position code
    fn code(self) -> u16 {
        match self {
            Cell::Empty => 0,
            Cell::Marked(Mark::X) => 1,
            Cell::Marked(Mark::O) => 2,
        }
    }
}

/// A 3x3 Tic-Tac-Toe grid
///
/// Cells are stored row-major and addressed with 0-indexed `(row, col)`
/// coordinates. The board knows nothing about whose turn it is.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct Board {
    cells: [Cell; CELLS],
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self {
            cells: [Cell::Empty; CELLS],
        }
    }

    /// Rebuilds a board from its base-3 position code (see [`Board::key`])
    pub fn from_key(mut key: u16) -> Self {
        let mut board = Self::new();
        for cell in board.cells.iter_mut() {
            *cell = match key % 3 {
                1 => Cell::Marked(Mark::X),
                2 => Cell::Marked(Mark::O),
                _ => Cell::Empty,
            };
            key /= 3;
        }
        board
    }

    /// Base-3 code of the position, cell `r * 3 + c` having weight `3^(r * 3 + c)`
    pub fn key(&self) -> u16 {
        self.cells
            .iter()
            .rev()
            .fold(0, |key, cell| key * 3 + cell.code())
    }

    /// The cell at `(row, col)`
    ///
    /// Both coordinates must be below 3. Unlike [`Board::place`], nothing is checked
    /// in release builds, so `get(0, 5)` would read `(1, 2)`.
    pub fn get(&self, row: usize, col: usize) -> Cell {
        debug_assert!(row < SIZE && col < SIZE, "cell ({}, {}) is off the board", row, col);
        self.cells[row * SIZE + col]
    }

    /// Puts `mark` on an empty cell
    ///
    /// Fails with [`Error::InvalidMove`] if the cell is off the board or already
    /// taken, in which case the board is unchanged.
    pub fn place(&mut self, row: usize, col: usize, mark: Mark) -> Result<()> {
        if row >= SIZE || col >= SIZE {
            return Err(Error::InvalidMove {
                row,
                col,
                reason: InvalidMoveReason::OutOfRange,
            });
        }
        let cell = &mut self.cells[row * SIZE + col];
        if !cell.is_empty() {
            return Err(Error::InvalidMove {
                row,
                col,
                reason: InvalidMoveReason::Occupied,
            });
        }
        *cell = Cell::Marked(mark);
        Ok(())
    }

    /// Empties a cell, undoing a speculative placement
    ///
    /// Coordinates are trusted the same way as in [`Board::get`].
    pub fn clear(&mut self, row: usize, col: usize) {
        debug_assert!(row < SIZE && col < SIZE, "cell ({}, {}) is off the board", row, col);
        self.cells[row * SIZE + col] = Cell::Empty;
    }

    /// Empty cells in row-major order
    pub fn empty_cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, cell)| cell.is_empty())
            .map(|(idx, _)| (idx / SIZE, idx % SIZE))
    }

    pub fn empty_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_empty()).count()
    }

    pub fn count(&self, mark: Mark) -> usize {
        self.cells
            .iter()
            .filter(|&&cell| cell == Cell::Marked(mark))
            .count()
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|cell| !cell.is_empty())
    }

    pub fn has_winner(&self) -> bool {
        self.check_rows() || self.check_columns() || self.check_diagonals()
    }

    pub fn check_rows(&self) -> bool {
        (0..SIZE).any(|row| self.row_winner(row).is_some())
    }

    pub fn check_columns(&self) -> bool {
        (0..SIZE).any(|col| self.column_winner(col).is_some())
    }

    pub fn check_diagonals(&self) -> bool {
        self.diagonal_winner().is_some() || self.anti_diagonal_winner().is_some()
    }

    /// The mark of the first complete line, scanning rows, then columns, then
    /// the two diagonals
    pub fn winning_mark(&self) -> Option<Mark> {
        (0..SIZE)
            .find_map(|row| self.row_winner(row))
            .or_else(|| (0..SIZE).find_map(|col| self.column_winner(col)))
            .or_else(|| self.diagonal_winner())
            .or_else(|| self.anti_diagonal_winner())
    }

    fn row_winner(&self, row: usize) -> Option<Mark> {
        self.line_winner([(row, 0), (row, 1), (row, 2)])
    }

    fn column_winner(&self, col: usize) -> Option<Mark> {
        self.line_winner([(0, col), (1, col), (2, col)])
    }

    // top-left to bottom-right
    fn diagonal_winner(&self) -> Option<Mark> {
        self.line_winner([(0, 0), (1, 1), (2, 2)])
    }

    // top-right to bottom-left
    fn anti_diagonal_winner(&self) -> Option<Mark> {
        self.line_winner([(0, 2), (1, 1), (2, 0)])
    }

    fn line_winner(&self, line: [(usize, usize); SIZE]) -> Option<Mark> {
        let (row, col) = line[0];
        match self.get(row, col) {
            Cell::Marked(mark)
                if line[1..]
                    .iter()
                    .all(|&(r, c)| self.get(r, c) == Cell::Marked(mark)) =>
            {
                Some(mark)
            }
            _ => None,
        }
    }
}

/// Parses nine cells in row-major order
///
/// `X` and `O` (any case) are marks, `.`, `_` and space are empty cells, and
/// `/` or `|` may be used to separate rows: `"XO./.X./..O"`.
impl FromStr for Board {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let mut board = Self::new();
        let mut idx = 0;
        for c in s.chars().filter(|c| !matches!(c, '/' | '|')) {
            if idx == CELLS {
                return Err(anyhow::anyhow!("too many cells in '{}'", s));
            }
            board.cells[idx] = match c {
                '.' | '_' | ' ' => Cell::Empty,
                _ => match Mark::from_char(c) {
                    Some(mark) => Cell::Marked(mark),
                    None => return Err(anyhow::anyhow!("could not parse '{}' as a cell", c)),
                },
            };
            idx += 1;
        }
        if idx != CELLS {
            return Err(anyhow::anyhow!(
                "expected {} cells, found {} in '{}'",
                CELLS,
                idx,
                s
            ));
        }
        Ok(board)
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "-------------")?;
        for row in 0..SIZE {
            write!(f, "|")?;
            for col in 0..SIZE {
                let symbol = match self.get(row, col) {
                    Cell::Empty => ' ',
                    Cell::Marked(mark) => mark.to_char(),
                };
                write!(f, " {} |", symbol)?;
            }
            writeln!(f)?;
            writeln!(f, "-------------")?;
        }
        Ok(())
    }
}

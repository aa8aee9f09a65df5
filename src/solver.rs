//! An agent to play Tic-Tac-Toe perfectly

use std::cmp::Ordering;

use tracing::{debug, instrument, warn};

use crate::board::{Board, Mark};
use crate::error::{Error, Result};
use crate::{opening_book::*, transposition_table::*, CELLS, SIZE};

/// The score of a win for the automated player on the move being searched
pub const WIN_SCORE: i32 = CELLS as i32 + 1;
/// The minimum possible score of a position
pub const MIN_SCORE: i32 = -WIN_SCORE;
/// The maximum possible score of a position
pub const MAX_SCORE: i32 = WIN_SCORE;

/// The outcome a root score promises under perfect play from both sides
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Prediction {
    /// The automated player wins, placing at most `moves` more marks (including this one)
    Win { moves: usize },
    /// The human wins, placing at most `moves` more marks
    Loss { moves: usize },
    Draw,
}

impl Prediction {
    pub fn from_score(score: i32) -> Self {
        match score.cmp(&0) {
            Ordering::Greater => Prediction::Win {
                moves: (WIN_SCORE - score) as usize / 2 + 1,
            },
            Ordering::Less => Prediction::Loss {
                moves: ((WIN_SCORE + score) as usize + 1) / 2,
            },
            Ordering::Equal => Prediction::Draw,
        }
    }
}

// shift a score found `depth` half-moves below the root to the value it would
// have at the root, and back again
fn to_depth_zero(score: i32, depth: usize) -> i32 {
    match score.cmp(&0) {
        Ordering::Greater => score + depth as i32,
        Ordering::Less => score - depth as i32,
        Ordering::Equal => 0,
    }
}

// a win or loss never shifts past 1 or -1, however deep it is found
fn from_depth_zero(score: i32, depth: usize) -> i32 {
    match score.cmp(&0) {
        Ordering::Greater => (score - depth as i32).max(1),
        Ordering::Less => (score + depth as i32).min(-1),
        Ordering::Equal => 0,
    }
}

/// An agent that picks the automated player's optimal move
///
/// # Notes
/// Every candidate move is scored with a full-depth minimax search in which the
/// automated player maximises and the human minimises. Speculative marks are
/// placed on the board and cleared again on the way back up, so the board only
/// ever changes by the single move that is finally chosen.
///
/// # Position Scoring
/// A won position is worth [`WIN_SCORE`] to the automated player and
/// `-WIN_SCORE` to the human, moved one point towards 0 for every half-move
/// between the root and the win. Quicker wins therefore score higher and slower
/// losses score higher than quicker ones. A drawn position scores 0.
#[derive(Clone)]
pub struct SearchEngine {
    automated: Mark,
    human: Mark,

    /// The number of nodes searched by this `SearchEngine` so far (for diagnostics only)
    pub node_count: usize,
    transposition_table: Option<TranspositionTable>,
    opening_book: Option<OpeningBook>,
}

impl SearchEngine {
    /// Creates a new `SearchEngine` playing `automated` against its opponent mark
    pub fn new(automated: Mark) -> Self {
        Self {
            automated,
            human: automated.opponent(),
            node_count: 0,
            transposition_table: Some(TranspositionTable::new()),
            opening_book: None,
        }
    }

    /// Creates a new `SearchEngine` with an explicit mark for each side
    pub fn with_marks(automated: Mark, human: Mark) -> Result<Self> {
        if automated == human {
            return Err(Error::IllegalState(
                "automated and human players must use different marks",
            ));
        }
        Ok(Self::new(automated))
    }

    /// Removes the transposition table, searching every node from scratch
    pub fn uncached(mut self) -> Self {
        self.transposition_table = None;
        self
    }

    /// Adds an opening book to an existing `SearchEngine`
    pub fn with_opening_book(mut self, opening_book: OpeningBook) -> Self {
        self.opening_book = Some(opening_book);
        self
    }

    pub fn automated_mark(&self) -> Mark {
        self.automated
    }

    pub fn human_mark(&self) -> Mark {
        self.human
    }

    /// Static evaluation: 1 if the automated mark holds a complete line, -1 if
    /// the human mark does, 0 otherwise
    pub fn evaluate(&self, board: &Board) -> i32 {
        match board.winning_mark() {
            Some(mark) if mark == self.automated => 1,
            Some(mark) if mark == self.human => -1,
            _ => 0,
        }
    }

    /// Scores `board` by exhaustive search
    ///
    /// `depth` is the number of half-moves already made below the root and
    /// `maximizing` is true when the automated player is to move. The board is
    /// returned to its original state.
    pub fn minimax(&mut self, board: &mut Board, depth: usize, maximizing: bool) -> i32 {
        self.node_count += 1;

        if board.has_winner() {
            return from_depth_zero(self.evaluate(board) * WIN_SCORE, depth);
        }
        if board.is_full() {
            return 0;
        }

        // deeper than any real game could reach, normalised scores would change sign
        let cacheable = depth + board.empty_count() <= CELLS;
        let key = board.key();
        if cacheable {
            if let Some(table) = &self.transposition_table {
                let value = table.get(key, maximizing) as i32;
                if value != 0 {
                    return from_depth_zero(value + MIN_SCORE - 1, depth);
                }
            }
        }

        let mark = if maximizing {
            self.automated
        } else {
            self.human
        };
        let mut best_score = if maximizing { i32::MIN } else { i32::MAX };
        for row in 0..SIZE {
            for col in 0..SIZE {
                if board.place(row, col, mark).is_err() {
                    continue;
                }
                let score = self.minimax(board, depth + 1, !maximizing);
                board.clear(row, col);

                best_score = if maximizing {
                    best_score.max(score)
                } else {
                    best_score.min(score)
                };
            }
        }

        if cacheable {
            if let Some(table) = &mut self.transposition_table {
                // offset of one to prevent putting a 0, which represents an empty entry
                table.set(
                    key,
                    maximizing,
                    (to_depth_zero(best_score, depth) - MIN_SCORE + 1) as u8,
                );
            }
        }
        best_score
    }

    /// Finds the automated player's best move without playing it
    ///
    /// Returns the score of the position (see [Position Scoring]) and the chosen
    /// `(row, col)`. Equal scores keep the first cell in row-major order.
    ///
    /// [Position Scoring]: #position-scoring
    #[instrument(skip(self, board), fields(position = board.key()))]
    pub fn best_move(&mut self, board: &Board) -> Result<(i32, (usize, usize))> {
        if board.is_full() {
            return Err(Error::IllegalState("cannot search a full board"));
        }

        if let Some(book) = &self.opening_book {
            if book.automated_mark() == self.automated {
                match book.get(board.key()) {
                    Some((score, (row, col))) if board.get(row, col).is_empty() => {
                        debug!(score, "opening book hit");
                        return Ok((score, (row, col)));
                    }
                    Some(_) => warn!("opening book move is not playable, searching instead"),
                    None => {}
                }
            }
        }

        let mut board = *board;
        let mut best_score = i32::MIN;
        let mut best_cell = None;
        for row in 0..SIZE {
            for col in 0..SIZE {
                if board.place(row, col, self.automated).is_err() {
                    continue;
                }
                // the human answers next
                let score = self.minimax(&mut board, 0, false);
                board.clear(row, col);

                if score > best_score {
                    best_score = score;
                    best_cell = Some((row, col));
                }
            }
        }

        best_cell
            .map(|cell| (best_score, cell))
            .ok_or(Error::IllegalState("no empty cell to search"))
    }

    /// Picks the automated player's best move and plays it on `board`
    pub fn choose_automated_move(&mut self, board: &mut Board) -> Result<(usize, usize)> {
        let (score, (row, col)) = self.best_move(board)?;
        board.place(row, col, self.automated)?;
        debug!(row, col, score, nodes = self.node_count, "automated move played");
        Ok((row, col))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Cell;
    use anyhow::Result;

    #[test]
    fn evaluation_follows_marks_not_symbols() -> Result<()> {
        let board: Board = "XXX/OO./...".parse()?;

        let engine = SearchEngine::new(Mark::O);
        assert_eq!(engine.evaluate(&board), -1);

        let engine = SearchEngine::new(Mark::X);
        assert_eq!(engine.evaluate(&board), 1);

        let board: Board = "XO./.X./O..".parse()?;
        assert_eq!(engine.evaluate(&board), 0);
        Ok(())
    }

    #[test]
    fn terminal_scores_move_towards_zero_with_depth() -> Result<()> {
        let mut engine = SearchEngine::new(Mark::O);

        let mut won: Board = "OOO/XX./X..".parse()?;
        assert_eq!(engine.minimax(&mut won, 0, true), WIN_SCORE);
        assert_eq!(engine.minimax(&mut won, 2, true), WIN_SCORE - 2);

        let mut lost: Board = "XXX/OO./O..".parse()?;
        assert_eq!(engine.minimax(&mut lost, 1, true), -WIN_SCORE + 1);
        assert_eq!(engine.minimax(&mut lost, 3, true), -WIN_SCORE + 3);

        // past any real game depth the sign still belongs to the winner
        assert_eq!(engine.minimax(&mut won, 11, false), 1);
        assert_eq!(engine.minimax(&mut lost, 30, true), -1);

        let mut drawn: Board = "XXO/OOX/XOX".parse()?;
        assert_eq!(engine.minimax(&mut drawn, 4, false), 0);
        Ok(())
    }

    #[test]
    fn prefers_immediate_win() -> Result<()> {
        // O completes the middle row while X threatens (0, 1)
        let board: Board = "X.X/OO./X..".parse()?;
        let mut engine = SearchEngine::new(Mark::O);
        let (score, cell) = engine.best_move(&board)?;

        assert_eq!(cell, (1, 2));
        assert_eq!(score, WIN_SCORE);
        assert_eq!(Prediction::from_score(score), Prediction::Win { moves: 1 });
        Ok(())
    }

    #[test]
    fn predicts_unavoidable_loss() -> Result<()> {
        // X holds two open lines through (0, 2) and (2, 0)
        let board: Board = "X../.O./..X".parse()?;
        let mut engine = SearchEngine::new(Mark::O);
        // a corner reply loses, the first edge holds the draw
        let (score, cell) = engine.best_move(&board)?;
        assert_eq!((score, cell), (0, (0, 1)));

        let board: Board = "X.X/.O./X.O".parse()?;
        let (score, _) = engine.best_move(&board)?;
        assert_eq!(score, -WIN_SCORE + 1);
        assert_eq!(Prediction::from_score(score), Prediction::Loss { moves: 1 });
        Ok(())
    }

    #[test]
    fn rejects_full_board() -> Result<()> {
        let mut board: Board = "XXO/OOX/XOX".parse()?;
        let before = board;
        let mut engine = SearchEngine::new(Mark::O);

        assert!(matches!(
            engine.choose_automated_move(&mut board),
            Err(Error::IllegalState(_))
        ));
        assert_eq!(board, before);
        Ok(())
    }

    #[test]
    fn rejects_shared_marks() {
        assert!(matches!(
            SearchEngine::with_marks(Mark::X, Mark::X),
            Err(Error::IllegalState(_))
        ));
        assert!(SearchEngine::with_marks(Mark::X, Mark::O).is_ok());
    }

    #[test]
    fn fills_exactly_one_empty_cell() -> Result<()> {
        let mut board: Board = "X../.O./..X".parse()?;
        let before = board;
        let mut engine = SearchEngine::new(Mark::O);
        let (row, col) = engine.choose_automated_move(&mut board)?;

        assert_eq!(before.get(row, col), Cell::Empty);
        assert_eq!(board.get(row, col), Cell::Marked(Mark::O));
        for r in 0..SIZE {
            for c in 0..SIZE {
                if (r, c) != (row, col) {
                    assert_eq!(board.get(r, c), before.get(r, c));
                }
            }
        }
        Ok(())
    }

    #[test]
    fn transposition_table_does_not_change_results() {
        let mut cached = SearchEngine::new(Mark::O);
        let mut uncached = SearchEngine::new(Mark::O).uncached();

        let mut searched = 0;
        for key in 0..crate::NUM_POSITIONS as u16 {
            let board = Board::from_key(key);
            let (x, o) = (board.count(Mark::X), board.count(Mark::O));
            if board.has_winner() || board.is_full() || !(x == o || x == o + 1) {
                continue;
            }
            // keep the reference search quick
            if board.empty_count() > 6 {
                continue;
            }
            assert_eq!(
                cached.best_move(&board).ok(),
                uncached.best_move(&board).ok(),
                "\n{}",
                board
            );
            searched += 1;
        }
        assert!(searched > 0);
        assert!(cached.node_count < uncached.node_count);
    }

    #[test]
    fn prediction_distances() {
        assert_eq!(Prediction::from_score(0), Prediction::Draw);
        assert_eq!(
            Prediction::from_score(WIN_SCORE - 4),
            Prediction::Win { moves: 3 }
        );
        assert_eq!(
            Prediction::from_score(-WIN_SCORE + 3),
            Prediction::Loss { moves: 2 }
        );
    }
}

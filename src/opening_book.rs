//! Precomputed best moves for every position the automated player can face

use rayon::prelude::*;

use std::sync::Arc;

use crate::board::{Board, Mark};
use crate::error::{Error, Result};
use crate::solver::{SearchEngine, MAX_SCORE, MIN_SCORE};
use crate::{CELLS, NUM_POSITIONS, SIZE};

/// Every unfinished position in which `automated` is to move, whichever side opened
pub fn book_positions(automated: Mark) -> Vec<Board> {
    (0..NUM_POSITIONS as u16)
        .map(Board::from_key)
        .filter(|board| {
            let own = board.count(automated);
            let opponent = board.count(automated.opponent());
            (opponent == own || opponent == own + 1) && !board.has_winner() && !board.is_full()
        })
        .collect()
}

/// A book entry: position code, cell index (`row * 3 + col`) and score
pub type BookEntry = (u16, u8, i8);

#[derive(Clone)]
pub struct OpeningBook(Arc<OpeningBookStorage>);

impl OpeningBook {
    /// Solves every book position in parallel, calling `on_solved` after each one
    pub fn build<F>(engine: &SearchEngine, on_solved: F) -> Result<Self>
    where
        F: Fn() + Sync,
    {
        let automated = engine.automated_mark();
        let mut entries = book_positions(automated)
            .par_iter()
            .map_init(
                || engine.clone(),
                |engine, board| {
                    let (score, (row, col)) = engine.best_move(board)?;
                    on_solved();
                    Ok::<_, Error>((board.key(), (row * SIZE + col) as u8, score as i8))
                },
            )
            .collect::<Result<Vec<_>>>()?;
        entries.sort_unstable_by_key(|entry| entry.0);

        Self::from_entries(automated, entries)
    }

    /// Checks and stores entries given in strictly ascending key order
    ///
    /// Every stored move must land on an empty cell of its position and every
    /// score must be one the engine can produce.
    pub fn from_entries<I>(automated: Mark, entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = BookEntry>,
    {
        let mut storage = OpeningBookStorage {
            automated,
            positions: Vec::new(),
            moves: Vec::new(),
            scores: Vec::new(),
        };
        for (key, cell, score) in entries {
            if key as usize >= NUM_POSITIONS || cell as usize >= CELLS {
                return Err(Error::IllegalState("book entry is off the board"));
            }
            if !Board::from_key(key)
                .get(cell as usize / SIZE, cell as usize % SIZE)
                .is_empty()
            {
                return Err(Error::IllegalState("book move lands on a taken cell"));
            }
            if !(MIN_SCORE..=MAX_SCORE).contains(&(score as i32)) {
                return Err(Error::IllegalState("book score is out of range"));
            }
            if let Some(&last) = storage.positions.last() {
                if key <= last {
                    return Err(Error::IllegalState("book entries are out of order"));
                }
            }
            storage.positions.push(key);
            storage.moves.push(cell);
            storage.scores.push(score);
        }
        Ok(Self(Arc::new(storage)))
    }
}

#[derive(Clone)]
pub struct OpeningBookStorage {
    automated: Mark,
    positions: Vec<u16>,
    moves: Vec<u8>,
    scores: Vec<i8>,
}

impl OpeningBookStorage {
    pub fn automated_mark(&self) -> Mark {
        self.automated
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Entries in ascending key order
    pub fn entries(&self) -> impl Iterator<Item = BookEntry> + '_ {
        (0..self.positions.len()).map(move |i| (self.positions[i], self.moves[i], self.scores[i]))
    }

    /// The stored score and `(row, col)` move for a position code
    pub fn get(&self, position_code: u16) -> Option<(i32, (usize, usize))> {
        let i = self.positions.binary_search(&position_code).ok()?;
        let cell = self.moves[i] as usize;
        Some((self.scores[i] as i32, (cell / SIZE, cell % SIZE)))
    }
}

impl std::ops::Deref for OpeningBook {
    type Target = OpeningBookStorage;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

use crate::NUM_POSITIONS;

// one slot per position for each side to move
const TABLE_SIZE: usize = NUM_POSITIONS * 2;

/// Memoised minimax scores, indexed directly by position code and side to move
///
/// A stored value of 0 marks an empty slot, so scores are kept offset by a constant
/// that makes every valid score strictly positive.
#[derive(Clone)]
pub struct TranspositionTable {
    entries: Vec<u8>,
}

impl TranspositionTable {
    pub fn new() -> Self {
        Self {
            entries: vec![0; TABLE_SIZE],
        }
    }

    fn index(key: u16, maximizing: bool) -> usize {
        key as usize * 2 + maximizing as usize
    }

    pub fn set(&mut self, key: u16, maximizing: bool, value: u8) {
        self.entries[Self::index(key, maximizing)] = value;
    }

    pub fn get(&self, key: u16, maximizing: bool) -> u8 {
        self.entries[Self::index(key, maximizing)]
    }
}

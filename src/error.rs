//! Errors reported by the board and the search engine

use std::fmt;

use thiserror::Error;

/// Why a placement was rejected
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum InvalidMoveReason {
    OutOfRange,
    Occupied,
}

impl fmt::Display for InvalidMoveReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidMoveReason::OutOfRange => write!(f, "cell is off the board"),
            InvalidMoveReason::Occupied => write!(f, "cell is already taken"),
        }
    }
}

#[derive(Error, Copy, Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// A placement on an occupied or out-of-range cell. The board is left untouched
    /// and the caller may retry with another cell.
    #[error("invalid move at row {row}, column {col}: {reason}")]
    InvalidMove {
        row: usize,
        col: usize,
        reason: InvalidMoveReason,
    },

    /// The engine was asked to do something that can never succeed, such as
    /// searching a full board
    #[error("illegal state: {0}")]
    IllegalState(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;

//! A perfect agent for playing the board game 'Tic-Tac-Toe'
//!
//! This agent searches the complete game tree with minimax to find the
//! optimal move for the automated player in any position.
//!
//! # Basic Usage
//!
//! ```
//! use tictactoe_ai::{board::{Board, Mark}, solver::SearchEngine};
//!
//!# use std::error::Error;
//!# fn main() -> Result<(), Box<dyn Error>> {
//! let mut board: Board = "XX./.O./...".parse()?;
//! let mut engine = SearchEngine::new(Mark::O);
//! let cell = engine.choose_automated_move(&mut board)?;
//!
//! assert_eq!(cell, (0, 2));
//!# Ok(())
//!# }
//! ```

use static_assertions::*;
pub use anyhow;

pub mod error;

pub mod board;

mod transposition_table;

pub mod opening_book;

pub mod solver;


/// The number of rows and columns of the game board
pub const SIZE: usize = 3;

/// The number of cells on the game board
pub const CELLS: usize = SIZE * SIZE;

/// The number of distinct base-3 position codes (`3^CELLS`)
pub const NUM_POSITIONS: usize = 3usize.pow(CELLS as u32);

// every position code must fit in the u16 keys used by the table and the book
const_assert!(NUM_POSITIONS <= u16::MAX as usize + 1);

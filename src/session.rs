use anyhow::Result;
use crossterm::{
    style::{style, Attribute, Color, PrintStyledContent},
    QueueableCommand,
};
use tracing::debug;

use std::io::{stdout, Write};

use tictactoe_ai::board::{Board, Mark};
use tictactoe_ai::error::Error;
use tictactoe_ai::solver::{Prediction, SearchEngine};

pub const HUMAN_MARK: Mark = Mark::X;
pub const AUTOMATED_MARK: Mark = Mark::O;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum GameState {
    InProgress,
    HumanWin,
    AutomatedWin,
    Draw,
}

/// One game: the board, the engine playing against the human, and the outcome so far
pub struct Session {
    board: Board,
    engine: SearchEngine,
    pub state: GameState,
}

impl Session {
    pub fn new(engine: SearchEngine) -> Self {
        Self::with_board(Board::new(), engine)
    }

    pub fn with_board(board: Board, engine: SearchEngine) -> Self {
        let mut session = Self {
            board,
            engine,
            state: GameState::InProgress,
        };
        session.update_state();
        session
    }

    #[allow(unused)]
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Plays the human's mark at a 0-indexed cell
    pub fn play_human(&mut self, row: usize, col: usize) -> Result<GameState, Error> {
        self.check_in_progress()?;
        self.board.place(row, col, self.engine.human_mark())?;
        Ok(self.update_state())
    }

    /// Lets the engine choose and play its move
    pub fn play_automated(&mut self) -> Result<(usize, usize), Error> {
        self.check_in_progress()?;
        let cell = self.engine.choose_automated_move(&mut self.board)?;
        self.update_state();
        Ok(cell)
    }

    /// What the engine expects from the current position if it moves next
    pub fn predict(&mut self) -> Result<Prediction, Error> {
        let (score, _) = self.engine.best_move(&self.board)?;
        Ok(Prediction::from_score(score))
    }

    fn check_in_progress(&self) -> Result<(), Error> {
        match self.state {
            GameState::InProgress => Ok(()),
            _ => Err(Error::IllegalState("the game is already over")),
        }
    }

    fn update_state(&mut self) -> GameState {
        self.state = match self.board.winning_mark() {
            Some(mark) if mark == self.engine.human_mark() => GameState::HumanWin,
            Some(_) => GameState::AutomatedWin,
            None if self.board.is_full() => GameState::Draw,
            None => GameState::InProgress,
        };
        if self.state != GameState::InProgress {
            debug!(state = ?self.state, "game finished");
        }
        self.state
    }

    fn mark_colour(&self, mark: Mark) -> Color {
        if mark == self.engine.human_mark() {
            Color::Red
        } else {
            Color::Yellow
        }
    }

    /// Prints the board's grid with the marks coloured by player
    pub fn display(&self) -> Result<()> {
        let mut stdout = stdout();
        for c in self.board.to_string().chars() {
            let content = match Mark::from_char(c) {
                Some(mark) => style(c)
                    .attribute(Attribute::Bold)
                    .with(self.mark_colour(mark)),
                None => style(c),
            };
            stdout.queue(PrintStyledContent(content))?;
        }
        stdout.flush()?;
        Ok(())
    }
}

/// Parses "row col" with 1-indexed coordinates into a 0-indexed cell
///
/// Coordinates past the board are passed through so that the board reports them.
pub fn parse_move(input: &str) -> Option<(usize, usize)> {
    let mut numbers = input.split_whitespace().map(|n| n.parse::<usize>());
    let row = numbers.next()?.ok()?;
    let col = numbers.next()?.ok()?;
    if numbers.next().is_some() {
        return None;
    }
    Some((row.checked_sub(1)?, col.checked_sub(1)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tictactoe_ai::error::InvalidMoveReason;

    fn engine() -> SearchEngine {
        SearchEngine::new(AUTOMATED_MARK)
    }

    #[test]
    fn parses_one_indexed_moves() {
        assert_eq!(parse_move("1 1\n"), Some((0, 0)));
        assert_eq!(parse_move("  3   2 "), Some((2, 1)));
        assert_eq!(parse_move("4 1"), Some((3, 0)));
        assert_eq!(parse_move("0 1"), None);
        assert_eq!(parse_move("1"), None);
        assert_eq!(parse_move("1 2 3"), None);
        assert_eq!(parse_move("a b"), None);
    }

    #[test]
    fn human_line_ends_game() -> anyhow::Result<()> {
        let mut session = Session::with_board("XX./OO./...".parse()?, engine());
        assert_eq!(session.play_human(0, 2)?, GameState::HumanWin);
        assert!(matches!(
            session.play_automated(),
            Err(Error::IllegalState(_))
        ));
        Ok(())
    }

    #[test]
    fn last_cell_without_line_draws() -> anyhow::Result<()> {
        let mut session = Session::with_board("XOX/XOO/OX.".parse()?, engine());
        assert_eq!(session.play_human(2, 2)?, GameState::Draw);
        Ok(())
    }

    #[test]
    fn rejected_move_keeps_turn() -> anyhow::Result<()> {
        let mut session = Session::new(engine());
        session.play_human(1, 1)?;
        let before = *session.board();

        assert_eq!(
            session.play_human(1, 1),
            Err(Error::InvalidMove {
                row: 1,
                col: 1,
                reason: InvalidMoveReason::Occupied
            })
        );
        assert_eq!(*session.board(), before);
        assert_eq!(session.state, GameState::InProgress);
        Ok(())
    }

    #[test]
    fn naive_human_never_wins() -> anyhow::Result<()> {
        let mut session = Session::new(engine());
        while session.state == GameState::InProgress {
            let (row, col) = session
                .board()
                .empty_cells()
                .next()
                .ok_or_else(|| anyhow::anyhow!("no empty cell in a running game"))?;
            session.play_human(row, col)?;
            if session.state == GameState::InProgress {
                assert!(!matches!(session.predict()?, Prediction::Loss { .. }));
                session.play_automated()?;
            }
        }
        assert_ne!(session.state, GameState::HumanWin);
        Ok(())
    }

    #[test]
    fn marks_are_coloured_by_player() {
        let session = Session::new(engine());
        assert_eq!(session.mark_colour(HUMAN_MARK), Color::Red);
        assert_eq!(session.mark_colour(AUTOMATED_MARK), Color::Yellow);
    }
}

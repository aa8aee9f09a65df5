use anyhow::Result;
use clap::Parser;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use std::io::{stdin, stdout, Write};
use std::path::PathBuf;

use tictactoe_ai::solver::*;

mod book_file;
use book_file::BOOK_PATH;

mod session;
use session::*;

/// Play Tic-Tac-Toe against a computer that never loses
#[derive(Parser, Debug)]
#[command(name = "tictactoe", version)]
struct Cli {
    /// Let the computer place the first mark
    #[arg(long)]
    computer_first: bool,

    /// Opening book to load, or to write with --generate-book
    #[arg(long, value_name = "PATH", default_value = BOOK_PATH)]
    book: PathBuf,

    /// Solve every position, write the opening book and exit
    #[arg(long)]
    generate_book: bool,

    /// Don't print the computer's prediction before its moves
    #[arg(long)]
    quiet: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut engine = SearchEngine::with_marks(AUTOMATED_MARK, HUMAN_MARK)?;

    if cli.generate_book {
        book_file::generate(&cli.book, &engine)?;
        return Ok(());
    }

    // the book only saves time, play on without it
    match book_file::load(&cli.book) {
        Ok(book) => {
            debug!(entries = book.len(), "loaded opening book");
            engine = engine.with_opening_book(book);
        }
        Err(err) => match err.root_cause().downcast_ref::<std::io::Error>() {
            Some(io_error) if io_error.kind() == std::io::ErrorKind::NotFound => {
                debug!("no opening book at {}", cli.book.display())
            }
            _ => warn!("Error reading opening book: {}", err.root_cause()),
        },
    }

    let mut session = Session::new(engine);
    let stdin = stdin();
    let mut human_turn = !cli.computer_first;

    println!("Welcome to Tic Tac Toe!");
    println!(
        "You are playing as {} and the computer is playing as {}.",
        HUMAN_MARK.to_char(),
        AUTOMATED_MARK.to_char()
    );

    // game loop
    loop {
        match session.state {
            GameState::InProgress => {
                if human_turn {
                    session.display()?;
                    print!("Enter row and column with a space between them (1-3): ");
                    stdout().flush()?;

                    let mut buffer = String::new();
                    if stdin.read_line(&mut buffer)? == 0 {
                        println!();
                        return Ok(());
                    }
                    let played = parse_move(&buffer)
                        .map(|(row, col)| session.play_human(row, col))
                        .transpose();
                    match played {
                        Ok(Some(_)) => {}
                        Ok(None) => {
                            println!("Invalid move. Try again.");
                            continue;
                        }
                        Err(err) => {
                            debug!(%err, "move rejected");
                            println!("Invalid move. Try again.");
                            continue;
                        }
                    }
                } else {
                    if !cli.quiet {
                        let plural = |moves: usize| if moves == 1 { "move" } else { "moves" };
                        match session.predict()? {
                            Prediction::Win { moves } => println!(
                                "The computer can force a win in at most {} {}.",
                                moves,
                                plural(moves)
                            ),
                            Prediction::Loss { moves } => println!(
                                "You can force a win in at most {} {}.",
                                moves,
                                plural(moves)
                            ),
                            Prediction::Draw => println!("The computer can at best force a draw."),
                        }
                    }
                    let (row, col) = session.play_automated()?;
                    println!("The computer plays {} {}", row + 1, col + 1);
                }
                human_turn = !human_turn;
            }

            // end states
            GameState::HumanWin => {
                session.display()?;
                println!("You win!");
                break;
            }
            GameState::AutomatedWin => {
                session.display()?;
                println!("You lose!");
                break;
            }
            GameState::Draw => {
                session.display()?;
                println!("It's a tie!");
                break;
            }
        }
    }
    Ok(())
}

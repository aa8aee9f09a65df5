//! Reading and writing opening books on disk
//!
//! File layout, all big-endian: automated mark (u8 `b'X'` or `b'O'`), entry count
//! (u32), then `(key u16, cell u8, score i8)` entries in ascending key order.

use anyhow::{anyhow, Context, Result};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use indicatif::*;

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::time::Instant;

use tictactoe_ai::board::Mark;
use tictactoe_ai::opening_book::{book_positions, OpeningBook};
use tictactoe_ai::solver::SearchEngine;
use tictactoe_ai::NUM_POSITIONS;

pub const BOOK_PATH: &str = "opening_book.bin";

/// Builds a book with a progress bar on the terminal and writes it to `path`
pub fn generate<P: AsRef<Path>>(path: P, engine: &SearchEngine) -> Result<OpeningBook> {
    let start = Instant::now();
    let path = path.as_ref();

    let progress = ProgressBar::new(book_positions(engine.automated_mark()).len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("Solving positions: {bar:40.cyan/blue} {pos}/{len} ~{eta} remaining")
            .progress_chars("█▓▒░  "),
    );
    let book = OpeningBook::build(engine, || progress.inc(1))?;
    progress.finish();

    print!("Calculations complete, writing out to {} ... ", path.display());
    let mut file = BufWriter::new(
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .with_context(|| format!("failed to create {}", path.display()))?,
    );
    write_to(&book, &mut file)?;
    file.flush()?;
    println!("Complete");

    println!(
        "Opening book of {} positions generated in {}",
        book.len(),
        HumanDuration(start.elapsed())
    );
    Ok(book)
}

pub fn load<P: AsRef<Path>>(path: P) -> Result<OpeningBook> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    read_from(BufReader::new(file)).with_context(|| format!("failed to read {}", path.display()))
}

pub fn read_from<R: Read>(mut reader: R) -> Result<OpeningBook> {
    let mark_byte = reader.read_u8()?;
    let automated = Mark::from_char(mark_byte as char)
        .ok_or_else(|| anyhow!("invalid automated mark {:#04x} in book header", mark_byte))?;
    let len = reader.read_u32::<BigEndian>()? as usize;
    if len > NUM_POSITIONS {
        return Err(anyhow!(
            "book claims {} entries, at most {} exist",
            len,
            NUM_POSITIONS
        ));
    }

    let mut entries = Vec::with_capacity(len);
    for _ in 0..len {
        let key = reader.read_u16::<BigEndian>()?;
        let cell = reader.read_u8()?;
        let score = reader.read_i8()?;
        entries.push((key, cell, score));
    }
    Ok(OpeningBook::from_entries(automated, entries)?)
}

pub fn write_to<W: Write>(book: &OpeningBook, mut writer: W) -> Result<()> {
    writer.write_u8(book.automated_mark().to_char() as u8)?;
    writer.write_u32::<BigEndian>(book.len() as u32)?;
    for (key, cell, score) in book.entries() {
        writer.write_u16::<BigEndian>(key)?;
        writer.write_u8(cell)?;
        writer.write_i8(score)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tictactoe_ai::board::Board;

    #[test]
    fn survives_serialisation() -> Result<()> {
        let engine = SearchEngine::new(Mark::X);
        let book = OpeningBook::build(&engine, || {})?;

        let mut bytes = Vec::new();
        write_to(&book, &mut bytes)?;
        assert_eq!(bytes.len(), 5 + 4 * book.len());
        assert_eq!(bytes[0], b'X');

        let read = read_from(&bytes[..])?;
        assert_eq!(read.automated_mark(), Mark::X);
        assert_eq!(read.len(), book.len());
        for board in book_positions(Mark::X) {
            assert_eq!(read.get(board.key()), book.get(board.key()));
        }
        Ok(())
    }

    #[test]
    fn rejects_corrupt_books() {
        // unknown mark
        assert!(read_from(&[b'Z', 0, 0, 0, 0][..]).is_err());
        // truncated entry
        assert!(read_from(&[b'O', 0, 0, 0, 1, 0, 0][..]).is_err());
        // cell out of range
        assert!(read_from(&[b'O', 0, 0, 0, 1, 0, 0, 9, 0][..]).is_err());
        // keys out of order
        assert!(read_from(&[b'O', 0, 0, 0, 2, 0, 5, 8, 0, 0, 4, 8, 0][..]).is_err());

        let empty = read_from(&[b'O', 0, 0, 0, 0][..]);
        assert!(empty.map(|book| book.is_empty()).unwrap_or(false));
    }

    #[test]
    fn rejects_moves_the_engine_could_not_play() -> Result<()> {
        // key 1 is a lone X in the corner, the entry claims that corner
        assert!(read_from(&[b'O', 0, 0, 0, 1, 0, 1, 0, 0][..]).is_err());
        // centre reply with a score past any win
        assert!(read_from(&[b'O', 0, 0, 0, 1, 0, 1, 4, 100][..]).is_err());

        let book = read_from(&[b'O', 0, 0, 0, 1, 0, 1, 4, 0][..])?;
        let mut engine = SearchEngine::new(Mark::O).with_opening_book(book);
        let mut board: Board = "X../.../...".parse()?;
        assert_eq!(engine.choose_automated_move(&mut board)?, (1, 1));
        Ok(())
    }
}

use std::fmt::Write as _;

use minisweeper_core::{GameSession, HighScoreTable, Tile};

fn tile_char(tile: Tile) -> char {
    match tile {
        Tile::Closed => '.',
        Tile::Flag => 'F',
        Tile::Open(0) => ' ',
        Tile::Open(count) => char::from_digit(count.into(), 10).unwrap_or('?'),
        Tile::Exploded => 'X',
        Tile::Mine => '*',
        Tile::IncorrectFlag => '!',
    }
}

/// Board with 1-based row and column labels plus the timer and flag counter.
pub fn board(session: &GameSession) -> String {
    let (rows, cols) = session.config().size;
    let mut s = String::new();

    let _ = writeln!(
        s,
        "Time: {}s    Mines: {}",
        session.elapsed_seconds(),
        session.flags_left()
    );
    s.push_str("    ");
    for col in 0..cols {
        let _ = write!(s, "{:>3}", u16::from(col) + 1);
    }
    s.push('\n');
    s.push_str("    ");
    s.push_str(&"-".repeat(usize::from(cols) * 3));
    s.push('\n');

    for row in 0..rows {
        let _ = write!(s, "{:>3}|", u16::from(row) + 1);
        for col in 0..cols {
            let _ = write!(s, "{:>3}", tile_char(session.tile_at((row, col))));
        }
        s.push('\n');
    }
    s
}

pub fn high_scores(table: &HighScoreTable) -> String {
    let mut s = String::from("High Scores:\n");
    for (key, best) in table.standard_entries() {
        match best {
            Some(seconds) => {
                let _ = writeln!(s, "{key}: {seconds} seconds");
            }
            None => {
                let _ = writeln!(s, "{key}: None");
            }
        }
    }
    for (key, seconds) in table.iter() {
        if !key.is_standard() {
            let _ = writeln!(s, "{key}: {seconds} seconds");
        }
    }
    s
}

use minisweeper_core::{Coord, Coord2, GameConfig};
use thiserror::Error;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Reveal(Coord2),
    Flag(Coord2),
    Save,
    Load,
    New(Option<GameConfig>),
    Restart,
    Scores,
    Help,
    Quit,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command {0:?}")]
    UnknownCommand(String),
    #[error("unknown preset {0:?}")]
    UnknownPreset(String),
    #[error("missing {0}")]
    Missing(Axis),
    #[error("{axis} must be a number, got {word:?}")]
    NotANumber { axis: Axis, word: String },
    #[error("{axis} {value} is out of range")]
    OutOfRange { axis: Axis, value: u16 },
    #[error("too many arguments")]
    TooManyArguments,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Axis {
    Row,
    Column,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Row => "row",
            Self::Column => "column",
        })
    }
}

impl Command {
    /// Parses one input line. Coordinates are typed 1-based as `row col`.
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Err(CommandError::Empty);
        };

        let command = match verb {
            "r" | "reveal" => Self::Reveal(parse_coords(&mut words)?),
            "f" | "flag" => Self::Flag(parse_coords(&mut words)?),
            "s" | "save" => Self::Save,
            "l" | "load" => Self::Load,
            "n" | "new" => Self::New(match words.next() {
                None => None,
                Some("small") => Some(GameConfig::small()),
                Some("large") => Some(GameConfig::large()),
                Some(other) => return Err(CommandError::UnknownPreset(other.to_owned())),
            }),
            "restart" => Self::Restart,
            "hs" | "scores" => Self::Scores,
            "h" | "help" | "?" => Self::Help,
            "q" | "quit" | "exit" => Self::Quit,
            other => return Err(CommandError::UnknownCommand(other.to_owned())),
        };

        if words.next().is_some() {
            return Err(CommandError::TooManyArguments);
        }
        Ok(command)
    }
}

fn parse_coords<'a>(words: &mut impl Iterator<Item = &'a str>) -> Result<Coord2, CommandError> {
    let row = parse_axis(words.next(), Axis::Row)?;
    let col = parse_axis(words.next(), Axis::Column)?;
    Ok((row, col))
}

fn parse_axis(word: Option<&str>, axis: Axis) -> Result<Coord, CommandError> {
    let word = word.ok_or(CommandError::Missing(axis))?;
    let value: u16 = word.parse().map_err(|_| CommandError::NotANumber {
        axis,
        word: word.to_owned(),
    })?;
    value
        .checked_sub(1)
        .and_then(|value| Coord::try_from(value).ok())
        .ok_or(CommandError::OutOfRange { axis, value })
}

pub const HELP: &str = "\
Commands:
  r ROW COL     reveal a cell (1-based)
  f ROW COL     toggle a flag
  s             save the game
  l             load the saved game
  n [small|large]  start a new game
  restart       new game with the same board size
  hs            show high scores
  h             show this help
  q             quit";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_moves_as_zero_based() {
        assert_eq!(Command::parse("r 1 1"), Ok(Command::Reveal((0, 0))));
        assert_eq!(Command::parse("flag 10 3"), Ok(Command::Flag((9, 2))));
        assert_eq!(Command::parse("  r   256 1 "), Ok(Command::Reveal((255, 0))));
    }

    #[test]
    fn parses_menu_commands() {
        assert_eq!(Command::parse("s"), Ok(Command::Save));
        assert_eq!(Command::parse("load"), Ok(Command::Load));
        assert_eq!(Command::parse("n"), Ok(Command::New(None)));
        assert_eq!(
            Command::parse("n large"),
            Ok(Command::New(Some(GameConfig::large())))
        );
        assert_eq!(Command::parse("restart"), Ok(Command::Restart));
        assert_eq!(Command::parse("hs"), Ok(Command::Scores));
        assert_eq!(Command::parse("q"), Ok(Command::Quit));
    }

    #[test]
    fn rejects_bad_input() {
        use CommandError::*;

        assert_eq!(Command::parse(""), Err(Empty));
        assert_eq!(
            Command::parse("r 0 1"),
            Err(OutOfRange { axis: Axis::Row, value: 0 })
        );
        assert_eq!(Command::parse("r 1"), Err(Missing(Axis::Column)));
        assert_eq!(
            Command::parse("r 1 x"),
            Err(NotANumber { axis: Axis::Column, word: "x".into() })
        );
        assert_eq!(
            Command::parse("r 257 1"),
            Err(OutOfRange { axis: Axis::Row, value: 257 })
        );
        assert_eq!(Command::parse("s now"), Err(TooManyArguments));
        assert_eq!(Command::parse("n huge"), Err(UnknownPreset("huge".into())));
        assert_eq!(Command::parse("jump"), Err(UnknownCommand("jump".into())));
    }

    #[test]
    fn errors_read_as_messages() {
        assert_eq!(
            Command::parse("f 2 zz").unwrap_err().to_string(),
            "column must be a number, got \"zz\""
        );
        assert_eq!(
            Command::parse("r 0 3").unwrap_err().to_string(),
            "row 0 is out of range"
        );
    }
}

use thiserror::Error;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Board must have at least one row and one column")]
    InvalidSize,
    #[error("Board needs at least one mine")]
    NoMines,
    #[error("Too many mines, at least one cell must stay safe")]
    TooManyMines,
    #[error("Game already ended, no new moves are accepted")]
    AlreadyEnded,
}

impl GameError {
    /// Whether this error came from rejecting a board configuration.
    pub const fn is_configuration(self) -> bool {
        matches!(self, Self::InvalidSize | Self::NoMines | Self::TooManyMines)
    }
}

pub type Result<T> = core::result::Result<T, GameError>;

/// Failures of the save file and high-score file I/O.
#[derive(Error, Debug)]
pub enum SaveError {
    #[error("Corrupt save: {0}")]
    Corrupt(String),
    #[error("Storage unavailable: {0}")]
    Io(#[from] std::io::Error),
}

impl SaveError {
    pub fn corrupt(reason: impl Into<String>) -> Self {
        Self::Corrupt(reason.into())
    }
}

impl From<serde_json::Error> for SaveError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            Self::Io(err.into())
        } else {
            Self::Corrupt(err.to_string())
        }
    }
}

/// Why a high-score file could not be read. Lines are numbered from 1.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScoreParseError {
    #[error("line {line}: bad difficulty {key:?}")]
    BadKey { line: usize, key: String },
    #[error("line {line}: bad time {value:?}")]
    BadSeconds { line: usize, value: String },
    #[error("line {line}: unexpected value")]
    UnexpectedValue { line: usize },
}

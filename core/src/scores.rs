use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::codec::write_atomic;
use crate::*;

pub const DEFAULT_HIGH_SCORE_FILE: &str = "minisweeper_high_scores.txt";

/// "No record" marker of the legacy two-line format.
const LEGACY_UNSET: u32 = i32::MAX as u32;

/// Identifies a difficulty in the high-score table, e.g. `"10x10"`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DifficultyKey(String);

impl DifficultyKey {
    pub fn from_size((rows, cols): Coord2) -> Self {
        Self(format!("{rows}x{cols}"))
    }

    pub fn parse(text: &str) -> Option<Self> {
        let (rows, cols) = text.split_once('x')?;
        let rows: Coord = rows.parse().ok()?;
        let cols: Coord = cols.parse().ok()?;
        (rows > 0 && cols > 0).then(|| Self::from_size((rows, cols)))
    }

    /// Keys of the two standard presets, in legacy file order.
    pub fn standard() -> [Self; 2] {
        [
            GameConfig::small().difficulty_key(),
            GameConfig::large().difficulty_key(),
        ]
    }

    pub fn is_standard(&self) -> bool {
        Self::standard().contains(self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DifficultyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Best completion time in whole seconds per difficulty.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HighScoreTable {
    best: BTreeMap<DifficultyKey, u32>,
}

impl HighScoreTable {
    pub fn best(&self, key: &DifficultyKey) -> Option<u32> {
        self.best.get(key).copied()
    }

    /// Stores `seconds` if it beats the current record, returning whether it did.
    pub fn record(&mut self, key: DifficultyKey, seconds: u32) -> bool {
        match self.best.get(&key) {
            Some(&best) if best <= seconds => false,
            _ => {
                self.best.insert(key, seconds);
                true
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&DifficultyKey, u32)> {
        self.best.iter().map(|(key, &seconds)| (key, seconds))
    }

    /// Standard difficulties with their records, `None` where there is none.
    pub fn standard_entries(&self) -> [(DifficultyKey, Option<u32>); 2] {
        DifficultyKey::standard().map(|key| {
            let best = self.best(&key);
            (key, best)
        })
    }

    pub fn is_empty(&self) -> bool {
        self.best.is_empty()
    }

    /// Parses `"<key> <seconds>"` lines, also accepting the legacy layout of
    /// bare integers for the standard difficulties.
    pub fn parse(text: &str) -> core::result::Result<Self, ScoreParseError> {
        let mut table = Self::default();
        let standard = DifficultyKey::standard();
        let mut legacy_index = 0;

        for (index, line) in text.lines().enumerate() {
            let line_no = index + 1;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let (key, seconds) = match line.split_once(char::is_whitespace) {
                Some((key, seconds)) => {
                    let key = DifficultyKey::parse(key).ok_or_else(|| ScoreParseError::BadKey {
                        line: line_no,
                        key: key.to_owned(),
                    })?;
                    (key, seconds.trim())
                }
                None => {
                    let key = standard
                        .get(legacy_index)
                        .cloned()
                        .ok_or(ScoreParseError::UnexpectedValue { line: line_no })?;
                    legacy_index += 1;
                    (key, line)
                }
            };

            let seconds: u32 = seconds.parse().map_err(|_| ScoreParseError::BadSeconds {
                line: line_no,
                value: seconds.to_owned(),
            })?;
            if seconds != LEGACY_UNSET {
                table.record(key, seconds);
            }
        }

        Ok(table)
    }

    pub fn to_text(&self) -> String {
        self.iter()
            .map(|(key, seconds)| format!("{key} {seconds}\n"))
            .collect()
    }
}

/// High-score table bound to its file. Loaded once at startup, written on
/// every improvement.
#[derive(Clone, Debug)]
pub struct HighScoreStore {
    path: PathBuf,
    table: HighScoreTable,
}

impl HighScoreStore {
    /// Never fails: a missing or unreadable file yields an empty table.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let table = match fs::read_to_string(&path) {
            Ok(text) => HighScoreTable::parse(&text).unwrap_or_else(|err| {
                log::warn!("ignoring unparsable high scores in {}: {}", path.display(), err);
                HighScoreTable::default()
            }),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                log::debug!("no high scores at {}", path.display());
                HighScoreTable::default()
            }
            Err(err) => {
                log::warn!("could not read high scores from {}: {}", path.display(), err);
                HighScoreTable::default()
            }
        };
        Self { path, table }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn table(&self) -> &HighScoreTable {
        &self.table
    }

    pub fn save(&self) -> core::result::Result<(), SaveError> {
        write_atomic(&self.path, |writer| {
            writer.write_all(self.table.to_text().as_bytes())?;
            Ok(())
        })?;
        log::debug!("saved high scores to {}", self.path.display());
        Ok(())
    }

    /// Records a winning time and persists the table if it is a new best.
    pub fn record_win(
        &mut self,
        key: DifficultyKey,
        seconds: u32,
    ) -> core::result::Result<bool, SaveError> {
        if !self.table.record(key.clone(), seconds) {
            return Ok(false);
        }
        log::debug!("new best time for {}: {}s", key, seconds);
        self.save()?;
        Ok(true)
    }
}

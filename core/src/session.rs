use std::io::{Read, Write};
use std::path::Path;

use crate::*;

/// One game: the engine plus the whole-second timer.
///
/// All mutations go through `&mut self`, so reveal, flag, tick, save and load
/// are serialized by whoever owns the session.
#[derive(Clone, Debug, PartialEq)]
pub struct GameSession {
    engine: PlayEngine,
    elapsed_seconds: u32,
}

impl GameSession {
    pub fn start_new(config: GameConfig, seed: u64) -> Result<Self> {
        log::debug!(
            "new {}x{} game with {} mines (seed {})",
            config.rows(),
            config.cols(),
            config.mines,
            seed
        );
        Ok(Self::from_parts(PlayEngine::new(config, seed)?, 0))
    }

    pub fn with_layout(mine_layout: MineLayout) -> Result<Self> {
        Ok(Self::from_parts(PlayEngine::with_layout(mine_layout)?, 0))
    }

    pub(crate) fn from_parts(engine: PlayEngine, elapsed_seconds: u32) -> Self {
        Self {
            engine,
            elapsed_seconds,
        }
    }

    /// New session with the same configuration.
    pub fn restart(&self, seed: u64) -> Result<Self> {
        Self::start_new(self.config(), seed)
    }

    pub fn reveal(&mut self, coords: Coord2) -> Result<RevealOutcome> {
        let outcome = self.engine.reveal(coords)?;
        if outcome.is_game_over() {
            log::debug!(
                "game finished with {:?} after {}s",
                outcome,
                self.elapsed_seconds
            );
        }
        Ok(outcome)
    }

    pub fn toggle_flag(&mut self, coords: Coord2) -> Result<MarkOutcome> {
        self.engine.toggle_flag(coords)
    }

    /// Advances the timer by one second while the game is in progress.
    pub fn tick(&mut self) -> bool {
        if matches!(self.engine.state(), EngineState::Active) {
            self.elapsed_seconds = self.elapsed_seconds.saturating_add(1);
            true
        } else {
            false
        }
    }

    pub fn engine(&self) -> &PlayEngine {
        &self.engine
    }

    pub fn board(&self) -> &Board {
        self.engine.board()
    }

    pub fn config(&self) -> GameConfig {
        self.engine.config()
    }

    pub fn state(&self) -> EngineState {
        self.engine.state()
    }

    pub fn elapsed_seconds(&self) -> u32 {
        self.elapsed_seconds
    }

    pub fn first_click_done(&self) -> bool {
        self.engine.first_click_done()
    }

    pub fn flags_left(&self) -> CellCount {
        self.engine.flags_left()
    }

    pub fn difficulty_key(&self) -> DifficultyKey {
        self.config().difficulty_key()
    }

    pub fn tile_at(&self, coords: Coord2) -> Tile {
        self.engine.tile_at(coords)
    }

    pub fn is_revealed(&self, coords: Coord2) -> bool {
        self.board().is_revealed(coords)
    }

    pub fn is_flagged(&self, coords: Coord2) -> bool {
        self.board().is_flagged(coords)
    }

    pub fn number_at(&self, coords: Coord2) -> Option<u8> {
        self.engine.number_at(coords)
    }

    pub fn mine_at(&self, coords: Coord2) -> Option<bool> {
        self.engine.mine_at(coords)
    }

    pub fn save<W: Write>(&self, writer: W) -> core::result::Result<(), SaveError> {
        save_session(self, writer)
    }

    /// Reads a session. The caller keeps its current session on failure.
    pub fn load<R: Read>(reader: R) -> core::result::Result<Self, SaveError> {
        load_session(reader)
    }

    pub fn save_to_path(&self, path: impl AsRef<Path>) -> core::result::Result<(), SaveError> {
        save_session_to_path(self, path)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> core::result::Result<Self, SaveError> {
        load_session_from_path(path)
    }

    /// Records the elapsed time if the session was won, persisting on improvement.
    pub fn submit_score(
        &self,
        scores: &mut HighScoreStore,
    ) -> core::result::Result<bool, SaveError> {
        if !matches!(self.state(), EngineState::Won) {
            return Ok(false);
        }
        scores.record_win(self.difficulty_key(), self.elapsed_seconds)
    }
}

/// Seed derived from the wall clock, for games that were not given one.
pub fn clock_seed() -> u64 {
    use web_time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    (now.as_nanos() as u64) ^ now.as_secs().rotate_left(32)
}

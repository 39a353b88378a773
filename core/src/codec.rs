use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

pub const SAVE_FORMAT_VERSION: u32 = 1;

pub const DEFAULT_SAVE_FILE: &str = "minisweeper_save.json";

type SaveResult<T> = core::result::Result<T, SaveError>;

/// On-disk form of a [`GameSession`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct SaveRecord {
    version: u32,
    mine_count: CellCount,
    mines: Array2<bool>,
    flags: Array2<bool>,
    revealed: Array2<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    adjacency: Option<Array2<u8>>,
    elapsed_seconds: u32,
    first_click_done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    remaining_flags: Option<CellCount>,
}

impl SaveRecord {
    fn from_session(session: &GameSession) -> Self {
        let board = session.board();
        // a preset layout that was never clicked is not kept, the reload places fresh mines
        let (mines, adjacency) = if session.first_click_done() {
            (
                board.mine_layout().mine_mask().clone(),
                board.adjacency_grid().clone(),
            )
        } else {
            let shape = board.size().to_nd_index();
            (Array2::default(shape), Array2::zeros(shape))
        };
        Self {
            version: SAVE_FORMAT_VERSION,
            mine_count: board.mine_count(),
            mines,
            flags: board.cells().map(|cell| cell.is_flagged()),
            revealed: board.cells().map(|cell| cell.is_revealed()),
            adjacency: Some(adjacency),
            elapsed_seconds: session.elapsed_seconds(),
            first_click_done: session.first_click_done(),
            remaining_flags: Some(session.flags_left()),
        }
    }

    fn into_session(self) -> SaveResult<GameSession> {
        if self.version != SAVE_FORMAT_VERSION {
            return Err(SaveError::corrupt(format!(
                "unsupported save version {}",
                self.version
            )));
        }

        let size = grid_size(&self.mines)
            .ok_or_else(|| SaveError::corrupt("board dimensions out of range"))?;
        let shape = self.mines.dim();
        if self.flags.dim() != shape || self.revealed.dim() != shape {
            return Err(SaveError::corrupt("grid shapes differ"));
        }

        let config = GameConfig::new(size, self.mine_count)
            .map_err(|err| SaveError::corrupt(format!("invalid board: {err}")))?;
        let layout = MineLayout::from_mine_mask(self.mines)
            .map_err(|err| SaveError::corrupt(format!("invalid mine grid: {err}")))?;
        if !layout.is_empty() && layout.mine_count() != config.mines {
            return Err(SaveError::corrupt(format!(
                "mine grid holds {} mines, expected {}",
                layout.mine_count(),
                config.mines
            )));
        }
        if self.first_click_done && layout.is_empty() {
            return Err(SaveError::corrupt("first click done but no mines placed"));
        }
        if !self.first_click_done && !layout.is_empty() {
            return Err(SaveError::corrupt("mines placed before the first click"));
        }

        let adjacency = layout.adjacency_grid();
        match self.adjacency {
            Some(saved) if saved != adjacency => {
                return Err(SaveError::corrupt("adjacency grid does not match mines"));
            }
            Some(_) => {}
            None => log::warn!("save has no adjacency grid, recomputed from mines"),
        }

        let mut cells: Array2<EngineCell> = Array2::default(shape);
        let mut exploded = 0;
        for row in 0..size.0 {
            for col in 0..size.1 {
                let coords = (row, col);
                let index = coords.to_nd_index();
                cells[index] = match (self.revealed[index], self.flags[index], layout[coords]) {
                    (true, true, _) => {
                        return Err(SaveError::corrupt(format!(
                            "cell {coords:?} is both revealed and flagged"
                        )));
                    }
                    (true, false, true) => {
                        exploded += 1;
                        EngineCell::Exploded
                    }
                    (true, false, false) => EngineCell::Revealed(adjacency[index]),
                    (false, true, _) => EngineCell::Flagged,
                    (false, false, _) => EngineCell::Hidden,
                };
            }
        }
        if exploded > 1 {
            return Err(SaveError::corrupt("more than one mine was opened"));
        }
        if !self.first_click_done && cells.iter().any(|cell| cell.is_revealed()) {
            return Err(SaveError::corrupt("cells revealed before the first click"));
        }

        let board = Board::from_parts(config, layout, cells)
            .map_err(|err| SaveError::corrupt(format!("inconsistent board: {err}")))?;
        let flags_left = self
            .remaining_flags
            .unwrap_or_else(|| config.mines.saturating_sub(board.flagged_count()));
        let engine = PlayEngine::restore(board, self.first_click_done, flags_left, clock_seed());

        Ok(GameSession::from_parts(engine, self.elapsed_seconds))
    }
}

pub fn save_session<W: Write>(session: &GameSession, writer: W) -> SaveResult<()> {
    serde_json::to_writer(writer, &SaveRecord::from_session(session))?;
    Ok(())
}

pub fn load_session<R: Read>(reader: R) -> SaveResult<GameSession> {
    let record: SaveRecord = serde_json::from_reader(reader)?;
    record.into_session()
}

/// Temporary sibling of `path`, named by appending a suffix so it never equals `path`.
fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".partial");
    PathBuf::from(name)
}

/// Writes next to the target first and renames over it, so a failed write
/// leaves the previous file intact.
pub(crate) fn write_atomic(
    path: &Path,
    write: impl FnOnce(&mut BufWriter<File>) -> SaveResult<()>,
) -> SaveResult<()> {
    let tmp_path = temp_path_for(path);

    let result = File::create(&tmp_path)
        .map_err(SaveError::from)
        .and_then(|file| {
            let mut writer = BufWriter::new(file);
            write(&mut writer)?;
            writer.flush()?;
            Ok(())
        })
        .and_then(|()| Ok(fs::rename(&tmp_path, path)?));

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

pub fn save_session_to_path(session: &GameSession, path: impl AsRef<Path>) -> SaveResult<()> {
    let path = path.as_ref();
    match write_atomic(path, |writer| save_session(session, writer)) {
        Ok(()) => {
            log::debug!("saved game to {}", path.display());
            Ok(())
        }
        Err(err) => {
            log::error!("could not save game to {}: {}", path.display(), err);
            Err(err)
        }
    }
}

pub fn load_session_from_path(path: impl AsRef<Path>) -> SaveResult<GameSession> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let session = load_session(BufReader::new(file))?;
    log::debug!("loaded game from {}", path.display());
    Ok(session)
}

use ndarray::{Array2, Zip};

use crate::*;

/// Grid dimensions, mine positions, cached adjacency counts and per-cell
/// reveal/flag state.
///
/// The shape is fixed at construction. Mines start out empty and are placed
/// once through [`Board::set_mines`].
#[derive(Clone, Debug, PartialEq)]
pub struct Board {
    config: GameConfig,
    mine_layout: MineLayout,
    adjacency: Array2<u8>,
    cells: Array2<EngineCell>,
}

impl Board {
    pub fn new(config: GameConfig) -> Result<Self> {
        config.validate()?;
        let shape = config.size.to_nd_index();
        Ok(Self {
            config,
            mine_layout: MineLayout::empty(config.size),
            adjacency: Array2::zeros(shape),
            cells: Array2::default(shape),
        })
    }

    /// Board whose mines are already decided, typically for replaying a known layout.
    pub fn with_layout(mine_layout: MineLayout) -> Result<Self> {
        let config = GameConfig::new(mine_layout.size(), mine_layout.mine_count())?;
        let mut board = Self::new(config)?;
        board.set_mines(mine_layout)?;
        Ok(board)
    }

    /// Reassembles a board from persisted parts, checking that they agree with each other.
    pub(crate) fn from_parts(
        config: GameConfig,
        mine_layout: MineLayout,
        cells: Array2<EngineCell>,
    ) -> Result<Self> {
        config.validate()?;
        let shape = config.size.to_nd_index();
        if mine_layout.size() != config.size || cells.shape() != shape {
            return Err(GameError::InvalidSize);
        }
        if !mine_layout.is_empty() && mine_layout.mine_count() != config.mines {
            return Err(GameError::TooManyMines);
        }
        let adjacency = mine_layout.adjacency_grid();
        Ok(Self {
            config,
            mine_layout,
            adjacency,
            cells,
        })
    }

    pub fn config(&self) -> GameConfig {
        self.config
    }

    pub fn size(&self) -> Coord2 {
        self.config.size
    }

    pub fn rows(&self) -> Coord {
        self.config.rows()
    }

    pub fn cols(&self) -> Coord {
        self.config.cols()
    }

    /// Number of mines the board is configured for, placed or not.
    pub fn mine_count(&self) -> CellCount {
        self.config.mines
    }

    pub fn is_valid_cell(&self, (row, col): Coord2) -> bool {
        row < self.rows() && col < self.cols()
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        if self.is_valid_cell(coords) {
            Ok(coords)
        } else {
            Err(GameError::InvalidCoords)
        }
    }

    pub fn neighbors(&self, coords: Coord2) -> NeighborIter {
        NeighborIter::new(coords, self.size())
    }

    pub fn count_adjacent_mines(&self, coords: Coord2) -> u8 {
        self.mine_layout.adjacent_mine_count(coords)
    }

    /// Cached adjacency count, consistent with the current mine set.
    pub fn adjacency(&self, coords: Coord2) -> u8 {
        self.adjacency[coords.to_nd_index()]
    }

    pub fn adjacency_grid(&self) -> &Array2<u8> {
        &self.adjacency
    }

    pub fn mines_placed(&self) -> bool {
        !self.mine_layout.is_empty()
    }

    pub fn mine_layout(&self) -> &MineLayout {
        &self.mine_layout
    }

    pub fn has_mine(&self, coords: Coord2) -> bool {
        self.mine_layout.contains_mine(coords)
    }

    pub fn cell(&self, coords: Coord2) -> EngineCell {
        self.cells[coords.to_nd_index()]
    }

    pub fn cells(&self) -> &Array2<EngineCell> {
        &self.cells
    }

    pub fn is_revealed(&self, coords: Coord2) -> bool {
        self.cell(coords).is_revealed()
    }

    pub fn is_flagged(&self, coords: Coord2) -> bool {
        self.cell(coords).is_flagged()
    }

    pub(crate) fn set_cell(&mut self, coords: Coord2, cell: EngineCell) {
        self.cells[coords.to_nd_index()] = cell;
    }

    /// Installs the mine set and refreshes the adjacency cache.
    pub(crate) fn set_mines(&mut self, mine_layout: MineLayout) -> Result<()> {
        if mine_layout.size() != self.size() {
            return Err(GameError::InvalidSize);
        }
        if mine_layout.mine_count() != self.config.mines {
            return Err(GameError::TooManyMines);
        }
        self.adjacency = mine_layout.adjacency_grid();
        self.mine_layout = mine_layout;
        Ok(())
    }

    pub fn flagged_count(&self) -> CellCount {
        self.cells.iter().filter(|cell| cell.is_flagged()).count() as CellCount
    }

    /// Number of safe cells that have been opened.
    pub fn revealed_safe_count(&self) -> CellCount {
        Zip::from(&self.cells)
            .and(self.mine_layout.mine_mask())
            .fold(0, |count, cell, &is_mine| {
                if !is_mine && cell.is_revealed() {
                    count + 1
                } else {
                    count
                }
            })
    }

    /// Whether a mine cell has been opened.
    pub fn exploded_mine(&self) -> Option<Coord2> {
        self.cells
            .indexed_iter()
            .find(|(_, cell)| matches!(cell, EngineCell::Exploded))
            .map(|((row, col), _)| (row as Coord, col as Coord))
    }

    /// Every non-mine cell is revealed, regardless of flags or opened mines.
    pub fn all_safe_revealed(&self) -> bool {
        self.mines_placed() && self.revealed_safe_count() == self.config.safe_cells()
    }
}

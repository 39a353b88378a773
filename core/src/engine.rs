use serde::{Deserialize, Serialize};

use crate::*;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineState {
    /// No reveal yet, mines are not placed.
    #[default]
    Ready,
    Active,
    Won,
    Lost,
}

impl EngineState {
    pub const fn is_ready(self) -> bool {
        matches!(self, Self::Ready)
    }

    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won | Self::Lost)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PlayEngine {
    board: Board,
    state: EngineState,
    flags_left: CellCount,
    revealed_count: CellCount,
    triggered_mine: Option<Coord2>,
    seed: u64,
}

impl PlayEngine {
    /// Fresh engine; mines get placed with `seed` on the first reveal.
    pub fn new(config: GameConfig, seed: u64) -> Result<Self> {
        Ok(Self::from_board(Board::new(config)?, seed))
    }

    /// Engine over a predetermined mine layout. The first reveal skips placement.
    pub fn with_layout(mine_layout: MineLayout) -> Result<Self> {
        Ok(Self::from_board(Board::with_layout(mine_layout)?, 0))
    }

    fn from_board(board: Board, seed: u64) -> Self {
        Self {
            flags_left: board.mine_count(),
            board,
            state: EngineState::Ready,
            revealed_count: 0,
            triggered_mine: None,
            seed,
        }
    }

    /// Rebuilds the engine around a loaded board, deriving the state from its cells.
    pub(crate) fn restore(
        board: Board,
        first_click_done: bool,
        flags_left: CellCount,
        seed: u64,
    ) -> Self {
        let triggered_mine = board.exploded_mine();
        let state = if triggered_mine.is_some() {
            EngineState::Lost
        } else if board.all_safe_revealed() {
            EngineState::Won
        } else if first_click_done {
            EngineState::Active
        } else {
            EngineState::Ready
        };

        Self {
            revealed_count: board.revealed_safe_count(),
            board,
            state,
            flags_left,
            triggered_mine,
            seed,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    pub fn first_click_done(&self) -> bool {
        !self.state.is_ready()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn config(&self) -> GameConfig {
        self.board.config()
    }

    pub fn size(&self) -> Coord2 {
        self.board.size()
    }

    pub fn total_mines(&self) -> CellCount {
        self.board.mine_count()
    }

    /// Remaining-flags display counter.
    ///
    /// Starts at the mine count; placing a flag needs it to be positive and
    /// removing one always gives a unit back.
    pub fn flags_left(&self) -> CellCount {
        self.flags_left
    }

    pub fn revealed_count(&self) -> CellCount {
        self.revealed_count
    }

    pub fn cell_at(&self, coords: Coord2) -> EngineCell {
        self.board.cell(coords)
    }

    pub fn triggered_mine(&self) -> Option<Coord2> {
        self.triggered_mine
    }

    /// Mine status of a cell, disclosed only once the game has ended.
    pub fn mine_at(&self, coords: Coord2) -> Option<bool> {
        self.state
            .is_finished()
            .then(|| self.board.has_mine(coords))
    }

    /// Adjacency number shown on a revealed safe cell.
    pub fn number_at(&self, coords: Coord2) -> Option<u8> {
        match self.board.cell(coords) {
            EngineCell::Revealed(count) => Some(count),
            _ => None,
        }
    }

    pub fn tile_at(&self, coords: Coord2) -> Tile {
        let finished = self.state.is_finished();
        let has_mine = self.board.has_mine(coords);

        match self.board.cell(coords) {
            EngineCell::Revealed(count) => Tile::Open(count),
            EngineCell::Exploded => Tile::Exploded,
            EngineCell::Hidden if finished && has_mine => Tile::Mine,
            EngineCell::Hidden => Tile::Closed,
            EngineCell::Flagged if finished && !has_mine => Tile::IncorrectFlag,
            EngineCell::Flagged => Tile::Flag,
        }
    }

    /// Places the mines avoiding `safe`. Does nothing once mines exist.
    pub fn place_mines(&mut self, safe: Coord2) -> Result<()> {
        let safe = self.board.validate_coords(safe)?;
        if self.board.mines_placed() {
            log::trace!("mines already placed, ignoring placement at {:?}", safe);
            return Ok(());
        }

        let layout = RandomMinefieldGenerator::new(self.seed, safe).generate(self.board.config())?;
        self.board.set_mines(layout)
    }

    pub fn toggle_flag(&mut self, coords: Coord2) -> Result<MarkOutcome> {
        use EngineCell::*;
        use MarkOutcome::*;

        let coords = self.board.validate_coords(coords)?;
        self.check_not_finished()?;

        Ok(match self.board.cell(coords) {
            Hidden if self.flags_left > 0 => {
                self.board.set_cell(coords, Flagged);
                self.flags_left -= 1;
                Changed
            }
            Hidden => {
                log::trace!("no flags left for {:?}", coords);
                NoChange
            }
            Flagged => {
                self.board.set_cell(coords, Hidden);
                self.flags_left = self.flags_left.saturating_add(1);
                Changed
            }
            Revealed(_) | Exploded => NoChange,
        })
    }

    pub fn reveal(&mut self, coords: Coord2) -> Result<RevealOutcome> {
        let coords = self.board.validate_coords(coords)?;
        self.check_not_finished()?;

        if self.state.is_ready() {
            self.place_mines(coords)?;
            self.state = EngineState::Active;
        }

        if matches!(self.board.cell(coords), EngineCell::Hidden) {
            let outcome = self.reveal_single_cell(coords);
            log::trace!("reveal {:?}: {:?}", coords, outcome);
            Ok(outcome)
        } else {
            Ok(RevealOutcome::NoChange)
        }
    }

    fn reveal_single_cell(&mut self, coords: Coord2) -> RevealOutcome {
        if self.board.has_mine(coords) {
            self.board.set_cell(coords, EngineCell::Exploded);
            self.triggered_mine = Some(coords);
            self.end_game(false);
            return RevealOutcome::HitMine;
        }

        // neighbors of a zero cell are never mines, so the fill only opens safe cells
        let mut to_visit = vec![coords];
        while let Some(visit_coords) = to_visit.pop() {
            if self.board.cell(visit_coords) != EngineCell::Hidden {
                continue;
            }

            let adjacent_mines = self.board.adjacency(visit_coords);
            self.board
                .set_cell(visit_coords, EngineCell::Revealed(adjacent_mines));
            self.revealed_count += 1;

            if adjacent_mines == 0 {
                to_visit.extend(
                    self.board
                        .neighbors(visit_coords)
                        .filter(|&pos| self.board.cell(pos) == EngineCell::Hidden),
                );
            }
        }

        if self.revealed_count == self.board.config().safe_cells() {
            self.end_game(true);
            RevealOutcome::Won
        } else {
            RevealOutcome::Revealed
        }
    }

    fn end_game(&mut self, won: bool) {
        if self.state.is_finished() {
            return;
        }

        self.state = if won {
            EngineState::Won
        } else {
            EngineState::Lost
        };
        log::debug!("game over: {:?}", self.state);
    }

    fn check_not_finished(&self) -> Result<()> {
        if self.state.is_finished() {
            Err(GameError::AlreadyEnded)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(size: Coord2, mines: &[Coord2]) -> MineLayout {
        MineLayout::from_mine_coords(size, mines).unwrap()
    }

    #[test]
    fn first_reveal_places_mines_away_from_click() {
        for seed in 0..32 {
            let mut engine = PlayEngine::new(GameConfig::small(), seed).unwrap();
            assert!(!engine.board().mines_placed());

            let outcome = engine.reveal((5, 5)).unwrap();

            assert_ne!(outcome, RevealOutcome::HitMine);
            assert!(engine.board().mines_placed());
            assert!(!engine.board().has_mine((5, 5)));
            assert_eq!(engine.board().mine_layout().mine_count(), 10);
            assert!(engine.first_click_done());
        }
    }

    #[test]
    fn reveal_hits_mine_and_sets_triggered_cell() {
        let mut engine = PlayEngine::with_layout(layout((2, 2), &[(0, 0)])).unwrap();

        let outcome = engine.reveal((0, 0)).unwrap();

        assert_eq!(outcome, RevealOutcome::HitMine);
        assert_eq!(engine.state(), EngineState::Lost);
        assert_eq!(engine.triggered_mine(), Some((0, 0)));
        assert_eq!(engine.cell_at((0, 0)), EngineCell::Exploded);
        // no cascade from a mine
        assert_eq!(engine.revealed_count(), 0);
    }

    #[test]
    fn reveal_flood_fill_opens_zero_region() {
        let mut engine = PlayEngine::with_layout(layout((3, 3), &[(2, 2)])).unwrap();

        let outcome = engine.reveal((0, 0)).unwrap();

        assert_eq!(outcome, RevealOutcome::Won);
        assert_eq!(engine.cell_at((0, 0)), EngineCell::Revealed(0));
        assert_eq!(engine.cell_at((1, 1)), EngineCell::Revealed(1));
        assert_eq!(engine.cell_at((2, 2)), EngineCell::Hidden);
    }

    #[test]
    fn flood_fill_stops_at_numbers() {
        // column 2 is a wall of mines
        let mines = &[(0, 2), (1, 2), (2, 2), (3, 2)];
        let mut engine = PlayEngine::with_layout(layout((4, 5), mines)).unwrap();

        assert_eq!(engine.reveal((0, 0)).unwrap(), RevealOutcome::Revealed);

        for row in 0..4 {
            assert_eq!(engine.cell_at((row, 0)), EngineCell::Revealed(0));
            assert!(matches!(engine.cell_at((row, 1)), EngineCell::Revealed(n) if n > 0));
            assert_eq!(engine.cell_at((row, 3)), EngineCell::Hidden);
            assert_eq!(engine.cell_at((row, 4)), EngineCell::Hidden);
        }
        assert_eq!(engine.revealed_count(), 8);
    }

    #[test]
    fn flags_block_cascade() {
        let mut engine = PlayEngine::with_layout(layout((3, 3), &[(2, 2)])).unwrap();

        engine.toggle_flag((0, 2)).unwrap();
        let outcome = engine.reveal((0, 0)).unwrap();

        assert_eq!(outcome, RevealOutcome::Revealed);
        assert_eq!(engine.cell_at((0, 2)), EngineCell::Flagged);
        assert_eq!(engine.revealed_count(), 7);
    }

    #[test]
    fn reveal_is_idempotent() {
        let mut engine = PlayEngine::with_layout(layout((3, 3), &[(0, 0), (2, 2)])).unwrap();

        assert_eq!(engine.reveal((1, 1)).unwrap(), RevealOutcome::Revealed);
        let snapshot = engine.clone();

        assert_eq!(engine.reveal((1, 1)).unwrap(), RevealOutcome::NoChange);
        assert_eq!(engine, snapshot);
    }

    #[test]
    fn flagged_cell_ignores_reveal() {
        let mut engine = PlayEngine::with_layout(layout((2, 2), &[(0, 0)])).unwrap();

        engine.toggle_flag((0, 0)).unwrap();

        assert_eq!(engine.reveal((0, 0)).unwrap(), RevealOutcome::NoChange);
        assert_eq!(engine.state(), EngineState::Active);
    }

    #[test]
    fn first_reveal_on_flag_still_places_mines() {
        let mut engine = PlayEngine::new(GameConfig::new((4, 4), 3).unwrap(), 9).unwrap();

        engine.toggle_flag((1, 1)).unwrap();
        assert_eq!(engine.reveal((1, 1)).unwrap(), RevealOutcome::NoChange);

        assert!(engine.board().mines_placed());
        assert!(!engine.board().has_mine((1, 1)));
        assert_eq!(engine.state(), EngineState::Active);
    }

    #[test]
    fn flag_counter_is_soft() {
        let mut engine = PlayEngine::with_layout(layout((3, 3), &[(0, 0), (2, 2)])).unwrap();
        assert_eq!(engine.flags_left(), 2);

        assert_eq!(engine.toggle_flag((0, 1)).unwrap(), MarkOutcome::Changed);
        assert_eq!(engine.toggle_flag((0, 2)).unwrap(), MarkOutcome::Changed);
        assert_eq!(engine.flags_left(), 0);

        // counter exhausted, the flag is not placed
        assert_eq!(engine.toggle_flag((1, 0)).unwrap(), MarkOutcome::NoChange);
        assert_eq!(engine.cell_at((1, 0)), EngineCell::Hidden);

        assert_eq!(engine.toggle_flag((0, 1)).unwrap(), MarkOutcome::Changed);
        assert_eq!(engine.flags_left(), 1);
        assert_eq!(engine.cell_at((0, 1)), EngineCell::Hidden);
    }

    #[test]
    fn unflagging_always_returns_a_unit() {
        let board = Board::with_layout(layout((2, 2), &[(0, 0)])).unwrap();
        let mut cells = board.cells().clone();
        cells[[1, 1]] = EngineCell::Flagged;
        let board = Board::from_parts(board.config(), board.mine_layout().clone(), cells).unwrap();
        let mut engine = PlayEngine::restore(board, true, 1, 0);

        engine.toggle_flag((1, 1)).unwrap();

        assert_eq!(engine.flags_left(), 2);
    }

    #[test]
    fn revealed_cell_cannot_be_flagged() {
        let mut engine = PlayEngine::with_layout(layout((2, 2), &[(0, 0)])).unwrap();

        engine.reveal((1, 1)).unwrap();

        assert_eq!(engine.toggle_flag((1, 1)).unwrap(), MarkOutcome::NoChange);
        assert_eq!(engine.cell_at((1, 1)), EngineCell::Revealed(1));
        assert_eq!(engine.flags_left(), 1);
    }

    #[test]
    fn flagging_never_ends_the_game() {
        let mut engine = PlayEngine::with_layout(layout((2, 1), &[(0, 0)])).unwrap();

        engine.toggle_flag((0, 0)).unwrap();
        engine.toggle_flag((0, 0)).unwrap();
        engine.toggle_flag((1, 0)).unwrap();

        assert_eq!(engine.state(), EngineState::Ready);
    }

    #[test]
    fn winning_board_transitions_to_won_state() {
        let mut engine = PlayEngine::with_layout(layout((2, 1), &[(0, 0)])).unwrap();

        assert_eq!(engine.reveal((1, 0)).unwrap(), RevealOutcome::Won);
        assert_eq!(engine.state(), EngineState::Won);
        assert!(engine.is_finished());
    }

    #[test]
    fn win_ignores_flags_on_mines() {
        let mut engine = PlayEngine::with_layout(layout((1, 3), &[(0, 0)])).unwrap();

        engine.toggle_flag((0, 0)).unwrap();
        assert_eq!(engine.reveal((0, 1)).unwrap(), RevealOutcome::Revealed);
        assert_eq!(engine.reveal((0, 2)).unwrap(), RevealOutcome::Won);
    }

    #[test]
    fn finished_game_rejects_moves() {
        let mut engine = PlayEngine::with_layout(layout((2, 2), &[(0, 0)])).unwrap();
        engine.reveal((0, 0)).unwrap();

        assert_eq!(engine.reveal((1, 1)), Err(GameError::AlreadyEnded));
        assert_eq!(engine.toggle_flag((1, 1)), Err(GameError::AlreadyEnded));
    }

    #[test]
    fn out_of_bounds_is_an_error() {
        let mut engine = PlayEngine::new(GameConfig::small(), 1).unwrap();

        assert_eq!(engine.reveal((10, 0)), Err(GameError::InvalidCoords));
        assert_eq!(engine.toggle_flag((0, 10)), Err(GameError::InvalidCoords));
        assert!(!engine.board().mines_placed());
    }

    #[test]
    fn mines_are_disclosed_after_the_game() {
        let mut engine = PlayEngine::with_layout(layout((2, 2), &[(0, 0), (1, 1)])).unwrap();

        engine.toggle_flag((0, 1)).unwrap();
        assert_eq!(engine.mine_at((0, 0)), None);
        assert_eq!(engine.tile_at((0, 0)), Tile::Closed);

        engine.reveal((1, 1)).unwrap();

        assert_eq!(engine.mine_at((0, 0)), Some(true));
        assert_eq!(engine.mine_at((1, 0)), Some(false));
        assert_eq!(engine.tile_at((0, 0)), Tile::Mine);
        assert_eq!(engine.tile_at((1, 1)), Tile::Exploded);
        assert_eq!(engine.tile_at((0, 1)), Tile::IncorrectFlag);
        assert_eq!(engine.tile_at((1, 0)), Tile::Closed);
    }

    #[test]
    fn cascade_covers_max_board() {
        let max = Coord::MAX;
        let mut engine = PlayEngine::with_layout(layout((max, max), &[(max - 1, max - 1)])).unwrap();

        let outcome = engine.reveal((0, 0)).unwrap();

        assert_eq!(outcome, RevealOutcome::Won);
        assert_eq!(engine.revealed_count(), engine.config().safe_cells());
    }
}

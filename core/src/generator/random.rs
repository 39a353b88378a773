use super::*;

/// Uniformly random placement that never puts a mine on the `safe` cell.
///
/// Uses rejection sampling: a random cell is drawn and redrawn while it is
/// already a mine or the safe cell.
#[derive(Clone, Debug, PartialEq)]
pub struct RandomMinefieldGenerator {
    seed: u64,
    safe: Coord2,
}

impl RandomMinefieldGenerator {
    pub fn new(seed: u64, safe: Coord2) -> Self {
        Self { seed, safe }
    }
}

impl MinefieldGenerator for RandomMinefieldGenerator {
    fn generate(self, config: GameConfig) -> Result<MineLayout> {
        use rand::prelude::*;

        config.validate()?;
        let mut layout = MineLayout::empty(config.size);
        let safe = layout.validate_coords(self.safe)?;
        let (rows, cols) = config.size;

        let mut rng = SmallRng::seed_from_u64(self.seed);
        let mut draws: u64 = 0;
        while layout.mine_count() < config.mines {
            let coords = (rng.random_range(0..rows), rng.random_range(0..cols));
            draws += 1;
            if coords == safe {
                continue;
            }
            layout.place(coords);
        }

        log::debug!(
            "placed {} mines on {}x{} avoiding {:?} after {} draws",
            layout.mine_count(),
            rows,
            cols,
            safe,
            draws
        );
        Ok(layout)
    }
}

use std::time::Duration;

use web_time::Instant;

/// Turns wall-clock time into whole-second ticks.
///
/// Ticks are drained between commands, so the timer advances on the same
/// thread that applies moves.
#[derive(Debug)]
pub struct Ticker {
    last: Instant,
}

impl Ticker {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
        }
    }

    /// Whole seconds elapsed since the previous drain. The fractional rest is kept.
    pub fn drain(&mut self) -> u32 {
        self.drain_at(Instant::now())
    }

    fn drain_at(&mut self, now: Instant) -> u32 {
        let secs = now.saturating_duration_since(self.last).as_secs();
        self.last += Duration::from_secs(secs);
        secs.try_into().unwrap_or(u32::MAX)
    }
}

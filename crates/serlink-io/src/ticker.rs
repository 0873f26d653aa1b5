use std::time::{Duration, Instant};

use serlink_core::Session;

/// Converts wall-clock time into parser idle ticks.
///
/// The protocol core counts timeouts in abstract ticks; this adapter maps
/// them to real time at a fixed granularity. Call [`Ticker::advance`]
/// whenever convenient (typically between reads); elapsed time is
/// credited in whole ticks, and the remainder carries over.
#[derive(Debug)]
pub struct Ticker {
    granularity: Duration,
    last: Instant,
}

impl Ticker {
    /// Granularities below one millisecond are clamped up to it.
    pub fn new(granularity: Duration) -> Self {
        Self {
            granularity: granularity.max(Duration::from_millis(1)),
            last: Instant::now(),
        }
    }

    /// Credit elapsed time to the session as idle ticks; returns how many.
    pub fn advance<W>(&mut self, session: &mut Session<W>) -> u32 {
        let elapsed = self.last.elapsed();
        let ticks = (elapsed.as_nanos() / self.granularity.as_nanos()).min(u128::from(u32::MAX)) as u32;
        if ticks > 0 {
            self.last += self.granularity * ticks;
            // Ticks past the timeout threshold saturate in the parser, so
            // there is no point issuing more than threshold + 1 of them.
            let effective = ticks.min(session.config().timeout_ticks.saturating_add(1));
            for _ in 0..effective {
                session.tick();
            }
        }
        ticks
    }
}

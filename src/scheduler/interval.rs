//! Randomized tick intervals.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Draws tick delays uniformly from `[min, max]`.
///
/// Re-drawn for every tick so that clients polling the same terminal drift
/// apart.
pub struct IntervalSampler {
    rng: StdRng,
}

impl Default for IntervalSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl IntervalSampler {
    pub fn new() -> Self {
        IntervalSampler {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Reproducible sequence for tests.
    pub fn seeded(seed: u64) -> Self {
        IntervalSampler {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn sample(&mut self, min: Duration, max: Duration) -> Duration {
        if min >= max {
            return min;
        }
        let min_ms = u64::try_from(min.as_millis()).unwrap_or(u64::MAX);
        let max_ms = u64::try_from(max.as_millis()).unwrap_or(u64::MAX);
        Duration::from_millis(self.rng.random_range(min_ms..=max_ms))
    }
}

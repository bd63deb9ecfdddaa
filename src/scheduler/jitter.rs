// src/scheduler/jitter.rs
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

pub const DEFAULT_MAX_JITTER: Duration = Duration::from_millis(500);

/// Random pre-run delay in `[0, max)`. Each runner owns its own generator.
#[derive(Debug)]
pub struct Jitter {
    rng: StdRng,
    max_ms: u64,
}

impl Jitter {
    pub fn new(max: Duration) -> Self {
        Self {
            rng: StdRng::from_entropy(),
            max_ms: u64::try_from(max.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn with_seed(max: Duration, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            max_ms: u64::try_from(max.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub fn next_delay(&mut self) -> Duration {
        if self.max_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(self.rng.gen_range(0..self.max_ms))
    }
}

impl Default for Jitter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_JITTER)
    }
}

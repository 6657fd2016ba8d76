//! Seedable random source shared by every subsystem
//!
//! All probabilistic branches (yields, loot, quality rolls, spawn angles,
//! event rolls) draw from one `SimRng` owned by the simulation world, so a
//! seed replays the exact same run.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

#[derive(Debug, Clone)]
pub struct SimRng {
    inner: ChaCha8Rng,
    seed: u64,
}

impl SimRng {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Restart the sequence from the original seed
    pub fn reseed(&mut self) {
        self.inner = ChaCha8Rng::seed_from_u64(self.seed);
    }

    /// Uniform draw in [0, 1)
    pub fn unit(&mut self) -> f32 {
        self.inner.gen::<f32>()
    }

    /// Uniform integer in [min, max]. Reversed bounds are swapped.
    pub fn range_inclusive(&mut self, min: u32, max: u32) -> u32 {
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        self.inner.gen_range(lo..=hi)
    }

    /// Uniform float in [min, max)
    pub fn range_f32(&mut self, min: f32, max: f32) -> f32 {
        if max > min {
            self.inner.gen_range(min..max)
        } else {
            min
        }
    }

    /// Uniform angle in [0, 2π)
    pub fn angle(&mut self) -> f32 {
        self.range_f32(0.0, std::f32::consts::TAU)
    }

    /// Uniform pick from a slice
    pub fn pick<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        if items.is_empty() {
            None
        } else {
            Some(&items[self.inner.gen_range(0..items.len())])
        }
    }
}

impl Default for SimRng {
    fn default() -> Self {
        Self::from_seed(0)
    }
}

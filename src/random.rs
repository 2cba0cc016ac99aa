//! Uniform integer draws for the motion model.
//!
//! The firmware seeds a `SmallRng` from the SoftDevice TRNG; tests seed it
//! from a constant so scenarios replay exactly.

use rand::Rng;

/// Source of uniform integer draws.
pub trait RandomSource {
    /// Uniform integer in `[lo, hi)`. An empty range yields `lo`.
    fn random(&mut self, lo: i32, hi: i32) -> i32;
}

impl<R: rand::RngCore> RandomSource for R {
    fn random(&mut self, lo: i32, hi: i32) -> i32 {
        if hi <= lo {
            return lo;
        }
        self.gen_range(lo..hi)
    }
}

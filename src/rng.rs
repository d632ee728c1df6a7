//! Deterministic random number generation.
//!
//! A run owns exactly one seeded stream. Every stochastic decision in the
//! annual cycle pulls from it in a fixed order, so a map, a population and a
//! seed reproduce the same run bit for bit.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub type SimRng = ChaCha8Rng;

pub fn seeded(seed: u64) -> SimRng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Helpers for the draws the simulation makes.
pub trait RngExt {
    /// One uniform value in `[0, 1)`.
    fn draw(&mut self) -> f64;

    /// One draw, `true` when it falls below `probability`.
    fn chance(&mut self, probability: f64) -> bool;
}

impl<R: Rng + ?Sized> RngExt for R {
    fn draw(&mut self) -> f64 {
        self.gen::<f64>()
    }

    fn chance(&mut self, probability: f64) -> bool {
        self.draw() < probability
    }
}

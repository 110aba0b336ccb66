//! Randomness sources for terrain generation
//!
//! The generator only needs uniform floats in `[0, 1)`. Anything implementing
//! `rand::RngCore` works out of the box; `SequenceSource` replays a fixed list
//! so exact outputs can be asserted.

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// A stream of uniform floats in `[0, 1)`.
pub trait UniformSource {
    fn next_unit(&mut self) -> f32;
}

impl<R: RngCore> UniformSource for R {
    fn next_unit(&mut self) -> f32 {
        self.gen::<f32>()
    }
}

/// Replays a fixed list of values, wrapping around at the end.
#[derive(Clone, Debug)]
pub struct SequenceSource {
    values: Vec<f32>,
    cursor: usize,
}

impl SequenceSource {
    /// Values are clamped into `[0, 1)`. An empty list yields 0.5 forever,
    /// which maps to a zero offset.
    pub fn new(values: impl Into<Vec<f32>>) -> Self {
        let values: Vec<f32> = values.into();
        let values = values
            .into_iter()
            .map(|v| v.clamp(0.0, 1.0 - f32::EPSILON))
            .collect();
        Self { values, cursor: 0 }
    }

    /// Number of values drawn so far.
    pub fn draws(&self) -> usize {
        self.cursor
    }
}

impl UniformSource for SequenceSource {
    fn next_unit(&mut self) -> f32 {
        let value = if self.values.is_empty() {
            0.5
        } else {
            self.values[self.cursor % self.values.len()]
        };
        self.cursor += 1;
        value
    }
}

/// Seeded generator used by the binaries and convenience helpers.
pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// Use the given seed or draw a fresh one from system entropy.
pub fn resolve_seed(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(rand::random)
}

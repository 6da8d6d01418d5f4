//! Injectable uniform random source for wave expansion admission draws

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;

/// Source of uniform draws in `[0, 1)`
pub trait RandomSource {
    /// Next uniform draw in `[0, 1)`
    fn next_unit(&mut self) -> f64;
}

/// `StdRng`-backed source, seeded or drawn from the OS
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: StdRng,
}

impl SeededRandom {
    /// Reproducible source for a given seed
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Non-reproducible source seeded from operating system entropy
    pub fn from_os_rng() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_unit(&mut self) -> f64 {
        self.rng.random::<f64>()
    }
}

/// Replays a fixed draw sequence, then repeats a fallback value
///
/// `ScriptedRandom::constant(0.0)` admits every candidate with a non-zero
/// chance; `ScriptedRandom::constant(0.999_999)` rejects everything below 1.
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    draws: VecDeque<f64>,
    fallback: f64,
    consumed: usize,
}

impl ScriptedRandom {
    pub fn new(draws: impl IntoIterator<Item = f64>, fallback: f64) -> Self {
        Self {
            draws: draws.into_iter().collect(),
            fallback,
            consumed: 0,
        }
    }

    pub fn constant(value: f64) -> Self {
        Self {
            draws: VecDeque::new(),
            fallback: value,
            consumed: 0,
        }
    }

    /// Number of draws taken so far
    pub fn consumed(&self) -> usize {
        self.consumed
    }
}

impl RandomSource for ScriptedRandom {
    fn next_unit(&mut self) -> f64 {
        self.consumed += 1;
        self.draws.pop_front().unwrap_or(self.fallback)
    }
}

impl<R: RandomSource + ?Sized> RandomSource for Box<R> {
    fn next_unit(&mut self) -> f64 {
        (**self).next_unit()
    }
}

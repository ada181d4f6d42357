//! Injectable randomness.
//!
//! Every stochastic call in the crate takes a `&mut dyn UnitRng` instead of
//! reaching for a global generator, so tests can script exact draws.

use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A source of floats uniformly distributed in `[0, 1)`.
pub trait UnitRng: Send {
    fn next_unit(&mut self) -> f64;
}

impl<F> UnitRng for F
where
    F: FnMut() -> f64 + Send,
{
    fn next_unit(&mut self) -> f64 {
        self()
    }
}

/// Platform default: draws from the thread-local generator on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl UnitRng for ThreadRandom {
    fn next_unit(&mut self) -> f64 {
        rand::rng().random::<f64>()
    }
}

/// Reproducible generator for replays and simulations.
#[derive(Debug, Clone)]
pub struct SeededRandom {
    inner: StdRng,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            inner: StdRng::seed_from_u64(seed),
        }
    }
}

impl UnitRng for SeededRandom {
    fn next_unit(&mut self) -> f64 {
        self.inner.random::<f64>()
    }
}

/// Replays a fixed sequence of draws; once exhausted it keeps returning the
/// last value (or `0.0` for an empty script).
#[derive(Debug, Clone, Default)]
pub struct ScriptedRandom {
    values: VecDeque<f64>,
    last: f64,
    draws: usize,
}

impl ScriptedRandom {
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        Self {
            values: values.into_iter().collect(),
            last: 0.0,
            draws: 0,
        }
    }

    /// Number of values handed out so far.
    pub fn draws(&self) -> usize {
        self.draws
    }
}

impl UnitRng for ScriptedRandom {
    fn next_unit(&mut self) -> f64 {
        self.draws += 1;
        if let Some(value) = self.values.pop_front() {
            self.last = value;
        }
        self.last
    }
}

/// Index into a collection of `len` elements from one draw.
pub(crate) fn pick_index(rng: &mut dyn UnitRng, len: usize) -> usize {
    debug_assert!(len > 0);
    let idx = (rng.next_unit() * len as f64).floor();
    if idx.is_finite() && idx >= 0.0 {
        (idx as usize).min(len - 1)
    } else {
        0
    }
}

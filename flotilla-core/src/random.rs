use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::Range;

/// Source of the random draws used by the simulation.
///
/// Everything random in a run (initial headings, heading perturbation,
/// independent-axis offsets) is drawn through this trait so a run can be made
/// reproducible or fully deterministic.
pub trait RandomSource: Send {
    /// Draws a value from the half-open `range`.
    fn sample(&mut self, range: Range<f64>) -> f64;
}

impl<S: RandomSource + ?Sized> RandomSource for Box<S> {
    fn sample(&mut self, range: Range<f64>) -> f64 {
        (**self).sample(range)
    }
}

/// Uniform draws backed by any `rand` generator.
#[derive(Debug, Clone)]
pub struct RngSource<R> {
    rng: R,
}

impl<R: Rng + Send> RngSource<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RngSource<StdRng> {
    /// Non-reproducible generator seeded from the OS.
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng + Send> RandomSource for RngSource<R> {
    fn sample(&mut self, range: Range<f64>) -> f64 {
        if range.start >= range.end {
            return range.start;
        }
        self.rng.gen_range(range)
    }
}

/// Returns the same value for every draw, whatever the range.
///
/// `FixedSource(0.0)` means "no perturbation, heading zero, no axis offset".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedSource(pub f64);

impl RandomSource for FixedSource {
    fn sample(&mut self, _range: Range<f64>) -> f64 {
        self.0
    }
}

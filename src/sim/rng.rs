//! Injected randomness
//!
//! Every random decision in the simulation goes through [`RandomSource`], so
//! tests can seed it (or script it) while production uses the thread RNG.

use rand::Rng;

/// A source of uniform floats in `[0, 1)`
pub trait RandomSource {
    fn next_f32(&mut self) -> f32;
}

impl<R: Rng + ?Sized> RandomSource for R {
    fn next_f32(&mut self) -> f32 {
        self.random::<f32>()
    }
}

/// Uniform float in `[lo, hi)`
pub fn range_f32(rng: &mut impl RandomSource, lo: f32, hi: f32) -> f32 {
    lo + rng.next_f32() * (hi - lo)
}

/// Uniform integer in `lo..=hi`
pub fn range_inclusive(rng: &mut impl RandomSource, lo: usize, hi: usize) -> usize {
    if hi <= lo {
        return lo;
    }
    let span = hi - lo + 1;
    // next_f32 may round up to 1.0 for some generators
    let offset = ((rng.next_f32() * span as f32) as usize).min(span - 1);
    lo + offset
}

/// Fisher-Yates shuffle driven by a [`RandomSource`]
pub fn shuffle<T>(items: &mut [T], rng: &mut impl RandomSource) {
    for i in (1..items.len()).rev() {
        let j = range_inclusive(rng, 0, i);
        items.swap(i, j);
    }
}

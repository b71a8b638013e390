// src/rng.rs
//! Random Number Generation for Parallel Point Sampling
//!
//! # Design Philosophy
//!
//! Every coordinate of a sampled point is drawn by its own worker, and every
//! worker owns a private random stream:
//! 1. **Reproducibility**: same base seed → same points, whatever the thread count
//! 2. **Independence**: no engine is ever shared between workers
//! 3. **Cheap construction**: a stream is created per (draw, worker) pair, so
//!    seeding must cost a handful of arithmetic operations
//!
//! # Counter-Based RNG
//!
//! Uses a splitmix64 counter generator:
//! - Each stream gets a scrambled 64-bit base derived from `(seed, draw, worker)`
//! - Deterministic mapping: (base, counter) → random value
//!
//! The generator implements [`rand::RngCore`], so `rand` and `rand_distr`
//! distributions can be sampled from it directly.

use rand::{Error, RngCore};

const GOLDEN_GAMMA: u64 = 0x9e37_79b9_7f4a_7c15;

/// splitmix64 finaliser
#[inline]
fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58476d1ce4e5b9u64);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d049bb133111ebu64);
    z ^ (z >> 31)
}

/// Counter-based RNG for reproducible parallel sampling
///
/// # Algorithm
///
/// ```text
/// counter += 1
/// z = base_seed + counter * γ
/// output = splitmix64(z)
/// ```
#[derive(Debug, Clone)]
pub struct CounterRng {
    base_seed: u64,
    counter: u64,
}

impl CounterRng {
    pub fn new(base_seed: u64, counter: u64) -> Self {
        Self { base_seed, counter }
    }

    #[inline]
    fn step(&mut self) -> u64 {
        self.counter = self.counter.wrapping_add(1);
        mix64(self.base_seed.wrapping_add(self.counter.wrapping_mul(GOLDEN_GAMMA)))
    }

    /// Uniform draw in `[0, 1)` with 53 bits of precision
    pub fn uniform(&mut self) -> f64 {
        (self.step() >> 11) as f64 * (1.0 / 9007199254740992.0) // 2^53
    }

    /// Uniform draw in `[low, high]`; a zero-width range returns `low`
    pub fn uniform_in(&mut self, low: f64, high: f64) -> f64 {
        (low + (high - low) * self.uniform()).min(high)
    }
}

impl RngCore for CounterRng {
    fn next_u32(&mut self) -> u32 {
        (self.step() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.step()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.step().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

/// RNG factory for reproducible parallel sampling
///
/// Hands out one independent stream per `(draw, worker)` pair.
#[derive(Debug, Clone, Copy)]
pub struct RngFactory {
    base_seed: u64,
}

impl RngFactory {
    pub fn new(base_seed: u64) -> Self {
        Self { base_seed }
    }

    pub fn base_seed(&self) -> u64 {
        self.base_seed
    }

    /// Stream owned by `worker` while generating point number `draw`
    pub fn worker_rng(&self, draw: u64, worker: u64) -> CounterRng {
        let key = mix64(self.base_seed ^ mix64(draw.wrapping_mul(GOLDEN_GAMMA)));
        CounterRng::new(mix64(key ^ worker.wrapping_add(1).wrapping_mul(GOLDEN_GAMMA)), 0)
    }
}

/// Fresh base seed from the operating system's entropy source
pub fn entropy_seed() -> u64 {
    rand::random::<u64>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;
    use rand_distr::{Distribution, StandardNormal};

    #[test]
    fn test_worker_rng_reproducibility() {
        let factory = RngFactory::new(42);

        let mut rng1 = factory.worker_rng(7, 0);
        let mut rng2 = factory.worker_rng(7, 0);

        for _ in 0..100 {
            assert_eq!(rng1.next_u64(), rng2.next_u64());
        }
    }

    #[test]
    fn test_worker_rng_independent_streams() {
        let factory = RngFactory::new(42);

        let mut by_worker = factory.worker_rng(0, 1);
        let mut by_draw = factory.worker_rng(1, 0);
        let mut reference = factory.worker_rng(0, 0);

        let vals_ref: Vec<u64> = (0..10).map(|_| reference.next_u64()).collect();
        let vals_worker: Vec<u64> = (0..10).map(|_| by_worker.next_u64()).collect();
        let vals_draw: Vec<u64> = (0..10).map(|_| by_draw.next_u64()).collect();

        assert_ne!(vals_ref, vals_worker);
        assert_ne!(vals_ref, vals_draw);
        assert_ne!(vals_worker, vals_draw);
    }

    #[test]
    fn test_uniform_range() {
        let mut rng = RngFactory::new(3).worker_rng(0, 0);
        for _ in 0..10_000 {
            let u = rng.uniform_in(-2.0, 5.0);
            assert!((-2.0..=5.0).contains(&u));
        }
        assert_eq!(rng.uniform_in(1.5, 1.5), 1.5);
    }

    #[test]
    fn test_normal_distribution() {
        let mut rng = RngFactory::new(42).worker_rng(0, 0);

        let samples: Vec<f64> = (0..10000).map(|_| StandardNormal.sample(&mut rng)).collect();

        let mean = samples.iter().sum::<f64>() / samples.len() as f64;
        let variance =
            samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / samples.len() as f64;

        assert!(mean.abs() < 0.05, "Mean should be close to 0, got {}", mean);
        assert!((variance - 1.0).abs() < 0.05, "Variance should be close to 1, got {}", variance);
    }

    #[test]
    fn test_rng_core_adapter() {
        let mut rng = RngFactory::new(9).worker_rng(0, 0);
        let mut bytes = [0u8; 13];
        rng.fill_bytes(&mut bytes);
        assert!(bytes.iter().any(|&b| b != 0));
        let x: f64 = rng.gen();
        assert!((0.0..1.0).contains(&x));
    }
}

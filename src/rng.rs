//! Deterministic, seedable PCG32 generator.
//!
//! Every trainer owns its own [`Pcg32`]; there is no process-wide generator.
//! The generator implements [`rand::RngCore`] so the usual `rand` helpers
//! (e.g. `SliceRandom::shuffle`) work on it directly.

use std::time::{SystemTime, UNIX_EPOCH};

use rand::{RngCore, SeedableRng};

const MULTIPLIER: u64 = 6_364_136_223_846_793_005;
const STATE_OFFSET: u64 = 0x853c_49e6_748f_ea9b;

/// PCG-XSH-RR 64/32 generator state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pcg32 {
    state: u64,
    increment: u64,
}

impl Pcg32 {
    /// Seed a generator. The same seed always produces the same stream.
    #[inline]
    pub fn new(seed: u64) -> Self {
        Self {
            state: seed.wrapping_add(STATE_OFFSET),
            increment: (seed << 1) | 1,
        }
    }

    /// Seed from a user-facing signed seed; negative values pick a wall-clock seed.
    pub fn from_signed_seed(seed: i64) -> Self {
        Self::new(resolve_seed(seed))
    }

    #[inline]
    pub fn state(&self) -> u64 {
        self.state
    }

    #[inline]
    pub fn increment(&self) -> u64 {
        self.increment
    }

    #[inline]
    fn step(&mut self) -> u32 {
        let old = self.state;
        self.state = old.wrapping_mul(MULTIPLIER).wrapping_add(self.increment);
        let xor_shifted = (((old >> 18) ^ old) >> 27) as u32;
        let rot = (old >> 59) as u32;
        xor_shifted.rotate_right(rot)
    }

    /// Uniform double in `[0, 1)` with 32 bits of resolution.
    #[inline]
    pub fn next_f64(&mut self) -> f64 {
        f64::from(self.step()) / 4_294_967_296.0
    }

    /// Uniform double in `[-limit, limit)`.
    #[inline]
    pub fn symmetric(&mut self, limit: f64) -> f64 {
        self.next_f64() * 2.0 * limit - limit
    }
}

impl RngCore for Pcg32 {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        self.step()
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        let lo = u64::from(self.step());
        let hi = u64::from(self.step());
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.step().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for Pcg32 {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u64::from_le_bytes(seed))
    }

    fn seed_from_u64(state: u64) -> Self {
        Self::new(state)
    }
}

/// Map a signed user seed onto a concrete generator seed.
///
/// Non-negative seeds are used as-is; negative seeds fall back to the current
/// Unix time in seconds.
pub fn resolve_seed(seed: i64) -> u64 {
    if seed >= 0 {
        return seed as u64;
    }
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Half-width of the Xavier/Glorot uniform range: `sqrt(6 / (fan_in + fan_out))`.
#[inline]
pub fn xavier_limit(fan_in: usize, fan_out: usize) -> f64 {
    (6.0 / (fan_in + fan_out) as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::seq::SliceRandom;

    #[test]
    fn same_seed_same_stream() {
        let mut a = Pcg32::new(42);
        let mut b = Pcg32::new(42);
        for _ in 0..16 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = Pcg32::new(1);
        let mut b = Pcg32::new(2);
        let xs: Vec<u32> = (0..8).map(|_| a.next_u32()).collect();
        let ys: Vec<u32> = (0..8).map(|_| b.next_u32()).collect();
        assert_ne!(xs, ys);
    }

    #[test]
    fn increment_is_always_odd() {
        for seed in [0_u64, 1, 7, u64::MAX] {
            assert_eq!(Pcg32::new(seed).increment() & 1, 1);
        }
    }

    #[test]
    fn next_f64_stays_in_unit_interval() {
        let mut rng = Pcg32::new(7);
        for _ in 0..10_000 {
            let x = rng.next_f64();
            assert!((0.0..1.0).contains(&x), "x={x}");
        }
    }

    #[test]
    fn symmetric_draws_respect_limit() {
        let mut rng = Pcg32::new(3);
        let limit = xavier_limit(4, 2);
        for _ in 0..1_000 {
            let w = rng.symmetric(limit);
            assert!(w >= -limit && w < limit);
        }
    }

    #[test]
    fn xavier_limit_matches_formula() {
        assert!((xavier_limit(2, 1) - 2.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let mut rng = Pcg32::new(11);
        let mut idx: Vec<usize> = (0..50).collect();
        idx.shuffle(&mut rng);
        let mut sorted = idx.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn non_negative_seed_resolves_to_itself() {
        assert_eq!(resolve_seed(0), 0);
        assert_eq!(resolve_seed(123), 123);
    }
}

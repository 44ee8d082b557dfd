//! Deterministic per-GTU RNG.
//!
//! # Determinism strategy
//!
//! Each GTU gets its own independent `SmallRng` seeded by:
//!
//!   seed = global_seed XOR (gtu_id * MIXING_CONSTANT)
//!
//! The mixing constant is the 64-bit fractional part of the golden ratio,
//! which spreads consecutive GTU ids uniformly across the seed space.  The
//! sampled parameters of a GTU therefore depend only on the run seed and its
//! own id, never on the order in which GTUs enter the network.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::GtuId;

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Per-GTU deterministic RNG, used when drawing individual parameter values.
pub struct GtuRng(SmallRng);

impl GtuRng {
    /// Seed deterministically from the run's global seed and a GTU id.
    pub fn new(global_seed: u64, gtu: GtuId) -> Self {
        let seed = global_seed ^ (gtu.0 as u64).wrapping_mul(MIXING_CONSTANT);
        GtuRng(SmallRng::seed_from_u64(seed))
    }

    /// Standard normal variate via Box-Muller, scaled to `mean` and `std_dev`.
    pub fn gen_normal(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1: f64 = self.0.r#gen::<f64>().max(f64::MIN_POSITIVE);
        let u2: f64 = self.0.r#gen();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

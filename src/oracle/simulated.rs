//! Probabilistic stand-in oracle
//!
//! Reproduces the placeholder test of the browser-era system: small primes
//! "hit" with probability 0.001, everything else with 0.00001. The answer has
//! nothing to do with the number; it exists to exercise the reporting path
//! with occasional discoveries.

use super::DivisibilityOracle;
use crate::target::TargetNumber;
use rand::Rng;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

/// Candidates treated as "small primes"
const SMALL_PRIMES: [u64; 4] = [2, 3, 5, 7];

/// Hit probability for small primes
pub const SMALL_PRIME_PROBABILITY: f64 = 0.001;

/// Hit probability for every other candidate
pub const DEFAULT_PROBABILITY: f64 = 0.000_01;

pub struct SimulatedOracle {
    rng: Xoshiro256PlusPlus,
}

impl SimulatedOracle {
    /// Oracle seeded from entropy
    pub fn new() -> Self {
        Self {
            rng: Xoshiro256PlusPlus::from_entropy(),
        }
    }

    /// Oracle with a reproducible answer sequence
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
        }
    }

    fn probability(candidate: u64) -> f64 {
        if SMALL_PRIMES.contains(&candidate) {
            SMALL_PRIME_PROBABILITY
        } else {
            DEFAULT_PROBABILITY
        }
    }
}

impl Default for SimulatedOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl DivisibilityOracle for SimulatedOracle {
    fn divides(&mut self, _number: &TargetNumber, candidate: u64) -> bool {
        self.rng.gen::<f64>() < Self::probability(candidate)
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}

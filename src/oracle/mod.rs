//! Divisibility oracles
//!
//! The oracle answers one question for the range worker: does this candidate
//! divide the number being factored? Keeping the answer behind a trait lets
//! the worker run unchanged against a real modulus test, a probabilistic
//! stand-in, or a scripted test double.
//!
//! # Oracle Types
//!
//! - **Modulus**: exact `number mod candidate == 0` (default)
//! - **Simulated**: seeded random answers with a small hit probability
//! - **Scripted**: fixed divisor set that records every query (tests)
//!
//! # Example
//!
//! ```
//! use primepulse::config::OracleKind;
//! use primepulse::oracle::create_oracle;
//! use primepulse::target::TargetNumber;
//!
//! let number = TargetNumber::parse("589")?;
//! let mut oracle = create_oracle(OracleKind::Modulus, None);
//! assert!(oracle.divides(&number, 19));
//! assert!(!oracle.divides(&number, 23));
//! # Ok::<(), primepulse::error::SweepError>(())
//! ```

pub mod modulus;
pub mod scripted;
pub mod simulated;

pub use modulus::ModulusOracle;
pub use scripted::ScriptedOracle;
pub use simulated::SimulatedOracle;

use crate::config::OracleKind;
use crate::target::TargetNumber;

/// Divisibility capability used by the range worker
///
/// Oracles are `Send` so a worker can move between runtime threads. Each
/// worker owns its own instance; `&mut self` lets stateful oracles (RNGs,
/// call logs) update without interior locking.
pub trait DivisibilityOracle: Send {
    /// Whether `candidate` divides `number`
    ///
    /// Candidates passed by the worker are always primes `>= 2`.
    fn divides(&mut self, number: &TargetNumber, candidate: u64) -> bool;

    /// Short name for logs and the configuration banner
    fn name(&self) -> &'static str;
}

/// Build the oracle selected in configuration
///
/// `seed` only affects the simulated oracle; without one it seeds from entropy.
pub fn create_oracle(kind: OracleKind, seed: Option<u64>) -> Box<dyn DivisibilityOracle> {
    match kind {
        OracleKind::Modulus => Box::new(ModulusOracle),
        OracleKind::Simulated => match seed {
            Some(seed) => Box::new(SimulatedOracle::with_seed(seed)),
            None => Box::new(SimulatedOracle::new()),
        },
    }
}

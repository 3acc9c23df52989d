//! Scripted oracle for tests
//!
//! Answers from a fixed divisor set and records every candidate it was asked
//! about. Clones share the call log, so a test can hand one clone to a worker
//! and inspect the other afterwards.
//!
//! # Example
//!
//! ```
//! use primepulse::oracle::{DivisibilityOracle, ScriptedOracle};
//! use primepulse::target::TargetNumber;
//!
//! let number = TargetNumber::parse("589")?;
//! let oracle = ScriptedOracle::new([19, 31]);
//! let mut handle = oracle.clone();
//!
//! assert!(handle.divides(&number, 19));
//! assert!(!handle.divides(&number, 23));
//! assert_eq!(oracle.calls(), vec![19, 23]);
//! # Ok::<(), primepulse::error::SweepError>(())
//! ```

use super::DivisibilityOracle;
use crate::target::TargetNumber;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Default)]
pub struct ScriptedOracle {
    divisors: Arc<HashSet<u64>>,
    calls: Arc<Mutex<Vec<u64>>>,
}

impl ScriptedOracle {
    pub fn new(divisors: impl IntoIterator<Item = u64>) -> Self {
        Self {
            divisors: Arc::new(divisors.into_iter().collect()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every candidate queried so far, in order
    pub fn calls(&self) -> Vec<u64> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl DivisibilityOracle for ScriptedOracle {
    fn divides(&mut self, _number: &TargetNumber, candidate: u64) -> bool {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(candidate);
        self.divisors.contains(&candidate)
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_log() {
        let number = TargetNumber::parse("589").unwrap();
        let oracle = ScriptedOracle::new([5]);
        let mut a = oracle.clone();
        let mut b = oracle.clone();

        assert!(a.divides(&number, 5));
        assert!(!b.divides(&number, 7));
        assert_eq!(oracle.calls(), vec![5, 7]);
        assert_eq!(oracle.call_count(), 2);
    }
}

//! Statistics
//!
//! Two views of progress live here:
//!
//! - **GlobalStatus**: the merged, coordinator-wide snapshot served to pollers
//! - **WorkerCounters**: lock-free per-worker counters, read as a `WorkerSummary`
//!
//! The coordinator produces `GlobalStatus`; the `reporter` submodule is the
//! read-only projection handed to anything that polls it.
//!
//! # Example
//!
//! ```
//! use primepulse::stats::WorkerCounters;
//!
//! let counters = WorkerCounters::new();
//! counters.candidates_tested.add(10);
//! counters.batches_run.add(1);
//!
//! let summary = counters.summary();
//! assert_eq!(summary.candidates_tested, 10);
//! assert_eq!(summary.batches_run, 1);
//! ```

pub mod reporter;

pub use reporter::StatusReporter;

use crate::coordinator::DivisorRecord;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Default denominator of the progress bar
pub const DEFAULT_PROGRESS_HORIZON: u64 = 1_000_000;

/// Merged coordinator state, body of `GET /status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalStatus {
    /// Largest upper bound ever reported complete (0 before any submission)
    pub largest_prime_tested: u64,

    /// Workers holding an unexpired lease
    pub active_workers: usize,

    /// Divisor entries reported so far, duplicates included
    pub divisors_found: u64,

    /// Most recent divisors first
    pub recent_divisors: Vec<DivisorRecord>,

    /// Outstanding unexpired range leases
    pub work_ranges_active: usize,

    /// When `largest_prime_tested` last advanced (epoch start otherwise)
    pub last_update: DateTime<Utc>,
}

impl GlobalStatus {
    /// Status of an epoch nobody has contributed to yet
    pub fn empty(at: DateTime<Utc>) -> Self {
        Self {
            largest_prime_tested: 0,
            active_workers: 0,
            divisors_found: 0,
            recent_divisors: Vec::new(),
            work_ranges_active: 0,
            last_update: at,
        }
    }
}

/// Progress bar value: `min(largest / horizon * 100, 100)`
///
/// A zero horizon reads as complete.
pub fn progress_percent(status: &GlobalStatus, horizon: u64) -> f64 {
    if horizon == 0 {
        return 100.0;
    }
    (status.largest_prime_tested as f64 / horizon as f64 * 100.0).min(100.0)
}

/// Cache-line aligned atomic counter
///
/// Pool workers bump their counters from different tasks while a reporter
/// reads them; padding to 64 bytes keeps each counter on its own line.
#[repr(align(64))]
#[derive(Debug, Default)]
pub struct AlignedCounter {
    value: AtomicU64,
}

impl AlignedCounter {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn add(&self, val: u64) {
        self.value.fetch_add(val, Ordering::Relaxed);
    }

    #[inline]
    pub fn get(&self) -> u64 {
        self.value.load(Ordering::Relaxed)
    }
}

/// Per-worker progress counters
#[derive(Debug, Default)]
pub struct WorkerCounters {
    pub candidates_tested: AlignedCounter,
    pub batches_run: AlignedCounter,
    pub ranges_completed: AlignedCounter,
    pub divisors_found: AlignedCounter,

    /// Completed ranges whose submission never reached the coordinator
    pub submissions_lost: AlignedCounter,
}

impl WorkerCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn summary(&self) -> WorkerSummary {
        WorkerSummary {
            candidates_tested: self.candidates_tested.get(),
            batches_run: self.batches_run.get(),
            ranges_completed: self.ranges_completed.get(),
            divisors_found: self.divisors_found.get(),
            submissions_lost: self.submissions_lost.get(),
        }
    }
}

/// Point-in-time copy of `WorkerCounters`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerSummary {
    pub candidates_tested: u64,
    pub batches_run: u64,
    pub ranges_completed: u64,
    pub divisors_found: u64,
    pub submissions_lost: u64,
}

impl WorkerSummary {
    /// Add another worker's totals into this one
    pub fn merge(&mut self, other: &WorkerSummary) {
        self.candidates_tested += other.candidates_tested;
        self.batches_run += other.batches_run;
        self.ranges_completed += other.ranges_completed;
        self.divisors_found += other.divisors_found;
        self.submissions_lost += other.submissions_lost;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_with(largest: u64) -> GlobalStatus {
        GlobalStatus {
            largest_prime_tested: largest,
            ..GlobalStatus::empty(Utc::now())
        }
    }

    #[test]
    fn test_progress_percent() {
        assert_eq!(progress_percent(&status_with(0), DEFAULT_PROGRESS_HORIZON), 0.0);
        assert_eq!(progress_percent(&status_with(250_000), DEFAULT_PROGRESS_HORIZON), 25.0);
        assert_eq!(progress_percent(&status_with(5_000_000), DEFAULT_PROGRESS_HORIZON), 100.0);
        assert_eq!(progress_percent(&status_with(42), 0), 100.0);
    }

    #[test]
    fn test_aligned_counter_layout() {
        assert_eq!(std::mem::align_of::<AlignedCounter>(), 64);
        assert_eq!(std::mem::size_of::<AlignedCounter>(), 64);
    }

    #[test]
    fn test_summary_merge() {
        let a = WorkerCounters::new();
        a.candidates_tested.add(100);
        a.divisors_found.add(2);
        let b = WorkerCounters::new();
        b.candidates_tested.add(50);
        b.submissions_lost.add(1);

        let mut total = a.summary();
        total.merge(&b.summary());
        assert_eq!(total.candidates_tested, 150);
        assert_eq!(total.divisors_found, 2);
        assert_eq!(total.submissions_lost, 1);
    }

    #[test]
    fn test_status_wire_format() {
        let status = status_with(1001);
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["largest_prime_tested"], 1001);
        assert_eq!(json["active_workers"], 0);
        assert_eq!(json["divisors_found"], 0);
        assert!(json["recent_divisors"].as_array().unwrap().is_empty());
        assert!(json.get("last_update").is_some());
    }
}

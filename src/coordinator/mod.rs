//! Coordinator
//!
//! Sole authority for range partitioning and for merging worker results into
//! global status. A `Coordinator` is an ordinary value (usually held in an
//! `Arc`), so several independent epochs can live in one process.
//!
//! # Concurrency
//!
//! All mutations (assign, submit, lease pruning) run under the write half of a
//! single `RwLock`. Status reads take the read half and never mutate, so any
//! number of pollers can run alongside assignments and submissions.
//!
//! # Known Gaps
//!
//! - Submissions are not deduplicated: the same divisor reported twice counts twice
//! - Leases expire for reporting purposes only; an abandoned range is never reissued
//!
//! # Example
//!
//! ```
//! use primepulse::coordinator::{Coordinator, CoordinatorSettings, Range};
//! use primepulse::distributed::protocol::{RangeReport, WorkerId};
//! use primepulse::target::TargetNumber;
//!
//! let settings = CoordinatorSettings { range_size: 1000, ..Default::default() };
//! let coordinator = Coordinator::new(TargetNumber::parse("589")?, settings);
//!
//! let w1 = WorkerId::new("w1");
//! let range = coordinator.assign(&w1)?;
//! assert_eq!(range, Range::new(2, 1001));
//!
//! coordinator.submit(RangeReport::completed(w1, range, vec![19, 31]))?;
//! let status = coordinator.status();
//! assert_eq!(status.largest_prime_tested, 1001);
//! assert_eq!(status.divisors_found, 2);
//! # Ok::<(), primepulse::error::SweepError>(())
//! ```

pub mod ledger;
pub mod range;

pub use ledger::{DivisorLedger, DivisorRecord};
pub use range::{Range, RangeAllocator, RangeLease};

use crate::config::CoordinatorConfig;
use crate::distributed::protocol::{RangeReport, WorkAssignment, WorkerId};
use crate::error::{SweepError, SweepResult};
use crate::stats::GlobalStatus;
use crate::target::TargetNumber;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Tunables of one coordination epoch
#[derive(Debug, Clone)]
pub struct CoordinatorSettings {
    /// Candidates per issued range
    pub range_size: u64,

    /// First candidate of the first range
    pub start_floor: u64,

    /// Capacity of the recent-divisor window
    pub recent_window: usize,

    /// Silence after which a lease stops counting as active
    pub worker_timeout: Duration,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            range_size: 10_000,
            start_floor: 2,
            recent_window: 5,
            worker_timeout: Duration::from_secs(300),
        }
    }
}

impl From<&CoordinatorConfig> for CoordinatorSettings {
    fn from(config: &CoordinatorConfig) -> Self {
        Self {
            range_size: config.range_size,
            start_floor: config.start_floor,
            recent_window: config.recent_window,
            worker_timeout: Duration::from_secs(config.worker_timeout_secs),
        }
    }
}

/// Result of merging one submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitOutcome {
    /// Divisor entries appended to the log
    pub accepted_divisors: usize,

    /// Global maximum after the merge
    pub largest_prime_tested: u64,

    /// Whether the submitter held an outstanding lease
    pub lease_released: bool,
}

/// Mutable epoch state, guarded by the coordinator lock
#[derive(Debug)]
struct CoordinatorState {
    allocator: RangeAllocator,
    leases: HashMap<WorkerId, RangeLease>,
    ledger: DivisorLedger,
    largest_prime_tested: u64,
    last_update: DateTime<Utc>,
}

/// Coordination epoch
#[derive(Debug)]
pub struct Coordinator {
    number: TargetNumber,
    settings: CoordinatorSettings,
    started_at: DateTime<Utc>,
    state: RwLock<CoordinatorState>,
}

impl Coordinator {
    /// Start a new epoch for `number`
    pub fn new(number: TargetNumber, settings: CoordinatorSettings) -> Self {
        let started_at = Utc::now();
        let state = CoordinatorState {
            allocator: RangeAllocator::new(settings.start_floor, settings.range_size),
            leases: HashMap::new(),
            ledger: DivisorLedger::new(settings.recent_window),
            largest_prime_tested: 0,
            last_update: started_at,
        };

        info!(
            "Coordinator epoch started: number={}, range_size={}, start_floor={}",
            number, settings.range_size, settings.start_floor
        );

        Self {
            number,
            settings,
            started_at,
            state: RwLock::new(state),
        }
    }

    pub fn number(&self) -> &TargetNumber {
        &self.number
    }

    pub fn settings(&self) -> &CoordinatorSettings {
        &self.settings
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Lease the next unassigned range to `worker_id`
    ///
    /// Fails only once the 64-bit candidate space is used up. A previous
    /// unsubmitted lease of the same worker is replaced and its range abandoned.
    pub fn assign(&self, worker_id: &WorkerId) -> SweepResult<Range> {
        let now = Instant::now();
        let mut state = self.write_state();
        self.prune_expired(&mut state, now);

        let Some(range) = state.allocator.next_range() else {
            let next_start = state.allocator.next_start();
            warn!("No candidates left to assign to worker {} (next start {})", worker_id, next_start);
            return Err(SweepError::SearchExhausted { next_start });
        };
        if let Some(previous) = state.leases.insert(worker_id.clone(), RangeLease::new(range, now)) {
            debug!(
                "Worker {} re-requested work; range {} abandoned unsubmitted",
                worker_id, previous.range
            );
        }

        debug!("Assigned range {} to worker {}", range, worker_id);
        Ok(range)
    }

    /// Lease a range and package it for the wire
    pub fn issue(&self, worker_id: &WorkerId) -> SweepResult<WorkAssignment> {
        let range = self.assign(worker_id)?;
        Ok(WorkAssignment {
            worker_id: worker_id.clone(),
            start_range: range.start,
            end_range: range.end,
            number_to_factor: self.number.as_str().to_string(),
            range_size: self.settings.range_size,
        })
    }

    /// Merge a worker's results into global state
    ///
    /// The maximum only moves up, so duplicate or out-of-order reports are
    /// harmless to it. Every reported divisor is appended, duplicates included.
    pub fn submit(&self, report: RangeReport) -> SweepResult<SubmitOutcome> {
        if report.worker_id.is_empty() {
            return Err(SweepError::MissingWorkerId);
        }

        let now = Instant::now();
        let found_at = Utc::now();
        let mut state = self.write_state();
        self.prune_expired(&mut state, now);

        let lease_released = match state.leases.remove(&report.worker_id) {
            Some(lease) => {
                if let Some(completed) = report.range_completed {
                    if completed != lease.range {
                        warn!(
                            "Worker {} reported range {} but held {}; accepting anyway",
                            report.worker_id, completed, lease.range
                        );
                    }
                }
                true
            }
            None => {
                debug!("Worker {} submitted without an outstanding range", report.worker_id);
                false
            }
        };

        if report.largest_prime_tested > state.largest_prime_tested {
            state.largest_prime_tested = report.largest_prime_tested;
            state.last_update = found_at;
        }

        for &divisor in &report.divisors {
            state.ledger.record(divisor, &report.worker_id, found_at);
        }

        if !report.divisors.is_empty() {
            info!("Divisors found by {}: {:?}", report.worker_id, report.divisors);
        }

        Ok(SubmitOutcome {
            accepted_divisors: report.divisors.len(),
            largest_prime_tested: state.largest_prime_tested,
            lease_released,
        })
    }

    /// Snapshot of the merged global state
    pub fn status(&self) -> GlobalStatus {
        self.status_at(Instant::now())
    }

    /// Snapshot as seen at `now` (expired leases are filtered, not removed)
    pub fn status_at(&self, now: Instant) -> GlobalStatus {
        let state = self.read_state();
        let timeout = self.settings.worker_timeout;
        let live = state
            .leases
            .values()
            .filter(|lease| !lease.is_expired(now, timeout))
            .count();

        GlobalStatus {
            largest_prime_tested: state.largest_prime_tested,
            active_workers: live,
            divisors_found: state.ledger.count(),
            recent_divisors: state.ledger.recent(),
            work_ranges_active: live,
            last_update: state.last_update,
        }
    }

    /// Every divisor reported in this epoch, in report order
    pub fn divisors(&self) -> Vec<DivisorRecord> {
        self.read_state().ledger.all().to_vec()
    }

    /// Range currently leased to `worker_id`, if any
    pub fn lease_of(&self, worker_id: &WorkerId) -> Option<Range> {
        self.read_state().leases.get(worker_id).map(|lease| lease.range)
    }

    /// Drop leases whose holders have gone silent
    ///
    /// Their ranges are not reissued; the allocator never moves backwards.
    fn prune_expired(&self, state: &mut CoordinatorState, now: Instant) {
        let timeout = self.settings.worker_timeout;
        state.leases.retain(|worker_id, lease| {
            let expired = lease.is_expired(now, timeout);
            if expired {
                warn!(
                    "Worker {} inactive for over {}s; range {} abandoned",
                    worker_id,
                    timeout.as_secs(),
                    lease.range
                );
            }
            !expired
        });
    }

    fn read_state(&self) -> RwLockReadGuard<'_, CoordinatorState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, CoordinatorState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

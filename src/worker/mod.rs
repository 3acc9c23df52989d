//! Range worker
//!
//! A `RangeWorker` owns one leased range at a time. It walks the range with a
//! `PrimeCursor`, asks its oracle about each prime, and hands the divisors it
//! finds back to its `WorkSource` once the cursor passes the end of the range.
//!
//! # Lifecycle
//!
//! ```text
//! Idle -> Requesting -> Active -> Submitting -> Requesting -> ...
//!                          \            \
//!                           +------------+--> Stopped (stop handle, request failure)
//! ```
//!
//! # Scheduling
//!
//! Work is cooperative. Each `tick()` tests at most `batch_size` candidates and
//! returns, so a worker never holds its runtime thread for long. `run()` drives
//! ticks from a work interval and, independently, polls global status on a
//! slower interval.
//!
//! # Failure Policy
//!
//! - A failed request stops the worker and returns the error to the caller
//! - A failed submission is logged, counted and dropped; the worker moves on
//!   to a new range and the completed range's results are lost
//!
//! # Example
//!
//! ```
//! use primepulse::coordinator::{Coordinator, CoordinatorSettings};
//! use primepulse::distributed::protocol::WorkerId;
//! use primepulse::oracle::ModulusOracle;
//! use primepulse::output::RecordingSink;
//! use primepulse::target::TargetNumber;
//! use primepulse::worker::{RangeWorker, TickOutcome, WorkerSettings};
//! use std::sync::Arc;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let settings = CoordinatorSettings { range_size: 1000, ..Default::default() };
//! let coordinator = Arc::new(Coordinator::new(TargetNumber::parse("589").unwrap(), settings));
//! let sink = RecordingSink::new();
//!
//! let mut worker = RangeWorker::new(
//!     WorkerId::new("w1"),
//!     coordinator.clone(),
//!     Box::new(ModulusOracle),
//!     Arc::new(sink.clone()),
//!     WorkerSettings::default(),
//! );
//!
//! worker.request().await.unwrap();
//! loop {
//!     if let TickOutcome::RangeCompleted { divisors, .. } = worker.tick().await.unwrap() {
//!         assert_eq!(divisors, vec![19, 31]);
//!         break;
//!     }
//! }
//! assert_eq!(coordinator.status().largest_prime_tested, 1001);
//! # });
//! ```

pub mod pool;
pub mod source;

pub use pool::{PoolStopper, WorkerPool};
pub use source::WorkSource;

use crate::coordinator::Range;
use crate::distributed::protocol::{RangeReport, WorkerId};
use crate::error::{SweepError, SweepResult};
use crate::oracle::DivisibilityOracle;
use crate::output::StatusSink;
use crate::prime::PrimeCursor;
use crate::stats::{WorkerCounters, WorkerSummary};
use crate::target::TargetNumber;
use chrono::Utc;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Worker cadence and batch bound
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    /// Candidates tested per tick
    pub batch_size: usize,

    /// Period of the work tick
    pub work_interval: Duration,

    /// Period of the status poll; `None` disables polling for this worker
    pub status_interval: Option<Duration>,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            batch_size: 10,
            work_interval: Duration::from_millis(100),
            status_interval: Some(Duration::from_secs(2)),
        }
    }
}

/// Where the worker is in its request/test/submit cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerPhase {
    Idle,
    Requesting,
    Active,
    Submitting,
    Stopped,
}

impl fmt::Display for WorkerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkerPhase::Idle => "idle",
            WorkerPhase::Requesting => "requesting",
            WorkerPhase::Active => "active",
            WorkerPhase::Submitting => "submitting",
            WorkerPhase::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// What a single `tick()` did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// A new range was leased
    Assigned(Range),

    /// One batch was tested; the range is not yet exhausted
    Tested { candidates: usize },

    /// The range was exhausted and its results handed to the source
    RangeCompleted {
        range: Range,
        divisors: Vec<u64>,
        submitted: bool,
    },

    /// The worker is stopped; nothing was done
    Stopped,
}

/// Cancellation handle shared between a worker and its owner
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a stop; in-progress work is discarded at the next tick
    pub fn stop(&self) {
        self.flag.store(true, Ordering::SeqCst);
        self.notify.notify_one();
    }

    pub fn is_stopped(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    async fn notified(&self) {
        self.notify.notified().await
    }
}

/// Range currently being walked
#[derive(Debug)]
struct ActiveRange {
    cursor: PrimeCursor,
    divisors: Vec<u64>,
}

pub struct RangeWorker {
    id: WorkerId,
    source: Arc<dyn WorkSource>,
    oracle: Box<dyn DivisibilityOracle>,
    sink: Arc<dyn StatusSink>,
    settings: WorkerSettings,
    counters: Arc<WorkerCounters>,
    stop: StopHandle,
    phase: WorkerPhase,

    /// Number of the current epoch, cached across assignments
    number: Option<TargetNumber>,

    current: Option<ActiveRange>,
}

impl RangeWorker {
    pub fn new(
        id: WorkerId,
        source: Arc<dyn WorkSource>,
        oracle: Box<dyn DivisibilityOracle>,
        sink: Arc<dyn StatusSink>,
        settings: WorkerSettings,
    ) -> Self {
        Self {
            id,
            source,
            oracle,
            sink,
            settings: WorkerSettings {
                batch_size: settings.batch_size.max(1),
                ..settings
            },
            counters: Arc::new(WorkerCounters::new()),
            stop: StopHandle::new(),
            phase: WorkerPhase::Idle,
            number: None,
            current: None,
        }
    }

    /// Replace the worker's stop handle with one owned elsewhere
    pub fn with_stop_handle(mut self, stop: StopHandle) -> Self {
        self.stop = stop;
        self
    }

    pub fn id(&self) -> &WorkerId {
        &self.id
    }

    pub fn phase(&self) -> WorkerPhase {
        self.phase
    }

    /// Handle that stops this worker from another task
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Live counters, readable while the worker runs
    pub fn counters(&self) -> Arc<WorkerCounters> {
        self.counters.clone()
    }

    /// Range being walked, if any
    pub fn current_range(&self) -> Option<Range> {
        self.current.as_ref().map(|active| active.cursor.range())
    }

    /// Ask the source for a new range
    ///
    /// On failure the worker is left `Stopped` and the error is returned. A
    /// range that arrives after a stop request is dropped.
    pub async fn request(&mut self) -> SweepResult<Option<Range>> {
        if self.stop.is_stopped() {
            self.halt();
            return Ok(None);
        }

        self.phase = WorkerPhase::Requesting;
        let assignment = match self.source.request_work(&self.id).await {
            Ok(assignment) => assignment,
            Err(e) => return Err(self.fail_request(e)),
        };

        if self.stop.is_stopped() {
            debug!(
                "Worker {} stopped while requesting; dropping range {}..={}",
                self.id, assignment.start_range, assignment.end_range
            );
            self.halt();
            return Ok(None);
        }

        let range = match assignment.range() {
            Ok(range) => range,
            Err(e) => return Err(self.fail_request(e)),
        };

        let cached = self
            .number
            .as_ref()
            .is_some_and(|n| n.as_str() == assignment.number_to_factor);
        if !cached {
            match TargetNumber::parse(&assignment.number_to_factor) {
                Ok(number) => self.number = Some(number),
                Err(e) => return Err(self.fail_request(e)),
            }
        }

        debug!("Worker {} assigned range {}", self.id, range);
        self.current = Some(ActiveRange {
            cursor: PrimeCursor::new(range),
            divisors: Vec::new(),
        });
        self.phase = WorkerPhase::Active;
        Ok(Some(range))
    }

    /// Advance the worker by one bounded step
    pub async fn tick(&mut self) -> SweepResult<TickOutcome> {
        if self.stop.is_stopped() {
            self.halt();
            return Ok(TickOutcome::Stopped);
        }

        match self.phase {
            WorkerPhase::Stopped => Ok(TickOutcome::Stopped),
            WorkerPhase::Idle | WorkerPhase::Requesting | WorkerPhase::Submitting => {
                match self.request().await? {
                    Some(range) => Ok(TickOutcome::Assigned(range)),
                    None => Ok(TickOutcome::Stopped),
                }
            }
            WorkerPhase::Active => {
                let candidates = self.process_batch();
                let exhausted = self
                    .current
                    .as_ref()
                    .map_or(true, |active| active.cursor.is_exhausted());

                if exhausted {
                    self.finish_range().await
                } else {
                    Ok(TickOutcome::Tested { candidates })
                }
            }
        }
    }

    /// Test up to `batch_size` primes of the current range
    fn process_batch(&mut self) -> usize {
        let (Some(active), Some(number)) = (self.current.as_mut(), self.number.as_ref()) else {
            return 0;
        };

        let mut tested = 0;
        while tested < self.settings.batch_size {
            let Some(candidate) = active.cursor.next() else {
                break;
            };
            tested += 1;

            if self.oracle.divides(number, candidate) {
                info!("Worker {} found divisor {}", self.id, candidate);
                active.divisors.push(candidate);
                self.counters.divisors_found.add(1);
                self.sink.render_divisor_found(candidate, Utc::now());
            }
        }

        self.counters.candidates_tested.add(tested as u64);
        self.counters.batches_run.add(1);
        tested
    }

    /// Submit the exhausted range and request the next one
    async fn finish_range(&mut self) -> SweepResult<TickOutcome> {
        let Some(active) = self.current.take() else {
            return Ok(TickOutcome::Stopped);
        };

        self.phase = WorkerPhase::Submitting;
        let range = active.cursor.range();
        let report = RangeReport::completed(self.id.clone(), range, active.divisors);
        self.counters.ranges_completed.add(1);

        let submitted = match self.source.submit_result(&report).await {
            Ok(ack) => {
                debug!(
                    "Worker {} submitted range {} ({} divisors, global max {})",
                    self.id, range, ack.accepted_divisors, ack.largest_prime_tested
                );
                true
            }
            Err(e) => {
                warn!("Worker {} lost results for range {}: {}", self.id, range, e);
                self.counters.submissions_lost.add(1);
                self.sink
                    .render_message(&format!("Results for range {} were lost: {}", range, e));
                false
            }
        };

        let outcome = TickOutcome::RangeCompleted {
            range,
            divisors: report.divisors,
            submitted,
        };

        self.request().await?;
        Ok(outcome)
    }

    /// Fetch global status and hand it to the sink
    pub async fn poll_status(&mut self) {
        match self.source.status().await {
            Ok(status) => self.sink.render_status(&status),
            Err(e) => warn!("Worker {} status poll failed: {}", self.id, e),
        }
    }

    /// Drive the worker until it is stopped or a request fails
    pub async fn run(&mut self) -> SweepResult<WorkerSummary> {
        info!("Worker {} starting", self.id);
        self.request().await?;

        let mut work = tokio::time::interval(self.settings.work_interval);
        work.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let poll_status = self.settings.status_interval.is_some();
        let mut status = tokio::time::interval(
            self.settings.status_interval.unwrap_or(Duration::from_secs(3600)),
        );
        status.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let stop = self.stop.clone();
        while self.phase != WorkerPhase::Stopped {
            tokio::select! {
                _ = stop.notified() => {
                    self.halt();
                }
                _ = work.tick() => {
                    self.tick().await?;
                }
                _ = status.tick(), if poll_status => {
                    self.poll_status().await;
                }
            }
        }

        let summary = self.counters.summary();
        info!(
            "Worker {} stopped: {} candidates, {} ranges, {} divisors",
            self.id, summary.candidates_tested, summary.ranges_completed, summary.divisors_found
        );
        Ok(summary)
    }

    /// Discard any in-progress range and stop
    fn halt(&mut self) {
        if let Some(active) = self.current.take() {
            debug!(
                "Worker {} discarding range {} at {:?} with {} unsent divisors",
                self.id,
                active.cursor.range(),
                active.cursor.position(),
                active.divisors.len()
            );
        }
        self.phase = WorkerPhase::Stopped;
    }

    fn fail_request(&mut self, e: SweepError) -> SweepError {
        error!("Worker {} could not get work: {}", self.id, e);
        self.sink
            .render_message(&format!("Worker {} could not get work: {}", self.id, e));
        self.halt();
        e
    }
}

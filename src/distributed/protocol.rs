//! Distributed mode protocol
//!
//! This module defines the messages exchanged between the coordinator and range
//! workers. Messages travel as JSON bodies over HTTP so that any client able to
//! speak JSON (browser page, script, another implementation) can join a sweep.
//!
//! # Message Flow
//!
//! ```text
//! Worker                                  Coordinator
//!   |                                          |
//!   |-- GET /get_work?worker_id=W ------------>|
//!   |<------------ WorkAssignment -------------|
//!   |                                          |
//!   |   (tests primes start..=end in batches)  |
//!   |                                          |
//!   |-- POST /submit_result (RangeReport) ---->|
//!   |<--------------- SubmitAck ---------------|
//!   |-- GET /get_work?worker_id=W ------------>|
//!   |                   ...                    |
//!   |                                          |
//!   |-- GET /status -------------------------->|   (independent cadence)
//!   |<------------- GlobalStatus --------------|
//! ```

use crate::coordinator::{DivisorRecord, Range, SubmitOutcome};
use crate::error::SweepError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque worker identifier
///
/// Generated client-side at first contact and used as the join key between
/// issued ranges and submitted results. Not authenticated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkerId(String);

impl WorkerId {
    /// Wrap an existing identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a session-unique id: `worker_<unix-millis>_<9 base-36 chars>`
    pub fn generate() -> Self {
        const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

        let mut rng = rand::thread_rng();
        let suffix: String = (0..9)
            .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
            .collect();

        Self(format!(
            "worker_{}_{}",
            chrono::Utc::now().timestamp_millis(),
            suffix
        ))
    }

    /// Fallback id for requests that arrive without one: `worker_<unix-seconds>`
    pub fn anonymous() -> Self {
        Self(format!("worker_{}", chrono::Utc::now().timestamp()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WorkerId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Work assignment (Coordinator → Worker), body of `GET /get_work`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkAssignment {
    /// Worker the range is leased to
    pub worker_id: WorkerId,

    /// First candidate of the range (inclusive)
    pub start_range: u64,

    /// Last candidate of the range (inclusive)
    pub end_range: u64,

    /// Decimal digits of the number to factor
    pub number_to_factor: String,

    /// Configured range size of the epoch
    pub range_size: u64,
}

impl WorkAssignment {
    /// Range carried by this assignment
    ///
    /// Rejects inverted ranges so a misbehaving coordinator cannot wedge a worker.
    pub fn range(&self) -> Result<Range, SweepError> {
        if self.start_range > self.end_range {
            return Err(SweepError::InvalidAssignment {
                start: self.start_range,
                end: self.end_range,
            });
        }
        Ok(Range::new(self.start_range, self.end_range))
    }
}

/// Query string of `GET /get_work`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkQuery {
    pub worker_id: Option<String>,
}

/// Range result (Worker → Coordinator), body of `POST /submit_result`
///
/// Every field has a default so that partial submissions from lenient clients
/// still merge; a missing `worker_id` is rejected by the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeReport {
    #[serde(default)]
    pub worker_id: WorkerId,

    /// Divisors found in the range, in discovery order
    #[serde(default)]
    pub divisors: Vec<u64>,

    /// Upper bound of the completed range
    #[serde(default)]
    pub largest_prime_tested: u64,

    #[serde(default)]
    pub range_completed: Option<Range>,
}

impl RangeReport {
    /// Report for a fully walked range
    pub fn completed(worker_id: WorkerId, range: Range, divisors: Vec<u64>) -> Self {
        Self {
            worker_id,
            divisors,
            largest_prime_tested: range.end,
            range_completed: Some(range),
        }
    }
}

/// Acknowledgement of `POST /submit_result`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitAck {
    pub status: String,
    pub message: String,

    /// Divisor entries appended to the global log by this submission
    pub accepted_divisors: usize,

    /// Global maximum after the merge
    pub largest_prime_tested: u64,
}

impl From<SubmitOutcome> for SubmitAck {
    fn from(outcome: SubmitOutcome) -> Self {
        Self {
            status: "success".to_string(),
            message: "Results submitted successfully".to_string(),
            accepted_divisors: outcome.accepted_divisors,
            largest_prime_tested: outcome.largest_prime_tested,
        }
    }
}

/// Body of `GET /divisors`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DivisorsResponse {
    pub divisors: Vec<DivisorRecord>,
    pub total_count: usize,
}

/// Error body for non-2xx responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
        }
    }
}

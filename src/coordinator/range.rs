//! Candidate ranges and their allocation
//!
//! The allocator hands out contiguous, inclusive ranges from a cursor that only
//! moves forward. Two ranges from the same allocator can never overlap, which is
//! what keeps workers from duplicating each other's work.

use crate::prime::LARGEST_U64_PRIME;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

/// Closed span of candidate integers `start..=end`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: u64,
    pub end: u64,
}

impl Range {
    /// Create a range; callers guarantee `start <= end`
    pub fn new(start: u64, end: u64) -> Self {
        debug_assert!(start <= end, "inverted range {}..={}", start, end);
        Self { start, end }
    }

    /// Number of candidate integers covered
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    pub fn contains(&self, value: u64) -> bool {
        self.start <= value && value <= self.end
    }

    /// Whether the two ranges share at least one integer
    pub fn overlaps(&self, other: &Range) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// Monotonic range allocator
///
/// Ranges stop at `LARGEST_U64_PRIME`; past it there is nothing left to test
/// and `next_range` returns `None` rather than repeating a range.
#[derive(Debug, Clone)]
pub struct RangeAllocator {
    /// First candidate of the next range
    next_start: u64,

    /// Candidates per range (>= 1)
    range_size: u64,
}

impl RangeAllocator {
    pub fn new(start_floor: u64, range_size: u64) -> Self {
        Self {
            next_start: start_floor,
            range_size: range_size.max(1),
        }
    }

    /// Hand out the next unassigned range, `None` once the search space is used up
    pub fn next_range(&mut self) -> Option<Range> {
        let start = self.next_start;
        if start > LARGEST_U64_PRIME {
            return None;
        }

        let end = start
            .saturating_add(self.range_size - 1)
            .min(LARGEST_U64_PRIME);
        // end <= LARGEST_U64_PRIME < u64::MAX
        self.next_start = end + 1;
        Some(Range::new(start, end))
    }

    /// First candidate of the range that would be issued next
    pub fn next_start(&self) -> u64 {
        self.next_start
    }
}

/// Outstanding range held by one worker
#[derive(Debug, Clone, Copy)]
pub struct RangeLease {
    pub range: Range,
    pub issued_at: Instant,
    pub last_seen: Instant,
}

impl RangeLease {
    pub fn new(range: Range, now: Instant) -> Self {
        Self {
            range,
            issued_at: now,
            last_seen: now,
        }
    }

    /// Whether the holder has been silent for longer than `timeout`
    pub fn is_expired(&self, now: Instant, timeout: Duration) -> bool {
        now.saturating_duration_since(self.last_seen) > timeout
    }
}

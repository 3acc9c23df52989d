//! Divisor log
//!
//! Append-only record of every divisor reported in the epoch, plus a bounded
//! most-recent-first window for status views. Eviction from the window never
//! touches the log or the count.

use crate::distributed::protocol::WorkerId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One reported divisor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DivisorRecord {
    pub divisor: u64,
    pub found_by: WorkerId,
    pub found_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct DivisorLedger {
    log: Vec<DivisorRecord>,
    recent: VecDeque<DivisorRecord>,
    window: usize,
}

impl DivisorLedger {
    pub fn new(window: usize) -> Self {
        Self {
            log: Vec::new(),
            recent: VecDeque::with_capacity(window),
            window,
        }
    }

    /// Append a divisor; duplicates are kept
    pub fn record(&mut self, divisor: u64, found_by: &WorkerId, found_at: DateTime<Utc>) {
        let record = DivisorRecord {
            divisor,
            found_by: found_by.clone(),
            found_at,
        };

        self.recent.push_front(record.clone());
        self.recent.truncate(self.window);
        self.log.push(record);
    }

    pub fn count(&self) -> u64 {
        self.log.len() as u64
    }

    /// Most recent records first, at most `window` of them
    pub fn recent(&self) -> Vec<DivisorRecord> {
        self.recent.iter().cloned().collect()
    }

    /// Full log in report order
    pub fn all(&self) -> &[DivisorRecord] {
        &self.log
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_is_capped_and_newest_first() {
        let mut ledger = DivisorLedger::new(3);
        let who = WorkerId::new("w1");
        for d in [3u64, 5, 7, 11, 13] {
            ledger.record(d, &who, Utc::now());
        }

        let recent: Vec<u64> = ledger.recent().iter().map(|r| r.divisor).collect();
        assert_eq!(recent, vec![13, 11, 7]);
        assert_eq!(ledger.count(), 5);
        assert_eq!(ledger.all().len(), 5);
        assert_eq!(ledger.all()[0].divisor, 3);
    }

    #[test]
    fn test_duplicates_are_counted() {
        let mut ledger = DivisorLedger::new(5);
        ledger.record(19, &WorkerId::new("a"), Utc::now());
        ledger.record(19, &WorkerId::new("b"), Utc::now());
        assert_eq!(ledger.count(), 2);
        assert_eq!(ledger.recent()[0].found_by, WorkerId::new("b"));
    }
}

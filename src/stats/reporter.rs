//! Read-only status projection
//!
//! Pollers (the HTTP `/status` handler, the standalone status loop) hold a
//! `StatusReporter` rather than the coordinator itself, so they have no path
//! to mutate state.

use super::{progress_percent, GlobalStatus};
use crate::coordinator::{Coordinator, DivisorRecord};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct StatusReporter {
    coordinator: Arc<Coordinator>,
    horizon: u64,
}

impl StatusReporter {
    pub fn new(coordinator: Arc<Coordinator>, horizon: u64) -> Self {
        Self { coordinator, horizon }
    }

    /// Current merged status, unchanged from the coordinator's view
    pub fn status(&self) -> GlobalStatus {
        self.coordinator.status()
    }

    /// Progress of `status` against the configured horizon
    pub fn progress(&self, status: &GlobalStatus) -> f64 {
        progress_percent(status, self.horizon)
    }

    pub fn divisors(&self) -> Vec<DivisorRecord> {
        self.coordinator.divisors()
    }

    /// Multi-line plain-text summary, body of `GET /`
    pub fn summary_text(&self) -> String {
        let status = self.status();
        let number = self.coordinator.number();

        let mut out = String::new();
        out.push_str("primepulse coordinator\n");
        out.push_str(&format!("Number:               {} ({} digits)\n", number, number.digit_count()));
        out.push_str(&format!("Range size:           {}\n", self.coordinator.settings().range_size));
        out.push_str(&format!("Largest prime tested: {}\n", status.largest_prime_tested));
        out.push_str(&format!("Progress:             {:.4}%\n", self.progress(&status)));
        out.push_str(&format!("Active workers:       {}\n", status.active_workers));
        out.push_str(&format!("Divisors found:       {}\n", status.divisors_found));
        for record in &status.recent_divisors {
            out.push_str(&format!(
                "  {} (by {} at {})\n",
                record.divisor,
                record.found_by,
                record.found_at.format("%Y-%m-%d %H:%M:%S")
            ));
        }
        out.push_str(&format!("Started:              {}\n", self.coordinator.started_at().to_rfc3339()));
        out
    }
}

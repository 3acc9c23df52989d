//! Human-readable console output

use super::StatusSink;
use crate::stats::{progress_percent, GlobalStatus};
use crate::util::time::format_count;
use chrono::{DateTime, Utc};

/// Console sink printing one line per event
#[derive(Debug, Clone)]
pub struct TextSink {
    progress_horizon: u64,
}

impl TextSink {
    pub fn new(progress_horizon: u64) -> Self {
        Self { progress_horizon }
    }

    /// Status line, e.g. `[status] tested to 1,001 (0.10%) | workers 2 | divisors 2 | recent 31, 19`
    pub fn format_status(&self, status: &GlobalStatus) -> String {
        let mut line = format!(
            "[status] tested to {} ({:.2}%) | workers {} | divisors {}",
            format_count(status.largest_prime_tested),
            progress_percent(status, self.progress_horizon),
            status.active_workers,
            format_count(status.divisors_found),
        );

        if !status.recent_divisors.is_empty() {
            let recent: Vec<String> = status
                .recent_divisors
                .iter()
                .map(|r| format_count(r.divisor))
                .collect();
            line.push_str(" | recent ");
            line.push_str(&recent.join(", "));
        }
        line
    }

    pub fn format_divisor(&self, divisor: u64, found_at: DateTime<Utc>) -> String {
        format!(
            "[divisor] {} found at {}",
            format_count(divisor),
            found_at.format("%Y-%m-%d %H:%M:%S UTC")
        )
    }
}

impl StatusSink for TextSink {
    fn render_status(&self, status: &GlobalStatus) {
        println!("{}", self.format_status(status));
    }

    fn render_divisor_found(&self, divisor: u64, found_at: DateTime<Utc>) {
        println!("{}", self.format_divisor(divisor, found_at));
    }

    fn render_message(&self, message: &str) {
        println!("[message] {}", message);
    }
}

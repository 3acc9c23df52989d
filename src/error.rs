//! Error types for PrimePulse
//!
//! Domain errors raised by the coordinator, the work sources and the range
//! workers. Application plumbing (config loading, startup) uses `anyhow`.

use thiserror::Error;

/// Primary error type for coordination operations
#[derive(Debug, Error)]
pub enum SweepError {
    // ========== Transport Errors ==========

    /// Coordinator could not be reached, or the request timed out
    #[error("Network failure talking to {endpoint}: {reason}")]
    NetworkFailure { endpoint: String, reason: String },

    /// Coordinator answered with a non-2xx status
    #[error("Coordinator rejected request to {endpoint} (HTTP {status}): {message}")]
    CoordinatorRejected {
        endpoint: String,
        status: u16,
        message: String,
    },

    // ========== Protocol Errors ==========

    /// Submission carried no worker id
    #[error("worker_id is required")]
    MissingWorkerId,

    /// Number to factor is not a positive decimal integer
    #[error("Invalid number to factor: {reason}")]
    InvalidNumber { reason: String },

    /// Assignment with start > end
    #[error("Invalid range assignment: start {start} > end {end}")]
    InvalidAssignment { start: u64, end: u64 },

    // ========== Allocation Errors ==========

    /// Every 64-bit candidate has been handed out
    #[error("Search space exhausted: no candidates left from {next_start}")]
    SearchExhausted { next_start: u64 },
}

impl SweepError {
    /// Whether the error came from the transport rather than the payload
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            SweepError::NetworkFailure { .. } | SweepError::CoordinatorRejected { .. }
        )
    }
}

/// Result alias for coordination operations
pub type SweepResult<T> = std::result::Result<T, SweepError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_classification() {
        let err = SweepError::NetworkFailure {
            endpoint: "http://127.0.0.1:5000/get_work".into(),
            reason: "connection refused".into(),
        };
        assert!(err.is_network());
        assert!(!SweepError::MissingWorkerId.is_network());
    }

    #[test]
    fn test_display_messages() {
        let err = SweepError::InvalidAssignment { start: 10, end: 3 };
        assert_eq!(err.to_string(), "Invalid range assignment: start 10 > end 3");

        let err = SweepError::CoordinatorRejected {
            endpoint: "/submit_result".into(),
            status: 400,
            message: "worker_id is required".into(),
        };
        assert!(err.to_string().contains("HTTP 400"));

        let err = SweepError::SearchExhausted { next_start: 42 };
        assert!(!err.is_network());
        assert!(err.to_string().contains("from 42"));
    }
}

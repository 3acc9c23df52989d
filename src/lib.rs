//! PrimePulse - Distributed prime-divisor search
//!
//! PrimePulse searches for prime divisors of a large decimal number by handing
//! out disjoint candidate ranges to workers and merging what they report.
//!
//! # Architecture
//!
//! - **Coordinator**: leases contiguous ranges, merges results, tracks progress
//! - **Range workers**: walk the primes of a lease in bounded batches
//! - **Oracles**: pluggable divisibility test (exact modulus or simulated)
//! - **Distributed mode**: coordinator over HTTP, workers on any host
//! - **Standalone mode**: coordinator and worker pool in one process

pub mod config;
pub mod coordinator;
pub mod distributed;
pub mod error;
pub mod oracle;
pub mod output;
pub mod prime;
pub mod stats;
pub mod target;
pub mod util;
pub mod worker;

// Re-export commonly used types
pub use config::Config;
pub use coordinator::Coordinator;
pub use error::SweepError;
pub use oracle::DivisibilityOracle;

/// Result type used throughout PrimePulse
pub type Result<T> = anyhow::Result<T>;

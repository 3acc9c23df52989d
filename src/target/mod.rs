//! Number to factor
//!
//! The single immutable target of a coordination epoch. It is held as a
//! validated decimal digit string so that numbers far beyond 64 bits can be
//! shipped to workers and reduced modulo small candidates without a
//! big-integer library.
//!
//! # Example
//!
//! ```
//! use primepulse::target::TargetNumber;
//!
//! let number = TargetNumber::parse("589")?;
//! assert_eq!(number.remainder(19), 0);
//! assert_eq!(number.remainder(7), 1);
//! # Ok::<(), primepulse::error::SweepError>(())
//! ```

use crate::error::{SweepError, SweepResult};
use anyhow::Context;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

/// Digits folded into the remainder per step (10^18 < 2^60)
const CHUNK_DIGITS: usize = 18;

/// Numbers up to this many digits are displayed in full
const DISPLAY_FULL_DIGITS: usize = 40;

/// Decimal digits kept at each end of an abbreviated display
const DISPLAY_EDGE_DIGITS: usize = 12;

/// Positive integer to factor, stored as canonical decimal digits
///
/// Cloning is cheap (shared `Arc<str>`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetNumber {
    digits: Arc<str>,
}

impl TargetNumber {
    /// Parse a decimal string
    ///
    /// Surrounding whitespace is trimmed and leading zeros are stripped. Empty
    /// input, non-digit characters and zero are rejected.
    pub fn parse(input: &str) -> SweepResult<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(SweepError::InvalidNumber {
                reason: "number is empty".into(),
            });
        }

        if let Some(pos) = trimmed.bytes().position(|b| !b.is_ascii_digit()) {
            return Err(SweepError::InvalidNumber {
                reason: format!("non-digit character at position {}", pos),
            });
        }

        let canonical = trimmed.trim_start_matches('0');
        if canonical.is_empty() {
            return Err(SweepError::InvalidNumber {
                reason: "number must be positive".into(),
            });
        }

        Ok(Self {
            digits: Arc::from(canonical),
        })
    }

    /// Load the number from a file containing only decimal digits
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read number file: {}", path.display()))?;

        Self::parse(&contents)
            .with_context(|| format!("Invalid number in file: {}", path.display()))
    }

    /// Canonical decimal digits
    pub fn as_str(&self) -> &str {
        &self.digits
    }

    /// Number of decimal digits
    pub fn digit_count(&self) -> usize {
        self.digits.len()
    }

    /// Compute `self mod modulus`
    ///
    /// Streams the digits in 18-digit chunks with 128-bit intermediates, so the
    /// cost is linear in the digit count and independent of magnitude.
    ///
    /// # Panics
    ///
    /// Panics if `modulus` is zero.
    pub fn remainder(&self, modulus: u64) -> u64 {
        assert!(modulus > 0, "remainder by zero");

        let m = modulus as u128;
        let bytes = self.digits.as_bytes();
        let head = match bytes.len() % CHUNK_DIGITS {
            0 => CHUNK_DIGITS.min(bytes.len()),
            n => n,
        };

        let mut rem: u128 = 0;
        let mut offset = 0;
        let mut chunk_len = head;
        while offset < bytes.len() {
            let chunk = &bytes[offset..offset + chunk_len];
            let value = chunk
                .iter()
                .fold(0u128, |acc, &b| acc * 10 + (b - b'0') as u128);
            rem = (rem * 10u128.pow(chunk_len as u32) + value) % m;

            offset += chunk_len;
            chunk_len = CHUNK_DIGITS;
        }

        rem as u64
    }
}

impl fmt::Display for TargetNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.digit_count();
        if n <= DISPLAY_FULL_DIGITS {
            write!(f, "{}", self.digits)
        } else {
            write!(
                f,
                "{}…{} ({} digits)",
                &self.digits[..DISPLAY_EDGE_DIGITS],
                &self.digits[n - DISPLAY_EDGE_DIGITS..],
                n
            )
        }
    }
}

impl std::str::FromStr for TargetNumber {
    type Err = SweepError;

    fn from_str(s: &str) -> SweepResult<Self> {
        Self::parse(s)
    }
}

//! Candidate prime generation
//!
//! Deterministic prime stepping used by range workers to walk their assigned
//! range. The sequence must be identical on every node so that ranges stay
//! comparable across workers and test runs.
//!
//! # Stepping Policy
//!
//! - `next_prime(n)` for `n < 2` is 2, and `next_prime(2)` is 3
//! - Even inputs advance to the next odd candidate, odd inputs advance by 2
//! - Candidates then step by 2 until trial division by odd numbers up to √n passes
//! - Nothing follows `LARGEST_U64_PRIME`; a cursor reaching it is exhausted
//!
//! # Example
//!
//! ```
//! use primepulse::coordinator::Range;
//! use primepulse::prime::{next_prime, PrimeCursor};
//!
//! assert_eq!(next_prime(13), Some(17));
//!
//! let primes: Vec<u64> = PrimeCursor::new(Range::new(2, 20)).collect();
//! assert_eq!(primes, vec![2, 3, 5, 7, 11, 13, 17, 19]);
//! ```

use crate::coordinator::Range;

/// Largest prime representable in a `u64`
pub const LARGEST_U64_PRIME: u64 = 18_446_744_073_709_551_557;

/// Trial-division primality test
///
/// Divides by 2, then by odd numbers up to √n.
pub fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n == 2 {
        return true;
    }
    if n % 2 == 0 {
        return false;
    }

    let mut i = 3u64;
    // i <= n / i avoids overflowing i * i near u64::MAX
    while i <= n / i {
        if n % i == 0 {
            return false;
        }
        i += 2;
    }
    true
}

/// Smallest prime strictly greater than `after`
///
/// `None` once `after >= LARGEST_U64_PRIME`.
pub fn next_prime(after: u64) -> Option<u64> {
    if after < 2 {
        return Some(2);
    }
    if after == 2 {
        return Some(3);
    }
    if after >= LARGEST_U64_PRIME {
        return None;
    }

    let mut candidate = if after % 2 == 0 { after + 1 } else { after + 2 };
    while !is_prime(candidate) {
        candidate = candidate.checked_add(2)?;
    }
    Some(candidate)
}

/// Iterator over the primes of an inclusive range
///
/// The cursor always holds the next prime it will yield, so exhaustion is known
/// as soon as the last prime ≤ `end` has been handed out. A prime `start` is
/// yielded (the first candidate is `next_prime(start - 1)`).
#[derive(Debug, Clone)]
pub struct PrimeCursor {
    /// Range being walked
    range: Range,

    /// Next prime to yield (past `range.end`, or `None`, once exhausted)
    next: Option<u64>,

    /// Last prime yielded
    position: Option<u64>,
}

impl PrimeCursor {
    /// Create a cursor positioned before the first prime of `range`
    pub fn new(range: Range) -> Self {
        Self {
            range,
            next: next_prime(range.start.saturating_sub(1)),
            position: None,
        }
    }

    /// Range this cursor walks
    pub fn range(&self) -> Range {
        self.range
    }

    /// Whether every prime in the range has been yielded
    pub fn is_exhausted(&self) -> bool {
        self.next.map_or(true, |prime| prime > self.range.end)
    }

    /// Last prime yielded, if any
    pub fn position(&self) -> Option<u64> {
        self.position
    }
}

impl Iterator for PrimeCursor {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        let prime = self.next.filter(|&prime| prime <= self.range.end)?;
        self.position = Some(prime);
        self.next = next_prime(prime);
        Some(prime)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn naive_is_prime(n: u64) -> bool {
        n >= 2 && (2..n).all(|d| n % d != 0)
    }

    #[test]
    fn test_next_prime_small_inputs() {
        assert_eq!(next_prime(0), Some(2));
        assert_eq!(next_prime(1), Some(2));
        assert_eq!(next_prime(2), Some(3));
        assert_eq!(next_prime(3), Some(5));
        assert_eq!(next_prime(4), Some(5));
        assert_eq!(next_prime(5), Some(7));
        assert_eq!(next_prime(24), Some(29));
        assert_eq!(next_prime(89), Some(97));
    }

    #[test]
    fn test_next_prime_has_no_gap() {
        for n in 0..3000u64 {
            let p = next_prime(n).unwrap();
            assert!(p > n, "next_prime({}) = {} is not greater", n, p);
            assert!(naive_is_prime(p), "next_prime({}) = {} is not prime", n, p);
            for between in (n + 1)..p {
                assert!(!naive_is_prime(between), "{} skipped between {} and {}", between, n, p);
            }
        }
    }

    #[test]
    fn test_is_prime_matches_naive() {
        for n in 0..2000u64 {
            assert_eq!(is_prime(n), naive_is_prime(n), "mismatch at {}", n);
        }
        assert!(is_prime(1_000_000_007));
        assert!(!is_prime(1_000_000_007 * 3));
    }

    #[test]
    fn test_cursor_includes_prime_start() {
        let primes: Vec<u64> = PrimeCursor::new(Range::new(2, 11)).collect();
        assert_eq!(primes, vec![2, 3, 5, 7, 11]);
    }

    #[test]
    fn test_cursor_mid_range() {
        let primes: Vec<u64> = PrimeCursor::new(Range::new(1002, 1050)).collect();
        assert_eq!(primes, vec![1009, 1013, 1019, 1021, 1031, 1033, 1039, 1049]);
    }

    #[test]
    fn test_cursor_range_without_primes() {
        let mut cursor = PrimeCursor::new(Range::new(24, 28));
        assert!(cursor.is_exhausted());
        assert_eq!(cursor.next(), None);
        assert_eq!(cursor.position(), None);
    }

    #[test]
    fn test_cursor_exhaustion_is_known_early() {
        let mut cursor = PrimeCursor::new(Range::new(10, 13));
        assert_eq!(cursor.next(), Some(11));
        assert!(!cursor.is_exhausted());
        assert_eq!(cursor.next(), Some(13));
        assert!(cursor.is_exhausted());
        assert_eq!(cursor.position(), Some(13));
    }

    #[test]
    fn test_cursor_reproducible() {
        let a: Vec<u64> = PrimeCursor::new(Range::new(5000, 6000)).collect();
        let b: Vec<u64> = PrimeCursor::new(Range::new(5000, 6000)).collect();
        assert_eq!(a, b);
        assert_eq!(a.len(), 114);
    }

    #[test]
    fn test_no_prime_after_ceiling() {
        assert_eq!(next_prime(LARGEST_U64_PRIME), None);
        assert_eq!(next_prime(u64::MAX - 1), None);
        assert_eq!(next_prime(u64::MAX), None);
    }

    #[test]
    fn test_cursor_past_ceiling_is_exhausted() {
        let mut cursor = PrimeCursor::new(Range::new(LARGEST_U64_PRIME + 1, u64::MAX));
        assert!(cursor.is_exhausted());
        assert_eq!(cursor.next(), None);
        assert_eq!(cursor.position(), None);
    }
}

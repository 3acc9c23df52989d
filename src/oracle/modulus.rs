//! Exact divisibility by remainder

use super::DivisibilityOracle;
use crate::target::TargetNumber;

/// Answers by computing `number mod candidate`
#[derive(Debug, Clone, Copy, Default)]
pub struct ModulusOracle;

impl DivisibilityOracle for ModulusOracle {
    fn divides(&mut self, number: &TargetNumber, candidate: u64) -> bool {
        candidate > 1 && number.remainder(candidate) == 0
    }

    fn name(&self) -> &'static str {
        "modulus"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prime::is_prime;

    #[test]
    fn test_finds_exactly_the_prime_factors() {
        let number = TargetNumber::parse("589").unwrap();
        let mut oracle = ModulusOracle;
        let found: Vec<u64> = (2..1001)
            .filter(|&c| is_prime(c))
            .filter(|&c| oracle.divides(&number, c))
            .collect();
        assert_eq!(found, vec![19, 31]);
    }

    #[test]
    fn test_large_number() {
        // 2^64 + 1 = 274177 * 67280421310721
        let number = TargetNumber::parse("18446744073709551617").unwrap();
        let mut oracle = ModulusOracle;
        assert!(oracle.divides(&number, 274_177));
        assert!(oracle.divides(&number, 67_280_421_310_721));
        assert!(!oracle.divides(&number, 3));
    }

    #[test]
    fn test_degenerate_candidates() {
        let number = TargetNumber::parse("589").unwrap();
        let mut oracle = ModulusOracle;
        assert!(!oracle.divides(&number, 0));
        assert!(!oracle.divides(&number, 1));
    }
}

// SPDX-License-Identifier: MIT
//
// Author: Johannes Leupolz <dev@leupolz.eu>

/// Trial division. Checking divisors up to `n / 2` is good enough here; the slowness
/// is what the speed test measures.
pub fn is_prime(n: i64) -> bool {
    if n < 2 {
        return false;
    }
    (2..=n / 2).all(|divisor| n % divisor != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_numbers() {
        let primes: Vec<i64> = (-3..30).filter(|n| is_prime(*n)).collect();
        assert_eq!(primes, vec![2, 3, 5, 7, 11, 13, 17, 19, 23, 29]);
    }

    #[test]
    fn squares_are_not_prime() {
        assert!(!is_prime(4));
        assert!(!is_prime(49));
        assert!(!is_prime(10_201));
        assert!(is_prime(104_729));
    }
}

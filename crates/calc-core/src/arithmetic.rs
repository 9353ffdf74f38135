//! Integer arithmetic: GCD, LCM, primality and coprimality.

use crate::error::{CalcError, CalcResult};

/// Greatest common divisor of `|a|` and `|b|`. `gcd(0, 0)` is 0.
pub fn gcd(a: i64, b: i64) -> u64 {
    let (mut a, mut b) = (a.unsigned_abs(), b.unsigned_abs());
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Least common multiple of `|a|` and `|b|`. Zero if either argument is zero.
pub fn lcm(a: i64, b: i64) -> CalcResult<u64> {
    if a == 0 || b == 0 {
        return Ok(0);
    }
    let g = gcd(a, b);
    (a.unsigned_abs() / g)
        .checked_mul(b.unsigned_abs())
        .ok_or_else(|| CalcError::Overflow(format!("lcm({a}, {b}) does not fit in 64 bits")))
}

pub fn is_prime(n: i64) -> bool {
    if n < 2 {
        return false;
    }
    if n < 4 {
        return true;
    }
    if n % 2 == 0 || n % 3 == 0 {
        return false;
    }
    let n = n as u64;
    let mut i: u64 = 5;
    while i * i <= n {
        if n % i == 0 || n % (i + 2) == 0 {
            return false;
        }
        i += 6;
    }
    true
}

pub fn are_coprime(a: i64, b: i64) -> bool {
    gcd(a, b) == 1
}

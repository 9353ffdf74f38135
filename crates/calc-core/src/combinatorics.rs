//! Counting: factorials, permutations and combinations.
//!
//! Inputs are signed so that values typed by a user can be rejected with a
//! clear message instead of wrapping. Results are `u128`; anything larger is
//! reported as [`CalcError::Overflow`].

use crate::error::{invalid, CalcError, CalcResult};

fn non_negative(n: i64, r: i64) -> CalcResult<(u128, u128)> {
    if n < 0 || r < 0 {
        return Err(invalid("values must be non-negative"));
    }
    Ok((n as u128, r as u128))
}

fn selection(n: i64, r: i64) -> CalcResult<(u128, u128)> {
    let (n, r) = non_negative(n, r)?;
    if r > n {
        return Err(invalid("r cannot be greater than n"));
    }
    Ok((n, r))
}

fn overflow(what: &str) -> CalcError {
    CalcError::Overflow(format!("{what} does not fit in 128 bits"))
}

/// `n!`, with `0! = 1`.
pub fn factorial(n: i64) -> CalcResult<u128> {
    if n < 0 {
        return Err(invalid("factorial is only defined for non-negative numbers"));
    }
    (2..=n as u128).try_fold(1u128, |acc, k| {
        acc.checked_mul(k).ok_or_else(|| overflow(&format!("{n}!")))
    })
}

/// Ordered selections without repetition: `n! / (n - r)!`.
pub fn permutations(n: i64, r: i64) -> CalcResult<u128> {
    let (n, r) = selection(n, r)?;
    (n - r + 1..=n).try_fold(1u128, |acc, k| {
        acc.checked_mul(k)
            .ok_or_else(|| overflow(&format!("P({n}, {r})")))
    })
}

/// Ordered selections with repetition: `n^r`.
pub fn permutations_with_repetition(n: i64, r: i64) -> CalcResult<u128> {
    let (base, exp) = non_negative(n, r)?;
    let exp = u32::try_from(exp).map_err(|_| overflow(&format!("{n}^{r}")))?;
    base.checked_pow(exp).ok_or_else(|| overflow(&format!("{n}^{r}")))
}

/// Unordered selections: the binomial coefficient `C(n, r)`.
pub fn combinations(n: i64, r: i64) -> CalcResult<u128> {
    let (n, r) = selection(n, r)?;
    let k = r.min(n - r);
    let mut acc: u128 = 1;
    for i in 0..k {
        // acc == C(n, i), so (i + 1) divides acc * (n - i). Cancelling the
        // common factor first keeps every intermediate no larger than C(n, i + 1).
        let g = gcd(acc, i + 1);
        let factor = (n - i) / ((i + 1) / g);
        acc = (acc / g)
            .checked_mul(factor)
            .ok_or_else(|| overflow(&format!("C({n}, {r})")))?;
    }
    Ok(acc)
}

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factorial_small() {
        assert_eq!(factorial(0).unwrap(), 1);
        assert_eq!(factorial(1).unwrap(), 1);
        assert_eq!(factorial(5).unwrap(), 120);
        assert_eq!(factorial(20).unwrap(), 2_432_902_008_176_640_000);
    }

    #[test]
    fn test_factorial_limits() {
        assert!(factorial(34).is_ok());
        assert!(matches!(factorial(35), Err(CalcError::Overflow(_))));
        assert!(matches!(factorial(-1), Err(CalcError::InvalidInput(_))));
    }

    #[test]
    fn test_permutations() {
        assert_eq!(permutations(5, 2).unwrap(), 20);
        assert_eq!(permutations(5, 0).unwrap(), 1);
        assert_eq!(permutations(5, 5).unwrap(), 120);
        assert_eq!(permutations(0, 0).unwrap(), 1);
        assert!(permutations(3, 4).is_err());
        assert!(permutations(-1, 0).is_err());
    }

    #[test]
    fn test_permutations_match_factorial_ratio() {
        for n in 0..=15 {
            for r in 0..=n {
                let expected = factorial(n).unwrap() / factorial(n - r).unwrap();
                assert_eq!(permutations(n, r).unwrap(), expected, "P({n},{r})");
            }
        }
    }

    #[test]
    fn test_permutations_with_repetition() {
        assert_eq!(permutations_with_repetition(2, 10).unwrap(), 1024);
        assert_eq!(permutations_with_repetition(0, 0).unwrap(), 1);
        assert_eq!(permutations_with_repetition(0, 3).unwrap(), 0);
        assert_eq!(permutations_with_repetition(7, 3).unwrap(), 343);
        assert!(permutations_with_repetition(10, 40).is_err());
        assert!(permutations_with_repetition(2, -1).is_err());
    }

    #[test]
    fn test_combinations() {
        assert_eq!(combinations(5, 2).unwrap(), 10);
        assert_eq!(combinations(52, 5).unwrap(), 2_598_960);
        assert_eq!(combinations(10, 0).unwrap(), 1);
        assert!(combinations(2, 3).is_err());
    }

    #[test]
    fn test_combinations_symmetry() {
        for n in 0..=40 {
            for r in 0..=n {
                assert_eq!(combinations(n, r).unwrap(), combinations(n, n - r).unwrap());
            }
        }
    }

    #[test]
    fn test_combinations_large_n_small_r() {
        // Full factorials would overflow here; the multiplicative form does not.
        assert_eq!(combinations(100, 3).unwrap(), 161_700);
    }

    #[test]
    fn test_combinations_near_u128_limit() {
        assert_eq!(
            combinations(130, 65).unwrap(),
            95_067_625_827_960_698_145_584_333_020_095_113_100
        );
        assert_eq!(
            combinations(131, 65).unwrap(),
            188_694_833_082_770_476_622_296_176_145_946_360_850
        );
        // Pascal's rule across the largest row that still fits.
        assert_eq!(
            combinations(131, 66).unwrap(),
            combinations(130, 65).unwrap() + combinations(130, 66).unwrap()
        );
        assert!(matches!(combinations(132, 66), Err(CalcError::Overflow(_))));
    }
}

//! Basic probability and the binomial distribution.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{invalid, CalcResult};

fn check_probability(p: f64, name: &str) -> CalcResult<()> {
    if !(0.0..=1.0).contains(&p) {
        return Err(invalid(format!("{name} must be between 0 and 1")));
    }
    Ok(())
}

fn check_trials(n: i64, k: i64, p: f64) -> CalcResult<(u64, u64)> {
    if n < 0 || k < 0 {
        return Err(invalid("n and k must be non-negative"));
    }
    if k > n {
        return Err(invalid("k cannot be greater than n"));
    }
    check_probability(p, "p")?;
    Ok((n as u64, k as u64))
}

/// Classical probability `favorable / possible`.
pub fn simple_event(favorable: i64, possible: i64) -> CalcResult<f64> {
    if possible == 0 {
        return Err(invalid("number of possible cases cannot be zero"));
    }
    if favorable < 0 || possible < 0 {
        return Err(invalid("values must be non-negative"));
    }
    if favorable > possible {
        return Err(invalid("favorable cases cannot exceed possible cases"));
    }
    Ok(favorable as f64 / possible as f64)
}

/// `P(A') = 1 - P(A)`.
pub fn complement(p: f64) -> CalcResult<f64> {
    check_probability(p, "probability")?;
    Ok(1.0 - p)
}

/// `P(A ∪ B)` for independent events.
pub fn union_independent(p_a: f64, p_b: f64) -> CalcResult<f64> {
    check_probability(p_a, "p_a")?;
    check_probability(p_b, "p_b")?;
    Ok(p_a + p_b - p_a * p_b)
}

fn ln_choose(n: u64, k: u64) -> f64 {
    let k = k.min(n - k);
    (1..=k)
        .map(|i| ((n - k + i) as f64).ln() - (i as f64).ln())
        .sum()
}

fn pmf(n: u64, k: u64, p: f64) -> f64 {
    // Degenerate ends: 0^0 is 1, and ln(0) would poison the sum.
    if p == 0.0 {
        return if k == 0 { 1.0 } else { 0.0 };
    }
    if p == 1.0 {
        return if k == n { 1.0 } else { 0.0 };
    }
    let ln = ln_choose(n, k) + k as f64 * p.ln() + (n - k) as f64 * (1.0 - p).ln();
    ln.exp()
}

/// `P(X <= k)` in O(n).
///
/// Only one term is computed in log space. The rest come from the ratio
/// `pmf(i + 1) / pmf(i) = (n - i) / (i + 1) * p / (1 - p)`, walking away from
/// the mean so every later term is smaller than the first one. Below the mean
/// the lower tail is summed directly; otherwise it is `1 - P(X > k)`.
fn cdf(n: u64, k: u64, p: f64) -> f64 {
    if k >= n || p == 0.0 {
        return 1.0;
    }
    if p == 1.0 {
        return 0.0;
    }
    let odds = p / (1.0 - p);
    let value = if (k as f64) < n as f64 * p {
        let mut term = pmf(n, k, p);
        let mut sum = term;
        for i in (1..=k).rev() {
            term *= i as f64 / (n - i + 1) as f64 / odds;
            sum += term;
        }
        sum
    } else {
        let mut term = pmf(n, k + 1, p);
        let mut sum = term;
        for i in k + 1..n {
            term *= (n - i) as f64 / (i + 1) as f64 * odds;
            sum += term;
        }
        1.0 - sum
    };
    value.clamp(0.0, 1.0)
}

/// Probability of exactly `k` successes in `n` Bernoulli trials.
pub fn binomial_pmf(n: i64, k: i64, p: f64) -> CalcResult<f64> {
    let (n, k) = check_trials(n, k, p)?;
    Ok(pmf(n, k, p))
}

/// Which side of `k` a cumulative binomial probability covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tail {
    /// `P(X <= k)`
    AtMost,
    /// `P(X >= k)`
    AtLeast,
}

impl fmt::Display for Tail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AtMost => write!(f, "at_most"),
            Self::AtLeast => write!(f, "at_least"),
        }
    }
}

impl std::str::FromStr for Tail {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "at_most" | "atmost" | "le" | "<=" => Ok(Self::AtMost),
            "at_least" | "atleast" | "ge" | ">=" => Ok(Self::AtLeast),
            _ => Err(format!("invalid tail: {s} (expected at_most or at_least)")),
        }
    }
}

/// Cumulative binomial probability on the given side of `k`.
pub fn binomial_cdf(n: i64, k: i64, p: f64, tail: Tail) -> CalcResult<f64> {
    let (n, k) = check_trials(n, k, p)?;
    let value = match tail {
        Tail::AtMost => cdf(n, k, p),
        Tail::AtLeast if k == 0 => 1.0,
        Tail::AtLeast => 1.0 - cdf(n, k - 1, p),
    };
    Ok(value.clamp(0.0, 1.0))
}

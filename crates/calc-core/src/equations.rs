use serde::Serialize;
use std::fmt;

use crate::error::{invalid, CalcError, CalcResult};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QuadraticRoots {
    TwoReal { x1: f64, x2: f64 },
    DoubleReal { x: f64 },
    /// Conjugate pair `re ± im·i`.
    Complex { re: f64, im: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QuadraticSolution {
    pub discriminant: f64,
    pub roots: QuadraticRoots,
}

/// Solve `ax² + bx + c = 0`.
pub fn solve_quadratic(a: f64, b: f64, c: f64) -> CalcResult<QuadraticSolution> {
    if a == 0.0 {
        return Err(invalid("not a quadratic equation: a cannot be 0"));
    }
    if !(a.is_finite() && b.is_finite() && c.is_finite()) {
        return Err(invalid("coefficients must be finite"));
    }
    let discriminant = b * b - 4.0 * a * c;
    if !discriminant.is_finite() {
        return Err(CalcError::Overflow(format!(
            "discriminant of {a}x² + {b}x + {c} is out of f64 range"
        )));
    }
    let roots = if discriminant > 0.0 {
        let sq = discriminant.sqrt();
        QuadraticRoots::TwoReal {
            x1: (-b + sq) / (2.0 * a),
            x2: (-b - sq) / (2.0 * a),
        }
    } else if discriminant == 0.0 {
        QuadraticRoots::DoubleReal { x: -b / (2.0 * a) }
    } else {
        QuadraticRoots::Complex {
            re: -b / (2.0 * a),
            im: discriminant.abs().sqrt() / (2.0 * a),
        }
    };
    if !roots.is_finite() {
        return Err(CalcError::Overflow(format!(
            "roots of {a}x² + {b}x + {c} are out of f64 range"
        )));
    }
    Ok(QuadraticSolution {
        discriminant,
        roots,
    })
}

impl QuadraticRoots {
    fn is_finite(&self) -> bool {
        match *self {
            Self::TwoReal { x1, x2 } => x1.is_finite() && x2.is_finite(),
            Self::DoubleReal { x } => x.is_finite(),
            Self::Complex { re, im } => re.is_finite() && im.is_finite(),
        }
    }
}

impl fmt::Display for QuadraticRoots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::TwoReal { x1, x2 } => write!(f, "x1 = {x1}, x2 = {x2}"),
            Self::DoubleReal { x } => write!(f, "x = {x} (double root)"),
            Self::Complex { re, im } => {
                let im = im.abs();
                write!(f, "x1 = {re} + {im}i, x2 = {re} - {im}i")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_real_roots() {
        let s = solve_quadratic(1.0, -3.0, 2.0).unwrap();
        assert_eq!(s.discriminant, 1.0);
        assert_eq!(s.roots, QuadraticRoots::TwoReal { x1: 2.0, x2: 1.0 });
    }

    #[test]
    fn test_double_root() {
        let s = solve_quadratic(1.0, 2.0, 1.0).unwrap();
        assert_eq!(s.roots, QuadraticRoots::DoubleReal { x: -1.0 });
    }

    #[test]
    fn test_complex_roots() {
        let s = solve_quadratic(1.0, -2.0, 5.0).unwrap();
        assert_eq!(s.discriminant, -16.0);
        assert_eq!(s.roots, QuadraticRoots::Complex { re: 1.0, im: 2.0 });
        assert_eq!(s.roots.to_string(), "x1 = 1 + 2i, x2 = 1 - 2i");
    }

    #[test]
    fn test_not_quadratic() {
        assert!(solve_quadratic(0.0, 1.0, 1.0).is_err());
        assert!(solve_quadratic(1.0, f64::NAN, 1.0).is_err());
    }

    #[test]
    fn test_overflowing_discriminant() {
        assert!(matches!(
            solve_quadratic(1.0, 1e200, 1.0),
            Err(CalcError::Overflow(_))
        ));
        assert!(matches!(
            solve_quadratic(1e300, 0.0, -1e300),
            Err(CalcError::Overflow(_))
        ));
        // Large but representable coefficients still solve.
        let s = solve_quadratic(1.0, -2e100, 1e200).unwrap();
        assert!(s.discriminant.is_finite());
    }

    #[test]
    fn test_overflowing_roots() {
        // Discriminant is fine, but dividing by a subnormal leading coefficient is not.
        assert!(matches!(
            solve_quadratic(1e-320, 1.0, 0.0),
            Err(CalcError::Overflow(_))
        ));
    }
}

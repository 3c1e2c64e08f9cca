//! Real roots of polynomials up to degree 3

use smallvec::SmallVec;

/// Coefficients below this magnitude are treated as zero.
const COEFFICIENT_EPSILON: f64 = 1e-12;

pub type Roots = SmallVec<[f64; 3]>;

/// Real root of `c1 * x + c0 = 0`.
pub fn solve_linear(c0: f64, c1: f64) -> Roots {
    let mut roots = Roots::new();
    if c1.abs() > COEFFICIENT_EPSILON {
        roots.push(-c0 / c1);
    }
    roots
}

/// Real roots of `c2 * x^2 + c1 * x + c0 = 0`.
pub fn solve_quadratic(c0: f64, c1: f64, c2: f64) -> Roots {
    if c2.abs() <= COEFFICIENT_EPSILON {
        return solve_linear(c0, c1);
    }
    let mut roots = Roots::new();
    let discriminant = c1 * c1 - 4.0 * c2 * c0;
    if discriminant < 0.0 {
        return roots;
    }
    if discriminant == 0.0 {
        roots.push(-c1 / (2.0 * c2));
        return roots;
    }
    // Numerically stable form: avoid subtracting nearly equal values.
    let sqrt = discriminant.sqrt();
    let q = -0.5 * (c1 + c1.signum() * sqrt);
    if q == 0.0 {
        // c1 == 0 and c0 == 0 cannot reach here with a positive discriminant
        // unless c0 < 0, in which case the roots are symmetric.
        let r = (-c0 / c2).sqrt();
        roots.push(-r);
        roots.push(r);
        return roots;
    }
    roots.push(q / c2);
    roots.push(c0 / q);
    roots
}

/// Real roots of `c3 * x^3 + c2 * x^2 + c1 * x + c0 = 0`.
pub fn solve_cubic(c0: f64, c1: f64, c2: f64, c3: f64) -> Roots {
    if c3.abs() <= COEFFICIENT_EPSILON {
        return solve_quadratic(c0, c1, c2);
    }
    // https://en.wikipedia.org/wiki/Cubic_equation#Trigonometric_and_hyperbolic_solutions
    let b = c2 / c3;
    let c = c1 / c3;
    let d = c0 / c3;
    let p = (3.0 * c - b * b) / 3.0;
    let q = (2.0 * b * b * b - 9.0 * b * c + 27.0 * d) / 27.0;
    let offset = -b / 3.0;
    let discriminant = q * q / 4.0 + p * p * p / 27.0;

    let mut roots = Roots::new();
    if p.abs() <= COEFFICIENT_EPSILON {
        roots.push((-q).cbrt() + offset);
    } else if discriminant > COEFFICIENT_EPSILON {
        let sqrt = discriminant.sqrt();
        let u = (-q / 2.0 + sqrt).cbrt();
        let v = (-q / 2.0 - sqrt).cbrt();
        roots.push(u + v + offset);
    } else if discriminant >= -COEFFICIENT_EPSILON {
        let u = (-q / 2.0).cbrt();
        roots.push(2.0 * u + offset);
        roots.push(-u + offset);
    } else {
        let r = 2.0 * (-p / 3.0).sqrt();
        let phi = ((3.0 * q) / (2.0 * p) * (-3.0 / p).sqrt()).clamp(-1.0, 1.0).acos() / 3.0;
        for k in 0..3 {
            let angle = phi - 2.0 * std::f64::consts::PI * k as f64 / 3.0;
            roots.push(r * angle.cos() + offset);
        }
    }
    roots
}

/// Keep roots inside `[0, 1]` (with a little slack), clamped into range.
pub fn unit_interval_roots(roots: Roots) -> Roots {
    const SLACK: f64 = 1e-9;
    roots
        .into_iter()
        .filter(|t| t.is_finite() && *t >= -SLACK && *t <= 1.0 + SLACK)
        .map(|t| t.clamp(0.0, 1.0))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(mut roots: Roots) -> Vec<f64> {
        roots.sort_by(|a, b| a.partial_cmp(b).unwrap());
        roots.into_vec()
    }

    fn assert_roots(actual: Roots, expected: &[f64]) {
        let actual = sorted(actual);
        assert_eq!(actual.len(), expected.len(), "roots: {:?}", actual);
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-9, "expected {e}, got {a}");
        }
    }

    #[test]
    fn test_linear() {
        assert_roots(solve_linear(-4.0, 2.0), &[2.0]);
        assert_roots(solve_linear(1.0, 0.0), &[]);
    }

    #[test]
    fn test_quadratic() {
        // (x - 1)(x - 3) = x^2 - 4x + 3
        assert_roots(solve_quadratic(3.0, -4.0, 1.0), &[1.0, 3.0]);
        assert_roots(solve_quadratic(1.0, 0.0, 1.0), &[]);
        assert_roots(solve_quadratic(-4.0, 0.0, 1.0), &[-2.0, 2.0]);
    }

    #[test]
    fn test_cubic_three_roots() {
        // (x - 1)(x - 2)(x - 3) = x^3 - 6x^2 + 11x - 6
        assert_roots(solve_cubic(-6.0, 11.0, -6.0, 1.0), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_cubic_single_root() {
        // x^3 + x + 2 = (x + 1)(x^2 - x + 2)
        assert_roots(solve_cubic(2.0, 1.0, 0.0, 1.0), &[-1.0]);
    }

    #[test]
    fn test_cubic_degenerates_to_quadratic() {
        assert_roots(solve_cubic(3.0, -4.0, 1.0, 0.0), &[1.0, 3.0]);
    }

    #[test]
    fn test_unit_interval_filter() {
        let roots: Roots = [-0.5, 0.25, 1.0 + 1e-12, 2.0].into_iter().collect();
        assert_eq!(unit_interval_roots(roots).into_vec(), vec![0.25, 1.0]);
    }
}

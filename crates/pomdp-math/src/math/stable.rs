//! Numerically careful float helpers shared by the solver.

/// Absolute-tolerance comparison. NaN never compares equal.
pub fn approx_eq(a: f64, b: f64, tol: f64) -> bool {
    if a.is_nan() || b.is_nan() {
        return false;
    }
    (a - b).abs() <= tol
}

/// Componentwise equality of two slices under an absolute tolerance.
///
/// Slices of different lengths are never equal.
pub fn slices_approx_eq(a: &[f64], b: &[f64], tol: f64) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(&x, &y)| approx_eq(x, y, tol))
}

/// Dot product of two equal-length slices.
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(&x, &y)| x * y).sum()
}

/// L-infinity distance between two equal-length slices.
///
/// Returns infinity for mismatched lengths so the caller's max/min folds
/// stay well-defined.
pub fn linf_distance(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        return f64::INFINITY;
    }
    a.iter()
        .zip(b)
        .map(|(&x, &y)| (x - y).abs())
        .fold(0.0, f64::max)
}

/// Largest absolute value in a slice (0.0 for empty input).
pub fn max_abs(values: &[f64]) -> f64 {
    values.iter().map(|v| v.abs()).fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approx_eq_basic() {
        assert!(approx_eq(1.0, 1.0 + 1e-12, 1e-9));
        assert!(!approx_eq(1.0, 1.1, 1e-9));
        assert!(!approx_eq(f64::NAN, f64::NAN, 1e-9));
    }

    #[test]
    fn slices_approx_eq_length_mismatch() {
        assert!(!slices_approx_eq(&[1.0], &[1.0, 2.0], 1e-9));
        assert!(slices_approx_eq(&[1.0, 2.0], &[1.0, 2.0], 1e-9));
    }

    #[test]
    fn dot_basic() {
        let out = dot(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]);
        assert!(approx_eq(out, 32.0, 1e-12));
    }

    #[test]
    fn linf_distance_basic() {
        let d = linf_distance(&[0.0, 1.0, 5.0], &[0.5, 1.0, 3.0]);
        assert!(approx_eq(d, 2.0, 1e-12));
        assert_eq!(linf_distance(&[0.0], &[0.0, 1.0]), f64::INFINITY);
    }

    #[test]
    fn max_abs_basic() {
        assert!(approx_eq(max_abs(&[-3.0, 2.0]), 3.0, 1e-12));
        assert_eq!(max_abs(&[]), 0.0);
    }
}

//! Float comparison and integration helpers.

use crate::CoreError;

pub type Real = f64;

/// Mixed absolute/relative closeness bound.
///
/// Two values match when their difference is within `abs`, or within
/// `rel` times the larger magnitude. The absolute part covers values near
/// zero (an empty battery, the start of a run).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Tolerances {
    /// Round-off level: about a thousand ulps at unit scale.
    pub const ROUND_OFF: Tolerances = Tolerances::new(1e-12, 1e-9);

    pub const fn new(abs: Real, rel: Real) -> Self {
        Self { abs, rel }
    }

    pub fn admits(&self, a: Real, b: Real) -> bool {
        let gap = (a - b).abs();
        gap <= self.abs || gap <= self.rel * a.abs().max(b.abs())
    }
}

impl Default for Tolerances {
    fn default() -> Self {
        Self::ROUND_OFF
    }
}

/// `a` and `b` agree within `tol`. NaN never agrees with anything.
pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    tol.admits(a, b)
}

/// Pass `value` through, or name it in a [`CoreError::NonFinite`].
pub fn ensure_finite(value: Real, what: &'static str) -> Result<Real, CoreError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CoreError::NonFinite { what, value })
    }
}

/// Trapezoidal integral of `y(item)` over `x(item)` for an ordered slice.
///
/// Returns 0 for fewer than two items.
pub fn trapezoid_by<T>(items: &[T], x: impl Fn(&T) -> Real, y: impl Fn(&T) -> Real) -> Real {
    items
        .windows(2)
        .map(|w| 0.5 * (y(&w[0]) + y(&w[1])) * (x(&w[1]) - x(&w[0])))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_off_tolerance() {
        let tol = Tolerances::default();
        assert!(nearly_equal(3600.0, 3600.0 + 1e-7, tol));
        assert!(nearly_equal(0.0, 1e-13, tol));
        assert!(!nearly_equal(0.5, 0.5 + 1e-6, tol));
        assert!(!nearly_equal(Real::NAN, Real::NAN, tol));
    }

    #[test]
    fn absolute_part_dominates_near_zero() {
        let tol = Tolerances::new(1e-3, 0.0);
        assert!(tol.admits(0.0, 5e-4));
        assert!(!tol.admits(1000.0, 1000.01));
    }

    #[test]
    fn non_finite_names_the_value() {
        let err = ensure_finite(Real::INFINITY, "segment energy").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("segment energy"));
        assert_eq!(ensure_finite(4.2, "soc").unwrap(), 4.2);
    }

    #[test]
    fn trapezoid_of_linear_ramp() {
        let pts = [(0.0, 0.0), (1.0, 1.0), (2.0, 2.0)];
        let area = trapezoid_by(&pts, |p| p.0, |p| p.1);
        assert!((area - 2.0).abs() < 1e-12);
    }

    #[test]
    fn trapezoid_needs_two_points() {
        let pts = [(3.0, 7.0)];
        assert_eq!(trapezoid_by(&pts, |p| p.0, |p| p.1), 0.0);
    }
}

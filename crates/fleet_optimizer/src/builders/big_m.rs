//! Tight big-M constants for conditional constraints.
//!
//! A conditional constraint `lhs >= rhs` that must only hold when a binary `x` is `1` is
//! written `lhs >= rhs - (1 - x) * M`. The smallest valid `M` is the largest violation
//! the relaxed constraint can reach under the variable bounds, which keeps the LP
//! relaxation as tight as possible.

/// Bounds `[lower, upper]` of a continuous variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub lower: f64,
    pub upper: f64,
}

impl Bounds {
    pub fn new(lower: f64, upper: f64) -> Self {
        Bounds { lower, upper }
    }
}

/// `M` for `to - from >= offset` when the arc is used: how far `to - from` can fall below
/// `offset`.
#[inline]
pub fn lower_difference_m(from: Bounds, to: Bounds, offset: f64) -> f64 {
    (offset - (to.lower - from.upper)).max(0.0)
}

/// `M` for `to - from <= offset` when the arc is used: how far `to - from` can exceed
/// `offset`.
#[inline]
pub fn upper_difference_m(from: Bounds, to: Bounds, offset: f64) -> f64 {
    ((to.upper - from.lower) - offset).max(0.0)
}

/// `M` for `value <= limit` when active.
#[inline]
pub fn upper_limit_m(value: Bounds, limit: f64) -> f64 {
    (value.upper - limit).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lower_difference_m() {
        let from = Bounds::new(480.0, 720.0);
        let to = Bounds::new(480.0, 720.0);

        assert_eq!(lower_difference_m(from, to, 10.0), 250.0);
        assert_eq!(lower_difference_m(from, Bounds::new(900.0, 950.0), 10.0), 0.0);
    }

    #[test]
    fn test_upper_difference_m() {
        let from = Bounds::new(480.0, 720.0);
        let to = Bounds::new(500.0, 600.0);

        assert_eq!(upper_difference_m(from, to, 10.0), 110.0);
        assert_eq!(upper_difference_m(from, to, 200.0), 0.0);
    }

    #[test]
    fn test_upper_limit_m() {
        assert_eq!(upper_limit_m(Bounds::new(480.0, 720.0), 600.0), 120.0);
        assert_eq!(upper_limit_m(Bounds::new(480.0, 500.0), 600.0), 0.0);
    }
}

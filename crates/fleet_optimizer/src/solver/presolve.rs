//! Activity-based bound propagation, run on every branch-and-bound node before its LP.

use crate::model::{constraint::Sense, milp_model::MilpModel};

const MAX_PASSES: usize = 20;
const FEASIBILITY_TOLERANCE: f64 = 1e-6;
const MIN_IMPROVEMENT: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Infeasible;

/// Minimum or maximum activity of a row, infinite contributions counted apart.
#[derive(Default, Clone, Copy)]
struct Activity {
    finite: f64,
    infinite: usize,
}

impl Activity {
    fn add(&mut self, contribution: f64) {
        if contribution.is_finite() {
            self.finite += contribution;
        } else {
            self.infinite += 1;
        }
    }

    fn value(&self) -> Option<f64> {
        (self.infinite == 0).then_some(self.finite)
    }

    /// Activity of the row without one term.
    fn without(&self, contribution: f64) -> Option<f64> {
        if contribution.is_finite() {
            (self.infinite == 0).then_some(self.finite - contribution)
        } else {
            (self.infinite == 1).then_some(self.finite)
        }
    }
}

/// Tightens `lower` and `upper` in place until a fixpoint or `MAX_PASSES` passes.
/// Returns the number of tightened bounds.
pub(crate) fn propagate_bounds(
    model: &MilpModel,
    lower: &mut [f64],
    upper: &mut [f64],
    integrality_tolerance: f64,
) -> Result<usize, Infeasible> {
    let mut tightened = 0;

    for _ in 0..MAX_PASSES {
        let mut changed = false;

        for constraint in model.constraints() {
            let terms = constraint.terms();
            let rhs = constraint.rhs();
            let sense = constraint.sense();

            let mut min_activity = Activity::default();
            let mut max_activity = Activity::default();
            for &(var, coefficient) in terms {
                let (low, high) = contributions(coefficient, lower[var.get()], upper[var.get()]);
                min_activity.add(low);
                max_activity.add(high);
            }

            let tolerance = FEASIBILITY_TOLERANCE * (1.0 + rhs.abs());
            let bounded_above = sense != Sense::GreaterEqual;
            let bounded_below = sense != Sense::LessEqual;

            if bounded_above && min_activity.value().is_some_and(|min| min > rhs + tolerance) {
                return Err(Infeasible);
            }
            if bounded_below && max_activity.value().is_some_and(|max| max < rhs - tolerance) {
                return Err(Infeasible);
            }

            for &(var, coefficient) in terms {
                let index = var.get();
                let is_integral = model.variable(var).is_integral();
                let (low, high) = contributions(coefficient, lower[index], upper[index]);

                if let Some(rest) = min_activity.without(low).filter(|_| bounded_above) {
                    let bound = (rhs - rest) / coefficient;
                    changed |= if coefficient > 0.0 {
                        tighten_upper(&mut upper[index], bound, is_integral, integrality_tolerance)
                    } else {
                        tighten_lower(&mut lower[index], bound, is_integral, integrality_tolerance)
                    };
                }

                if let Some(rest) = max_activity.without(high).filter(|_| bounded_below) {
                    let bound = (rhs - rest) / coefficient;
                    changed |= if coefficient > 0.0 {
                        tighten_lower(&mut lower[index], bound, is_integral, integrality_tolerance)
                    } else {
                        tighten_upper(&mut upper[index], bound, is_integral, integrality_tolerance)
                    };
                }

                if lower[index] > upper[index] {
                    let tolerance = FEASIBILITY_TOLERANCE * (1.0 + upper[index].abs());
                    if is_integral || lower[index] > upper[index] + tolerance {
                        return Err(Infeasible);
                    }
                    upper[index] = lower[index];
                }
            }
        }

        if !changed {
            break;
        }
        tightened += 1;
    }

    Ok(tightened)
}

#[inline]
fn contributions(coefficient: f64, lower: f64, upper: f64) -> (f64, f64) {
    if coefficient > 0.0 {
        (coefficient * lower, coefficient * upper)
    } else {
        (coefficient * upper, coefficient * lower)
    }
}

fn tighten_upper(
    upper: &mut f64,
    bound: f64,
    is_integral: bool,
    integrality_tolerance: f64,
) -> bool {
    let bound = if is_integral {
        (bound + integrality_tolerance).floor()
    } else {
        bound + MIN_IMPROVEMENT * 1e-3 * (1.0 + bound.abs())
    };

    if bound < *upper - MIN_IMPROVEMENT * (1.0 + upper.abs().min(1e9)) {
        *upper = bound;
        true
    } else {
        false
    }
}

fn tighten_lower(
    lower: &mut f64,
    bound: f64,
    is_integral: bool,
    integrality_tolerance: f64,
) -> bool {
    let bound = if is_integral {
        (bound - integrality_tolerance).ceil()
    } else {
        bound - MIN_IMPROVEMENT * 1e-3 * (1.0 + bound.abs())
    };

    if bound > *lower + MIN_IMPROVEMENT * (1.0 + lower.abs().min(1e9)) {
        *lower = bound;
        true
    } else {
        false
    }
}

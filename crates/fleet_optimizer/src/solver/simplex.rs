//! Dense bounded-variable primal simplex for the LP relaxations.
//!
//! Variables are shifted so every column lives in `[0, upper]`. Nonbasic columns sit at
//! one of their bounds and the values of the basic columns are tracked apart from the
//! tableau. Phase 1 minimizes the sum of the artificial columns, phase 2 the objective
//! with the artificial columns fixed to zero.

use crate::{
    model::{constraint::Sense, milp_model::MilpModel},
    solver::solve_error::SolveError,
};

const PIVOT_TOLERANCE: f64 = 1e-9;
const OPTIMALITY_TOLERANCE: f64 = 1e-9;
const FEASIBILITY_TOLERANCE: f64 = 1e-6;
const FIXED_TOLERANCE: f64 = 1e-9;
const DROP_TOLERANCE: f64 = 1e-12;
/// Consecutive degenerate pivots before switching to Bland's rule.
const DEGENERATE_PIVOTS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LpStatus {
    Optimal,
    Infeasible,
    Unbounded,
}

#[derive(Debug, Clone)]
pub(crate) struct LpSolution {
    pub status: LpStatus,
    /// One value per model variable, meaningful when optimal.
    pub values: Vec<f64>,
    pub objective: f64,
    pub iterations: usize,
}

impl LpSolution {
    fn without_solution(status: LpStatus, iterations: usize) -> Self {
        LpSolution {
            status,
            values: Vec::new(),
            objective: f64::INFINITY,
            iterations,
        }
    }
}

struct Row {
    terms: Vec<(usize, f64)>,
    slack: Option<f64>,
    rhs: f64,
}

/// Solves the relaxation of `model` restricted to `[lower, upper]`. Variables whose bounds
/// meet are substituted and rows that can never be violated are dropped.
pub(crate) fn solve_relaxation(
    model: &MilpModel,
    lower: &[f64],
    upper: &[f64],
) -> Result<LpSolution, SolveError> {
    let mut columns = vec![None; model.num_variables()];
    let mut column_upper = Vec::new();
    let mut column_variables = Vec::new();

    for (index, (&low, &high)) in lower.iter().zip(upper).enumerate() {
        if high - low > FIXED_TOLERANCE {
            columns[index] = Some(column_variables.len());
            column_upper.push(high - low);
            column_variables.push(index);
        }
    }

    let mut rows = Vec::with_capacity(model.num_constraints());
    for constraint in model.constraints() {
        let mut rhs = constraint.rhs();
        let mut terms = Vec::with_capacity(constraint.terms().len());
        let (mut min_activity, mut max_activity) = (0.0, 0.0);

        for &(var, coefficient) in constraint.terms() {
            rhs -= coefficient * lower[var.get()];
            if let Some(column) = columns[var.get()] {
                terms.push((column, coefficient));
                let range = coefficient * column_upper[column];
                if range > 0.0 {
                    max_activity += range;
                } else {
                    min_activity += range;
                }
            }
        }

        let tolerance = FEASIBILITY_TOLERANCE * (1.0 + rhs.abs());
        let sense = constraint.sense();

        if terms.is_empty() {
            let violated = match sense {
                Sense::LessEqual => rhs < -tolerance,
                Sense::GreaterEqual => rhs > tolerance,
                Sense::Equal => rhs.abs() > tolerance,
            };
            if violated {
                return Ok(LpSolution::without_solution(LpStatus::Infeasible, 0));
            }
            continue;
        }

        let redundant = match sense {
            Sense::LessEqual => max_activity <= rhs,
            Sense::GreaterEqual => min_activity >= rhs,
            Sense::Equal => false,
        };
        if redundant {
            continue;
        }

        let slack = match sense {
            Sense::LessEqual => Some(1.0),
            Sense::GreaterEqual => Some(-1.0),
            Sense::Equal => None,
        };
        rows.push(Row { terms, slack, rhs });
    }

    let cost: Vec<f64> = {
        let mut cost = vec![0.0; column_variables.len()];
        for &(var, coefficient) in model.objective().terms() {
            if let Some(column) = columns[var.get()] {
                cost[column] += coefficient;
            }
        }
        cost
    };

    let mut tableau = Tableau::new(rows, column_upper, &cost);
    let max_iterations = 20_000 + 20 * (tableau.num_rows + tableau.num_cols);

    if tableau.first_artificial < tableau.num_cols {
        let phase_one_cost: Vec<f64> = (0..tableau.num_cols)
            .map(|column| if column >= tableau.first_artificial { 1.0 } else { 0.0 })
            .collect();
        tableau.price(&phase_one_cost);

        if tableau.optimize(tableau.num_cols, max_iterations)? == PhaseEnd::Unbounded {
            return Err(SolveError::Numerical(
                "phase one of the simplex is unbounded".to_owned(),
            ));
        }

        let infeasibility: f64 = (0..tableau.num_rows)
            .filter(|&row| tableau.basis[row] >= tableau.first_artificial)
            .map(|row| tableau.beta[row])
            .sum();
        if infeasibility > FEASIBILITY_TOLERANCE {
            return Ok(LpSolution::without_solution(
                LpStatus::Infeasible,
                tableau.iterations,
            ));
        }

        for column in tableau.first_artificial..tableau.num_cols {
            tableau.upper[column] = 0.0;
        }
    }

    let phase_two_cost: Vec<f64> = (0..tableau.num_cols)
        .map(|column| cost.get(column).copied().unwrap_or(0.0))
        .collect();
    tableau.price(&phase_two_cost);

    if tableau.optimize(tableau.first_artificial, max_iterations)? == PhaseEnd::Unbounded {
        return Ok(LpSolution::without_solution(
            LpStatus::Unbounded,
            tableau.iterations,
        ));
    }

    let mut values = lower.to_vec();
    for (column, &var) in column_variables.iter().enumerate() {
        let shifted = tableau.column_value(column);
        values[var] = (lower[var] + shifted).clamp(lower[var], upper[var]);
    }

    Ok(LpSolution {
        status: LpStatus::Optimal,
        objective: model.objective_value(&values),
        values,
        iterations: tableau.iterations,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PhaseEnd {
    Optimal,
    Unbounded,
}

struct Tableau {
    num_rows: usize,
    num_cols: usize,
    first_artificial: usize,
    matrix: Vec<f64>,
    beta: Vec<f64>,
    basis: Vec<usize>,
    basic_row: Vec<Option<usize>>,
    upper: Vec<f64>,
    at_upper: Vec<bool>,
    reduced: Vec<f64>,
    pivot_row: Vec<(usize, f64)>,
    iterations: usize,
}

impl Tableau {
    /// Lays out the structural columns, one slack per inequality and one artificial per
    /// row without a usable slack. Every row starts with a basic column at value `rhs`.
    fn new(rows: Vec<Row>, structural_upper: Vec<f64>, cost: &[f64]) -> Self {
        let num_rows = rows.len();
        let num_structural = cost.len();
        let num_slacks = rows.iter().filter(|row| row.slack.is_some()).count();
        let num_artificials = rows
            .iter()
            .filter(|row| {
                let sign = if row.rhs < 0.0 { -1.0 } else { 1.0 };
                row.slack.is_none_or(|slack| slack * sign < 0.0)
            })
            .count();
        let first_artificial = num_structural + num_slacks;
        let num_cols = first_artificial + num_artificials;

        let mut matrix = vec![0.0; num_rows * num_cols];
        let mut beta = vec![0.0; num_rows];
        let mut basis = vec![0; num_rows];
        let mut basic_row = vec![None; num_cols];
        let mut upper = structural_upper;
        upper.resize(num_cols, f64::INFINITY);

        let mut next_slack = num_structural;
        let mut next_artificial = first_artificial;

        for (index, row) in rows.into_iter().enumerate() {
            let sign = if row.rhs < 0.0 { -1.0 } else { 1.0 };
            let offset = index * num_cols;

            for (column, coefficient) in row.terms {
                matrix[offset + column] += sign * coefficient;
            }
            beta[index] = sign * row.rhs;

            let basic = match row.slack {
                Some(slack) => {
                    let column = next_slack;
                    next_slack += 1;
                    matrix[offset + column] = sign * slack;
                    if sign * slack > 0.0 {
                        Some(column)
                    } else {
                        None
                    }
                }
                None => None,
            };

            let basic = basic.unwrap_or_else(|| {
                let column = next_artificial;
                next_artificial += 1;
                matrix[offset + column] = 1.0;
                column
            });

            basis[index] = basic;
            basic_row[basic] = Some(index);
        }

        Tableau {
            num_rows,
            num_cols,
            first_artificial,
            matrix,
            beta,
            basis,
            basic_row,
            upper,
            at_upper: vec![false; num_cols],
            reduced: vec![0.0; num_cols],
            pivot_row: Vec::with_capacity(num_cols),
            iterations: 0,
        }
    }

    /// Recomputes the reduced costs of `cost` for the current basis.
    fn price(&mut self, cost: &[f64]) {
        self.reduced.copy_from_slice(cost);

        for row in 0..self.num_rows {
            let basic_cost = cost[self.basis[row]];
            if basic_cost == 0.0 {
                continue;
            }

            let coefficients = &self.matrix[row * self.num_cols..(row + 1) * self.num_cols];
            for (reduced, coefficient) in self.reduced.iter_mut().zip(coefficients) {
                *reduced -= basic_cost * coefficient;
            }
        }
    }

    fn column_value(&self, column: usize) -> f64 {
        match self.basic_row[column] {
            Some(row) => self.beta[row],
            None if self.at_upper[column] => self.upper[column],
            None => 0.0,
        }
    }

    fn optimize(&mut self, eligible: usize, max_iterations: usize) -> Result<PhaseEnd, SolveError> {
        let mut degenerate = 0;

        loop {
            let bland = degenerate >= DEGENERATE_PIVOTS;
            let Some(column) = self.entering_column(eligible, bland) else {
                return Ok(PhaseEnd::Optimal);
            };

            let direction = if self.at_upper[column] { -1.0 } else { 1.0 };
            let (step, leaving) = self.ratio_test(column, direction, bland);
            if step.is_infinite() {
                return Ok(PhaseEnd::Unbounded);
            }

            self.step(column, direction, step, leaving);

            degenerate = if step <= DROP_TOLERANCE { degenerate + 1 } else { 0 };
            self.iterations += 1;
            if self.iterations > max_iterations {
                return Err(SolveError::Numerical(format!(
                    "simplex did not converge within {max_iterations} iterations"
                )));
            }
        }
    }

    /// Dantzig's rule, or the first improving column under Bland's rule.
    fn entering_column(&self, eligible: usize, bland: bool) -> Option<usize> {
        let mut entering = None;
        let mut best = OPTIMALITY_TOLERANCE;

        for column in 0..eligible {
            if self.basic_row[column].is_some() {
                continue;
            }

            let reduced = self.reduced[column];
            let improvement = if self.at_upper[column] { reduced } else { -reduced };
            if improvement > best {
                if bland {
                    return Some(column);
                }
                best = improvement;
                entering = Some(column);
            }
        }

        entering
    }

    /// Largest step of the entering column and the row leaving the basis, `None` when
    /// the entering column reaches its own opposite bound first.
    fn ratio_test(&self, column: usize, direction: f64, bland: bool) -> (f64, Option<usize>) {
        let mut step = self.upper[column];
        let mut leaving: Option<usize> = None;
        let mut leaving_pivot = 0.0;

        for row in 0..self.num_rows {
            let pivot = self.matrix[row * self.num_cols + column];
            if pivot.abs() <= PIVOT_TOLERANCE {
                continue;
            }

            let change = direction * pivot;
            let ratio = if change > 0.0 {
                self.beta[row].max(0.0) / change
            } else {
                let basic_upper = self.upper[self.basis[row]];
                if basic_upper.is_infinite() {
                    continue;
                }
                (basic_upper - self.beta[row]).max(0.0) / -change
            };

            if ratio < step - DROP_TOLERANCE {
                step = ratio;
                leaving = Some(row);
                leaving_pivot = pivot.abs();
            } else if ratio <= step + DROP_TOLERANCE
                && let Some(current) = leaving
            {
                let replace = if bland {
                    self.basis[row] < self.basis[current]
                } else {
                    pivot.abs() > leaving_pivot
                };
                if replace {
                    step = step.min(ratio);
                    leaving = Some(row);
                    leaving_pivot = pivot.abs();
                }
            }
        }

        (step, leaving)
    }

    fn step(&mut self, column: usize, direction: f64, step: f64, leaving: Option<usize>) {
        if step > 0.0 {
            for row in 0..self.num_rows {
                let coefficient = self.matrix[row * self.num_cols + column];
                if coefficient != 0.0 {
                    self.beta[row] -= direction * step * coefficient;
                }
            }
        }

        let Some(row) = leaving else {
            self.at_upper[column] = !self.at_upper[column];
            return;
        };

        let leaving_column = self.basis[row];
        let to_upper = direction * self.matrix[row * self.num_cols + column] < 0.0;
        let entering_value = if self.at_upper[column] {
            self.upper[column] - step
        } else {
            step
        };

        self.pivot(row, column);

        self.beta[row] = entering_value;
        self.basis[row] = column;
        self.basic_row[column] = Some(row);
        self.basic_row[leaving_column] = None;
        self.at_upper[column] = false;
        self.at_upper[leaving_column] = to_upper && self.upper[leaving_column].is_finite();
    }

    fn pivot(&mut self, pivot_row: usize, pivot_column: usize) {
        let num_cols = self.num_cols;
        let offset = pivot_row * num_cols;
        let inverse = 1.0 / self.matrix[offset + pivot_column];

        self.pivot_row.clear();
        for column in 0..num_cols {
            let value = self.matrix[offset + column] * inverse;
            if value.abs() > DROP_TOLERANCE {
                self.matrix[offset + column] = value;
                self.pivot_row.push((column, value));
            } else {
                self.matrix[offset + column] = 0.0;
            }
        }
        self.matrix[offset + pivot_column] = 1.0;

        for row in 0..self.num_rows {
            if row == pivot_row {
                continue;
            }

            let row_offset = row * num_cols;
            let factor = self.matrix[row_offset + pivot_column];
            if factor == 0.0 {
                continue;
            }

            for &(column, value) in &self.pivot_row {
                let entry = &mut self.matrix[row_offset + column];
                *entry -= factor * value;
                if entry.abs() <= DROP_TOLERANCE {
                    *entry = 0.0;
                }
            }
            self.matrix[row_offset + pivot_column] = 0.0;
        }

        let factor = self.reduced[pivot_column];
        if factor != 0.0 {
            for &(column, value) in &self.pivot_row {
                self.reduced[column] -= factor * value;
            }
            self.reduced[pivot_column] = 0.0;
        }
    }
}

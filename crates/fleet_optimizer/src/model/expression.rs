use std::ops::{Add, AddAssign, Mul, Sub};

use smallvec::SmallVec;

use crate::model::variable::VarId;

pub type Terms = SmallVec<[(VarId, f64); 4]>;

/// `sum(coefficient * variable) + constant`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    terms: Terms,
    constant: f64,
}

impl LinearExpr {
    pub fn new() -> Self {
        LinearExpr::default()
    }

    pub fn constant(value: f64) -> Self {
        LinearExpr {
            terms: Terms::new(),
            constant: value,
        }
    }

    pub fn term(var: VarId, coefficient: f64) -> Self {
        let mut terms = Terms::new();
        terms.push((var, coefficient));
        LinearExpr {
            terms,
            constant: 0.0,
        }
    }

    pub fn add_term(&mut self, var: VarId, coefficient: f64) {
        self.terms.push((var, coefficient));
    }

    pub fn add_constant(&mut self, value: f64) {
        self.constant += value;
    }

    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    pub fn constant_value(&self) -> f64 {
        self.constant
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.constant
            + self
                .terms
                .iter()
                .map(|&(var, coefficient)| coefficient * values[var])
                .sum::<f64>()
    }

    /// Merges repeated variables and drops zero coefficients.
    pub fn compact(mut self) -> Self {
        if self.terms.len() > 1 {
            self.terms.sort_unstable_by_key(|&(var, _)| var);

            let mut merged = Terms::with_capacity(self.terms.len());
            for (var, coefficient) in self.terms {
                match merged.last_mut() {
                    Some((last, total)) if *last == var => *total += coefficient,
                    _ => merged.push((var, coefficient)),
                }
            }
            self.terms = merged;
        }

        self.terms.retain(|(_, coefficient)| *coefficient != 0.0);
        self
    }

    pub(crate) fn into_parts(self) -> (Terms, f64) {
        (self.terms, self.constant)
    }
}

impl FromIterator<(VarId, f64)> for LinearExpr {
    fn from_iter<I: IntoIterator<Item = (VarId, f64)>>(iter: I) -> Self {
        LinearExpr {
            terms: iter.into_iter().collect(),
            constant: 0.0,
        }
    }
}

impl Extend<(VarId, f64)> for LinearExpr {
    fn extend<I: IntoIterator<Item = (VarId, f64)>>(&mut self, iter: I) {
        self.terms.extend(iter);
    }
}

impl AddAssign for LinearExpr {
    fn add_assign(&mut self, rhs: LinearExpr) {
        self.terms.extend(rhs.terms);
        self.constant += rhs.constant;
    }
}

impl Add for LinearExpr {
    type Output = LinearExpr;

    fn add(mut self, rhs: LinearExpr) -> LinearExpr {
        self += rhs;
        self
    }
}

impl Sub for LinearExpr {
    type Output = LinearExpr;

    fn sub(self, rhs: LinearExpr) -> LinearExpr {
        self + rhs * -1.0
    }
}

impl Mul<f64> for LinearExpr {
    type Output = LinearExpr;

    fn mul(mut self, factor: f64) -> LinearExpr {
        for (_, coefficient) in self.terms.iter_mut() {
            *coefficient *= factor;
        }
        self.constant *= factor;
        self
    }
}

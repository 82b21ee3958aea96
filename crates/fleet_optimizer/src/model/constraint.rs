use crate::model::{expression::LinearExpr, variable::VarId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    LessEqual,
    GreaterEqual,
    Equal,
}

/// `terms (sense) rhs`, any constant of the original expression is folded into `rhs`.
#[derive(Debug, Clone)]
pub struct Constraint {
    name: String,
    terms: Vec<(VarId, f64)>,
    sense: Sense,
    rhs: f64,
}

impl Constraint {
    pub fn new(name: impl Into<String>, expr: LinearExpr, sense: Sense, rhs: f64) -> Self {
        let (terms, constant) = expr.compact().into_parts();

        Constraint {
            name: name.into(),
            terms: terms.into_vec(),
            sense,
            rhs: rhs - constant,
        }
    }

    pub fn le(name: impl Into<String>, expr: LinearExpr, rhs: f64) -> Self {
        Constraint::new(name, expr, Sense::LessEqual, rhs)
    }

    pub fn ge(name: impl Into<String>, expr: LinearExpr, rhs: f64) -> Self {
        Constraint::new(name, expr, Sense::GreaterEqual, rhs)
    }

    pub fn eq(name: impl Into<String>, expr: LinearExpr, rhs: f64) -> Self {
        Constraint::new(name, expr, Sense::Equal, rhs)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    pub fn sense(&self) -> Sense {
        self.sense
    }

    pub fn rhs(&self) -> f64 {
        self.rhs
    }

    pub fn activity(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|&(var, coefficient)| coefficient * values[var])
            .sum()
    }

    /// How far `values` are from satisfying the constraint, `0.0` when satisfied.
    pub fn violation(&self, values: &[f64]) -> f64 {
        let activity = self.activity(values);
        match self.sense {
            Sense::LessEqual => (activity - self.rhs).max(0.0),
            Sense::GreaterEqual => (self.rhs - activity).max(0.0),
            Sense::Equal => (activity - self.rhs).abs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_folded_into_rhs() {
        let expr = LinearExpr::term(VarId::new(0), 1.0) + LinearExpr::constant(4.0);
        let constraint = Constraint::le("c", expr, 10.0);

        assert_eq!(constraint.rhs(), 6.0);
        assert_eq!(constraint.terms(), &[(VarId::new(0), 1.0)]);
    }

    #[test]
    fn test_violation() {
        let expr = LinearExpr::term(VarId::new(0), 1.0) + LinearExpr::term(VarId::new(1), 1.0);

        let le = Constraint::le("le", expr.clone(), 1.0);
        let ge = Constraint::ge("ge", expr.clone(), 1.0);
        let eq = Constraint::eq("eq", expr, 1.0);

        assert_eq!(le.violation(&[1.0, 1.0]), 1.0);
        assert_eq!(ge.violation(&[1.0, 1.0]), 0.0);
        assert_eq!(ge.violation(&[0.0, 0.0]), 1.0);
        assert_eq!(eq.violation(&[0.0, 0.5]), 0.5);
    }
}

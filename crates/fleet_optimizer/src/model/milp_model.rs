use tracing::debug;

use crate::model::{
    constraint::Constraint,
    expression::LinearExpr,
    variable::{VarId, VarKind, Variable},
};

/// A minimization mixed-integer linear program.
#[derive(Debug, Clone, Default)]
pub struct MilpModel {
    name: String,
    variables: Vec<Variable>,
    constraints: Vec<Constraint>,
    objective: LinearExpr,
}

impl MilpModel {
    pub fn new(name: impl Into<String>) -> Self {
        MilpModel {
            name: name.into(),
            ..MilpModel::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add_variable(&mut self, variable: Variable) -> VarId {
        let id = VarId::new(self.variables.len());
        self.variables.push(variable);
        id
    }

    pub fn add_binary(&mut self, name: impl Into<String>) -> VarId {
        self.add_variable(Variable::binary(name))
    }

    pub fn add_continuous(&mut self, name: impl Into<String>, lower: f64, upper: f64) -> VarId {
        self.add_variable(Variable::continuous(name, lower, upper))
    }

    pub fn add_constraint(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
    }

    pub fn extend_constraints(&mut self, constraints: impl IntoIterator<Item = Constraint>) {
        self.constraints.extend(constraints);
    }

    pub fn set_objective(&mut self, objective: LinearExpr) {
        self.objective = objective.compact();
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn variable(&self, id: VarId) -> &Variable {
        &self.variables[id]
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn num_integral(&self) -> usize {
        self.variables
            .iter()
            .filter(|variable| variable.is_integral())
            .count()
    }

    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.objective.evaluate(values)
    }

    /// Largest bound, integrality or constraint violation of `values`.
    pub fn max_violation(&self, values: &[f64]) -> f64 {
        let bounds = self
            .variables
            .iter()
            .zip(values)
            .map(|(variable, &value)| {
                let outside = (variable.lower() - value).max(value - variable.upper()).max(0.0);
                let fractional = if variable.kind() == VarKind::Continuous {
                    0.0
                } else {
                    (value - value.round()).abs()
                };
                outside.max(fractional)
            })
            .fold(0.0, f64::max);

        self.constraints
            .iter()
            .map(|constraint| constraint.violation(values))
            .fold(bounds, f64::max)
    }

    pub(crate) fn log_size(&self) {
        debug!(
            model = %self.name,
            variables = self.variables.len(),
            integral = self.num_integral(),
            constraints = self.constraints.len(),
            "Model built"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_model() {
        let mut model = MilpModel::new("test");
        let x = model.add_binary("x");
        let y = model.add_continuous("y", 0.0, 10.0);

        model.add_constraint(Constraint::le(
            "c",
            LinearExpr::term(x, 5.0) - LinearExpr::term(y, 1.0),
            0.0,
        ));
        model.set_objective(LinearExpr::term(y, 1.0) + LinearExpr::constant(2.0));

        assert_eq!(model.num_variables(), 2);
        assert_eq!(model.num_integral(), 1);
        assert_eq!(model.objective_value(&[1.0, 5.0]), 7.0);
        assert_eq!(model.max_violation(&[1.0, 5.0]), 0.0);
        assert_eq!(model.max_violation(&[1.0, 3.0]), 2.0);
        assert_eq!(model.max_violation(&[0.5, 3.0]), 0.5);
    }
}

use thiserror::Error;

use crate::{
    extraction::extraction_error::ExtractionError,
    problem::validation::ValidationError,
    solver::{engine::TerminationReason, solve_error::SolveError},
};

/// Failure of an end-to-end optimization.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OptimizeError {
    #[error("invalid instance: {0}")]
    Validation(#[from] ValidationError),
    #[error("the model has no feasible solution")]
    InfeasibleModel,
    #[error("the {reason} was reached{}", incumbent_suffix(.incumbent_objective))]
    ResourceExhausted {
        reason: TerminationReason,
        incumbent_objective: Option<f64>,
    },
    #[error("the objective is unbounded")]
    Unbounded,
    #[error(transparent)]
    Solver(SolveError),
    #[error("solution extraction failed: {0}")]
    ExtractionMismatch(#[from] ExtractionError),
}

fn incumbent_suffix(objective: &Option<f64>) -> String {
    objective
        .map(|objective| format!(" with an unproven solution of cost {objective}"))
        .unwrap_or_default()
}

impl From<SolveError> for OptimizeError {
    fn from(error: SolveError) -> Self {
        match error {
            SolveError::Infeasible => OptimizeError::InfeasibleModel,
            SolveError::NoIncumbent { reason } => OptimizeError::ResourceExhausted {
                reason,
                incumbent_objective: None,
            },
            SolveError::Unbounded => OptimizeError::Unbounded,
            error => OptimizeError::Solver(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_solve_error() {
        assert_eq!(
            OptimizeError::from(SolveError::Infeasible),
            OptimizeError::InfeasibleModel
        );
        assert_eq!(
            OptimizeError::from(SolveError::NoIncumbent {
                reason: TerminationReason::NodeLimit
            }),
            OptimizeError::ResourceExhausted {
                reason: TerminationReason::NodeLimit,
                incumbent_objective: None
            }
        );
        assert!(matches!(
            OptimizeError::from(SolveError::Numerical("singular".into())),
            OptimizeError::Solver(_)
        ));
    }

    #[test]
    fn test_resource_exhausted_message() {
        let error = OptimizeError::ResourceExhausted {
            reason: TerminationReason::TimeLimit,
            incumbent_objective: Some(25.0),
        };

        assert_eq!(
            error.to_string(),
            "the time limit was reached with an unproven solution of cost 25"
        );
        assert_eq!(
            OptimizeError::ResourceExhausted {
                reason: TerminationReason::NodeLimit,
                incumbent_objective: None,
            }
            .to_string(),
            "the node limit was reached"
        );
    }
}

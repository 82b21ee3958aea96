use thiserror::Error;

use crate::solver::engine::TerminationReason;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SolveError {
    #[error("no assignment satisfies every constraint")]
    Infeasible,
    #[error("the {reason} was reached before any feasible solution was found")]
    NoIncumbent { reason: TerminationReason },
    #[error("the objective is unbounded")]
    Unbounded,
    #[error("unsupported model: {0}")]
    UnsupportedModel(String),
    #[error("numerical failure: {0}")]
    Numerical(String),
}

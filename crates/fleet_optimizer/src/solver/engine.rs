use std::fmt;

use serde::Serialize;

use crate::{
    model::{milp_model::MilpModel, variable::VarId},
    solver::{solve_error::SolveError, solve_params::SolveParams, statistics::SolveStatistics},
};

/// A mixed-integer solver. A solve is a single blocking call bounded by the terminations
/// of [`SolveParams`].
pub trait SolverEngine: Send + Sync {
    fn name(&self) -> &'static str;

    fn solve(&self, model: &MilpModel, params: &SolveParams) -> Result<SolverOutcome, SolveError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    TimeLimit,
    NodeLimit,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationReason::TimeLimit => write!(f, "time limit"),
            TerminationReason::NodeLimit => write!(f, "node limit"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    /// The search space was exhausted.
    Optimal,
    /// Best solution found before the budget ran out, optimality is not proven.
    Incumbent(TerminationReason),
}

impl SolveStatus {
    pub fn is_optimal(&self) -> bool {
        matches!(self, SolveStatus::Optimal)
    }
}

#[derive(Debug, Clone)]
pub struct SolverOutcome {
    pub status: SolveStatus,
    pub objective: f64,
    pub values: Vec<f64>,
    pub statistics: SolveStatistics,
}

impl SolverOutcome {
    #[inline]
    pub fn value(&self, var: VarId) -> f64 {
        self.values[var]
    }

    /// Binary variables are read as set above one half.
    #[inline]
    pub fn is_set(&self, var: VarId) -> bool {
        self.values[var] > 0.5
    }
}

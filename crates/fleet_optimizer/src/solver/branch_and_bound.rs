use jiff::{SignedDuration, Timestamp};
use tracing::{debug, info, instrument};

use crate::{
    model::{milp_model::MilpModel, variable::VarId},
    solver::{
        engine::{SolveStatus, SolverEngine, SolverOutcome, TerminationReason},
        presolve::propagate_bounds,
        simplex::{LpStatus, solve_relaxation},
        solve_error::SolveError,
        solve_params::SolveParams,
        statistics::SolveStatistics,
    },
};

const PROGRESS_LOG_INTERVAL: usize = 1000;

/// Depth-first branch-and-bound over the binary and integer variables, with bound
/// propagation and an LP relaxation at every node.
#[derive(Debug, Clone, Copy, Default)]
pub struct BranchAndBound;

struct SearchNode {
    lower: Vec<f64>,
    upper: Vec<f64>,
    depth: usize,
}

struct Incumbent {
    objective: f64,
    values: Vec<f64>,
}

struct Budget {
    started_at: Timestamp,
    time_limit: Option<SignedDuration>,
    node_limit: Option<usize>,
}

impl Budget {
    fn elapsed(&self) -> SignedDuration {
        Timestamp::now().duration_since(self.started_at)
    }

    fn exceeded(&self, nodes_explored: usize) -> Option<TerminationReason> {
        if self.node_limit.is_some_and(|limit| nodes_explored >= limit) {
            return Some(TerminationReason::NodeLimit);
        }

        if self.time_limit.is_some_and(|limit| self.elapsed() >= limit) {
            return Some(TerminationReason::TimeLimit);
        }

        None
    }
}

impl SolverEngine for BranchAndBound {
    fn name(&self) -> &'static str {
        "branch_and_bound"
    }

    #[instrument(skip_all, level = "debug", fields(model = model.name()))]
    fn solve(&self, model: &MilpModel, params: &SolveParams) -> Result<SolverOutcome, SolveError> {
        let budget = Budget {
            started_at: Timestamp::now(),
            time_limit: params.time_limit(),
            node_limit: params.node_limit(),
        };

        let root = root_node(model)?;
        let mut stack = vec![root];
        let mut incumbent: Option<Incumbent> = None;
        let mut statistics = SolveStatistics::default();
        let mut termination = None;

        while let Some(node) = stack.pop() {
            if let Some(reason) = budget.exceeded(statistics.nodes_explored) {
                termination = Some(reason);
                break;
            }

            statistics.nodes_explored += 1;
            statistics.max_depth = statistics.max_depth.max(node.depth);
            if statistics.nodes_explored % PROGRESS_LOG_INTERVAL == 0 {
                debug!(
                    nodes = statistics.nodes_explored,
                    open = stack.len(),
                    best = incumbent.as_ref().map(|incumbent| incumbent.objective),
                    "Branch and bound progress"
                );
            }

            let SearchNode {
                mut lower,
                mut upper,
                depth,
            } = node;

            if propagate_bounds(model, &mut lower, &mut upper, params.integrality_tolerance)
                .is_err()
            {
                statistics.nodes_pruned += 1;
                continue;
            }

            let relaxation = solve_relaxation(model, &lower, &upper)?;
            statistics.lp_iterations += relaxation.iterations;

            match relaxation.status {
                LpStatus::Infeasible => {
                    statistics.nodes_pruned += 1;
                    continue;
                }
                LpStatus::Unbounded => return Err(SolveError::Unbounded),
                LpStatus::Optimal => {}
            }

            if let Some(best) = &incumbent
                && relaxation.objective >= best.objective - params.absolute_gap
            {
                statistics.nodes_pruned += 1;
                continue;
            }

            match branching_variable(model, &relaxation.values, params.integrality_tolerance) {
                None => {
                    let values = round_integral(model, relaxation.values);
                    let objective = model.objective_value(&values);

                    if incumbent
                        .as_ref()
                        .is_none_or(|best| objective < best.objective - params.absolute_gap)
                    {
                        statistics.incumbent_updates += 1;
                        info!(
                            objective,
                            nodes = statistics.nodes_explored,
                            "New incumbent"
                        );
                        incumbent = Some(Incumbent { objective, values });
                    }
                }
                Some((var, value)) => {
                    let mut down_upper = upper.clone();
                    down_upper[var.get()] = value.floor();
                    let mut up_lower = lower.clone();
                    up_lower[var.get()] = value.ceil();

                    stack.push(SearchNode {
                        lower,
                        upper: down_upper,
                        depth: depth + 1,
                    });
                    stack.push(SearchNode {
                        lower: up_lower,
                        upper,
                        depth: depth + 1,
                    });
                }
            }
        }

        statistics.elapsed = budget.elapsed();

        let status = match termination {
            None => SolveStatus::Optimal,
            Some(reason) => SolveStatus::Incumbent(reason),
        };

        info!(
            ?status,
            nodes = statistics.nodes_explored,
            lp_iterations = statistics.lp_iterations,
            elapsed = %statistics.elapsed,
            found = incumbent.is_some(),
            "Branch and bound finished"
        );

        match (incumbent, termination) {
            (Some(incumbent), _) => Ok(SolverOutcome {
                status,
                objective: incumbent.objective,
                values: incumbent.values,
                statistics,
            }),
            (None, None) => Err(SolveError::Infeasible),
            (None, Some(reason)) => Err(SolveError::NoIncumbent { reason }),
        }
    }
}

fn root_node(model: &MilpModel) -> Result<SearchNode, SolveError> {
    let mut lower = Vec::with_capacity(model.num_variables());
    let mut upper = Vec::with_capacity(model.num_variables());

    for variable in model.variables() {
        if !variable.lower().is_finite() || variable.upper().is_nan() {
            return Err(SolveError::UnsupportedModel(format!(
                "variable {} needs a finite lower bound",
                variable.name()
            )));
        }

        let (mut low, mut high) = (variable.lower(), variable.upper());
        if variable.is_integral() {
            low = low.ceil();
            high = high.floor();
        }

        lower.push(low);
        upper.push(high);
    }

    Ok(SearchNode {
        lower,
        upper,
        depth: 0,
    })
}

/// Most fractional integral variable, `None` when the relaxation is integral.
fn branching_variable(model: &MilpModel, values: &[f64], tolerance: f64) -> Option<(VarId, f64)> {
    let mut best: Option<(VarId, f64)> = None;
    let mut best_fraction = tolerance;

    for (index, (variable, &value)) in model.variables().iter().zip(values).enumerate() {
        if !variable.is_integral() {
            continue;
        }

        let fraction = (value - value.round()).abs();
        if fraction > best_fraction {
            best_fraction = fraction;
            best = Some((VarId::new(index), value));
        }
    }

    best
}

fn round_integral(model: &MilpModel, mut values: Vec<f64>) -> Vec<f64> {
    for (variable, value) in model.variables().iter().zip(values.iter_mut()) {
        if variable.is_integral() {
            *value = value.round();
        }
    }
    values
}

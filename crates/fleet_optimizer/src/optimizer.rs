use tracing::{info, instrument, warn};

use crate::{
    builders::{energy_model::EnergyModel, routing_model::RoutingModel},
    error::OptimizeError,
    extraction::{
        energy_extractor::extract_energy_solution,
        routing_extractor::extract_routing_solution,
        solution::{EnergySolution, RoutingSolution},
    },
    model::milp_model::MilpModel,
    problem::problem_instance::ProblemInstance,
    solver::{
        branch_and_bound::BranchAndBound,
        engine::{SolveStatus, SolverEngine, SolverOutcome},
        solve_params::{SolveParams, Threads},
    },
};

#[derive(Clone, Debug)]
pub struct OptimizeParams {
    pub solve: SolveParams,
    /// When false, a solution whose optimality is not proven is reported as
    /// [`OptimizeError::ResourceExhausted`].
    pub accept_incumbent: bool,
    /// Relative tolerance of the objective cross-check done on extraction.
    pub objective_tolerance: f64,
    /// Threads used to build the constraint families.
    pub threads: Threads,
}

impl Default for OptimizeParams {
    fn default() -> Self {
        OptimizeParams {
            solve: SolveParams::default(),
            accept_incumbent: true,
            objective_tolerance: 1e-4,
            threads: Threads::Auto,
        }
    }
}

/// Builds a model from an instance, solves it and reads back the routes.
pub struct Optimizer<E: SolverEngine = BranchAndBound> {
    engine: E,
    params: OptimizeParams,
}

impl Optimizer<BranchAndBound> {
    pub fn new(params: OptimizeParams) -> Self {
        Optimizer {
            engine: BranchAndBound,
            params,
        }
    }
}

impl<E: SolverEngine> Optimizer<E> {
    pub fn with_engine(engine: E, params: OptimizeParams) -> Self {
        Optimizer { engine, params }
    }

    pub fn params(&self) -> &OptimizeParams {
        &self.params
    }

    /// Solves the time-indexed routing model.
    #[instrument(skip_all, level = "debug", fields(instance = instance.id()))]
    pub fn solve_routing(
        &self,
        instance: &ProblemInstance,
    ) -> Result<RoutingSolution, OptimizeError> {
        let routing = RoutingModel::build(instance, &self.params.threads);
        let outcome = self.solve_model(routing.model())?;

        Ok(extract_routing_solution(
            instance,
            &routing,
            &outcome,
            self.params.objective_tolerance,
        )?)
    }

    /// Solves the energy-constrained fleet-cost model.
    #[instrument(skip_all, level = "debug", fields(instance = instance.id()))]
    pub fn solve_energy(
        &self,
        instance: &ProblemInstance,
    ) -> Result<EnergySolution, OptimizeError> {
        let energy = EnergyModel::build(instance, &self.params.threads)?;
        let outcome = self.solve_model(energy.model())?;

        Ok(extract_energy_solution(
            instance,
            &energy,
            &outcome,
            self.params.objective_tolerance,
        )?)
    }

    fn solve_model(&self, model: &MilpModel) -> Result<SolverOutcome, OptimizeError> {
        info!(
            engine = self.engine.name(),
            model = model.name(),
            variables = model.num_variables(),
            constraints = model.num_constraints(),
            "Solving"
        );

        let outcome = self.engine.solve(model, &self.params.solve)?;

        match outcome.status {
            SolveStatus::Optimal => {
                info!(objective = outcome.objective, "Optimal solution found");
            }
            SolveStatus::Incumbent(reason) if !self.params.accept_incumbent => {
                return Err(OptimizeError::ResourceExhausted {
                    reason,
                    incumbent_objective: Some(outcome.objective),
                });
            }
            SolveStatus::Incumbent(reason) => {
                warn!(
                    objective = outcome.objective,
                    %reason,
                    "Optimality not proven, keeping the best solution found"
                );
            }
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        solver::{
            engine::TerminationReason, solve_error::SolveError, statistics::SolveStatistics,
        },
        test_utils::{self, TestInstance},
    };

    /// Reports every variable at zero with a fixed status.
    struct FixedEngine {
        status: SolveStatus,
        objective: f64,
    }

    impl SolverEngine for FixedEngine {
        fn name(&self) -> &'static str {
            "fixed"
        }

        fn solve(&self, model: &MilpModel, _: &SolveParams) -> Result<SolverOutcome, SolveError> {
            Ok(SolverOutcome {
                status: self.status,
                objective: self.objective,
                values: vec![0.0; model.num_variables()],
                statistics: SolveStatistics::default(),
            })
        }
    }

    struct FailingEngine(SolveError);

    impl SolverEngine for FailingEngine {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn solve(&self, _: &MilpModel, _: &SolveParams) -> Result<SolverOutcome, SolveError> {
            Err(self.0.clone())
        }
    }

    #[test]
    fn test_rejects_incumbent_when_strict() {
        let instance = test_utils::create_instance(TestInstance::default());
        let optimizer = Optimizer::with_engine(
            FixedEngine {
                status: SolveStatus::Incumbent(TerminationReason::TimeLimit),
                objective: 10.0,
            },
            OptimizeParams {
                accept_incumbent: false,
                threads: Threads::Single,
                ..OptimizeParams::default()
            },
        );

        assert_eq!(
            optimizer.solve_routing(&instance).unwrap_err(),
            OptimizeError::ResourceExhausted {
                reason: TerminationReason::TimeLimit,
                incumbent_objective: Some(10.0)
            }
        );
    }

    #[test]
    fn test_maps_solver_errors() {
        let instance = test_utils::create_instance(TestInstance::default());
        let optimizer = Optimizer::with_engine(
            FailingEngine(SolveError::Infeasible),
            OptimizeParams::default(),
        );

        assert_eq!(
            optimizer.solve_routing(&instance).unwrap_err(),
            OptimizeError::InfeasibleModel
        );
    }

    #[test]
    fn test_extraction_failure_is_fatal() {
        let instance = test_utils::create_instance(TestInstance::default());
        // No arc is used although the vehicle must leave the depot, the routes are empty
        // and cost nothing while the solver claims 10.
        let optimizer = Optimizer::with_engine(
            FixedEngine {
                status: SolveStatus::Optimal,
                objective: 10.0,
            },
            OptimizeParams::default(),
        );

        assert!(matches!(
            optimizer.solve_routing(&instance).unwrap_err(),
            OptimizeError::ExtractionMismatch(_)
        ));
    }

    #[test]
    fn test_energy_requires_parameters() {
        let instance = test_utils::create_instance(TestInstance::default());
        let optimizer = Optimizer::new(OptimizeParams::default());

        assert!(matches!(
            optimizer.solve_energy(&instance).unwrap_err(),
            OptimizeError::Validation(_)
        ));
    }

    #[test]
    fn test_solve_routing() {
        let instance = test_utils::create_instance(TestInstance {
            demands: vec![0, 10, -5],
            ..TestInstance::default()
        });
        let optimizer = Optimizer::new(OptimizeParams {
            threads: Threads::Single,
            ..OptimizeParams::default()
        });

        let solution = optimizer.solve_routing(&instance).unwrap();

        assert!(solution.status().is_optimal());
        assert!((solution.objective() - 15.0).abs() < 1e-6);
        assert!((solution.total_time() - 22.5).abs() < 1e-6);
        assert!(solution.verify(&instance).is_empty());
    }
}

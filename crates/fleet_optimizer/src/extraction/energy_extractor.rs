use tracing::{debug, info, instrument};

use crate::{
    builders::energy_model::EnergyModel,
    extraction::{
        chain_arcs, check_objective,
        extraction_error::ExtractionError,
        route::{EnergyArc, EnergyRoute},
        solution::{CostBreakdown, EnergySolution},
    },
    problem::{energy::DistanceCostMode, node::NodeIdx, problem_instance::ProblemInstance},
    solver::engine::SolverOutcome,
};

/// Reads the route, load flows and energy budget of every vehicle.
#[instrument(skip_all, level = "debug")]
pub fn extract_energy_solution(
    instance: &ProblemInstance,
    energy: &EnergyModel,
    outcome: &SolverOutcome,
    objective_tolerance: f64,
) -> Result<EnergySolution, ExtractionError> {
    let variables = energy.variables();
    let parameters = energy.parameters();

    let routes = instance
        .fleet()
        .vehicles()
        .map(|vehicle| {
            let used: Vec<(NodeIdx, NodeIdx, f64)> = variables
                .vehicle_arcs(vehicle)
                .filter(|(_, _, arc, _)| outcome.is_set(*arc))
                .map(|(from, to, _, flow)| (from, to, outcome.value(flow)))
                .collect();

            let arcs = chain_arcs(vehicle, instance.num_nodes(), &used)?
                .into_iter()
                .map(|(from, to, load)| EnergyArc {
                    from,
                    to,
                    load,
                    distance: instance.travel_distance(from, to),
                    energy: parameters.base_consumption(from, to)
                        + parameters.load_consumption(from, to) * load,
                })
                .collect();

            Ok(EnergyRoute::new(
                vehicle,
                arcs,
                outcome.value(variables.peak_energy(vehicle)),
            ))
        })
        .collect::<Result<Vec<EnergyRoute>, ExtractionError>>()?;

    let active = routes.iter().filter(|route| route.is_active()).count();
    let distance = match parameters.distance_cost_mode() {
        DistanceCostMode::AllArcs => energy.distance_offset(),
        DistanceCostMode::UsedArcs => {
            parameters.distance_cost() * routes.iter().map(EnergyRoute::distance).sum::<f64>()
        }
    };
    let costs = CostBreakdown {
        fixed: parameters.vehicle_fixed_cost() * active as f64,
        distance,
        energy: parameters.energy_cost() * routes.iter().map(EnergyRoute::peak_energy).sum::<f64>(),
    };
    check_objective(outcome.objective, costs.total(), objective_tolerance)?;

    for route in routes.iter().filter(|route| route.is_active()) {
        debug!(
            vehicle = %route.vehicle(),
            nodes = ?route.nodes(),
            energy = route.energy_draw(),
            peak = route.peak_energy(),
            "route"
        );
    }

    let solution = EnergySolution::new(
        routes,
        outcome.objective,
        costs,
        outcome.status,
        outcome.statistics.clone(),
    );
    info!(
        objective = outcome.objective,
        active_vehicles = active,
        unused_vehicles = ?solution.unused_vehicles(),
        "energy solution extracted"
    );

    Ok(solution)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::variable::VarId,
        problem::{fleet::VehicleIdx, node::DEPOT},
        solver::{engine::SolveStatus, solve_params::Threads, statistics::SolveStatistics},
        test_utils::{self, TestEnergy, TestInstance},
    };

    fn energy_instance() -> ProblemInstance {
        test_utils::create_instance(TestInstance {
            demands: vec![0, 10, -4],
            num_vehicles: 2,
            distance: 3.0,
            energy: Some(TestEnergy {
                battery_capacity: 100.0,
                base_consumption: 2.0,
                load_consumption: 0.5,
            }),
            ..TestInstance::default()
        })
    }

    fn outcome_with(energy: &EnergyModel, set: &[(VarId, f64)], objective: f64) -> SolverOutcome {
        let mut values = vec![0.0; energy.model().num_variables()];
        for &(var, value) in set {
            values[var] = value;
        }
        SolverOutcome {
            status: SolveStatus::Optimal,
            objective,
            values,
            statistics: SolveStatistics::default(),
        }
    }

    #[test]
    fn test_extract_energy_routes() {
        let instance = energy_instance();
        let energy = EnergyModel::build(&instance, &Threads::Single).unwrap();
        let variables = energy.variables();
        let vehicle = VehicleIdx::new(0);
        let n1 = NodeIdx::new(1);
        let n2 = NodeIdx::new(2);

        let arc = |from, to| variables.arc(from, to, vehicle).unwrap();
        let flow = |from, to| variables.flow(from, to, vehicle).unwrap();

        // 0 -> 1 -> 2 -> 0, delivering 10 units at 1 and collecting 4 at 2.
        // Energy: (2 + 0.5 * 10) + (2 + 0) + (2 + 0.5 * 4) = 13.
        // Objective: fixed 1 + all arcs 2 vehicles * 6 arcs * 3 + energy 13 = 50.
        let outcome = outcome_with(
            &energy,
            &[
                (arc(DEPOT, n1), 1.0),
                (arc(n1, n2), 1.0),
                (arc(n2, DEPOT), 1.0),
                (flow(DEPOT, n1), 10.0),
                (flow(n1, n2), 0.0),
                (flow(n2, DEPOT), 4.0),
                (variables.peak_energy(vehicle), 13.0),
            ],
            50.0,
        );

        let solution = extract_energy_solution(&instance, &energy, &outcome, 1e-6).unwrap();

        assert_eq!(solution.routes()[0].nodes(), vec![DEPOT, n1, n2, DEPOT]);
        assert_eq!(solution.routes()[0].energy_draw(), 13.0);
        assert_eq!(solution.unused_vehicles(), &[VehicleIdx::new(1)]);
        assert_eq!(
            solution.costs(),
            CostBreakdown {
                fixed: 1.0,
                distance: 36.0,
                energy: 13.0
            }
        );
    }

    #[test]
    fn test_energy_objective_mismatch() {
        let instance = energy_instance();
        let energy = EnergyModel::build(&instance, &Threads::Single).unwrap();
        let outcome = outcome_with(&energy, &[], 1.0);

        let error = extract_energy_solution(&instance, &energy, &outcome, 1e-6).unwrap_err();

        assert_eq!(
            error,
            ExtractionError::ObjectiveMismatch {
                reported: 1.0,
                recomputed: 36.0
            }
        );
    }
}

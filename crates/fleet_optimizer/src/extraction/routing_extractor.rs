use tracing::{debug, info, instrument};

use crate::{
    builders::routing_model::{RoutingModel, RoutingVariables},
    extraction::{
        chain_arcs, check_objective,
        extraction_error::ExtractionError,
        route::{Route, Stop},
        solution::RoutingSolution,
    },
    problem::{
        fleet::VehicleIdx,
        node::{DEPOT, NodeIdx},
        periods::PeriodIdx,
        problem_instance::ProblemInstance,
    },
    solver::engine::SolverOutcome,
};

/// Reads the routes of every vehicle from the arc, arrival and load variables.
#[instrument(skip_all, level = "debug")]
pub fn extract_routing_solution(
    instance: &ProblemInstance,
    routing: &RoutingModel,
    outcome: &SolverOutcome,
    objective_tolerance: f64,
) -> Result<RoutingSolution, ExtractionError> {
    let variables = routing.variables();

    let routes = instance
        .fleet()
        .vehicles()
        .map(|vehicle| {
            let used: Vec<(NodeIdx, NodeIdx, PeriodIdx)> = variables
                .vehicle_arcs(vehicle)
                .filter(|(_, var)| outcome.is_set(*var))
                .map(|(arc, _)| (arc.from, arc.to, arc.period))
                .collect();

            let chain = chain_arcs(vehicle, instance.num_nodes(), &used)?;
            Ok(build_route(instance, variables, outcome, vehicle, &chain))
        })
        .collect::<Result<Vec<Route>, ExtractionError>>()?;

    let travel_time: f64 = routes.iter().map(Route::travel_time).sum();
    check_objective(outcome.objective, travel_time, objective_tolerance)?;

    for route in routes.iter() {
        debug!(
            vehicle = %route.vehicle(),
            customers = ?route.customers().collect::<Vec<_>>(),
            travel_time = route.travel_time(),
            "route"
        );
    }
    info!(
        objective = outcome.objective,
        handling_time = routing.handling_time(),
        "routing solution extracted"
    );

    Ok(RoutingSolution::new(
        routes,
        outcome.objective,
        routing.handling_time(),
        outcome.status,
        outcome.statistics.clone(),
    ))
}

fn build_route(
    instance: &ProblemInstance,
    variables: &RoutingVariables,
    outcome: &SolverOutcome,
    vehicle: VehicleIdx,
    chain: &[(NodeIdx, NodeIdx, PeriodIdx)],
) -> Route {
    let Some(&(_, _, first_period)) = chain.first() else {
        return Route::new(vehicle, vec![], 0.0);
    };

    let mut stops = Vec::with_capacity(chain.len() + 1);
    stops.push(Stop {
        node: DEPOT,
        period: first_period,
        arrival: outcome.value(variables.arrival(DEPOT, vehicle)),
        load: outcome.value(variables.load(DEPOT, vehicle)),
    });

    let mut travel_time = 0.0;
    for &(from, to, period) in chain {
        travel_time += instance.travel_time(period, from, to);

        let stop = if to == DEPOT {
            Stop {
                node: DEPOT,
                period,
                arrival: outcome.value(variables.depot_return(vehicle)),
                load: outcome.value(variables.load(from, vehicle)),
            }
        } else {
            Stop {
                node: to,
                period,
                arrival: outcome.value(variables.arrival(to, vehicle)),
                load: outcome.value(variables.load(to, vehicle)),
            }
        };
        stops.push(stop);
    }

    Route::new(vehicle, stops, travel_time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::variable::VarId,
        solver::{engine::SolveStatus, solve_params::Threads, statistics::SolveStatistics},
        test_utils::{self, TestInstance},
    };

    fn outcome_with(routing: &RoutingModel, set: &[(VarId, f64)], objective: f64) -> SolverOutcome {
        let mut values = vec![0.0; routing.model().num_variables()];
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
    fn test_extract_single_route() {
        let instance = test_utils::create_instance(TestInstance {
            demands: vec![0, 10, -5],
            ..TestInstance::default()
        });
        let routing = RoutingModel::build(&instance, &Threads::Single);
        let variables = routing.variables();
        let vehicle = VehicleIdx::new(0);
        let period = PeriodIdx::new(0);
        let n1 = NodeIdx::new(1);
        let n2 = NodeIdx::new(2);

        let arc = |from, to| variables.arc(from, to, period, vehicle).unwrap();
        let outcome = outcome_with(
            &routing,
            &[
                (arc(DEPOT, n2), 1.0),
                (arc(n2, n1), 1.0),
                (arc(n1, DEPOT), 1.0),
                (variables.arrival(DEPOT, vehicle), 480.0),
                (variables.arrival(n2, vehicle), 487.5),
                (variables.arrival(n1, vehicle), 497.5),
                (variables.depot_return(vehicle), 502.5),
                (variables.load(DEPOT, vehicle), 5.0),
                (variables.load(n2, vehicle), 0.0),
                (variables.load(n1, vehicle), 10.0),
            ],
            15.0,
        );

        let solution = extract_routing_solution(&instance, &routing, &outcome, 1e-6).unwrap();
        let route = &solution.routes()[0];

        assert_eq!(route.customers().collect::<Vec<_>>(), vec![n2, n1]);
        assert_eq!(route.travel_time(), 15.0);
        assert_eq!(route.stops().len(), 4);
        assert_eq!(route.stops()[3].load, 10.0);
        assert_eq!(route.duration(), 22.5);
        assert_eq!(solution.total_time(), 22.5);
    }

    #[test]
    fn test_objective_mismatch() {
        let instance = test_utils::create_instance(TestInstance::default());
        let routing = RoutingModel::build(&instance, &Threads::Single);
        let variables = routing.variables();
        let vehicle = VehicleIdx::new(0);
        let period = PeriodIdx::new(0);
        let n1 = NodeIdx::new(1);

        let outcome = outcome_with(
            &routing,
            &[
                (variables.arc(DEPOT, n1, period, vehicle).unwrap(), 1.0),
                (variables.arc(n1, DEPOT, period, vehicle).unwrap(), 1.0),
            ],
            42.0,
        );

        let error = extract_routing_solution(&instance, &routing, &outcome, 1e-6).unwrap_err();
        assert_eq!(
            error,
            ExtractionError::ObjectiveMismatch {
                reported: 42.0,
                recomputed: 10.0
            }
        );
    }
}

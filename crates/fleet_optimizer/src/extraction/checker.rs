//! Independent checks of extracted solutions against the instance they solve.
//!
//! The checks do not look at the model, a violation means the model or the solver is wrong.

use fixedbitset::FixedBitSet;
use thiserror::Error;

use crate::{
    builders::energy_model::max_arc_load,
    extraction::{
        route::Route,
        solution::{EnergySolution, RoutingSolution},
    },
    problem::{
        fleet::VehicleIdx,
        node::{DEPOT, NodeIdx},
        periods::PeriodIdx,
        problem_instance::ProblemInstance,
    },
};

const TOLERANCE: f64 = 1e-5;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Violation {
    #[error("customer {0} is not visited")]
    CustomerNotVisited(NodeIdx),
    #[error("customer {0} is visited more than once")]
    CustomerVisitedTwice(NodeIdx),
    #[error("vehicle {0} is not dispatched")]
    VehicleNotDispatched(VehicleIdx),
    #[error("route of vehicle {0} does not start and end at the depot")]
    RouteNotAnchoredAtDepot(VehicleIdx),
    #[error("vehicle {vehicle} arrives at {node} at {arrival}, outside of its time window")]
    ArrivalOutsideTimeWindow {
        vehicle: VehicleIdx,
        node: NodeIdx,
        arrival: f64,
    },
    #[error("vehicle {vehicle} is at {node} at {time}, outside of period {period}")]
    ArrivalOutsidePeriod {
        vehicle: VehicleIdx,
        node: NodeIdx,
        period: PeriodIdx,
        time: f64,
    },
    #[error("vehicle {vehicle} reaches {node} at {arrival}, expected at least {expected}")]
    ArrivalTooEarly {
        vehicle: VehicleIdx,
        node: NodeIdx,
        arrival: f64,
        expected: f64,
    },
    #[error("vehicle {vehicle} carries {load} after {node}, outside of [0, {capacity}]")]
    LoadOutOfRange {
        vehicle: VehicleIdx,
        node: NodeIdx,
        load: f64,
        capacity: f64,
    },
    #[error("vehicle {vehicle} carries {found} after {node}, expected {expected}")]
    LoadInconsistent {
        vehicle: VehicleIdx,
        node: NodeIdx,
        expected: f64,
        found: f64,
    },
    #[error("shift of vehicle {vehicle} lasts {duration} minutes, at most {max} allowed")]
    ShiftTooLong {
        vehicle: VehicleIdx,
        duration: f64,
        max: f64,
    },
    #[error("vehicle {vehicle} draws {energy}, above its budget {budget}")]
    EnergyAboveBudget {
        vehicle: VehicleIdx,
        energy: f64,
        budget: f64,
    },
    #[error("vehicle {vehicle} needs {energy}, above the battery capacity {battery}")]
    BatteryExceeded {
        vehicle: VehicleIdx,
        energy: f64,
        battery: f64,
    },
}

fn exceeds(value: f64, limit: f64) -> bool {
    value > limit + TOLERANCE * limit.abs().max(1.0)
}

fn differs(a: f64, b: f64) -> bool {
    (a - b).abs() > TOLERANCE * a.abs().max(b.abs()).max(1.0)
}

/// Every customer is visited exactly once across the given customer sequences.
fn check_coverage(
    instance: &ProblemInstance,
    visits: impl Iterator<Item = NodeIdx>,
    violations: &mut Vec<Violation>,
) {
    let mut visited = FixedBitSet::with_capacity(instance.num_nodes());
    let mut reported = FixedBitSet::with_capacity(instance.num_nodes());

    for node in visits {
        if visited.contains(node.get()) {
            if !reported.contains(node.get()) {
                violations.push(Violation::CustomerVisitedTwice(node));
                reported.insert(node.get());
            }
        } else {
            visited.insert(node.get());
        }
    }

    violations.extend(
        instance
            .customers()
            .filter(|customer| !visited.contains(customer.get()))
            .map(Violation::CustomerNotVisited),
    );
}

pub fn verify_routing_solution(
    instance: &ProblemInstance,
    solution: &RoutingSolution,
) -> Vec<Violation> {
    let mut violations = Vec::new();

    check_coverage(
        instance,
        solution.routes().iter().flat_map(|route| route.customers()),
        &mut violations,
    );

    for route in solution.routes() {
        check_route(instance, route, &mut violations);
    }

    violations
}

fn check_route(instance: &ProblemInstance, route: &Route, violations: &mut Vec<Violation>) {
    let vehicle = route.vehicle();
    let stops = route.stops();
    let periods = instance.periods();
    let capacity = instance.fleet().capacity();

    if stops.is_empty() {
        violations.push(Violation::VehicleNotDispatched(vehicle));
        return;
    }

    let anchored = stops.len() >= 2
        && stops.first().is_some_and(|stop| stop.node == DEPOT)
        && stops.last().is_some_and(|stop| stop.node == DEPOT);
    if !anchored {
        violations.push(Violation::RouteNotAnchoredAtDepot(vehicle));
        return;
    }

    // The depot is left no earlier than the start of the period of its outgoing arc.
    let first = &stops[0];
    if first.arrival < periods.start(first.period) - TOLERANCE {
        violations.push(Violation::ArrivalOutsidePeriod {
            vehicle,
            node: DEPOT,
            period: first.period,
            time: first.arrival,
        });
    }

    for (index, pair) in stops.windows(2).enumerate() {
        let (previous, stop) = (&pair[0], &pair[1]);
        let is_return = index + 2 == stops.len();

        // The previous node is left during the period of the arc.
        if index > 0 && !periods.contains(stop.period, previous.arrival, TOLERANCE) {
            violations.push(Violation::ArrivalOutsidePeriod {
                vehicle,
                node: previous.node,
                period: stop.period,
                time: previous.arrival,
            });
        }

        let expected = previous.arrival
            + instance.travel_time(stop.period, previous.node, stop.node)
            + if is_return {
                0.0
            } else {
                instance.handling_time(stop.node)
            };
        if exceeds(expected, stop.arrival) {
            violations.push(Violation::ArrivalTooEarly {
                vehicle,
                node: stop.node,
                arrival: stop.arrival,
                expected,
            });
        }

        if is_return {
            if differs(stop.load, previous.load) {
                violations.push(Violation::LoadInconsistent {
                    vehicle,
                    node: stop.node,
                    expected: previous.load,
                    found: stop.load,
                });
            }
            continue;
        }

        if let Some(time_window) = instance.node(stop.node).time_window()
            && !time_window.contains(stop.arrival, TOLERANCE)
        {
            violations.push(Violation::ArrivalOutsideTimeWindow {
                vehicle,
                node: stop.node,
                arrival: stop.arrival,
            });
        }

        if index > 0 && !periods.contains(stop.period, stop.arrival, TOLERANCE) {
            violations.push(Violation::ArrivalOutsidePeriod {
                vehicle,
                node: stop.node,
                period: stop.period,
                time: stop.arrival,
            });
        }

        let expected_load = previous.load + instance.demand(stop.node);
        if differs(stop.load, expected_load) {
            violations.push(Violation::LoadInconsistent {
                vehicle,
                node: stop.node,
                expected: expected_load,
                found: stop.load,
            });
        }
    }

    for stop in stops.iter() {
        if stop.load < -TOLERANCE || exceeds(stop.load, capacity) {
            violations.push(Violation::LoadOutOfRange {
                vehicle,
                node: stop.node,
                load: stop.load,
                capacity,
            });
        }
    }

    let max_shift = instance.fleet().max_shift_minutes();
    if exceeds(route.duration(), max_shift) {
        violations.push(Violation::ShiftTooLong {
            vehicle,
            duration: route.duration(),
            max: max_shift,
        });
    }
}

pub fn verify_energy_solution(
    instance: &ProblemInstance,
    solution: &EnergySolution,
) -> Vec<Violation> {
    let mut violations = Vec::new();
    let capacity = instance.fleet().capacity();
    let battery = instance.fleet().battery_capacity().unwrap_or(f64::INFINITY);

    check_coverage(
        instance,
        solution.routes().iter().flat_map(|route| route.customers()),
        &mut violations,
    );

    for route in solution.active_routes() {
        let vehicle = route.vehicle();
        let arcs = route.arcs();

        let anchored = arcs.first().is_some_and(|arc| arc.from == DEPOT)
            && arcs.last().is_some_and(|arc| arc.to == DEPOT);
        if !anchored {
            violations.push(Violation::RouteNotAnchoredAtDepot(vehicle));
            continue;
        }

        for arc in arcs {
            let upper = max_arc_load(capacity, instance.demand(arc.from));
            if arc.load < -TOLERANCE || exceeds(arc.load, upper) {
                violations.push(Violation::LoadOutOfRange {
                    vehicle,
                    node: arc.from,
                    load: arc.load,
                    capacity: upper,
                });
            }
        }

        for pair in arcs.windows(2) {
            let (incoming, outgoing) = (&pair[0], &pair[1]);
            let customer = incoming.to;
            let expected = incoming.load - instance.demand(customer);
            if differs(outgoing.load, expected) {
                violations.push(Violation::LoadInconsistent {
                    vehicle,
                    node: customer,
                    expected,
                    found: outgoing.load,
                });
            }
        }

        if exceeds(route.energy_draw(), route.peak_energy()) {
            violations.push(Violation::EnergyAboveBudget {
                vehicle,
                energy: route.energy_draw(),
                budget: route.peak_energy(),
            });
        }
        if exceeds(route.energy_draw(), battery) {
            violations.push(Violation::BatteryExceeded {
                vehicle,
                energy: route.energy_draw(),
                battery,
            });
        }
    }

    violations
}

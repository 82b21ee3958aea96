use tracing::{instrument, warn};

use crate::{
    builders::{
        ConstraintFamily,
        big_m::{Bounds, lower_difference_m, upper_difference_m, upper_limit_m},
        build_constraint_families,
    },
    model::{
        constraint::Constraint, expression::LinearExpr, milp_model::MilpModel, variable::VarId,
    },
    problem::{
        fleet::VehicleIdx,
        node::{DEPOT, NodeIdx},
        periods::PeriodIdx,
        problem_instance::ProblemInstance,
    },
    solver::solve_params::Threads,
    timer_debug,
};

/// An arc traversed by a vehicle, departing during a period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RoutingArc {
    pub from: NodeIdx,
    pub to: NodeIdx,
    pub period: PeriodIdx,
    pub vehicle: VehicleIdx,
}

/// Variables of the time-indexed model.
///
/// - `x[i,j,t,k]`: binary, vehicle `k` travels `(i, j)` leaving during period `t`. Only
///   created for reachable arcs.
/// - `T[i,k]`: arrival time of vehicle `k` at node `i`, the departure time for the depot.
///   An extra slot per vehicle holds the time it gets back to the depot.
/// - `C[i,k]`: load of vehicle `k` when leaving node `i`.
#[derive(Debug, Clone)]
pub struct RoutingVariables {
    num_nodes: usize,
    num_periods: usize,
    num_vehicles: usize,
    arcs: Vec<Option<VarId>>,
    arrivals: Vec<VarId>,
    loads: Vec<VarId>,
}

impl RoutingVariables {
    #[inline]
    fn arc_index(
        &self,
        from: NodeIdx,
        to: NodeIdx,
        period: PeriodIdx,
        vehicle: VehicleIdx,
    ) -> usize {
        ((vehicle.get() * self.num_periods + period.get()) * self.num_nodes + from.get())
            * self.num_nodes
            + to.get()
    }

    #[inline]
    pub fn arc(
        &self,
        from: NodeIdx,
        to: NodeIdx,
        period: PeriodIdx,
        vehicle: VehicleIdx,
    ) -> Option<VarId> {
        self.arcs[self.arc_index(from, to, period, vehicle)]
    }

    #[inline]
    pub fn arrival(&self, node: NodeIdx, vehicle: VehicleIdx) -> VarId {
        self.arrivals[vehicle.get() * (self.num_nodes + 1) + node.get()]
    }

    #[inline]
    pub fn depot_return(&self, vehicle: VehicleIdx) -> VarId {
        self.arrivals[vehicle.get() * (self.num_nodes + 1) + self.num_nodes]
    }

    #[inline]
    pub fn load(&self, node: NodeIdx, vehicle: VehicleIdx) -> VarId {
        self.loads[vehicle.get() * self.num_nodes + node.get()]
    }

    pub fn num_arcs(&self) -> usize {
        self.arcs.iter().flatten().count()
    }

    pub fn num_vehicles(&self) -> usize {
        self.num_vehicles
    }

    /// Every arc variable of a vehicle.
    pub fn vehicle_arcs(&self, vehicle: VehicleIdx) -> impl Iterator<Item = (RoutingArc, VarId)> {
        PeriodIdx::range(self.num_periods).flat_map(move |period| {
            NodeIdx::range(self.num_nodes).flat_map(move |from| {
                NodeIdx::range(self.num_nodes).filter_map(move |to| {
                    self.arc(from, to, period, vehicle).map(|var| {
                        (
                            RoutingArc {
                                from,
                                to,
                                period,
                                vehicle,
                            },
                            var,
                        )
                    })
                })
            })
        })
    }

    fn arcs_out_of(
        &self,
        from: NodeIdx,
        period: PeriodIdx,
        vehicle: VehicleIdx,
    ) -> impl Iterator<Item = VarId> {
        NodeIdx::range(self.num_nodes).filter_map(move |to| self.arc(from, to, period, vehicle))
    }

    fn arcs_into(
        &self,
        to: NodeIdx,
        period: PeriodIdx,
        vehicle: VehicleIdx,
    ) -> impl Iterator<Item = VarId> {
        NodeIdx::range(self.num_nodes).filter_map(move |from| self.arc(from, to, period, vehicle))
    }

    /// `x[from,to,t,k]` over every period.
    fn arcs_between(
        &self,
        from: NodeIdx,
        to: NodeIdx,
        vehicle: VehicleIdx,
    ) -> impl Iterator<Item = VarId> {
        PeriodIdx::range(self.num_periods)
            .filter_map(move |period| self.arc(from, to, period, vehicle))
    }
}

/// The time-indexed capacitated vehicle routing model with time windows.
///
/// Its objective is the total travel time. Loading and unloading time does not depend on
/// the routes and is kept aside as [`RoutingModel::handling_time`].
#[derive(Debug, Clone)]
pub struct RoutingModel {
    model: MilpModel,
    variables: RoutingVariables,
    handling_time: f64,
}

impl RoutingModel {
    #[instrument(skip_all, level = "debug")]
    pub fn build(instance: &ProblemInstance, threads: &Threads) -> RoutingModel {
        timer_debug!("build routing model", {
            let mut model = MilpModel::new("time_indexed_cvrptw");
            let variables = create_variables(instance, &mut model);

            let context = RoutingContext {
                instance,
                variables: &variables,
                model: &model,
            };
            let families: &[(&'static str, ConstraintFamily<RoutingContext>)] = &[
                ("depot_departure", depot_departure),
                ("depot_return", depot_return),
                ("customer_visit", customer_visit),
                ("flow_conservation", flow_conservation),
                ("arrival_period", arrival_period),
                ("departure_period", departure_period),
                ("arc_time", arc_time),
                ("return_time", return_time),
                ("shift_duration", shift_duration),
                ("load_propagation", load_propagation),
                ("depot_load", depot_load),
            ];
            let constraints = build_constraint_families(&context, families, threads);

            model.extend_constraints(constraints);
            model.set_objective(travel_time_objective(instance, &variables));
            model.log_size();

            RoutingModel {
                model,
                variables,
                handling_time: instance.total_handling_time(),
            }
        })
    }

    pub fn model(&self) -> &MilpModel {
        &self.model
    }

    pub fn variables(&self) -> &RoutingVariables {
        &self.variables
    }

    /// Constant loading and unloading time to add to the objective.
    pub fn handling_time(&self) -> f64 {
        self.handling_time
    }
}

fn create_variables(instance: &ProblemInstance, model: &mut MilpModel) -> RoutingVariables {
    let num_nodes = instance.num_nodes();
    let num_periods = instance.num_periods();
    let fleet = instance.fleet();
    let periods = instance.periods();
    let horizon_start = periods.horizon_start();
    let horizon_end = periods.horizon_end();
    let latest_return = horizon_end + instance.matrices().max_finite_time_to(DEPOT);
    let capacity = fleet.capacity();

    let mut arcs = vec![None; fleet.num_vehicles() * num_periods * num_nodes * num_nodes];
    let mut arrivals = Vec::with_capacity(fleet.num_vehicles() * (num_nodes + 1));
    let mut loads = Vec::with_capacity(fleet.num_vehicles() * num_nodes);

    for vehicle in fleet.vehicles() {
        for period in periods.periods() {
            for from in instance.node_indices() {
                for to in instance.node_indices() {
                    if instance.matrices().is_reachable(period, from, to) {
                        let index = ((vehicle.get() * num_periods + period.get()) * num_nodes
                            + from.get())
                            * num_nodes
                            + to.get();
                        arcs[index] =
                            Some(model.add_binary(format!("x[{from},{to},{period},{vehicle}]")));
                    }
                }
            }
        }

        for node in instance.node_indices() {
            let (lower, upper) = match instance.node(node).time_window() {
                Some(time_window) => (
                    time_window.earliest().max(horizon_start),
                    time_window.latest().min(horizon_end),
                ),
                None => (horizon_start, horizon_end),
            };

            if lower > upper && vehicle.get() == 0 {
                warn!(%node, "Time window does not intersect the planning horizon");
            }

            arrivals.push(model.add_continuous(format!("T[{node},{vehicle}]"), lower, upper));
        }
        arrivals.push(model.add_continuous(
            format!("T[return,{vehicle}]"),
            horizon_start,
            latest_return,
        ));

        for node in instance.node_indices() {
            let demand = instance.demand(node);
            loads.push(model.add_continuous(
                format!("C[{node},{vehicle}]"),
                demand.max(0.0),
                capacity.min(capacity + demand),
            ));
        }
    }

    RoutingVariables {
        num_nodes,
        num_periods,
        num_vehicles: fleet.num_vehicles(),
        arcs,
        arrivals,
        loads,
    }
}

fn travel_time_objective(instance: &ProblemInstance, variables: &RoutingVariables) -> LinearExpr {
    instance
        .fleet()
        .vehicles()
        .flat_map(|vehicle| variables.vehicle_arcs(vehicle))
        .map(|(arc, var)| (var, instance.travel_time(arc.period, arc.from, arc.to)))
        .collect()
}

struct RoutingContext<'a> {
    instance: &'a ProblemInstance,
    variables: &'a RoutingVariables,
    model: &'a MilpModel,
}

impl RoutingContext<'_> {
    fn bounds(&self, var: VarId) -> Bounds {
        let variable = self.model.variable(var);
        Bounds::new(variable.lower(), variable.upper())
    }

    fn vehicles(&self) -> impl Iterator<Item = VehicleIdx> + Clone {
        self.instance.fleet().vehicles()
    }

    fn periods(&self) -> impl Iterator<Item = PeriodIdx> + Clone {
        self.instance.periods().periods()
    }

    fn sum(vars: impl IntoIterator<Item = VarId>, coefficient: f64) -> LinearExpr {
        vars.into_iter().map(|var| (var, coefficient)).collect()
    }

    /// `T[node] >= d[t]` and `T[node] <= d[t + 1]` when one of `arcs` is used.
    fn period_bounds(
        &self,
        kind: &str,
        node: NodeIdx,
        period: PeriodIdx,
        vehicle: VehicleIdx,
        arcs: Vec<VarId>,
        constraints: &mut Vec<Constraint>,
    ) {
        if arcs.is_empty() {
            return;
        }

        self.period_start(kind, node, period, vehicle, &arcs, constraints);

        let time = self.variables.arrival(node, vehicle);
        let end = self.instance.periods().end(period);
        let big_m = upper_limit_m(self.bounds(time), end);
        if big_m > 0.0 {
            constraints.push(Constraint::le(
                format!("{kind}_period_end[{node},{period},{vehicle}]"),
                LinearExpr::term(time, 1.0) + Self::sum(arcs, big_m),
                end + big_m,
            ));
        }
    }

    /// `T[node] >= d[t]` when one of `arcs` is used.
    fn period_start(
        &self,
        kind: &str,
        node: NodeIdx,
        period: PeriodIdx,
        vehicle: VehicleIdx,
        arcs: &[VarId],
        constraints: &mut Vec<Constraint>,
    ) {
        let time = self.variables.arrival(node, vehicle);
        let start = self.instance.periods().start(period);

        if !arcs.is_empty() && start > self.bounds(time).lower {
            constraints.push(Constraint::ge(
                format!("{kind}_period_start[{node},{period},{vehicle}]"),
                LinearExpr::term(time, 1.0) + Self::sum(arcs.iter().copied(), -start),
                0.0,
            ));
        }
    }
}

fn depot_departure(context: &RoutingContext) -> Vec<Constraint> {
    context
        .vehicles()
        .map(|vehicle| {
            let expr = RoutingContext::sum(
                context
                    .periods()
                    .flat_map(|period| context.variables.arcs_out_of(DEPOT, period, vehicle)),
                1.0,
            );
            Constraint::eq(format!("depot_departure[{vehicle}]"), expr, 1.0)
        })
        .collect()
}

fn depot_return(context: &RoutingContext) -> Vec<Constraint> {
    context
        .vehicles()
        .map(|vehicle| {
            let expr = RoutingContext::sum(
                context
                    .periods()
                    .flat_map(|period| context.variables.arcs_into(DEPOT, period, vehicle)),
                1.0,
            );
            Constraint::eq(format!("depot_return[{vehicle}]"), expr, 1.0)
        })
        .collect()
}

fn customer_visit(context: &RoutingContext) -> Vec<Constraint> {
    context
        .instance
        .customers()
        .map(|customer| {
            let expr = RoutingContext::sum(
                context.vehicles().flat_map(|vehicle| {
                    context.periods().flat_map(move |period| {
                        context.variables.arcs_into(customer, period, vehicle)
                    })
                }),
                1.0,
            );
            Constraint::eq(format!("customer_visit[{customer}]"), expr, 1.0)
        })
        .collect()
}

fn flow_conservation(context: &RoutingContext) -> Vec<Constraint> {
    let mut constraints = Vec::new();

    for vehicle in context.vehicles() {
        for customer in context.instance.customers() {
            let incoming = context
                .periods()
                .flat_map(|period| context.variables.arcs_into(customer, period, vehicle));
            let outgoing = context
                .periods()
                .flat_map(|period| context.variables.arcs_out_of(customer, period, vehicle));

            constraints.push(Constraint::eq(
                format!("flow_conservation[{customer},{vehicle}]"),
                RoutingContext::sum(incoming, 1.0) + RoutingContext::sum(outgoing, -1.0),
                0.0,
            ));
        }
    }

    constraints
}

/// A customer reached from another customer during period `t` is reached within `t`.
/// Arrivals from the depot are not bounded by a period.
fn arrival_period(context: &RoutingContext) -> Vec<Constraint> {
    let mut constraints = Vec::new();

    for vehicle in context.vehicles() {
        for customer in context.instance.customers() {
            for period in context.periods() {
                let arcs = context
                    .instance
                    .customers()
                    .filter_map(|from| context.variables.arc(from, customer, period, vehicle))
                    .collect();
                context.period_bounds("arrival", customer, period, vehicle, arcs, &mut constraints);
            }
        }
    }

    constraints
}

/// Customers are left within the period of their outgoing arc. The depot is only left
/// no earlier than the start of that period.
fn departure_period(context: &RoutingContext) -> Vec<Constraint> {
    let mut constraints = Vec::new();

    for vehicle in context.vehicles() {
        for period in context.periods() {
            let arcs: Vec<VarId> = context
                .variables
                .arcs_out_of(DEPOT, period, vehicle)
                .collect();
            context.period_start("departure", DEPOT, period, vehicle, &arcs, &mut constraints);
        }

        for customer in context.instance.customers() {
            for period in context.periods() {
                let arcs = context
                    .variables
                    .arcs_out_of(customer, period, vehicle)
                    .collect();
                context.period_bounds(
                    "departure",
                    customer,
                    period,
                    vehicle,
                    arcs,
                    &mut constraints,
                );
            }
        }
    }

    constraints
}

/// `T[j] - T[i] = time[t][i][j] + handling(j)` when `x[i,j,t,k] = 1`, as a pair of big-M
/// inequalities. Pairs already implied by the variable bounds are skipped.
fn time_pair(
    context: &RoutingContext,
    name: &str,
    arc: VarId,
    from: VarId,
    to: VarId,
    duration: f64,
    constraints: &mut Vec<Constraint>,
) {
    let from_bounds = context.bounds(from);
    let to_bounds = context.bounds(to);
    let difference = || LinearExpr::term(to, 1.0) - LinearExpr::term(from, 1.0);

    let lower_m = lower_difference_m(from_bounds, to_bounds, duration);
    if lower_m > 0.0 {
        constraints.push(Constraint::ge(
            format!("{name}_min"),
            difference() + LinearExpr::term(arc, -lower_m),
            duration - lower_m,
        ));
    }

    let upper_m = upper_difference_m(from_bounds, to_bounds, duration);
    if upper_m > 0.0 {
        constraints.push(Constraint::le(
            format!("{name}_max"),
            difference() + LinearExpr::term(arc, upper_m),
            duration + upper_m,
        ));
    }
}

fn arc_time(context: &RoutingContext) -> Vec<Constraint> {
    let mut constraints = Vec::new();
    let instance = context.instance;

    for vehicle in context.vehicles() {
        for period in context.periods() {
            for from in instance.node_indices() {
                for to in instance.customers() {
                    let Some(arc) = context.variables.arc(from, to, period, vehicle) else {
                        continue;
                    };

                    time_pair(
                        context,
                        &format!("arc_time[{from},{to},{period},{vehicle}]"),
                        arc,
                        context.variables.arrival(from, vehicle),
                        context.variables.arrival(to, vehicle),
                        instance.travel_time(period, from, to) + instance.handling_time(to),
                        &mut constraints,
                    );
                }
            }
        }
    }

    constraints
}

fn return_time(context: &RoutingContext) -> Vec<Constraint> {
    let mut constraints = Vec::new();
    let instance = context.instance;

    for vehicle in context.vehicles() {
        for period in context.periods() {
            for from in instance.customers() {
                let Some(arc) = context.variables.arc(from, DEPOT, period, vehicle) else {
                    continue;
                };

                time_pair(
                    context,
                    &format!("return_time[{from},{period},{vehicle}]"),
                    arc,
                    context.variables.arrival(from, vehicle),
                    context.variables.depot_return(vehicle),
                    instance.travel_time(period, from, DEPOT),
                    &mut constraints,
                );
            }
        }
    }

    constraints
}

fn shift_duration(context: &RoutingContext) -> Vec<Constraint> {
    let max_shift = context.instance.fleet().max_shift_minutes();

    context
        .vehicles()
        .map(|vehicle| {
            Constraint::le(
                format!("shift_duration[{vehicle}]"),
                LinearExpr::term(context.variables.depot_return(vehicle), 1.0)
                    - LinearExpr::term(context.variables.arrival(DEPOT, vehicle), 1.0),
                max_shift,
            )
        })
        .collect()
}

/// `C[j] - C[i] = q[j]` when vehicle `k` travels `(i, j)` during any period.
fn load_propagation(context: &RoutingContext) -> Vec<Constraint> {
    let mut constraints = Vec::new();
    let instance = context.instance;

    for vehicle in context.vehicles() {
        for from in instance.node_indices() {
            for to in instance.customers() {
                let arcs: Vec<VarId> = context.variables.arcs_between(from, to, vehicle).collect();
                if arcs.is_empty() {
                    continue;
                }

                let load_from = context.variables.load(from, vehicle);
                let load_to = context.variables.load(to, vehicle);
                let from_bounds = context.bounds(load_from);
                let to_bounds = context.bounds(load_to);
                let demand = instance.demand(to);
                let difference =
                    || LinearExpr::term(load_to, 1.0) - LinearExpr::term(load_from, 1.0);

                let lower_m = lower_difference_m(from_bounds, to_bounds, demand);
                if lower_m > 0.0 {
                    constraints.push(Constraint::ge(
                        format!("load_propagation_min[{from},{to},{vehicle}]"),
                        difference() + RoutingContext::sum(arcs.iter().copied(), -lower_m),
                        demand - lower_m,
                    ));
                }

                let upper_m = upper_difference_m(from_bounds, to_bounds, demand);
                if upper_m > 0.0 {
                    constraints.push(Constraint::le(
                        format!("load_propagation_max[{from},{to},{vehicle}]"),
                        difference() + RoutingContext::sum(arcs, upper_m),
                        demand + upper_m,
                    ));
                }
            }
        }
    }

    constraints
}

/// The load leaving the depot covers every delivery of the route.
fn depot_load(context: &RoutingContext) -> Vec<Constraint> {
    let instance = context.instance;

    context
        .vehicles()
        .map(|vehicle| {
            let mut expr = LinearExpr::term(context.variables.load(DEPOT, vehicle), 1.0);
            for customer in instance
                .customers()
                .filter(|&customer| instance.node(customer).is_delivery())
            {
                let delivered = -(instance.node(customer).handled_units() as f64);
                expr.extend(context.periods().flat_map(|period| {
                    context
                        .variables
                        .arcs_into(customer, period, vehicle)
                        .map(move |var| (var, delivered))
                }));
            }

            Constraint::ge(format!("depot_load[{vehicle}]"), expr, 0.0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::{
        model::constraint::Sense,
        problem::time_window::TimeWindow,
        test_utils::{self, TestInstance},
    };

    use super::*;

    fn scenario_instance() -> ProblemInstance {
        test_utils::create_instance(TestInstance {
            demands: vec![0, 10, 10, -10],
            num_vehicles: 2,
            ..TestInstance::default()
        })
    }

    #[test]
    fn test_variables() {
        let instance = scenario_instance();
        let routing = RoutingModel::build(&instance, &Threads::Single);
        let variables = routing.variables();

        // 4 nodes, 12 arcs per vehicle and period.
        assert_eq!(variables.num_arcs(), 24);
        assert_eq!(routing.model().num_integral(), 24);
        assert_eq!(routing.model().num_variables(), 24 + 2 * 5 + 2 * 4);
        assert!(
            variables
                .arc(NodeIdx::new(1), NodeIdx::new(1), PeriodIdx::new(0), VehicleIdx::new(0))
                .is_none()
        );
        assert_eq!(routing.handling_time(), 15.0);
    }

    #[test]
    fn test_variable_bounds() {
        let instance = scenario_instance();
        let routing = RoutingModel::build(&instance, &Threads::Single);
        let model = routing.model();
        let vehicle = VehicleIdx::new(1);

        let pickup_load = model.variable(routing.variables().load(NodeIdx::new(1), vehicle));
        assert_eq!((pickup_load.lower(), pickup_load.upper()), (10.0, 100.0));

        let delivery_load = model.variable(routing.variables().load(NodeIdx::new(3), vehicle));
        assert_eq!((delivery_load.lower(), delivery_load.upper()), (0.0, 90.0));

        let arrival = model.variable(routing.variables().arrival(NodeIdx::new(2), vehicle));
        assert_eq!((arrival.lower(), arrival.upper()), (480.0, 720.0));

        let back = model.variable(routing.variables().depot_return(vehicle));
        assert_eq!((back.lower(), back.upper()), (480.0, 725.0));
    }

    #[test]
    fn test_time_window_clipped_to_horizon() {
        let instance = test_utils::create_instance(TestInstance {
            time_window: Some(TimeWindow::new(420.0, 600.0)),
            ..TestInstance::default()
        });
        let routing = RoutingModel::build(&instance, &Threads::Single);

        let arrival = routing
            .model()
            .variable(routing.variables().arrival(NodeIdx::new(1), VehicleIdx::new(0)));
        assert_eq!((arrival.lower(), arrival.upper()), (480.0, 600.0));
    }

    #[test]
    fn test_unreachable_arc_has_no_variable() {
        let mut instance_times = vec![vec![vec![5.0; 3]; 3]; 1];
        instance_times[0][1][2] = f64::INFINITY;
        let matrices = crate::problem::travel_matrices::TravelMatrices::new(
            instance_times,
            vec![vec![1.0; 3]; 3],
        )
        .unwrap();

        let mut builder = crate::problem::problem_instance::ProblemInstanceBuilder::default();
        builder
            .set_nodes(test_utils::create_nodes(&[0, 5, 5], None))
            .set_periods(crate::problem::periods::TimePeriods::single(480.0, 720.0))
            .set_travel_matrices(matrices)
            .set_fleet(test_utils::create_fleet(1, 100.0));
        let instance = builder.build().unwrap();

        let routing = RoutingModel::build(&instance, &Threads::Single);
        let variables = routing.variables();
        let period = PeriodIdx::new(0);
        let vehicle = VehicleIdx::new(0);

        assert!(variables.arc(NodeIdx::new(1), NodeIdx::new(2), period, vehicle).is_none());
        assert!(variables.arc(NodeIdx::new(2), NodeIdx::new(1), period, vehicle).is_some());
        assert_eq!(variables.num_arcs(), 5);
    }

    #[test]
    fn test_same_model_whatever_the_threads() {
        let instance = test_utils::create_instance(TestInstance {
            demands: vec![0, 10, -5, 3],
            num_vehicles: 2,
            breakpoints: vec![480.0, 600.0, 720.0],
            ..TestInstance::default()
        });

        let single = RoutingModel::build(&instance, &Threads::Single);
        let multi = RoutingModel::build(&instance, &Threads::Multi(4));

        let names = |routing: &RoutingModel| {
            routing
                .model()
                .constraints()
                .iter()
                .map(|constraint| constraint.name().to_owned())
                .collect::<Vec<_>>()
        };
        assert_eq!(names(&single), names(&multi));
    }

    #[test]
    fn test_constraint_families() {
        let instance = scenario_instance();
        let routing = RoutingModel::build(&instance, &Threads::Single);
        let constraints = routing.model().constraints();

        let count = |prefix: &str| {
            constraints
                .iter()
                .filter(|constraint| constraint.name().starts_with(prefix))
                .count()
        };

        assert_eq!(count("depot_departure["), 2);
        assert_eq!(count("depot_return["), 2);
        assert_eq!(count("customer_visit["), 3);
        assert_eq!(count("flow_conservation["), 6);
        assert_eq!(count("shift_duration["), 2);
        assert_eq!(count("depot_load["), 2);
        // Windows cover the whole single period, period bounds are implied.
        assert_eq!(count("arrival_period"), 0);

        let visit = constraints
            .iter()
            .find(|constraint| constraint.name() == "customer_visit[1]")
            .unwrap();
        assert_eq!(visit.sense(), Sense::Equal);
        assert_eq!(visit.terms().len(), 6);
    }

    #[test]
    fn test_period_bounds_generated() {
        let instance = test_utils::create_instance(TestInstance {
            demands: vec![0, 10, 10],
            breakpoints: vec![480.0, 600.0, 720.0],
            ..TestInstance::default()
        });
        let routing = RoutingModel::build(&instance, &Threads::Single);

        let constraint = routing
            .model()
            .constraints()
            .iter()
            .find(|constraint| constraint.name() == "arrival_period_end[1,0,0]")
            .unwrap();

        // T[1] + 120 * x[2,1,0,0] <= 600 + 120
        let arc = routing
            .variables()
            .arc(NodeIdx::new(2), NodeIdx::new(1), PeriodIdx::new(0), VehicleIdx::new(0))
            .unwrap();
        assert_eq!(constraint.rhs(), 720.0);
        assert!(constraint.terms().contains(&(arc, 120.0)));
        assert_eq!(constraint.terms().len(), 2);
    }

    #[test]
    fn test_depot_departure_only_bounded_below() {
        let instance = test_utils::create_instance(TestInstance {
            demands: vec![0, 10],
            breakpoints: vec![480.0, 600.0, 720.0],
            ..TestInstance::default()
        });
        let routing = RoutingModel::build(&instance, &Threads::Single);
        let constraints = routing.model().constraints();
        let exists = |name: &str| constraints.iter().any(|constraint| constraint.name() == name);

        assert!(exists("departure_period_start[0,1,0]"));
        assert!(!exists("departure_period_end[0,0,0]"));
        assert!(!exists("departure_period_end[0,1,0]"));
        assert!(exists("departure_period_end[1,0,0]"));
        // The only customer is reached from the depot.
        assert!(
            !constraints
                .iter()
                .any(|constraint| constraint.name().starts_with("arrival_period"))
        );
    }
}

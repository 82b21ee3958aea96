use tracing::{instrument, warn};

use crate::{
    builders::{ConstraintFamily, build_constraint_families},
    model::{
        constraint::Constraint, expression::LinearExpr, milp_model::MilpModel, variable::VarId,
    },
    problem::{
        energy::{DistanceCostMode, EnergyParameters},
        fleet::VehicleIdx,
        node::{DEPOT, NodeIdx},
        problem_instance::ProblemInstance,
        validation::ValidationError,
    },
    solver::solve_params::Threads,
    timer_debug,
};

/// Variables of the energy model.
///
/// - `x[i,j,k]`: binary, vehicle `k` travels `(i, j)`.
/// - `f[i,j,k]`: load carried by vehicle `k` on `(i, j)`, zero when the arc is unused.
/// - `w[k]`: energy budget of vehicle `k`, at least the energy drawn along its route.
/// - `u[i]`: position of customer `i` along its route, rules out cycles that skip the
///   depot.
#[derive(Debug, Clone)]
pub struct EnergyVariables {
    num_nodes: usize,
    arcs: Vec<Option<VarId>>,
    flows: Vec<Option<VarId>>,
    peaks: Vec<VarId>,
    orders: Vec<Option<VarId>>,
}

impl EnergyVariables {
    #[inline]
    fn index(&self, from: NodeIdx, to: NodeIdx, vehicle: VehicleIdx) -> usize {
        (vehicle.get() * self.num_nodes + from.get()) * self.num_nodes + to.get()
    }

    #[inline]
    pub fn arc(&self, from: NodeIdx, to: NodeIdx, vehicle: VehicleIdx) -> Option<VarId> {
        self.arcs[self.index(from, to, vehicle)]
    }

    #[inline]
    pub fn flow(&self, from: NodeIdx, to: NodeIdx, vehicle: VehicleIdx) -> Option<VarId> {
        self.flows[self.index(from, to, vehicle)]
    }

    #[inline]
    pub fn peak_energy(&self, vehicle: VehicleIdx) -> VarId {
        self.peaks[vehicle.get()]
    }

    /// `None` for the depot.
    #[inline]
    pub fn order(&self, node: NodeIdx) -> Option<VarId> {
        self.orders[node]
    }

    pub fn num_vehicles(&self) -> usize {
        self.peaks.len()
    }

    /// `(from, to, x, f)` for every arc of a vehicle.
    pub fn vehicle_arcs(
        &self,
        vehicle: VehicleIdx,
    ) -> impl Iterator<Item = (NodeIdx, NodeIdx, VarId, VarId)> {
        NodeIdx::range(self.num_nodes).flat_map(move |from| {
            NodeIdx::range(self.num_nodes).filter_map(move |to| {
                let index = self.index(from, to, vehicle);
                self.arcs[index].zip(self.flows[index]).map(|(arc, flow)| (from, to, arc, flow))
            })
        })
    }

    fn nodes(&self) -> impl DoubleEndedIterator<Item = NodeIdx> + Clone {
        NodeIdx::range(self.num_nodes)
    }
}

/// Fleet-cost minimization with flow-based load tracking and a per-vehicle energy budget.
/// It has no time dimension and vehicles may stay at the depot.
#[derive(Debug, Clone)]
pub struct EnergyModel {
    model: MilpModel,
    variables: EnergyVariables,
    parameters: EnergyParameters,
    distance_offset: f64,
}

impl EnergyModel {
    #[instrument(skip_all, level = "debug")]
    pub fn build(
        instance: &ProblemInstance,
        threads: &Threads,
    ) -> Result<EnergyModel, ValidationError> {
        let parameters = instance
            .energy()
            .ok_or(ValidationError::MissingEnergyParameters)?;
        let battery = instance
            .fleet()
            .battery_capacity()
            .ok_or(ValidationError::MissingBatteryCapacity)?;

        Ok(timer_debug!("build energy model", {
            let mut model = MilpModel::new("energy_cvrp");
            let variables = create_variables(instance, parameters, battery, &mut model);

            let context = EnergyContext {
                instance,
                parameters,
                variables: &variables,
            };
            let families: &[(&'static str, ConstraintFamily<EnergyContext>)] = &[
                ("depot_activation", depot_activation),
                ("customer_service", customer_service),
                ("flow_conservation", flow_conservation),
                ("flow_bounds", flow_bounds),
                ("load_balance", load_balance),
                ("energy_budget", energy_budget),
                ("subtour_elimination", subtour_elimination),
            ];
            let constraints = build_constraint_families(&context, families, threads);

            let (objective, distance_offset) =
                fleet_cost_objective(instance, parameters, &variables);
            model.extend_constraints(constraints);
            model.set_objective(objective);
            model.log_size();

            EnergyModel {
                model,
                variables,
                parameters: parameters.clone(),
                distance_offset,
            }
        }))
    }

    pub fn model(&self) -> &MilpModel {
        &self.model
    }

    pub fn variables(&self) -> &EnergyVariables {
        &self.variables
    }

    pub fn parameters(&self) -> &EnergyParameters {
        &self.parameters
    }

    /// Distance cost charged whatever the routes, non zero with [`DistanceCostMode::AllArcs`].
    pub fn distance_offset(&self) -> f64 {
        self.distance_offset
    }
}

fn create_variables(
    instance: &ProblemInstance,
    parameters: &EnergyParameters,
    battery: f64,
    model: &mut MilpModel,
) -> EnergyVariables {
    let num_nodes = instance.num_nodes();
    let num_vehicles = instance.fleet().num_vehicles();
    let capacity = instance.fleet().capacity();

    let mut arcs = vec![None; num_vehicles * num_nodes * num_nodes];
    let mut flows = vec![None; num_vehicles * num_nodes * num_nodes];
    let mut peaks = Vec::with_capacity(num_vehicles);

    for vehicle in instance.fleet().vehicles() {
        for from in instance.node_indices() {
            for to in instance.node_indices() {
                let usable = from != to
                    && instance.travel_distance(from, to).is_finite()
                    && parameters.base_consumption(from, to).is_finite();
                if !usable {
                    continue;
                }

                let index = (vehicle.get() * num_nodes + from.get()) * num_nodes + to.get();
                arcs[index] = Some(model.add_binary(format!("x[{from},{to},{vehicle}]")));
                flows[index] = Some(model.add_continuous(
                    format!("f[{from},{to},{vehicle}]"),
                    0.0,
                    max_arc_load(capacity, instance.demand(from)),
                ));
            }
        }

        peaks.push(model.add_continuous(format!("w[{vehicle}]"), 0.0, battery));
    }

    let num_customers = instance.num_customers() as f64;
    let orders = instance
        .node_indices()
        .map(|node| {
            (!node.is_depot())
                .then(|| model.add_continuous(format!("u[{node}]"), 1.0, num_customers))
        })
        .collect();

    EnergyVariables {
        num_nodes,
        arcs,
        flows,
        peaks,
        orders,
    }
}

/// Load a vehicle can carry when leaving a node of demand `demand`: never above the
/// capacity, and what is delivered at the node is no longer on board.
pub(crate) fn max_arc_load(capacity: f64, demand: f64) -> f64 {
    capacity.min(capacity - demand).max(0.0)
}

/// `c_F * dispatched vehicles + c_E * sum(w) + distance cost`, and the constant part of the
/// distance cost.
fn fleet_cost_objective(
    instance: &ProblemInstance,
    parameters: &EnergyParameters,
    variables: &EnergyVariables,
) -> (LinearExpr, f64) {
    let mut objective = LinearExpr::new();

    for vehicle in instance.fleet().vehicles() {
        objective.extend(
            instance
                .customers()
                .filter_map(|to| variables.arc(DEPOT, to, vehicle))
                .map(|var| (var, parameters.vehicle_fixed_cost())),
        );
        objective.add_term(variables.peak_energy(vehicle), parameters.energy_cost());
    }

    let distance_offset = match parameters.distance_cost_mode() {
        DistanceCostMode::AllArcs => {
            if parameters.distance_cost() != 0.0 {
                warn!(
                    "Distance cost is charged on every arc whether it is used or not, it does \
                     not influence the routes"
                );
            }

            instance.fleet().num_vehicles() as f64
                * parameters.distance_cost()
                * instance.matrices().total_arc_distance()
        }
        DistanceCostMode::UsedArcs => {
            for vehicle in instance.fleet().vehicles() {
                objective.extend(variables.vehicle_arcs(vehicle).map(|(from, to, arc, _)| {
                    (
                        arc,
                        parameters.distance_cost() * instance.travel_distance(from, to),
                    )
                }));
            }
            0.0
        }
    };

    objective.add_constant(distance_offset);

    (objective, distance_offset)
}

struct EnergyContext<'a> {
    instance: &'a ProblemInstance,
    parameters: &'a EnergyParameters,
    variables: &'a EnergyVariables,
}

impl EnergyContext<'_> {
    fn vehicles(&self) -> impl Iterator<Item = VehicleIdx> + Clone {
        self.instance.fleet().vehicles()
    }
}

fn depot_activation(context: &EnergyContext) -> Vec<Constraint> {
    context
        .vehicles()
        .map(|vehicle| {
            let expr = context
                .variables
                .nodes()
                .filter_map(|to| context.variables.arc(DEPOT, to, vehicle))
                .map(|var| (var, 1.0))
                .collect();
            Constraint::le(format!("depot_activation[{vehicle}]"), expr, 1.0)
        })
        .collect()
}

fn customer_service(context: &EnergyContext) -> Vec<Constraint> {
    context
        .instance
        .customers()
        .map(|customer| {
            let expr = context
                .vehicles()
                .flat_map(|vehicle| {
                    context
                        .variables
                        .nodes()
                        .filter_map(move |from| context.variables.arc(from, customer, vehicle))
                })
                .map(|var| (var, 1.0))
                .collect();
            Constraint::eq(format!("customer_service[{customer}]"), expr, 1.0)
        })
        .collect()
}

fn flow_conservation(context: &EnergyContext) -> Vec<Constraint> {
    let mut constraints = Vec::new();

    for vehicle in context.vehicles() {
        for node in context.variables.nodes() {
            let incoming = context
                .variables
                .nodes()
                .filter_map(|from| context.variables.arc(from, node, vehicle))
                .map(|var| (var, 1.0));
            let outgoing = context
                .variables
                .nodes()
                .filter_map(|to| context.variables.arc(node, to, vehicle))
                .map(|var| (var, -1.0));

            constraints.push(Constraint::eq(
                format!("flow_conservation[{node},{vehicle}]"),
                incoming.chain(outgoing).collect(),
                0.0,
            ));
        }
    }

    constraints
}

/// `q[j] * x <= f <= min(Q, Q - q[i]) * x` on every arc.
fn flow_bounds(context: &EnergyContext) -> Vec<Constraint> {
    let mut constraints = Vec::new();
    let capacity = context.instance.fleet().capacity();

    for vehicle in context.vehicles() {
        for (from, to, arc, flow) in context.variables.vehicle_arcs(vehicle) {
            let max_load = max_arc_load(capacity, context.instance.demand(from));
            constraints.push(Constraint::ge(
                format!("flow_min[{from},{to},{vehicle}]"),
                LinearExpr::term(flow, 1.0) - LinearExpr::term(arc, context.instance.demand(to)),
                0.0,
            ));
            constraints.push(Constraint::le(
                format!("flow_max[{from},{to},{vehicle}]"),
                LinearExpr::term(flow, 1.0) - LinearExpr::term(arc, max_load),
                0.0,
            ));
        }
    }

    constraints
}

/// Load entering a customer minus load leaving it is its demand, over all vehicles.
fn load_balance(context: &EnergyContext) -> Vec<Constraint> {
    context
        .instance
        .customers()
        .map(|customer| {
            let mut expr = LinearExpr::new();
            for vehicle in context.vehicles() {
                for other in context.variables.nodes() {
                    if let Some(flow) = context.variables.flow(other, customer, vehicle) {
                        expr.add_term(flow, 1.0);
                    }
                    if let Some(flow) = context.variables.flow(customer, other, vehicle) {
                        expr.add_term(flow, -1.0);
                    }
                }
            }

            Constraint::eq(
                format!("load_balance[{customer}]"),
                expr,
                context.instance.demand(customer),
            )
        })
        .collect()
}

/// `sum(a * x + b * f) <= w[k]`.
fn energy_budget(context: &EnergyContext) -> Vec<Constraint> {
    context
        .vehicles()
        .map(|vehicle| {
            let mut expr = LinearExpr::term(context.variables.peak_energy(vehicle), -1.0);
            for (from, to, arc, flow) in context.variables.vehicle_arcs(vehicle) {
                expr.add_term(arc, context.parameters.base_consumption(from, to));
                expr.add_term(flow, context.parameters.load_consumption(from, to));
            }

            Constraint::le(format!("energy_budget[{vehicle}]"), expr, 0.0)
        })
        .collect()
}

/// `u[i] - u[j] + n * sum_k x[i,j,k] <= n - 1` over customer pairs, `n` customers. A used
/// arc between two customers makes the order strictly increase, so every cycle goes
/// through the depot.
fn subtour_elimination(context: &EnergyContext) -> Vec<Constraint> {
    let instance = context.instance;
    let num_customers = instance.num_customers() as f64;
    let mut constraints = Vec::new();

    for from in instance.customers() {
        for to in instance.customers() {
            let (Some(order_from), Some(order_to)) =
                (context.variables.order(from), context.variables.order(to))
            else {
                continue;
            };

            let arcs: Vec<VarId> = context
                .vehicles()
                .filter_map(|vehicle| context.variables.arc(from, to, vehicle))
                .collect();
            if arcs.is_empty() {
                continue;
            }

            let mut expr = LinearExpr::term(order_from, 1.0) - LinearExpr::term(order_to, 1.0);
            expr.extend(arcs.into_iter().map(|arc| (arc, num_customers)));
            constraints.push(Constraint::le(
                format!("subtour_elimination[{from},{to}]"),
                expr,
                num_customers - 1.0,
            ));
        }
    }

    constraints
}

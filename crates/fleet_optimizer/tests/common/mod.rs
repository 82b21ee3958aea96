#![allow(dead_code)]

use std::path::PathBuf;

use fleet_optimizer::{
    optimizer::{OptimizeParams, Optimizer},
    problem::{
        energy::EnergyParametersBuilder,
        fleet::FleetBuilder,
        node::{Node, NodeBuilder},
        periods::TimePeriods,
        problem_instance::{ProblemInstance, ProblemInstanceBuilder},
        time_window::TimeWindow,
        travel_matrices::TravelMatrices,
    },
    solver::solve_params::{SolveParams, Termination, Threads},
};
use jiff::SignedDuration;

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../data/fixtures")
        .join(name)
}

/// Depot first, every customer gets the same window.
pub fn create_nodes(demands: &[i64], time_window: Option<TimeWindow>) -> Vec<Node> {
    demands
        .iter()
        .enumerate()
        .map(|(index, &demand)| {
            let mut builder = NodeBuilder::default();
            builder.set_external_id(format!("n{index}")).set_demand(demand);
            if index > 0
                && let Some(time_window) = time_window
            {
                builder.set_time_window(time_window);
            }
            builder.build()
        })
        .collect()
}

pub struct Scenario {
    pub demands: Vec<i64>,
    pub num_vehicles: usize,
    pub capacity: f64,
    pub breakpoints: Vec<f64>,
    pub matrices: TravelMatrices,
    pub time_window: Option<TimeWindow>,
}

pub fn create_instance(scenario: Scenario) -> ProblemInstance {
    let mut fleet = FleetBuilder::default();
    fleet
        .set_num_vehicles(scenario.num_vehicles)
        .set_capacity(scenario.capacity)
        .set_max_shift_duration(SignedDuration::from_hours(8));

    let mut builder = ProblemInstanceBuilder::default();
    builder
        .set_nodes(create_nodes(&scenario.demands, scenario.time_window))
        .set_periods(TimePeriods::new(scenario.breakpoints))
        .set_travel_matrices(scenario.matrices)
        .set_fleet(fleet.build())
        .set_handling_time_per_unit(SignedDuration::from_secs(30));

    builder.build().unwrap()
}

/// Depot and three customers 5 minutes apart, two vehicles, one period from 8:00 to 12:00.
pub fn uniform_instance() -> ProblemInstance {
    create_instance(Scenario {
        demands: vec![0, 10, 10, -10],
        num_vehicles: 2,
        capacity: 100.0,
        breakpoints: vec![480.0, 720.0],
        matrices: TravelMatrices::uniform(4, 1, 5.0, 1.0),
        time_window: Some(TimeWindow::new(480.0, 720.0)),
    })
}

/// Same customers with battery powered vehicles.
pub fn energy_instance(battery_capacity: f64, base: f64, per_load: f64) -> ProblemInstance {
    energy_scenario(&[0, 10, 10, -10], 2, battery_capacity, base, per_load)
}

/// Battery powered vehicles of capacity 100, every arc is 5 minutes and 10 meters long.
pub fn energy_scenario(
    demands: &[i64],
    num_vehicles: usize,
    battery_capacity: f64,
    base: f64,
    per_load: f64,
) -> ProblemInstance {
    let num_nodes = demands.len();

    let mut fleet = FleetBuilder::default();
    fleet
        .set_num_vehicles(num_vehicles)
        .set_capacity(100.0)
        .set_battery_capacity(battery_capacity);

    let mut energy = EnergyParametersBuilder::default();
    energy.set_uniform_consumption(num_nodes, base, per_load);

    let mut builder = ProblemInstanceBuilder::default();
    builder
        .set_nodes(create_nodes(demands, None))
        .set_periods(TimePeriods::single(480.0, 720.0))
        .set_travel_matrices(TravelMatrices::uniform(num_nodes, 1, 5.0, 10.0))
        .set_fleet(fleet.build())
        .set_energy(energy.build(num_nodes).unwrap());

    builder.build().unwrap()
}

pub fn optimizer(terminations: Vec<Termination>) -> Optimizer {
    Optimizer::new(OptimizeParams {
        solve: SolveParams::with_terminations(terminations),
        threads: Threads::Single,
        ..OptimizeParams::default()
    })
}

pub fn default_optimizer() -> Optimizer {
    optimizer(vec![Termination::Duration(SignedDuration::from_secs(60))])
}

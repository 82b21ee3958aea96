use jiff::SignedDuration;

use crate::problem::{
    energy::EnergyParametersBuilder,
    fleet::{Fleet, FleetBuilder},
    node::{Node, NodeBuilder},
    periods::TimePeriods,
    problem_instance::{ProblemInstance, ProblemInstanceBuilder},
    time_window::TimeWindow,
    travel_matrices::TravelMatrices,
    validation::ValidationError,
};

pub struct TestEnergy {
    pub battery_capacity: f64,
    pub base_consumption: f64,
    pub load_consumption: f64,
}

/// Instance with uniform travel times and the same time window on every customer.
pub struct TestInstance {
    pub demands: Vec<i64>,
    pub num_vehicles: usize,
    pub capacity: f64,
    pub breakpoints: Vec<f64>,
    pub travel_time: f64,
    pub distance: f64,
    pub time_window: Option<TimeWindow>,
    pub handling_time_per_unit: SignedDuration,
    pub energy: Option<TestEnergy>,
}

impl Default for TestInstance {
    fn default() -> Self {
        TestInstance {
            demands: vec![0, 10],
            num_vehicles: 1,
            capacity: 100.0,
            breakpoints: vec![480.0, 720.0],
            travel_time: 5.0,
            distance: 1.0,
            time_window: Some(TimeWindow::new(480.0, 720.0)),
            handling_time_per_unit: SignedDuration::from_secs(30),
            energy: None,
        }
    }
}

pub fn create_fleet(num_vehicles: usize, capacity: f64) -> Fleet {
    let mut builder = FleetBuilder::default();
    builder.set_num_vehicles(num_vehicles).set_capacity(capacity);
    builder.build()
}

pub fn create_nodes(demands: &[i64], time_window: Option<TimeWindow>) -> Vec<Node> {
    demands
        .iter()
        .enumerate()
        .map(|(index, &demand)| {
            let mut builder = NodeBuilder::default();
            builder.set_external_id(index.to_string()).set_demand(demand);
            if let Some(time_window) = time_window.filter(|_| index > 0) {
                builder.set_time_window(time_window);
            }
            builder.build()
        })
        .collect()
}

pub fn try_create_instance(test: TestInstance) -> Result<ProblemInstance, ValidationError> {
    let num_nodes = test.demands.len();
    let num_periods = test.breakpoints.len().saturating_sub(1);

    let mut fleet = FleetBuilder::default();
    fleet
        .set_num_vehicles(test.num_vehicles)
        .set_capacity(test.capacity);

    let mut builder = ProblemInstanceBuilder::default();
    builder
        .set_nodes(create_nodes(&test.demands, test.time_window))
        .set_periods(TimePeriods::new(test.breakpoints))
        .set_travel_matrices(TravelMatrices::uniform(
            num_nodes,
            num_periods,
            test.travel_time,
            test.distance,
        ))
        .set_handling_time_per_unit(test.handling_time_per_unit);

    if let Some(energy) = test.energy {
        fleet.set_battery_capacity(energy.battery_capacity);

        let mut parameters = EnergyParametersBuilder::default();
        parameters.set_uniform_consumption(
            num_nodes,
            energy.base_consumption,
            energy.load_consumption,
        );
        builder.set_energy(parameters.build(num_nodes)?);
    }

    builder.set_fleet(fleet.build());
    builder.build()
}

pub fn create_instance(test: TestInstance) -> ProblemInstance {
    try_create_instance(test).unwrap()
}

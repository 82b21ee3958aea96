use rand::{Rng, SeedableRng, rngs::SmallRng};
use tracing::debug;

use crate::problem::{
    energy::EnergyParametersBuilder,
    fleet::FleetBuilder,
    node::NodeBuilder,
    periods::TimePeriods,
    problem_instance::{ProblemInstance, ProblemInstanceBuilder},
    time_window::TimeWindow,
    travel_matrices::TravelMatrices,
    validation::ValidationError,
};

/// Parameters of a random instance. Customers are scattered on a square grid around a
/// central depot and travel times slow down by a random congestion factor per period.
#[derive(Debug, Clone)]
pub struct GeneratorParams {
    pub num_customers: usize,
    pub num_vehicles: usize,
    pub num_periods: usize,
    pub seed: u64,
    pub capacity: f64,
    pub horizon_start: f64,
    pub horizon_end: f64,
    /// Side of the square grid, in meters.
    pub grid_size: f64,
    /// Free-flow speed, in meters per minute.
    pub speed: f64,
    pub with_energy: bool,
}

impl Default for GeneratorParams {
    fn default() -> Self {
        GeneratorParams {
            num_customers: 8,
            num_vehicles: 2,
            num_periods: 2,
            seed: 0,
            capacity: 100.0,
            horizon_start: 480.0,
            horizon_end: 720.0,
            grid_size: 10_000.0,
            speed: 500.0,
            with_energy: false,
        }
    }
}

pub fn generate_instance(params: &GeneratorParams) -> Result<ProblemInstance, ValidationError> {
    if params.horizon_end <= params.horizon_start {
        return Err(ValidationError::NonIncreasingBreakpoints);
    }

    let mut rng = SmallRng::seed_from_u64(params.seed);
    let num_nodes = params.num_customers + 1;
    let num_periods = params.num_periods.max(1);
    let max_demand = (params.capacity / 4.0).floor().max(1.0) as i64;
    let horizon = params.horizon_end - params.horizon_start;

    let mut positions = vec![(params.grid_size / 2.0, params.grid_size / 2.0)];
    positions.extend((0..params.num_customers).map(|_| {
        (
            rng.random_range(0.0..=params.grid_size),
            rng.random_range(0.0..=params.grid_size),
        )
    }));

    let distances: Vec<Vec<f64>> = positions
        .iter()
        .map(|&(x1, y1)| {
            positions
                .iter()
                .map(|&(x2, y2)| ((x1 - x2).powi(2) + (y1 - y2).powi(2)).sqrt().round())
                .collect()
        })
        .collect();

    let congestion: Vec<f64> = (0..num_periods)
        .map(|_| 1.0 + rng.random_range(0.0..0.5))
        .collect();

    let times: Vec<Vec<Vec<f64>>> = congestion
        .iter()
        .map(|factor| {
            distances
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|distance| (distance / params.speed * factor).ceil())
                        .collect()
                })
                .collect()
        })
        .collect();

    let breakpoints: Vec<f64> = (0..=num_periods)
        .map(|period| params.horizon_start + horizon * period as f64 / num_periods as f64)
        .collect();

    let mut nodes = vec![NodeBuilder::default().build()];
    for customer in 1..num_nodes {
        let mut demand = rng.random_range(1..=max_demand);
        if rng.random_bool(0.3) {
            demand = -demand;
        }

        let time_window = if rng.random_bool(0.5) {
            TimeWindow::new(params.horizon_start, params.horizon_end)
        } else {
            let width = rng.random_range(60.0..=horizon.max(60.0)).min(horizon);
            let earliest = params.horizon_start + rng.random_range(0.0..=(horizon - width));
            TimeWindow::new(earliest, earliest + width)
        };

        let mut builder = NodeBuilder::default();
        builder
            .set_external_id(format!("c{customer}"))
            .set_demand(demand)
            .set_time_window(time_window);
        nodes.push(builder.build());
    }

    let mut fleet = FleetBuilder::default();
    fleet
        .set_num_vehicles(params.num_vehicles)
        .set_capacity(params.capacity);

    let mut builder = ProblemInstanceBuilder::default();
    builder
        .set_id(format!("generated-{}-{}", params.num_customers, params.seed))
        .set_nodes(nodes)
        .set_periods(TimePeriods::new(breakpoints));

    if params.with_energy {
        let base: Vec<Vec<f64>> = distances
            .iter()
            .map(|row| row.iter().map(|distance| distance / 1000.0).collect())
            .collect();
        let per_load: Vec<Vec<f64>> = distances
            .iter()
            .map(|row| row.iter().map(|distance| distance / 100_000.0).collect())
            .collect();
        let battery = base.iter().flatten().copied().fold(0.0, f64::max) * num_nodes as f64;

        fleet.set_battery_capacity(battery);

        let mut energy = EnergyParametersBuilder::default();
        energy
            .set_base_consumption(base)
            .set_load_consumption(per_load);
        builder.set_energy(energy.build(num_nodes)?);
    }

    builder
        .set_travel_matrices(TravelMatrices::new(times, distances)?)
        .set_fleet(fleet.build());

    debug!(
        customers = params.num_customers,
        vehicles = params.num_vehicles,
        periods = num_periods,
        seed = params.seed,
        "Generated instance"
    );

    builder.build()
}

use anyhow::{Context, bail};
use fxhash::FxHashSet;
use jiff::{SignedDuration, civil::Time};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::{
    problem::{
        energy::{DistanceCostMode, EnergyParametersBuilder},
        fleet::FleetBuilder,
        node::{Node, NodeBuilder},
        periods::TimePeriods,
        problem_instance::{ProblemInstance, ProblemInstanceBuilder},
        time_window::TimeWindow,
        travel_matrices::TravelMatrices,
    },
    utils::time::clock_to_minutes,
};

/// Instance file. Node `0` is the depot.
#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields, rename = "ProblemInstance")]
pub struct JsonProblemInstance {
    pub id: Option<String>,
    pub nodes: Vec<JsonNode>,

    /// Breakpoints `d[0] < ... < d[T]` of the `T` periods.
    pub periods: Vec<JsonClock>,

    /// Minutes, indexed `[period][from][to]`. `null` marks an arc that cannot be
    /// travelled during the period.
    pub travel_times: Vec<Vec<Vec<Option<f64>>>>,

    /// Meters, indexed `[from][to]`.
    pub distances: Vec<Vec<Option<f64>>>,

    pub fleet: JsonFleet,
    pub handling_time_per_unit: Option<SignedDuration>,
    pub energy: Option<JsonEnergy>,
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields, rename = "Node")]
pub struct JsonNode {
    pub id: Option<String>,
    /// Positive for a pickup, negative for a delivery.
    pub demand: i64,
    pub time_window: Option<JsonTimeWindow>,
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields, rename = "TimeWindow")]
pub struct JsonTimeWindow {
    pub earliest: JsonClock,
    pub latest: JsonClock,
}

/// A time of the planning day, either in minutes after midnight or as `"HH:MM"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged, rename = "Clock")]
pub enum JsonClock {
    Minutes(f64),
    Clock(String),
}

impl JsonClock {
    pub fn minutes(&self) -> Result<f64, anyhow::Error> {
        match self {
            JsonClock::Minutes(minutes) => Ok(*minutes),
            JsonClock::Clock(clock) => clock
                .parse::<Time>()
                .map(clock_to_minutes)
                .with_context(|| format!("invalid clock time {clock:?}")),
        }
    }
}

#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields, rename = "Fleet")]
pub struct JsonFleet {
    pub vehicles: usize,
    pub capacity: f64,
    pub max_shift_duration: Option<SignedDuration>,
    pub battery_capacity: Option<f64>,
}

/// Coefficients of the energy model.
#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields, rename = "Energy")]
pub struct JsonEnergy {
    /// Energy drawn by an empty vehicle on an arc.
    pub base_consumption: JsonArcValues,
    /// Additional energy drawn per unit of load on an arc.
    pub load_consumption: JsonArcValues,
    pub energy_cost: Option<f64>,
    pub vehicle_fixed_cost: Option<f64>,
    pub distance_cost: Option<f64>,
    pub distance_cost_mode: Option<DistanceCostMode>,
}

/// One value for every arc, or a full `[from][to]` matrix.
#[derive(Serialize, Deserialize, JsonSchema)]
#[serde(untagged, rename = "ArcValues")]
pub enum JsonArcValues {
    Uniform(f64),
    Matrix(Vec<Vec<f64>>),
}

impl JsonArcValues {
    fn into_matrix(self, num_nodes: usize) -> Vec<Vec<f64>> {
        match self {
            JsonArcValues::Uniform(value) => vec![vec![value; num_nodes]; num_nodes],
            JsonArcValues::Matrix(matrix) => matrix,
        }
    }
}

fn unreachable_as_infinity(matrix: Vec<Vec<Option<f64>>>) -> Vec<Vec<f64>> {
    matrix
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|value| value.unwrap_or(f64::INFINITY))
                .collect()
        })
        .collect()
}

impl JsonProblemInstance {
    #[instrument(skip_all, level = "debug")]
    pub fn build_instance(self) -> Result<ProblemInstance, anyhow::Error> {
        let num_nodes = self.nodes.len();
        let mut builder = ProblemInstanceBuilder::default();

        if let Some(id) = self.id {
            builder.set_id(id);
        }

        let mut ids = FxHashSet::default();
        let nodes = self
            .nodes
            .into_iter()
            .enumerate()
            .map(|(index, node)| {
                let external_id = node.id.unwrap_or_else(|| index.to_string());
                if !ids.insert(external_id.clone()) {
                    bail!("duplicate node id {external_id:?}");
                }

                let mut builder = NodeBuilder::default();
                builder.set_external_id(external_id).set_demand(node.demand);

                if let Some(time_window) = node.time_window {
                    builder.set_time_window(TimeWindow::new(
                        time_window.earliest.minutes()?,
                        time_window.latest.minutes()?,
                    ));
                }

                Ok(builder.build())
            })
            .collect::<Result<Vec<Node>, anyhow::Error>>()?;
        builder.set_nodes(nodes);

        let breakpoints = self
            .periods
            .iter()
            .map(JsonClock::minutes)
            .collect::<Result<Vec<_>, _>>()
            .context("invalid period breakpoints")?;
        builder.set_periods(TimePeriods::new(breakpoints));

        let times = self
            .travel_times
            .into_iter()
            .map(unreachable_as_infinity)
            .collect();
        builder.set_travel_matrices(TravelMatrices::new(
            times,
            unreachable_as_infinity(self.distances),
        )?);

        let mut fleet = FleetBuilder::default();
        fleet
            .set_num_vehicles(self.fleet.vehicles)
            .set_capacity(self.fleet.capacity);
        if let Some(duration) = self.fleet.max_shift_duration {
            fleet.set_max_shift_duration(duration);
        }
        if let Some(battery) = self.fleet.battery_capacity {
            fleet.set_battery_capacity(battery);
        }
        builder.set_fleet(fleet.build());

        if let Some(handling_time) = self.handling_time_per_unit {
            builder.set_handling_time_per_unit(handling_time);
        }

        if let Some(energy) = self.energy {
            if self.fleet.battery_capacity.is_none() {
                warn!("Energy parameters are set but the fleet has no battery capacity");
            }

            let mut parameters = EnergyParametersBuilder::default();
            parameters
                .set_base_consumption(energy.base_consumption.into_matrix(num_nodes))
                .set_load_consumption(energy.load_consumption.into_matrix(num_nodes));
            if let Some(cost) = energy.energy_cost {
                parameters.set_energy_cost(cost);
            }
            if let Some(cost) = energy.vehicle_fixed_cost {
                parameters.set_vehicle_fixed_cost(cost);
            }
            if let Some(cost) = energy.distance_cost {
                parameters.set_distance_cost(cost);
            }
            if let Some(mode) = energy.distance_cost_mode {
                parameters.set_distance_cost_mode(mode);
            }
            builder.set_energy(parameters.build(num_nodes)?);
        }

        Ok(builder.build()?)
    }
}

impl From<&ProblemInstance> for JsonProblemInstance {
    fn from(instance: &ProblemInstance) -> Self {
        JsonProblemInstance {
            id: instance.id().map(str::to_owned),
            nodes: instance
                .nodes()
                .iter()
                .map(|node| JsonNode {
                    id: Some(node.external_id().to_owned()),
                    demand: node.demand(),
                    time_window: node.time_window().map(|time_window| JsonTimeWindow {
                        earliest: JsonClock::Minutes(time_window.earliest()),
                        latest: JsonClock::Minutes(time_window.latest()),
                    }),
                })
                .collect(),
            periods: instance
                .periods()
                .breakpoints()
                .iter()
                .map(|&breakpoint| JsonClock::Minutes(breakpoint))
                .collect(),
            travel_times: instance.matrices().nested_times(),
            distances: instance.matrices().nested_distances(),
            fleet: JsonFleet {
                vehicles: instance.fleet().num_vehicles(),
                capacity: instance.fleet().capacity(),
                max_shift_duration: Some(instance.fleet().max_shift_duration()),
                battery_capacity: instance.fleet().battery_capacity(),
            },
            handling_time_per_unit: Some(instance.handling_time_per_unit()),
            energy: instance.energy().map(|energy| JsonEnergy {
                base_consumption: JsonArcValues::Matrix(energy.nested_base_consumption()),
                load_consumption: JsonArcValues::Matrix(energy.nested_load_consumption()),
                energy_cost: Some(energy.energy_cost()),
                vehicle_fixed_cost: Some(energy.vehicle_fixed_cost()),
                distance_cost: Some(energy.distance_cost()),
                distance_cost_mode: Some(energy.distance_cost_mode()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::problem::{node::NodeIdx, periods::PeriodIdx, validation::ValidationError};

    const INSTANCE: &str = r#"{
        "id": "small",
        "nodes": [
            { "demand": 0 },
            { "id": "a", "demand": 10, "time_window": { "earliest": "08:00", "latest": "12:00" } },
            { "id": "b", "demand": -5, "time_window": { "earliest": 480, "latest": 600 } }
        ],
        "periods": ["08:00", 600, "12:00"],
        "travel_times": [
            [[0, 5, 7], [5, 0, null], [7, 4, 0]],
            [[0, 6, 8], [6, 0, 3], [8, 5, 0]]
        ],
        "distances": [[0, 10, 20], [10, 0, 15], [20, 15, 0]],
        "fleet": { "vehicles": 2, "capacity": 50, "max_shift_duration": "PT4H", "battery_capacity": 100 },
        "handling_time_per_unit": "PT1M",
        "energy": { "base_consumption": 2, "load_consumption": 0.5, "distance_cost_mode": "used_arcs" }
    }"#;

    #[test]
    fn test_build_instance() {
        let json: JsonProblemInstance = serde_json::from_str(INSTANCE).unwrap();
        let instance = json.build_instance().unwrap();

        assert_eq!(instance.id(), Some("small"));
        assert_eq!(instance.num_nodes(), 3);
        assert_eq!(instance.node(NodeIdx::new(0)).external_id(), "0");
        assert_eq!(instance.node(NodeIdx::new(1)).external_id(), "a");
        assert_eq!(
            instance.node(NodeIdx::new(1)).time_window(),
            Some(&TimeWindow::new(480.0, 720.0))
        );
        assert_eq!(instance.periods().breakpoints(), &[480.0, 600.0, 720.0]);
        assert_eq!(
            instance.travel_time(PeriodIdx::new(0), NodeIdx::new(1), NodeIdx::new(2)),
            f64::INFINITY
        );
        assert_eq!(
            instance.travel_time(PeriodIdx::new(1), NodeIdx::new(1), NodeIdx::new(2)),
            3.0
        );
        assert_eq!(instance.fleet().max_shift_minutes(), 240.0);
        assert_eq!(instance.handling_time(NodeIdx::new(2)), 5.0);

        let energy = instance.energy().unwrap();
        assert_eq!(energy.base_consumption(NodeIdx::new(0), NodeIdx::new(2)), 2.0);
        assert_eq!(energy.distance_cost_mode(), DistanceCostMode::UsedArcs);
        assert_eq!(energy.energy_cost(), 1.0);
    }

    #[test]
    fn test_json_round_trip() {
        let json: JsonProblemInstance = serde_json::from_str(INSTANCE).unwrap();
        let instance = json.build_instance().unwrap();

        let serialized = serde_json::to_string(&JsonProblemInstance::from(&instance)).unwrap();
        let parsed: JsonProblemInstance = serde_json::from_str(&serialized).unwrap();
        let rebuilt = parsed.build_instance().unwrap();

        assert_eq!(rebuilt.periods(), instance.periods());
        assert_eq!(rebuilt.matrices().nested_times(), instance.matrices().nested_times());
        assert_eq!(rebuilt.node(NodeIdx::new(2)).demand(), -5);
    }

    #[test]
    fn test_invalid_clock() {
        assert!(JsonClock::Clock("25:00".into()).minutes().is_err());
        assert_eq!(JsonClock::Clock("08:30".into()).minutes().unwrap(), 510.0);
    }

    #[test]
    fn test_duplicate_node_ids() {
        let json = r#"{
            "nodes": [{ "id": "x", "demand": 0 }, { "id": "x", "demand": 1 }],
            "periods": [0, 10],
            "travel_times": [[[0, 1], [1, 0]]],
            "distances": [[0, 1], [1, 0]],
            "fleet": { "vehicles": 1, "capacity": 10 }
        }"#;
        let json: JsonProblemInstance = serde_json::from_str(json).unwrap();

        assert!(json.build_instance().is_err());
    }

    #[test]
    fn test_validation_error_is_kept() {
        let json = r#"{
            "nodes": [{ "demand": 3 }, { "demand": 1 }],
            "periods": [0, 10],
            "travel_times": [[[0, 1], [1, 0]]],
            "distances": [[0, 1], [1, 0]],
            "fleet": { "vehicles": 1, "capacity": 10 }
        }"#;
        let json: JsonProblemInstance = serde_json::from_str(json).unwrap();
        let error = json.build_instance().unwrap_err();

        assert_eq!(
            error.downcast_ref::<ValidationError>(),
            Some(&ValidationError::DepotDemand(3))
        );
    }

    #[test]
    fn test_unknown_field() {
        let json = r#"{ "vehicles": 1, "capacity": 10, "speed": 3 }"#;

        assert!(serde_json::from_str::<JsonFleet>(json).is_err());
    }
}

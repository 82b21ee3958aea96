use jiff::SignedDuration;
use serde::Serialize;
use tracing::warn;

use crate::{
    problem::{
        energy::EnergyParameters,
        fleet::Fleet,
        node::{Coordinates, DEPOT, Node, NodeIdx},
        periods::{PeriodIdx, TimePeriods},
        travel_matrices::{Distance, Time, TravelMatrices},
        validation::ValidationError,
    },
    utils::time::duration_to_minutes,
};

pub const DEFAULT_HANDLING_TIME_PER_UNIT: SignedDuration = SignedDuration::from_secs(30);

/// A validated routing instance: the depot (node 0), the customers, the planning periods
/// with their travel times, the fleet and, for the energy model, its energy parameters.
///
/// All times are expressed in minutes after midnight.
#[derive(Debug, Clone, Serialize)]
pub struct ProblemInstance {
    id: Option<String>,
    nodes: Vec<Node>,
    periods: TimePeriods,
    matrices: TravelMatrices,
    fleet: Fleet,
    handling_time_per_unit: SignedDuration,
    energy: Option<EnergyParameters>,
}

impl ProblemInstance {
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, index: NodeIdx) -> &Node {
        &self.nodes[index]
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_customers(&self) -> usize {
        self.nodes.len() - 1
    }

    pub fn node_indices(
        &self,
    ) -> impl DoubleEndedIterator<Item = NodeIdx> + ExactSizeIterator + Clone {
        NodeIdx::range(self.nodes.len())
    }

    /// Every node but the depot.
    pub fn customers(
        &self,
    ) -> impl DoubleEndedIterator<Item = NodeIdx> + ExactSizeIterator + Clone {
        self.node_indices().skip(1)
    }

    #[inline]
    pub fn demand(&self, node: NodeIdx) -> f64 {
        self.nodes[node].demand_value()
    }

    pub fn periods(&self) -> &TimePeriods {
        &self.periods
    }

    pub fn num_periods(&self) -> usize {
        self.periods.num_periods()
    }

    pub fn matrices(&self) -> &TravelMatrices {
        &self.matrices
    }

    #[inline]
    pub fn travel_time(&self, period: PeriodIdx, from: NodeIdx, to: NodeIdx) -> Time {
        self.matrices.travel_time(period, from, to)
    }

    #[inline]
    pub fn travel_distance(&self, from: NodeIdx, to: NodeIdx) -> Distance {
        self.matrices.travel_distance(from, to)
    }

    pub fn fleet(&self) -> &Fleet {
        &self.fleet
    }

    pub fn handling_time_per_unit(&self) -> SignedDuration {
        self.handling_time_per_unit
    }

    /// Minutes spent loading or unloading at `node`.
    pub fn handling_time(&self, node: NodeIdx) -> f64 {
        self.nodes[node].handled_units() as f64 * duration_to_minutes(self.handling_time_per_unit)
    }

    /// Loading and unloading time summed over every customer. Every customer is served
    /// exactly once, so this is a constant of any feasible solution.
    pub fn total_handling_time(&self) -> f64 {
        self.customers().map(|node| self.handling_time(node)).sum()
    }

    /// Units that must be on board when leaving the depot, the sum of all deliveries.
    pub fn total_delivery(&self) -> f64 {
        self.nodes
            .iter()
            .filter(|node| node.is_delivery())
            .map(|node| node.handled_units() as f64)
            .sum()
    }

    pub fn energy(&self) -> Option<&EnergyParameters> {
        self.energy.as_ref()
    }

    /// Attaches coordinates to nodes, in node order. Extra coordinates are ignored.
    pub fn attach_coordinates(&mut self, coordinates: &[Coordinates]) {
        if coordinates.len() != self.nodes.len() {
            warn!(
                nodes = self.nodes.len(),
                coordinates = coordinates.len(),
                "Number of coordinates does not match the number of nodes"
            );
        }

        for (node, &coordinates) in self.nodes.iter_mut().zip(coordinates) {
            node.set_coordinates(coordinates);
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.fleet.num_vehicles() == 0 {
            return Err(ValidationError::EmptyFleet);
        }

        let capacity = self.fleet.capacity();
        if !capacity.is_finite() || capacity < 0.0 {
            return Err(ValidationError::InvalidCapacity(capacity));
        }

        if !self.fleet.max_shift_duration().is_positive() {
            return Err(ValidationError::NonPositiveShiftDuration);
        }

        if self.handling_time_per_unit.is_negative() {
            return Err(ValidationError::NegativeHandlingTime);
        }

        if let Some(battery) = self.fleet.battery_capacity() {
            if !battery.is_finite() || battery < 0.0 {
                return Err(ValidationError::InvalidBatteryCapacity(battery));
            }
        }

        if self.nodes.len() < 2 {
            return Err(ValidationError::NoCustomers(self.nodes.len()));
        }

        let depot = &self.nodes[DEPOT];
        if depot.demand() != 0 {
            return Err(ValidationError::DepotDemand(depot.demand()));
        }
        if depot.time_window().is_some() {
            return Err(ValidationError::DepotTimeWindow);
        }

        for (index, node) in self.nodes.iter().enumerate().skip(1) {
            if node.handled_units() as f64 > capacity {
                return Err(ValidationError::DemandExceedsCapacity {
                    node: index,
                    demand: node.demand(),
                    capacity,
                });
            }

            if let Some(time_window) = node.time_window() {
                if !time_window.is_valid() {
                    return Err(ValidationError::InvalidTimeWindow {
                        node: index,
                        earliest: time_window.earliest(),
                        latest: time_window.latest(),
                    });
                }
            }
        }

        let num_breakpoints = self.periods.breakpoints().len();
        if num_breakpoints < 2 {
            return Err(ValidationError::TooFewBreakpoints(num_breakpoints));
        }
        if !self.periods.is_strictly_increasing() {
            return Err(ValidationError::NonIncreasingBreakpoints);
        }

        if self.matrices.num_nodes() != self.nodes.len() {
            return Err(ValidationError::MatrixDimension {
                matrix: "travel time",
                expected: self.nodes.len(),
                found: self.matrices.num_nodes(),
            });
        }
        if self.matrices.num_periods() != self.periods.num_periods() {
            return Err(ValidationError::PeriodCountMismatch {
                expected: self.periods.num_periods(),
                found: self.matrices.num_periods(),
            });
        }

        if let Some(energy) = &self.energy {
            if energy.num_nodes() != self.nodes.len() {
                return Err(ValidationError::MatrixDimension {
                    matrix: "energy consumption",
                    expected: self.nodes.len(),
                    found: energy.num_nodes(),
                });
            }
        }

        Ok(())
    }
}

#[derive(Default)]
pub struct ProblemInstanceBuilder {
    id: Option<String>,
    nodes: Option<Vec<Node>>,
    periods: Option<TimePeriods>,
    matrices: Option<TravelMatrices>,
    fleet: Option<Fleet>,
    handling_time_per_unit: Option<SignedDuration>,
    energy: Option<EnergyParameters>,
}

impl ProblemInstanceBuilder {
    pub fn set_id(&mut self, id: impl Into<String>) -> &mut ProblemInstanceBuilder {
        self.id = Some(id.into());
        self
    }

    /// The first node is the depot.
    pub fn set_nodes(&mut self, nodes: Vec<Node>) -> &mut ProblemInstanceBuilder {
        self.nodes = Some(nodes);
        self
    }

    pub fn add_node(&mut self, node: Node) -> &mut ProblemInstanceBuilder {
        if let Some(nodes) = &mut self.nodes {
            nodes.push(node);
        } else {
            self.nodes = Some(vec![node]);
        }

        self
    }

    pub fn set_periods(&mut self, periods: TimePeriods) -> &mut ProblemInstanceBuilder {
        self.periods = Some(periods);
        self
    }

    pub fn set_travel_matrices(&mut self, matrices: TravelMatrices) -> &mut ProblemInstanceBuilder {
        self.matrices = Some(matrices);
        self
    }

    pub fn set_fleet(&mut self, fleet: Fleet) -> &mut ProblemInstanceBuilder {
        self.fleet = Some(fleet);
        self
    }

    pub fn set_handling_time_per_unit(
        &mut self,
        duration: SignedDuration,
    ) -> &mut ProblemInstanceBuilder {
        self.handling_time_per_unit = Some(duration);
        self
    }

    pub fn set_energy(&mut self, energy: EnergyParameters) -> &mut ProblemInstanceBuilder {
        self.energy = Some(energy);
        self
    }

    pub fn build(self) -> Result<ProblemInstance, ValidationError> {
        let instance = ProblemInstance {
            id: self.id,
            nodes: self.nodes.ok_or(ValidationError::Missing("nodes"))?,
            periods: self.periods.ok_or(ValidationError::Missing("periods"))?,
            matrices: self
                .matrices
                .ok_or(ValidationError::Missing("travel matrices"))?,
            fleet: self.fleet.ok_or(ValidationError::Missing("fleet"))?,
            handling_time_per_unit: self
                .handling_time_per_unit
                .unwrap_or(DEFAULT_HANDLING_TIME_PER_UNIT),
            energy: self.energy,
        };

        instance.validate()?;

        Ok(instance)
    }
}

use serde::Serialize;

use crate::{define_index_newtype, problem::time_window::TimeWindow};

define_index_newtype!(NodeIdx);

/// The depot is always the first node of an instance.
pub const DEPOT: NodeIdx = NodeIdx::new(0);

impl NodeIdx {
    pub fn is_depot(&self) -> bool {
        *self == DEPOT
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    lat: f64,
    lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Coordinates { lat, lng }
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }
}

/// A depot or customer. A positive demand is picked up at the customer, a negative one
/// is delivered to it.
#[derive(Debug, Clone, Serialize)]
pub struct Node {
    external_id: String,
    demand: i64,
    time_window: Option<TimeWindow>,
    coordinates: Option<Coordinates>,
}

impl Node {
    pub fn external_id(&self) -> &str {
        &self.external_id
    }

    pub fn demand(&self) -> i64 {
        self.demand
    }

    pub fn demand_value(&self) -> f64 {
        self.demand as f64
    }

    pub fn is_pickup(&self) -> bool {
        self.demand > 0
    }

    pub fn is_delivery(&self) -> bool {
        self.demand < 0
    }

    /// Units loaded or unloaded at the node, whatever the direction.
    pub fn handled_units(&self) -> u64 {
        self.demand.unsigned_abs()
    }

    pub fn time_window(&self) -> Option<&TimeWindow> {
        self.time_window.as_ref()
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        self.coordinates
    }

    pub(crate) fn set_coordinates(&mut self, coordinates: Coordinates) {
        self.coordinates = Some(coordinates);
    }
}

#[derive(Default)]
pub struct NodeBuilder {
    external_id: Option<String>,
    demand: Option<i64>,
    time_window: Option<TimeWindow>,
    coordinates: Option<Coordinates>,
}

impl NodeBuilder {
    pub fn set_external_id(&mut self, external_id: impl Into<String>) -> &mut NodeBuilder {
        self.external_id = Some(external_id.into());
        self
    }

    pub fn set_demand(&mut self, demand: i64) -> &mut NodeBuilder {
        self.demand = Some(demand);
        self
    }

    pub fn set_time_window(&mut self, time_window: TimeWindow) -> &mut NodeBuilder {
        self.time_window = Some(time_window);
        self
    }

    pub fn set_coordinates(&mut self, coordinates: Coordinates) -> &mut NodeBuilder {
        self.coordinates = Some(coordinates);
        self
    }

    pub fn build(self) -> Node {
        Node {
            external_id: self.external_id.unwrap_or_default(),
            demand: self.demand.unwrap_or(0),
            time_window: self.time_window,
            coordinates: self.coordinates,
        }
    }
}

use thiserror::Error;

use crate::problem::{fleet::VehicleIdx, node::NodeIdx};

/// The solver assignment cannot be read back as routes.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExtractionError {
    #[error("reported objective {reported} differs from the recomputed cost {recomputed}")]
    ObjectiveMismatch { reported: f64, recomputed: f64 },
    #[error("vehicle {vehicle} uses arcs detached from its route through nodes {nodes:?}")]
    DetachedCycle {
        vehicle: VehicleIdx,
        nodes: Vec<NodeIdx>,
    },
    #[error("vehicle {vehicle} never returns to the depot")]
    MissingDepotReturn { vehicle: VehicleIdx },
    #[error("vehicle {vehicle} leaves node {node} more than once")]
    BranchingRoute { vehicle: VehicleIdx, node: NodeIdx },
}

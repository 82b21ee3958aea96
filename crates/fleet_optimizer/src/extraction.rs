use fixedbitset::FixedBitSet;

use crate::{
    extraction::extraction_error::ExtractionError,
    problem::{
        fleet::VehicleIdx,
        node::{DEPOT, NodeIdx},
    },
};

pub mod checker;
pub mod energy_extractor;
pub mod extraction_error;
pub mod route;
pub mod routing_extractor;
pub mod solution;

/// Orders the arcs used by a vehicle into a single tour leaving from and returning to the
/// depot. Every arc must belong to that tour.
pub(crate) fn chain_arcs<P: Copy>(
    vehicle: VehicleIdx,
    num_nodes: usize,
    arcs: &[(NodeIdx, NodeIdx, P)],
) -> Result<Vec<(NodeIdx, NodeIdx, P)>, ExtractionError> {
    if arcs.is_empty() {
        return Ok(Vec::new());
    }

    let mut successors: Vec<Option<usize>> = vec![None; num_nodes];
    for (index, &(from, _, _)) in arcs.iter().enumerate() {
        if successors[from].is_some() {
            return Err(ExtractionError::BranchingRoute {
                vehicle,
                node: from,
            });
        }
        successors[from] = Some(index);
    }

    let detached = |used: &FixedBitSet| {
        let mut nodes: Vec<NodeIdx> = arcs
            .iter()
            .enumerate()
            .filter(|(index, _)| !used.contains(*index))
            .map(|(_, &(from, _, _))| from)
            .collect();
        nodes.sort();
        nodes.dedup();
        ExtractionError::DetachedCycle { vehicle, nodes }
    };

    let mut used = FixedBitSet::with_capacity(arcs.len());
    let mut visited = FixedBitSet::with_capacity(num_nodes);
    let mut chain = Vec::with_capacity(arcs.len());
    let mut current = DEPOT;

    loop {
        let Some(index) = successors[current] else {
            return Err(if current == DEPOT {
                detached(&used)
            } else {
                ExtractionError::MissingDepotReturn { vehicle }
            });
        };

        if used.contains(index) {
            return Err(ExtractionError::MissingDepotReturn { vehicle });
        }
        used.insert(index);
        chain.push(arcs[index]);

        current = arcs[index].1;
        if current == DEPOT {
            break;
        }
        if visited.contains(current.get()) {
            return Err(ExtractionError::MissingDepotReturn { vehicle });
        }
        visited.insert(current.get());
    }

    if used.count_ones(..) != arcs.len() {
        return Err(detached(&used));
    }

    Ok(chain)
}

/// The objective reported by the solver must match the cost recomputed from the routes.
pub(crate) fn check_objective(
    reported: f64,
    recomputed: f64,
    tolerance: f64,
) -> Result<(), ExtractionError> {
    if (reported - recomputed).abs() <= tolerance * reported.abs().max(1.0) {
        Ok(())
    } else {
        Err(ExtractionError::ObjectiveMismatch {
            reported,
            recomputed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arc(from: usize, to: usize) -> (NodeIdx, NodeIdx, ()) {
        (NodeIdx::new(from), NodeIdx::new(to), ())
    }

    #[test]
    fn test_chain_arcs() {
        let chain = chain_arcs(
            VehicleIdx::new(0),
            4,
            &[arc(2, 0), arc(0, 3), arc(3, 2)],
        )
        .unwrap();

        assert_eq!(chain, vec![arc(0, 3), arc(3, 2), arc(2, 0)]);
    }

    #[test]
    fn test_no_arcs() {
        assert!(chain_arcs::<()>(VehicleIdx::new(0), 3, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_detached_cycle() {
        let error = chain_arcs(
            VehicleIdx::new(1),
            5,
            &[arc(0, 1), arc(1, 0), arc(2, 3), arc(3, 2)],
        )
        .unwrap_err();

        assert_eq!(
            error,
            ExtractionError::DetachedCycle {
                vehicle: VehicleIdx::new(1),
                nodes: vec![NodeIdx::new(2), NodeIdx::new(3)]
            }
        );
    }

    #[test]
    fn test_missing_depot_return() {
        let error = chain_arcs(VehicleIdx::new(0), 3, &[arc(0, 1), arc(1, 2)]).unwrap_err();

        assert_eq!(
            error,
            ExtractionError::MissingDepotReturn {
                vehicle: VehicleIdx::new(0)
            }
        );
    }

    #[test]
    fn test_branching_route() {
        let error = chain_arcs(VehicleIdx::new(0), 3, &[arc(0, 1), arc(0, 2)]).unwrap_err();

        assert!(matches!(error, ExtractionError::BranchingRoute { .. }));
    }

    #[test]
    fn test_check_objective() {
        assert!(check_objective(25.0, 25.00001, 1e-4).is_ok());
        assert!(check_objective(0.0, 0.00001, 1e-4).is_ok());
        assert!(check_objective(25.0, 30.0, 1e-4).is_err());
    }
}

use serde::Serialize;

use crate::{
    extraction::{
        checker::{Violation, verify_energy_solution, verify_routing_solution},
        route::{EnergyRoute, Route},
    },
    problem::{fleet::VehicleIdx, problem_instance::ProblemInstance},
    solver::{engine::SolveStatus, statistics::SolveStatistics},
};

/// Routes of the time-indexed model.
///
/// `objective` is the travel time only, the handling time is the same for every feasible
/// solution and is reported next to it.
#[derive(Debug, Clone, Serialize)]
pub struct RoutingSolution {
    routes: Vec<Route>,
    objective: f64,
    handling_time: f64,
    total_time: f64,
    status: SolveStatus,
    statistics: SolveStatistics,
}

impl RoutingSolution {
    pub fn new(
        routes: Vec<Route>,
        objective: f64,
        handling_time: f64,
        status: SolveStatus,
        statistics: SolveStatistics,
    ) -> Self {
        RoutingSolution {
            routes,
            objective,
            handling_time,
            total_time: objective + handling_time,
            status,
            statistics,
        }
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn objective(&self) -> f64 {
        self.objective
    }

    pub fn handling_time(&self) -> f64 {
        self.handling_time
    }

    /// Travel time plus handling time.
    pub fn total_time(&self) -> f64 {
        self.total_time
    }

    pub fn status(&self) -> SolveStatus {
        self.status
    }

    pub fn statistics(&self) -> &SolveStatistics {
        &self.statistics
    }

    pub fn verify(&self, instance: &ProblemInstance) -> Vec<Violation> {
        verify_routing_solution(instance, self)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CostBreakdown {
    pub fixed: f64,
    pub distance: f64,
    pub energy: f64,
}

impl CostBreakdown {
    pub fn total(&self) -> f64 {
        self.fixed + self.distance + self.energy
    }
}

/// Routes of the energy model, one per vehicle, idle vehicles included.
#[derive(Debug, Clone, Serialize)]
pub struct EnergySolution {
    routes: Vec<EnergyRoute>,
    objective: f64,
    costs: CostBreakdown,
    unused_vehicles: Vec<VehicleIdx>,
    status: SolveStatus,
    statistics: SolveStatistics,
}

impl EnergySolution {
    pub fn new(
        routes: Vec<EnergyRoute>,
        objective: f64,
        costs: CostBreakdown,
        status: SolveStatus,
        statistics: SolveStatistics,
    ) -> Self {
        let unused_vehicles = routes
            .iter()
            .filter(|route| !route.is_active())
            .map(EnergyRoute::vehicle)
            .collect();

        EnergySolution {
            routes,
            objective,
            costs,
            unused_vehicles,
            status,
            statistics,
        }
    }

    pub fn routes(&self) -> &[EnergyRoute] {
        &self.routes
    }

    pub fn active_routes(&self) -> impl Iterator<Item = &EnergyRoute> {
        self.routes.iter().filter(|route| route.is_active())
    }

    pub fn objective(&self) -> f64 {
        self.objective
    }

    pub fn costs(&self) -> CostBreakdown {
        self.costs
    }

    /// Vehicles that never leave the depot.
    pub fn unused_vehicles(&self) -> &[VehicleIdx] {
        &self.unused_vehicles
    }

    pub fn status(&self) -> SolveStatus {
        self.status
    }

    pub fn statistics(&self) -> &SolveStatistics {
        &self.statistics
    }

    pub fn verify(&self, instance: &ProblemInstance) -> Vec<Violation> {
        verify_energy_solution(instance, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        extraction::route::EnergyArc,
        problem::node::{DEPOT, NodeIdx},
    };

    #[test]
    fn test_cost_breakdown_total() {
        let costs = CostBreakdown {
            fixed: 1.0,
            distance: 36.0,
            energy: 4.5,
        };

        assert_eq!(costs.total(), 41.5);
    }

    #[test]
    fn test_unused_vehicles() {
        let active = EnergyRoute::new(
            VehicleIdx::new(0),
            vec![
                EnergyArc {
                    from: DEPOT,
                    to: NodeIdx::new(1),
                    load: 0.0,
                    distance: 1.0,
                    energy: 1.0,
                },
                EnergyArc {
                    from: NodeIdx::new(1),
                    to: DEPOT,
                    load: 10.0,
                    distance: 1.0,
                    energy: 2.0,
                },
            ],
            3.0,
        );
        let idle = EnergyRoute::new(VehicleIdx::new(1), vec![], 0.0);

        let solution = EnergySolution::new(
            vec![active, idle],
            4.0,
            CostBreakdown {
                fixed: 1.0,
                distance: 0.0,
                energy: 3.0,
            },
            SolveStatus::Optimal,
            SolveStatistics::default(),
        );

        assert_eq!(solution.unused_vehicles(), &[VehicleIdx::new(1)]);
        assert_eq!(solution.active_routes().count(), 1);
    }
}

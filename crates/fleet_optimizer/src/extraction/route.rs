use serde::Serialize;

use crate::problem::{
    fleet::VehicleIdx,
    node::{DEPOT, NodeIdx},
    periods::PeriodIdx,
};

/// A visit of a route. For the first stop, at the depot, `arrival` is the departure time.
#[derive(Debug, Clone, Serialize)]
pub struct Stop {
    pub node: NodeIdx,
    /// Period of the arc the vehicle arrived with, the period it left with for the
    /// first stop.
    pub period: PeriodIdx,
    pub arrival: f64,
    /// Load on board when leaving the node, the final load for the last stop.
    pub load: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Route {
    vehicle: VehicleIdx,
    stops: Vec<Stop>,
    travel_time: f64,
}

impl Route {
    pub fn new(vehicle: VehicleIdx, stops: Vec<Stop>, travel_time: f64) -> Self {
        Route {
            vehicle,
            stops,
            travel_time,
        }
    }

    pub fn vehicle(&self) -> VehicleIdx {
        self.vehicle
    }

    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    pub fn is_empty(&self) -> bool {
        self.stops.len() <= 2
    }

    /// Customers in visiting order.
    pub fn customers(&self) -> impl Iterator<Item = NodeIdx> {
        self.stops
            .iter()
            .map(|stop| stop.node)
            .filter(|node| *node != DEPOT)
    }

    pub fn travel_time(&self) -> f64 {
        self.travel_time
    }

    pub fn departure(&self) -> Option<f64> {
        self.stops.first().map(|stop| stop.arrival)
    }

    pub fn return_time(&self) -> Option<f64> {
        self.stops.last().map(|stop| stop.arrival)
    }

    pub fn duration(&self) -> f64 {
        match (self.departure(), self.return_time()) {
            (Some(departure), Some(back)) => back - departure,
            _ => 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EnergyArc {
    pub from: NodeIdx,
    pub to: NodeIdx,
    /// Value of the load flow on the arc.
    pub load: f64,
    pub distance: f64,
    /// `a + b * load`.
    pub energy: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnergyRoute {
    vehicle: VehicleIdx,
    arcs: Vec<EnergyArc>,
    peak_energy: f64,
}

impl EnergyRoute {
    pub fn new(vehicle: VehicleIdx, arcs: Vec<EnergyArc>, peak_energy: f64) -> Self {
        EnergyRoute {
            vehicle,
            arcs,
            peak_energy,
        }
    }

    pub fn vehicle(&self) -> VehicleIdx {
        self.vehicle
    }

    pub fn arcs(&self) -> &[EnergyArc] {
        &self.arcs
    }

    pub fn is_active(&self) -> bool {
        !self.arcs.is_empty()
    }

    /// Visited nodes, starting and ending at the depot. Empty for an idle vehicle.
    pub fn nodes(&self) -> Vec<NodeIdx> {
        let mut nodes: Vec<NodeIdx> = self.arcs.iter().map(|arc| arc.from).collect();
        if let Some(last) = self.arcs.last() {
            nodes.push(last.to);
        }
        nodes
    }

    pub fn customers(&self) -> impl Iterator<Item = NodeIdx> {
        self.arcs.iter().map(|arc| arc.to).filter(|node| *node != DEPOT)
    }

    pub fn distance(&self) -> f64 {
        self.arcs.iter().map(|arc| arc.distance).sum()
    }

    pub fn energy_draw(&self) -> f64 {
        self.arcs.iter().map(|arc| arc.energy).sum()
    }

    /// Value of `w[k]`.
    pub fn peak_energy(&self) -> f64 {
        self.peak_energy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stop(node: usize, arrival: f64) -> Stop {
        Stop {
            node: NodeIdx::new(node),
            period: PeriodIdx::new(0),
            arrival,
            load: 0.0,
        }
    }

    #[test]
    fn test_route() {
        let route = Route::new(
            VehicleIdx::new(0),
            vec![stop(0, 480.0), stop(2, 490.0), stop(1, 500.0), stop(0, 510.0)],
            15.0,
        );

        assert!(!route.is_empty());
        assert_eq!(
            route.customers().collect::<Vec<_>>(),
            vec![NodeIdx::new(2), NodeIdx::new(1)]
        );
        assert_eq!(route.duration(), 30.0);
    }

    #[test]
    fn test_energy_route() {
        let arc = |from: usize, to: usize| EnergyArc {
            from: NodeIdx::new(from),
            to: NodeIdx::new(to),
            load: 10.0,
            distance: 2.0,
            energy: 7.0,
        };
        let route = EnergyRoute::new(VehicleIdx::new(1), vec![arc(0, 1), arc(1, 0)], 14.0);

        assert!(route.is_active());
        assert_eq!(
            route.nodes(),
            vec![NodeIdx::new(0), NodeIdx::new(1), NodeIdx::new(0)]
        );
        assert_eq!(route.distance(), 4.0);
        assert_eq!(route.energy_draw(), 14.0);

        let idle = EnergyRoute::new(VehicleIdx::new(0), Vec::new(), 0.0);
        assert!(!idle.is_active());
        assert!(idle.nodes().is_empty());
    }
}

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::problem::{
    node::NodeIdx,
    validation::{ValidationError, check_square, check_values},
};

/// How the distance cost enters the energy objective.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DistanceCostMode {
    /// `c_M * distance` is charged for every arc and every vehicle, used or not. This is a
    /// constant that shifts the objective without influencing the routes.
    #[default]
    AllArcs,
    /// `c_M * distance` is only charged on the arcs a vehicle travels.
    UsedArcs,
}

/// Coefficients of the linear energy draw `a[i][j] + b[i][j] * load` of an arc and the
/// unit costs of the energy objective.
#[derive(Debug, Clone, Serialize)]
pub struct EnergyParameters {
    base_consumption: Vec<f64>,
    load_consumption: Vec<f64>,
    num_nodes: usize,
    energy_cost: f64,
    vehicle_fixed_cost: f64,
    distance_cost: f64,
    distance_cost_mode: DistanceCostMode,
}

impl EnergyParameters {
    #[inline]
    pub fn base_consumption(&self, from: NodeIdx, to: NodeIdx) -> f64 {
        self.base_consumption[from.get() * self.num_nodes + to.get()]
    }

    #[inline]
    pub fn load_consumption(&self, from: NodeIdx, to: NodeIdx) -> f64 {
        self.load_consumption[from.get() * self.num_nodes + to.get()]
    }

    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// `c_E`, cost per unit of energy budget.
    pub fn energy_cost(&self) -> f64 {
        self.energy_cost
    }

    /// `c_F`, cost of dispatching a vehicle.
    pub fn vehicle_fixed_cost(&self) -> f64 {
        self.vehicle_fixed_cost
    }

    /// `c_M`, cost per unit of distance.
    pub fn distance_cost(&self) -> f64 {
        self.distance_cost
    }

    pub fn distance_cost_mode(&self) -> DistanceCostMode {
        self.distance_cost_mode
    }

    pub(crate) fn nested_base_consumption(&self) -> Vec<Vec<f64>> {
        self.base_consumption
            .chunks(self.num_nodes.max(1))
            .map(<[f64]>::to_vec)
            .collect()
    }

    pub(crate) fn nested_load_consumption(&self) -> Vec<Vec<f64>> {
        self.load_consumption
            .chunks(self.num_nodes.max(1))
            .map(<[f64]>::to_vec)
            .collect()
    }
}

pub struct EnergyParametersBuilder {
    base_consumption: Option<Vec<Vec<f64>>>,
    load_consumption: Option<Vec<Vec<f64>>>,
    energy_cost: f64,
    vehicle_fixed_cost: f64,
    distance_cost: f64,
    distance_cost_mode: DistanceCostMode,
}

impl Default for EnergyParametersBuilder {
    fn default() -> Self {
        EnergyParametersBuilder {
            base_consumption: None,
            load_consumption: None,
            energy_cost: 1.0,
            vehicle_fixed_cost: 1.0,
            distance_cost: 1.0,
            distance_cost_mode: DistanceCostMode::default(),
        }
    }
}

impl EnergyParametersBuilder {
    pub fn set_base_consumption(&mut self, matrix: Vec<Vec<f64>>) -> &mut EnergyParametersBuilder {
        self.base_consumption = Some(matrix);
        self
    }

    pub fn set_load_consumption(&mut self, matrix: Vec<Vec<f64>>) -> &mut EnergyParametersBuilder {
        self.load_consumption = Some(matrix);
        self
    }

    /// Same base and per-load consumption on every arc.
    pub fn set_uniform_consumption(
        &mut self,
        num_nodes: usize,
        base: f64,
        per_load: f64,
    ) -> &mut EnergyParametersBuilder {
        self.base_consumption = Some(vec![vec![base; num_nodes]; num_nodes]);
        self.load_consumption = Some(vec![vec![per_load; num_nodes]; num_nodes]);
        self
    }

    pub fn set_energy_cost(&mut self, cost: f64) -> &mut EnergyParametersBuilder {
        self.energy_cost = cost;
        self
    }

    pub fn set_vehicle_fixed_cost(&mut self, cost: f64) -> &mut EnergyParametersBuilder {
        self.vehicle_fixed_cost = cost;
        self
    }

    pub fn set_distance_cost(&mut self, cost: f64) -> &mut EnergyParametersBuilder {
        self.distance_cost = cost;
        self
    }

    pub fn set_distance_cost_mode(
        &mut self,
        mode: DistanceCostMode,
    ) -> &mut EnergyParametersBuilder {
        self.distance_cost_mode = mode;
        self
    }

    pub fn build(self, num_nodes: usize) -> Result<EnergyParameters, ValidationError> {
        let base = self
            .base_consumption
            .unwrap_or_else(|| vec![vec![0.0; num_nodes]; num_nodes]);
        let load = self
            .load_consumption
            .unwrap_or_else(|| vec![vec![0.0; num_nodes]; num_nodes]);

        check_square("base consumption", &base, num_nodes)?;
        check_square("load consumption", &load, num_nodes)?;

        let base_consumption: Vec<f64> = base.into_iter().flatten().collect();
        let load_consumption: Vec<f64> = load.into_iter().flatten().collect();
        check_values("base consumption", &base_consumption, num_nodes, false)?;
        check_values("load consumption", &load_consumption, num_nodes, false)?;

        for (name, value) in [
            ("energy_cost", self.energy_cost),
            ("vehicle_fixed_cost", self.vehicle_fixed_cost),
            ("distance_cost", self.distance_cost),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ValidationError::InvalidCostCoefficient { name, value });
            }
        }

        Ok(EnergyParameters {
            base_consumption,
            load_consumption,
            num_nodes,
            energy_cost: self.energy_cost,
            vehicle_fixed_cost: self.vehicle_fixed_cost,
            distance_cost: self.distance_cost,
            distance_cost_mode: self.distance_cost_mode,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_consumption() {
        let mut builder = EnergyParametersBuilder::default();
        builder.set_uniform_consumption(3, 2.0, 0.5);
        let parameters = builder.build(3).unwrap();

        assert_eq!(
            parameters.base_consumption(NodeIdx::new(1), NodeIdx::new(2)),
            2.0
        );
        assert_eq!(
            parameters.load_consumption(NodeIdx::new(2), NodeIdx::new(0)),
            0.5
        );
        assert_eq!(parameters.energy_cost(), 1.0);
        assert_eq!(parameters.distance_cost_mode(), DistanceCostMode::AllArcs);
    }

    #[test]
    fn test_negative_cost() {
        let mut builder = EnergyParametersBuilder::default();
        builder.set_energy_cost(-1.0);

        assert_eq!(
            builder.build(2).unwrap_err(),
            ValidationError::InvalidCostCoefficient {
                name: "energy_cost",
                value: -1.0
            }
        );
    }

    #[test]
    fn test_wrong_dimension() {
        let mut builder = EnergyParametersBuilder::default();
        builder.set_base_consumption(vec![vec![0.0; 2]; 2]);

        assert!(matches!(
            builder.build(3),
            Err(ValidationError::MatrixDimension { .. })
        ));
    }
}

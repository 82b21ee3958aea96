use jiff::SignedDuration;
use serde::Serialize;

use crate::{define_index_newtype, utils::time::duration_to_minutes};

define_index_newtype!(VehicleIdx);

pub const DEFAULT_MAX_SHIFT_DURATION: SignedDuration = SignedDuration::from_hours(8);

/// Homogeneous fleet of vehicles all starting and ending their shift at the depot.
#[derive(Debug, Clone, Serialize)]
pub struct Fleet {
    num_vehicles: usize,
    capacity: f64,
    max_shift_duration: SignedDuration,
    battery_capacity: Option<f64>,
}

impl Fleet {
    pub fn num_vehicles(&self) -> usize {
        self.num_vehicles
    }

    pub fn vehicles(&self) -> impl DoubleEndedIterator<Item = VehicleIdx> + Clone {
        VehicleIdx::range(self.num_vehicles)
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn max_shift_duration(&self) -> SignedDuration {
        self.max_shift_duration
    }

    pub fn max_shift_minutes(&self) -> f64 {
        duration_to_minutes(self.max_shift_duration)
    }

    /// Energy budget per vehicle, only used by the energy model.
    pub fn battery_capacity(&self) -> Option<f64> {
        self.battery_capacity
    }
}

#[derive(Default)]
pub struct FleetBuilder {
    num_vehicles: Option<usize>,
    capacity: Option<f64>,
    max_shift_duration: Option<SignedDuration>,
    battery_capacity: Option<f64>,
}

impl FleetBuilder {
    pub fn set_num_vehicles(&mut self, num_vehicles: usize) -> &mut FleetBuilder {
        self.num_vehicles = Some(num_vehicles);
        self
    }

    pub fn set_capacity(&mut self, capacity: f64) -> &mut FleetBuilder {
        self.capacity = Some(capacity);
        self
    }

    pub fn set_max_shift_duration(&mut self, duration: SignedDuration) -> &mut FleetBuilder {
        self.max_shift_duration = Some(duration);
        self
    }

    pub fn set_battery_capacity(&mut self, battery_capacity: f64) -> &mut FleetBuilder {
        self.battery_capacity = Some(battery_capacity);
        self
    }

    pub fn build(self) -> Fleet {
        Fleet {
            num_vehicles: self.num_vehicles.unwrap_or(1),
            capacity: self.capacity.unwrap_or(0.0),
            max_shift_duration: self
                .max_shift_duration
                .unwrap_or(DEFAULT_MAX_SHIFT_DURATION),
            battery_capacity: self.battery_capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let mut builder = FleetBuilder::default();
        builder.set_num_vehicles(2).set_capacity(100.0);
        let fleet = builder.build();

        assert_eq!(fleet.num_vehicles(), 2);
        assert_eq!(fleet.capacity(), 100.0);
        assert_eq!(fleet.max_shift_minutes(), 480.0);
        assert_eq!(fleet.battery_capacity(), None);
        assert_eq!(fleet.vehicles().count(), 2);
    }
}

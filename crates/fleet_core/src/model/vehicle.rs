use h3o::CellIndex;

use crate::ids::{MechatronicsId, VehicleId};
use crate::model::{Membership, Passenger};
use crate::vehicle_state::VehicleState;

/// A fleet vehicle. Energy is stored in the units of its mechatronics (kWh or gallons).
#[derive(Debug, Clone, PartialEq)]
pub struct Vehicle {
    pub id: VehicleId,
    pub mechatronics_id: MechatronicsId,
    pub cell: CellIndex,
    pub energy: f64,
    pub membership: Membership,
    pub allows_pooling: bool,
    pub vehicle_state: VehicleState,
    pub distance_traveled_km: f64,
    pub idle_time_secs: u64,
}

impl Vehicle {
    /// A new vehicle, idle at `cell`.
    pub fn new(
        id: impl Into<VehicleId>,
        mechatronics_id: impl Into<MechatronicsId>,
        cell: CellIndex,
        energy: f64,
    ) -> Self {
        let id = id.into();
        Self {
            vehicle_state: VehicleState::idle(&id),
            id,
            mechatronics_id: mechatronics_id.into(),
            cell,
            energy,
            membership: Membership::public(),
            allows_pooling: false,
            distance_traveled_km: 0.0,
            idle_time_secs: 0,
        }
    }

    pub fn with_membership(mut self, membership: Membership) -> Self {
        self.membership = membership;
        self
    }

    pub fn with_pooling(mut self, allows_pooling: bool) -> Self {
        self.allows_pooling = allows_pooling;
        self
    }

    pub fn modify_state(&self, vehicle_state: VehicleState) -> Self {
        Self {
            vehicle_state,
            ..self.clone()
        }
    }

    pub fn modify_energy(&self, energy: f64) -> Self {
        Self {
            energy,
            ..self.clone()
        }
    }

    /// Relocate to `cell`, accumulating `distance_km` on the odometer.
    pub fn move_to(&self, cell: CellIndex, distance_km: f64) -> Self {
        Self {
            cell,
            distance_traveled_km: self.distance_traveled_km + distance_km,
            ..self.clone()
        }
    }

    pub fn add_idle_time(&self, secs: u64) -> Self {
        Self {
            idle_time_secs: self.idle_time_secs + secs,
            ..self.clone()
        }
    }

    /// Passengers on board, empty unless the vehicle is servicing a trip.
    pub fn passengers(&self) -> Vec<&Passenger> {
        self.vehicle_state.passengers()
    }

    pub fn has_passengers(&self) -> bool {
        !self.passengers().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{test_cell, test_cell_at_distance};
    use crate::vehicle_state::VehicleStateType;

    #[test]
    fn new_vehicle_is_idle_without_passengers() {
        let vehicle = Vehicle::new("v1", "bev", test_cell(), 50.0);
        assert_eq!(vehicle.vehicle_state.state_type(), VehicleStateType::Idle);
        assert!(!vehicle.has_passengers());
    }

    #[test]
    fn move_to_accumulates_distance() {
        let vehicle = Vehicle::new("v1", "bev", test_cell(), 50.0)
            .move_to(test_cell_at_distance(1), 0.2)
            .move_to(test_cell_at_distance(2), 0.3);
        assert_eq!(vehicle.cell, test_cell_at_distance(2));
        assert!((vehicle.distance_traveled_km - 0.5).abs() < 1e-12);
    }
}

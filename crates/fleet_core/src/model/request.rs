use h3o::CellIndex;

use crate::ids::{PassengerId, RequestId, SimTime, VehicleId};
use crate::model::Membership;

#[derive(Debug, Clone, PartialEq)]
pub struct Passenger {
    pub id: PassengerId,
    pub origin: CellIndex,
    pub destination: CellIndex,
    pub departure_time: SimTime,
    pub vehicle_id: Option<VehicleId>,
}

impl Passenger {
    pub fn board(&self, vehicle_id: &VehicleId) -> Self {
        Self {
            vehicle_id: Some(vehicle_id.clone()),
            ..self.clone()
        }
    }
}

/// A trip request waiting to be served.
///
/// Once a vehicle commits to it, `dispatched_vehicle` names that vehicle; the request leaves the
/// simulation on pickup (its passengers move into the vehicle state) or on cancellation.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub id: RequestId,
    pub origin: CellIndex,
    pub destination: CellIndex,
    pub departure_time: SimTime,
    pub cancel_time: SimTime,
    pub passengers: Vec<Passenger>,
    pub membership: Membership,
    pub allows_pooling: bool,
    /// Fare offered for the trip.
    pub value: f64,
    pub dispatched_vehicle: Option<VehicleId>,
    pub dispatched_vehicle_time: Option<SimTime>,
}

impl Request {
    /// Build a request with `passenger_count` passengers named `{id}-{n}`.
    pub fn build(
        id: impl Into<RequestId>,
        origin: CellIndex,
        destination: CellIndex,
        departure_time: SimTime,
        cancel_time: SimTime,
        passenger_count: usize,
    ) -> Self {
        let id = id.into();
        let passengers = (0..passenger_count)
            .map(|n| Passenger {
                id: PassengerId::new(format!("{id}-{n}")),
                origin,
                destination,
                departure_time,
                vehicle_id: None,
            })
            .collect();
        Self {
            id,
            origin,
            destination,
            departure_time,
            cancel_time,
            passengers,
            membership: Membership::public(),
            allows_pooling: false,
            value: 0.0,
            dispatched_vehicle: None,
            dispatched_vehicle_time: None,
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

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = value;
        self
    }

    pub fn is_dispatched(&self) -> bool {
        self.dispatched_vehicle.is_some()
    }

    pub fn passenger_count(&self) -> usize {
        self.passengers.len()
    }

    pub fn assign_dispatched_vehicle(&self, vehicle_id: &VehicleId, sim_time: SimTime) -> Self {
        Self {
            dispatched_vehicle: Some(vehicle_id.clone()),
            dispatched_vehicle_time: Some(sim_time),
            ..self.clone()
        }
    }

    pub fn unassign_dispatched_vehicle(&self) -> Self {
        Self {
            dispatched_vehicle: None,
            dispatched_vehicle_time: None,
            ..self.clone()
        }
    }

    /// Passengers with `vehicle_id` recorded as their ride.
    pub fn board_passengers(&self, vehicle_id: &VehicleId) -> Vec<Passenger> {
        self.passengers.iter().map(|p| p.board(vehicle_id)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{test_cell, test_cell_at_distance};

    #[test]
    fn build_names_passengers_after_request() {
        let request = Request::build("r1", test_cell(), test_cell_at_distance(3), 0, 600, 2);
        let ids: Vec<&str> = request.passengers.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["r1-0", "r1-1"]);
        assert!(!request.is_dispatched());
    }

    #[test]
    fn assign_and_unassign_round_trip() {
        let request = Request::build("r1", test_cell(), test_cell_at_distance(3), 0, 600, 1);
        let assigned = request.assign_dispatched_vehicle(&"v1".into(), 120);
        assert_eq!(assigned.dispatched_vehicle, Some(VehicleId::from("v1")));
        assert_eq!(assigned.dispatched_vehicle_time, Some(120));
        assert_eq!(assigned.unassign_dispatched_vehicle(), request);
    }
}

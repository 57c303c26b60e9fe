//! The authoritative snapshot of one simulated instant.
//!
//! A [`SimulationState`] is a value: every mutation primitive takes `&self` and returns a new
//! state, leaving the original untouched. Entity maps are reference counted and copied on write,
//! so a new snapshot shares every record it did not change with its predecessor.
//!
//! Higher-level transitions (entering a charging state, picking up a request) are built only from
//! the primitives below. That keeps the capacity and exclusivity invariants checkable in one
//! place: station and base pools change only through the checkout and return pairs.

use std::collections::BTreeMap;
use std::sync::Arc;

use bevy_ecs::prelude::Resource;
use h3o::CellIndex;

use crate::error::{SimulationStateError, StateResult};
use crate::ids::{BaseId, ChargerId, RequestId, SimTime, StationId, VehicleId};
use crate::model::{Base, Request, Station, Vehicle};
use crate::roadnetwork::RoadNetwork;
use crate::spatial::{EntitiesAtCell, SpatialIndex};

type EntityMap<K, V> = Arc<BTreeMap<K, Arc<V>>>;

#[derive(Debug, Clone, Resource)]
pub struct SimulationState {
    sim_time: SimTime,
    road_network: Arc<dyn RoadNetwork>,
    vehicles: EntityMap<VehicleId, Vehicle>,
    requests: EntityMap<RequestId, Request>,
    stations: EntityMap<StationId, Station>,
    bases: EntityMap<BaseId, Base>,
    spatial: Arc<SpatialIndex>,
}

impl SimulationState {
    pub fn new(road_network: Arc<dyn RoadNetwork>, sim_time: SimTime) -> Self {
        Self {
            sim_time,
            road_network,
            vehicles: Arc::default(),
            requests: Arc::default(),
            stations: Arc::default(),
            bases: Arc::default(),
            spatial: Arc::default(),
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn sim_time(&self) -> SimTime {
        self.sim_time
    }

    pub fn road_network(&self) -> &dyn RoadNetwork {
        self.road_network.as_ref()
    }

    pub fn vehicle(&self, id: &VehicleId) -> Option<&Vehicle> {
        self.vehicles.get(id).map(Arc::as_ref)
    }

    pub fn request(&self, id: &RequestId) -> Option<&Request> {
        self.requests.get(id).map(Arc::as_ref)
    }

    pub fn station(&self, id: &StationId) -> Option<&Station> {
        self.stations.get(id).map(Arc::as_ref)
    }

    pub fn base(&self, id: &BaseId) -> Option<&Base> {
        self.bases.get(id).map(Arc::as_ref)
    }

    pub fn require_vehicle(&self, id: &VehicleId) -> StateResult<&Vehicle> {
        self.vehicle(id)
            .ok_or_else(|| SimulationStateError::VehicleNotFound(id.clone()))
    }

    pub fn require_request(&self, id: &RequestId) -> StateResult<&Request> {
        self.request(id)
            .ok_or_else(|| SimulationStateError::RequestNotFound(id.clone()))
    }

    pub fn require_station(&self, id: &StationId) -> StateResult<&Station> {
        self.station(id)
            .ok_or_else(|| SimulationStateError::StationNotFound(id.clone()))
    }

    pub fn require_base(&self, id: &BaseId) -> StateResult<&Base> {
        self.base(id)
            .ok_or_else(|| SimulationStateError::BaseNotFound(id.clone()))
    }

    /// Vehicles in id order.
    pub fn vehicles(&self) -> impl Iterator<Item = &Vehicle> {
        self.vehicles.values().map(Arc::as_ref)
    }

    pub fn requests(&self) -> impl Iterator<Item = &Request> {
        self.requests.values().map(Arc::as_ref)
    }

    pub fn stations(&self) -> impl Iterator<Item = &Station> {
        self.stations.values().map(Arc::as_ref)
    }

    pub fn bases(&self) -> impl Iterator<Item = &Base> {
        self.bases.values().map(Arc::as_ref)
    }

    pub fn vehicle_ids(&self) -> Vec<VehicleId> {
        self.vehicles.keys().cloned().collect()
    }

    pub fn vehicle_count(&self) -> usize {
        self.vehicles.len()
    }

    pub fn request_count(&self) -> usize {
        self.requests.len()
    }

    pub fn spatial_index(&self) -> &SpatialIndex {
        &self.spatial
    }

    /// Every entity located at `cell`.
    pub fn at_cell(&self, cell: CellIndex) -> EntitiesAtCell {
        self.spatial.at_cell(cell)
    }

    // -----------------------------------------------------------------------
    // Construction
    // -----------------------------------------------------------------------

    /// Insert a vehicle, replacing any vehicle with the same id.
    pub fn add_vehicle(&self, vehicle: Vehicle) -> Self {
        let mut next = self.clone();
        Arc::make_mut(&mut next.spatial).place_vehicle(vehicle.id.clone(), vehicle.cell);
        Arc::make_mut(&mut next.vehicles).insert(vehicle.id.clone(), Arc::new(vehicle));
        next
    }

    /// Insert a request, replacing any request with the same id.
    pub fn add_request(&self, request: Request) -> Self {
        let mut next = self.clone();
        Arc::make_mut(&mut next.spatial).place_request(request.id.clone(), request.origin);
        Arc::make_mut(&mut next.requests).insert(request.id.clone(), Arc::new(request));
        next
    }

    pub fn add_station(&self, station: Station) -> Self {
        let mut next = self.clone();
        Arc::make_mut(&mut next.spatial).place_station(station.id.clone(), station.cell);
        Arc::make_mut(&mut next.stations).insert(station.id.clone(), Arc::new(station));
        next
    }

    pub fn add_base(&self, base: Base) -> Self {
        let mut next = self.clone();
        Arc::make_mut(&mut next.spatial).place_base(base.id.clone(), base.cell);
        Arc::make_mut(&mut next.bases).insert(base.id.clone(), Arc::new(base));
        next
    }

    /// Move the clock forward.
    pub fn advance_time(&self, secs: u64) -> Self {
        Self {
            sim_time: self.sim_time + secs,
            ..self.clone()
        }
    }

    // -----------------------------------------------------------------------
    // Mutation primitives
    // -----------------------------------------------------------------------

    /// Replace an existing vehicle, relocating it in the spatial index if it moved.
    pub fn modify_vehicle(&self, vehicle: Vehicle) -> StateResult<Self> {
        let previous = self.require_vehicle(&vehicle.id)?;
        let mut next = self.clone();
        if previous.cell != vehicle.cell {
            Arc::make_mut(&mut next.spatial).place_vehicle(vehicle.id.clone(), vehicle.cell);
        }
        Arc::make_mut(&mut next.vehicles).insert(vehicle.id.clone(), Arc::new(vehicle));
        Ok(next)
    }

    pub fn modify_request(&self, request: Request) -> StateResult<Self> {
        let previous = self.require_request(&request.id)?;
        let mut next = self.clone();
        if previous.origin != request.origin {
            Arc::make_mut(&mut next.spatial).place_request(request.id.clone(), request.origin);
        }
        Arc::make_mut(&mut next.requests).insert(request.id.clone(), Arc::new(request));
        Ok(next)
    }

    pub fn modify_station(&self, station: Station) -> StateResult<Self> {
        let previous = self.require_station(&station.id)?;
        let mut next = self.clone();
        if previous.cell != station.cell {
            Arc::make_mut(&mut next.spatial).place_station(station.id.clone(), station.cell);
        }
        Arc::make_mut(&mut next.stations).insert(station.id.clone(), Arc::new(station));
        Ok(next)
    }

    pub fn modify_base(&self, base: Base) -> StateResult<Self> {
        let previous = self.require_base(&base.id)?;
        let mut next = self.clone();
        if previous.cell != base.cell {
            Arc::make_mut(&mut next.spatial).place_base(base.id.clone(), base.cell);
        }
        Arc::make_mut(&mut next.bases).insert(base.id.clone(), Arc::new(base));
        Ok(next)
    }

    /// Delete a request, on pickup or cancellation.
    pub fn remove_request(&self, id: &RequestId) -> StateResult<Self> {
        self.require_request(id)?;
        let mut next = self.clone();
        Arc::make_mut(&mut next.spatial).remove_request(id);
        Arc::make_mut(&mut next.requests).remove(id);
        Ok(next)
    }

    /// Take one charger of `charger_id` at a station.
    ///
    /// `Ok(None)` when none is free; an error only when the station does not exist.
    pub fn checkout_charger(
        &self,
        station_id: &StationId,
        charger_id: &ChargerId,
    ) -> StateResult<Option<Self>> {
        let station = self.require_station(station_id)?;
        match station.checkout_charger(charger_id) {
            Some(updated) => self.modify_station(updated).map(Some),
            None => Ok(None),
        }
    }

    pub fn return_charger(
        &self,
        station_id: &StationId,
        charger_id: &ChargerId,
    ) -> StateResult<Self> {
        let station = self.require_station(station_id)?;
        let updated = station.return_charger(charger_id)?;
        self.modify_station(updated)
    }

    /// Take one stall at a base. `Ok(None)` when the base is full.
    pub fn checkout_stall(&self, base_id: &BaseId) -> StateResult<Option<Self>> {
        let base = self.require_base(base_id)?;
        match base.checkout_stall() {
            Some(updated) => self.modify_base(updated).map(Some),
            None => Ok(None),
        }
    }

    pub fn return_stall(&self, base_id: &BaseId) -> StateResult<Self> {
        let base = self.require_base(base_id)?;
        let updated = base.return_stall()?;
        self.modify_base(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ResourcePoolError;
    use crate::roadnetwork::H3GridRoadNetwork;
    use crate::test_helpers::{test_cell, test_cell_at_distance};

    fn empty_sim() -> SimulationState {
        SimulationState::new(Arc::new(H3GridRoadNetwork::default()), 0)
    }

    #[test]
    fn modify_is_a_new_value() {
        let sim = empty_sim().add_vehicle(Vehicle::new("v1", "bev", test_cell(), 10.0));
        let moved = sim
            .require_vehicle(&"v1".into())
            .expect("vehicle")
            .move_to(test_cell_at_distance(2), 0.5);

        let updated = sim.modify_vehicle(moved).expect("modify");

        assert_eq!(sim.require_vehicle(&"v1".into()).map(|v| v.cell), Ok(test_cell()));
        assert_eq!(
            updated.at_cell(test_cell_at_distance(2)).vehicles,
            vec![VehicleId::from("v1")]
        );
        assert!(updated.at_cell(test_cell()).vehicles.is_empty());
        assert!(sim.at_cell(test_cell_at_distance(2)).vehicles.is_empty());
    }

    #[test]
    fn modify_missing_entity_is_not_found() {
        let sim = empty_sim();
        let result = sim.modify_vehicle(Vehicle::new("ghost", "bev", test_cell(), 1.0));
        assert_eq!(
            result.err(),
            Some(SimulationStateError::VehicleNotFound("ghost".into()))
        );
        assert_eq!(
            sim.remove_request(&"r9".into()).err(),
            Some(SimulationStateError::RequestNotFound("r9".into()))
        );
    }

    #[test]
    fn charger_checkout_distinguishes_exhausted_from_missing() {
        let dcfc = ChargerId::from("DCFC");
        let sim = empty_sim().add_station(Station::build("s1", test_cell(), [(dcfc.clone(), 1)]));

        let taken = sim
            .checkout_charger(&"s1".into(), &dcfc)
            .expect("station exists")
            .expect("charger free");
        assert_eq!(
            taken.station(&"s1".into()).map(|s| s.available_chargers(&dcfc)),
            Some(0)
        );
        assert!(matches!(taken.checkout_charger(&"s1".into(), &dcfc), Ok(None)));
        assert!(matches!(
            sim.checkout_charger(&"nowhere".into(), &dcfc),
            Err(SimulationStateError::StationNotFound(_))
        ));

        let returned = taken.return_charger(&"s1".into(), &dcfc).expect("return");
        assert_eq!(returned.station(&"s1".into()), sim.station(&"s1".into()));
        assert_eq!(
            returned.return_charger(&"s1".into(), &dcfc).err(),
            Some(SimulationStateError::ResourcePool(ResourcePoolError::AlreadyFull { total: 1 }))
        );
    }

    #[test]
    fn stall_checkout_and_return() {
        let sim = empty_sim().add_base(Base::build("b1", test_cell(), 1));
        let reserved = sim
            .checkout_stall(&"b1".into())
            .expect("base exists")
            .expect("stall free");
        assert!(matches!(reserved.checkout_stall(&"b1".into()), Ok(None)));
        let released = reserved.return_stall(&"b1".into()).expect("return");
        assert_eq!(released.base(&"b1".into()), sim.base(&"b1".into()));
    }

    #[test]
    fn remove_request_clears_spatial_index() {
        let request = Request::build("r1", test_cell(), test_cell_at_distance(3), 0, 600, 1);
        let sim = empty_sim().add_request(request);
        assert_eq!(sim.at_cell(test_cell()).requests, vec![RequestId::from("r1")]);

        let removed = sim.remove_request(&"r1".into()).expect("remove");
        assert!(removed.request(&"r1".into()).is_none());
        assert!(removed.at_cell(test_cell()).requests.is_empty());
    }
}

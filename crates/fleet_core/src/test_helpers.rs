//! Test helpers for common fixture setup.
//!
//! Shared by unit tests and, through the `test-helpers` feature, by the integration tests and
//! benches. Every fixture lives around the same H3 cell so distances stay comparable.

use std::sync::Arc;

use h3o::CellIndex;

use crate::config::{Environment, SimConfig};
use crate::ids::ChargerId;
use crate::mechatronics::{Bev, Ice};
use crate::model::{Base, Request, Station, Vehicle};
use crate::roadnetwork::H3GridRoadNetwork;
use crate::simulation_state::SimulationState;

/// A standard test cell used across test files for consistency.
/// This is a valid H3 cell at resolution 9 in the San Francisco Bay Area.
pub const TEST_CELL: u64 = 0x8a1fb46622dffff;

/// Mechatronics id of the default battery electric test vehicle.
pub const MOCK_BEV: &str = "bev";
/// Mechatronics id of the default combustion test vehicle.
pub const MOCK_ICE: &str = "ice";

/// Get the test cell as a `CellIndex`.
///
/// # Panics
///
/// Panics if the test cell constant is invalid (should never happen).
pub fn test_cell() -> CellIndex {
    CellIndex::try_from(TEST_CELL).expect("TEST_CELL should be a valid H3 cell")
}

/// A cell exactly `k` grid steps from the test cell. Deterministic for a given `k`.
///
/// # Panics
///
/// Panics if the ring at distance `k` is empty (should never happen for small `k`).
pub fn test_cell_at_distance(k: u32) -> CellIndex {
    let origin = test_cell();
    if k == 0 {
        return origin;
    }
    origin
        .grid_disk::<Vec<_>>(k)
        .into_iter()
        .filter(|cell| origin.grid_distance(*cell).ok() == Some(k as i32))
        .min_by_key(|cell| u64::from(*cell))
        .expect("test cell should have a ring at this distance")
}

/// Get a neighbor cell of the test cell.
pub fn test_neighbor_cell() -> CellIndex {
    test_cell_at_distance(1)
}

/// An empty simulation over the H3 grid road network, at time zero.
pub fn mock_sim() -> SimulationState {
    SimulationState::new(Arc::new(H3GridRoadNetwork::default()), 0)
}

/// Default config with a 60 second time step.
pub fn mock_config() -> SimConfig {
    SimConfig::default()
}

/// Environment with the built-in chargers and both test powertrains registered.
pub fn mock_env() -> Environment {
    Environment::new(mock_config())
        .with_mechatronics(MOCK_BEV, Bev::default())
        .with_mechatronics(MOCK_ICE, Ice::default())
}

/// Idle battery electric vehicle at the test cell, at 50% SOC.
pub fn mock_vehicle(id: &str) -> Vehicle {
    mock_vehicle_at(id, test_cell())
}

pub fn mock_vehicle_at(id: &str, cell: CellIndex) -> Vehicle {
    Vehicle::new(id, MOCK_BEV, cell, Bev::default().capacity_kwh * 0.5)
}

/// Station at `cell` with a single DCFC charger.
pub fn mock_station(id: &str, cell: CellIndex) -> Station {
    Station::build(id, cell, [(ChargerId::from("DCFC"), 1)])
}

/// Base at `cell` with a single stall.
pub fn mock_base(id: &str, cell: CellIndex) -> Base {
    Base::build(id, cell, 1)
}

/// One-passenger request departing now, cancelling after ten minutes.
pub fn mock_request(id: &str, origin: CellIndex, destination: CellIndex) -> Request {
    Request::build(id, origin, destination, 0, 600, 1)
}

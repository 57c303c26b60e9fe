#![allow(dead_code)]

use h3o::CellIndex;
use fleet_core::config::Environment;
use fleet_core::ids::VehicleId;
use fleet_core::instruction::Instruction;
use fleet_core::mechatronics::{Bev, Ice, Mechatronics};
use fleet_core::model::{Base, Request, Station, Vehicle};
use fleet_core::simulation_state::SimulationState;
use fleet_core::test_helpers::{
    test_cell, test_cell_at_distance, test_neighbor_cell, MOCK_BEV, MOCK_ICE,
};
use fleet_core::update::step_vehicle;
use fleet_core::vehicle_state::{VehicleState, VehicleStateType};

/// Seeded helper cells so every test reuses the same geography.
pub fn seeded_cell() -> CellIndex {
    test_cell()
}

/// A nearby cell from the seeded geography.
pub fn seeded_neighbor_cell() -> CellIndex {
    test_neighbor_cell()
}

/// A cell `k` grid steps from the seeded cell.
pub fn seeded_cell_at(k: u32) -> CellIndex {
    test_cell_at_distance(k)
}

/// Battery electric vehicle at `cell` with the given state of charge.
pub fn bev_at(id: &str, cell: CellIndex, soc: f64) -> Vehicle {
    Vehicle::new(id, MOCK_BEV, cell, Bev::default().initial_energy(soc))
}

/// Combustion vehicle at `cell` with the given tank level.
pub fn ice_at(id: &str, cell: CellIndex, soc: f64) -> Vehicle {
    Vehicle::new(id, MOCK_ICE, cell, Ice::default().initial_energy(soc))
}

pub fn station_with(id: &str, cell: CellIndex, chargers: &[(&str, u32)]) -> Station {
    Station::build(
        id,
        cell,
        chargers
            .iter()
            .map(|(charger_id, count)| ((*charger_id).into(), *count)),
    )
}

/// A base with `stalls` stalls and a one-plug level 2 station on the same cell.
pub fn base_with_station(
    id: &str,
    station_id: &str,
    cell: CellIndex,
    stalls: u32,
) -> (Base, Station) {
    (
        Base::build(id, cell, stalls).with_station(station_id),
        station_with(station_id, cell, &[("LEVEL_2", 1)]),
    )
}

/// One-passenger request departing at zero that cancels at `cancel_time`.
pub fn request(id: &str, origin: CellIndex, destination: CellIndex, cancel_time: u64) -> Request {
    Request::build(id, origin, destination, 0, cancel_time, 1)
}

pub fn vehicle<'a>(sim: &'a SimulationState, id: &str) -> &'a Vehicle {
    sim.vehicle(&VehicleId::from(id)).expect("vehicle exists")
}

pub fn state_type(sim: &SimulationState, id: &str) -> VehicleStateType {
    vehicle(sim, id).vehicle_state.state_type()
}

pub fn vehicle_state(sim: &SimulationState, id: &str) -> VehicleState {
    vehicle(sim, id).vehicle_state.clone()
}

/// Apply an instruction that is expected to take effect.
pub fn instruct(
    sim: &SimulationState,
    env: &Environment,
    instruction: Instruction,
) -> SimulationState {
    instruction
        .apply(sim, env)
        .expect("instruction applies")
        .expect("instruction takes effect")
}

/// Step one vehicle, expecting success.
pub fn step(sim: &SimulationState, env: &Environment, id: &str) -> SimulationState {
    step_vehicle(sim, env, &id.into()).expect("vehicle steps")
}

/// Step one vehicle until its state type changes or `max_steps` pass.
pub fn step_until_state_changes(
    sim: &SimulationState,
    env: &Environment,
    id: &str,
    max_steps: usize,
) -> SimulationState {
    let start = state_type(sim, id);
    let mut current = sim.clone();
    for _ in 0..max_steps {
        current = step(&current, env, id);
        if state_type(&current, id) != start {
            return current;
        }
    }
    panic!("vehicle {id} stayed in {start} for {max_steps} steps");
}

//! Building blocks shared by the vehicle state implementations.

use h3o::CellIndex;
use log::debug;

use super::VehicleState;
use crate::config::Environment;
use crate::error::{SimulationStateError, StateResult};
use crate::ids::{BaseId, ChargerId, VehicleId};
use crate::model::{Charger, Membership, Vehicle};
use crate::roadnetwork::{traverse, Route};
use crate::simulation_state::SimulationState;

/// Install `state` as its vehicle's current state.
pub(super) fn install_state(
    sim: &SimulationState,
    state: VehicleState,
) -> StateResult<SimulationState> {
    let vehicle = sim.require_vehicle(state.vehicle_id())?;
    let updated = vehicle.modify_state(state);
    sim.modify_vehicle(updated)
}

/// True when `state` occupies a stall at `base_id`. A vehicle keeps its stall while it moves
/// between reserving and charging at the same base.
pub(super) fn holds_stall_at(state: &VehicleState, base_id: &BaseId) -> bool {
    match state {
        VehicleState::ReserveBase(reserve) => &reserve.base_id == base_id,
        VehicleState::ChargingBase(charging) => &charging.base_id == base_id,
        _ => false,
    }
}

/// Exit `from` and enter `to`, committing nothing when `to` refuses entry.
pub(crate) fn transition(
    sim: &SimulationState,
    env: &Environment,
    from: &VehicleState,
    to: &VehicleState,
) -> StateResult<Option<SimulationState>> {
    let exited = from.exit(to, sim, env)?;
    to.enter(&exited, env)
}

pub(super) fn ensure_access(
    vehicle: &Vehicle,
    membership: &Membership,
    entity: impl FnOnce() -> String,
) -> StateResult<()> {
    if membership.grant_access_to_membership(&vehicle.membership) {
        Ok(())
    } else {
        Err(SimulationStateError::AccessDenied {
            vehicle_id: vehicle.id.clone(),
            entity: entity(),
        })
    }
}

pub(super) fn ensure_route(
    route: &Route,
    origin: CellIndex,
    destination: CellIndex,
    what: impl FnOnce() -> String,
) -> StateResult<()> {
    if route.corresponds_with(origin, destination) {
        Ok(())
    } else {
        Err(SimulationStateError::GeometricMismatch(format!(
            "route does not lead from {origin} to {}",
            what()
        )))
    }
}

pub(super) fn ensure_colocated(
    vehicle: &Vehicle,
    cell: CellIndex,
    what: impl FnOnce() -> String,
) -> StateResult<()> {
    if vehicle.cell == cell {
        Ok(())
    } else {
        Err(SimulationStateError::GeometricMismatch(format!(
            "vehicle {} at {} is not at {}",
            vehicle.id,
            vehicle.cell,
            what()
        )))
    }
}

/// Look up `charger_id` and check the vehicle's powertrain can use it.
pub(super) fn usable_charger<'a>(
    env: &'a Environment,
    vehicle: &Vehicle,
    charger_id: &ChargerId,
) -> StateResult<&'a Charger> {
    let charger = env.charger(charger_id)?;
    let mechatronics = env.mechatronics_for(vehicle)?;
    if !mechatronics.valid_charger(charger) {
        return Err(SimulationStateError::InvalidCharger {
            vehicle_id: vehicle.id.clone(),
            charger_id: charger_id.clone(),
        });
    }
    Ok(charger)
}

/// Outcome of moving one vehicle along a route.
pub(super) struct MoveResult {
    pub sim: SimulationState,
    pub remaining_route: Route,
    pub remaining_time_secs: f64,
}

/// Move a vehicle along `route` for at most `duration_secs`, spending energy and accumulating
/// distance. The vehicle's state is left untouched; callers store `remaining_route` themselves.
pub(super) fn move_along_route(
    sim: &SimulationState,
    env: &Environment,
    vehicle_id: &VehicleId,
    route: &Route,
    duration_secs: f64,
) -> StateResult<MoveResult> {
    let traversal = traverse(route, sim.road_network(), duration_secs);
    if traversal.experienced_route.is_empty() {
        return Ok(MoveResult {
            sim: sim.clone(),
            remaining_route: traversal.remaining_route,
            remaining_time_secs: traversal.remaining_time_secs,
        });
    }

    let vehicle = sim.require_vehicle(vehicle_id)?;
    let mechatronics = env.mechatronics_for(vehicle)?;
    let cell = traversal
        .experienced_route
        .destination()
        .unwrap_or(vehicle.cell);
    let moved = mechatronics
        .move_vehicle(vehicle, &traversal.experienced_route)
        .move_to(cell, traversal.distance_km);

    Ok(MoveResult {
        sim: sim.modify_vehicle(moved)?,
        remaining_route: traversal.remaining_route,
        remaining_time_secs: traversal.remaining_time_secs,
    })
}

/// Charge a vehicle from `charger` for one time step.
pub(super) fn charge(
    sim: &SimulationState,
    env: &Environment,
    vehicle_id: &VehicleId,
    charger: &Charger,
) -> StateResult<SimulationState> {
    let vehicle = sim.require_vehicle(vehicle_id)?;
    let mechatronics = env.mechatronics_for(vehicle)?;
    let (charged, _secs_used) =
        mechatronics.add_energy(vehicle, charger, env.timestep_secs() as f64);
    sim.modify_vehicle(charged)
}

/// True once a charging vehicle reaches the configured upper SOC limit or is full.
pub(super) fn charge_complete(
    sim: &SimulationState,
    env: &Environment,
    vehicle_id: &VehicleId,
) -> StateResult<bool> {
    let vehicle = sim.require_vehicle(vehicle_id)?;
    let mechatronics = env.mechatronics_for(vehicle)?;
    Ok(mechatronics.is_full(vehicle)
        || mechatronics.fuel_source_soc(vehicle) >= env.config.soc_upper_limit)
}

/// Force a vehicle that ran dry into `OutOfService`, releasing what its current state holds.
pub(super) fn out_of_service_if_empty(
    sim: SimulationState,
    env: &Environment,
    vehicle_id: &VehicleId,
) -> StateResult<SimulationState> {
    let vehicle = sim.require_vehicle(vehicle_id)?;
    if !env.mechatronics_for(vehicle)?.is_empty(vehicle) {
        return Ok(sim);
    }
    let current = vehicle.vehicle_state.clone();
    let next = VehicleState::out_of_service(vehicle_id);
    debug!(
        "vehicle {vehicle_id} ran out of energy in {}",
        current.state_type()
    );
    let exited = current.exit(&next, &sim, env)?;
    let Some(entered) = next.enter(&exited, env)? else {
        return Err(SimulationStateError::TerminalStateNotEntered {
            vehicle_id: vehicle_id.clone(),
            state: next.state_type(),
        });
    };
    Ok(entered)
}

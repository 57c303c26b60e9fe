use super::vehicle_state_ops::{
    ensure_access, ensure_route, install_state, move_along_route, out_of_service_if_empty,
    usable_charger,
};
use super::{ChargingStation, VehicleState, VehicleStateBehavior, VehicleStateType};
use crate::config::Environment;
use crate::error::StateResult;
use crate::ids::{ChargerId, StationId, VehicleId};
use crate::roadnetwork::Route;
use crate::simulation_state::SimulationState;

/// Driving to a station to charge with `charger_id` on arrival.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchStation {
    pub vehicle_id: VehicleId,
    pub station_id: StationId,
    pub charger_id: ChargerId,
    pub route: Route,
}

impl VehicleStateBehavior for DispatchStation {
    fn vehicle_id(&self) -> &VehicleId {
        &self.vehicle_id
    }

    fn state_type(&self) -> VehicleStateType {
        VehicleStateType::DispatchStation
    }

    fn enter(
        &self,
        sim: &SimulationState,
        env: &Environment,
    ) -> StateResult<Option<SimulationState>> {
        let vehicle = sim.require_vehicle(&self.vehicle_id)?;
        let station = sim.require_station(&self.station_id)?;
        usable_charger(env, vehicle, &self.charger_id)?;
        ensure_access(vehicle, &station.membership, || {
            format!("station {}", station.id)
        })?;
        ensure_route(&self.route, vehicle.cell, station.cell, || {
            format!("station {}", station.id)
        })?;
        install_state(sim, VehicleState::DispatchStation(self.clone())).map(Some)
    }

    fn exit(
        &self,
        _next: &VehicleState,
        sim: &SimulationState,
        _env: &Environment,
    ) -> StateResult<SimulationState> {
        Ok(sim.clone())
    }

    fn has_reached_terminal_state_condition(
        &self,
        _sim: &SimulationState,
        _env: &Environment,
    ) -> StateResult<bool> {
        Ok(self.route.is_empty())
    }

    fn default_terminal_state(
        &self,
        _sim: &SimulationState,
        _env: &Environment,
    ) -> StateResult<VehicleState> {
        Ok(VehicleState::ChargingStation(ChargingStation {
            vehicle_id: self.vehicle_id.clone(),
            station_id: self.station_id.clone(),
            charger_id: self.charger_id.clone(),
        }))
    }

    fn perform_update(
        &self,
        sim: &SimulationState,
        env: &Environment,
    ) -> StateResult<SimulationState> {
        let moved = move_along_route(
            sim,
            env,
            &self.vehicle_id,
            &self.route,
            env.timestep_secs() as f64,
        )?;
        let updated = install_state(
            &moved.sim,
            VehicleState::DispatchStation(Self {
                route: moved.remaining_route,
                ..self.clone()
            }),
        )?;
        out_of_service_if_empty(updated, env, &self.vehicle_id)
    }
}

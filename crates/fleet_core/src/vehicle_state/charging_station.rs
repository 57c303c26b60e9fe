use log::debug;

use super::vehicle_state_ops::{
    charge, charge_complete, ensure_access, ensure_colocated, install_state, usable_charger,
};
use super::{VehicleState, VehicleStateBehavior, VehicleStateType};
use crate::config::Environment;
use crate::error::StateResult;
use crate::ids::{ChargerId, StationId, VehicleId};
use crate::simulation_state::SimulationState;

/// Plugged into one of a station's chargers. Holds the charger until exit.
#[derive(Debug, Clone, PartialEq)]
pub struct ChargingStation {
    pub vehicle_id: VehicleId,
    pub station_id: StationId,
    pub charger_id: ChargerId,
}

impl VehicleStateBehavior for ChargingStation {
    fn vehicle_id(&self) -> &VehicleId {
        &self.vehicle_id
    }

    fn state_type(&self) -> VehicleStateType {
        VehicleStateType::ChargingStation
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
        ensure_colocated(vehicle, station.cell, || format!("station {}", station.id))?;

        let Some(checked_out) = sim.checkout_charger(&self.station_id, &self.charger_id)? else {
            debug!(
                "vehicle {} found no free {} charger at station {}",
                self.vehicle_id, self.charger_id, self.station_id
            );
            return Ok(None);
        };
        install_state(&checked_out, VehicleState::ChargingStation(self.clone())).map(Some)
    }

    fn exit(
        &self,
        _next: &VehicleState,
        sim: &SimulationState,
        _env: &Environment,
    ) -> StateResult<SimulationState> {
        if sim.station(&self.station_id).is_none() {
            return Ok(sim.clone());
        }
        sim.return_charger(&self.station_id, &self.charger_id)
    }

    fn has_reached_terminal_state_condition(
        &self,
        sim: &SimulationState,
        env: &Environment,
    ) -> StateResult<bool> {
        charge_complete(sim, env, &self.vehicle_id)
    }

    fn default_terminal_state(
        &self,
        _sim: &SimulationState,
        _env: &Environment,
    ) -> StateResult<VehicleState> {
        Ok(VehicleState::idle(&self.vehicle_id))
    }

    fn perform_update(
        &self,
        sim: &SimulationState,
        env: &Environment,
    ) -> StateResult<SimulationState> {
        let charger = env.charger(&self.charger_id)?;
        charge(sim, env, &self.vehicle_id, charger)
    }
}

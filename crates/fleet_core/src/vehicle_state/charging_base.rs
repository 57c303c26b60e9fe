use log::debug;

use super::vehicle_state_ops::{
    charge, charge_complete, ensure_access, ensure_colocated, holds_stall_at, install_state,
    usable_charger,
};
use super::{ReserveBase, VehicleState, VehicleStateBehavior, VehicleStateType};
use crate::config::Environment;
use crate::error::{SimulationStateError, StateResult};
use crate::ids::{BaseId, ChargerId, StationId, VehicleId};
use crate::simulation_state::SimulationState;

/// Charging at a base, on a charger of the base's co-located station.
///
/// Holds a stall as well as the charger. A vehicle arriving from `ReserveBase` at the same base
/// keeps the stall it already has, and hands it back to `ReserveBase` once charged.
#[derive(Debug, Clone, PartialEq)]
pub struct ChargingBase {
    pub vehicle_id: VehicleId,
    pub base_id: BaseId,
    pub charger_id: ChargerId,
}

impl ChargingBase {
    fn station_id<'a>(&self, sim: &'a SimulationState) -> StateResult<&'a StationId> {
        let base = sim.require_base(&self.base_id)?;
        base.station_id
            .as_ref()
            .ok_or_else(|| {
                SimulationStateError::GeometricMismatch(format!(
                    "base {} has no station to charge at",
                    base.id
                ))
            })
    }
}

impl VehicleStateBehavior for ChargingBase {
    fn vehicle_id(&self) -> &VehicleId {
        &self.vehicle_id
    }

    fn state_type(&self) -> VehicleStateType {
        VehicleStateType::ChargingBase
    }

    fn enter(
        &self,
        sim: &SimulationState,
        env: &Environment,
    ) -> StateResult<Option<SimulationState>> {
        let vehicle = sim.require_vehicle(&self.vehicle_id)?;
        let base = sim.require_base(&self.base_id)?;
        let station_id = self.station_id(sim)?;
        sim.require_station(station_id)?;
        usable_charger(env, vehicle, &self.charger_id)?;
        ensure_access(vehicle, &base.membership, || format!("base {}", base.id))?;
        ensure_colocated(vehicle, base.cell, || format!("base {}", base.id))?;

        let Some(mut checked_out) = sim.checkout_charger(station_id, &self.charger_id)? else {
            debug!(
                "vehicle {} found no free {} charger at base {}",
                self.vehicle_id, self.charger_id, self.base_id
            );
            return Ok(None);
        };
        if !holds_stall_at(&vehicle.vehicle_state, &self.base_id) {
            let Some(parked) = checked_out.checkout_stall(&self.base_id)? else {
                debug!(
                    "vehicle {} found no free stall at base {}",
                    self.vehicle_id, self.base_id
                );
                return Ok(None);
            };
            checked_out = parked;
        }
        install_state(&checked_out, VehicleState::ChargingBase(self.clone())).map(Some)
    }

    fn exit(
        &self,
        next: &VehicleState,
        sim: &SimulationState,
        _env: &Environment,
    ) -> StateResult<SimulationState> {
        let Some(base) = sim.base(&self.base_id) else {
            return Ok(sim.clone());
        };
        let mut updated = match &base.station_id {
            Some(station_id) if sim.station(station_id).is_some() => {
                sim.return_charger(station_id, &self.charger_id)?
            }
            _ => sim.clone(),
        };
        if !holds_stall_at(next, &self.base_id) {
            updated = updated.return_stall(&self.base_id)?;
        }
        Ok(updated)
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
        Ok(VehicleState::ReserveBase(ReserveBase {
            vehicle_id: self.vehicle_id.clone(),
            base_id: self.base_id.clone(),
        }))
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

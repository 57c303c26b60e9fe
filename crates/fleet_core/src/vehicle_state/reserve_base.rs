use log::debug;

use super::vehicle_state_ops::{ensure_access, ensure_colocated, holds_stall_at, install_state};
use super::{VehicleState, VehicleStateBehavior, VehicleStateType};
use crate::config::Environment;
use crate::error::StateResult;
use crate::ids::{BaseId, VehicleId};
use crate::simulation_state::SimulationState;

/// Parked in a base stall, out of circulation until instructed otherwise.
///
/// The stall stays checked out while the vehicle charges at the same base.
#[derive(Debug, Clone, PartialEq)]
pub struct ReserveBase {
    pub vehicle_id: VehicleId,
    pub base_id: BaseId,
}

impl VehicleStateBehavior for ReserveBase {
    fn vehicle_id(&self) -> &VehicleId {
        &self.vehicle_id
    }

    fn state_type(&self) -> VehicleStateType {
        VehicleStateType::ReserveBase
    }

    fn enter(
        &self,
        sim: &SimulationState,
        _env: &Environment,
    ) -> StateResult<Option<SimulationState>> {
        let vehicle = sim.require_vehicle(&self.vehicle_id)?;
        let base = sim.require_base(&self.base_id)?;
        ensure_access(vehicle, &base.membership, || format!("base {}", base.id))?;
        ensure_colocated(vehicle, base.cell, || format!("base {}", base.id))?;

        if holds_stall_at(&vehicle.vehicle_state, &self.base_id) {
            return install_state(sim, VehicleState::ReserveBase(self.clone())).map(Some);
        }
        let Some(reserved) = sim.checkout_stall(&self.base_id)? else {
            debug!(
                "vehicle {} found no free stall at base {}",
                self.vehicle_id, self.base_id
            );
            return Ok(None);
        };
        install_state(&reserved, VehicleState::ReserveBase(self.clone())).map(Some)
    }

    fn exit(
        &self,
        next: &VehicleState,
        sim: &SimulationState,
        _env: &Environment,
    ) -> StateResult<SimulationState> {
        if holds_stall_at(next, &self.base_id) || sim.base(&self.base_id).is_none() {
            return Ok(sim.clone());
        }
        sim.return_stall(&self.base_id)
    }

    fn has_reached_terminal_state_condition(
        &self,
        _sim: &SimulationState,
        _env: &Environment,
    ) -> StateResult<bool> {
        Ok(false)
    }

    fn default_terminal_state(
        &self,
        _sim: &SimulationState,
        _env: &Environment,
    ) -> StateResult<VehicleState> {
        Ok(VehicleState::ReserveBase(self.clone()))
    }

    fn perform_update(
        &self,
        sim: &SimulationState,
        _env: &Environment,
    ) -> StateResult<SimulationState> {
        Ok(sim.clone())
    }
}

use super::vehicle_state_ops::{
    ensure_access, ensure_route, install_state, move_along_route, out_of_service_if_empty,
};
use super::{ReserveBase, VehicleState, VehicleStateBehavior, VehicleStateType};
use crate::config::Environment;
use crate::error::StateResult;
use crate::ids::{BaseId, VehicleId};
use crate::roadnetwork::Route;
use crate::simulation_state::SimulationState;

/// Driving to a base to reserve a stall on arrival.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchBase {
    pub vehicle_id: VehicleId,
    pub base_id: BaseId,
    pub route: Route,
}

impl VehicleStateBehavior for DispatchBase {
    fn vehicle_id(&self) -> &VehicleId {
        &self.vehicle_id
    }

    fn state_type(&self) -> VehicleStateType {
        VehicleStateType::DispatchBase
    }

    fn enter(
        &self,
        sim: &SimulationState,
        _env: &Environment,
    ) -> StateResult<Option<SimulationState>> {
        let vehicle = sim.require_vehicle(&self.vehicle_id)?;
        let base = sim.require_base(&self.base_id)?;
        ensure_access(vehicle, &base.membership, || format!("base {}", base.id))?;
        ensure_route(&self.route, vehicle.cell, base.cell, || {
            format!("base {}", base.id)
        })?;
        install_state(sim, VehicleState::DispatchBase(self.clone())).map(Some)
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
        let moved = move_along_route(
            sim,
            env,
            &self.vehicle_id,
            &self.route,
            env.timestep_secs() as f64,
        )?;
        let updated = install_state(
            &moved.sim,
            VehicleState::DispatchBase(Self {
                route: moved.remaining_route,
                ..self.clone()
            }),
        )?;
        out_of_service_if_empty(updated, env, &self.vehicle_id)
    }
}

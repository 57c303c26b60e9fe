use h3o::CellIndex;

use super::vehicle_state_ops::{
    ensure_route, install_state, move_along_route, out_of_service_if_empty,
};
use super::{VehicleState, VehicleStateBehavior, VehicleStateType};
use crate::config::Environment;
use crate::error::StateResult;
use crate::ids::VehicleId;
use crate::roadnetwork::Route;
use crate::simulation_state::SimulationState;

/// Driving empty to another part of the service area.
#[derive(Debug, Clone, PartialEq)]
pub struct Repositioning {
    pub vehicle_id: VehicleId,
    pub destination: CellIndex,
    pub route: Route,
}

impl VehicleStateBehavior for Repositioning {
    fn vehicle_id(&self) -> &VehicleId {
        &self.vehicle_id
    }

    fn state_type(&self) -> VehicleStateType {
        VehicleStateType::Repositioning
    }

    fn enter(
        &self,
        sim: &SimulationState,
        _env: &Environment,
    ) -> StateResult<Option<SimulationState>> {
        let vehicle = sim.require_vehicle(&self.vehicle_id)?;
        ensure_route(&self.route, vehicle.cell, self.destination, || {
            self.destination.to_string()
        })?;
        install_state(sim, VehicleState::Repositioning(self.clone())).map(Some)
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
        Ok(VehicleState::idle(&self.vehicle_id))
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
            VehicleState::Repositioning(Self {
                route: moved.remaining_route,
                ..self.clone()
            }),
        )?;
        out_of_service_if_empty(updated, env, &self.vehicle_id)
    }
}

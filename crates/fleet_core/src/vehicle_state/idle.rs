use super::vehicle_state_ops::{install_state, out_of_service_if_empty};
use super::{VehicleState, VehicleStateBehavior, VehicleStateType};
use crate::config::Environment;
use crate::error::StateResult;
use crate::ids::VehicleId;
use crate::simulation_state::SimulationState;

/// Parked where it stands, drawing idle energy.
#[derive(Debug, Clone, PartialEq)]
pub struct Idle {
    pub vehicle_id: VehicleId,
    /// Seconds spent in this idle spell.
    pub idle_duration_secs: u64,
}

impl Idle {
    pub fn new(vehicle_id: VehicleId) -> Self {
        Self {
            vehicle_id,
            idle_duration_secs: 0,
        }
    }
}

impl VehicleStateBehavior for Idle {
    fn vehicle_id(&self) -> &VehicleId {
        &self.vehicle_id
    }

    fn state_type(&self) -> VehicleStateType {
        VehicleStateType::Idle
    }

    fn enter(
        &self,
        sim: &SimulationState,
        _env: &Environment,
    ) -> StateResult<Option<SimulationState>> {
        install_state(sim, VehicleState::Idle(Self::new(self.vehicle_id.clone()))).map(Some)
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
        sim: &SimulationState,
        env: &Environment,
    ) -> StateResult<bool> {
        let vehicle = sim.require_vehicle(&self.vehicle_id)?;
        Ok(env.mechatronics_for(vehicle)?.is_empty(vehicle))
    }

    fn default_terminal_state(
        &self,
        _sim: &SimulationState,
        _env: &Environment,
    ) -> StateResult<VehicleState> {
        Ok(VehicleState::out_of_service(&self.vehicle_id))
    }

    fn perform_update(
        &self,
        sim: &SimulationState,
        env: &Environment,
    ) -> StateResult<SimulationState> {
        let secs = env.timestep_secs();
        let vehicle = sim.require_vehicle(&self.vehicle_id)?;
        let idled = env
            .mechatronics_for(vehicle)?
            .idle(vehicle, secs)
            .add_idle_time(secs)
            .modify_state(VehicleState::Idle(Self {
                vehicle_id: self.vehicle_id.clone(),
                idle_duration_secs: self.idle_duration_secs + secs,
            }));
        let updated = sim.modify_vehicle(idled)?;
        out_of_service_if_empty(updated, env, &self.vehicle_id)
    }
}

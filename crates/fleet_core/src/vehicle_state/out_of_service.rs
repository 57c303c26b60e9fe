use super::vehicle_state_ops::install_state;
use super::{VehicleState, VehicleStateBehavior, VehicleStateType};
use crate::config::Environment;
use crate::error::StateResult;
use crate::ids::VehicleId;
use crate::simulation_state::SimulationState;

/// Out of energy. Inert until an instruction puts the vehicle on a charger.
#[derive(Debug, Clone, PartialEq)]
pub struct OutOfService {
    pub vehicle_id: VehicleId,
}

impl OutOfService {
    pub fn new(vehicle_id: VehicleId) -> Self {
        Self { vehicle_id }
    }
}

impl VehicleStateBehavior for OutOfService {
    fn vehicle_id(&self) -> &VehicleId {
        &self.vehicle_id
    }

    fn state_type(&self) -> VehicleStateType {
        VehicleStateType::OutOfService
    }

    fn enter(
        &self,
        sim: &SimulationState,
        _env: &Environment,
    ) -> StateResult<Option<SimulationState>> {
        install_state(sim, VehicleState::OutOfService(self.clone())).map(Some)
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
        Ok(false)
    }

    fn default_terminal_state(
        &self,
        _sim: &SimulationState,
        _env: &Environment,
    ) -> StateResult<VehicleState> {
        Ok(VehicleState::OutOfService(self.clone()))
    }

    fn perform_update(
        &self,
        sim: &SimulationState,
        _env: &Environment,
    ) -> StateResult<SimulationState> {
        Ok(sim.clone())
    }
}

use log::debug;

use super::vehicle_state_ops::{
    ensure_access, ensure_route, install_state, move_along_route, out_of_service_if_empty,
};
use super::{
    ServicingPoolingTrip, ServicingTrip, TripPhase, VehicleState, VehicleStateBehavior,
    VehicleStateType,
};
use crate::config::Environment;
use crate::error::{SimulationStateError, StateResult};
use crate::ids::{RequestId, VehicleId};
use crate::roadnetwork::Route;
use crate::simulation_state::SimulationState;

/// Driving to pick up a request. The request is marked as dispatched to this vehicle while the
/// state lasts.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchTrip {
    pub vehicle_id: VehicleId,
    pub request_id: RequestId,
    pub route: Route,
}

impl VehicleStateBehavior for DispatchTrip {
    fn vehicle_id(&self) -> &VehicleId {
        &self.vehicle_id
    }

    fn state_type(&self) -> VehicleStateType {
        VehicleStateType::DispatchTrip
    }

    fn enter(
        &self,
        sim: &SimulationState,
        _env: &Environment,
    ) -> StateResult<Option<SimulationState>> {
        let vehicle = sim.require_vehicle(&self.vehicle_id)?;
        let Some(request) = sim.request(&self.request_id) else {
            debug!(
                "vehicle {} not dispatched: request {} no longer exists",
                self.vehicle_id, self.request_id
            );
            return Ok(None);
        };
        if request
            .dispatched_vehicle
            .as_ref()
            .is_some_and(|assigned| assigned != &self.vehicle_id)
        {
            debug!(
                "vehicle {} not dispatched: request {} already claimed",
                self.vehicle_id, self.request_id
            );
            return Ok(None);
        }
        ensure_access(vehicle, &request.membership, || {
            format!("request {}", request.id)
        })?;
        ensure_route(&self.route, vehicle.cell, request.origin, || {
            format!("request {} origin {}", request.id, request.origin)
        })?;

        let claimed = request.assign_dispatched_vehicle(&self.vehicle_id, sim.sim_time());
        let sim = sim.modify_request(claimed)?;
        install_state(&sim, VehicleState::DispatchTrip(self.clone())).map(Some)
    }

    fn exit(
        &self,
        _next: &VehicleState,
        sim: &SimulationState,
        _env: &Environment,
    ) -> StateResult<SimulationState> {
        match sim.request(&self.request_id) {
            Some(request) if request.dispatched_vehicle.as_ref() == Some(&self.vehicle_id) => {
                sim.modify_request(request.unassign_dispatched_vehicle())
            }
            _ => Ok(sim.clone()),
        }
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
        sim: &SimulationState,
        _env: &Environment,
    ) -> StateResult<VehicleState> {
        let vehicle = sim.require_vehicle(&self.vehicle_id)?;
        let Some(request) = sim.request(&self.request_id) else {
            return Ok(VehicleState::idle(&self.vehicle_id));
        };
        if request.origin != vehicle.cell {
            return Err(SimulationStateError::GeometricMismatch(format!(
                "vehicle {} ended its dispatch at {} but request {} waits at {}",
                vehicle.id, vehicle.cell, request.id, request.origin
            )));
        }

        if vehicle.allows_pooling && request.allows_pooling {
            let plan = [
                (request.id.clone(), TripPhase::Pickup),
                (request.id.clone(), TripPhase::Dropoff),
            ];
            if let Some(pooling) = ServicingPoolingTrip::plan(sim, vehicle, &plan) {
                return Ok(VehicleState::ServicingPoolingTrip(pooling));
            }
        }

        let route = sim.road_network().route(request.origin, request.destination);
        Ok(VehicleState::ServicingTrip(ServicingTrip::new(
            self.vehicle_id.clone(),
            self.request_id.clone(),
            route,
        )))
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
            VehicleState::DispatchTrip(Self {
                route: moved.remaining_route,
                ..self.clone()
            }),
        )?;
        out_of_service_if_empty(updated, env, &self.vehicle_id)
    }
}

use log::debug;

use super::vehicle_state_ops::{
    ensure_access, ensure_colocated, ensure_route, install_state, move_along_route,
    out_of_service_if_empty,
};
use super::{VehicleState, VehicleStateBehavior, VehicleStateType};
use crate::config::Environment;
use crate::error::StateResult;
use crate::ids::{RequestId, SimTime, VehicleId};
use crate::model::Passenger;
use crate::roadnetwork::Route;
use crate::simulation_state::SimulationState;

/// Carrying the passengers of one request to its destination.
///
/// Entering picks the request up: it is removed from the simulation and its passengers board.
/// They leave with the state once the route is complete.
#[derive(Debug, Clone, PartialEq)]
pub struct ServicingTrip {
    pub vehicle_id: VehicleId,
    pub request_id: RequestId,
    /// Pickup time.
    pub departure_time: SimTime,
    pub route: Route,
    pub passengers: Vec<Passenger>,
}

impl ServicingTrip {
    /// A trip not yet entered; passengers board on `enter`.
    pub fn new(vehicle_id: VehicleId, request_id: RequestId, route: Route) -> Self {
        Self {
            vehicle_id,
            request_id,
            departure_time: 0,
            route,
            passengers: Vec::new(),
        }
    }
}

impl VehicleStateBehavior for ServicingTrip {
    fn vehicle_id(&self) -> &VehicleId {
        &self.vehicle_id
    }

    fn state_type(&self) -> VehicleStateType {
        VehicleStateType::ServicingTrip
    }

    fn enter(
        &self,
        sim: &SimulationState,
        _env: &Environment,
    ) -> StateResult<Option<SimulationState>> {
        let vehicle = sim.require_vehicle(&self.vehicle_id)?;
        let Some(request) = sim.request(&self.request_id) else {
            debug!(
                "vehicle {} found no request {} to pick up",
                self.vehicle_id, self.request_id
            );
            return Ok(None);
        };
        if request
            .dispatched_vehicle
            .as_ref()
            .is_some_and(|assigned| assigned != &self.vehicle_id)
        {
            return Ok(None);
        }
        ensure_access(vehicle, &request.membership, || {
            format!("request {}", request.id)
        })?;
        ensure_colocated(vehicle, request.origin, || {
            format!("request {} origin", request.id)
        })?;
        ensure_route(&self.route, request.origin, request.destination, || {
            format!("request {} destination {}", request.id, request.destination)
        })?;

        let boarded = Self {
            departure_time: sim.sim_time(),
            passengers: request.board_passengers(&self.vehicle_id),
            ..self.clone()
        };
        let sim = sim.remove_request(&self.request_id)?;
        install_state(&sim, VehicleState::ServicingTrip(boarded)).map(Some)
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
            VehicleState::ServicingTrip(Self {
                route: moved.remaining_route,
                ..self.clone()
            }),
        )?;
        out_of_service_if_empty(updated, env, &self.vehicle_id)
    }
}

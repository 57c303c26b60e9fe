use std::collections::{BTreeMap, BTreeSet};

use log::debug;
use serde::{Deserialize, Serialize};

use super::vehicle_state_ops::{
    ensure_access, install_state, move_along_route, out_of_service_if_empty,
};
use super::{VehicleState, VehicleStateBehavior, VehicleStateType};
use crate::config::Environment;
use crate::error::{SimulationStateError, StateResult};
use crate::ids::{RequestId, VehicleId};
use crate::model::{Passenger, Vehicle};
use crate::roadnetwork::Route;
use crate::simulation_state::SimulationState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TripPhase {
    Pickup,
    Dropoff,
}

/// One stop of a pooling plan and the route that leads to it.
#[derive(Debug, Clone, PartialEq)]
pub struct PoolingLeg {
    pub request_id: RequestId,
    pub phase: TripPhase,
    pub route: Route,
}

/// Serving several requests with one vehicle along an ordered plan of pickups and dropoffs.
///
/// Legs run strictly in plan order. Arriving at a pickup removes the request from the
/// simulation and boards its passengers; arriving at a dropoff lets them off. Requests still
/// waiting for pickup stay dispatched to this vehicle until their leg is reached.
#[derive(Debug, Clone, PartialEq)]
pub struct ServicingPoolingTrip {
    pub vehicle_id: VehicleId,
    /// Legs not yet completed, in execution order.
    pub trip_plan: Vec<PoolingLeg>,
    pub boarded: BTreeMap<RequestId, Vec<Passenger>>,
}

impl ServicingPoolingTrip {
    /// Route a plan from the vehicle's position, carrying over anyone already aboard.
    ///
    /// `None` when a stop cannot be located: a pickup whose request is gone, or a dropoff for a
    /// request neither waiting nor aboard.
    pub fn plan(
        sim: &SimulationState,
        vehicle: &Vehicle,
        phases: &[(RequestId, TripPhase)],
    ) -> Option<Self> {
        let boarded = match &vehicle.vehicle_state {
            VehicleState::ServicingPoolingTrip(current) => current.boarded.clone(),
            VehicleState::ServicingTrip(current) if !current.passengers.is_empty() => {
                BTreeMap::from([(current.request_id.clone(), current.passengers.clone())])
            }
            _ => BTreeMap::new(),
        };

        let mut cursor = vehicle.cell;
        let mut trip_plan = Vec::with_capacity(phases.len());
        for (request_id, phase) in phases {
            let stop = match phase {
                TripPhase::Pickup => sim.request(request_id)?.origin,
                TripPhase::Dropoff => match sim.request(request_id) {
                    Some(request) => request.destination,
                    None => boarded.get(request_id)?.first()?.destination,
                },
            };
            trip_plan.push(PoolingLeg {
                request_id: request_id.clone(),
                phase: *phase,
                route: sim.road_network().route(cursor, stop),
            });
            cursor = stop;
        }

        Some(Self {
            vehicle_id: vehicle.id.clone(),
            trip_plan,
            boarded,
        })
    }

    pub fn current_route(&self) -> Option<&Route> {
        self.trip_plan.first().map(|leg| &leg.route)
    }

    pub fn boarded_passengers(&self) -> impl Iterator<Item = &Passenger> {
        self.boarded.values().flatten()
    }

    fn pending_pickups(&self) -> impl Iterator<Item = &RequestId> {
        self.trip_plan
            .iter()
            .filter(|leg| leg.phase == TripPhase::Pickup)
            .map(|leg| &leg.request_id)
    }

    /// Every request is picked up at most once and before its dropoff, and everyone aboard is
    /// dropped off by the end of the plan.
    fn validate_plan(&self) -> StateResult<()> {
        let invalid = |reason: String| SimulationStateError::InvalidTripPlan {
            vehicle_id: self.vehicle_id.clone(),
            reason,
        };
        let mut aboard: BTreeSet<&RequestId> = self.boarded.keys().collect();
        let mut picked: BTreeSet<&RequestId> = BTreeSet::new();
        for leg in &self.trip_plan {
            match leg.phase {
                TripPhase::Pickup => {
                    if aboard.contains(&leg.request_id) || !picked.insert(&leg.request_id) {
                        return Err(invalid(format!(
                            "request {} is picked up twice",
                            leg.request_id
                        )));
                    }
                    aboard.insert(&leg.request_id);
                }
                TripPhase::Dropoff => {
                    if !aboard.remove(&leg.request_id) {
                        return Err(invalid(format!(
                            "request {} is dropped off before pickup",
                            leg.request_id
                        )));
                    }
                }
            }
        }
        match aboard.first() {
            Some(request_id) => Err(invalid(format!(
                "request {request_id} is never dropped off"
            ))),
            None => Ok(()),
        }
    }

    /// Execute every leg at the head of the plan whose route is exhausted.
    fn complete_arrived_legs(&mut self, mut sim: SimulationState) -> StateResult<SimulationState> {
        while let Some(leg) = self.trip_plan.first() {
            if !leg.route.is_empty() {
                break;
            }
            let leg = self.trip_plan.remove(0);
            match leg.phase {
                TripPhase::Pickup => match sim.request(&leg.request_id) {
                    Some(request) => {
                        let passengers = request.board_passengers(&self.vehicle_id);
                        sim = sim.remove_request(&leg.request_id)?;
                        self.boarded.insert(leg.request_id, passengers);
                    }
                    None => {
                        debug!(
                            "vehicle {} found no request {} at pickup, dropping its legs",
                            self.vehicle_id, leg.request_id
                        );
                        self.trip_plan
                            .retain(|other| other.request_id != leg.request_id);
                    }
                },
                TripPhase::Dropoff => {
                    self.boarded.remove(&leg.request_id);
                }
            }
        }
        Ok(sim)
    }
}

impl VehicleStateBehavior for ServicingPoolingTrip {
    fn vehicle_id(&self) -> &VehicleId {
        &self.vehicle_id
    }

    fn state_type(&self) -> VehicleStateType {
        VehicleStateType::ServicingPoolingTrip
    }

    fn enter(
        &self,
        sim: &SimulationState,
        _env: &Environment,
    ) -> StateResult<Option<SimulationState>> {
        let vehicle = sim.require_vehicle(&self.vehicle_id)?;
        if !vehicle.allows_pooling {
            return Err(SimulationStateError::AccessDenied {
                vehicle_id: self.vehicle_id.clone(),
                entity: "pooling trip".to_string(),
            });
        }
        self.validate_plan()?;
        if let Some(route) = self.current_route() {
            if !route.starts_at(vehicle.cell) {
                return Err(SimulationStateError::GeometricMismatch(format!(
                    "pooling route does not start at vehicle {} position {}",
                    vehicle.id, vehicle.cell
                )));
            }
        }

        let mut updated = sim.clone();
        for request_id in self.pending_pickups() {
            let Some(request) = updated.request(request_id) else {
                debug!(
                    "vehicle {} not pooled: request {request_id} no longer exists",
                    self.vehicle_id
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
            if !request.allows_pooling {
                return Err(SimulationStateError::AccessDenied {
                    vehicle_id: self.vehicle_id.clone(),
                    entity: format!("request {request_id} (pooling not allowed)"),
                });
            }
            ensure_access(vehicle, &request.membership, || {
                format!("request {request_id}")
            })?;
            let claimed = request.assign_dispatched_vehicle(&self.vehicle_id, sim.sim_time());
            updated = updated.modify_request(claimed)?;
        }

        install_state(&updated, VehicleState::ServicingPoolingTrip(self.clone())).map(Some)
    }

    fn exit(
        &self,
        _next: &VehicleState,
        sim: &SimulationState,
        _env: &Environment,
    ) -> StateResult<SimulationState> {
        let mut updated = sim.clone();
        for request_id in self.pending_pickups() {
            if let Some(request) = updated.request(request_id) {
                if request.dispatched_vehicle.as_ref() == Some(&self.vehicle_id) {
                    let released = request.unassign_dispatched_vehicle();
                    updated = updated.modify_request(released)?;
                }
            }
        }
        Ok(updated)
    }

    fn has_reached_terminal_state_condition(
        &self,
        _sim: &SimulationState,
        _env: &Environment,
    ) -> StateResult<bool> {
        Ok(self.trip_plan.is_empty())
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
        let mut state = self.clone();
        let mut sim = state.complete_arrived_legs(sim.clone())?;
        let mut time_left = env.timestep_secs() as f64;

        while time_left > 0.0 {
            let Some(leg) = state.trip_plan.first() else {
                break;
            };
            let moved = move_along_route(&sim, env, &self.vehicle_id, &leg.route, time_left)?;
            if moved.remaining_route == leg.route {
                break;
            }
            time_left = moved.remaining_time_secs;
            state.trip_plan[0].route = moved.remaining_route;
            sim = state.complete_arrived_legs(moved.sim)?;
        }

        let updated = install_state(&sim, VehicleState::ServicingPoolingTrip(state))?;
        out_of_service_if_empty(updated, env, &self.vehicle_id)
    }
}

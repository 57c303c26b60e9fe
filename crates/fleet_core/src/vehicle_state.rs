//! Vehicle state machine.
//!
//! A vehicle is always in exactly one [`VehicleState`]. Each variant wraps a struct carrying only
//! the data its behaviour needs and implementing [`VehicleStateBehavior`]:
//!
//! - `enter` validates preconditions, performs the paired side effect on the counterpart entity
//!   (checkout a charger or stall, claim a request) and installs the state on the vehicle.
//!   `Ok(None)` means the target vanished or has no free resource; nothing was changed.
//! - `exit` releases whatever `enter` acquired. A missing counterpart makes it a no-op.
//! - `perform_update` advances the state by one time step.
//!
//! [`VehicleState::update`] runs one step: when the state has reached its terminal condition it
//! exits, enters the default terminal state and lets that state use the step; otherwise the
//! state's own update runs.

mod charging_base;
mod charging_station;
mod dispatch_base;
mod dispatch_station;
mod dispatch_trip;
mod idle;
mod out_of_service;
mod repositioning;
mod reserve_base;
mod servicing_pooling_trip;
mod servicing_trip;
mod vehicle_state_ops;

use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::Environment;
use crate::error::{SimulationStateError, StateResult};
use crate::ids::VehicleId;
use crate::model::Passenger;
use crate::roadnetwork::Route;
use crate::simulation_state::SimulationState;

pub use charging_base::ChargingBase;
pub use charging_station::ChargingStation;
pub use dispatch_base::DispatchBase;
pub use dispatch_station::DispatchStation;
pub use dispatch_trip::DispatchTrip;
pub use idle::Idle;
pub use out_of_service::OutOfService;
pub use repositioning::Repositioning;
pub use reserve_base::ReserveBase;
pub use servicing_pooling_trip::{PoolingLeg, ServicingPoolingTrip, TripPhase};
pub use servicing_trip::ServicingTrip;
pub(crate) use vehicle_state_ops::transition;

// ---------------------------------------------------------------------------
// State types and categories
// ---------------------------------------------------------------------------

/// Tag of a [`VehicleState`], without its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VehicleStateType {
    Idle,
    DispatchTrip,
    ServicingTrip,
    ServicingPoolingTrip,
    DispatchStation,
    ChargingStation,
    DispatchBase,
    ChargingBase,
    ReserveBase,
    Repositioning,
    OutOfService,
}

impl VehicleStateType {
    pub const ALL: [VehicleStateType; 11] = [
        VehicleStateType::Idle,
        VehicleStateType::DispatchTrip,
        VehicleStateType::ServicingTrip,
        VehicleStateType::ServicingPoolingTrip,
        VehicleStateType::DispatchStation,
        VehicleStateType::ChargingStation,
        VehicleStateType::DispatchBase,
        VehicleStateType::ChargingBase,
        VehicleStateType::ReserveBase,
        VehicleStateType::Repositioning,
        VehicleStateType::OutOfService,
    ];

    pub fn category(self) -> VehicleStateCategory {
        match self {
            VehicleStateType::DispatchTrip
            | VehicleStateType::ServicingTrip
            | VehicleStateType::ServicingPoolingTrip
            | VehicleStateType::DispatchStation
            | VehicleStateType::DispatchBase
            | VehicleStateType::Repositioning => VehicleStateCategory::Move,
            VehicleStateType::ChargingStation | VehicleStateType::ChargingBase => {
                VehicleStateCategory::Charge
            }
            VehicleStateType::Idle
            | VehicleStateType::ReserveBase
            | VehicleStateType::OutOfService => VehicleStateCategory::Stationary,
        }
    }

    pub fn is_servicing(self) -> bool {
        matches!(
            self,
            VehicleStateType::ServicingTrip | VehicleStateType::ServicingPoolingTrip
        )
    }
}

impl fmt::Display for VehicleStateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum VehicleStateCategory {
    Move,
    Charge,
    Stationary,
}

// ---------------------------------------------------------------------------
// Behaviour contract
// ---------------------------------------------------------------------------

/// Shared contract of every vehicle state.
pub trait VehicleStateBehavior {
    fn vehicle_id(&self) -> &VehicleId;

    fn state_type(&self) -> VehicleStateType;

    /// Validate, acquire counterpart resources and install this state on the vehicle.
    ///
    /// `Ok(None)` when the target vanished or no resource is free; the simulation is unchanged.
    fn enter(
        &self,
        sim: &SimulationState,
        env: &Environment,
    ) -> StateResult<Option<SimulationState>>;

    /// Release whatever `enter` acquired before moving to `next`.
    fn exit(
        &self,
        next: &VehicleState,
        sim: &SimulationState,
        env: &Environment,
    ) -> StateResult<SimulationState>;

    fn has_reached_terminal_state_condition(
        &self,
        sim: &SimulationState,
        env: &Environment,
    ) -> StateResult<bool>;

    /// The state to enter once the terminal condition holds.
    fn default_terminal_state(
        &self,
        sim: &SimulationState,
        env: &Environment,
    ) -> StateResult<VehicleState>;

    /// Advance one time step without considering the terminal condition.
    fn perform_update(
        &self,
        sim: &SimulationState,
        env: &Environment,
    ) -> StateResult<SimulationState>;
}

// ---------------------------------------------------------------------------
// VehicleState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum VehicleState {
    Idle(Idle),
    DispatchTrip(DispatchTrip),
    ServicingTrip(ServicingTrip),
    ServicingPoolingTrip(ServicingPoolingTrip),
    DispatchStation(DispatchStation),
    ChargingStation(ChargingStation),
    DispatchBase(DispatchBase),
    ChargingBase(ChargingBase),
    ReserveBase(ReserveBase),
    Repositioning(Repositioning),
    OutOfService(OutOfService),
}

impl VehicleState {
    pub fn idle(vehicle_id: &VehicleId) -> Self {
        VehicleState::Idle(Idle::new(vehicle_id.clone()))
    }

    pub fn out_of_service(vehicle_id: &VehicleId) -> Self {
        VehicleState::OutOfService(OutOfService::new(vehicle_id.clone()))
    }

    fn behavior(&self) -> &dyn VehicleStateBehavior {
        match self {
            VehicleState::Idle(state) => state,
            VehicleState::DispatchTrip(state) => state,
            VehicleState::ServicingTrip(state) => state,
            VehicleState::ServicingPoolingTrip(state) => state,
            VehicleState::DispatchStation(state) => state,
            VehicleState::ChargingStation(state) => state,
            VehicleState::DispatchBase(state) => state,
            VehicleState::ChargingBase(state) => state,
            VehicleState::ReserveBase(state) => state,
            VehicleState::Repositioning(state) => state,
            VehicleState::OutOfService(state) => state,
        }
    }

    pub fn vehicle_id(&self) -> &VehicleId {
        self.behavior().vehicle_id()
    }

    pub fn state_type(&self) -> VehicleStateType {
        self.behavior().state_type()
    }

    pub fn category(&self) -> VehicleStateCategory {
        self.state_type().category()
    }

    /// The route still to travel, for the moving states.
    pub fn route(&self) -> Option<&Route> {
        match self {
            VehicleState::DispatchTrip(state) => Some(&state.route),
            VehicleState::ServicingTrip(state) => Some(&state.route),
            VehicleState::ServicingPoolingTrip(state) => state.current_route(),
            VehicleState::DispatchStation(state) => Some(&state.route),
            VehicleState::DispatchBase(state) => Some(&state.route),
            VehicleState::Repositioning(state) => Some(&state.route),
            VehicleState::Idle(_)
            | VehicleState::ChargingStation(_)
            | VehicleState::ChargingBase(_)
            | VehicleState::ReserveBase(_)
            | VehicleState::OutOfService(_) => None,
        }
    }

    /// Passengers on board; empty outside the servicing states.
    pub fn passengers(&self) -> Vec<&Passenger> {
        match self {
            VehicleState::ServicingTrip(state) => state.passengers.iter().collect(),
            VehicleState::ServicingPoolingTrip(state) => state.boarded_passengers().collect(),
            _ => Vec::new(),
        }
    }

    pub fn enter(
        &self,
        sim: &SimulationState,
        env: &Environment,
    ) -> StateResult<Option<SimulationState>> {
        self.behavior().enter(sim, env)
    }

    pub fn exit(
        &self,
        next: &VehicleState,
        sim: &SimulationState,
        env: &Environment,
    ) -> StateResult<SimulationState> {
        self.behavior().exit(next, sim, env)
    }

    pub fn has_reached_terminal_state_condition(
        &self,
        sim: &SimulationState,
        env: &Environment,
    ) -> StateResult<bool> {
        self.behavior().has_reached_terminal_state_condition(sim, env)
    }

    pub fn default_terminal_state(
        &self,
        sim: &SimulationState,
        env: &Environment,
    ) -> StateResult<VehicleState> {
        self.behavior().default_terminal_state(sim, env)
    }

    pub fn perform_update(
        &self,
        sim: &SimulationState,
        env: &Environment,
    ) -> StateResult<SimulationState> {
        self.behavior().perform_update(sim, env)
    }

    /// Advance one time step, resolving the default terminal transition first when due.
    ///
    /// A terminal state that refuses to be entered (no free charger or stall, vanished target)
    /// is an error: the vehicle keeps its pre-update snapshot and the caller decides what to do.
    pub fn update(&self, sim: &SimulationState, env: &Environment) -> StateResult<SimulationState> {
        if !self.has_reached_terminal_state_condition(sim, env)? {
            return self.perform_update(sim, env);
        }

        let next = self.default_terminal_state(sim, env)?;
        let exited = self.exit(&next, sim, env)?;
        let Some(entered) = next.enter(&exited, env)? else {
            return Err(SimulationStateError::TerminalStateNotEntered {
                vehicle_id: self.vehicle_id().clone(),
                state: next.state_type(),
            });
        };
        debug!(
            "vehicle {} reached terminal condition: {} -> {}",
            self.vehicle_id(),
            self.state_type(),
            next.state_type()
        );

        // enter may have enriched the state (boarded passengers, pickup time)
        let installed = entered
            .require_vehicle(self.vehicle_id())?
            .vehicle_state
            .clone();
        installed.perform_update(&entered, env)
    }
}

/// Whether a vehicle in `from` may be sent to a state of type `to` by an instruction.
///
/// Identity is always allowed. A vehicle with passengers aboard may only be re-planned into a
/// pooling trip, and an out-of-service vehicle may only start charging where it stands.
pub fn can_transition(from: &VehicleState, to: VehicleStateType) -> bool {
    let from_type = from.state_type();
    if from_type == to {
        return true;
    }
    if !from.passengers().is_empty() {
        return to == VehicleStateType::ServicingPoolingTrip;
    }
    if from_type == VehicleStateType::OutOfService {
        return matches!(
            to,
            VehicleStateType::ChargingStation | VehicleStateType::ChargingBase
        );
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Passenger;
    use crate::test_helpers::{test_cell, test_cell_at_distance};

    fn servicing_with_passenger() -> VehicleState {
        VehicleState::ServicingTrip(ServicingTrip {
            vehicle_id: "v1".into(),
            request_id: "r1".into(),
            departure_time: 0,
            route: Route::empty(),
            passengers: vec![Passenger {
                id: "r1-0".into(),
                origin: test_cell(),
                destination: test_cell_at_distance(3),
                departure_time: 0,
                vehicle_id: Some("v1".into()),
            }],
        })
    }

    #[test]
    fn identity_is_always_allowed() {
        let states = [
            VehicleState::idle(&"v1".into()),
            VehicleState::out_of_service(&"v1".into()),
            servicing_with_passenger(),
        ];
        for state in &states {
            assert!(can_transition(state, state.state_type()));
        }
    }

    #[test]
    fn passengers_aboard_only_allow_pooling() {
        let servicing = servicing_with_passenger();
        for to in VehicleStateType::ALL {
            let expected = matches!(
                to,
                VehicleStateType::ServicingTrip | VehicleStateType::ServicingPoolingTrip
            );
            assert_eq!(can_transition(&servicing, to), expected, "to {to}");
        }
    }

    #[test]
    fn out_of_service_only_charges_in_place() {
        let oos = VehicleState::out_of_service(&"v1".into());
        assert!(can_transition(&oos, VehicleStateType::ChargingStation));
        assert!(can_transition(&oos, VehicleStateType::ChargingBase));
        assert!(!can_transition(&oos, VehicleStateType::DispatchTrip));
        assert!(!can_transition(&oos, VehicleStateType::Idle));
    }

    #[test]
    fn idle_may_go_anywhere() {
        let idle = VehicleState::idle(&"v1".into());
        assert!(VehicleStateType::ALL
            .iter()
            .all(|to| can_transition(&idle, *to)));
    }

    #[test]
    fn categories_cover_every_state() {
        use VehicleStateCategory::*;
        let moving = VehicleStateType::ALL
            .iter()
            .filter(|t| t.category() == Move)
            .count();
        let charging = VehicleStateType::ALL
            .iter()
            .filter(|t| t.category() == Charge)
            .count();
        let stationary = VehicleStateType::ALL
            .iter()
            .filter(|t| t.category() == Stationary)
            .count();
        assert_eq!((moving, charging, stationary), (6, 2, 3));
    }
}

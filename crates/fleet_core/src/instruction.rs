//! Instructions: the narrow interface through which a dispatch policy asks for state changes.
//!
//! An instruction names a vehicle and a target. Applying it routes the vehicle through the road
//! network, checks [`can_transition`], then exits the current state and enters the new one in a
//! single step. When the new state refuses entry (its request vanished, no charger is free)
//! nothing is committed and `apply` returns `Ok(None)`.

use h3o::CellIndex;
use log::debug;

use crate::config::Environment;
use crate::error::{SimulationStateError, StateResult};
use crate::ids::{BaseId, ChargerId, RequestId, StationId, VehicleId};
use crate::simulation_state::SimulationState;
use crate::vehicle_state::{
    can_transition, transition, ChargingBase, ChargingStation, DispatchBase, DispatchStation,
    DispatchTrip, Idle, Repositioning, ReserveBase, ServicingPoolingTrip, TripPhase,
    VehicleState, VehicleStateType,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    DispatchTrip {
        vehicle_id: VehicleId,
        request_id: RequestId,
    },
    /// Serve an ordered plan of pickups and dropoffs, starting now.
    DispatchPoolingTrip {
        vehicle_id: VehicleId,
        trip_plan: Vec<(RequestId, TripPhase)>,
    },
    DispatchStation {
        vehicle_id: VehicleId,
        station_id: StationId,
        charger_id: ChargerId,
    },
    /// Start charging at a station the vehicle is already at.
    ChargeStation {
        vehicle_id: VehicleId,
        station_id: StationId,
        charger_id: ChargerId,
    },
    DispatchBase {
        vehicle_id: VehicleId,
        base_id: BaseId,
    },
    ChargeBase {
        vehicle_id: VehicleId,
        base_id: BaseId,
        charger_id: ChargerId,
    },
    ReserveBase {
        vehicle_id: VehicleId,
        base_id: BaseId,
    },
    Reposition {
        vehicle_id: VehicleId,
        destination: CellIndex,
    },
    Idle {
        vehicle_id: VehicleId,
    },
}

impl Instruction {
    pub fn vehicle_id(&self) -> &VehicleId {
        match self {
            Instruction::DispatchTrip { vehicle_id, .. }
            | Instruction::DispatchPoolingTrip { vehicle_id, .. }
            | Instruction::DispatchStation { vehicle_id, .. }
            | Instruction::ChargeStation { vehicle_id, .. }
            | Instruction::DispatchBase { vehicle_id, .. }
            | Instruction::ChargeBase { vehicle_id, .. }
            | Instruction::ReserveBase { vehicle_id, .. }
            | Instruction::Reposition { vehicle_id, .. }
            | Instruction::Idle { vehicle_id } => vehicle_id,
        }
    }

    /// The state type this instruction moves its vehicle into.
    pub fn target_state_type(&self) -> VehicleStateType {
        match self {
            Instruction::DispatchTrip { .. } => VehicleStateType::DispatchTrip,
            Instruction::DispatchPoolingTrip { .. } => VehicleStateType::ServicingPoolingTrip,
            Instruction::DispatchStation { .. } => VehicleStateType::DispatchStation,
            Instruction::ChargeStation { .. } => VehicleStateType::ChargingStation,
            Instruction::DispatchBase { .. } => VehicleStateType::DispatchBase,
            Instruction::ChargeBase { .. } => VehicleStateType::ChargingBase,
            Instruction::ReserveBase { .. } => VehicleStateType::ReserveBase,
            Instruction::Reposition { .. } => VehicleStateType::Repositioning,
            Instruction::Idle { .. } => VehicleStateType::Idle,
        }
    }

    /// Build the target state, routing from the vehicle's current position.
    ///
    /// `None` when a referenced request no longer exists.
    fn target_state(&self, sim: &SimulationState) -> StateResult<Option<VehicleState>> {
        let vehicle = sim.require_vehicle(self.vehicle_id())?;
        let network = sim.road_network();
        let state = match self {
            Instruction::DispatchTrip {
                vehicle_id,
                request_id,
            } => {
                let Some(request) = sim.request(request_id) else {
                    return Ok(None);
                };
                VehicleState::DispatchTrip(DispatchTrip {
                    vehicle_id: vehicle_id.clone(),
                    request_id: request_id.clone(),
                    route: network.route(vehicle.cell, request.origin),
                })
            }
            Instruction::DispatchPoolingTrip { trip_plan, .. } => {
                match ServicingPoolingTrip::plan(sim, vehicle, trip_plan) {
                    Some(pooling) => VehicleState::ServicingPoolingTrip(pooling),
                    None => return Ok(None),
                }
            }
            Instruction::DispatchStation {
                vehicle_id,
                station_id,
                charger_id,
            } => {
                let station = sim.require_station(station_id)?;
                VehicleState::DispatchStation(DispatchStation {
                    vehicle_id: vehicle_id.clone(),
                    station_id: station_id.clone(),
                    charger_id: charger_id.clone(),
                    route: network.route(vehicle.cell, station.cell),
                })
            }
            Instruction::ChargeStation {
                vehicle_id,
                station_id,
                charger_id,
            } => VehicleState::ChargingStation(ChargingStation {
                vehicle_id: vehicle_id.clone(),
                station_id: station_id.clone(),
                charger_id: charger_id.clone(),
            }),
            Instruction::DispatchBase {
                vehicle_id,
                base_id,
            } => {
                let base = sim.require_base(base_id)?;
                VehicleState::DispatchBase(DispatchBase {
                    vehicle_id: vehicle_id.clone(),
                    base_id: base_id.clone(),
                    route: network.route(vehicle.cell, base.cell),
                })
            }
            Instruction::ChargeBase {
                vehicle_id,
                base_id,
                charger_id,
            } => VehicleState::ChargingBase(ChargingBase {
                vehicle_id: vehicle_id.clone(),
                base_id: base_id.clone(),
                charger_id: charger_id.clone(),
            }),
            Instruction::ReserveBase {
                vehicle_id,
                base_id,
            } => VehicleState::ReserveBase(ReserveBase {
                vehicle_id: vehicle_id.clone(),
                base_id: base_id.clone(),
            }),
            Instruction::Reposition {
                vehicle_id,
                destination,
            } => VehicleState::Repositioning(Repositioning {
                vehicle_id: vehicle_id.clone(),
                destination: *destination,
                route: network.route(vehicle.cell, *destination),
            }),
            Instruction::Idle { vehicle_id } => VehicleState::Idle(Idle::new(vehicle_id.clone())),
        };
        Ok(Some(state))
    }

    /// Apply this instruction to `sim`.
    ///
    /// Errors when the vehicle is missing, the transition is not allowed, or the target state's
    /// preconditions fail. `Ok(None)` when the target vanished or has no free resource.
    pub fn apply(
        &self,
        sim: &SimulationState,
        env: &Environment,
    ) -> StateResult<Option<SimulationState>> {
        let vehicle = sim.require_vehicle(self.vehicle_id())?;
        let current = &vehicle.vehicle_state;
        let target = self.target_state_type();
        if !can_transition(current, target) {
            return Err(SimulationStateError::InvalidTransition {
                vehicle_id: vehicle.id.clone(),
                from: current.state_type(),
                to: target,
            });
        }

        let Some(next) = self.target_state(sim)? else {
            debug!(
                "instruction for vehicle {} skipped: target no longer exists",
                vehicle.id
            );
            return Ok(None);
        };
        transition(sim, env, current, &next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{mock_env, mock_sim, mock_vehicle, test_cell_at_distance};

    #[test]
    fn targets_match_instruction_kind() {
        let instruction = Instruction::Reposition {
            vehicle_id: "v1".into(),
            destination: test_cell_at_distance(3),
        };
        assert_eq!(instruction.vehicle_id().as_str(), "v1");
        assert_eq!(
            instruction.target_state_type(),
            VehicleStateType::Repositioning
        );
    }

    #[test]
    fn reposition_installs_route_to_destination() {
        let sim = mock_sim().add_vehicle(mock_vehicle("v1"));
        let env = mock_env();
        let instruction = Instruction::Reposition {
            vehicle_id: "v1".into(),
            destination: test_cell_at_distance(4),
        };

        let updated = instruction
            .apply(&sim, &env)
            .expect("apply")
            .expect("entered");

        let vehicle = updated.require_vehicle(&"v1".into()).expect("vehicle");
        assert_eq!(
            vehicle.vehicle_state.state_type(),
            VehicleStateType::Repositioning
        );
        let route = vehicle.vehicle_state.route().expect("moving state has a route");
        assert_eq!(route.destination(), Some(test_cell_at_distance(4)));
    }

    #[test]
    fn dispatch_to_missing_request_is_a_no_op() {
        let sim = mock_sim().add_vehicle(mock_vehicle("v1"));
        let instruction = Instruction::DispatchTrip {
            vehicle_id: "v1".into(),
            request_id: "gone".into(),
        };
        assert!(matches!(instruction.apply(&sim, &mock_env()), Ok(None)));
    }

    #[test]
    fn unknown_vehicle_is_an_error() {
        let instruction = Instruction::Idle {
            vehicle_id: "ghost".into(),
        };
        assert_eq!(
            instruction.apply(&mock_sim(), &mock_env()).err(),
            Some(SimulationStateError::VehicleNotFound("ghost".into()))
        );
    }
}

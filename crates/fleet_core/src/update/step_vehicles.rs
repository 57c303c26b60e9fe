use log::warn;

use super::UpdateOutcome;
use crate::config::Environment;
use crate::error::{ResultExt, StateResult};
use crate::ids::VehicleId;
use crate::reports::Report;
use crate::simulation_state::SimulationState;

/// Advance one vehicle by one time step.
pub fn step_vehicle(
    sim: &SimulationState,
    env: &Environment,
    vehicle_id: &VehicleId,
) -> StateResult<SimulationState> {
    let state = sim.require_vehicle(vehicle_id)?.vehicle_state.clone();
    state
        .update(sim, env)
        .context(|| format!("vehicle {vehicle_id} in state {}", state.state_type()))
}

/// Advance every vehicle by one time step, in id order.
///
/// Errors are isolated per vehicle: a failing vehicle keeps its pre-update snapshot, a
/// `VehicleError` report is emitted, and the remaining vehicles still step.
pub fn step_vehicles(sim: &SimulationState, env: &Environment) -> UpdateOutcome {
    let now = sim.sim_time();
    let mut updated = sim.clone();
    let mut reports = Vec::new();

    for vehicle_id in sim.vehicle_ids() {
        let Some(before) = updated
            .vehicle(&vehicle_id)
            .map(|vehicle| vehicle.vehicle_state.state_type())
        else {
            continue;
        };
        match step_vehicle(&updated, env, &vehicle_id) {
            Ok(next) => {
                if let Some(after) = next
                    .vehicle(&vehicle_id)
                    .map(|vehicle| vehicle.vehicle_state.state_type())
                {
                    if after != before {
                        reports.push(Report::VehicleTransition {
                            sim_time: now,
                            vehicle_id: vehicle_id.clone(),
                            from: before,
                            to: after,
                        });
                    }
                }
                updated = next;
            }
            Err(err) => {
                warn!("{err}");
                reports.push(Report::VehicleError {
                    sim_time: now,
                    vehicle_id,
                    state: before,
                    message: err.to_string(),
                });
            }
        }
    }

    UpdateOutcome {
        sim: updated,
        reports,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimulationStateError;
    use crate::test_helpers::{mock_env, mock_sim, mock_station, mock_vehicle, test_cell};
    use crate::vehicle_state::{DispatchStation, VehicleState, VehicleStateType};

    #[test]
    fn failing_vehicle_keeps_its_snapshot_while_others_step() {
        // both vehicles arrive at a one-charger station in the same tick
        let station = mock_station("s1", test_cell());
        let arriving = |id: &str| {
            let vehicle = mock_vehicle(id);
            let state = VehicleState::DispatchStation(DispatchStation {
                vehicle_id: vehicle.id.clone(),
                station_id: "s1".into(),
                charger_id: "DCFC".into(),
                route: Default::default(),
            });
            vehicle.modify_state(state)
        };
        let sim = mock_sim()
            .add_station(station)
            .add_vehicle(arriving("v1"))
            .add_vehicle(arriving("v2"));

        let outcome = step_vehicles(&sim, &mock_env());

        let state_of = |id: &str| {
            outcome
                .sim
                .require_vehicle(&id.into())
                .map(|v| v.vehicle_state.state_type())
        };
        assert_eq!(state_of("v1"), Ok(VehicleStateType::ChargingStation));
        assert_eq!(state_of("v2"), Ok(VehicleStateType::DispatchStation));
        assert_eq!(
            outcome.sim.require_vehicle(&"v2".into()).ok(),
            sim.vehicle(&"v2".into())
        );
        assert!(matches!(
            outcome.reports.as_slice(),
            [
                Report::VehicleTransition { .. },
                Report::VehicleError { vehicle_id, state: VehicleStateType::DispatchStation, .. },
            ] if vehicle_id.as_str() == "v2"
        ));
    }

    #[test]
    fn step_vehicle_wraps_errors_with_context() {
        let err = step_vehicle(&mock_sim(), &mock_env(), &"ghost".into()).unwrap_err();
        assert_eq!(err, SimulationStateError::VehicleNotFound("ghost".into()));

        let orphan = mock_vehicle("v1").modify_state(VehicleState::DispatchStation(
            DispatchStation {
                vehicle_id: "v1".into(),
                station_id: "nowhere".into(),
                charger_id: "DCFC".into(),
                route: Default::default(),
            },
        ));
        let sim = mock_sim().add_vehicle(orphan);
        let err = step_vehicle(&sim, &mock_env(), &"v1".into()).unwrap_err();
        assert!(err.to_string().starts_with("vehicle v1 in state DispatchStation"));
        assert_eq!(
            err.root_cause(),
            &SimulationStateError::StationNotFound("nowhere".into())
        );
    }
}

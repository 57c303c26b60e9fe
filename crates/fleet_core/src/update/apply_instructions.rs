use std::collections::BTreeSet;

use log::{debug, warn};

use super::UpdateOutcome;
use crate::config::Environment;
use crate::error::ResultExt;
use crate::instruction::Instruction;
use crate::reports::Report;
use crate::simulation_state::SimulationState;

/// Apply instructions in order, at most one per vehicle per tick.
///
/// Each instruction commits on its own: a failing or skipped instruction is reported and the
/// remaining ones still apply. Later instructions for an already instructed vehicle are dropped.
pub fn apply_instructions(
    sim: &SimulationState,
    env: &Environment,
    instructions: &[Instruction],
) -> UpdateOutcome {
    let now = sim.sim_time();
    let mut updated = sim.clone();
    let mut reports = Vec::new();
    let mut instructed = BTreeSet::new();

    for instruction in instructions {
        let vehicle_id = instruction.vehicle_id();
        let description = format!("{instruction:?}");
        if !instructed.insert(vehicle_id.clone()) {
            debug!("dropping second instruction for vehicle {vehicle_id} this tick");
            reports.push(Report::InstructionFailed {
                sim_time: now,
                vehicle_id: vehicle_id.clone(),
                instruction: description,
                message: "vehicle already instructed this tick".to_string(),
            });
            continue;
        }

        let before = updated
            .vehicle(vehicle_id)
            .map(|vehicle| vehicle.vehicle_state.state_type());
        match instruction
            .apply(&updated, env)
            .context(|| format!("applying instruction to vehicle {vehicle_id}"))
        {
            Ok(Some(next)) => {
                let after = next
                    .vehicle(vehicle_id)
                    .map(|vehicle| vehicle.vehicle_state.state_type());
                if let (Some(from), Some(to)) = (before, after) {
                    if from != to {
                        reports.push(Report::VehicleTransition {
                            sim_time: now,
                            vehicle_id: vehicle_id.clone(),
                            from,
                            to,
                        });
                    }
                }
                reports.push(Report::InstructionApplied {
                    sim_time: now,
                    vehicle_id: vehicle_id.clone(),
                    instruction: description,
                });
                updated = next;
            }
            Ok(None) => {
                debug!("instruction for vehicle {vehicle_id} had no effect");
                reports.push(Report::InstructionFailed {
                    sim_time: now,
                    vehicle_id: vehicle_id.clone(),
                    instruction: description,
                    message: "target unavailable".to_string(),
                });
            }
            Err(err) => {
                warn!("{err}");
                reports.push(Report::InstructionFailed {
                    sim_time: now,
                    vehicle_id: vehicle_id.clone(),
                    instruction: description,
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
    use crate::test_helpers::{
        mock_env, mock_request, mock_sim, mock_vehicle, test_cell_at_distance,
    };
    use crate::vehicle_state::{VehicleState, VehicleStateType};

    #[test]
    fn first_vehicle_wins_a_contested_request() {
        let request = mock_request("r1", test_cell_at_distance(2), test_cell_at_distance(5));
        let sim = mock_sim()
            .add_vehicle(mock_vehicle("v1"))
            .add_vehicle(mock_vehicle("v2"))
            .add_request(request);
        let instructions = [
            Instruction::DispatchTrip {
                vehicle_id: "v1".into(),
                request_id: "r1".into(),
            },
            Instruction::DispatchTrip {
                vehicle_id: "v2".into(),
                request_id: "r1".into(),
            },
        ];

        let outcome = apply_instructions(&sim, &mock_env(), &instructions);

        let state_of = |id: &str| {
            outcome
                .sim
                .require_vehicle(&id.into())
                .map(|v| v.vehicle_state.state_type())
        };
        assert_eq!(state_of("v1"), Ok(VehicleStateType::DispatchTrip));
        assert_eq!(state_of("v2"), Ok(VehicleStateType::Idle));
        assert_eq!(
            outcome
                .sim
                .request(&"r1".into())
                .and_then(|r| r.dispatched_vehicle.clone()),
            Some("v1".into())
        );
        assert!(outcome.reports.iter().any(|r| matches!(
            r,
            Report::InstructionFailed { vehicle_id, .. } if vehicle_id.as_str() == "v2"
        )));
    }

    #[test]
    fn invalid_transition_is_reported_and_isolated() {
        let sim = mock_sim()
            .add_vehicle(mock_vehicle("v1").modify_energy(0.0))
            .add_vehicle(mock_vehicle("v2"));
        let sim = {
            let oos = sim
                .require_vehicle(&"v1".into())
                .expect("v1")
                .modify_state(VehicleState::out_of_service(&"v1".into()));
            sim.modify_vehicle(oos).expect("modify")
        };
        let instructions = [
            Instruction::Reposition {
                vehicle_id: "v1".into(),
                destination: test_cell_at_distance(3),
            },
            Instruction::Reposition {
                vehicle_id: "v2".into(),
                destination: test_cell_at_distance(3),
            },
        ];

        let outcome = apply_instructions(&sim, &mock_env(), &instructions);

        let v1 = outcome.sim.require_vehicle(&"v1".into()).expect("v1");
        let v2 = outcome.sim.require_vehicle(&"v2".into()).expect("v2");
        assert_eq!(v1.vehicle_state.state_type(), VehicleStateType::OutOfService);
        assert_eq!(v2.vehicle_state.state_type(), VehicleStateType::Repositioning);
        assert!(outcome.reports.iter().any(|r| matches!(
            r,
            Report::InstructionFailed { message, .. } if message.contains("cannot transition")
        )));
    }

    #[test]
    fn one_instruction_per_vehicle_per_tick() {
        let sim = mock_sim().add_vehicle(mock_vehicle("v1"));
        let instructions = [
            Instruction::Reposition {
                vehicle_id: "v1".into(),
                destination: test_cell_at_distance(3),
            },
            Instruction::Idle {
                vehicle_id: "v1".into(),
            },
        ];

        let outcome = apply_instructions(&sim, &mock_env(), &instructions);

        assert_eq!(
            outcome
                .sim
                .require_vehicle(&"v1".into())
                .map(|v| v.vehicle_state.state_type()),
            Ok(VehicleStateType::Repositioning)
        );
        assert_eq!(
            outcome.reports.first(),
            Some(&Report::VehicleTransition {
                sim_time: 0,
                vehicle_id: "v1".into(),
                from: VehicleStateType::Idle,
                to: VehicleStateType::Repositioning,
            })
        );
    }
}

use bevy_ecs::prelude::{Res, ResMut, Resource};
use log::debug;

use crate::config::Environment;
use crate::dispatcher::DispatcherResource;
use crate::instruction::Instruction;
use crate::simulation_state::SimulationState;

/// Instructions waiting to be applied this tick.
///
/// Callers may push their own instructions before a tick; the dispatcher's are appended after
/// them, so external instructions take precedence for the same vehicle.
#[derive(Debug, Default, Resource)]
pub struct PendingInstructions(pub Vec<Instruction>);

impl PendingInstructions {
    pub fn push(&mut self, instruction: Instruction) {
        self.0.push(instruction);
    }

    pub fn take(&mut self) -> Vec<Instruction> {
        std::mem::take(&mut self.0)
    }
}

pub fn dispatch_system(
    sim: Res<SimulationState>,
    env: Res<Environment>,
    mut dispatcher: ResMut<DispatcherResource>,
    mut pending: ResMut<PendingInstructions>,
) {
    let instructions = dispatcher.0.generate_instructions(&sim, &env);
    if !instructions.is_empty() {
        debug!(
            "t={} dispatcher proposed {} instructions",
            sim.sim_time(),
            instructions.len()
        );
    }
    pending.0.extend(instructions);
}

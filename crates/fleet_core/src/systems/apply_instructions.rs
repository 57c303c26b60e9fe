use bevy_ecs::prelude::{Res, ResMut};

use crate::config::Environment;
use crate::reports::ReportLog;
use crate::simulation_state::SimulationState;
use crate::systems::dispatch::PendingInstructions;
use crate::update::apply_instructions;

pub fn apply_instructions_system(
    env: Res<Environment>,
    mut sim: ResMut<SimulationState>,
    mut pending: ResMut<PendingInstructions>,
    mut reports: ResMut<ReportLog>,
) {
    let instructions = pending.take();
    if instructions.is_empty() {
        return;
    }
    let outcome = apply_instructions(&sim, &env, &instructions);
    *sim = outcome.sim;
    reports.extend(outcome.reports);
}

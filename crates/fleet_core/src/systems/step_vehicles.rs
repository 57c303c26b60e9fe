use bevy_ecs::prelude::{Res, ResMut};

use crate::config::Environment;
use crate::reports::ReportLog;
use crate::simulation_state::SimulationState;
use crate::update::step_vehicles;

/// Advance every vehicle by one time step. Vehicles that fail keep their previous snapshot.
pub fn step_vehicles_system(
    env: Res<Environment>,
    mut sim: ResMut<SimulationState>,
    mut reports: ResMut<ReportLog>,
) {
    let outcome = step_vehicles(&sim, &env);
    *sim = outcome.sim;
    reports.extend(outcome.reports);
}

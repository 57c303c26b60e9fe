use bevy_ecs::prelude::ResMut;
use log::warn;

use crate::reports::ReportLog;
use crate::simulation_state::SimulationState;
use crate::update::cancel_requests;

/// Drop unassigned requests whose cancel time has passed.
pub fn cancel_requests_system(mut sim: ResMut<SimulationState>, mut reports: ResMut<ReportLog>) {
    match cancel_requests(&sim) {
        Ok(outcome) => {
            *sim = outcome.sim;
            reports.extend(outcome.reports);
        }
        Err(err) => warn!("t={} request cancellation skipped: {err}", sim.sim_time()),
    }
}

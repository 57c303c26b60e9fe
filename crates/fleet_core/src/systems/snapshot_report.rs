use bevy_ecs::prelude::{Res, ResMut};

use crate::config::Environment;
use crate::reports::{Report, ReportLog, RequestSnapshot, VehicleSnapshot};
use crate::simulation_state::SimulationState;

/// Run condition: snapshots were requested in the config.
pub fn snapshots_enabled(env: Option<Res<Environment>>) -> bool {
    env.map(|env| env.config.report_snapshots).unwrap_or(false)
}

/// Record every vehicle and every waiting request as they stand after the vehicle step.
pub fn snapshot_report_system(
    env: Res<Environment>,
    sim: Res<SimulationState>,
    mut reports: ResMut<ReportLog>,
) {
    let sim_time = sim.sim_time();
    for vehicle in sim.vehicles() {
        // Vehicles with an unknown powertrain already produced a VehicleError this tick.
        let Ok(mechatronics) = env.mechatronics_for(vehicle) else {
            continue;
        };
        reports.push(Report::VehicleSnapshot {
            sim_time,
            snapshot: VehicleSnapshot::new(vehicle, mechatronics.as_ref()),
        });
    }
    for request in sim.requests() {
        reports.push(Report::RequestSnapshot {
            sim_time,
            snapshot: RequestSnapshot::from(request),
        });
    }
}

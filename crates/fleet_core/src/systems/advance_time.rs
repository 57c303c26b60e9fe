use std::collections::BTreeMap;

use bevy_ecs::prelude::{Res, ResMut};
use log::info;

use crate::config::Environment;
use crate::simulation_state::SimulationState;
use crate::vehicle_state::VehicleStateCategory;

/// Log a one-line tick summary and move the clock forward by one time step.
pub fn advance_time_system(env: Res<Environment>, mut sim: ResMut<SimulationState>) {
    let mut by_category: BTreeMap<VehicleStateCategory, usize> = BTreeMap::new();
    for vehicle in sim.vehicles() {
        *by_category
            .entry(vehicle.vehicle_state.category())
            .or_default() += 1;
    }
    info!(
        "t={} vehicles: {} moving, {} charging, {} stationary; {} requests waiting",
        sim.sim_time(),
        by_category.get(&VehicleStateCategory::Move).unwrap_or(&0),
        by_category.get(&VehicleStateCategory::Charge).unwrap_or(&0),
        by_category.get(&VehicleStateCategory::Stationary).unwrap_or(&0),
        sim.request_count(),
    );
    *sim = sim.advance_time(env.timestep_secs());
}

//! Simulation runner: builds the world, chains the tick systems and advances the clock.
//!
//! One tick runs, in order: request cancellation, dispatch, instruction application, vehicle
//! step, optional snapshots, then the clock advance. The runner stops once the simulation clock
//! reaches [SimulationEndTime] (when that resource is present).

use bevy_ecs::prelude::{Schedule, World};
use bevy_ecs::schedule::IntoSystemConfigs;

use crate::config::{Environment, SimulationEndTime};
use crate::dispatcher::{Dispatcher, DispatcherResource};
use crate::reports::ReportLog;
use crate::simulation_state::SimulationState;
use crate::systems::{
    advance_time::advance_time_system,
    apply_instructions::apply_instructions_system,
    cancel_requests::cancel_requests_system,
    dispatch::{dispatch_system, PendingInstructions},
    snapshot_report::{snapshot_report_system, snapshots_enabled},
    step_vehicles::step_vehicles_system,
};

/// Insert every resource a tick needs. The run horizon comes from `env.config.end_time`.
pub fn build_world(
    sim: SimulationState,
    env: Environment,
    dispatcher: impl Dispatcher + 'static,
) -> World {
    let mut world = World::new();
    world.insert_resource(SimulationEndTime(env.config.end_time));
    world.insert_resource(sim);
    world.insert_resource(env);
    world.insert_resource(DispatcherResource::new(dispatcher));
    world.insert_resource(PendingInstructions::default());
    world.insert_resource(ReportLog::default());
    world
}

/// Builds the tick schedule. Systems are chained so each sees the previous one's snapshot.
pub fn simulation_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems(
        (
            cancel_requests_system,
            dispatch_system,
            apply_instructions_system,
            step_vehicles_system,
            snapshot_report_system.run_if(snapshots_enabled),
            advance_time_system,
        )
            .chain(),
    );
    schedule
}

fn reached_end(world: &World) -> bool {
    let Some(end) = world.get_resource::<SimulationEndTime>() else {
        return false;
    };
    world
        .get_resource::<SimulationState>()
        .map(|sim| sim.sim_time() >= end.0)
        .unwrap_or(true)
}

/// Runs one tick. Returns `false` without running anything once the run horizon is reached.
pub fn run_tick(world: &mut World, schedule: &mut Schedule) -> bool {
    if reached_end(world) {
        return false;
    }
    schedule.run(world);
    true
}

/// Runs one tick and invokes `hook` after the schedule completes.
pub fn run_tick_with_hook<F>(world: &mut World, schedule: &mut Schedule, mut hook: F) -> bool
where
    F: FnMut(&World),
{
    if !run_tick(world, schedule) {
        return false;
    }
    hook(world);
    true
}

/// Runs ticks until the horizon or `max_ticks` is reached. Returns the number of ticks run.
pub fn run_until_end(world: &mut World, schedule: &mut Schedule, max_ticks: usize) -> usize {
    let mut ticks = 0;
    while ticks < max_ticks && run_tick(world, schedule) {
        ticks += 1;
    }
    ticks
}

/// Runs until the horizon and invokes `hook` after each tick.
pub fn run_until_end_with_hook<F>(
    world: &mut World,
    schedule: &mut Schedule,
    max_ticks: usize,
    mut hook: F,
) -> usize
where
    F: FnMut(&World),
{
    let mut ticks = 0;
    while ticks < max_ticks && run_tick_with_hook(world, schedule, &mut hook) {
        ticks += 1;
    }
    ticks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::NoDispatch;
    use crate::test_helpers::{mock_config, mock_env, mock_sim, mock_vehicle};

    #[test]
    fn stops_at_end_time() {
        let mut env = mock_env();
        env.config = mock_config().with_time_range(0, 300).with_timestep_secs(60);
        let mut world = build_world(mock_sim().add_vehicle(mock_vehicle("v1")), env, NoDispatch);
        let mut schedule = simulation_schedule();

        let ticks = run_until_end(&mut world, &mut schedule, 100);

        assert_eq!(ticks, 5);
        assert_eq!(world.resource::<SimulationState>().sim_time(), 300);
        assert!(!run_tick(&mut world, &mut schedule));
    }

    #[test]
    fn hook_sees_every_tick() {
        let mut env = mock_env();
        env.config = mock_config().with_time_range(0, 180);
        let mut world = build_world(mock_sim(), env, NoDispatch);
        let mut schedule = simulation_schedule();

        let mut seen = Vec::new();
        run_until_end_with_hook(&mut world, &mut schedule, 10, |world| {
            seen.push(world.resource::<SimulationState>().sim_time());
        });

        assert_eq!(seen, vec![60, 120, 180]);
    }
}

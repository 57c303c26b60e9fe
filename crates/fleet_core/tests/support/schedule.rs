#![allow(dead_code)]

use bevy_ecs::prelude::World;
use bevy_ecs::schedule::Schedule;
use fleet_core::runner::{run_tick, run_until_end, simulation_schedule};

/// Helper that owns a reusable `Schedule` so tests can step or drain the run.
pub struct TickRunner {
    schedule: Schedule,
}

impl Default for TickRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl TickRunner {
    pub fn new() -> Self {
        Self {
            schedule: simulation_schedule(),
        }
    }

    /// Run a single tick (returns `true` if the tick ran).
    pub fn run_one(&mut self, world: &mut World) -> bool {
        run_tick(world, &mut self.schedule)
    }

    /// Run up to `max_ticks` ticks, returning the number run.
    pub fn run_ticks(&mut self, world: &mut World, max_ticks: usize) -> usize {
        run_until_end(world, &mut self.schedule, max_ticks)
    }

    /// Drive the simulation to its end time.
    pub fn run_full(&mut self, world: &mut World) -> usize {
        self.run_ticks(world, usize::MAX)
    }
}

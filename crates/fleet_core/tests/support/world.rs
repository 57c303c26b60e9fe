#![allow(dead_code)]

use bevy_ecs::prelude::World;
use fleet_core::config::SimConfig;
use fleet_core::dispatcher::{Dispatcher, GreedyDispatcher, NoDispatch};
use fleet_core::model::{Base, Request, Station, Vehicle};
use fleet_core::runner::build_world;
use fleet_core::simulation_state::SimulationState;
use fleet_core::test_helpers::{mock_env, mock_sim};

/// Builder for reproducible test worlds around the seeded test cell.
pub struct TestWorldBuilder {
    sim: SimulationState,
    config: SimConfig,
    dispatcher: Box<dyn Dispatcher>,
}

impl Default for TestWorldBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorldBuilder {
    pub fn new() -> Self {
        Self {
            sim: mock_sim(),
            config: mock_env().config,
            dispatcher: Box::new(NoDispatch),
        }
    }

    pub fn with_state(mut self, sim: SimulationState) -> Self {
        self.sim = sim;
        self
    }

    pub fn with_vehicle(mut self, vehicle: Vehicle) -> Self {
        self.sim = self.sim.add_vehicle(vehicle);
        self
    }

    pub fn with_request(mut self, request: Request) -> Self {
        self.sim = self.sim.add_request(request);
        self
    }

    pub fn with_station(mut self, station: Station) -> Self {
        self.sim = self.sim.add_station(station);
        self
    }

    pub fn with_base(mut self, base: Base) -> Self {
        self.sim = self.sim.add_base(base);
        self
    }

    pub fn with_config(mut self, config: SimConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_greedy_dispatch(mut self) -> Self {
        self.dispatcher = Box::new(GreedyDispatcher::default());
        self
    }

    pub fn build(self) -> World {
        let mut env = mock_env();
        env.config = self.config;
        build_world(self.sim, env, self.dispatcher)
    }
}

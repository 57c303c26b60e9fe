//! Dispatch policy interface.
//!
//! A dispatcher looks at the current snapshot and proposes [`Instruction`]s. It never mutates
//! the simulation; the update pipeline applies its instructions, and anything that fails is
//! simply retried (or not) by the dispatcher on a later tick.

mod greedy;

use bevy_ecs::prelude::Resource;

use crate::config::Environment;
use crate::instruction::Instruction;
use crate::simulation_state::SimulationState;

pub use greedy::GreedyDispatcher;

/// Trait for dispatch policies.
///
/// Implementations must be `Send + Sync` so the dispatcher can live in an ECS resource.
pub trait Dispatcher: Send + Sync {
    /// Propose instructions for this tick. Applied in the returned order; the first instruction
    /// for a vehicle wins.
    fn generate_instructions(
        &mut self,
        sim: &SimulationState,
        env: &Environment,
    ) -> Vec<Instruction>;
}

impl<D: Dispatcher + ?Sized> Dispatcher for Box<D> {
    fn generate_instructions(
        &mut self,
        sim: &SimulationState,
        env: &Environment,
    ) -> Vec<Instruction> {
        (**self).generate_instructions(sim, env)
    }
}

/// A dispatcher that never instructs anyone. Vehicles only follow their default transitions.
#[derive(Debug, Default)]
pub struct NoDispatch;

impl Dispatcher for NoDispatch {
    fn generate_instructions(
        &mut self,
        _sim: &SimulationState,
        _env: &Environment,
    ) -> Vec<Instruction> {
        Vec::new()
    }
}

/// ECS resource wrapping a boxed dispatcher.
#[derive(Resource)]
pub struct DispatcherResource(pub Box<dyn Dispatcher>);

impl DispatcherResource {
    pub fn new(dispatcher: impl Dispatcher + 'static) -> Self {
        Self(Box::new(dispatcher))
    }
}

impl Default for DispatcherResource {
    fn default() -> Self {
        Self::new(GreedyDispatcher::default())
    }
}

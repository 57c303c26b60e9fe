//! The per-tick update pipeline as pure whole-state transformations.
//!
//! Each step takes a snapshot and returns the next one plus the reports it produced. The ECS
//! systems in [`crate::systems`] run them in order: cancel requests, apply instructions, step
//! vehicles.

mod apply_instructions;
mod cancel_requests;
mod step_vehicles;

pub use apply_instructions::apply_instructions;
pub use cancel_requests::cancel_requests;
pub use step_vehicles::{step_vehicle, step_vehicles};

use crate::reports::Report;
use crate::simulation_state::SimulationState;

/// A new snapshot and the reports produced while computing it.
#[derive(Debug, Clone)]
pub struct UpdateOutcome {
    pub sim: SimulationState,
    pub reports: Vec<Report>,
}

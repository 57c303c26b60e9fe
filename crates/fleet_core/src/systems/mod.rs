//! ECS systems that drive one simulation tick over the [`SimulationState`] resource.
//!
//! Each system swaps the resource for the next snapshot produced by [`crate::update`] and appends
//! its reports to the [`ReportLog`](crate::reports::ReportLog). The runner chains them in tick
//! order.
//!
//! [`SimulationState`]: crate::simulation_state::SimulationState

pub mod advance_time;
pub mod apply_instructions;
pub mod cancel_requests;
pub mod dispatch;
pub mod snapshot_report;
pub mod step_vehicles;

pub use dispatch::PendingInstructions;

//! Scenario setup: seeded random fleets, infrastructure and demand inside a bounding box.
//!
//! Every entity is placed on a random H3 cell (resolution 9) within the box; requests depart
//! uniformly over a configurable window and cancel a fixed delay after departure.

mod build;
mod params;

pub use build::{build_scenario, random_cell_in_bounds, ScenarioError};
pub use params::{PowertrainMix, ScenarioParams, BEV_MECHATRONICS, ICE_MECHATRONICS};

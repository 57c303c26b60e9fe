pub mod config;
pub mod dispatcher;
pub mod error;
pub mod ids;
pub mod instruction;
pub mod mechatronics;
pub mod model;
pub mod report_export;
pub mod reports;
pub mod roadnetwork;
pub mod runner;
pub mod scenario;
pub mod simulation_state;
pub mod spatial;
pub mod systems;
pub mod update;
pub mod vehicle_state;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

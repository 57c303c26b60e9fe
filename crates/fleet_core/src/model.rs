//! Entity records: immutable value snapshots identified by id.
//!
//! Every mutator returns a new value; the simulation state swaps records in wholesale.

mod base;
mod charger;
mod membership;
mod request;
mod resource_pool;
mod station;
mod vehicle;

pub use base::Base;
pub use charger::{Charger, EnergyType};
pub use membership::Membership;
pub use request::{Passenger, Request};
pub use resource_pool::{ResourcePool, ResourcePoolError};
pub use station::Station;
pub use vehicle::Vehicle;

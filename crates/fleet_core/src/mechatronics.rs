//! Powertrain models: how much energy a vehicle spends moving and idling, and how quickly it
//! refills from a charger.
//!
//! Two implementations ship with the crate:
//!
//! - **[`Bev`]**: battery electric, energy in kWh, charging tapers above 80% SOC.
//! - **[`Ice`]**: internal combustion, energy in gallons, refuelled at a gas pump.
//!
//! Implementations are registered in the [`Environment`](crate::config::Environment) keyed by
//! [`MechatronicsId`](crate::ids::MechatronicsId) and shared read-only by every vehicle that
//! names them.

mod bev;
mod ice;

use std::fmt;

use crate::model::{Charger, EnergyType, Vehicle};
use crate::roadnetwork::Route;

pub use bev::Bev;
pub use ice::Ice;

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Energy model of one vehicle type.
///
/// Every method that produces a new energy level clamps it to `[0, capacity]`.
pub trait Mechatronics: Send + Sync + fmt::Debug {
    fn energy_type(&self) -> EnergyType;

    /// Energy capacity in this model's units.
    fn capacity(&self) -> f64;

    /// Energy stored at the given state of charge.
    fn initial_energy(&self, soc: f64) -> f64 {
        (self.capacity() * soc).clamp(0.0, self.capacity())
    }

    /// State of charge in `[0, 1]`.
    fn fuel_source_soc(&self, vehicle: &Vehicle) -> f64 {
        if self.capacity() <= 0.0 {
            return 0.0;
        }
        (vehicle.energy / self.capacity()).clamp(0.0, 1.0)
    }

    fn is_empty(&self, vehicle: &Vehicle) -> bool {
        vehicle.energy <= 0.0
    }

    fn is_full(&self, vehicle: &Vehicle) -> bool {
        vehicle.energy >= self.capacity()
    }

    /// Distance the vehicle can still cover on its stored energy.
    fn range_remaining_km(&self, vehicle: &Vehicle) -> f64;

    /// Energy spent travelling `route`.
    fn energy_cost(&self, route: &Route) -> f64;

    /// Deduct the energy for travelling `route`. Does not move the vehicle.
    fn move_vehicle(&self, vehicle: &Vehicle, route: &Route) -> Vehicle {
        let energy = (vehicle.energy - self.energy_cost(route)).clamp(0.0, self.capacity());
        vehicle.modify_energy(energy)
    }

    /// Deduct idle draw for `secs` seconds.
    fn idle(&self, vehicle: &Vehicle, secs: u64) -> Vehicle;

    /// Charge from `charger` for at most `secs` seconds.
    ///
    /// Returns the updated vehicle and the seconds actually used, which is less than `secs`
    /// when the vehicle fills up part-way through.
    fn add_energy(&self, vehicle: &Vehicle, charger: &Charger, secs: f64) -> (Vehicle, f64);

    /// Whether `charger` can refuel this powertrain.
    fn valid_charger(&self, charger: &Charger) -> bool {
        charger.energy_type == self.energy_type()
    }
}

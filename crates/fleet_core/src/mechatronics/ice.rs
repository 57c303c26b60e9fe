use serde::{Deserialize, Serialize};

use super::Mechatronics;
use crate::model::{Charger, EnergyType, Vehicle};
use crate::roadnetwork::Route;

/// Internal combustion powertrain. Energy in gallons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ice {
    pub tank_capacity_gallons: f64,
    pub idle_gallons_per_hour: f64,
    pub km_per_gallon: f64,
}

impl Default for Ice {
    fn default() -> Self {
        Self {
            tank_capacity_gallons: 15.0,
            idle_gallons_per_hour: 0.2,
            km_per_gallon: 48.0,
        }
    }
}

impl Mechatronics for Ice {
    fn energy_type(&self) -> EnergyType {
        EnergyType::Gasoline
    }

    fn capacity(&self) -> f64 {
        self.tank_capacity_gallons
    }

    fn range_remaining_km(&self, vehicle: &Vehicle) -> f64 {
        vehicle.energy.max(0.0) * self.km_per_gallon
    }

    fn energy_cost(&self, route: &Route) -> f64 {
        if self.km_per_gallon <= 0.0 {
            return 0.0;
        }
        route.distance_km() / self.km_per_gallon
    }

    fn idle(&self, vehicle: &Vehicle, secs: u64) -> Vehicle {
        let used = self.idle_gallons_per_hour * secs as f64 / 3600.0;
        vehicle.modify_energy((vehicle.energy - used).clamp(0.0, self.tank_capacity_gallons))
    }

    fn add_energy(&self, vehicle: &Vehicle, charger: &Charger, secs: f64) -> (Vehicle, f64) {
        if !self.valid_charger(charger)
            || secs <= 0.0
            || charger.rate <= 0.0
            || self.is_full(vehicle)
        {
            return (vehicle.clone(), 0.0);
        }
        let needed = self.tank_capacity_gallons - vehicle.energy.max(0.0);
        let pumped = charger.rate * secs / 3600.0;
        if pumped >= needed {
            let secs_used = needed / charger.rate * 3600.0;
            (vehicle.modify_energy(self.tank_capacity_gallons), secs_used)
        } else {
            (vehicle.modify_energy(vehicle.energy.max(0.0) + pumped), secs)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::test_cell;

    #[test]
    fn pump_fills_tank_within_a_minute_or_two() {
        let ice = Ice::default();
        let vehicle = Vehicle::new("v1", "ice", test_cell(), 5.0);

        let (partial, used) = ice.add_energy(&vehicle, &Charger::gas_pump(), 30.0);
        assert!((partial.energy - 10.0).abs() < 1e-9);
        assert_eq!(used, 30.0);

        let (full, used) = ice.add_energy(&partial, &Charger::gas_pump(), 60.0);
        assert_eq!(full.energy, ice.tank_capacity_gallons);
        assert!((used - 30.0).abs() < 1e-9);
    }

    #[test]
    fn electric_chargers_do_not_fit() {
        let ice = Ice::default();
        assert!(!ice.valid_charger(&Charger::dcfc()));
        assert!(ice.valid_charger(&Charger::gas_pump()));
    }
}

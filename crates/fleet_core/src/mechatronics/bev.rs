use serde::{Deserialize, Serialize};

use super::Mechatronics;
use crate::model::{Charger, EnergyType, Vehicle};
use crate::roadnetwork::Route;

/// SOC above which charging power tapers linearly.
const TAPER_START_SOC: f64 = 0.8;
/// Charging power never tapers below this fraction, so a charging vehicle always gains energy.
const MIN_TAPER_FRACTION: f64 = 0.1;

/// Battery electric powertrain. Energy in kWh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bev {
    pub capacity_kwh: f64,
    pub idle_kwh_per_hour: f64,
    pub wh_per_km: f64,
    pub max_charge_kw: f64,
}

impl Default for Bev {
    fn default() -> Self {
        Self {
            capacity_kwh: 50.0,
            idle_kwh_per_hour: 0.8,
            wh_per_km: 150.0,
            max_charge_kw: 50.0,
        }
    }
}

impl Bev {
    fn taper(soc: f64) -> f64 {
        if soc <= TAPER_START_SOC {
            1.0
        } else {
            ((1.0 - soc) / (1.0 - TAPER_START_SOC)).max(MIN_TAPER_FRACTION)
        }
    }
}

impl Mechatronics for Bev {
    fn energy_type(&self) -> EnergyType {
        EnergyType::Electric
    }

    fn capacity(&self) -> f64 {
        self.capacity_kwh
    }

    fn range_remaining_km(&self, vehicle: &Vehicle) -> f64 {
        if self.wh_per_km <= 0.0 {
            return f64::INFINITY;
        }
        vehicle.energy.max(0.0) * 1000.0 / self.wh_per_km
    }

    fn energy_cost(&self, route: &Route) -> f64 {
        route.distance_km() * self.wh_per_km / 1000.0
    }

    fn idle(&self, vehicle: &Vehicle, secs: u64) -> Vehicle {
        let used = self.idle_kwh_per_hour * secs as f64 / 3600.0;
        vehicle.modify_energy((vehicle.energy - used).clamp(0.0, self.capacity_kwh))
    }

    fn add_energy(&self, vehicle: &Vehicle, charger: &Charger, secs: f64) -> (Vehicle, f64) {
        if !self.valid_charger(charger) || secs <= 0.0 || self.is_full(vehicle) {
            return (vehicle.clone(), 0.0);
        }
        let taper = Self::taper(self.fuel_source_soc(vehicle));
        let power_kw = charger.rate.min(self.max_charge_kw) * taper;
        if power_kw <= 0.0 {
            return (vehicle.clone(), 0.0);
        }

        let needed_kwh = self.capacity_kwh - vehicle.energy.max(0.0);
        let added_kwh = power_kw * secs / 3600.0;
        if added_kwh >= needed_kwh {
            let secs_used = needed_kwh / power_kw * 3600.0;
            (vehicle.modify_energy(self.capacity_kwh), secs_used)
        } else {
            (vehicle.modify_energy(vehicle.energy.max(0.0) + added_kwh), secs)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roadnetwork::{H3GridRoadNetwork, RoadNetwork};
    use crate::test_helpers::{test_cell, test_cell_at_distance};

    fn vehicle_with(energy: f64) -> Vehicle {
        Vehicle::new("v1", "bev", test_cell(), energy)
    }

    #[test]
    fn dcfc_adds_rate_times_duration_below_taper() {
        let bev = Bev::default();
        let (charged, used) = bev.add_energy(&vehicle_with(10.0), &Charger::dcfc(), 60.0);
        assert!((charged.energy - (10.0 + 50.0 / 60.0)).abs() < 1e-9);
        assert_eq!(used, 60.0);
    }

    #[test]
    fn charging_stops_at_capacity_and_reports_partial_time() {
        let bev = Bev::default();
        let (charged, used) = bev.add_energy(&vehicle_with(49.99), &Charger::dcfc(), 3600.0);
        assert_eq!(charged.energy, bev.capacity_kwh);
        assert!(used < 3600.0);
        assert!(used > 0.0);
    }

    #[test]
    fn taper_slows_charging_near_full() {
        let bev = Bev::default();
        let (low, _) = bev.add_energy(&vehicle_with(10.0), &Charger::dcfc(), 60.0);
        let (high, _) = bev.add_energy(&vehicle_with(45.0), &Charger::dcfc(), 60.0);
        assert!(high.energy - 45.0 < low.energy - 10.0);
        assert!(high.energy > 45.0);
    }

    #[test]
    fn gas_pump_is_rejected() {
        let bev = Bev::default();
        assert!(!bev.valid_charger(&Charger::gas_pump()));
        let (unchanged, used) = bev.add_energy(&vehicle_with(10.0), &Charger::gas_pump(), 60.0);
        assert_eq!(unchanged.energy, 10.0);
        assert_eq!(used, 0.0);
    }

    #[test]
    fn moving_and_idling_never_go_below_zero() {
        let bev = Bev::default();
        let network = H3GridRoadNetwork::default();
        let route = network.route(test_cell(), test_cell_at_distance(4));

        let moved = bev.move_vehicle(&vehicle_with(10.0), &route);
        assert!(moved.energy < 10.0);
        assert_eq!(bev.move_vehicle(&vehicle_with(0.0001), &route).energy, 0.0);
        assert_eq!(bev.idle(&vehicle_with(0.001), 3600).energy, 0.0);
    }
}

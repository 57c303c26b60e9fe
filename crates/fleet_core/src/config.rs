//! Run configuration and the read-only environment shared by every tick.

use std::collections::BTreeMap;
use std::sync::Arc;

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::error::{SimulationStateError, StateResult};
use crate::ids::{ChargerId, MechatronicsId, SimTime};
use crate::mechatronics::Mechatronics;
use crate::model::{Charger, Vehicle};

/// Simulation timing and energy thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    /// First simulated second.
    pub start_time: SimTime,
    /// The runner stops once `sim_time` reaches this value.
    pub end_time: SimTime,
    pub timestep_duration_secs: u64,
    /// Charging states end once SOC reaches this fraction.
    pub soc_upper_limit: f64,
    /// Idle vehicles below this SOC are sent to charge by the reference dispatcher.
    pub soc_lower_limit: f64,
    /// Emit vehicle and request snapshots every tick.
    pub report_snapshots: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            start_time: 0,
            end_time: 24 * 60 * 60,
            timestep_duration_secs: 60,
            soc_upper_limit: 1.0,
            soc_lower_limit: 0.2,
            report_snapshots: false,
        }
    }
}

impl SimConfig {
    pub fn with_time_range(mut self, start_time: SimTime, end_time: SimTime) -> Self {
        self.start_time = start_time;
        self.end_time = end_time;
        self
    }

    pub fn with_timestep_secs(mut self, secs: u64) -> Self {
        self.timestep_duration_secs = secs;
        self
    }

    pub fn with_soc_limits(mut self, lower: f64, upper: f64) -> Self {
        self.soc_lower_limit = lower;
        self.soc_upper_limit = upper;
        self
    }

    pub fn with_snapshots(mut self, enabled: bool) -> Self {
        self.report_snapshots = enabled;
        self
    }
}

/// Run horizon in simulation seconds. When present, the runner stops ticking once the
/// simulation clock reaches this value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Resource)]
pub struct SimulationEndTime(pub SimTime);

/// Everything the vehicle state machine reads but never mutates: configuration, powertrain
/// models and the charger catalogue.
#[derive(Debug, Clone, Resource)]
pub struct Environment {
    pub config: SimConfig,
    pub mechatronics: BTreeMap<MechatronicsId, Arc<dyn Mechatronics>>,
    pub chargers: BTreeMap<ChargerId, Charger>,
}

impl Environment {
    /// An environment with the built-in charger catalogue and no powertrains.
    pub fn new(config: SimConfig) -> Self {
        Self {
            config,
            mechatronics: BTreeMap::new(),
            chargers: Charger::defaults()
                .into_iter()
                .map(|charger| (charger.id.clone(), charger))
                .collect(),
        }
    }

    pub fn with_mechatronics(
        mut self,
        id: impl Into<MechatronicsId>,
        mechatronics: impl Mechatronics + 'static,
    ) -> Self {
        self.mechatronics.insert(id.into(), Arc::new(mechatronics));
        self
    }

    pub fn with_charger(mut self, charger: Charger) -> Self {
        self.chargers.insert(charger.id.clone(), charger);
        self
    }

    pub fn timestep_secs(&self) -> u64 {
        self.config.timestep_duration_secs
    }

    pub fn mechatronics_for(&self, vehicle: &Vehicle) -> StateResult<&Arc<dyn Mechatronics>> {
        self.mechatronics
            .get(&vehicle.mechatronics_id)
            .ok_or_else(|| {
                SimulationStateError::MechatronicsNotFound(vehicle.mechatronics_id.clone())
            })
    }

    pub fn charger(&self, id: &ChargerId) -> StateResult<&Charger> {
        self.chargers
            .get(id)
            .ok_or_else(|| SimulationStateError::ChargerNotFound(id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mechatronics::Bev;
    use crate::test_helpers::test_cell;

    #[test]
    fn lookups_fail_with_not_found() {
        let env = Environment::new(SimConfig::default()).with_mechatronics("bev", Bev::default());
        let known = Vehicle::new("v1", "bev", test_cell(), 10.0);
        let unknown = Vehicle::new("v2", "hydrogen", test_cell(), 10.0);

        assert!(env.mechatronics_for(&known).is_ok());
        assert_eq!(
            env.mechatronics_for(&unknown).err(),
            Some(SimulationStateError::MechatronicsNotFound("hydrogen".into()))
        );
        assert!(env.charger(&"DCFC".into()).is_ok());
        assert!(env.charger(&"PLUTONIUM".into()).is_err());
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = SimConfig::default()
            .with_time_range(0, 3600)
            .with_timestep_secs(30)
            .with_snapshots(true);
        let json = serde_json::to_string(&config).expect("serialize");
        let back: SimConfig = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, config);
    }
}

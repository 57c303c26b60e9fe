use serde::{Deserialize, Serialize};

use crate::ids::ChargerId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnergyType {
    Electric,
    Gasoline,
}

/// A typed power-delivery resource.
///
/// `rate` is kW for electric chargers and gallons per hour for gasoline pumps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Charger {
    pub id: ChargerId,
    pub energy_type: EnergyType,
    pub rate: f64,
}

impl Charger {
    pub fn new(id: impl Into<ChargerId>, energy_type: EnergyType, rate: f64) -> Self {
        Self {
            id: id.into(),
            energy_type,
            rate,
        }
    }

    pub fn level_1() -> Self {
        Self::new("LEVEL_1", EnergyType::Electric, 3.3)
    }

    pub fn level_2() -> Self {
        Self::new("LEVEL_2", EnergyType::Electric, 7.2)
    }

    pub fn dcfc() -> Self {
        Self::new("DCFC", EnergyType::Electric, 50.0)
    }

    pub fn gas_pump() -> Self {
        // roughly ten gallons a minute
        Self::new("GAS_PUMP", EnergyType::Gasoline, 600.0)
    }

    /// The built-in charger catalogue.
    pub fn defaults() -> Vec<Charger> {
        vec![
            Self::level_1(),
            Self::level_2(),
            Self::dcfc(),
            Self::gas_pump(),
        ]
    }
}

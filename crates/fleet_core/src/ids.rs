//! Strongly typed entity identifiers.
//!
//! Every entity in the simulation is keyed by a string id loaded from the scenario. Wrapping the
//! raw strings keeps a `StationId` from ever being looked up in the vehicle map.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Simulation time in seconds since the start of the run.
pub type SimTime = u64;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

entity_id!(
    /// Identifies a vehicle in the fleet.
    VehicleId
);
entity_id!(
    /// Identifies a trip request.
    RequestId
);
entity_id!(
    /// Identifies a charging station.
    StationId
);
entity_id!(
    /// Identifies a base (depot with parking stalls).
    BaseId
);
entity_id!(PassengerId);
entity_id!(
    /// Identifies a charger type, e.g. `DCFC`.
    ChargerId
);
entity_id!(
    /// Identifies a powertrain/energy model registered in the environment.
    MechatronicsId
);
entity_id!(
    /// Identifies a fleet membership (access group).
    MembershipId
);
entity_id!(LinkId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_order_lexicographically() {
        let mut ids = vec![VehicleId::from("v2"), VehicleId::from("v10"), VehicleId::from("v1")];
        ids.sort();
        assert_eq!(ids, vec![VehicleId::from("v1"), VehicleId::from("v10"), VehicleId::from("v2")]);
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let json = serde_json::to_string(&RequestId::from("r1")).expect("serialize");
        assert_eq!(json, "\"r1\"");
        let back: RequestId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back.as_str(), "r1");
    }
}

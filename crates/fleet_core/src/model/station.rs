use std::collections::BTreeMap;

use h3o::CellIndex;

use crate::ids::{ChargerId, StationId};
use crate::model::{Membership, ResourcePool, ResourcePoolError};

/// A charging station with a pool of chargers per charger type.
#[derive(Debug, Clone, PartialEq)]
pub struct Station {
    pub id: StationId,
    pub cell: CellIndex,
    pub chargers: BTreeMap<ChargerId, ResourcePool>,
    pub membership: Membership,
}

impl Station {
    pub fn build<I>(id: impl Into<StationId>, cell: CellIndex, chargers: I) -> Self
    where
        I: IntoIterator<Item = (ChargerId, u32)>,
    {
        Self {
            id: id.into(),
            cell,
            chargers: chargers
                .into_iter()
                .map(|(charger, count)| (charger, ResourcePool::full(count)))
                .collect(),
            membership: Membership::public(),
        }
    }

    pub fn with_membership(mut self, membership: Membership) -> Self {
        self.membership = membership;
        self
    }

    pub fn available_chargers(&self, charger_id: &ChargerId) -> u32 {
        self.chargers
            .get(charger_id)
            .map_or(0, ResourcePool::available)
    }

    pub fn total_chargers(&self, charger_id: &ChargerId) -> u32 {
        self.chargers.get(charger_id).map_or(0, ResourcePool::total)
    }

    pub fn has_available_charger(&self, charger_id: &ChargerId) -> bool {
        self.available_chargers(charger_id) > 0
    }

    pub fn is_member(&self, vehicle_membership: &Membership) -> bool {
        self.membership.grant_access_to_membership(vehicle_membership)
    }

    /// Check out one charger of `charger_id`, or `None` when none is free (or the type is not
    /// installed here).
    pub fn checkout_charger(&self, charger_id: &ChargerId) -> Option<Self> {
        let pool = self.chargers.get(charger_id)?.try_acquire()?;
        let mut updated = self.clone();
        updated.chargers.insert(charger_id.clone(), pool);
        Some(updated)
    }

    /// Return one charger of `charger_id`. Returning a type that is not installed is a no-op.
    pub fn return_charger(&self, charger_id: &ChargerId) -> Result<Self, ResourcePoolError> {
        let Some(pool) = self.chargers.get(charger_id) else {
            return Ok(self.clone());
        };
        let released = pool.release()?;
        let mut updated = self.clone();
        updated.chargers.insert(charger_id.clone(), released);
        Ok(updated)
    }
}

use h3o::CellIndex;

use crate::ids::{BaseId, StationId};
use crate::model::{Membership, ResourcePool, ResourcePoolError};

/// A depot with parking stalls and an optional co-located station.
#[derive(Debug, Clone, PartialEq)]
pub struct Base {
    pub id: BaseId,
    pub cell: CellIndex,
    pub stalls: ResourcePool,
    pub station_id: Option<StationId>,
    pub membership: Membership,
}

impl Base {
    pub fn build(id: impl Into<BaseId>, cell: CellIndex, total_stalls: u32) -> Self {
        Self {
            id: id.into(),
            cell,
            stalls: ResourcePool::full(total_stalls),
            station_id: None,
            membership: Membership::public(),
        }
    }

    pub fn with_station(mut self, station_id: impl Into<StationId>) -> Self {
        self.station_id = Some(station_id.into());
        self
    }

    pub fn with_membership(mut self, membership: Membership) -> Self {
        self.membership = membership;
        self
    }

    pub fn available_stalls(&self) -> u32 {
        self.stalls.available()
    }

    pub fn total_stalls(&self) -> u32 {
        self.stalls.total()
    }

    pub fn has_available_stall(&self) -> bool {
        self.stalls.has_available()
    }

    pub fn is_member(&self, vehicle_membership: &Membership) -> bool {
        self.membership.grant_access_to_membership(vehicle_membership)
    }

    pub fn checkout_stall(&self) -> Option<Self> {
        let stalls = self.stalls.try_acquire()?;
        Some(Self {
            stalls,
            ..self.clone()
        })
    }

    pub fn return_stall(&self) -> Result<Self, ResourcePoolError> {
        let stalls = self.stalls.release()?;
        Ok(Self {
            stalls,
            ..self.clone()
        })
    }
}

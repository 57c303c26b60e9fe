use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::ids::MembershipId;

/// Fleet-access tag. An empty membership is public and interoperates with everyone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    memberships: BTreeSet<MembershipId>,
}

impl Membership {
    pub fn public() -> Self {
        Self::default()
    }

    pub fn single(id: impl Into<MembershipId>) -> Self {
        Self {
            memberships: BTreeSet::from([id.into()]),
        }
    }

    pub fn from_ids<I, M>(ids: I) -> Self
    where
        I: IntoIterator<Item = M>,
        M: Into<MembershipId>,
    {
        Self {
            memberships: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_public(&self) -> bool {
        self.memberships.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &MembershipId> {
        self.memberships.iter()
    }

    /// Whether an entity carrying `other` may use the entity carrying `self`.
    pub fn grant_access_to_membership(&self, other: &Membership) -> bool {
        self.is_public()
            || other.is_public()
            || self
                .memberships
                .intersection(&other.memberships)
                .next()
                .is_some()
    }
}

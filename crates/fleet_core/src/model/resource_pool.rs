use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ResourcePoolError {
    #[error("cannot release into a full pool ({total} of {total} available)")]
    AlreadyFull { total: u32 },
}

/// A bounded count of interchangeable resources (chargers of one type, parking stalls).
///
/// `available` never exceeds `total`; acquire and release are the only mutators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourcePool {
    total: u32,
    available: u32,
}

impl ResourcePool {
    /// A pool with every resource available.
    pub fn full(total: u32) -> Self {
        Self {
            total,
            available: total,
        }
    }

    /// A pool with `available` resources free, clamped to `total`.
    pub fn with_available(total: u32, available: u32) -> Self {
        Self {
            total,
            available: available.min(total),
        }
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn available(&self) -> u32 {
        self.available
    }

    pub fn in_use(&self) -> u32 {
        self.total - self.available
    }

    pub fn has_available(&self) -> bool {
        self.available > 0
    }

    /// Take one resource, or `None` when the pool is exhausted.
    pub fn try_acquire(&self) -> Option<Self> {
        let available = self.available.checked_sub(1)?;
        Some(Self {
            total: self.total,
            available,
        })
    }

    /// Give one resource back.
    pub fn release(&self) -> Result<Self, ResourcePoolError> {
        if self.available >= self.total {
            return Err(ResourcePoolError::AlreadyFull { total: self.total });
        }
        Ok(Self {
            total: self.total,
            available: self.available + 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_until_exhausted_then_release_back() {
        let pool = ResourcePool::full(2);
        let one = pool.try_acquire().expect("first");
        let none_left = one.try_acquire().expect("second");
        assert_eq!(none_left.available(), 0);
        assert_eq!(none_left.in_use(), 2);
        assert!(none_left.try_acquire().is_none());

        let back = none_left.release().and_then(|p| p.release()).expect("release");
        assert_eq!(back, pool);
    }

    #[test]
    fn release_into_full_pool_is_an_error() {
        let pool = ResourcePool::full(1);
        assert_eq!(
            pool.release(),
            Err(ResourcePoolError::AlreadyFull { total: 1 })
        );
    }

    #[test]
    fn empty_pool_never_acquires() {
        assert!(ResourcePool::full(0).try_acquire().is_none());
        assert_eq!(ResourcePool::with_available(3, 7).available(), 3);
    }
}

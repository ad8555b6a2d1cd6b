use barter_core::{BarterError, ItemId};

/// The item-lock arbiter's seam onto wherever item rows actually live
/// (`spec.md` §3: "items are owned by the external inventory subsystem").
/// `barter-lifecycle` depends only on this trait, never on a concrete
/// store, so the coordinator can run against the real inventory service
/// in production and an in-memory fake in tests.
pub trait ItemLocker: Send + Sync {
    /// Atomic compare-and-swap: `active -> locked`. Returns `true` iff
    /// this call is the one that flipped it.
    fn try_lock(&self, item_id: ItemId) -> Result<bool, BarterError>;
    /// Unconditional `-> active`.
    fn unlock(&self, item_id: ItemId) -> Result<(), BarterError>;
    /// Sets `owner = new_owner`, `status = active` in one step, for the
    /// completion-time item transfer (§4.6 `verifyReceipt`).
    fn transfer(&self, item_id: ItemId, new_owner: barter_core::UserId) -> Result<(), BarterError>;
}

/// In-memory test double for [`ItemLocker`]. Not `#[cfg(test)]`: it needs
/// to be usable from `barter-lifecycle`'s own integration tests, which
/// live in a downstream crate and only see this crate's normal build.
pub mod test_support {
    use super::*;
    use barter_core::UserId;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    enum Status {
        Active,
        Locked,
    }

    /// In-memory `ItemLocker` double: every item starts `active` unless
    /// pre-seeded otherwise.
    pub struct InMemoryItemLocker {
        items: Mutex<HashMap<ItemId, (Status, UserId)>>,
    }

    impl InMemoryItemLocker {
        pub fn new(active_items: impl IntoIterator<Item = (ItemId, UserId)>) -> Self {
            let items = active_items
                .into_iter()
                .map(|(id, owner)| (id, (Status::Active, owner)))
                .collect();
            Self {
                items: Mutex::new(items),
            }
        }

        pub fn owner_of(&self, item_id: ItemId) -> Option<UserId> {
            self.items.lock().get(&item_id).map(|(_, owner)| *owner)
        }

        pub fn is_locked(&self, item_id: ItemId) -> bool {
            matches!(self.items.lock().get(&item_id), Some((Status::Locked, _)))
        }
    }

    impl ItemLocker for InMemoryItemLocker {
        fn try_lock(&self, item_id: ItemId) -> Result<bool, BarterError> {
            let mut items = self.items.lock();
            match items.get_mut(&item_id) {
                Some((status @ Status::Active, _)) => {
                    *status = Status::Locked;
                    Ok(true)
                }
                Some((Status::Locked, _)) => Ok(false),
                None => Err(BarterError::ItemNotFound(item_id.to_string())),
            }
        }

        fn unlock(&self, item_id: ItemId) -> Result<(), BarterError> {
            let mut items = self.items.lock();
            match items.get_mut(&item_id) {
                Some((status, _)) => {
                    *status = Status::Active;
                    Ok(())
                }
                None => Err(BarterError::ItemNotFound(item_id.to_string())),
            }
        }

        fn transfer(&self, item_id: ItemId, new_owner: UserId) -> Result<(), BarterError> {
            let mut items = self.items.lock();
            match items.get_mut(&item_id) {
                Some(entry) => {
                    *entry = (Status::Active, new_owner);
                    Ok(())
                }
                None => Err(BarterError::ItemNotFound(item_id.to_string())),
            }
        }
    }

    #[test]
    fn lock_then_relock_fails() {
        let locker = InMemoryItemLocker::new([(ItemId(1), UserId(1))]);
        assert!(locker.try_lock(ItemId(1)).unwrap());
        assert!(!locker.try_lock(ItemId(1)).unwrap());
        locker.unlock(ItemId(1)).unwrap();
        assert!(locker.try_lock(ItemId(1)).unwrap());
    }
}

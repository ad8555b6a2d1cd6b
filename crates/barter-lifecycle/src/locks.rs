use barter_core::ItemId;
use barter_ports::ItemLocker;
use tracing::warn;

/// C7: lock every item in `item_ids` (deterministic ascending order, per
/// `spec.md` §4.7). On the first CAS failure, unlock everything already
/// acquired and return the item that lost the race — the chain-level
/// all-or-nothing guarantee is rollback, not a multi-row transaction.
pub fn try_lock_all(locker: &dyn ItemLocker, item_ids: &[ItemId]) -> Result<(), ItemId> {
    let mut ordered = item_ids.to_vec();
    ordered.sort();

    let mut acquired = Vec::with_capacity(ordered.len());
    for &item_id in &ordered {
        match locker.try_lock(item_id) {
            Ok(true) => acquired.push(item_id),
            Ok(false) | Err(_) => {
                for locked in &acquired {
                    if let Err(e) = locker.unlock(*locked) {
                        warn!(item_id = %locked, error = %e, "failed to roll back item lock");
                    }
                }
                return Err(item_id);
            }
        }
    }
    Ok(())
}

/// Unconditionally release every item in `item_ids`, logging (not
/// propagating) any individual failure — used by reject/expire unwind,
/// which must not halt partway through releasing a chain's items.
pub fn unlock_all(locker: &dyn ItemLocker, item_ids: &[ItemId]) {
    for &item_id in item_ids {
        if let Err(e) = locker.unlock(item_id) {
            warn!(item_id = %item_id, error = %e, "failed to unlock item during unwind");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use barter_core::UserId;
    use barter_ports::locking::test_support::InMemoryItemLocker;

    #[test]
    fn locks_all_in_ascending_order_when_available() {
        let locker = InMemoryItemLocker::new([(ItemId(3), UserId(1)), (ItemId(1), UserId(2)), (ItemId(2), UserId(3))]);
        let result = try_lock_all(&locker, &[ItemId(3), ItemId(1), ItemId(2)]);
        assert!(result.is_ok());
        assert!(locker.is_locked(ItemId(1)));
        assert!(locker.is_locked(ItemId(2)));
        assert!(locker.is_locked(ItemId(3)));
    }

    #[test]
    fn rolls_back_on_conflict() {
        let locker = InMemoryItemLocker::new([(ItemId(1), UserId(1)), (ItemId(2), UserId(2))]);
        locker.try_lock(ItemId(2)).unwrap();

        let result = try_lock_all(&locker, &[ItemId(1), ItemId(2)]);
        assert_eq!(result, Err(ItemId(2)));
        assert!(!locker.is_locked(ItemId(1)), "item 1 must be rolled back");
    }
}

use serde::{Deserialize, Serialize};

use crate::ids::{ItemId, UserId};
use crate::money::Money;

/// A user account. `completed_trades` is derived from the history of
/// COMPLETED chains and maintained by whoever owns the users table
/// upstream of this engine — the core only reads it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub display_name: String,
    /// Reputation rating, 0.0–5.0.
    pub rating: f64,
    /// Home region tag (e.g. a US state code). `None` = unknown.
    pub region: Option<String>,
    pub completed_trades: u32,
}

/// An item's current status. Only the coordinator (via the item-lock
/// arbiter) and the completion transfer step mutate this field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemStatus {
    Active,
    Locked,
    Inactive,
}

/// An item owned by a user.
///
/// `value_cents == 0` means "unvalued": any cycle containing such an
/// item is disqualified by the positive-value validation rule (§4.3).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub owner: UserId,
    pub name: String,
    pub value_cents: Money,
    pub status: ItemStatus,
}

impl Item {
    pub fn is_valued(&self) -> bool {
        self.value_cents.is_positive()
    }
}

/// A wishlist entry: `user` wants `item`. `item.owner != user` is an
/// invariant enforced at construction time by the graph builder, which
/// silently drops entries that violate it rather than erroring — a
/// user wishlisting their own item is a caller bug upstream of this
/// engine, not something discovery needs to surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WishlistEntry {
    pub user: UserId,
    pub item: ItemId,
}

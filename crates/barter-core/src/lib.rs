//! barter-core
//!
//! Shared data model for the barter chain engine: stable ids, the
//! user/item/wishlist records, money arithmetic, the error taxonomy,
//! protocol configuration, and the clock abstraction every other crate
//! threads through instead of calling the system clock directly.

pub mod clock;
pub mod config;
pub mod error;
pub mod ids;
pub mod money;
pub mod model;

pub use clock::Clock;
pub use config::BarterConfig;
pub use error::BarterError;
pub use ids::{ChainId, ItemId, UserId};
pub use money::Money;
pub use model::{Item, ItemStatus, User, WishlistEntry};

/// Unix timestamp, seconds, UTC. Matches `spec.md`'s `Timestamp`.
pub type Timestamp = i64;

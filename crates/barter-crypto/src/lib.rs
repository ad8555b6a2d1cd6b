//! barter-crypto
//!
//! The one algorithm that must produce bit-for-bit identical output from
//! two independent call sites: the discovery rejection filter (C4) and the
//! lifecycle coordinator's `reject`/`expire` paths. Kept in its own leaf
//! crate rather than inlined into the graph or store crates, since both
//! depend on it.

pub mod cycle_hash;

pub use cycle_hash::{cycle_fingerprint, CycleMember};

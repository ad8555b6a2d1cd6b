//! barter-graph
//!
//! C1 (Graph Builder) and C2 (Cycle Enumerator): builds the immutable
//! trade graph from a snapshot of users/items/wishlists, and enumerates
//! every unique length-3 cycle in it. Both halves are pure, in-memory,
//! and suspend only at the caller's initial load — no I/O lives here.

pub mod builder;
pub mod cycles;

pub use builder::{Edge, TradeGraph, UserMeta};
pub use cycles::{enumerate_cycles, Cycle, CycleEdge};

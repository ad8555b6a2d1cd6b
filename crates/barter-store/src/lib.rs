//! barter-store
//!
//! C5 (Proposal Store): sled-backed persistence for chain proposals,
//! participants, rejection records, escrow holds, and shipment tracking,
//! plus a local item mirror used only so the item-lock arbiter (C7) has
//! somewhere to perform its compare-and-swap in this standalone engine.

pub mod db;
pub mod model;

pub use db::BarterDb;
pub use model::{
    ChainParticipant, ChainProposal, ChainStatus, EscrowHold, HoldStatus, RejectedChainRecord,
    ShipmentTrackingRow,
};

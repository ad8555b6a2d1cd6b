//! barter-lifecycle
//!
//! C6 (Lifecycle Coordinator), C7 (Item-Lock Arbiter), C8 (Escrow
//! Orchestrator), and C9 (Shipment Aggregator): the state machine that
//! drives a chain proposal from `PROPOSED` through `COMPLETED`/`FAILED`/
//! `EXPIRED`, plus the three focused helper modules it calls into.

pub mod coordinator;
pub mod escrow;
pub mod locks;
pub mod shipment;

pub use coordinator::ChainCoordinator;

//! barter-discovery
//!
//! C3 (Balance & Validator) and C4 (Rejection Filter), plus the `discover`
//! entry point that composes them with `barter-graph`'s C1/C2 into one
//! discovery pass.

pub mod rejection;
pub mod report;
pub mod validate;

pub use rejection::{fingerprint_of, filter_rejected, RejectionLookup};
pub use report::{discover, DiscoveryReport, ValidCycle};
pub use validate::{validate_cycle, RejectReason, ValidationOutcome};

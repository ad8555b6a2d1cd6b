//! ─── Barter Engine Configuration ─────────────────────────────────────────
//!
//! Every tunable named in `spec.md` §6 lives here, named once, so no module
//! hardcodes a magic number that needs to agree with another module's copy
//! of the same constant (the cycle length `d`, the tolerance percent, …).

use serde::{Deserialize, Serialize};

/// Fixed chain depth. The spec pins this at 3 and calls longer chains a
/// Non-goal; it is still a named constant rather than a literal `3`
/// scattered through the enumerator and validator.
pub const MAX_CHAIN_DEPTH: usize = 3;

/// Maximum participants per chain proposal (mirrors `MAX_CHAIN_DEPTH`).
pub const MAX_PARTICIPANTS: usize = 3;

/// Platform fee charged to a non-waived participant on funding, in cents.
pub const CHAIN_PLATFORM_FEE_CENTS: i64 = 1_500;

/// Proposal time-to-live after creation.
pub const PROPOSAL_TTL_SECS: i64 = 24 * 3_600;

/// How long a rejected cycle's fingerprint is suppressed from re-proposal.
pub const REJECTION_COOLDOWN_SECS: i64 = 30 * 24 * 3_600;

/// Default value-tolerance percent for the balance validator.
pub const DEFAULT_VALUE_TOLERANCE_PERCENT: f64 = 15.0;

/// Default minimum reputation rating required of every participant.
pub const DEFAULT_MIN_REPUTATION: f64 = 3.5;

/// Default minimum completed-trade floor (the spec's "configured floor
/// (default 0)").
pub const DEFAULT_MIN_TRADES_COMPLETED: u32 = 0;

/// Runtime-tunable configuration, loadable from CLI flags or a config file.
/// `Default` reproduces every default named in `spec.md` §6.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BarterConfig {
    pub value_tolerance_percent: f64,
    pub min_reputation: f64,
    pub min_trades_completed: u32,
    pub platform_fee_cents: i64,
    pub proposal_ttl_secs: i64,
    pub rejection_cooldown_secs: i64,
}

impl Default for BarterConfig {
    fn default() -> Self {
        Self {
            value_tolerance_percent: DEFAULT_VALUE_TOLERANCE_PERCENT,
            min_reputation: DEFAULT_MIN_REPUTATION,
            min_trades_completed: DEFAULT_MIN_TRADES_COMPLETED,
            platform_fee_cents: CHAIN_PLATFORM_FEE_CENTS,
            proposal_ttl_secs: PROPOSAL_TTL_SECS,
            rejection_cooldown_secs: REJECTION_COOLDOWN_SECS,
        }
    }
}

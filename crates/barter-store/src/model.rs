use serde::{Deserialize, Serialize};

use barter_core::{ChainId, ItemId, Money, Timestamp, UserId};

/// Status of a chain proposal, per `spec.md` §4.6's state diagram.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainStatus {
    Proposed,
    PendingAcceptance,
    Locked,
    EscrowFunded,
    Shipping,
    Completed,
    Failed,
    Expired,
}

impl ChainStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, ChainStatus::Completed | ChainStatus::Failed | ChainStatus::Expired)
    }
}

impl std::fmt::Display for ChainStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ChainStatus::Proposed => "PROPOSED",
            ChainStatus::PendingAcceptance => "PENDING_ACCEPTANCE",
            ChainStatus::Locked => "LOCKED",
            ChainStatus::EscrowFunded => "ESCROW_FUNDED",
            ChainStatus::Shipping => "SHIPPING",
            ChainStatus::Completed => "COMPLETED",
            ChainStatus::Failed => "FAILED",
            ChainStatus::Expired => "EXPIRED",
        };
        write!(f, "{s}")
    }
}

/// The persistent proposal row, per `spec.md` §3 "Chain proposal".
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChainProposal {
    pub id: ChainId,
    pub status: ChainStatus,
    pub total_value_cents: Money,
    pub value_tolerance_percent: f64,
    pub max_participants: u32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub expires_at: Timestamp,
    pub executed_at: Option<Timestamp>,
    pub failed_reason: Option<String>,
}

/// One participant row, per `spec.md` §3 "Chain participant". `position`
/// is the participant's index within the cycle (0-based, insertion
/// order), which is also the sled key suffix used to return aggregate
/// reads in a stable order without a secondary index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChainParticipant {
    pub chain_id: ChainId,
    pub position: u32,
    pub user_id: UserId,
    pub gives_item_id: ItemId,
    pub receives_item_id: ItemId,
    pub gives_to_user_id: UserId,
    pub receives_from_user_id: UserId,
    pub cash_delta_cents: Money,
    pub platform_fee_cents: Money,
    pub has_accepted: bool,
    pub has_funded: bool,
    pub has_shipped: bool,
    pub has_received: bool,
    pub tracking_number: Option<String>,
    pub carrier: Option<String>,
    pub photo_url: Option<String>,
    pub accepted_at: Option<Timestamp>,
    pub shipped_at: Option<Timestamp>,
    pub received_at: Option<Timestamp>,
}

/// A rejection record, per `spec.md` §3 "Rejected-cycle record". Keyed
/// uniquely on `cycle_hash`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RejectedChainRecord {
    pub cycle_hash: String,
    pub rejected_by_user_id: UserId,
    pub original_chain_id: ChainId,
    pub rejected_at: Timestamp,
    pub expires_at: Timestamp,
    pub reason: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum HoldStatus {
    Pending,
    Funded,
    Released,
    Refunded,
}

/// An escrow hold row, per `spec.md` §4.8. `recipient_id` is `None` for
/// holds created against a payer (the spec's "recipientId=0 sentinel");
/// payout holds set it to the receiving participant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EscrowHold {
    pub id: u64,
    pub chain_id: ChainId,
    pub payer_id: UserId,
    pub recipient_id: Option<UserId>,
    pub amount_cents: Money,
    pub status: HoldStatus,
    pub provider: String,
    pub provider_reference: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// One shipment leg, per `spec.md` §6's `shipment_tracking` table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShipmentTrackingRow {
    pub chain_id: ChainId,
    pub user_id: UserId,
    pub tracking_number: String,
    pub carrier: String,
    pub created_at: Timestamp,
}

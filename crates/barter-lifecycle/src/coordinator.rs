use std::collections::HashMap;
use std::sync::Arc;

use barter_core::config::MAX_PARTICIPANTS;
use barter_core::{BarterConfig, BarterError, ChainId, Clock, Money, Timestamp, UserId};
use barter_crypto::{cycle_fingerprint, CycleMember};
use barter_discovery::ValidCycle;
use barter_ports::{Carrier, FeePolicy, ItemLocker, NotificationKind, NotificationSink, PaymentProvider, ShippingProvider};
use barter_store::{BarterDb, ChainParticipant, ChainProposal, ChainStatus, RejectedChainRecord};
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::escrow;
use crate::locks;
use crate::shipment;

/// C6: the state machine is the design heart. One `ChainCoordinator`
/// drives every transition against a `BarterDb` and the external-port
/// trait objects, serializing same-chain transitions through a per-chain
/// lock registry (§5).
pub struct ChainCoordinator {
    db: Arc<BarterDb>,
    locker: Arc<dyn ItemLocker>,
    payment: Arc<dyn PaymentProvider>,
    shipping: Arc<dyn ShippingProvider>,
    notifier: Arc<dyn NotificationSink>,
    fee_policy: Arc<dyn FeePolicy>,
    clock: Arc<dyn Clock>,
    config: BarterConfig,
    chain_locks: Mutex<HashMap<ChainId, Arc<Mutex<()>>>>,
}

impl ChainCoordinator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        db: Arc<BarterDb>,
        locker: Arc<dyn ItemLocker>,
        payment: Arc<dyn PaymentProvider>,
        shipping: Arc<dyn ShippingProvider>,
        notifier: Arc<dyn NotificationSink>,
        fee_policy: Arc<dyn FeePolicy>,
        clock: Arc<dyn Clock>,
        config: BarterConfig,
    ) -> Self {
        Self {
            db,
            locker,
            payment,
            shipping,
            notifier,
            fee_policy,
            clock,
            config,
            chain_locks: Mutex::new(HashMap::new()),
        }
    }

    fn chain_lock(&self, chain_id: ChainId) -> Arc<Mutex<()>> {
        self.chain_locks.lock().entry(chain_id).or_insert_with(|| Arc::new(Mutex::new(()))).clone()
    }

    fn now(&self) -> Timestamp {
        self.clock.now()
    }

    fn require_proposal(&self, chain_id: ChainId) -> Result<ChainProposal, BarterError> {
        self.db
            .get_proposal(chain_id)?
            .ok_or_else(|| BarterError::ChainNotFound(chain_id.to_string()))
    }

    fn require_participant(&self, participants: &[ChainParticipant], user_id: UserId, chain_id: ChainId) -> Result<usize, BarterError> {
        participants
            .iter()
            .position(|p| p.user_id == user_id)
            .ok_or_else(|| BarterError::NotAParticipant { chain: chain_id.to_string(), user: user_id.to_string() })
    }

    fn notify_all(&self, participants: &[ChainParticipant], kind: NotificationKind, title: &str, body: &str) {
        for p in participants {
            self.notifier.notify(p.user_id, kind, title, body);
        }
    }

    fn fingerprint_of_participants(participants: &[ChainParticipant]) -> String {
        let members: Vec<CycleMember> = participants
            .iter()
            .map(|p| CycleMember { user: p.user_id, gives_item: p.gives_item_id })
            .collect();
        cycle_fingerprint(&members)
    }

    /// `get_proposal`/`list_proposals_for_user` pass straight through to
    /// the store (§4.5's "aggregate reads" requirement).
    pub fn get_proposal(&self, chain_id: ChainId) -> Result<Option<(ChainProposal, Vec<ChainParticipant>)>, BarterError> {
        let Some(proposal) = self.db.get_proposal(chain_id)? else {
            return Ok(None);
        };
        let participants = self.db.get_participants(chain_id)?;
        Ok(Some((proposal, participants)))
    }

    pub fn list_proposals_for_user(&self, user_id: UserId, exclude_terminal: bool) -> Result<Vec<ChainProposal>, BarterError> {
        let mut out = Vec::new();
        for chain_id in self.db.list_chain_ids_for_user(user_id)? {
            if let Some(proposal) = self.db.get_proposal(chain_id)? {
                if !exclude_terminal || !proposal.status.is_terminal() {
                    out.push(proposal);
                }
            }
        }
        Ok(out)
    }

    /// Create a new proposal from one validated cycle, or return the id
    /// of an already-open proposal covering the same participant/item set
    /// (the idempotent re-proposal guard).
    pub fn propose_cycle(&self, valid: &ValidCycle) -> Result<ChainId, BarterError> {
        let now = self.now();
        let len = valid.cycle.edges.len();
        let fingerprint = barter_discovery::fingerprint_of(&valid.cycle);

        if let Some(existing_id) = self.db.get_chain_id_by_fingerprint(&fingerprint)? {
            if let Some(existing) = self.db.get_proposal(existing_id)? {
                if !existing.status.is_terminal() {
                    info!(chain_id = %existing_id, %fingerprint, "idempotent re-proposal, returning existing chain");
                    return Ok(existing_id);
                }
            }
        }

        let chain_id = self.db.next_chain_id()?;
        let proposal = ChainProposal {
            id: chain_id,
            status: ChainStatus::Proposed,
            total_value_cents: valid.outcome.total_value_cents,
            value_tolerance_percent: self.config.value_tolerance_percent,
            max_participants: MAX_PARTICIPANTS as u32,
            created_at: now,
            updated_at: now,
            expires_at: now + self.config.proposal_ttl_secs,
            executed_at: None,
            failed_reason: None,
        };

        let mut participants = Vec::with_capacity(len);
        for (i, edge) in valid.cycle.edges.iter().enumerate() {
            let predecessor = &valid.cycle.edges[(i + len - 1) % len];
            participants.push(ChainParticipant {
                chain_id,
                position: i as u32,
                user_id: edge.from,
                gives_item_id: edge.item_id,
                receives_item_id: predecessor.item_id,
                gives_to_user_id: edge.to,
                receives_from_user_id: predecessor.from,
                cash_delta_cents: *valid.outcome.cash_balances.get(&edge.from).unwrap_or(&Money::ZERO),
                platform_fee_cents: Money::cents(self.config.platform_fee_cents),
                has_accepted: false,
                has_funded: false,
                has_shipped: false,
                has_received: false,
                tracking_number: None,
                carrier: None,
                photo_url: None,
                accepted_at: None,
                shipped_at: None,
                received_at: None,
            });
        }

        self.db.put_proposal(&proposal)?;
        for p in &participants {
            self.db.put_participant(p)?;
        }
        self.db.put_fingerprint_index(&fingerprint, chain_id)?;

        self.notify_all(
            &participants,
            NotificationKind::ChainTradeOpportunity,
            "A trade chain is ready",
            &format!("Chain {chain_id} proposes a {len}-way trade. Review and accept to continue."),
        );
        info!(chain_id = %chain_id, participants = len, "chain proposed");
        Ok(chain_id)
    }

    pub fn accept(&self, chain_id: ChainId, user_id: UserId) -> Result<ChainProposal, BarterError> {
        let lock = self.chain_lock(chain_id);
        let _guard = lock.lock();
        let now = self.now();

        let mut proposal = self.require_proposal(chain_id)?;
        if matches!(proposal.status, ChainStatus::Failed | ChainStatus::Expired) {
            return Err(BarterError::IllegalTransition { action: "accept".into(), status: proposal.status.to_string() });
        }
        let mut participants = self.db.get_participants(chain_id)?;
        let idx = self.require_participant(&participants, user_id, chain_id)?;
        if participants[idx].has_accepted {
            return Err(BarterError::AlreadyAccepted { chain: chain_id.to_string(), user: user_id.to_string() });
        }

        participants[idx].has_accepted = true;
        participants[idx].accepted_at = Some(now);
        self.db.put_participant(&participants[idx])?;

        let all_accepted = participants.iter().all(|p| p.has_accepted);
        if !all_accepted {
            if proposal.status == ChainStatus::Proposed {
                proposal.status = ChainStatus::PendingAcceptance;
            }
            proposal.updated_at = now;
            self.db.put_proposal(&proposal)?;
            info!(chain_id = %chain_id, %user_id, status = %proposal.status, "participant accepted");
            return Ok(proposal);
        }

        let item_ids: Vec<_> = participants.iter().map(|p| p.gives_item_id).collect();
        match locks::try_lock_all(self.locker.as_ref(), &item_ids) {
            Ok(()) => {
                proposal.status = ChainStatus::Locked;
                proposal.updated_at = now;
                self.db.put_proposal(&proposal)?;
                self.notify_all(&participants, NotificationKind::ChainTradeLocked, "Trade chain locked", &format!("Chain {chain_id} is locked; please fund your side."));
                info!(chain_id = %chain_id, "all accepted, items locked");
                Ok(proposal)
            }
            Err(lost_item) => {
                proposal.status = ChainStatus::Failed;
                proposal.failed_reason = Some(format!("Race condition: item {lost_item} already locked"));
                proposal.updated_at = now;
                self.db.put_proposal(&proposal)?;
                warn!(chain_id = %chain_id, item_id = %lost_item, "lock race lost, chain failed");
                Err(BarterError::RaceLost(lost_item.to_string()))
            }
        }
    }

    pub fn reject(&self, chain_id: ChainId, user_id: UserId, reason: Option<String>) -> Result<ChainProposal, BarterError> {
        let lock = self.chain_lock(chain_id);
        let _guard = lock.lock();
        let now = self.now();

        let proposal = self.require_proposal(chain_id)?;
        if proposal.status == ChainStatus::Completed {
            return Err(BarterError::IllegalTransition { action: "reject".into(), status: proposal.status.to_string() });
        }
        let participants = self.db.get_participants(chain_id)?;
        self.require_participant(&participants, user_id, chain_id)?;

        // Already terminal (FAILED/EXPIRED): a no-op, per spec.md §8 — no
        // extra rejection record, no additional refunds, no re-notification.
        if proposal.status.is_terminal() {
            return Ok(proposal);
        }
        let mut proposal = proposal;

        let failed_reason = reason.unwrap_or_else(|| format!("Rejected by user {user_id}"));
        proposal.status = ChainStatus::Failed;
        proposal.failed_reason = Some(failed_reason.clone());
        proposal.updated_at = now;

        let fingerprint = Self::fingerprint_of_participants(&participants);
        self.db.put_rejection(&RejectedChainRecord {
            cycle_hash: fingerprint,
            rejected_by_user_id: user_id,
            original_chain_id: chain_id,
            rejected_at: now,
            expires_at: now + self.config.rejection_cooldown_secs,
            reason: failed_reason,
        })?;

        let item_ids: Vec<_> = participants.iter().map(|p| p.gives_item_id).collect();
        locks::unlock_all(self.locker.as_ref(), &item_ids);
        escrow::unwind_chain(&self.db, self.payment.as_ref(), chain_id, now)?;

        self.db.put_proposal(&proposal)?;
        let others: Vec<ChainParticipant> = participants.into_iter().filter(|p| p.user_id != user_id).collect();
        self.notify_all(&others, NotificationKind::ChainTradeCancelled, "Trade chain cancelled", &format!("Chain {chain_id} was rejected by a participant."));
        info!(chain_id = %chain_id, %user_id, "chain rejected");
        Ok(proposal)
    }

    pub fn fund(&self, chain_id: ChainId, user_id: UserId) -> Result<ChainProposal, BarterError> {
        let lock = self.chain_lock(chain_id);
        let _guard = lock.lock();
        let now = self.now();

        let mut proposal = self.require_proposal(chain_id)?;
        if proposal.status != ChainStatus::Locked {
            return Err(BarterError::IllegalTransition { action: "fund".into(), status: proposal.status.to_string() });
        }
        let mut participants = self.db.get_participants(chain_id)?;
        let idx = self.require_participant(&participants, user_id, chain_id)?;
        if participants[idx].has_funded {
            return Err(BarterError::IllegalTransition { action: "fund".into(), status: "already funded".into() });
        }

        let decision = self.fee_policy.calculate_trade_fee(user_id);
        let (fee_component, cash_component, _total) =
            escrow::fund_components(decision.is_waived, participants[idx].cash_delta_cents, self.config.platform_fee_cents);

        if let Some(mut hold) = escrow::create_hold_if_needed(
            &self.db,
            self.payment.as_ref(),
            chain_id,
            user_id,
            fee_component,
            cash_component,
            decision.is_waived,
            now,
        )? {
            escrow::mark_funded(&self.db, &mut hold, now)?;
        }

        if decision.is_waived {
            self.fee_policy.increment_trade_counter(user_id);
        }

        participants[idx].has_funded = true;
        self.db.put_participant(&participants[idx])?;

        let all_funded = participants.iter().all(|p| p.has_funded);
        if all_funded {
            // ESCROW_FUNDED collapses directly into SHIPPING at this boundary.
            proposal.status = ChainStatus::Shipping;
            proposal.updated_at = now;
            self.db.put_proposal(&proposal)?;
            self.notify_all(&participants, NotificationKind::ChainTradeShipping, "Trade chain funded", &format!("Chain {chain_id} is fully funded; ship your item."));
            info!(chain_id = %chain_id, "all funded, chain ready to ship");
        } else {
            proposal.updated_at = now;
            self.db.put_proposal(&proposal)?;
            info!(chain_id = %chain_id, %user_id, "participant funded");
        }
        Ok(proposal)
    }

    pub fn submit_shipping(
        &self,
        chain_id: ChainId,
        user_id: UserId,
        tracking_number: &str,
        carrier: Option<Carrier>,
        photo_url: Option<String>,
    ) -> Result<(ChainProposal, bool), BarterError> {
        let lock = self.chain_lock(chain_id);
        let _guard = lock.lock();
        let now = self.now();

        let mut proposal = self.require_proposal(chain_id)?;
        if !matches!(proposal.status, ChainStatus::EscrowFunded | ChainStatus::Shipping) {
            return Err(BarterError::IllegalTransition { action: "submit_shipping".into(), status: proposal.status.to_string() });
        }
        let mut participants = self.db.get_participants(chain_id)?;
        let idx = self.require_participant(&participants, user_id, chain_id)?;
        if participants[idx].has_shipped {
            return Err(BarterError::IllegalTransition { action: "submit_shipping".into(), status: "already shipped".into() });
        }

        let row = shipment::submit_tracking(&self.db, self.shipping.as_ref(), chain_id, user_id, tracking_number, carrier, now)?;
        participants[idx].tracking_number = Some(row.tracking_number.clone());
        participants[idx].carrier = Some(row.carrier.clone());
        participants[idx].has_shipped = true;
        participants[idx].shipped_at = Some(now);
        if photo_url.is_some() {
            participants[idx].photo_url = photo_url;
        }
        self.db.put_participant(&participants[idx])?;

        let green_light = shipment::all_shipped(&participants);
        proposal.updated_at = now;
        if green_light {
            proposal.status = ChainStatus::Shipping;
            self.db.put_proposal(&proposal)?;
            self.notify_all(&participants, NotificationKind::ChainTradeShipping, "Green light", &format!("All parcels are on the way for chain {chain_id}."));
            info!(chain_id = %chain_id, "green light: every participant shipped");
        } else {
            self.db.put_proposal(&proposal)?;
            let recipient = participants[idx].gives_to_user_id;
            self.notifier.notify(
                recipient,
                NotificationKind::TrackingAdded,
                "Your item is on the way",
                &format!("Tracking for chain {chain_id}: {}", participants[idx].tracking_number.as_deref().unwrap_or("")),
            );
        }
        Ok((proposal, green_light))
    }

    pub fn verify_receipt(&self, chain_id: ChainId, user_id: UserId) -> Result<ChainProposal, BarterError> {
        let lock = self.chain_lock(chain_id);
        let _guard = lock.lock();
        let now = self.now();

        let mut proposal = self.require_proposal(chain_id)?;
        if proposal.status != ChainStatus::Shipping {
            return Err(BarterError::IllegalTransition { action: "verify_receipt".into(), status: proposal.status.to_string() });
        }
        let mut participants = self.db.get_participants(chain_id)?;
        let idx = self.require_participant(&participants, user_id, chain_id)?;
        if participants[idx].has_received {
            return Err(BarterError::IllegalTransition { action: "verify_receipt".into(), status: "already received".into() });
        }
        if !participants[idx].has_shipped {
            return Err(BarterError::IllegalTransition { action: "verify_receipt".into(), status: "not yet shipped".into() });
        }

        participants[idx].has_received = true;
        participants[idx].received_at = Some(now);
        self.db.put_participant(&participants[idx])?;

        let all_received = participants.iter().all(|p| p.has_received);
        if all_received {
            proposal.status = ChainStatus::Completed;
            proposal.executed_at = Some(now);
            proposal.updated_at = now;

            escrow::complete_chain(&self.db, self.payment.as_ref(), chain_id, &participants, now)?;
            for p in &participants {
                self.locker.transfer(p.receives_item_id, p.user_id)?;
            }

            self.db.put_proposal(&proposal)?;
            self.notify_all(&participants, NotificationKind::TradeCompleted, "Trade complete", &format!("Chain {chain_id} has completed."));
            info!(chain_id = %chain_id, "chain completed");
        } else {
            proposal.updated_at = now;
            self.db.put_proposal(&proposal)?;
        }
        Ok(proposal)
    }

    /// Periodic sweep (§4.6 `expire`): any non-terminal proposal past its
    /// `expires_at` transitions to `EXPIRED` with the same unwind as
    /// `reject`, minus the rejection record.
    pub fn expire_due(&self, now: Timestamp) -> Vec<ChainId> {
        let mut expired = Vec::new();
        let proposals = match self.db.iter_all_proposals() {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "expire sweep failed to list proposals");
                return expired;
            }
        };

        for candidate in proposals {
            if candidate.status.is_terminal() || candidate.expires_at >= now {
                continue;
            }
            let lock = self.chain_lock(candidate.id);
            let _guard = lock.lock();

            let mut proposal = match self.db.get_proposal(candidate.id) {
                Ok(Some(p)) => p,
                _ => continue,
            };
            if proposal.status.is_terminal() {
                continue;
            }

            let participants = match self.db.get_participants(candidate.id) {
                Ok(p) => p,
                Err(e) => {
                    warn!(chain_id = %candidate.id, error = %e, "expire sweep failed to load participants");
                    continue;
                }
            };

            proposal.status = ChainStatus::Expired;
            proposal.updated_at = now;
            if let Err(e) = self.db.put_proposal(&proposal) {
                warn!(chain_id = %candidate.id, error = %e, "expire sweep failed to persist proposal");
                continue;
            }

            let item_ids: Vec<_> = participants.iter().map(|p| p.gives_item_id).collect();
            locks::unlock_all(self.locker.as_ref(), &item_ids);
            if let Err(e) = escrow::unwind_chain(&self.db, self.payment.as_ref(), candidate.id, now) {
                warn!(chain_id = %candidate.id, error = %e, "expire sweep escrow unwind failed");
            }

            self.notify_all(&participants, NotificationKind::ChainTradeCancelled, "Trade chain expired", &format!("Chain {} expired before completion.", candidate.id));
            info!(chain_id = %candidate.id, "chain expired");
            expired.push(candidate.id);
        }
        expired
    }
}

use barter_core::{BarterError, ChainId, Money, UserId};
use barter_ports::{CreateIntentRequest, PaymentProvider, TransferRequest};
use barter_store::{BarterDb, ChainParticipant, EscrowHold, HoldStatus};
use tracing::{error, info, warn};

/// `(feeComponent, cashComponent, total)` per `spec.md` §4.6 `fund`.
pub fn fund_components(is_waived: bool, cash_delta_cents: Money, platform_fee_cents: i64) -> (i64, i64, i64) {
    let fee_component = if is_waived { 0 } else { platform_fee_cents };
    let cash_component = cash_delta_cents.floor_zero().as_cents();
    (fee_component, cash_component, fee_component + cash_component)
}

/// Open a hold for one participant's `fund` call. Returns `None` when
/// `total == 0` — no provider call, no hold row, the caller still marks
/// the participant funded.
pub fn create_hold_if_needed(
    db: &BarterDb,
    payment: &dyn PaymentProvider,
    chain_id: ChainId,
    user_id: UserId,
    fee_component: i64,
    cash_component: i64,
    is_waived: bool,
    now: i64,
) -> Result<Option<EscrowHold>, BarterError> {
    let total = fee_component + cash_component;
    if total <= 0 {
        return Ok(None);
    }
    let intent = payment.create_payment_intent(CreateIntentRequest {
        amount_cents: total,
        currency: "usd".into(),
        chain_id,
        user_id,
        fee_cents: fee_component,
        cash_component_cents: cash_component,
        waived: is_waived,
    })?;
    let hold = EscrowHold {
        id: db.next_hold_id()?,
        chain_id,
        payer_id: user_id,
        recipient_id: None,
        amount_cents: Money::cents(total),
        status: HoldStatus::Pending,
        provider: "mock_payment".into(),
        provider_reference: intent.provider_reference,
        created_at: now,
        updated_at: now,
    };
    db.put_hold(&hold)?;
    Ok(Some(hold))
}

/// Flip a freshly created hold from `PENDING` to `FUNDED`. This engine
/// has no webhook/confirmation channel from the payment provider — the
/// synchronous mock's successful intent creation *is* the funding event
/// — so `fund()` calls this immediately after `create_hold_if_needed`
/// rather than leaving the row `PENDING` until some later callback.
pub fn mark_funded(db: &BarterDb, hold: &mut EscrowHold, now: i64) -> Result<(), BarterError> {
    hold.status = HoldStatus::Funded;
    hold.updated_at = now;
    db.put_hold(hold)
}

/// Escrow capture + payout on chain completion, per `spec.md` §4.8:
/// 1. Capture every `FUNDED` hold; flip to `RELEASED`; log and continue
///    on individual provider failure.
/// 2. For every participant with a negative cash delta, pay out the
///    absolute amount if the provider reports payouts enabled, else
///    persist a `pending_onboarding` record.
pub fn complete_chain(
    db: &BarterDb,
    payment: &dyn PaymentProvider,
    chain_id: ChainId,
    participants: &[ChainParticipant],
    now: i64,
) -> Result<(), BarterError> {
    let mut holds = db.list_holds_for_chain(chain_id)?;
    for hold in holds.iter_mut().filter(|h| h.status == HoldStatus::Funded) {
        match payment.capture_payment(&hold.provider_reference) {
            Ok(()) => {
                hold.status = HoldStatus::Released;
                hold.updated_at = now;
                db.put_hold(hold)?;
                info!(chain_id = %chain_id, hold_id = hold.id, "captured escrow hold");
            }
            Err(e) => {
                error!(chain_id = %chain_id, hold_id = hold.id, error = %e, "capture failed, continuing");
            }
        }
    }

    for p in participants.iter().filter(|p| p.cash_delta_cents.as_cents() < 0) {
        let amount = p.cash_delta_cents.abs().as_cents();
        let id = db.next_hold_id()?;
        if payment.has_payouts_enabled(p.user_id) {
            let handle = payment.transfer(TransferRequest {
                destination_account: p.user_id.to_string(),
                amount_cents: amount,
                currency: "usd".into(),
                chain_id,
                user_id: p.user_id,
            })?;
            let reference = handle.map(|h| h.id).unwrap_or_default();
            db.put_hold(&EscrowHold {
                id,
                chain_id,
                payer_id: p.user_id,
                recipient_id: Some(p.user_id),
                amount_cents: Money::cents(amount),
                status: HoldStatus::Released,
                provider: "mock_payment".into(),
                provider_reference: reference,
                created_at: now,
                updated_at: now,
            })?;
        } else {
            db.put_hold(&EscrowHold {
                id,
                chain_id,
                payer_id: p.user_id,
                recipient_id: Some(p.user_id),
                amount_cents: Money::cents(amount),
                status: HoldStatus::Pending,
                provider: "mock_payment".into(),
                provider_reference: String::new(),
                created_at: now,
                updated_at: now,
            })?;
            warn!(chain_id = %chain_id, user_id = %p.user_id, "payout pending onboarding");
        }
    }
    Ok(())
}

/// Unwind on chain failure/expiry: cancel every `PENDING`/`FUNDED` hold at
/// the provider and mark it `REFUNDED`. Individual failures are logged
/// and do not stop the unwind of the rest.
pub fn unwind_chain(db: &BarterDb, payment: &dyn PaymentProvider, chain_id: ChainId, now: i64) -> Result<(), BarterError> {
    let mut holds = db.list_holds_for_chain(chain_id)?;
    for hold in holds
        .iter_mut()
        .filter(|h| matches!(h.status, HoldStatus::Pending | HoldStatus::Funded))
    {
        if let Err(e) = payment.refund_payment(&hold.provider_reference, None) {
            error!(chain_id = %chain_id, hold_id = hold.id, error = %e, "refund failed, continuing unwind");
        }
        hold.status = HoldStatus::Refunded;
        hold.updated_at = now;
        db.put_hold(hold)?;
    }
    Ok(())
}

use barter_core::{BarterError, ChainId, UserId};
use barter_ports::{detect_carrier, Carrier, ShippingProvider};
use barter_store::{BarterDb, ChainParticipant, ShipmentTrackingRow};

/// C9: the chain is ready to leave `LOCKED`/`ESCROW_FUNDED` for `SHIPPING`
/// once every participant has a recorded shipment — the green light is
/// "all, not first" per `spec.md` §4.6 `submitShipping`.
pub fn all_shipped(participants: &[ChainParticipant]) -> bool {
    !participants.is_empty() && participants.iter().all(|p| p.has_shipped)
}

/// Record one participant's shipment. `carrier` is detected from the
/// tracking number's shape when the caller doesn't supply one.
pub fn submit_tracking(
    db: &BarterDb,
    shipping: &dyn ShippingProvider,
    chain_id: ChainId,
    user_id: UserId,
    tracking_number: &str,
    carrier: Option<Carrier>,
    now: i64,
) -> Result<ShipmentTrackingRow, BarterError> {
    let carrier = carrier.unwrap_or_else(|| detect_carrier(tracking_number));
    let row = ShipmentTrackingRow {
        chain_id,
        user_id,
        tracking_number: tracking_number.to_string(),
        carrier: carrier.to_string(),
        created_at: now,
    };
    db.put_tracking(&row)?;
    shipping.create_tracking_record(chain_id, user_id, tracking_number, carrier)?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use barter_core::{ItemId, Money};

    fn participant(has_shipped: bool) -> ChainParticipant {
        ChainParticipant {
            chain_id: ChainId(1),
            position: 0,
            user_id: UserId(1),
            gives_item_id: ItemId(1),
            receives_item_id: ItemId(2),
            gives_to_user_id: UserId(2),
            receives_from_user_id: UserId(3),
            cash_delta_cents: Money::ZERO,
            platform_fee_cents: Money::ZERO,
            has_accepted: true,
            has_funded: true,
            has_shipped,
            has_received: false,
            tracking_number: None,
            carrier: None,
            photo_url: None,
            accepted_at: None,
            shipped_at: None,
            received_at: None,
        }
    }

    #[test]
    fn green_light_requires_every_participant() {
        assert!(!all_shipped(&[participant(true), participant(false)]));
        assert!(all_shipped(&[participant(true), participant(true)]));
        assert!(!all_shipped(&[]));
    }
}
